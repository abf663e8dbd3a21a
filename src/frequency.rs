//! Frequency extraction from navigated URLs.
//!
//! Station databases and band-scanner maps encode the tuned frequency in
//! the visited address, either as a query parameter (`?f=106,4`, `/f=106.4`)
//! or as a fragment (`#freq=87.6`). This module pulls that value out with a
//! tolerant, locale-aware grammar and normalizes it to a canonical decimal
//! form.
//!
//! # Example
//!
//! ```
//! use frequency_link::frequency::extract;
//!
//! let freq = extract("https://maps.fmdx.org/?f=106,4").unwrap();
//! assert_eq!(freq.mhz(), 106.4);
//! assert_eq!(freq.command(), "T106400");
//!
//! assert!(extract("https://example.com/about").is_none());
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

// ============================================================================
// Constants
// ============================================================================

/// Lower bound of the plausible FM broadcast band (OIRT band start).
pub const BAND_MIN_MHZ: f64 = 65.5;

/// Upper bound of the plausible FM broadcast band.
pub const BAND_MAX_MHZ: f64 = 108.0;

/// Query-parameter grammar: a numeric token immediately after an `f=` key,
/// with or without a preceding query separator (`?f=98.0`, `&f=98.0`,
/// `/f=98.0`). Comma and dot decimal separators both accepted.
static QUERY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[?&]f=([0-9]+[.,]?[0-9]*)|f=([0-9]+[.,]?[0-9]*)")
        .expect("query pattern is valid")
});

/// Fragment grammar: a numeric token after `#freq=`.
static FRAGMENT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"#freq=([0-9]+[.,]*[0-9]*)").expect("fragment pattern is valid")
});

// ============================================================================
// FrequencyValue
// ============================================================================

/// A non-negative decimal frequency in megahertz.
///
/// Always carries the canonical decimal form: a comma separator is
/// normalized to a dot and an integral token gains a `.0` fractional part
/// (`87` → `87.0`), so the value round-trips with at least one decimal
/// digit.
///
/// Band validity is checked by consumers via [`in_broadcast_band`], not by
/// the extractor itself.
///
/// [`in_broadcast_band`]: FrequencyValue::in_broadcast_band
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrequencyValue(f64);

impl FrequencyValue {
    /// Creates a frequency from a megahertz value.
    ///
    /// Negative and non-finite inputs are rejected.
    #[inline]
    #[must_use]
    pub fn from_mhz(mhz: f64) -> Option<Self> {
        (mhz.is_finite() && mhz >= 0.0).then_some(Self(mhz))
    }

    /// Returns the frequency in megahertz.
    #[inline]
    #[must_use]
    pub const fn mhz(self) -> f64 {
        self.0
    }

    /// Returns the frequency in whole kilohertz, rounded to the nearest
    /// integer.
    #[inline]
    #[must_use]
    pub fn khz(self) -> u64 {
        (self.0 * 1000.0).round() as u64
    }

    /// Formats the delivery payload: a literal `T` tag followed by the
    /// frequency in whole kilohertz.
    ///
    /// 87.7 MHz → `T87700`.
    #[inline]
    #[must_use]
    pub fn command(self) -> String {
        format!("T{}", self.khz())
    }

    /// Returns `true` if the value lies within the plausible FM broadcast
    /// band [[`BAND_MIN_MHZ`], [`BAND_MAX_MHZ`]].
    #[inline]
    #[must_use]
    pub fn in_broadcast_band(self) -> bool {
        (BAND_MIN_MHZ..=BAND_MAX_MHZ).contains(&self.0)
    }

    /// Parses a raw numeric token from a URL into a frequency.
    ///
    /// Normalizes a comma decimal separator to a dot and appends `.0` when
    /// the token has no fractional part.
    fn parse_token(token: &str) -> Option<Self> {
        let mut normalized = token.replace(',', ".");
        if !normalized.contains('.') {
            normalized.push_str(".0");
        }
        normalized.parse::<f64>().ok().and_then(Self::from_mhz)
    }
}

impl fmt::Display for FrequencyValue {
    /// Formats with at least one decimal digit (`87` → `87.0`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.fract() == 0.0 {
            write!(f, "{:.1}", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

// ============================================================================
// Extraction
// ============================================================================

/// Extracts a frequency value from a navigated URL.
///
/// Percent-escapes are decoded first (`f=106%2C4` → `f=106,4`), then the
/// query grammar and the fragment grammar are tried in that order. The
/// first matching pattern wins; exactly one frequency is extracted per URL
/// even when several candidate substrings exist.
///
/// Returns `None` when neither pattern matches: a normal, expected
/// outcome, not an error. Pure function over its input.
#[must_use]
pub fn extract(url: &str) -> Option<FrequencyValue> {
    let decoded = match urlencoding::decode(url) {
        Ok(decoded) => decoded,
        // Undecodable escapes: match against the raw URL instead.
        Err(_) => url.into(),
    };

    if let Some(captures) = QUERY_PATTERN.captures(&decoded) {
        let token = captures.get(1).or_else(|| captures.get(2))?;
        return FrequencyValue::parse_token(token.as_str());
    }

    if let Some(captures) = FRAGMENT_PATTERN.captures(&decoded) {
        return FrequencyValue::parse_token(captures.get(1)?.as_str());
    }

    None
}

// ============================================================================
// Tests
// ============================================================================
