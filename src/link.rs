//! Frequency link injection.
//!
//! The producer side of the pipeline: on supported station-database pages,
//! text that looks like an FM frequency is turned into a link whose target
//! (`<origin>/f=<value>`) manufactures a navigation event carrying that
//! frequency, which the navigation handler then picks up.
//!
//! This module does the scanning and link construction; rendering the
//! spans into page markup is the embedder's concern.

// ============================================================================
// Imports
// ============================================================================

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use url::Url;

use crate::frequency::FrequencyValue;

// ============================================================================
// Constants
// ============================================================================

/// Station-database hosts whose pages are scanned by default.
pub const DEFAULT_ALLOWED_HOSTS: &[&str] = &[
    "highpoint2000.selfhost.de",
    "db.wtfda.org",
    "eservices.traficom.fi",
    "maps.fmdx.org",
];

/// A two-to-three-digit, dot-or-comma, one-to-three-digit numeric token.
static FREQUENCY_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{2,3}[.,]\d{1,3}\b").expect("token pattern is valid"));

/// Scanner log pages are supported on any host.
static SCANNER_LOG_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"logs/SCANNER").expect("scanner pattern is valid"));

// ============================================================================
// LinkSpan
// ============================================================================

/// A frequency-looking token found in page text, with the link that would
/// relay it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkSpan {
    /// Byte range of the token within the scanned text.
    pub range: Range<usize>,
    /// The normalized frequency value.
    pub frequency: FrequencyValue,
    /// Link target: `<origin>/f=<value>`, dot decimal separator.
    pub href: String,
}

// ============================================================================
// FrequencyLinker
// ============================================================================

/// Scans page text for clickable frequency tokens.
///
/// Only tokens whose normalized value lies in the plausible FM broadcast
/// band survive; a table of distances or power levels does not become a
/// wall of links.
#[derive(Debug, Clone)]
pub struct FrequencyLinker {
    /// Hostnames whose pages are scanned.
    allowed_hosts: Vec<String>,
}

impl FrequencyLinker {
    /// Creates a linker with the default allowed-host list.
    #[must_use]
    pub fn new() -> Self {
        Self {
            allowed_hosts: DEFAULT_ALLOWED_HOSTS
                .iter()
                .map(|s| (*s).to_owned())
                .collect(),
        }
    }

    /// Creates a linker with a custom allowed-host list.
    #[must_use]
    pub fn with_hosts<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_hosts: hosts.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns `true` if the page should be scanned.
    ///
    /// A page qualifies when its host is on the allowed list or its URL
    /// matches a scanner-log path.
    #[must_use]
    pub fn is_page_supported(&self, page: &Url) -> bool {
        let host_allowed = page
            .host_str()
            .is_some_and(|host| self.allowed_hosts.iter().any(|allowed| allowed == host));

        host_allowed || SCANNER_LOG_PATH.is_match(page.as_str())
    }

    /// Scans `text` from `page` for frequency tokens.
    ///
    /// Returns one [`LinkSpan`] per in-band token, in document order. An
    /// unsupported page yields no spans.
    #[must_use]
    pub fn scan(&self, page: &Url, text: &str) -> Vec<LinkSpan> {
        if !self.is_page_supported(page) {
            return Vec::new();
        }

        let origin = page.origin().ascii_serialization();

        FREQUENCY_TOKEN
            .find_iter(text)
            .filter_map(|token| {
                let normalized = token.as_str().replace(',', ".");
                let frequency = FrequencyValue::from_mhz(normalized.parse().ok()?)?;
                frequency.in_broadcast_band().then(|| LinkSpan {
                    range: token.range(),
                    frequency,
                    href: format!("{origin}/f={}", urlencoding::encode(&normalized)),
                })
            })
            .collect()
    }
}

impl Default for FrequencyLinker {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
