//! Board URL identity.

use url::Url;

/// The board URL the session was opened on, kept for re-navigation and for
/// verifying that a return-to-board step actually landed on the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardUrl {
    raw: String,
    parsed: Url,
}

impl BoardUrl {
    pub fn parse(raw: &str) -> Result<Self, url::ParseError> {
        let parsed = Url::parse(raw.trim())?;
        Ok(Self {
            raw: raw.trim().to_string(),
            parsed,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// True when `current` shows this board.
    pub fn matches(&self, current: &str) -> bool {
        match Url::parse(current) {
            Ok(u) => same_location(&self.parsed, &u),
            Err(_) => false,
        }
    }
}

/// Scheme, host, port and path equality; trailing slash, query and fragment ignored.
fn same_location(a: &Url, b: &Url) -> bool {
    a.scheme() == b.scheme()
        && a.host_str() == b.host_str()
        && a.port_or_known_default() == b.port_or_known_default()
        && a.path().trim_end_matches('/') == b.path().trim_end_matches('/')
}
