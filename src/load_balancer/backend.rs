//! Backend address abstraction.
//!
//! # Responsibilities
//! - Represent a single configured upstream base URL
//! - Defer URL parsing to forwarding time, so a malformed address only
//!   affects the requests routed to it

use std::fmt;
use std::sync::Arc;

use url::Url;

/// An upstream base URL (scheme, host, optional base path), kept verbatim.
///
/// Cheap to clone; the pool hands out clones on every selection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BackendAddress(Arc<str>);

impl BackendAddress {
    pub fn new(address: impl AsRef<str>) -> Self {
        Self(Arc::from(address.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse the address into a URL.
    pub fn to_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&self.0)
    }
}

impl fmt::Display for BackendAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BackendAddress {
    fn from(address: &str) -> Self {
        Self::new(address)
    }
}

impl From<String> for BackendAddress {
    fn from(address: String) -> Self {
        Self(Arc::from(address))
    }
}
