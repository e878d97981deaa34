//! Common types used across Roster

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::{Result, RosterError};

/// Scheme for sources read from the local filesystem
pub const FILE_SCHEME: &str = "file";

/// Scheme for sources fetched over plain HTTP
pub const HTTP_SCHEME: &str = "http";

/// Scheme for sources fetched over HTTPS
pub const HTTPS_SCHEME: &str = "https";

/// Identity of one CSV data source.
///
/// The canonical URL string is the source's identity: two locators are the same
/// source exactly when their serialized forms match, which keeps the identity stable
/// across retry cycles.
///
/// # Examples
///
/// ```
/// use roster_common::Locator;
///
/// let locator = Locator::parse("http://example.com/users.csv").unwrap();
/// assert_eq!(locator.scheme(), "http");
/// assert_eq!(locator.as_str(), "http://example.com/users.csv");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locator(Url);

impl Locator {
    /// Parse an absolute URL into a locator
    pub fn parse(input: &str) -> Result<Self> {
        Url::parse(input)
            .map(Self)
            .map_err(|e| RosterError::InvalidLocator(format!("{}: {}", input, e)))
    }

    /// Build a `file` locator from an absolute filesystem path
    pub fn from_file_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        Url::from_file_path(path).map(Self).map_err(|_| {
            RosterError::InvalidLocator(format!("not an absolute path: {}", path.display()))
        })
    }

    pub fn scheme(&self) -> &str {
        self.0.scheme()
    }

    /// Canonical string form, used as the source identity
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn url(&self) -> &Url {
        &self.0
    }

    /// Local path for `file` locators, `None` for any other scheme
    pub fn to_file_path(&self) -> Option<PathBuf> {
        if self.scheme() != FILE_SCHEME {
            return None;
        }
        self.0.to_file_path().ok()
    }

    pub fn is_remote(&self) -> bool {
        matches!(self.scheme(), HTTP_SCHEME | HTTPS_SCHEME)
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Locator {
    type Err = RosterError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Url> for Locator {
    fn from(url: Url) -> Self {
        Self(url)
    }
}
