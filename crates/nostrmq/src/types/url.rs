// Copyright (c) 2024-2026 NostrMQ Developers
// Distributed under the MIT software license

//! Relay URL

use core::fmt;
use core::str::FromStr;

use serde::de::Error as DeserializerError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use url::Url;

/// Relay URL error
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// Url parse error
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
    /// Unsupported scheme
    #[error("unsupported scheme: expected 'ws' or 'wss', found '{0}'")]
    UnsupportedScheme(String),
}

/// A relay endpoint: a URL with a `ws` or `wss` scheme.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RelayUrl(Url);

impl RelayUrl {
    /// Parse a relay URL, requiring a websocket scheme.
    pub fn parse(url: &str) -> Result<Self, Error> {
        let url: Url = Url::parse(url)?;
        match url.scheme() {
            "ws" | "wss" => Ok(Self(url)),
            scheme => Err(Error::UnsupportedScheme(scheme.to_string())),
        }
    }

    /// Check if the URL uses TLS (`wss`)
    #[inline]
    pub fn is_secure(&self) -> bool {
        self.0.scheme() == "wss"
    }

    /// Get URL as `&str`, as accepted by websocket connectors.
    #[inline]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl FromStr for RelayUrl {
    type Err = Error;

    fn from_str(url: &str) -> Result<Self, Self::Err> {
        Self::parse(url)
    }
}

impl TryFrom<&str> for RelayUrl {
    type Error = Error;

    fn try_from(url: &str) -> Result<Self, Self::Error> {
        Self::parse(url)
    }
}

impl fmt::Display for RelayUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // A bare host parses to a URL with path "/": trim it back off so the
        // rendered form matches what the caller configured.
        let s: &str = self.0.as_str();
        if self.0.path() == "/" && self.0.query().is_none() && self.0.fragment().is_none() {
            write!(f, "{}", s.trim_end_matches('/'))
        } else {
            write!(f, "{s}")
        }
    }
}

impl Serialize for RelayUrl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for RelayUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let url: String = String::deserialize(deserializer)?;
        Self::parse(&url).map_err(DeserializerError::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_websocket_schemes() {
        assert!(RelayUrl::parse("ws://127.0.0.1:7777").is_ok());
        assert!(RelayUrl::parse("wss://relay.example.com").is_ok());
        assert_eq!(
            RelayUrl::parse("https://relay.example.com").unwrap_err(),
            Error::UnsupportedScheme(String::from("https"))
        );
        assert!(RelayUrl::parse("not a url").is_err());
    }

    #[test]
    fn test_display_trims_root_path() {
        let url = RelayUrl::parse("wss://relay.example.com").unwrap();
        assert_eq!(url.to_string(), "wss://relay.example.com");

        let url = RelayUrl::parse("wss://relay.example.com/sub/path").unwrap();
        assert_eq!(url.to_string(), "wss://relay.example.com/sub/path");
    }
}
