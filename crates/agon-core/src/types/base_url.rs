//! Backend base URL type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::error::{Error, InvalidInputError};

/// A validated base URL for the AGON REST API.
///
/// The base URL includes the API prefix (for example
/// `https://agon.example.edu/api`); endpoint paths such as `/users/me/` are
/// appended to it verbatim.
///
/// # Example
///
/// ```
/// use agon_core::BaseUrl;
///
/// let base = BaseUrl::new("https://agon.example.edu/api/").unwrap();
/// assert_eq!(base.endpoint("/users/me/"), "https://agon.example.edu/api/users/me/");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BaseUrl(Url);

impl BaseUrl {
    /// Create a new base URL from a string, validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL does not parse, is not absolute, or uses
    /// plain HTTP against a non-loopback host.
    pub fn new(s: impl AsRef<str>) -> Result<Self, Error> {
        let s = s.as_ref();
        let url = Url::parse(s).map_err(|e| InvalidInputError::BaseUrl {
            value: s.to_string(),
            reason: e.to_string(),
        })?;

        Self::validate(&url, s)?;

        Ok(Self(url))
    }

    /// Returns the full URL of an endpoint path.
    pub fn endpoint(&self, path: &str) -> String {
        // The URL crate always adds a trailing slash to root paths
        let base = self.0.as_str().trim_end_matches('/');
        if path.starts_with('/') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        }
    }

    /// Returns the base URL as a string.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    fn validate(url: &Url, original: &str) -> Result<(), Error> {
        if url.cannot_be_a_base() {
            return Err(InvalidInputError::BaseUrl {
                value: original.to_string(),
                reason: "must be an absolute URL".to_string(),
            }
            .into());
        }

        if url.host_str().is_none() {
            return Err(InvalidInputError::BaseUrl {
                value: original.to_string(),
                reason: "must have a host".to_string(),
            }
            .into());
        }

        let scheme = url.scheme();
        if scheme != "https" && !(scheme == "http" && is_loopback(url)) {
            return Err(InvalidInputError::BaseUrl {
                value: original.to_string(),
                reason: "must use HTTPS (HTTP allowed only for localhost)".to_string(),
            }
            .into());
        }

        if url.query().is_some() || url.fragment().is_some() {
            return Err(InvalidInputError::BaseUrl {
                value: original.to_string(),
                reason: "must not carry a query or fragment".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

impl fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BaseUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for BaseUrl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.0.as_str())
    }
}

impl<'de> Deserialize<'de> for BaseUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        BaseUrl::new(&s).map_err(serde::de::Error::custom)
    }
}

impl AsRef<str> for BaseUrl {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

fn is_loopback(url: &Url) -> bool {
    url.host_str()
        .is_some_and(|h| h == "localhost" || h == "127.0.0.1" || h == "[::1]")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_https_url() {
        let base = BaseUrl::new("https://agon.example.edu/api").unwrap();
        assert_eq!(base.as_str(), "https://agon.example.edu/api");
    }

    #[test]
    fn valid_localhost_http() {
        assert!(BaseUrl::new("http://127.0.0.1:8000/api").is_ok());
        assert!(BaseUrl::new("http://localhost:8000/api").is_ok());
        assert!(BaseUrl::new("http://[::1]:8000/api").is_ok());
    }

    #[test]
    fn endpoint_construction() {
        let base = BaseUrl::new("http://127.0.0.1:8000/api").unwrap();
        assert_eq!(
            base.endpoint("/token/refresh/"),
            "http://127.0.0.1:8000/api/token/refresh/"
        );
        assert_eq!(
            base.endpoint("users/me/"),
            "http://127.0.0.1:8000/api/users/me/"
        );
    }

    #[test]
    fn endpoint_ignores_trailing_slash_on_base() {
        let base = BaseUrl::new("https://agon.example.edu/").unwrap();
        assert_eq!(base.endpoint("/ping/"), "https://agon.example.edu/ping/");
    }

    #[test]
    fn invalid_http_non_localhost() {
        assert!(BaseUrl::new("http://agon.example.edu/api").is_err());
    }

    #[test]
    fn invalid_relative_url() {
        assert!(BaseUrl::new("/api").is_err());
    }

    #[test]
    fn rejects_query() {
        assert!(BaseUrl::new("https://agon.example.edu/api?x=1").is_err());
    }

    #[test]
    fn serde_round_trip_validates() {
        let parsed: Result<BaseUrl, _> = serde_json::from_str("\"ftp://example.com\"");
        assert!(parsed.is_err());
    }
}
