//! Request-cookie parsing
//!
//! The core never talks to a web framework directly: inbound cookies
//! arrive as a parsed [`RequestCookies`] map, and outbound cookies are
//! returned as [`cookie::Cookie`] values the caller serializes into
//! `Set-Cookie` headers.

use std::collections::HashMap;

pub use cookie::{Cookie, SameSite};

/// Cookies carried by one inbound request
#[derive(Debug, Clone, Default)]
pub struct RequestCookies(HashMap<String, String>);

impl RequestCookies {
    /// No cookies at all
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a `Cookie` request header. Malformed pairs are skipped.
    pub fn parse(header: &str) -> Self {
        let map = Cookie::split_parse(header)
            .flatten()
            .map(|c| (c.name().to_string(), c.value().to_string()))
            .collect();
        Self(map)
    }

    /// Build from already-split (name, value) pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// The value of a cookie, if present
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}
