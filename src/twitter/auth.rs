//! Credentials supplied by the caller and the header set derived from them

use std::fmt;

use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use super::DmError;
use crate::core::AppConfig;

/// Cookie holding the CSRF token the web client echoes back in a header.
const CSRF_COOKIE: &str = "ct0";

/// Request body accepted by every endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthData {
    pub cookies: CookieJar,
    pub bearer_token: String,
}

/// Browser cookies in the order the caller sent them.
///
/// A JSON object is deserialized pair by pair instead of through a
/// `HashMap` so the `Cookie` header comes out in insertion order. A
/// repeated name keeps its first position and its last value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CookieJar(Vec<(String, String)>);

impl CookieJar {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(existing) => existing.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CookieJar {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut jar = CookieJar::default();
        for (name, value) in iter {
            jar.insert(name, value);
        }
        jar
    }
}

// Non-string values are kept as their JSON text, null is an empty value
fn cookie_value(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl<'de> Deserialize<'de> for CookieJar {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct JarVisitor;

        impl<'de> Visitor<'de> for JarVisitor {
            type Value = CookieJar;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of cookie names to values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<CookieJar, A::Error> {
                let mut jar = CookieJar::default();
                while let Some((name, value)) = map.next_entry::<String, Value>()? {
                    jar.insert(name, cookie_value(value));
                }
                Ok(jar)
            }
        }

        deserializer.deserialize_map(JarVisitor)
    }
}

impl Serialize for CookieJar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

/// Format cookies for the `Cookie` header, e.g. `a=1; b=2`.
pub fn format_cookie_header(cookies: &CookieJar) -> String {
    cookies
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join("; ")
}

fn authorization_value(token: &str) -> String {
    let token = token.trim();
    let has_scheme = token
        .get(..7)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("bearer "));
    if has_scheme {
        token.to_string()
    } else {
        format!("Bearer {}", token)
    }
}

fn header_value(name: &HeaderName, value: &str) -> Result<HeaderValue, DmError> {
    HeaderValue::from_str(value)
        .map_err(|_| DmError::InvalidCredentials(format!("{} is not a valid header value", name)))
}

/// Build the header set the web client sends on every DM API call.
pub fn build_headers(auth: &AuthData, config: &AppConfig) -> Result<HeaderMap, DmError> {
    let mut headers = HeaderMap::new();

    let mut authorization = header_value(
        &header::AUTHORIZATION,
        &authorization_value(&auth.bearer_token),
    )?;
    authorization.set_sensitive(true);
    headers.insert(header::AUTHORIZATION, authorization);

    let mut cookie = header_value(&header::COOKIE, &format_cookie_header(&auth.cookies))?;
    cookie.set_sensitive(true);
    headers.insert(header::COOKIE, cookie);

    let csrf_name = HeaderName::from_static("x-csrf-token");
    let csrf = header_value(&csrf_name, auth.cookies.get(CSRF_COOKIE).unwrap_or_default())?;
    headers.insert(csrf_name, csrf);

    headers.insert(
        header::USER_AGENT,
        header_value(&header::USER_AGENT, &config.user_agent)?,
    );
    let language_name = HeaderName::from_static("x-twitter-client-language");
    let language = header_value(&language_name, &config.client_language)?;
    headers.insert(language_name, language);

    headers.insert(
        HeaderName::from_static("x-twitter-active-user"),
        HeaderValue::from_static("yes"),
    );
    headers.insert(
        HeaderName::from_static("x-twitter-auth-type"),
        HeaderValue::from_static("OAuth2Session"),
    );
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static("application/json, text/plain, */*"),
    );
    headers.insert(header::ORIGIN, HeaderValue::from_static("https://x.com"));
    headers.insert(
        header::REFERER,
        HeaderValue::from_static("https://x.com/messages"),
    );

    Ok(headers)
}
