//! Session cookie formatting and extraction.

use axum::http::{header, HeaderMap};
use chrono::Duration;
use clap::ValueEnum;
use cookie::{time, Cookie, SameSite};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SameSitePolicy {
    Strict,
    #[default]
    Lax,
    None,
}

impl From<SameSitePolicy> for SameSite {
    fn from(policy: SameSitePolicy) -> Self {
        match policy {
            SameSitePolicy::Strict => SameSite::Strict,
            SameSitePolicy::Lax => SameSite::Lax,
            SameSitePolicy::None => SameSite::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieSettings {
    pub name: String,
    pub secure: bool,
    pub same_site: SameSitePolicy,
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            name: "tinyauth".to_string(),
            secure: false,
            same_site: SameSitePolicy::Lax,
        }
    }
}

/// Build a `Set-Cookie` value. HttpOnly is always set.
pub fn build_session_cookie(settings: &CookieSettings, value: &str, max_age: Duration) -> String {
    Cookie::build((settings.name.clone(), value.to_string()))
        .path("/")
        .http_only(true)
        .secure(settings.secure)
        .same_site(settings.same_site.into())
        .max_age(time::Duration::seconds(max_age.num_seconds().max(0)))
        .build()
        .to_string()
}

/// Find the named cookie in the request's `Cookie` headers.
pub fn extract_cookie(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    for value in headers.get_all(header::COOKIE) {
        let Ok(cookie_header) = value.to_str() else {
            continue;
        };

        for cookie_str in cookie_header.split(';') {
            if let Ok(cookie) = Cookie::parse(cookie_str.trim()) {
                if cookie.name() == cookie_name {
                    return Some(cookie.value().to_string());
                }
            }
        }
    }

    None
}
