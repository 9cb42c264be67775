use crate::settings;
use ::cookie::time::Duration;
use ::cookie::{Cookie, SameSite};
use chrono::{DateTime, Utc};

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";
pub const LOGGED_IN_COOKIE: &str = "logged_in";

/// Attributes shared by every cookie the service sets.
#[derive(Debug, Clone)]
pub struct CookiePolicy {
    pub domain: Option<String>,
    pub secure: bool,
    pub same_site: SameSite,
}

impl From<&settings::Cookie> for CookiePolicy {
    fn from(cookie: &settings::Cookie) -> Self {
        CookiePolicy {
            domain: cookie.domain.clone().filter(|d| !d.is_empty()),
            secure: cookie.secure,
            same_site: cookie.same_site.into(),
        }
    }
}

impl CookiePolicy {
    /// Cookie living until `expires_at`.
    pub fn until(
        &self,
        name: &'static str,
        value: &str,
        expires_at: DateTime<Utc>,
        http_only: bool,
    ) -> Cookie<'static> {
        let max_age = (expires_at - Utc::now()).num_seconds().max(0);
        self.build(name, value.to_string(), http_only)
            .max_age(Duration::seconds(max_age))
            .build()
    }

    /// Cookie that makes the client drop `name`.
    pub fn clear(&self, name: &'static str, http_only: bool) -> Cookie<'static> {
        let mut cookie = self.build(name, String::new(), http_only).build();
        cookie.make_removal();
        cookie
    }

    fn build(
        &self,
        name: &'static str,
        value: String,
        http_only: bool,
    ) -> ::cookie::CookieBuilder<'static> {
        let builder = Cookie::build((name, value))
            .http_only(http_only)
            .secure(self.secure)
            .same_site(self.same_site)
            .path("/");
        match &self.domain {
            Some(domain) => builder.domain(domain.clone()),
            None => builder,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(secure: bool) -> CookiePolicy {
        CookiePolicy {
            domain: Some("example.com".to_string()),
            secure,
            same_site: SameSite::Lax,
        }
    }

    #[test]
    fn token_cookie_carries_all_attributes() {
        let cookie = policy(true).until(
            REFRESH_TOKEN_COOKIE,
            "abc",
            Utc::now() + chrono::Duration::minutes(10),
            true,
        );
        assert_eq!(cookie.name(), "refresh_token");
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.domain(), Some("example.com"));
        let max_age = cookie.max_age().unwrap();
        assert!(max_age > Duration::minutes(9) && max_age <= Duration::minutes(10));

        let header = cookie.to_string();
        assert!(header.starts_with("refresh_token=abc;"));
        assert!(header.contains("HttpOnly"));
        assert!(header.contains("SameSite=Lax"));
    }

    #[test]
    fn insecure_policy_omits_secure_flag() {
        let header = policy(false)
            .until(LOGGED_IN_COOKIE, "true", Utc::now(), false)
            .to_string();
        assert!(!header.contains("Secure"));
        assert!(!header.contains("HttpOnly"));
        assert!(header.contains("Max-Age=0"));
    }

    #[test]
    fn cleared_cookie_expires_immediately() {
        let cookie = policy(false).clear(ACCESS_TOKEN_COOKIE, true);
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
        assert_eq!(cookie.domain(), Some("example.com"));
        assert!(cookie.to_string().contains("Max-Age=0"));
    }

    #[test]
    fn policy_follows_settings() {
        let settings = settings::Cookie {
            domain: Some(String::new()),
            secure: true,
            same_site: settings::SameSite::Strict,
        };
        let policy = CookiePolicy::from(&settings);
        assert_eq!(policy.domain, None);
        assert_eq!(policy.same_site, SameSite::Strict);
    }
}
