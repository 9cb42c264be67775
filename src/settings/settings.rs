use anyhow::{Result, anyhow};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::fmt;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub http: Http,
    pub log: Log,
    pub token: Token,
    #[serde(default)]
    pub cookie: Cookie,
    pub user: User,
    pub revocation: Revocation,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Http {
    pub address: String,
    #[serde(default)]
    pub cert_path: Option<String>,
    #[serde(default)]
    pub key_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub filter: String,
}

#[derive(Clone, Deserialize)]
pub struct Token {
    /// JWS algorithm name, e.g. "ES256", "RS256" or "EdDSA".
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
    pub access_ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
    /// Base64-encoded PEM key material.
    pub access_private_key: String,
    pub access_public_key: String,
    pub refresh_private_key: String,
    pub refresh_public_key: String,
    #[serde(default)]
    pub rotate_refresh_tokens: bool,
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("algorithm", &self.algorithm)
            .field("access_ttl_minutes", &self.access_ttl_minutes)
            .field("refresh_ttl_minutes", &self.refresh_ttl_minutes)
            .field("access_private_key", &"<redacted>")
            .field("access_public_key", &"<redacted>")
            .field("refresh_private_key", &"<redacted>")
            .field("refresh_public_key", &"<redacted>")
            .field("rotate_refresh_tokens", &self.rotate_refresh_tokens)
            .finish()
    }
}

fn default_algorithm() -> String {
    "ES256".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Cookie {
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default = "default_secure")]
    pub secure: bool,
    #[serde(default)]
    pub same_site: SameSite,
}

/// `SameSite` attribute of the issued cookies, spelled as in the header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum SameSite {
    Strict,
    #[default]
    Lax,
    None,
}

impl From<SameSite> for cookie::SameSite {
    fn from(same_site: SameSite) -> Self {
        match same_site {
            SameSite::Strict => cookie::SameSite::Strict,
            SameSite::Lax => cookie::SameSite::Lax,
            SameSite::None => cookie::SameSite::None,
        }
    }
}

impl Cookie {
    /// Rejects a domain that could not travel inside a `Set-Cookie` header.
    pub fn validate(&self) -> Result<()> {
        if let Some(domain) = &self.domain {
            let valid = domain
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
            if !valid {
                return Err(anyhow!("invalid cookie domain: {:?}", domain));
            }
        }
        Ok(())
    }
}

impl Default for Cookie {
    fn default() -> Self {
        Cookie {
            domain: None,
            secure: default_secure(),
            same_site: SameSite::default(),
        }
    }
}

fn default_secure() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub backend: String, // "memory" or "mysql"
    #[serde(default)]
    pub dsn: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Revocation {
    pub backend: String, // "memory" or "redis"
    #[serde(default)]
    pub dsn: Option<String>,
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

fn default_prefix() -> String {
    "refresh".to_string()
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

const ENV_PREFIX: &str = "STOCKAUTH";

pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__"),
        )
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;
    settings.cookie.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_dev_settings() {
        let settings = parse_settings(Some("settings/dev.toml")).unwrap();
        assert_eq!(settings.user.backend, "memory");
        assert_eq!(settings.revocation.backend, "memory");
        assert!(settings.token.access_ttl_minutes > 0);
        assert!(settings.token.refresh_ttl_minutes > settings.token.access_ttl_minutes);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(parse_settings(Some("settings/does-not-exist.toml")).is_err());
    }

    #[test]
    fn debug_output_redacts_keys() {
        let settings = parse_settings(Some("settings/dev.toml")).unwrap();
        let printed = format!("{:?}", settings.token);
        assert!(printed.contains("<redacted>"));
        assert!(!printed.contains(&settings.token.access_private_key));
    }

    fn cookie_section(toml: &str) -> Result<Cookie> {
        Config::builder()
            .add_source(File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize::<Cookie>()
            .map_err(|e| anyhow!(e))
    }

    #[test]
    fn same_site_is_checked_at_load() {
        let cookie = cookie_section("same_site = \"Strict\"").unwrap();
        assert_eq!(cookie.same_site, SameSite::Strict);
        assert!(cookie.secure);

        assert!(cookie_section("same_site = \"Lax\\n\"").is_err());
        assert!(cookie_section("same_site = \"sideways\"").is_err());
    }

    #[test]
    fn cookie_domain_must_be_header_safe() {
        let cookie = cookie_section("domain = \"auth.example.com\"").unwrap();
        assert!(cookie.validate().is_ok());

        let cookie = cookie_section("domain = \"example.com; Path=/admin\"").unwrap();
        assert!(cookie.validate().is_err());
    }
}
