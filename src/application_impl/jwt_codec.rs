use crate::application_port::{TokenCodec, TokenError};
use crate::domain_model::{AccessToken, RefreshToken, Subject};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::fmt;

/// PEM-encoded signing and verification keys of one token class.
#[derive(Clone)]
pub struct TokenPair {
    pub private_key: Vec<u8>,
    pub public_key: Vec<u8>,
}

impl TokenPair {
    pub fn from_base64(private_key: &str, public_key: &str) -> Result<Self, TokenError> {
        let private_key = STANDARD
            .decode(private_key.trim())
            .map_err(|e| TokenError::Signing(format!("private key is not base64: {e}")))?;
        let public_key = STANDARD
            .decode(public_key.trim())
            .map_err(|e| TokenError::Key(format!("public key is not base64: {e}")))?;
        Ok(TokenPair {
            private_key,
            public_key,
        })
    }
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair").finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub algorithm: Algorithm,
    pub access: TokenPair,
    pub refresh: TokenPair,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    #[serde(default)]
    sub: Subject,
    exp: i64,
    iat: i64,
    nbf: i64,
    /// Keeps tokens minted in the same second distinct.
    #[serde(default)]
    jti: String,
}

struct KeySet {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeySet {
    fn parse(algorithm: Algorithm, pair: &TokenPair) -> Result<Self, TokenError> {
        let (encoding, decoding) = match algorithm {
            Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512 => (
                EncodingKey::from_rsa_pem(&pair.private_key),
                DecodingKey::from_rsa_pem(&pair.public_key),
            ),
            Algorithm::ES256 | Algorithm::ES384 => (
                EncodingKey::from_ec_pem(&pair.private_key),
                DecodingKey::from_ec_pem(&pair.public_key),
            ),
            Algorithm::EdDSA => (
                EncodingKey::from_ed_pem(&pair.private_key),
                DecodingKey::from_ed_pem(&pair.public_key),
            ),
            other => {
                return Err(TokenError::Key(format!(
                    "{other:?} is not an asymmetric algorithm"
                )));
            }
        };
        let encoding = encoding
            .map_err(|e| TokenError::Signing(format!("couldn't parse private key: {e}")))?;
        let decoding =
            decoding.map_err(|e| TokenError::Key(format!("couldn't parse public key: {e}")))?;
        Ok(KeySet { encoding, decoding })
    }
}

/// Asymmetric JWT codec with one key pair per token class.
pub struct JwtCodec {
    algorithm: Algorithm,
    access: KeySet,
    refresh: KeySet,
}

impl JwtCodec {
    pub fn new(cfg: JwtConfig) -> Result<Self, TokenError> {
        Ok(JwtCodec {
            algorithm: cfg.algorithm,
            access: KeySet::parse(cfg.algorithm, &cfg.access)?,
            refresh: KeySet::parse(cfg.algorithm, &cfg.refresh)?,
        })
    }

    #[inline]
    fn gen_jti() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    fn encode_with(
        &self,
        keys: &KeySet,
        ttl: Duration,
        subject: Subject,
    ) -> Result<(String, DateTime<Utc>), TokenError> {
        let iat_dt = Utc::now();
        let exp_dt = iat_dt + ttl;
        let claims = Claims {
            sub: subject,
            exp: exp_dt.timestamp(),
            iat: iat_dt.timestamp(),
            nbf: iat_dt.timestamp(),
            jti: Self::gen_jti(),
        };
        let token = encode(&Header::new(self.algorithm), &claims, &keys.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))?;
        Ok((token, exp_dt))
    }

    fn decode_with(&self, keys: &KeySet, token: &str) -> Result<Subject, TokenError> {
        let mut v = Validation::new(self.algorithm);
        v.validate_exp = true;
        v.validate_nbf = true;
        v.leeway = 0;
        let data = decode::<Claims>(token, &keys.decoding, &v).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::ImmatureSignature => TokenError::NotYetValid,
            ErrorKind::InvalidSignature
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidAlgorithmName
            | ErrorKind::MissingAlgorithm => TokenError::Signature(e.to_string()),
            _ => TokenError::Malformed(e.to_string()),
        })?;
        Ok(data.claims.sub)
    }
}

impl TokenCodec for JwtCodec {
    fn create_access_token(
        &self,
        ttl: Duration,
        subject: Subject,
    ) -> Result<(AccessToken, DateTime<Utc>), TokenError> {
        let (token, exp_dt) = self.encode_with(&self.access, ttl, subject)?;
        Ok((AccessToken(token), exp_dt))
    }

    fn create_refresh_token(
        &self,
        ttl: Duration,
        subject: Subject,
    ) -> Result<(RefreshToken, DateTime<Utc>), TokenError> {
        let (token, exp_dt) = self.encode_with(&self.refresh, ttl, subject)?;
        Ok((RefreshToken(token), exp_dt))
    }

    fn validate_access_token(&self, token: &AccessToken) -> Result<Subject, TokenError> {
        self.decode_with(&self.access, &token.0)
    }

    fn validate_refresh_token(&self, token: &RefreshToken) -> Result<Subject, TokenError> {
        self.decode_with(&self.refresh, &token.0)
    }
}
