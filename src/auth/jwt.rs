use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::debug;

use crate::{config::JwtConfig, error::AuthError};

const ALGORITHM: Algorithm = Algorithm::HS256;

/// JWT payload used for authentication.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // account id
    pub iat: usize,
    pub exp: usize,
    pub iss: String,
    pub aud: String,
}

/// Any reason a token is not honored. The cause is deliberately not carried.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid token")]
pub struct InvalidToken;

/// Signs and validates identity tokens with an injected HMAC secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    default_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            default_ttl: Duration::seconds(cfg.ttl_minutes.saturating_mul(60)),
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn issue(&self, account_id: i64) -> Result<String, AuthError> {
        self.issue_with_ttl(account_id, self.default_ttl)
    }

    /// A negative `ttl` yields a token that is already expired.
    pub fn issue_with_ttl(&self, account_id: i64, ttl: Duration) -> Result<String, AuthError> {
        let now = OffsetDateTime::now_utc();
        let exp = now
            .checked_add(ttl)
            .ok_or_else(|| AuthError::internal(format!("token ttl out of range: {ttl}")))?
            .unix_timestamp()
            .max(0);
        let claims = Claims {
            sub: account_id.to_string(),
            iat: now.unix_timestamp() as usize,
            exp: exp as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::new(ALGORITHM), &claims, &self.encoding)
            .map_err(|e| AuthError::internal(format!("jwt sign failed: {e}")))?;
        debug!(account_id, "jwt signed");
        Ok(token)
    }

    /// Checks signature and algorithm, then expiry, then extracts the subject.
    pub fn validate(&self, token: &str) -> Result<i64, InvalidToken> {
        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            debug!(error = %e, "jwt rejected");
            InvalidToken
        })?;
        // jsonwebtoken only rejects `exp < now`; a token expiring this second is done too.
        let now = OffsetDateTime::now_utc().unix_timestamp();
        if data.claims.exp as i64 <= now {
            debug!("jwt expired");
            return Err(InvalidToken);
        }
        let account_id = data.claims.sub.parse::<i64>().map_err(|_| {
            debug!("jwt subject is not an account id");
            InvalidToken
        })?;
        debug!(account_id, "jwt verified");
        Ok(account_id)
    }
}
