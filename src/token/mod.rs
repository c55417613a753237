//! Signed access tokens.
//!
//! Compact three-part HS256 tokens, hand-assembled so the validation order is
//! explicit: format, algorithm, signature, issuer, audience, lifetime. There
//! is no clock-skew allowance past `exp`.
//!
//! Permissions travel as a JSON array string inside a single claim value;
//! roles are one entry each. The claim set is a snapshot taken at issuance
//! and does not reflect later role changes until re-issued.

use base64ct::{Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;

use crate::config::TokenConfig;
use crate::model::User;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenHeader {
    pub alg: String,
    pub typ: String,
}

impl TokenHeader {
    fn hs256() -> Self {
        Self {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessClaims {
    pub sub: String,
    pub jti: String,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub provider: String,
    pub roles: Vec<String>,
    /// JSON array string of `"resource:action"` entries.
    pub permissions: String,
    pub verified: bool,
    pub active: bool,
    pub logged_in: bool,
}

impl AccessClaims {
    /// Decode the aggregated permissions claim.
    ///
    /// # Errors
    ///
    /// Returns an error if the claim value is not a JSON string array.
    pub fn permission_list(&self) -> Result<Vec<String>, Error> {
        Ok(serde_json::from_str(&self.permissions)?)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid token format")]
    TokenFormat,
    #[error("invalid base64url encoding")]
    Base64,
    #[error("invalid json")]
    Json(#[from] serde_json::Error),
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlg(String),
    #[error("invalid signing key")]
    InvalidKey,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("invalid issuer")]
    InvalidIssuer,
    #[error("invalid audience")]
    InvalidAudience,
}

/// A freshly minted token and its expiry (unix seconds).
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: i64,
}

fn b64e_json<T: Serialize>(value: &T) -> Result<String, Error> {
    let json = serde_json::to_vec(value)?;
    Ok(Base64UrlUnpadded::encode_string(&json))
}

fn b64d_json<T: for<'de> Deserialize<'de>>(s: &str) -> Result<T, Error> {
    let bytes = Base64UrlUnpadded::decode_vec(s).map_err(|_| Error::Base64)?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn mac_for(config: &TokenConfig) -> Result<HmacSha256, Error> {
    HmacSha256::new_from_slice(config.secret().expose_secret().as_bytes())
        .map_err(|_| Error::InvalidKey)
}

/// Issue a signed access token for `user` with the given effective roles and
/// flattened permission strings.
///
/// # Errors
///
/// Returns an error if claims cannot be encoded or the key is unusable.
pub fn issue(
    config: &TokenConfig,
    user: &User,
    roles: &[String],
    permissions: &[String],
    now_unix_seconds: i64,
) -> Result<IssuedToken, Error> {
    let expires_at = now_unix_seconds + config.ttl_hours() * 3600;
    let claims = AccessClaims {
        sub: user.id.to_string(),
        jti: Uuid::new_v4().to_string(),
        iss: config.issuer().to_string(),
        aud: config.audience().to_string(),
        iat: now_unix_seconds,
        exp: expires_at,
        username: user.username.clone(),
        email: user.email.clone(),
        provider: user.provider.to_string(),
        roles: roles.to_vec(),
        permissions: serde_json::to_string(permissions)?,
        verified: user.is_verified,
        active: user.is_active,
        logged_in: user.is_logged_in,
    };

    let header_b64 = b64e_json(&TokenHeader::hs256())?;
    let claims_b64 = b64e_json(&claims)?;
    let signing_input = format!("{header_b64}.{claims_b64}");

    let mut mac = mac_for(config)?;
    mac.update(signing_input.as_bytes());
    let tag = mac.finalize().into_bytes();
    let signature_b64 = Base64UrlUnpadded::encode_string(tag.as_slice());

    Ok(IssuedToken {
        token: format!("{signing_input}.{signature_b64}"),
        expires_at,
    })
}

/// Verify an inbound token and return its decoded claims.
///
/// # Errors
///
/// Returns an error if:
/// - the token is malformed or contains invalid base64/json,
/// - the algorithm is not HS256,
/// - the signature does not verify,
/// - the claims fail validation (`iss`, `aud`, `exp`); `exp` is compared
///   against `now_unix_seconds` with zero tolerance.
pub fn decode(
    config: &TokenConfig,
    token: &str,
    now_unix_seconds: i64,
) -> Result<AccessClaims, Error> {
    let mut parts = token.split('.');
    let header_b64 = parts.next().ok_or(Error::TokenFormat)?;
    let claims_b64 = parts.next().ok_or(Error::TokenFormat)?;
    let sig_b64 = parts.next().ok_or(Error::TokenFormat)?;
    if parts.next().is_some() {
        return Err(Error::TokenFormat);
    }

    let header: TokenHeader = b64d_json(header_b64)?;
    if header.alg != "HS256" {
        return Err(Error::UnsupportedAlg(header.alg));
    }

    let signature = Base64UrlUnpadded::decode_vec(sig_b64).map_err(|_| Error::Base64)?;
    let signing_input = format!("{header_b64}.{claims_b64}");
    let mut mac = mac_for(config)?;
    mac.update(signing_input.as_bytes());
    mac.verify_slice(&signature)
        .map_err(|_| Error::InvalidSignature)?;

    let claims: AccessClaims = b64d_json(claims_b64)?;
    if claims.iss != config.issuer() {
        return Err(Error::InvalidIssuer);
    }
    if claims.aud != config.audience() {
        return Err(Error::InvalidAudience);
    }
    if claims.exp <= now_unix_seconds {
        return Err(Error::Expired);
    }

    Ok(claims)
}
