//! Session tokens issued by the external identity provider.
//!
//! Users sign in on the provider's hosted page; the provider redirects back
//! with a compact HS256 JWS signed with a secret shared with this server. The
//! dashboard never sees a password.
//!
//! Accepted tokens:
//!
//! - header `alg` is exactly `HS256`
//! - signature verified in constant time
//! - `exp` required, `nbf` optional, both with [`LEEWAY_SECS`] of clock skew
//! - `iss` must match when an issuer is configured

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use url::Url;

use storekeep_core::UserId;

use crate::config::IdentityConfig;
use crate::models::CurrentUser;

type HmacSha256 = Hmac<Sha256>;

/// Allowed clock skew between this server and the identity provider.
pub const LEEWAY_SECS: i64 = 60;

/// Errors from token verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("malformed token: {0}")]
    Malformed(&'static str),

    #[error("unsupported token algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("token signature mismatch")]
    BadSignature,

    #[error("token expired")]
    Expired,

    #[error("token not yet valid")]
    NotYetValid,

    #[error("token issued by an unexpected issuer")]
    WrongIssuer,
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    typ: Option<String>,
}

/// Claims carried by an identity-provider session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Provider user id.
    pub sub: String,
    /// Expiry (unix seconds).
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl SessionClaims {
    /// Claims for `sub`, valid from `now` for `ttl_secs`.
    #[must_use]
    pub fn new(sub: impl Into<String>, now: i64, ttl_secs: i64) -> Self {
        Self {
            sub: sub.into(),
            exp: now + ttl_secs,
            nbf: None,
            iat: Some(now),
            iss: None,
            email: None,
            name: None,
        }
    }

    /// The signed-in user described by these claims.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::Malformed` if `sub` is not a usable user id.
    pub fn into_user(self) -> Result<CurrentUser, IdentityError> {
        let id = UserId::parse(&self.sub).map_err(|_| IdentityError::Malformed("subject"))?;
        Ok(CurrentUser {
            id,
            email: self.email,
            name: self.name,
        })
    }
}

/// Verifies (and, for development tooling, mints) session tokens.
#[derive(Clone)]
pub struct IdentityVerifier {
    secret: SecretString,
    issuer: Option<String>,
    sign_in_url: Url,
    sign_out_url: Option<Url>,
}

impl std::fmt::Debug for IdentityVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityVerifier")
            .field("secret", &"[REDACTED]")
            .field("issuer", &self.issuer)
            .field("sign_in_url", &self.sign_in_url.as_str())
            .finish_non_exhaustive()
    }
}

impl IdentityVerifier {
    /// Build a verifier from the identity configuration.
    #[must_use]
    pub fn new(config: &IdentityConfig) -> Self {
        Self {
            secret: config.jwt_secret.clone(),
            issuer: config.issuer.clone(),
            sign_in_url: config.sign_in_url.clone(),
            sign_out_url: config.sign_out_url.clone(),
        }
    }

    /// Verify a token against the current time.
    ///
    /// # Errors
    ///
    /// See [`IdentityError`].
    pub fn verify(&self, token: &str) -> Result<SessionClaims, IdentityError> {
        self.verify_at(token, chrono::Utc::now().timestamp())
    }

    /// Verify a token against an explicit unix time.
    ///
    /// # Errors
    ///
    /// See [`IdentityError`].
    pub fn verify_at(&self, token: &str, now: i64) -> Result<SessionClaims, IdentityError> {
        let mut parts = token.trim().split('.');
        let (Some(header_b64), Some(payload_b64), Some(signature_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(IdentityError::Malformed("expected three segments"));
        };

        let header: Header = decode_segment(header_b64, "header")?;
        if header.alg != "HS256" {
            return Err(IdentityError::UnsupportedAlgorithm(header.alg));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| IdentityError::Malformed("signature encoding"))?;
        let mut mac = self.mac()?;
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(payload_b64.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| IdentityError::BadSignature)?;

        let claims: SessionClaims = decode_segment(payload_b64, "claims")?;

        if now > claims.exp.saturating_add(LEEWAY_SECS) {
            return Err(IdentityError::Expired);
        }
        if let Some(nbf) = claims.nbf
            && now < nbf.saturating_sub(LEEWAY_SECS)
        {
            return Err(IdentityError::NotYetValid);
        }
        if let Some(expected) = &self.issuer
            && claims.iss.as_deref() != Some(expected.as_str())
        {
            return Err(IdentityError::WrongIssuer);
        }

        Ok(claims)
    }

    /// Mint a token signed with the shared secret.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::Malformed` if the claims cannot be encoded.
    pub fn issue(&self, claims: &SessionClaims) -> Result<String, IdentityError> {
        let header = Header {
            alg: "HS256".to_owned(),
            typ: Some("JWT".to_owned()),
        };
        let header_json =
            serde_json::to_vec(&header).map_err(|_| IdentityError::Malformed("header"))?;
        let claims_json =
            serde_json::to_vec(claims).map_err(|_| IdentityError::Malformed("claims"))?;

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header_json),
            URL_SAFE_NO_PAD.encode(claims_json)
        );
        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{signing_input}.{signature}"))
    }

    /// The provider's hosted sign-in page, returning to `redirect_url` with
    /// `state` echoed back.
    #[must_use]
    pub fn sign_in_url(&self, redirect_url: &str, state: &str) -> Url {
        let mut url = self.sign_in_url.clone();
        url.query_pairs_mut()
            .append_pair("redirect_url", redirect_url)
            .append_pair("state", state);
        url
    }

    /// The provider's sign-out page, if configured.
    #[must_use]
    pub fn sign_out_url(&self, redirect_url: &str) -> Option<Url> {
        self.sign_out_url.as_ref().map(|base| {
            let mut url = base.clone();
            url.query_pairs_mut().append_pair("redirect_url", redirect_url);
            url
        })
    }

    fn mac(&self) -> Result<HmacSha256, IdentityError> {
        HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| IdentityError::Malformed("secret"))
    }
}

fn decode_segment<T: serde::de::DeserializeOwned>(
    segment: &str,
    what: &'static str,
) -> Result<T, IdentityError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| IdentityError::Malformed(what))?;
    serde_json::from_slice(&bytes).map_err(|_| IdentityError::Malformed(what))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::tests::test_config;

    const NOW: i64 = 1_760_000_000;

    fn verifier() -> IdentityVerifier {
        IdentityVerifier::new(test_config().identity())
    }

    fn verifier_with_issuer(issuer: &str) -> IdentityVerifier {
        let mut config = test_config();
        config.identity.issuer = Some(issuer.to_owned());
        IdentityVerifier::new(config.identity())
    }

    #[test]
    fn test_issue_then_verify() {
        let v = verifier();
        let mut claims = SessionClaims::new("user_2abc", NOW, 3600);
        claims.email = Some("owner@example.com".to_owned());

        let token = v.issue(&claims).unwrap();
        let verified = v.verify_at(&token, NOW + 10).unwrap();
        assert_eq!(verified, claims);

        let user = verified.into_user().unwrap();
        assert_eq!(user.id.as_str(), "user_2abc");
        assert_eq!(user.email.as_deref(), Some("owner@example.com"));
    }

    #[test]
    fn test_expired_token_rejected_after_leeway() {
        let v = verifier();
        let token = v.issue(&SessionClaims::new("u", NOW, 60)).unwrap();

        assert!(v.verify_at(&token, NOW + 60 + LEEWAY_SECS).is_ok());
        assert_eq!(
            v.verify_at(&token, NOW + 61 + LEEWAY_SECS),
            Err(IdentityError::Expired)
        );
    }

    #[test]
    fn test_not_before_honoured() {
        let v = verifier();
        let mut claims = SessionClaims::new("u", NOW, 3600);
        claims.nbf = Some(NOW + 600);
        let token = v.issue(&claims).unwrap();

        assert_eq!(v.verify_at(&token, NOW), Err(IdentityError::NotYetValid));
        assert!(v.verify_at(&token, NOW + 600).is_ok());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let v = verifier();
        let token = v.issue(&SessionClaims::new("alice", NOW, 3600)).unwrap();
        let forged_claims = URL_SAFE_NO_PAD
            .encode(serde_json::to_vec(&SessionClaims::new("mallory", NOW, 3600)).unwrap());

        let parts: Vec<&str> = token.split('.').collect();
        let forged = format!("{}.{}.{}", parts[0], forged_claims, parts[2]);
        assert_eq!(v.verify_at(&forged, NOW), Err(IdentityError::BadSignature));
    }

    #[test]
    fn test_other_secret_rejected() {
        let mut config = test_config();
        config.identity.jwt_secret = SecretString::from("Zx9!pQ2#rT5$vW8&yB1*dF4^gH7@jK0%".to_owned());
        let other = IdentityVerifier::new(config.identity());

        let token = other.issue(&SessionClaims::new("u", NOW, 3600)).unwrap();
        assert_eq!(verifier().verify_at(&token, NOW), Err(IdentityError::BadSignature));
    }

    #[test]
    fn test_none_algorithm_rejected() {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let claims =
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&SessionClaims::new("u", NOW, 3600)).unwrap());
        let token = format!("{header}.{claims}.");

        assert_eq!(
            verifier().verify_at(&token, NOW),
            Err(IdentityError::UnsupportedAlgorithm("none".to_owned()))
        );
    }

    #[test]
    fn test_malformed_tokens() {
        let v = verifier();
        assert!(matches!(v.verify_at("", NOW), Err(IdentityError::Malformed(_))));
        assert!(matches!(v.verify_at("a.b", NOW), Err(IdentityError::Malformed(_))));
        assert!(matches!(v.verify_at("a.b.c.d", NOW), Err(IdentityError::Malformed(_))));
        assert!(matches!(v.verify_at("!!.??.##", NOW), Err(IdentityError::Malformed(_))));
    }

    #[test]
    fn test_issuer_checked_when_configured() {
        let v = verifier_with_issuer("https://accounts.test.dev");

        let mut claims = SessionClaims::new("u", NOW, 3600);
        let token = v.issue(&claims).unwrap();
        assert_eq!(v.verify_at(&token, NOW), Err(IdentityError::WrongIssuer));

        claims.iss = Some("https://accounts.test.dev".to_owned());
        let token = v.issue(&claims).unwrap();
        assert!(v.verify_at(&token, NOW).is_ok());
    }

    #[test]
    fn test_empty_subject_is_not_a_user() {
        let claims = SessionClaims::new("  ", NOW, 3600);
        assert_eq!(claims.into_user().unwrap_err(), IdentityError::Malformed("subject"));
    }

    #[test]
    fn test_sign_in_url_encodes_parameters() {
        let url = verifier().sign_in_url("http://localhost:3001/auth/callback?x=1", "abc");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        assert!(url.as_str().starts_with("https://accounts.test.dev/sign-in?"));
        assert_eq!(
            pairs,
            vec![
                (
                    "redirect_url".to_owned(),
                    "http://localhost:3001/auth/callback?x=1".to_owned()
                ),
                ("state".to_owned(), "abc".to_owned()),
            ]
        );
    }

    #[test]
    fn test_debug_redacts_secret() {
        let debug = format!("{:?}", verifier());
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("q8Zr"));
    }
}
