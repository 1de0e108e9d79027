//! Development session tokens.
//!
//! Signs the same HS256 token the identity provider would hand back after
//! sign-in, so the JSON API can be exercised with `curl` or the integration
//! tests without going through the hosted sign-in page.

use storekeep_admin::config::IdentityConfig;
use storekeep_admin::services::{IdentityVerifier, SessionClaims};
use storekeep_core::UserId;

use super::CommandError;

/// Build a signed token for `user` valid for `ttl` seconds from `now`.
///
/// # Errors
///
/// Returns an error if `user` is not a valid user id or `ttl` is not positive.
pub fn mint(
    verifier: &IdentityVerifier,
    issuer: Option<&str>,
    user: &str,
    now: i64,
    ttl: i64,
) -> Result<String, CommandError> {
    UserId::parse(user).map_err(|e| CommandError::Seed(format!("user id: {e}")))?;
    if ttl <= 0 {
        return Err(CommandError::Seed("ttl must be positive".to_owned()));
    }

    let mut claims = SessionClaims::new(user, now, ttl);
    claims.iss = issuer.map(str::to_owned);
    Ok(verifier.issue(&claims)?)
}

/// Print a token for `user` on stdout.
///
/// # Errors
///
/// Returns an error if `IDENTITY_*` configuration is missing or signing fails.
pub fn run(user: &str, ttl: i64) -> Result<(), CommandError> {
    let _ = dotenvy::dotenv();
    let identity = IdentityConfig::from_env()?;
    let verifier = IdentityVerifier::new(&identity);

    let token = mint(
        &verifier,
        identity.issuer.as_deref(),
        user,
        chrono::Utc::now().timestamp(),
        ttl,
    )?;

    #[allow(clippy::print_stdout)]
    {
        println!("{token}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;
    use url::Url;

    use super::*;

    fn verifier() -> IdentityVerifier {
        IdentityVerifier::new(&IdentityConfig {
            sign_in_url: Url::parse("https://accounts.example.com/sign-in").expect("url"),
            sign_out_url: None,
            jwt_secret: SecretString::from("k3v9Qx7LmP2rT8wZ5nB1cF6hJ4dS0aYe"),
            issuer: Some("https://accounts.example.com".to_owned()),
        })
    }

    #[test]
    fn test_minted_token_verifies() {
        let verifier = verifier();
        let now = chrono::Utc::now().timestamp();
        let token = mint(
            &verifier,
            Some("https://accounts.example.com"),
            "user_2abc",
            now,
            600,
        )
        .expect("token");

        let claims = verifier.verify_at(&token, now).expect("valid token");
        assert_eq!(claims.sub, "user_2abc");
    }

    #[test]
    fn test_rejects_non_positive_ttl() {
        let verifier = verifier();
        assert!(mint(&verifier, None, "user_2abc", 0, 0).is_err());
    }

    #[test]
    fn test_rejects_blank_user() {
        let verifier = verifier();
        assert!(mint(&verifier, None, "  ", 0, 60).is_err());
    }
}
