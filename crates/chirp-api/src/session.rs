//! Stateless session tokens and the cookie that carries them.

use axum::http::{HeaderMap, header};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::debug;
use uuid::Uuid;

use chirp_types::api::Claims;

pub const SESSION_COOKIE: &str = "access_token";

/// Mints and checks HS256 tokens bound to a profile id.
///
/// Nothing is stored server-side, so a token stays valid until it expires.
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::default();
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    pub fn issue(&self, profile_id: Uuid) -> anyhow::Result<String> {
        self.issue_at(profile_id, Utc::now())
    }

    pub fn issue_at(&self, profile_id: Uuid, now: DateTime<Utc>) -> anyhow::Result<String> {
        let expires = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| anyhow::anyhow!("Token lifetime {} overflows the clock", self.ttl))?;
        let claims = Claims {
            sub: profile_id,
            iat: now.timestamp() as usize,
            exp: expires.timestamp() as usize,
        };

        let token = encode(&Header::default(), &claims, &self.encoding)?;
        Ok(token)
    }

    /// `None` for anything malformed, tampered with, or expired.
    pub fn verify(&self, token: &str) -> Option<Uuid> {
        match decode::<Claims>(token, &self.decoding, &self.validation) {
            Ok(data) => Some(data.claims.sub),
            Err(e) => {
                debug!("Rejected session token: {}", e);
                None
            }
        }
    }
}

// -- Cookie transport --

// Set and clear must share this attribute set, or some clients keep the old cookie.
fn base_cookie(value: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .build()
}

/// Session-lifetime cookie holding `token`.
pub fn session_cookie(token: String) -> Cookie<'static> {
    base_cookie(token)
}

/// Empty cookie with `Max-Age=0` and a past expiry.
pub fn removal_cookie() -> Cookie<'static> {
    let mut cookie = base_cookie(String::new());
    cookie.make_removal();
    cookie
}

pub fn attach(jar: CookieJar, token: String) -> CookieJar {
    jar.add(session_cookie(token))
}

pub fn clear(jar: CookieJar) -> CookieJar {
    jar.add(removal_cookie())
}

/// Token from the session cookie, falling back to an `Authorization: Bearer`
/// header for non-browser clients.
pub fn extract_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.trim().strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new("test-secret", Duration::hours(1))
    }

    #[test]
    fn issued_token_verifies_to_its_profile() {
        let issuer = issuer();
        let id = Uuid::new_v4();

        let token = issuer.issue(id).unwrap();
        assert_eq!(issuer.verify(&token), Some(id));
    }

    #[test]
    fn tampered_token_is_rejected() {
        let issuer = issuer();
        let token = issuer.issue(Uuid::new_v4()).unwrap();

        // Swap one character inside the signature segment.
        let sig_start = token.rfind('.').unwrap() + 1;
        let pos = sig_start + 5;
        let original = token.as_bytes()[pos];
        let replacement = if original == b'A' { "B" } else { "A" };
        let mut tampered = token.clone();
        tampered.replace_range(pos..pos + 1, replacement);

        assert_ne!(tampered, token);
        assert_eq!(issuer.verify(&tampered), None);
    }

    #[test]
    fn expired_token_is_rejected() {
        let issuer = issuer();
        let issued = Utc::now() - Duration::hours(2);

        let token = issuer.issue_at(Uuid::new_v4(), issued).unwrap();
        assert_eq!(issuer.verify(&token), None);
    }

    #[test]
    fn oversized_lifetime_is_an_error() {
        let issuer = TokenIssuer::new("test-secret", Duration::hours(10_000_000_000));
        assert!(issuer.issue(Uuid::new_v4()).is_err());
    }

    #[test]
    fn token_from_another_secret_is_rejected() {
        let other = TokenIssuer::new("other-secret", Duration::hours(1));
        let token = other.issue(Uuid::new_v4()).unwrap();

        assert_eq!(issuer().verify(&token), None);
        assert_eq!(issuer().verify("not.a.token"), None);
    }

    #[test]
    fn set_and_clear_share_attributes() {
        let set = session_cookie("abc".into()).to_string();
        let cleared = removal_cookie().to_string();

        for attr in ["HttpOnly", "Secure", "SameSite=None", "Path=/"] {
            assert!(set.contains(attr), "set cookie missing {attr}: {set}");
            assert!(cleared.contains(attr), "clear cookie missing {attr}: {cleared}");
        }
        assert!(set.starts_with("access_token=abc"));
        assert!(!set.contains("Max-Age"));
        assert!(cleared.starts_with("access_token=;"));
        assert!(cleared.contains("Max-Age=0"));
    }

    #[test]
    fn cookie_wins_over_bearer_header() {
        let jar = CookieJar::new().add(session_cookie("from-cookie".into()));
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));

        assert_eq!(extract_token(&jar, &headers).as_deref(), Some("from-cookie"));
        assert_eq!(
            extract_token(&CookieJar::new(), &headers).as_deref(),
            Some("from-header")
        );
        assert_eq!(extract_token(&CookieJar::new(), &HeaderMap::new()), None);
    }
}
