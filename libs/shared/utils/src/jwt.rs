use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, TimeZone, Utc};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use tracing::debug;

use shared_models::auth::{JwtClaims, User};

type HmacSha256 = Hmac<Sha256>;

/// Issue an HS256 token for a freshly registered or logged-in account.
/// The role claim ("patient" or "professional") keeps the two identity
/// spaces apart downstream.
pub fn issue_token(
    user_id: &str,
    email: &str,
    role: &str,
    jwt_secret: &str,
    ttl_hours: i64,
) -> Result<String, String> {
    if jwt_secret.is_empty() {
        return Err("JWT secret is not set".to_string());
    }

    let now = Utc::now();
    let exp = now + Duration::hours(ttl_hours);

    let header = json!({ "alg": "HS256", "typ": "JWT" });
    let claims = json!({
        "sub": user_id,
        "email": email,
        "role": role,
        "iat": now.timestamp(),
        "exp": exp.timestamp(),
    });

    let header_encoded = URL_SAFE_NO_PAD.encode(header.to_string());
    let claims_encoded = URL_SAFE_NO_PAD.encode(claims.to_string());
    let signing_input = format!("{}.{}", header_encoded, claims_encoded);

    let mut mac = HmacSha256::new_from_slice(jwt_secret.as_bytes())
        .map_err(|_| "Failed to create HMAC".to_string())?;
    mac.update(signing_input.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{}.{}", signing_input, signature))
}

pub fn validate_token(token: &str, jwt_secret: &str) -> Result<User, String> {
    if jwt_secret.is_empty() {
        return Err("JWT secret is not set".to_string());
    }

    // Split token into parts
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err("Invalid token format".to_string());
    }

    let header_b64 = parts[0];
    let claims_b64 = parts[1];
    let signature_b64 = parts[2];

    let signature = match URL_SAFE_NO_PAD.decode(signature_b64) {
        Ok(sig) => sig,
        Err(e) => {
            debug!("Failed to decode signature: {}", e);
            return Err("Invalid signature encoding".to_string());
        }
    };

    let signing_input = format!("{}.{}", header_b64, claims_b64);

    let mut mac = HmacSha256::new_from_slice(jwt_secret.as_bytes())
        .map_err(|_| "Failed to create HMAC".to_string())?;
    mac.update(signing_input.as_bytes());

    if mac.verify_slice(&signature).is_err() {
        debug!("Token signature verification failed");
        return Err("Invalid token signature".to_string());
    }

    // Decode claims
    let claims_json = match URL_SAFE_NO_PAD.decode(claims_b64) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(json_str) => json_str,
            Err(_) => return Err("Invalid claims encoding".to_string()),
        },
        Err(_) => return Err("Invalid claims encoding".to_string()),
    };

    let claims: JwtClaims = match serde_json::from_str(&claims_json) {
        Ok(c) => c,
        Err(e) => {
            debug!("Failed to parse claims: {}", e);
            return Err("Invalid claims format".to_string());
        }
    };

    // Check expiration
    if let Some(exp) = claims.exp {
        let now = Utc::now().timestamp() as u64;
        if exp < now {
            debug!("Token expired at {} (now: {})", exp, now);
            return Err("Token expired".to_string());
        }
    }

    let created_at = claims
        .iat
        .map(|timestamp| Utc.timestamp_opt(timestamp as i64, 0).single());

    let user = User {
        id: claims.sub,
        email: claims.email,
        role: claims.role,
        created_at: created_at.flatten(),
    };

    debug!("Token validated successfully for user: {}", user.id);
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret-key-long-enough-for-hs256";

    #[test]
    fn issued_token_validates() {
        let token = issue_token("user-1", "a@b.com", "patient", SECRET, 24).unwrap();
        let user = validate_token(&token, SECRET).unwrap();

        assert_eq!(user.id, "user-1");
        assert_eq!(user.email.as_deref(), Some("a@b.com"));
        assert_eq!(user.role.as_deref(), Some("patient"));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_token("user-1", "a@b.com", "patient", SECRET, 24).unwrap();
        assert!(validate_token(&token, "some-other-secret").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = issue_token("user-1", "a@b.com", "patient", SECRET, -1).unwrap();
        assert_eq!(validate_token(&token, SECRET).unwrap_err(), "Token expired");
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert!(issue_token("user-1", "a@b.com", "patient", "", 24).is_err());
        assert!(validate_token("a.b.c", "").is_err());
    }
}
