use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, decode_header, encode,
};
use serde_json::json;

use super::errors::{InvalidTokenReason, JwtError};
use super::types::{Claims, Jwks};

const RESERVED_CLAIMS: [&str; 4] = ["exp", "nbf", "iat", "jti"];

/// Signs a HS256 token with the active key of `jwks`.
///
/// The token carries `exp` (now + `ttl`), `nbf`, `iat` and a random `jti`,
/// merged with `custom_claims`. A custom claim with a reserved name replaces
/// the generated one.
pub fn generate_jwt(jwks: &Jwks, custom_claims: Claims, ttl: Duration) -> Result<String, JwtError> {
    let jwk = jwks.active().ok_or(JwtError::ActiveKeyMissing)?;

    let now = Utc::now();
    let mut claims = Claims::from([
        ("exp".to_string(), json!((now + ttl).timestamp())),
        ("nbf".to_string(), json!(now.timestamp())),
        ("iat".to_string(), json!(now.timestamp())),
        ("jti".to_string(), json!(uuid::Uuid::new_v4().to_string())),
    ]);

    for (name, value) in custom_claims {
        if RESERVED_CLAIMS.contains(&name.as_str()) {
            tracing::warn!("Custom claim '{}' overrides the generated one", name);
        }
        claims.insert(name, value);
    }

    let mut header = Header::new(Algorithm::HS256);
    header.kid = Some(jwk.kid.clone());

    encode(&header, &claims, &EncodingKey::from_secret(&jwk.secret))
        .map_err(|e| JwtError::SignFailure(e.to_string()))
}

/// Verifies `token` against the key named by its `kid` header and returns
/// its claims.
///
/// Only HS256 is accepted and `exp` is required. `leeway` widens the `exp`,
/// `nbf` and `iat` checks symmetrically. It is applied in whole seconds,
/// rounding a fractional leeway up; a negative leeway counts as zero.
pub fn parse_jwt(jwks: &Jwks, token: &str, leeway: Duration) -> Result<Claims, JwtError> {
    let header = decode_header(token).map_err(|e| JwtError::ClaimsParse(e.to_string()))?;

    if header.alg != Algorithm::HS256 {
        tracing::debug!("Rejected token signed with {:?}", header.alg);
        return Err(JwtError::Invalid(InvalidTokenReason::Algorithm));
    }

    let kid = header.kid.ok_or(JwtError::KidMissing)?;
    let jwk = jwks
        .get_by_kid(&kid)
        .ok_or_else(|| JwtError::KidUnknown(kid.clone()))?;

    let leeway = leeway_seconds(leeway);

    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = leeway;
    validation.validate_exp = true;
    validation.validate_nbf = true;
    validation.validate_aud = false;
    validation.set_required_spec_claims(&["exp"]);

    let data = decode::<Claims>(token, &DecodingKey::from_secret(&jwk.secret), &validation)?;
    check_issued_at(&data.claims, leeway)?;

    Ok(data.claims)
}

fn leeway_seconds(leeway: Duration) -> u64 {
    let whole = leeway.num_seconds();
    let rounded = if leeway > Duration::seconds(whole) {
        whole.saturating_add(1)
    } else {
        whole
    };
    u64::try_from(rounded).unwrap_or(0)
}

fn check_issued_at(claims: &Claims, leeway: u64) -> Result<(), JwtError> {
    let Some(iat) = claims.get("iat") else {
        return Ok(());
    };

    let iat = iat
        .as_i64()
        .or_else(|| iat.as_f64().map(|f| f as i64))
        .ok_or_else(|| JwtError::Invalid(InvalidTokenReason::MalformedClaim("iat".to_string())))?;

    let latest = Utc::now().timestamp().saturating_add_unsigned(leeway);
    if iat > latest {
        return Err(JwtError::Invalid(InvalidTokenReason::IssuedInFuture));
    }
    Ok(())
}
