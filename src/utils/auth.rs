use crate::models::user::Claims;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand_core::OsRng;
use std::env;

pub const DEFAULT_JWT_SECRET: &str = "change-this-to-a-secure-random-string";

const TOKEN_LIFETIME_DAYS: i64 = 7;

/// Hash a PIN using Argon2
pub fn hash_pin(pin: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let pin_hash = argon2.hash_password(pin.as_bytes(), &salt)?;
    Ok(pin_hash.to_string())
}

/// Verify a PIN against a hash
pub fn verify_pin(pin: &str, pin_hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(pin_hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    let argon2 = Argon2::default();

    argon2.verify_password(pin.as_bytes(), &parsed_hash).is_ok()
}

/// Create a JWT token valid for 7 days
pub fn create_jwt(user_id: &str, name: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let secret = env::var("JWT_SECRET").unwrap_or_else(|_| DEFAULT_JWT_SECRET.to_string());
    let expiration = chrono::Utc::now()
        .checked_add_signed(chrono::Duration::days(TOKEN_LIFETIME_DAYS))
        .expect("valid timestamp")
        .timestamp() as usize;

    let claims = Claims {
        sub: user_id.to_owned(),
        name: name.to_owned(),
        exp: expiration,
        iat: chrono::Utc::now().timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
}

/// Decode and validate a JWT token. Expired, malformed, and badly signed
/// tokens all come back as the same opaque error.
pub fn decode_jwt(token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let secret = env::var("JWT_SECRET").unwrap_or_else(|_| DEFAULT_JWT_SECRET.to_string());

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}

/// Serializes every test that reads or writes `JWT_SECRET`, across modules.
#[cfg(test)]
pub(crate) mod test_env {
    use std::sync::Mutex;

    pub static ENV_LOCK: Mutex<()> = Mutex::new(());
}
