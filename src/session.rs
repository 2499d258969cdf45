use super::{crypto, models::User};
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};

pub const COOKIE_NAME: &str = "session";

/// HMAC-secured session string, signed by $SESSION_SECRET
///
/// Note: since this guy is stored in a browser cookie, it's important to
/// esure it does not get too large.
#[derive(Debug, Serialize, Deserialize)]
pub struct Session {
    pub user: User,
    pub created_at: u64,
}

pub fn serialize_session(session: &Session, secret: &[u8]) -> String {
    let json_bytes = serde_json::to_string(&session)
        .expect("session can be JSON serialized");
    let b64 = general_purpose::STANDARD_NO_PAD.encode(json_bytes);
    let raw_digest = crypto::get_digest(secret, b64.as_bytes());
    let digest = general_purpose::STANDARD_NO_PAD.encode(raw_digest);

    format!("{}:{}", b64, digest)
}

pub fn deserialize_session(
    cookie: &str,
    secret: &[u8],
) -> Result<Session, &'static str> {
    let Some((b64_json, b64_digest)) = cookie.split_once(':') else {
        return Err("Invalid session");
    };
    let digest = general_purpose::STANDARD_NO_PAD
        .decode(b64_digest)
        .map_err(|_| "Cannot base64 decode the digest")?;
    if !crypto::is_valid(secret, b64_json.as_bytes(), &digest) {
        return Err("Failed to validate session signature");
    }
    let json_string = general_purpose::STANDARD_NO_PAD
        .decode(b64_json)
        .map_err(|_| "Cannot base64 decode session string")?;

    serde_json::from_slice(&json_string)
        .map_err(|_| "Cannot deserialize session JSON")
}

pub fn set_cookie_header(token: &str) -> String {
    format!("{COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Strict")
}

pub fn clear_cookie_header() -> String {
    format!("{COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0")
}
