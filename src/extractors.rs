use super::{
    models::{AppState, User},
    session,
};
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use regex::Regex;
use std::{convert::Infallible, sync::OnceLock};

/// The signed-in user, if the request carries a valid session cookie. A
/// missing or forged cookie is just "nobody"; the auth gate decides what
/// that means for the active view.
pub struct CurrentUser(pub Option<User>);

fn session_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:^|;\s*)session=([^;]*)").expect("cookie pattern compiles")
    })
}

pub fn user_from_cookie_header(cookie: &str, secret: &[u8]) -> Option<User> {
    let captures = session_re().captures(cookie)?;
    let token = &captures[1];
    match session::deserialize_session(token, secret) {
        Ok(session) => Some(session.user),
        Err(reason) => {
            if !token.is_empty() {
                tracing::debug!(reason, "ignoring session cookie");
            }
            None
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        req: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = req
            .headers
            .get("Cookie")
            .and_then(|c| c.to_str().ok())
            .and_then(|c| {
                user_from_cookie_header(c, &state.config.session_secret)
            });

        Ok(CurrentUser(user))
    }
}
