use super::errors::ServerError;
use axum::{
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::Response,
};

/// Everything we serve is HTML. Handlers return bare `String`s, which axum
/// labels `text/plain`, so this overrides whatever is there.
pub async fn html_headers<B>(
    request: Request<B>,
    next: Next<B>,
) -> Result<Response, ServerError> {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str("text/html; charset=utf-8")?,
    );

    Ok(response)
}

/// Every response depends on session state and must never be cached.
pub async fn no_store<B>(
    request: Request<B>,
    next: Next<B>,
) -> Result<Response, ServerError> {
    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_str("no-store")?);

    Ok(response)
}
