/// HTMX utils
use axum::http::{HeaderMap, HeaderValue};

pub fn is_htmx_request(headers: &HeaderMap) -> bool {
    headers.contains_key("Hx-Request")
}

/// Ask htmx to refetch the toast tray after this response is swapped in.
pub fn trigger_toasts() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("hx-trigger", HeaderValue::from_static("toasts-changed"));
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_htmx_request() {
        let mut headers = HeaderMap::new();
        assert!(!is_htmx_request(&headers));
        headers.insert("hx-request", HeaderValue::from_static("true"));
        assert!(is_htmx_request(&headers));
    }
}
