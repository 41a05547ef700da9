use http::HeaderMap;
use http::header::{COOKIE, HeaderValue, InvalidHeaderValue};
use uuid::Uuid;

/// Cookie carrying the opaque session token that scopes the profile cache.
pub const SESSION_COOKIE: &str = "reelview_session";

/// The session token from the request's cookies, if it is one we could have issued.
pub fn session_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, token)| token)
        .filter(|token| is_session_token(token))
        .map(str::to_string)
}

pub fn new_session() -> String {
    Uuid::new_v4().simple().to_string()
}

pub fn set_cookie_header(token: &str) -> Result<HeaderValue, InvalidHeaderValue> {
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax"
    ))
}

fn is_session_token(token: &str) -> bool {
    token.len() == 32 && token.bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_roundtrips_through_cookie() {
        let token = new_session();
        assert_eq!(token.len(), 32);

        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {SESSION_COOKIE}={token}")).unwrap(),
        );
        assert_eq!(session_from_headers(&headers), Some(token.clone()));

        let cookie = set_cookie_header(&token).unwrap();
        assert_eq!(
            cookie.to_str().unwrap(),
            format!("reelview_session={token}; Path=/; HttpOnly; SameSite=Lax")
        );
    }

    #[test]
    fn test_sessions_are_unique() {
        assert_ne!(new_session(), new_session());
    }

    #[test]
    fn test_rejects_foreign_tokens() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_from_headers(&headers), None);

        headers.insert(COOKIE, HeaderValue::from_static("reelview_session=1700000000000"));
        assert_eq!(session_from_headers(&headers), None);

        headers.insert(
            COOKIE,
            HeaderValue::from_static("other_session=0123456789abcdef0123456789abcdef"),
        );
        assert_eq!(session_from_headers(&headers), None);
    }
}
