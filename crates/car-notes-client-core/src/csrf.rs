//! Reads the CSRF token the server stores in a cookie so it can be echoed
//! back in the request header

use car_notes_shared::const_config::csrf::CSRF_COOKIE_NAME;

/// Finds the CSRF token in a `Cookie` header style string
/// (`name1=value1; name2=value2`)
///
/// Returns [`None`] if the cookie is missing or empty
pub(crate) fn token_from_cookie_str(cookies: &str) -> Option<String> {
    cookies
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == CSRF_COOKIE_NAME)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn read_token(jar: &reqwest::cookie::Jar, server_url: &str) -> Option<String> {
    use reqwest::cookie::CookieStore as _;

    let url = match reqwest::Url::parse(server_url) {
        Ok(url) => url,
        Err(err) => {
            tracing::warn!(?err, server_url, "unable to parse server url to look up cookies");
            return None;
        }
    };
    let header = jar.cookies(&url)?;
    token_from_cookie_str(header.to_str().ok()?)
}

/// On the web the browser owns the cookies so they are read from the document
#[cfg(target_arch = "wasm32")]
pub(crate) fn read_token() -> Option<String> {
    use wasm_bindgen::JsCast as _;

    let document = web_sys::window()?
        .document()?
        .dyn_into::<web_sys::HtmlDocument>()
        .ok()?;
    token_from_cookie_str(&document.cookie().ok()?)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::only_cookie("csrftoken=abc123", Some("abc123"))]
    #[case::among_others("sessionid=xyz; csrftoken=abc123; theme=dark", Some("abc123"))]
    #[case::no_space_after_separator("sessionid=xyz;csrftoken=abc123", Some("abc123"))]
    #[case::missing("sessionid=xyz", None)]
    #[case::empty_value("csrftoken=", None)]
    #[case::empty_string("", None)]
    #[case::similar_name("mycsrftoken=abc123", None)]
    fn find_token(#[case] cookies: &str, #[case] expected: Option<&str>) {
        assert_eq!(token_from_cookie_str(cookies).as_deref(), expected);
    }
}
