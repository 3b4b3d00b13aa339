use reqwest::{Method, Url};

#[derive(Debug, Clone)]
pub struct PathSpec {
    /// May contain `{name}` placeholders that are filled in by
    /// [`PathSpec::with_params`]
    pub path: &'static str,
    pub method: Method,
}

impl PathSpec {
    pub const fn get(path: &'static str) -> Self {
        Self {
            path,
            method: Method::GET,
        }
    }

    pub const fn post(path: &'static str) -> Self {
        Self {
            path,
            method: Method::POST,
        }
    }

    pub const fn put(path: &'static str) -> Self {
        Self {
            path,
            method: Method::PUT,
        }
    }

    pub const fn delete(path: &'static str) -> Self {
        Self {
            path,
            method: Method::DELETE,
        }
    }

    /// Returns the path with each `{name}` placeholder replaced by the
    /// matching value, percent-encoded as a single path segment
    ///
    /// Placeholders without a matching value are left untouched
    pub fn with_params(&self, params: &[(&str, &str)]) -> String {
        params
            .iter()
            .fold(self.path.to_string(), |path, (name, value)| {
                path.replace(&format!("{{{name}}}"), &encode_segment(value))
            })
    }

    /// Returns true if the request mutates server side state and thus needs
    /// the CSRF header
    pub fn is_mutating(&self) -> bool {
        self.method != Method::GET
    }
}

fn encode_segment(value: &str) -> String {
    let mut url = Url::parse("http://localhost/").expect("hard coded url should be valid");
    url.path_segments_mut()
        .expect("http urls have a path")
        .clear()
        .push(value);
    url.path().trim_start_matches('/').to_string()
}
