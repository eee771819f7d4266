use http::header::{CONTENT_TYPE, LOCATION};
use http::{HeaderMap, HeaderValue, StatusCode};
use tracing::warn;

/// The response under construction for one request.
#[derive(Debug, Default)]
pub struct Response {
    /// HTTP status code (200 until something says otherwise)
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Response body
    pub body: String,
}

impl Response {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a plain-text status and body.
    pub fn text(&mut self, status: StatusCode, body: &str) {
        self.status = status;
        self.headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        self.body.clear();
        self.body.push_str(body);
    }

    /// Issue a 301 to `location`.
    ///
    /// A location that cannot be encoded as a header value turns into a 400,
    /// since the client sent a path that no redirect could repair.
    pub fn redirect(&mut self, location: &str) {
        match HeaderValue::from_str(location) {
            Ok(value) => {
                self.status = StatusCode::MOVED_PERMANENTLY;
                self.headers.insert(LOCATION, value);
                self.body.clear();
            }
            Err(e) => {
                warn!(location = %location, error = %e, "Redirect location is not a valid header");
                self.text(StatusCode::BAD_REQUEST, "Bad Request.");
            }
        }
    }

    /// The `Location` header, if set.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.headers.get(LOCATION).and_then(|v| v.to_str().ok())
    }
}
