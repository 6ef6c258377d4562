//! Responses built from rendered templates.

use bytes::Bytes;
use hyper::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderValue};
use hyper::{HeaderMap, StatusCode};

/// Content type of rendered Genshi templates.
pub const HTML_CONTENT_TYPE: &str = "text/html; charset=UTF-8";

/// HTTP response carrying a rendered body.
#[derive(Debug, Clone)]
pub struct Response {
	pub status: StatusCode,
	pub headers: HeaderMap,
	pub body: Bytes,
}

impl Response {
	/// Creates an empty response with `status`.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_genshi_renderer::Response;
	/// use hyper::StatusCode;
	///
	/// let response = Response::new(StatusCode::OK);
	/// assert!(response.body.is_empty());
	/// assert!(response.headers.is_empty());
	/// ```
	pub fn new(status: StatusCode) -> Self {
		Self {
			status,
			headers: HeaderMap::new(),
			body: Bytes::new(),
		}
	}

	/// Creates an empty `200 OK` response.
	pub fn ok() -> Self {
		Self::new(StatusCode::OK)
	}

	/// Creates a `200 OK` HTML response with content type and length set.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_genshi_renderer::Response;
	///
	/// let response = Response::html("<p>hi</p>");
	/// assert_eq!(response.headers.len(), 2);
	/// assert_eq!(response.headers["content-length"], "9");
	/// ```
	pub fn html(body: impl Into<String>) -> Self {
		let body = Bytes::from(body.into());
		let mut response = Self::ok();
		response
			.headers
			.insert(CONTENT_TYPE, HeaderValue::from_static(HTML_CONTENT_TYPE));
		response
			.headers
			.insert(CONTENT_LENGTH, HeaderValue::from(body.len()));
		response.body = body;
		response
	}

	/// Returns the body as UTF-8 text.
	pub fn text(&self) -> Option<&str> {
		std::str::from_utf8(&self.body).ok()
	}
}

/// Builds a response from a rendered body.
pub trait ResponseFactory: Send + Sync {
	/// Wraps `body` in a response.
	fn make_response(&self, body: String) -> Response;
}

impl<F> ResponseFactory for F
where
	F: Fn(String) -> Response + Send + Sync,
{
	fn make_response(&self, body: String) -> Response {
		self(body)
	}
}

/// Default factory: `200 OK` with HTML content type and length.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlResponseFactory;

impl ResponseFactory for HtmlResponseFactory {
	fn make_response(&self, body: String) -> Response {
		Response::html(body)
	}
}
