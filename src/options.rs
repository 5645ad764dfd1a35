//! Typed request options and the header merge applied before each request.

// self
use crate::{
	_prelude::*,
	credential::{AUTHORIZATION, AccessToken},
	error::ConfigError,
};

/// Header name to header value, with names kept exactly as the caller spelled them.
pub type HeaderSet = BTreeMap<String, String>;

/// Per-request configuration handed to a [`Fetch`](crate::http::Fetch) capability.
///
/// Only `headers` is interpreted by the authenticator. `method`, `body`, and every entry in
/// `extra` travel through untouched, so options built from arbitrary JSON keep fields such as
/// `mode` or `credentials` intact.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOptions {
	/// HTTP method; transports default to `GET` when unset.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub method: Option<String>,
	/// Caller-supplied headers.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub headers: Option<HeaderSet>,
	/// Raw request body.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub body: Option<Vec<u8>>,
	/// Opaque fields with no meaning to the authenticator.
	#[serde(flatten)]
	pub extra: BTreeMap<String, serde_json::Value>,
}
impl RequestOptions {
	/// Sets the HTTP method.
	pub fn method(mut self, method: impl Into<String>) -> Self {
		self.method = Some(method.into());

		self
	}

	/// Inserts or replaces a header.
	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.get_or_insert_with(HeaderSet::new).insert(name.into(), value.into());

		self
	}

	/// Sets the raw request body.
	pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
		self.body = Some(body.into());

		self
	}

	/// Serializes `value` as the JSON body and sets `Content-Type` unless the caller already did.
	pub fn json<T>(mut self, value: &T) -> Result<Self, ConfigError>
	where
		T: ?Sized + Serialize,
	{
		self.body = Some(serde_json::to_vec(value)?);

		let headers = self.headers.get_or_insert_with(HeaderSet::new);

		if !headers.keys().any(|name| name.eq_ignore_ascii_case("content-type")) {
			headers.insert("Content-Type".into(), "application/json".into());
		}

		Ok(self)
	}

	/// Stores an opaque field that transports may or may not understand.
	pub fn extra(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
		self.extra.insert(name.into(), value.into());

		self
	}

	/// Returns the value of the header whose name matches `name` exactly.
	pub fn header_value(&self, name: &str) -> Option<&str> {
		self.headers.as_ref()?.get(name).map(String::as_str)
	}

	/// Produces the options actually sent: the same fields with `headers` replaced by the
	/// effective header set.
	///
	/// The effective set starts from a copy of the caller's headers (or an empty set). With a
	/// token, `Authorization` is set to `Bearer <token>` and any caller value under that name,
	/// in any letter case, is dropped. Without a token the caller's headers are kept as they are.
	pub fn authorize(self, token: Option<&AccessToken>) -> Self {
		let mut headers = self.headers.unwrap_or_default();

		if let Some(token) = token {
			headers.retain(|name, _| !name.eq_ignore_ascii_case(AUTHORIZATION));
			headers.insert(AUTHORIZATION.into(), token.bearer());
		}

		Self { headers: Some(headers), ..self }
	}
}
