//! Bearer credential read from the key-value store.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

/// Store key under which the external login flow keeps the access token.
pub const ACCESS_TOKEN_KEY: &str = "access_token";
/// Header carrying the credential on outgoing requests.
pub const AUTHORIZATION: &str = "Authorization";
/// Authentication scheme prefixed to the token.
pub const BEARER_SCHEME: &str = "Bearer";

/// Redacted access token wrapper keeping the secret out of logs.
///
/// The value is opaque: no parsing, validation, or expiry check happens here. An empty string is
/// not a token, so [`AccessToken::new`] returns `None` for it and callers treat that exactly like
/// a missing store entry.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);
impl AccessToken {
	/// Wraps a stored value, rejecting the empty string.
	pub fn new(value: impl Into<String>) -> Option<Self> {
		let value = value.into();

		if value.is_empty() { None } else { Some(Self(value)) }
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Formats the `Authorization` header value, e.g. `Bearer xyz123`.
	pub fn bearer(&self) -> String {
		format!("{BEARER_SCHEME} {}", self.0)
	}

	/// Short, log-safe identifier derived from the SHA-256 digest of the token.
	///
	/// Two requests carrying the same token share a fingerprint, which is enough to correlate
	/// logs without revealing the secret.
	pub fn fingerprint(&self) -> String {
		let digest = Sha256::digest(self.0.as_bytes());

		STANDARD_NO_PAD.encode(&digest[..9])
	}
}
impl Debug for AccessToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("AccessToken").field(&"<redacted>").finish()
	}
}
impl Display for AccessToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn empty_value_is_not_a_token() {
		assert!(AccessToken::new("").is_none());
		assert!(AccessToken::new(" ").is_some());
	}

	#[test]
	fn bearer_prefixes_the_scheme() {
		let token = AccessToken::new("xyz123").expect("Non-empty token should be accepted.");

		assert_eq!(token.bearer(), "Bearer xyz123");
		assert_eq!(token.expose(), "xyz123");
	}

	#[test]
	fn formatters_redact() {
		let token = AccessToken::new("super-secret").expect("Non-empty token should be accepted.");

		assert_eq!(format!("{token:?}"), "AccessToken(\"<redacted>\")");
		assert_eq!(format!("{token}"), "<redacted>");
		assert_eq!(format!("{:?}", Some(&token)), "Some(AccessToken(\"<redacted>\"))");
	}

	#[test]
	fn fingerprint_is_stable_and_hides_the_secret() {
		let a = AccessToken::new("xyz123").expect("Non-empty token should be accepted.");
		let b = AccessToken::new("xyz123").expect("Non-empty token should be accepted.");
		let c = AccessToken::new("abc789").expect("Non-empty token should be accepted.");

		assert_eq!(a.fingerprint(), b.fingerprint());
		assert_ne!(a.fingerprint(), c.fingerprint());
		assert_eq!(a.fingerprint().len(), 12);
		assert!(!a.fingerprint().contains("xyz123"));
	}
}
