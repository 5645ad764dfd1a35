//! Bearer-token decorator around a [`Fetch`] capability.
//!
//! Build one [`RequestAuthenticator`] at startup and hand it to every call site instead of the
//! raw transport. Each request reads the token from the store, merges `Authorization:
//! Bearer <token>` into the caller's headers (replacing any caller value), and forwards the
//! request to the wrapped capability. The future returned by the wrapped capability is handed
//! back untouched: the authenticator never awaits, retries, or inspects responses.
//!
//! Wrapping an authenticator in another authenticator is allowed and simply merges twice; the
//! innermost merge decides the header that goes on the wire.

// self
use crate::{
	_prelude::*,
	credential::{ACCESS_TOKEN_KEY, AccessToken},
	http::Fetch,
	obs::{self, FetchSpan, InjectionOutcome},
	options::RequestOptions,
	store::KeyValueStore,
};

/// Adds the stored bearer token to every request issued through the wrapped capability.
#[derive(Clone)]
pub struct RequestAuthenticator<F>
where
	F: Fetch,
{
	inner: F,
	store: Arc<dyn KeyValueStore>,
	storage_key: Cow<'static, str>,
}
impl<F> RequestAuthenticator<F>
where
	F: Fetch,
{
	/// Wraps `inner`, reading tokens from `store` under [`ACCESS_TOKEN_KEY`].
	pub fn new(inner: F, store: Arc<dyn KeyValueStore>) -> Self {
		Self { inner, store, storage_key: Cow::Borrowed(ACCESS_TOKEN_KEY) }
	}

	/// Reads the token from `key` instead of [`ACCESS_TOKEN_KEY`].
	pub fn with_storage_key(mut self, key: impl Into<Cow<'static, str>>) -> Self {
		self.storage_key = key.into();

		self
	}

	/// Store key consulted on every request.
	pub fn storage_key(&self) -> &str {
		&self.storage_key
	}

	/// Looks up the current token. Absent keys, empty values, and store failures all yield
	/// `None`.
	pub fn current_token(&self) -> Option<AccessToken> {
		self.lookup().1
	}

	/// Computes the options that would be sent for `options` with the current token.
	pub fn authorize(&self, options: Option<RequestOptions>) -> RequestOptions {
		self.merge(options).1
	}

	/// Sends `target` with the merged options through the wrapped capability and returns its
	/// pending response as is.
	pub fn intercept(
		&self,
		target: impl Into<String>,
		options: Option<RequestOptions>,
	) -> F::Future {
		let span = FetchSpan::new("intercept");
		let options = {
			let _guard = span.clone().entered();
			let (outcome, options) = self.merge(options);

			span.record_outcome(outcome);

			options
		};

		self.inner.fetch(target.into(), options)
	}

	fn merge(&self, options: Option<RequestOptions>) -> (InjectionOutcome, RequestOptions) {
		let (outcome, token) = self.lookup();

		obs::record_injection(outcome);
		obs::report_injection(token.as_ref());

		(outcome, options.unwrap_or_default().authorize(token.as_ref()))
	}

	fn lookup(&self) -> (InjectionOutcome, Option<AccessToken>) {
		match self.store.get(&self.storage_key) {
			Ok(value) => match value.and_then(AccessToken::new) {
				Some(token) => (InjectionOutcome::Injected, Some(token)),
				None => (InjectionOutcome::Anonymous, None),
			},
			Err(e) => {
				obs::report_store_failure(&self.storage_key, &e);

				(InjectionOutcome::StoreUnavailable, None)
			},
		}
	}
}
impl<F> Fetch for RequestAuthenticator<F>
where
	F: Fetch,
{
	type Error = F::Error;
	type Future = F::Future;
	type Response = F::Response;

	fn fetch(&self, target: String, options: RequestOptions) -> Self::Future {
		self.intercept(target, Some(options))
	}
}
impl<F> Debug for RequestAuthenticator<F>
where
	F: Fetch + Debug,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RequestAuthenticator")
			.field("inner", &self.inner)
			.field("storage_key", &self.storage_key)
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{_preludet::*, options::HeaderSet, store::StoreError};

	struct BrokenStore;
	impl KeyValueStore for BrokenStore {
		fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
			Err(StoreError::Backend { message: "storage disabled".into() })
		}
	}

	fn headers<const N: usize>(entries: [(&str, &str); N]) -> Option<HeaderSet> {
		Some(entries.into_iter().map(|(k, v)| (k.to_owned(), v.to_owned())).collect())
	}

	#[tokio::test]
	async fn empty_store_sends_empty_headers() {
		let (auth, fetch, _store) = build_recording_authenticator();
		let response = auth.intercept("/api/data", None).await.expect("Fake fetch never fails.");

		assert_eq!(response.target, "/api/data");
		assert_eq!(
			response.options,
			RequestOptions { headers: headers([]), ..Default::default() }
		);
		assert_eq!(fetch.calls().len(), 1);
	}

	#[tokio::test]
	async fn stored_token_is_added_next_to_caller_headers() {
		let (auth, fetch, store) = build_recording_authenticator();

		store.insert(ACCESS_TOKEN_KEY, "xyz123");

		let options =
			RequestOptions::default().method("POST").header("Content-Type", "application/json");
		let _ = auth.intercept("/api/data", Some(options)).await;
		let call = fetch.last_call().expect("Call should be recorded.");

		assert_eq!(call.target, "/api/data");
		assert_eq!(
			call.options,
			RequestOptions {
				method: Some("POST".into()),
				headers: headers([
					("Content-Type", "application/json"),
					("Authorization", "Bearer xyz123"),
				]),
				..Default::default()
			}
		);
	}

	#[tokio::test]
	async fn stored_token_overwrites_stale_authorization() {
		let (auth, fetch, store) = build_recording_authenticator();

		store.insert(ACCESS_TOKEN_KEY, "xyz123");

		let options = RequestOptions::default().header("Authorization", "Bearer stale");
		let _ = auth.intercept("/api/data", Some(options)).await;
		let call = fetch.last_call().expect("Call should be recorded.");

		assert_eq!(call.options.header_value("Authorization"), Some("Bearer xyz123"));
	}

	#[test]
	fn empty_token_is_treated_as_missing() {
		let (auth, _fetch, store) = build_recording_authenticator();

		store.insert(ACCESS_TOKEN_KEY, "");

		let options = auth.authorize(None);

		assert!(auth.current_token().is_none());
		assert_eq!(options.headers, headers([]));
	}

	#[test]
	fn store_failure_degrades_to_no_token() {
		let auth = RequestAuthenticator::new(RecordingFetch::default(), Arc::new(BrokenStore));
		let options = auth.authorize(Some(RequestOptions::default().header("X-Trace", "1")));

		assert_eq!(options.headers, headers([("X-Trace", "1")]));
	}

	#[test]
	fn custom_storage_key_is_honored() {
		let (auth, _fetch, store) = build_recording_authenticator();
		let auth = auth.with_storage_key("session_token");

		store.insert(ACCESS_TOKEN_KEY, "ignored");
		store.insert("session_token", "abc");

		assert_eq!(auth.storage_key(), "session_token");
		assert_eq!(auth.authorize(None).header_value("Authorization"), Some("Bearer abc"));
	}

	#[test]
	fn token_is_read_on_every_call() {
		let (auth, fetch, store) = build_recording_authenticator();

		drop(auth.intercept("/a", None));
		store.insert(ACCESS_TOKEN_KEY, "first");
		drop(auth.intercept("/b", None));
		store.insert(ACCESS_TOKEN_KEY, "second");
		drop(auth.intercept("/c", None));
		store.remove(ACCESS_TOKEN_KEY);
		drop(auth.intercept("/d", None));

		let sent: Vec<_> = fetch
			.calls()
			.into_iter()
			.map(|call| call.options.header_value("Authorization").map(str::to_owned))
			.collect();

		assert_eq!(sent, [None, Some("Bearer first".into()), Some("Bearer second".into()), None]);
	}

	#[test]
	fn debug_output_never_shows_the_token() {
		let (auth, _fetch, store) = build_recording_authenticator();

		store.insert(ACCESS_TOKEN_KEY, "super-secret");

		let rendered = format!("{auth:?} {:?}", auth.current_token());

		assert!(!rendered.contains("super-secret"));
	}
}
