//! Network-request capability and its reqwest-backed implementation.
//!
//! [`Fetch`] is the seam between call sites and whatever actually puts bytes on the wire. The
//! authenticator both consumes and implements it, so code written against "a fetch capability"
//! works unchanged whether or not it is handed the authenticated wrapper.

// self
#[cfg(feature = "reqwest")] use crate::error::{ConfigError, TransportError};
#[cfg(feature = "reqwest")] use crate::obs::FetchSpan;
use crate::{
	_prelude::*, authenticator::RequestAuthenticator, options::RequestOptions,
	store::KeyValueStore,
};

/// Boxed, owned future returned by transports that cannot name their future type.
pub type FetchFuture<T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send>>;

/// Performs a request against `target` with the given options.
///
/// `target` is opaque at this level; each transport decides how to resolve it. The returned
/// future owns everything it needs, so it may outlive the borrow of `self`.
pub trait Fetch
where
	Self: 'static + Send + Sync,
{
	/// Value the future resolves to on success.
	type Response: Send;
	/// Concrete error emitted by the transport.
	type Error: 'static + Send + Sync + StdError;
	/// Pending response handed back to the caller.
	type Future: Future<Output = Result<Self::Response, Self::Error>> + Send;

	/// Starts the request. Implementations must not block.
	fn fetch(&self, target: String, options: RequestOptions) -> Self::Future;
}
impl<T> Fetch for Arc<T>
where
	T: Fetch,
{
	type Error = T::Error;
	type Future = T::Future;
	type Response = T::Response;

	fn fetch(&self, target: String, options: RequestOptions) -> Self::Future {
		(**self).fetch(target, options)
	}
}

/// Wraps any [`Fetch`] in a [`RequestAuthenticator`].
pub trait FetchExt
where
	Self: Sized + Fetch,
{
	/// Returns a capability that adds the stored bearer token to every request.
	fn authenticated(self, store: Arc<dyn KeyValueStore>) -> RequestAuthenticator<Self> {
		RequestAuthenticator::new(self, store)
	}
}
impl<T> FetchExt for T where T: Fetch {}

/// Methods whose spelling is normalized to upper case; any other method is sent as written.
#[cfg(feature = "reqwest")]
const NORMALIZED_METHODS: [&str; 6] = ["DELETE", "GET", "HEAD", "OPTIONS", "POST", "PUT"];

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Relative targets such as `/api/data` are resolved against the configured base URL, the same
/// way a browser resolves them against the page origin. Without a base URL only absolute
/// targets are accepted.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestFetch {
	client: ReqwestClient,
	base_url: Option<Url>,
}
#[cfg(feature = "reqwest")]
impl ReqwestFetch {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self { client, base_url: None }
	}

	/// Builds the default client, surfacing TLS backend failures instead of panicking.
	pub fn try_new() -> Result<Self> {
		let client = ReqwestClient::builder().build().map_err(ConfigError::http_client_build)?;

		Ok(Self::with_client(client))
	}

	/// Resolves relative targets against `base_url`.
	pub fn with_base_url(mut self, base_url: Url) -> Self {
		self.base_url = Some(base_url);

		self
	}

	/// Resolves `target` into the absolute URL that will be requested.
	pub fn resolve(&self, target: &str) -> Result<Url, ConfigError> {
		let resolved = match &self.base_url {
			Some(base) => base.join(target),
			None => Url::parse(target),
		};

		resolved.map_err(|source| ConfigError::InvalidTarget { target: target.into(), source })
	}

	/// Converts `options` into a ready-to-send [`reqwest::Request`].
	pub fn build_request(
		&self,
		target: &str,
		options: RequestOptions,
	) -> Result<reqwest::Request, ConfigError> {
		use reqwest::{
			Method,
			header::{HeaderMap, HeaderName, HeaderValue},
		};

		let url = self.resolve(target)?;
		let method = match options.method.as_deref() {
			Some(raw) => {
				let method = NORMALIZED_METHODS
					.into_iter()
					.find(|standard| standard.eq_ignore_ascii_case(raw))
					.unwrap_or(raw);

				Method::from_bytes(method.as_bytes()).map_err(|e| ConfigError::InvalidMethod {
					method: raw.into(),
					source: Box::new(e),
				})?
			},
			None => Method::GET,
		};
		let mut headers = HeaderMap::new();

		for (name, value) in options.headers.unwrap_or_default() {
			let header_name = HeaderName::from_bytes(name.as_bytes())
				.map_err(|e| ConfigError::InvalidHeader { name: name.clone(), source: Box::new(e) })?;
			let header_value = HeaderValue::from_str(&value)
				.map_err(|e| ConfigError::InvalidHeader { name, source: Box::new(e) })?;

			headers.append(header_name, header_value);
		}

		let mut builder = self.client.request(method, url).headers(headers);

		if let Some(body) = options.body {
			builder = builder.body(body);
		}

		builder.build().map_err(ConfigError::request_build)
	}
}
#[cfg(feature = "reqwest")]
impl Fetch for ReqwestFetch {
	type Error = Error;
	type Future = FetchFuture<reqwest::Response, Error>;
	type Response = reqwest::Response;

	fn fetch(&self, target: String, options: RequestOptions) -> Self::Future {
		let span = FetchSpan::new("reqwest_fetch");
		let request = self.build_request(&target, options);
		let client = self.client.clone();

		Box::pin(span.instrument(async move {
			let response = client.execute(request?).await.map_err(TransportError::from)?;

			Ok::<_, Error>(response)
		}))
	}
}
