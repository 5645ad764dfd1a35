//! Bearer-token injection for HTTP fetch capabilities: wrap a transport once at startup and every
//! request it issues carries the access token held by a key-value store.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod authenticator;
pub mod credential;
pub mod error;
pub mod http;
pub mod obs;
pub mod options;
pub mod store;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for unit and integration tests; enabled via `cfg(test)`
	//! or the `test` crate feature.

	pub use crate::_prelude::*;

	// std
	use std::future::{self, Ready};
	// self
	use crate::{
		authenticator::RequestAuthenticator,
		http::Fetch,
		options::RequestOptions,
		store::{KeyValueStore, MemoryStore},
	};

	/// A single call observed by [`RecordingFetch`].
	#[derive(Clone, Debug, PartialEq, Eq)]
	pub struct RecordedRequest {
		/// Target exactly as it reached the capability.
		pub target: String,
		/// Options exactly as they reached the capability.
		pub options: RequestOptions,
	}

	/// Fake network capability that records every call and echoes it back as the response.
	#[derive(Clone, Debug, Default)]
	pub struct RecordingFetch {
		calls: Arc<Mutex<Vec<RecordedRequest>>>,
	}
	impl RecordingFetch {
		/// Returns every call observed so far, oldest first.
		pub fn calls(&self) -> Vec<RecordedRequest> {
			self.calls.lock().clone()
		}

		/// Returns the most recent call, if any.
		pub fn last_call(&self) -> Option<RecordedRequest> {
			self.calls.lock().last().cloned()
		}
	}
	impl Fetch for RecordingFetch {
		type Error = Error;
		type Future = Ready<Result<RecordedRequest>>;
		type Response = RecordedRequest;

		fn fetch(&self, target: String, options: RequestOptions) -> Self::Future {
			let call = RecordedRequest { target, options };

			self.calls.lock().push(call.clone());

			future::ready(Ok(call))
		}
	}

	/// Builds an authenticator over a [`RecordingFetch`] and a fresh [`MemoryStore`].
	///
	/// The returned store shares state with the authenticator, so tests can play the role of the
	/// external login flow by inserting or removing the token between calls.
	pub fn build_recording_authenticator()
	-> (RequestAuthenticator<RecordingFetch>, RecordingFetch, MemoryStore) {
		let fetch = RecordingFetch::default();
		let store = MemoryStore::default();
		let shared: Arc<dyn KeyValueStore> = Arc::new(store.clone());

		(RequestAuthenticator::new(fetch.clone(), shared), fetch, store)
	}

	/// Builds a reqwest transport that resolves relative targets against `base`.
	#[cfg(feature = "reqwest")]
	pub fn test_reqwest_fetch(base: &str) -> crate::http::ReqwestFetch {
		let base = Url::parse(base).expect("Test base URL should parse.");

		crate::http::ReqwestFetch::default().with_base_url(base)
	}
}

mod _prelude {
	pub use std::{
		borrow::Cow,
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)]
use {
	color_eyre as _, httpmock as _, metrics_util as _, tokio as _, tracing_subscriber as _,
};
