//! Optional observability helpers for authenticated requests.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `bearer_fetch.request` with a `stage` field,
//!   and a `warn` event whenever the token store cannot be read.
//! - Enable `metrics` to increment the `bearer_fetch_requests_total` counter for every
//!   intercepted request, labeled by `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// What the authenticator did to a request's headers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InjectionOutcome {
	/// A token was found and `Authorization` was set.
	Injected,
	/// No token was stored; headers were left as supplied.
	Anonymous,
	/// The store failed; the request went out as if no token were stored.
	StoreUnavailable,
}
impl InjectionOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			InjectionOutcome::Injected => "injected",
			InjectionOutcome::Anonymous => "anonymous",
			InjectionOutcome::StoreUnavailable => "store_unavailable",
		}
	}
}
impl Display for InjectionOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
