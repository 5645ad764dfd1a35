// self
use crate::{_prelude::*, credential::AccessToken, obs::InjectionOutcome, store::StoreError};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFetch<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFetch<F> = F;

/// A span builder used around request interception and dispatch.
///
/// Each span carries the `stage` it was opened for and, once the token lookup has run, the
/// `outcome` of that lookup.
#[derive(Clone, Debug)]
pub struct FetchSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FetchSpan {
	/// Creates a new span tagged with the provided stage.
	pub fn new(stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::debug_span!(
				"bearer_fetch.request",
				stage,
				outcome = tracing::field::Empty
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = stage;

			Self {}
		}
	}

	/// Fills the `outcome` field with the result of the token lookup.
	pub fn record_outcome(&self, outcome: InjectionOutcome) {
		#[cfg(feature = "tracing")]
		{
			self.span.record("outcome", outcome.as_str());
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = outcome;
		}
	}

	/// Enters the span for synchronous sections.
	pub fn entered(self) -> FetchSpanGuard {
		#[cfg(feature = "tracing")]
		{
			FetchSpanGuard { guard: self.span.entered() }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = self;

			FetchSpanGuard {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFetch<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// RAII guard returned by [`FetchSpan::entered`].
pub struct FetchSpanGuard {
	#[cfg(feature = "tracing")]
	#[allow(dead_code)]
	guard: tracing::span::EnteredSpan,
}
impl Debug for FetchSpanGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("FetchSpanGuard(..)")
	}
}

/// Reports a token lookup that failed and was downgraded to "no token".
pub fn report_store_failure(key: &str, error: &StoreError) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(key, %error, "token store lookup failed; sending request without a token");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (key, error);
	}
}

/// Records which token, by fingerprint only, an intercepted request carries.
pub fn report_injection(token: Option<&AccessToken>) {
	#[cfg(feature = "tracing")]
	{
		match token {
			Some(token) => tracing::trace!(fingerprint = %token.fingerprint(), "attached bearer token"),
			None => tracing::trace!("no bearer token stored"),
		}
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = token;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[cfg(feature = "tracing")]
	#[derive(Clone, Default)]
	struct CapturedLog(Arc<Mutex<Vec<u8>>>);
	#[cfg(feature = "tracing")]
	impl CapturedLog {
		fn capture(&self, f: impl FnOnce()) -> String {
			let writer = self.clone();
			let subscriber = tracing_subscriber::fmt()
				.with_max_level(tracing::Level::TRACE)
				.with_writer(move || writer.clone())
				.finish();

			tracing::subscriber::with_default(subscriber, f);

			String::from_utf8_lossy(&self.0.lock()).into_owned()
		}
	}
	#[cfg(feature = "tracing")]
	impl std::io::Write for CapturedLog {
		fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
			self.0.lock().extend_from_slice(buf);

			Ok(buf.len())
		}

		fn flush(&mut self) -> std::io::Result<()> {
			Ok(())
		}
	}

	#[cfg(not(feature = "tracing"))]
	#[test]
	fn fetch_span_noop_without_tracing() {
		let span = FetchSpan::new("test");

		span.record_outcome(InjectionOutcome::Anonymous);

		let _guard = span.entered();

		report_store_failure("access_token", &StoreError::Backend { message: "offline".into() });
		report_injection(None);
	}

	#[cfg(feature = "tracing")]
	#[test]
	fn store_failure_logs_a_warning_with_key_and_error() {
		let output = CapturedLog::default().capture(|| {
			report_store_failure("access_token", &StoreError::Backend { message: "offline".into() });
		});

		assert!(output.contains("WARN"), "unexpected log output: {output}");
		assert!(output.contains("access_token"), "unexpected log output: {output}");
		assert!(output.contains("offline"), "unexpected log output: {output}");
		assert!(output.contains("token store lookup failed"), "unexpected log output: {output}");
	}

	#[cfg(feature = "tracing")]
	#[test]
	fn span_carries_the_recorded_outcome() {
		let output = CapturedLog::default().capture(|| {
			let span = FetchSpan::new("intercept");

			span.record_outcome(InjectionOutcome::StoreUnavailable);

			let _guard = span.entered();

			report_injection(None);
		});

		assert!(output.contains("bearer_fetch.request"), "unexpected log output: {output}");
		assert!(output.contains("store_unavailable"), "unexpected log output: {output}");
	}

	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = FetchSpan::new("instrument_wraps_future");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}
