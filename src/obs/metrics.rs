// self
use crate::obs::InjectionOutcome;

/// Records an interception outcome via the global metrics recorder (when enabled).
pub fn record_injection(outcome: InjectionOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("bearer_fetch_requests_total", "outcome" => outcome.as_str()).increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = outcome;
	}
}
