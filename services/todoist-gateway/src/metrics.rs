//! Prometheus metrics exposition
//!
//! - `gateway_authorizations_total` (counter): label `outcome`
//! - `gateway_callbacks_total` (counter): label `outcome`
//! - `gateway_tool_calls_total` (counter): labels `tool`, `outcome`
//! - `gateway_tool_call_duration_seconds` (histogram): label `tool`

use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

const TOOL_CALL_DURATION: &str = "gateway_tool_call_duration_seconds";

/// 5ms to 30s.
const DURATION_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
];

fn builder() -> Result<PrometheusBuilder, BuildError> {
    PrometheusBuilder::new().set_buckets_for_metric(
        Matcher::Full(TOOL_CALL_DURATION.to_string()),
        DURATION_BUCKETS,
    )
}

/// Install the global Prometheus recorder and return a handle for `/metrics`.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    builder()?.install_recorder()
}

/// Record an `/authorize` outcome (`redirected`, `invalid_request`).
pub fn record_authorization(outcome: &'static str) {
    metrics::counter!("gateway_authorizations_total", "outcome" => outcome).increment(1);
}

/// Record a `/callback` outcome: `completed` or the name of the failed step.
pub fn record_callback(outcome: &'static str) {
    metrics::counter!("gateway_callbacks_total", "outcome" => outcome).increment(1);
}

/// Record one tool call.
pub fn record_tool_call(tool: &str, outcome: &'static str, duration_secs: f64) {
    metrics::counter!(
        "gateway_tool_calls_total",
        "tool" => tool.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!(TOOL_CALL_DURATION, "tool" => tool.to_string()).record(duration_secs);
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::PrometheusRecorder;

    /// Recorder/handle pair that is never installed globally.
    fn isolated_recorder() -> (PrometheusRecorder, PrometheusHandle) {
        let recorder = builder().unwrap().build_recorder();
        let handle = recorder.handle();
        (recorder, handle)
    }

    #[test]
    fn record_functions_do_not_panic_without_recorder() {
        record_authorization("redirected");
        record_callback("completed");
        record_tool_call("get_projects", "success", 0.01);
    }

    #[test]
    fn login_counters_carry_outcome() {
        let (recorder, handle) = isolated_recorder();
        let _guard = metrics::set_default_local_recorder(&recorder);

        record_authorization("redirected");
        record_authorization("invalid_request");
        record_callback("exchange_code");

        let output = handle.render();
        assert!(output.contains("gateway_authorizations_total{outcome=\"redirected\"} 1"));
        assert!(output.contains("gateway_authorizations_total{outcome=\"invalid_request\"} 1"));
        assert!(output.contains("gateway_callbacks_total{outcome=\"exchange_code\"} 1"));
    }

    #[test]
    fn tool_calls_render_counter_and_histogram() {
        let (recorder, handle) = isolated_recorder();
        let _guard = metrics::set_default_local_recorder(&recorder);

        record_tool_call("get_projects", "success", 0.042);
        record_tool_call("delete_project", "tool_error", 0.3);

        let output = handle.render();
        assert!(output.contains("gateway_tool_calls_total"));
        assert!(output.contains("tool=\"get_projects\""));
        assert!(output.contains("outcome=\"tool_error\""));
        assert!(
            output.contains("gateway_tool_call_duration_seconds_bucket"),
            "duration must render as a histogram, not a summary"
        );
        assert!(output.contains("le=\"0.005\""));
        assert!(output.contains("le=\"+Inf\""));
    }
}
