use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use tracing::{debug, info, warn};

pub mod api;
pub mod errors;
pub mod input;
pub mod report;

pub use errors::{InputError, RunsTestError};
pub use runs_test::{compute_runs_test, count_runs, RunsTestResult, Side, Verdict, Z_CRITICAL};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RunsTestRequest {
    /// Observations in order, either a delimited list or CSV text when `column` is set
    pub numbers: String,
    /// Header column to read when `numbers` holds CSV text
    #[serde(default)]
    pub column: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RunsTestResponse {
    /// Whether the test could be computed for the input
    pub valid: bool,
    /// Whether the sequence is consistent with randomness at the 5% level
    pub random: bool,
    pub message: String,
    pub result: Option<RunsTestResult>,
    pub report: Option<String>,
}

impl RunsTestResponse {
    fn invalid(message: String) -> Self {
        RunsTestResponse {
            valid: false,
            random: false,
            message,
            result: None,
            report: None,
        }
    }
}

/// Parse the request input into observations
pub fn prepare_values(request: &RunsTestRequest) -> Result<Vec<f64>, InputError> {
    match request.column.as_deref() {
        Some(column) => input::parse_values_csv(&request.numbers, column),
        None => input::parse_value_list(&request.numbers),
    }
}

/// Run the runs test for a request, mapping every failure into the response
pub fn run_runs_test(request: &RunsTestRequest) -> RunsTestResponse {
    debug!(
        "Starting runs test: input_length={}, column={:?}",
        request.numbers.len(),
        request.column
    );

    let values = match prepare_values(request) {
        Ok(v) => {
            debug!("Successfully parsed {} values", v.len());
            v
        }
        Err(e) => {
            warn!("Failed to parse input: {}", e);
            return RunsTestResponse::invalid(e.to_string());
        }
    };

    let result = match compute_runs_test(&values) {
        Ok(r) => r,
        Err(e) => {
            warn!("Runs test could not be computed: {}", e);
            return RunsTestResponse::invalid(e.to_string());
        }
    };

    let verdict = result.verdict();
    info!(
        "Runs test complete: n={}, runs={}, z={:.4}, p={:.4}, verdict={:?}",
        values.len(),
        result.run_count,
        result.z_score,
        result.p_value,
        verdict
    );

    RunsTestResponse {
        valid: true,
        random: verdict == Verdict::Random,
        message: report::verdict_message(verdict).to_string(),
        report: Some(report::render_report(&result)),
        result: Some(result),
    }
}
