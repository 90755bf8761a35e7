use crate::runs_test::{RunsTestResult, Verdict};

/// Build a plain text table with left-aligned, padded columns
pub fn render_table<S: AsRef<str>>(headers: &[&str], rows: &[Vec<S>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            let len = cell.as_ref().chars().count();
            match widths.get_mut(idx) {
                Some(width) => *width = (*width).max(len),
                None => widths.push(len),
            }
        }
    }

    let format_row = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .enumerate()
            .map(|(idx, cell)| format!("{:<width$}", cell, width = widths[idx]))
            .collect::<Vec<_>>()
            .join(" | ")
    };

    let header_line = format_row(headers.to_vec());
    let separator = widths
        .iter()
        .map(|&w| "-".repeat(w))
        .collect::<Vec<_>>()
        .join("-+-");
    let body = rows
        .iter()
        .map(|row| format_row(row.iter().map(|c| c.as_ref()).collect()))
        .collect::<Vec<_>>()
        .join("\n");

    format!("{}\n{}\n{}", header_line, separator, body)
}

/// Sentence describing the verdict at the 5% level
pub fn verdict_message(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Random => "The data ARE consistent with the randomness hypothesis",
        Verdict::NotRandom => "The data are NOT consistent with the randomness hypothesis",
    }
}

/// Full text report: data summary, test results and validation verdict
pub fn render_report(result: &RunsTestResult) -> String {
    let summary = vec![
        vec!["Total values".to_string(), result.len().to_string()],
        vec!["Sample mean".to_string(), format!("{:.4}", result.mean)],
        vec!["Values above the mean".to_string(), result.n_above.to_string()],
        vec!["Values below the mean".to_string(), result.n_below.to_string()],
    ];

    let results = vec![
        vec!["Observed runs".to_string(), result.run_count.to_string()],
        vec!["Expected runs".to_string(), format!("{:.4}", result.expected_runs)],
        vec!["Run variance".to_string(), format!("{:.4}", result.variance)],
        vec!["Z statistic".to_string(), format!("{:.4}", result.z_score)],
        vec!["p-value (two-tailed)".to_string(), format!("{:.4}", result.p_value)],
    ];

    let mut report = String::new();
    report.push_str("=== Data summary ===\n");
    report.push_str(&render_table(&["Metric", "Value"], &summary));
    report.push_str("\n\n=== Runs test above/below the mean ===\n");
    report.push_str(&render_table(&["Result", "Value"], &results));
    report.push_str("\n\n=== Validation ===\n");
    report.push_str(verdict_message(result.verdict()));
    report.push('\n');
    report
}
