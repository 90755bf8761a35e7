use std::fmt;
use std::path::PathBuf;

/// Failures of the runs-test computation itself.
///
/// Every variant describes an input for which the statistic is undefined.
/// The computation never returns NaN or infinity in place of one of these.
#[derive(Debug, Clone, PartialEq)]
pub enum RunsTestError {
    /// The observation sequence has no elements, so the mean is undefined.
    EmptyInput,
    /// An observation is NaN or infinite.
    NonFiniteValue { index: usize, value: f64 },
    /// All observations fall on one side of the mean.
    DegeneratePartition { n_above: usize, n_below: usize },
    /// Class counts leave the run count with zero variance (one value on each side).
    ZeroVariance { n_above: usize, n_below: usize },
}

impl std::error::Error for RunsTestError {}

impl fmt::Display for RunsTestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunsTestError::EmptyInput => {
                write!(f, "No values provided: the mean of an empty sequence is undefined")
            }
            RunsTestError::NonFiniteValue { index, value } => {
                write!(f, "Value {value} at position {index} is not a finite number")
            }
            RunsTestError::DegeneratePartition { n_above, n_below } => write!(
                f,
                "Degenerate partition: {n_above} values above and {n_below} below the mean; \
                 the runs test needs at least one value on each side"
            ),
            RunsTestError::ZeroVariance { n_above, n_below } => write!(
                f,
                "Run count variance is zero for {n_above} values above and {n_below} below \
                 the mean; provide more observations"
            ),
        }
    }
}

/// Failures while reading observations from a delimited source.
#[derive(Debug)]
pub enum InputError {
    NotFound(PathBuf),
    Io(std::io::Error),
    MissingColumn(String),
    Malformed { line: usize, value: String },
    NoData(String),
}

impl std::error::Error for InputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InputError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::NotFound(path) => write!(f, "File not found: {}", path.display()),
            InputError::Io(e) => write!(f, "Failed to read input: {}", e),
            InputError::MissingColumn(column) => {
                write!(f, "The CSV must include a column named '{}'", column)
            }
            InputError::Malformed { line, value } => write!(
                f,
                "Line {}: '{}' is not a number; every record must be numeric",
                line, value
            ),
            InputError::NoData(column) => {
                write!(f, "The input contains no data in '{}'", column)
            }
        }
    }
}

impl From<std::io::Error> for InputError {
    fn from(err: std::io::Error) -> Self {
        InputError::Io(err)
    }
}
