use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::errors::InputError;

/// Column read from CSV input when none is given
pub const DEFAULT_COLUMN: &str = "valor";

/// CSV file read by the command line tool when no path is given
pub const DEFAULT_CSV_FILE: &str = "datos_corridas.csv";

/// Read the numeric values of `column` from a CSV file with a header row
pub fn read_values(path: impl AsRef<Path>, column: &str) -> Result<Vec<f64>, InputError> {
    let path = path.as_ref();
    debug!("Reading values from {} (column '{}')", path.display(), column);

    let content = fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => InputError::NotFound(path.to_path_buf()),
        _ => InputError::Io(e),
    })?;

    let values = parse_values_csv(&content, column)?;
    info!("Loaded {} values from {}", values.len(), path.display());
    Ok(values)
}

/// Parse CSV text with a header row and return the values in `column`
/// Blank lines are skipped; fields are trimmed and may be double-quoted
pub fn parse_values_csv(content: &str, column: &str) -> Result<Vec<f64>, InputError> {
    let mut lines = content
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim_end_matches('\r')))
        .filter(|(_, line)| !line.trim().is_empty());

    let (_, header) = lines
        .next()
        .ok_or_else(|| InputError::MissingColumn(column.to_string()))?;

    // A UTF-8 BOM would otherwise stick to the first column name
    let header = header.trim_start_matches('\u{feff}');
    let index = split_record(header)
        .iter()
        .position(|name| name == column)
        .ok_or_else(|| InputError::MissingColumn(column.to_string()))?;

    let mut values = Vec::new();
    for (line_number, line) in lines {
        let mut fields = split_record(line);
        let field = if index < fields.len() {
            fields.swap_remove(index)
        } else {
            String::new()
        };
        let value = field.parse::<f64>().map_err(|_| InputError::Malformed {
            line: line_number,
            value: field,
        })?;
        values.push(value);
    }

    if values.is_empty() {
        warn!("No data rows found for column '{}'", column);
        return Err(InputError::NoData(column.to_string()));
    }

    Ok(values)
}

/// Parse a free-form list of numbers
/// Commas, semicolons and any whitespace act as delimiters
pub fn parse_value_list(input: &str) -> Result<Vec<f64>, InputError> {
    let mut values = Vec::new();
    for (line_number, line) in input.lines().enumerate() {
        for token in line
            .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
            .filter(|s| !s.is_empty())
        {
            let value = token.parse::<f64>().map_err(|_| InputError::Malformed {
                line: line_number + 1,
                value: token.to_string(),
            })?;
            values.push(value);
        }
    }

    if values.is_empty() {
        return Err(InputError::NoData("numbers".to_string()));
    }

    Ok(values)
}

/// Split one CSV record into trimmed fields
/// Commas inside double quotes belong to the field and `""` is a literal quote
fn split_record(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current).trim().to_string()),
            _ => current.push(c),
        }
    }
    fields.push(current.trim().to_string());
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csv_basic() {
        let csv = "id,valor\n1,3.5\n2,4\n3,-1e2\n";
        let values = parse_values_csv(csv, "valor").unwrap();
        assert_eq!(values, vec![3.5, 4.0, -100.0]);
    }

    #[test]
    fn test_parse_csv_quoted_and_blank_lines() {
        let csv = "\"valor\"\r\n\"1.5\"\r\n\r\n 2 \r\n";
        let values = parse_values_csv(csv, "valor").unwrap();
        assert_eq!(values, vec![1.5, 2.0]);
    }

    #[test]
    fn test_parse_csv_quoted_comma() {
        let csv = "nombre,valor\n\"Smith, J\",3.5\n\"Doe, A\",4.0\n";
        let values = parse_values_csv(csv, "valor").unwrap();
        assert_eq!(values, vec![3.5, 4.0]);
    }

    #[test]
    fn test_split_record_escaped_quote() {
        assert_eq!(
            split_record(r#""say ""hi"", ok", 2 ,"3""#),
            vec![r#"say "hi", ok"#.to_string(), "2".to_string(), "3".to_string()]
        );
    }

    #[test]
    fn test_parse_csv_bom_header() {
        let csv = "\u{feff}valor\n1\n";
        assert_eq!(parse_values_csv(csv, "valor").unwrap(), vec![1.0]);
    }

    #[test]
    fn test_parse_csv_missing_column() {
        let err = parse_values_csv("value\n1\n", "valor").unwrap_err();
        assert!(matches!(err, InputError::MissingColumn(c) if c == "valor"));
    }

    #[test]
    fn test_parse_csv_empty_content() {
        let err = parse_values_csv("", "valor").unwrap_err();
        assert!(matches!(err, InputError::MissingColumn(_)));
    }

    #[test]
    fn test_parse_csv_malformed_record() {
        let err = parse_values_csv("valor\n1\nabc\n", "valor").unwrap_err();
        match err {
            InputError::Malformed { line, value } => {
                assert_eq!(line, 3);
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_csv_missing_field() {
        let err = parse_values_csv("id,valor\n1\n", "valor").unwrap_err();
        assert!(matches!(err, InputError::Malformed { line: 2, .. }));
    }

    #[test]
    fn test_parse_csv_no_rows() {
        let err = parse_values_csv("valor\n", "valor").unwrap_err();
        assert!(matches!(err, InputError::NoData(_)));
    }

    #[test]
    fn test_parse_value_list_mixed_delimiters() {
        let values = parse_value_list("1, 2;3\n4\t5.5").unwrap();
        assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0, 5.5]);
    }

    #[test]
    fn test_parse_value_list_rejects_letters() {
        let err = parse_value_list("1,abc,3").unwrap_err();
        assert!(matches!(err, InputError::Malformed { value, .. } if value == "abc"));
    }

    #[test]
    fn test_parse_value_list_reports_line() {
        let err = parse_value_list("1\n2\nabc").unwrap_err();
        assert!(matches!(err, InputError::Malformed { line: 3, .. }));
    }

    #[test]
    fn test_parse_value_list_empty() {
        assert!(matches!(
            parse_value_list("  \n "),
            Err(InputError::NoData(_))
        ));
    }

    #[test]
    fn test_read_values_missing_file() {
        let err = read_values("definitely/not/here.csv", DEFAULT_COLUMN).unwrap_err();
        assert!(matches!(err, InputError::NotFound(_)));
    }

    #[test]
    fn test_read_values_from_file() {
        let path = std::env::temp_dir().join(format!("runstest_{}.csv", std::process::id()));
        fs::write(&path, "valor\n1\n2\n3\n").unwrap();

        let values = read_values(&path, DEFAULT_COLUMN).unwrap();
        assert_eq!(values, vec![1.0, 2.0, 3.0]);

        // Clean up
        let _ = fs::remove_file(path);
    }
}
