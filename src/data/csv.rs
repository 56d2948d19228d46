/// CSV loading for validation sets.
///
/// Supported format:
/// - UTF-8, comma-separated
/// - Optional header row (auto-detected: first row is a header if it contains
///   any non-numeric, non-empty cell)
/// - Double-quoted fields with embedded commas are handled correctly
/// - The last column is the binary label and must be `0` or `1`
use crate::error::{Result, ValError};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parses CSV bytes into (inputs, targets).
pub fn parse_csv(data: &[u8]) -> Result<(Vec<Vec<f64>>, Vec<f64>)> {
    let text = std::str::from_utf8(data)
        .map_err(|_| ValError::Parse("CSV file is not valid UTF-8".into()))?;

    let mut lines = text.lines().peekable();

    // Auto-detect header: skip first line if any cell is non-numeric.
    if let Some(first) = lines.peek() {
        if is_header(first) {
            lines.next();
        }
    }

    let mut inputs: Vec<Vec<f64>> = Vec::new();
    let mut targets: Vec<f64> = Vec::new();

    for (row_idx, line) in lines.enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let cells = parse_csv_row(line);
        let Some((label_cell, feature_cells)) = cells.split_last() else {
            continue;
        };
        if feature_cells.is_empty() {
            return Err(ValError::Parse(format!(
                "Row {}: expected at least 2 columns (features + label), got {}",
                row_idx + 1,
                cells.len()
            )));
        }

        let feats = parse_floats(feature_cells, row_idx + 1)?;
        let label = match label_cell.trim().parse::<f64>() {
            Ok(v) if v == 0.0 || v == 1.0 => v,
            _ => {
                return Err(ValError::Parse(format!(
                    "Row {}: label '{}' is not 0 or 1",
                    row_idx + 1,
                    label_cell
                )))
            }
        };

        inputs.push(feats);
        targets.push(label);
    }

    if inputs.is_empty() {
        return Err(ValError::EmptyDataset);
    }

    // Verify all rows have the same feature width.
    let n_feats = inputs[0].len();
    for (i, row) in inputs.iter().enumerate() {
        if row.len() != n_feats {
            return Err(ValError::Parse(format!(
                "Row {}: feature count {} does not match first row's {}",
                i + 1, row.len(), n_feats
            )));
        }
    }

    Ok((inputs, targets))
}

/// Reads and parses a CSV file from disk.
pub fn load_csv(path: &str) -> Result<(Vec<Vec<f64>>, Vec<f64>)> {
    parse_csv(&std::fs::read(path)?)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// Returns `true` if the row looks like a header (any cell non-numeric).
fn is_header(line: &str) -> bool {
    let cells = parse_csv_row(line);
    cells.iter().any(|c| {
        let t = c.trim();
        !t.is_empty() && t.parse::<f64>().is_err()
    })
}

/// Parses a single CSV row, handling double-quoted fields.
fn parse_csv_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                // Escaped quote inside quoted field.
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }
    fields.push(current);
    fields
}

/// Parses a slice of string cells as finite `f64`s, returning an error with row info on failure.
fn parse_floats(cells: &[String], row_num: usize) -> Result<Vec<f64>> {
    cells.iter()
        .map(|c| {
            match c.trim().parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(v),
                _ => Err(ValError::Parse(format!("Row {}: '{}' is not a finite number", row_num, c))),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Built-in toy dataset
// ---------------------------------------------------------------------------

/// Generates `n` samples of 2D "two blobs" data with 0/1 targets.
/// Class 0 centers at (0.3, 0.3), class 1 at (0.7, 0.7).
pub fn builtin_blobs(n: usize) -> (Vec<Vec<f64>>, Vec<f64>) {
    let mut inputs = Vec::with_capacity(n);
    let mut targets = Vec::with_capacity(n);
    let centers = [(0.3f64, 0.3f64), (0.7f64, 0.7f64)];
    for i in 0..n {
        let class = i % 2;
        let (cx, cy) = centers[class];
        // Deterministic spread using sin/cos of the index.
        let angle = i as f64 * 2.399;
        let r = 0.12 * (i as f64 * 0.31).sin().abs();
        let x = (cx + r * angle.cos()).clamp(0.0, 1.0);
        let y = (cy + r * angle.sin()).clamp(0.0, 1.0);
        inputs.push(vec![x, y]);
        targets.push(class as f64);
    }
    (inputs, targets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_and_quotes() {
        let csv = b"\"a,b\",c,label\n\"1.5\",2,1\n3,4,0\n";
        let (inputs, targets) = parse_csv(csv).unwrap();
        assert_eq!(inputs, vec![vec![1.5, 2.0], vec![3.0, 4.0]]);
        assert_eq!(targets, vec![1.0, 0.0]);
    }

    #[test]
    fn test_non_binary_label_is_rejected() {
        let err = parse_csv(b"1,2,3\n").unwrap_err();
        assert!(err.to_string().contains("Row 1"), "{err}");
    }

    #[test]
    fn test_bad_feature_and_ragged_rows() {
        assert!(parse_csv(b"1,x2,1\n").is_err());
        assert!(parse_csv(b"1,2,1\n1,0\n").is_err());
        assert!(matches!(parse_csv(b"a,b\n"), Err(ValError::EmptyDataset)));
    }

    #[test]
    fn test_non_finite_feature_is_rejected() {
        let cases: [&[u8]; 3] = [b"0.1,0.2,1\nnan,0.3,0\n", b"0.1,inf,1\n", b"-infinity,0.2,0\n"];
        for csv in cases {
            let err = parse_csv(csv).unwrap_err();
            assert!(matches!(err, ValError::Parse(_)), "{err}");
        }
    }

    #[test]
    fn test_blobs_alternate_classes() {
        let (inputs, targets) = builtin_blobs(6);
        assert_eq!(inputs.len(), 6);
        assert_eq!(targets, vec![0.0, 1.0, 0.0, 1.0, 0.0, 1.0]);
    }
}
