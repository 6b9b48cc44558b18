// src/pipeline/convert.rs

//! Batch conversion between numeric video ids and BV codes.

use std::path::Path;

use tracing::{info, warn};

use crate::error::Result;
use crate::storage::RecordSink;
use crate::utils::{bvid, log};

const CONVERSION_HEADER: [&str; 3] = ["source", "converted", "status"];

/// Counts of one batch conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertReport {
    pub total: usize,
    pub converted: usize,
}

/// Convert every non-empty line of `input` into a row of `destination`.
///
/// A line that cannot be converted keeps its text, an empty `converted`
/// column and the reason as status.
pub async fn run_convert_file(
    sink: &dyn RecordSink,
    input: &Path,
    destination: &Path,
) -> Result<ConvertReport> {
    let content = tokio::fs::read_to_string(input).await?;
    let header: Vec<String> = CONVERSION_HEADER.iter().map(|h| h.to_string()).collect();
    sink.initialize(destination, &header).await?;

    let mut report = ConvertReport::default();
    let mut rows = Vec::new();
    for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
        report.total += 1;
        match bvid::convert(line) {
            Ok(c) => {
                report.converted += 1;
                rows.push(vec![c.source, c.converted, c.direction.label().to_string()]);
            }
            Err(e) => {
                warn!(line, error = %e, "cannot convert");
                rows.push(vec![line.to_string(), String::new(), format!("failed: {e}")]);
            }
        }
    }
    sink.append(destination, &rows).await?;

    info!(total = report.total, converted = report.converted, "conversion finished");
    log::summary(
        "Conversion",
        &[
            ("Input", input.display().to_string()),
            ("Output", destination.display().to_string()),
            ("Lines", report.total.to_string()),
            ("Converted", report.converted.to_string()),
        ],
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::CsvSink;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_converts_mixed_file() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("ids.txt");
        tokio::fs::write(&input, "av170001\n\nBV1L9Uoa9EUx\n170001\nnonsense\n")
            .await
            .unwrap();

        let sink = CsvSink::new(tmp.path());
        let dest = Path::new("converted_ids.csv");
        let report = run_convert_file(&sink, &input, dest).await.unwrap();

        assert_eq!(report, ConvertReport { total: 4, converted: 3 });

        let rows = sink.read_rows(dest).await.unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0], vec!["source", "converted", "status"]);
        assert_eq!(rows[1][2], "AV->BV");
        assert_eq!(rows[2], vec!["BV1L9Uoa9EUx", "av111298867365120", "BV->AV"]);
        assert_eq!(rows[3][0], "av170001");
        assert_eq!(rows[4][0], "nonsense");
        assert!(rows[4][1].is_empty());
        assert!(rows[4][2].starts_with("failed:"));
    }

    #[tokio::test]
    async fn test_missing_input_is_error() {
        let tmp = TempDir::new().unwrap();
        let sink = CsvSink::new(tmp.path());
        let result = run_convert_file(&sink, &tmp.path().join("nope.txt"), Path::new("out.csv")).await;
        assert!(result.is_err());
    }
}
