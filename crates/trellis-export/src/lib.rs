//! Tabular report export
//!
//! Turns rows of JSON records into a CSV blob ready for spreadsheet
//! import: UTF-8 byte-order marker prefix (so Excel decodes the Japanese
//! headers correctly), quoted fields where needed, and a generated
//! `{report_type}_report_{YYYYMMDD}.csv` filename.

pub mod csv;

pub use csv::{to_csv, Column, CSV_BOM};

use chrono::NaiveDate;
use serde_json::Value;
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Export errors
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ExportResult<T> = Result<T, ExportError>;

/// Column set of the daily performance report
pub fn daily_columns() -> Vec<Column> {
    vec![
        Column::new("date", "日付"),
        Column::new("clicks", "クリック数"),
        Column::new("conversions", "成果数"),
        Column::new("revenue", "売上"),
        Column::new("approvalRate", "承認率(%)"),
        Column::new("cvr", "CVR(%)"),
        Column::new("ctr", "CTR(%)"),
    ]
}

/// Column set of the per-offer performance report
pub fn offer_columns() -> Vec<Column> {
    vec![
        Column::new("offerName", "案件名"),
        Column::new("clicks", "クリック数"),
        Column::new("conversions", "成果数"),
        Column::new("revenue", "売上"),
        Column::new("approvalRate", "承認率(%)"),
    ]
}

/// Generated download filename, e.g. `daily_report_20240101.csv`
pub fn report_filename(report_type: &str, date: NaiveDate) -> String {
    format!("{}_report_{}.csv", report_type, date.format("%Y%m%d"))
}

/// Encode rows and write the blob to a file
///
/// Stands in for the browser-side download trigger of the web client.
pub async fn write_report(
    path: impl AsRef<Path>,
    rows: &[Value],
    columns: &[Column],
) -> ExportResult<()> {
    let blob = to_csv(rows, columns);
    tokio::fs::write(path.as_ref(), blob).await?;
    info!("Wrote report to {:?}", path.as_ref());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn test_column_sets() {
        let daily = daily_columns();
        assert_eq!(daily.len(), 7);
        assert_eq!(daily[0].label, "日付");

        let offer = offer_columns();
        assert_eq!(offer[0].key, "offerName");
        assert_eq!(offer[0].label, "案件名");
    }

    #[test]
    fn test_report_filename() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(report_filename("daily", date), "daily_report_20240101.csv");
    }

    #[tokio::test]
    async fn test_write_report() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("daily_report_20240101.csv");
        let rows = vec![json!({"date": "2024-01-01", "clicks": 10})];
        let columns = vec![Column::new("date", "日付"), Column::new("clicks", "クリック数")];

        write_report(&path, &rows, &columns).await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with('\u{feff}'));
        assert!(written.contains("2024-01-01,10"));
    }
}
