//! Re-analysis driver: record log → report.

use std::path::Path;

use log::{info, warn};

use crate::core::error::Result;
use crate::core::readings::parser::{parse_log, ParsedLog};
use crate::core::readings::stats::Report;

pub struct AnalysisOutcome {
    pub parsed: ParsedLog,
    /// `None` when the log holds no valid readings.
    pub report: Option<Report>,
}

pub fn analyze_log(path: impl AsRef<Path>) -> Result<AnalysisOutcome> {
    let parsed = parse_log(path)?;
    if parsed.is_empty() {
        warn!("No valid data found");
        return Ok(AnalysisOutcome {
            parsed,
            report: None,
        });
    }

    let report = Report::from_readings(&parsed.readings);
    if let Some(report) = &report {
        info!(
            "📊 {} readings, mean {:.6} mm, median {:.6} mm",
            report.count, report.mean, report.median
        );
    }

    Ok(AnalysisOutcome { parsed, report })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_analyze_sample_log() {
        let path = std::env::temp_dir().join(format!(
            "overlay_metrology_analyze_{}.txt",
            std::process::id()
        ));
        fs::write(
            &path,
            "Frame10: X 0.1000 Y 0.2000 Z 0.3000 -> 0.3742 mm\n\
             Frame15: X 3.0000 Y 4.0000 Z 0.0000 -> 5.000000 mm\n\
             Frame20: X 1.0000 Y 1.0000 Z 1.0000 -> 1.7321 mm\n\
             truncated li",
        )
        .unwrap();

        let outcome = analyze_log(&path).unwrap();
        assert_eq!(outcome.parsed.readings.len(), 2);
        assert_eq!(outcome.parsed.excluded.len(), 1);
        assert_eq!(outcome.parsed.malformed.len(), 1);

        let report = outcome.report.unwrap();
        assert_eq!(report.count, 2);
        assert!((report.mean - 1.05315).abs() < 1e-9);
        assert!((report.median - 1.05315).abs() < 1e-9);
        assert_eq!(report.max.unwrap().frame_id, 20);

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_empty_log_has_no_report() {
        let path = std::env::temp_dir().join(format!(
            "overlay_metrology_analyze_empty_{}.txt",
            std::process::id()
        ));
        fs::write(&path, "").unwrap();

        let outcome = analyze_log(&path).unwrap();
        assert!(outcome.report.is_none());

        fs::remove_file(&path).ok();
    }
}
