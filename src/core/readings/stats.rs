//! Aggregate statistics over accepted readings.

use std::fmt;

use serde::Serialize;

use super::reading::{Reading, RunTally, MAX_DISPLACEMENT_MM, MIN_DISPLACEMENT_MM};

/// Coarse label for how far the median sits from the mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkewClass {
    VerySymmetric,
    RelativelySymmetric,
    MildSkew,
    PronouncedSkew,
}

impl SkewClass {
    /// Lower bounds are exclusive: a gap of exactly 0.01 is not "very symmetric".
    pub fn classify(gap: f64) -> Self {
        if gap < 0.01 {
            SkewClass::VerySymmetric
        } else if gap < 0.05 {
            SkewClass::RelativelySymmetric
        } else if gap < 0.1 {
            SkewClass::MildSkew
        } else {
            SkewClass::PronouncedSkew
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SkewClass::VerySymmetric => "very symmetric (median and mean almost equal)",
            SkewClass::RelativelySymmetric => "relatively symmetric",
            SkewClass::MildSkew => "mild skew",
            SkewClass::PronouncedSkew => "pronounced skew (possible outlier influence)",
        }
    }
}

impl fmt::Display for SkewClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len();
    if n % 2 == 1 {
        Some(sorted[n / 2])
    } else {
        Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0)
    }
}

/// Reading with the largest displacement, first occurrence on ties.
///
/// The search starts from a displacement of 0 and needs a strict increase, so
/// when every displacement is 0 there is no maximum record even though the
/// data set is not empty.
pub fn max_record(readings: &[Reading]) -> Option<Reading> {
    readings.iter().collect::<RunTally>().max
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub gap: f64,
    pub skew: SkewClass,
    pub max: Option<Reading>,
    #[serde(skip)]
    pub readings: Vec<Reading>,
}

impl Report {
    /// `None` when there is nothing to aggregate.
    pub fn from_readings(readings: &[Reading]) -> Option<Self> {
        let displacements: Vec<f64> = readings.iter().map(|r| r.displacement).collect();
        let mean = mean(&displacements)?;
        let median = median(&displacements)?;
        let gap = (median - mean).abs();

        Some(Self {
            count: readings.len(),
            mean,
            median,
            gap,
            skew: SkewClass::classify(gap),
            max: max_record(readings),
            readings: readings.to_vec(),
        })
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "All valid readings:")?;
        writeln!(f, "Frame\t\tDisplacement(mm)\tX\t\tY\t\tZ")?;
        for r in &self.readings {
            writeln!(
                f,
                "Frame{}\t{:.6}\t\t{:.6}\t{:.6}\t{:.6}",
                r.frame_id, r.displacement, r.x, r.y, r.z
            )?;
        }
        writeln!(
            f,
            "Found {} valid displacement readings (range: {}-{} mm)",
            self.count, MIN_DISPLACEMENT_MM, MAX_DISPLACEMENT_MM
        )?;
        writeln!(f, "Mean: {:.6} mm", self.mean)?;
        writeln!(f, "Median: {:.6} mm", self.median)?;
        writeln!(f, "Median/mean gap: {:.6} mm", self.gap)?;
        writeln!(f, "Distribution: {}", self.skew)?;

        writeln!(f)?;
        match &self.max {
            Some(max) => {
                writeln!(f, "Maximum record:")?;
                writeln!(f, "Frame: Frame{}", max.frame_id)?;
                writeln!(f, "Displacement: {:.6} mm", max.displacement)?;
                writeln!(f, "X: {:.6}", max.x)?;
                writeln!(f, "Y: {:.6}", max.y)?;
                write!(f, "Z: {:.6}", max.z)
            }
            None => write!(f, "Maximum record: none (all displacements are 0)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(frame_id: u64, displacement: f64) -> Reading {
        Reading {
            frame_id,
            x: displacement,
            y: 0.0,
            z: 0.0,
            displacement,
        }
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&[1.0, 2.0, 3.0]), Some(2.0));
        assert_eq!(median(&[1.0, 2.0, 3.0, 4.0]), Some(2.5));
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[1.0, 2.0, 3.0, 4.0]), Some(2.5));
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_skew_boundaries() {
        assert_eq!(SkewClass::classify(0.0), SkewClass::VerySymmetric);
        assert_eq!(SkewClass::classify(0.009), SkewClass::VerySymmetric);
        assert_eq!(SkewClass::classify(0.01), SkewClass::RelativelySymmetric);
        assert_eq!(SkewClass::classify(0.049), SkewClass::RelativelySymmetric);
        assert_eq!(SkewClass::classify(0.05), SkewClass::MildSkew);
        assert_eq!(SkewClass::classify(0.1), SkewClass::PronouncedSkew);
        assert_eq!(SkewClass::classify(2.0), SkewClass::PronouncedSkew);
    }

    #[test]
    fn test_report_two_readings() {
        let readings = vec![reading(10, 0.3742), reading(20, 1.7321)];
        let report = Report::from_readings(&readings).unwrap();

        assert_eq!(report.count, 2);
        assert!((report.mean - 1.05315).abs() < 1e-9);
        assert!((report.median - 1.05315).abs() < 1e-9);
        assert!(report.gap < 1e-9);
        assert_eq!(report.skew, SkewClass::VerySymmetric);
        assert_eq!(report.max.unwrap().frame_id, 20);
    }

    #[test]
    fn test_report_empty_is_none() {
        assert!(Report::from_readings(&[]).is_none());
    }

    #[test]
    fn test_report_all_zero_has_no_max() {
        let readings = vec![reading(0, 0.0), reading(5, 0.0)];
        let report = Report::from_readings(&readings).unwrap();

        assert_eq!(report.count, 2);
        assert!(report.max.is_none());
        assert!(report.to_string().contains("none"));
    }

    #[test]
    fn test_max_record_ties_keep_first() {
        let readings = vec![reading(1, 0.5), reading(2, 0.9), reading(3, 0.9)];
        assert_eq!(max_record(&readings).unwrap().frame_id, 2);
    }

    #[test]
    fn test_skewed_distribution() {
        let readings = vec![
            reading(0, 0.1),
            reading(1, 0.1),
            reading(2, 0.1),
            reading(3, 2.9),
        ];
        let report = Report::from_readings(&readings).unwrap();
        // mean 0.8, median 0.1
        assert_eq!(report.skew, SkewClass::PronouncedSkew);
    }

    #[test]
    fn test_report_display_and_json() {
        let readings = vec![reading(10, 0.5)];
        let report = Report::from_readings(&readings).unwrap();

        let text = report.to_string();
        assert!(text.contains("Frame10\t0.500000"));
        assert!(text.contains("Mean: 0.500000 mm"));
        assert!(text.contains("Frame: Frame10"));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["count"], 1);
        assert_eq!(json["skew"], "very_symmetric");
        assert_eq!(json["max"]["frame_id"], 10);
        assert!(json.get("readings").is_none());
    }
}
