//! Report types for a recompression run.
//!
//! A [`RecompressReport`] records the configuration, every search attempt and
//! the final decision. It can be serialized to JSON or written as a CSV of
//! attempts.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::search::{Attempt, Decision, SearchConfig, Termination};

/// Everything that happened while recompressing one image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecompressReport {
    /// Path to the source image.
    pub source_path: PathBuf,

    /// Image dimensions.
    pub width: u32,
    pub height: u32,

    /// Source file size in bytes.
    pub original_size: u64,

    /// Codec identifier.
    pub codec: String,

    /// Similarity metric name.
    pub metric: String,

    /// Configuration used for this run.
    pub config: SearchConfig,

    /// Every search attempt in order.
    pub attempts: Vec<Attempt>,

    /// Why the search stopped.
    pub termination: Termination,

    /// What was produced.
    pub decision: Decision,

    /// Size of the emitted file in bytes (None when nothing is written).
    pub final_size: Option<u64>,

    /// When this report was generated.
    #[serde(with = "chrono_serde")]
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl RecompressReport {
    /// Final size as a percentage of the original.
    #[must_use]
    pub fn percent_of_original(&self) -> Option<f64> {
        if self.original_size == 0 {
            return None;
        }
        self.final_size
            .map(|size| size as f64 / self.original_size as f64 * 100.0)
    }

    /// Bytes saved relative to the original. Negative when the output grew.
    #[must_use]
    pub fn saved_bytes(&self) -> Option<i64> {
        self.final_size
            .map(|size| self.original_size as i64 - size as i64)
    }

    /// Write the report as pretty JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        create_parent_dir(path)?;
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Write one CSV row per attempt.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        create_parent_dir(path)?;
        let mut wtr = csv::Writer::from_path(path)?;

        wtr.write_record([
            "attempt",
            "quality",
            "size",
            "ssim",
            "min_quality",
            "max_quality",
            "percent_of_original",
        ])?;

        for attempt in &self.attempts {
            let c = &attempt.candidate;
            wtr.write_record([
                &attempt.attempt.to_string(),
                &c.quality.to_string(),
                &c.size.to_string(),
                &format!("{:.6}", c.index),
                &attempt.min_quality.to_string(),
                &attempt.max_quality.to_string(),
                &format!("{:.1}", c.percent_of(self.original_size)),
            ])?;
        }

        wtr.flush()?;
        Ok(())
    }

    /// Write as CSV when `path` ends in `.csv`, JSON otherwise.
    pub fn write(&self, path: &Path) -> Result<()> {
        let is_csv = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if is_csv {
            self.write_csv(path)
        } else {
            self.write_json(path)
        }
    }
}

fn create_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

mod chrono_serde {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        dt.to_rfc3339().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::Candidate;

    fn report(final_size: Option<u64>) -> RecompressReport {
        let best = Candidate::new(67, 400, 0.99996);
        RecompressReport {
            source_path: PathBuf::from("photo.jpg"),
            width: 100,
            height: 80,
            original_size: 1000,
            codec: "jpeg".to_string(),
            metric: "ssim".to_string(),
            config: SearchConfig::default(),
            attempts: vec![
                Attempt {
                    attempt: 1,
                    candidate: Candidate::new(67, 600, 0.99997),
                    min_quality: 40,
                    max_quality: 66,
                },
                Attempt {
                    attempt: 2,
                    candidate: best,
                    min_quality: 40,
                    max_quality: 52,
                },
            ],
            termination: Termination::AttemptsExhausted,
            decision: Decision::EncodeBest(best),
            final_size,
            timestamp: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_savings() {
        let report = report(Some(400));
        assert!((report.percent_of_original().unwrap() - 40.0).abs() < 1e-9);
        assert_eq!(report.saved_bytes(), Some(600));

        let nothing = self::report(None);
        assert_eq!(nothing.percent_of_original(), None);
        assert_eq!(nothing.saved_bytes(), None);
    }

    #[test]
    fn test_json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("photo.json");
        let original = report(Some(400));
        original.write(&path).unwrap();

        let loaded: RecompressReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.attempts, original.attempts);
        assert_eq!(loaded.decision, original.decision);
        assert_eq!(loaded.termination, Termination::AttemptsExhausted);
        assert_eq!(loaded.timestamp.timestamp(), original.timestamp.timestamp());
    }

    #[test]
    fn test_csv_has_row_per_attempt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("attempts.CSV");
        report(Some(400)).write(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("attempt,quality,size,ssim"));
        assert!(lines[2].starts_with("2,67,400,0.999960"));
    }

    #[test]
    fn test_csv_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("nested").join("attempts.csv");
        report(Some(400)).write(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 3);
    }
}
