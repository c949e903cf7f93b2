//! JSON export of a full batch report.
//!
//! Stdout only carries the aggregated result; the export keeps the per-game
//! verdicts for later inspection.

use crate::runner::BatchReport;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while exporting a report.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to encode report: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),
}

impl BatchReport {
    /// Renders the report as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes the report to a JSON file.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<(), ExportError> {
        let json = self.to_json_pretty()?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::SessionReport;
    use switchroom_core::{EntryPolicy, FailureKind, GameResult, Verdict, MSG_FAILED};
    use switchroom_env::SessionId;

    fn report() -> BatchReport {
        BatchReport {
            result: GameResult::new(false, MSG_FAILED),
            strategy: "hasty".to_string(),
            seed: Some(9),
            timed_out: false,
            sessions: vec![SessionReport {
                id: SessionId(1),
                policy: EntryPolicy::Fair,
                verdict: Some(Verdict::Failed(FailureKind::PrematureTriumph)),
                result: GameResult::new(false, MSG_FAILED),
            }],
            releases: None,
        }
    }

    #[test]
    fn test_export_shape() {
        let json = report().to_json_pretty().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["strategy"], "hasty");
        assert_eq!(value["seed"], 9);
        assert_eq!(value["result"]["message"], MSG_FAILED);
        assert_eq!(value["sessions"][0]["id"], 1);
        assert!(value.get("releases").is_none());
    }

    #[test]
    fn test_write_to_file() {
        let path = std::env::temp_dir().join(format!("switchroom-report-{}.json", std::process::id()));
        report().write_to_file(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("\"timed_out\": false"));
        let _ = std::fs::remove_file(&path);
    }
}
