// ============================================================
// Layer 6: Metrics Logger
// ============================================================
// Records the loss of every epoch to a CSV file.
//
// Metrics recorded per epoch:
//   - epoch:      the epoch number, continuing across resumes
//   - loss:       mean categorical cross-entropy over all batches
//   - checkpoint: file name written at this epoch, empty if none
//
// Output file: checkpoints/metrics.csv
//
// Example CSV output:
//   epoch,loss,checkpoint
//   9,4.812300,
//   10,4.790100,weights-improvement-10-4.7901-bigger.bin
//   11,4.771800,
//   ...
//
// A resumed run appends to the same file, so the CSV holds the
// full learning curve of a model across sessions.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch: usize,

    /// Mean loss over the epoch's batches
    pub loss: f64,

    /// Checkpoint written for this epoch, if any
    pub checkpoint: Option<String>,
}

impl EpochMetrics {
    pub fn new(epoch: usize, loss: f64, checkpoint: Option<String>) -> Self {
        Self { epoch, loss, checkpoint }
    }
}

/// Appends epoch metrics to a CSV file.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create a new MetricsLogger.
    /// Writes the CSV header if the file doesn't exist yet.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create metrics directory '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");

        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "epoch,loss,checkpoint")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row in the CSV.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(
            f,
            "{},{:.6},{}",
            m.epoch,
            m.loss,
            m.checkpoint.as_deref().unwrap_or(""),
        )?;

        tracing::debug!("Logged epoch {} metrics: loss={:.4}", m.epoch, m.loss);
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_are_appended_after_header() {
        let dir    = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path()).unwrap();
        logger.log(&EpochMetrics::new(1, 4.5, None)).unwrap();
        logger
            .log(&EpochMetrics::new(2, 4.25, Some("weights-improvement-02-4.2500-bigger.bin".into())))
            .unwrap();

        let csv = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "epoch,loss,checkpoint");
        assert_eq!(lines[1], "1,4.500000,");
        assert_eq!(lines[2], "2,4.250000,weights-improvement-02-4.2500-bigger.bin");
    }

    #[test]
    fn test_second_logger_keeps_existing_rows() {
        let dir = tempfile::tempdir().unwrap();
        MetricsLogger::new(dir.path())
            .unwrap()
            .log(&EpochMetrics::new(1, 1.0, None))
            .unwrap();

        let logger = MetricsLogger::new(dir.path()).unwrap();
        logger.log(&EpochMetrics::new(2, 0.5, None)).unwrap();

        let csv = fs::read_to_string(logger.csv_path()).unwrap();
        assert_eq!(csv.lines().count(), 3);
    }
}
