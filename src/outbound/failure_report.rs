use anyhow::Context;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::domain::campaign::{models::report::DeliveryFailure, ports::FailureReporter};
use crate::outbound::telemetry::spawn_blocking_with_tracing;

/// Exports failed deliveries to `email_failures_<timestamp>.csv`.
#[derive(Debug, Clone)]
pub struct CsvFailureReporter {
    dir: PathBuf,
}

impl CsvFailureReporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn next_report_path(&self) -> PathBuf {
        self.dir.join(format!(
            "email_failures_{}.csv",
            chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
        ))
    }
}

#[async_trait]
impl FailureReporter for CsvFailureReporter {
    #[tracing::instrument(
        name = "Export delivery failures",
        skip(self, failures),
        fields(failed = failures.len())
    )]
    async fn report(&self, failures: &[DeliveryFailure]) -> Result<PathBuf, anyhow::Error> {
        let path = self.next_report_path();
        let target = path.clone();
        let failures = failures.to_vec();
        spawn_blocking_with_tracing(move || write_failures(&target, &failures))
            .await
            .context("Failed to spawn a blocking task.")??;
        tracing::info!(path = %path.display(), "Exported failure information");
        Ok(path)
    }
}

fn write_failures(path: &Path, failures: &[DeliveryFailure]) -> Result<(), anyhow::Error> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create failure report {}", path.display()))?;
    for failure in failures {
        writer
            .serialize(failure)
            .context("Failed to write a failure record.")?;
    }
    writer.flush().context("Failed to flush the failure report.")?;
    Ok(())
}
