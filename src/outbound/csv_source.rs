use anyhow::Context;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::domain::{
    campaign::ports::RecipientSource,
    recipient::{errors::RecipientError, models::recipient::Recipient},
};
use crate::outbound::telemetry::spawn_blocking_with_tracing;

/// Reads recipients from a UTF-8 CSV file with a header row.
#[derive(Debug, Clone)]
pub struct CsvRecipientSource {
    path: PathBuf,
}

impl CsvRecipientSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RecipientSource for CsvRecipientSource {
    #[tracing::instrument(
        name = "Load recipients from CSV",
        skip(self),
        fields(csv_path = %self.path.display())
    )]
    async fn load_recipients(
        &self,
    ) -> Result<Vec<Result<Recipient, RecipientError>>, anyhow::Error> {
        let path = self.path.clone();
        spawn_blocking_with_tracing(move || read_recipients(&path))
            .await
            .context("Failed to spawn a blocking task.")?
    }
}

fn read_recipients(path: &Path) -> Result<Vec<Result<Recipient, RecipientError>>, anyhow::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_path(path)
        .with_context(|| format!("Failed to open CSV file {}", path.display()))?;
    tracing::debug!("Opened CSV file");

    let headers: Vec<String> = reader
        .headers()
        .context("Failed to read the CSV header row.")?
        .iter()
        .map(str::to_string)
        .collect();
    if !headers.iter().any(|h| h == Recipient::EMAIL_COLUMN) {
        return Err(RecipientError::MissingEmailColumn.into());
    }

    let rows: Vec<Result<Recipient, RecipientError>> = reader
        .records()
        .enumerate()
        .map(|(i, record)| {
            let row = i + 1;
            match record {
                Ok(record) => {
                    Recipient::from_record(row, &headers, record.iter().map(str::to_string).collect())
                }
                Err(e) => Err(RecipientError::MalformedRow {
                    row,
                    address: String::new(),
                    record: String::new(),
                    reason: e.to_string(),
                }),
            }
        })
        .collect();
    tracing::debug!(rows = rows.len(), "Read CSV rows");

    Ok(rows)
}
