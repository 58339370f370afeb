use crate::domain::recipient::{errors::RecipientError, models::recipient::Recipient};
use serde::Serialize;
use std::path::PathBuf;

/// A recipient the campaign could not deliver to.
///
/// Field order is the column order of the exported failure file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryFailure {
    pub mail: String,
    pub row: String,
    pub error: String,
    pub html_content: String,
}

impl DeliveryFailure {
    pub fn new(recipient: &Recipient, error: impl std::fmt::Display, html_content: String) -> Self {
        Self {
            mail: recipient.email().to_string(),
            row: recipient.to_json(),
            error: error.to_string(),
            html_content,
        }
    }

    /// A row that could not be turned into a recipient. Nothing was rendered.
    pub fn rejected_row(error: &RecipientError) -> Option<Self> {
        match error {
            RecipientError::InvalidEmail {
                address, record, ..
            }
            | RecipientError::MalformedRow {
                address, record, ..
            } => Some(Self {
                mail: address.clone(),
                row: record.clone(),
                error: error.to_string(),
                html_content: String::new(),
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Sent,
    DryRun,
    Failed(DeliveryFailure),
}

#[derive(Debug, Default)]
pub struct DeliveryReport {
    /// Rows handed to delivery, including rows rejected as invalid.
    pub loaded: usize,
    /// Rows outside the address policy.
    pub skipped: usize,
    pub sent: usize,
    pub dry_run: usize,
    pub failures: Vec<DeliveryFailure>,
    /// Where the failures were exported, if there were any.
    pub failure_report: Option<PathBuf>,
}

impl DeliveryReport {
    pub fn record(&mut self, outcome: DeliveryOutcome) {
        match outcome {
            DeliveryOutcome::Sent => self.sent += 1,
            DeliveryOutcome::DryRun => self.dry_run += 1,
            DeliveryOutcome::Failed(failure) => self.failures.push(failure),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}
