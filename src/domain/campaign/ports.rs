use async_trait::async_trait;
use std::path::PathBuf;

use crate::domain::{
    campaign::{
        errors::{CampaignError, DeliveryError},
        models::{
            message::{EmailHtmlContent, EmailMessage},
            report::{DeliveryFailure, DeliveryReport},
        },
    },
    recipient::{
        errors::RecipientError,
        models::{email::RecipientEmail, recipient::Recipient},
    },
};

#[async_trait]
/// Represents a table of recipients
pub trait RecipientSource: Send + Sync + 'static {
    /// Asynchronously loads every row. The outer error aborts the campaign,
    /// an inner error only disqualifies its row.
    async fn load_recipients(
        &self,
    ) -> Result<Vec<Result<Recipient, RecipientError>>, anyhow::Error>;
}

/// Turns a recipient row into the HTML body addressed to them
pub trait TemplateRenderer: Send + Sync + 'static {
    fn render(&self, recipient: &Recipient) -> Result<EmailHtmlContent, CampaignError>;
}

#[async_trait]
pub trait MailSender: Send + Sync + 'static {
    async fn send_mail(
        &self,
        recipient: &RecipientEmail,
        message: &EmailMessage,
    ) -> Result<(), DeliveryError>;
}

#[async_trait]
pub trait FailureReporter: Send + Sync + 'static {
    /// Persists the failures and returns where they were written.
    async fn report(&self, failures: &[DeliveryFailure]) -> Result<PathBuf, anyhow::Error>;
}

#[async_trait]
pub trait CampaignService: Send + Sync + 'static {
    async fn run(&self) -> Result<DeliveryReport, CampaignError>;
}
