use crate::domain::campaign::models::message::MessageError;
use crate::domain::recipient::errors::RecipientError;
use crate::domain::recipient::models::email::EmailError;

#[derive(thiserror::Error, Debug)]
pub enum CampaignError {
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Template error: {0}")]
    TemplateError(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl From<MessageError> for CampaignError {
    fn from(value: MessageError) -> Self {
        Self::ValidationError(value.to_string())
    }
}

impl From<EmailError> for CampaignError {
    fn from(value: EmailError) -> Self {
        Self::ValidationError(value.to_string())
    }
}

impl From<RecipientError> for CampaignError {
    fn from(value: RecipientError) -> Self {
        Self::ValidationError(value.to_string())
    }
}

/// Why a single message did not reach the sending API.
#[derive(thiserror::Error, Debug)]
pub enum DeliveryError {
    #[error("Failed to acquire an access token: {0}")]
    AuthError(String),
    #[error("The email API rejected the message with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}
