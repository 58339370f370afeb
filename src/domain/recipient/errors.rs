#[derive(thiserror::Error, Debug)]
pub enum RecipientError {
    #[error("The recipient table has no `email_address` column")]
    MissingEmailColumn,
    /// `address` is the raw column value and `record` the row as JSON.
    #[error("Row #{row} has an invalid email address: {reason}")]
    InvalidEmail {
        row: usize,
        address: String,
        record: String,
        reason: String,
    },
    #[error("Row #{row} is malformed: {reason}")]
    MalformedRow {
        row: usize,
        address: String,
        record: String,
        reason: String,
    },
    #[error("Invalid address policy: {0}")]
    InvalidPolicy(String),
}

impl RecipientError {
    /// The raw address of a rejected row, when the row has one.
    pub fn address(&self) -> Option<&str> {
        match self {
            Self::InvalidEmail { address, .. } | Self::MalformedRow { address, .. } => {
                Some(address.as_str())
            }
            _ => None,
        }
    }
}
