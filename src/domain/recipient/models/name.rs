use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, thiserror::Error)]
pub enum SenderNameError {
    #[error("Sender name cannot be empty or whitespace.")]
    EmptyOrWhitespace,
    #[error(
        "Sender name is too long (maximum allowed is {} characters).",
        SenderName::MAX_LENGTH
    )]
    TooLong,
    #[error("Sender name contains control characters.")]
    ContainsControlCharacters,
}

/// Display name shown next to the sending mailbox address.
#[derive(Debug, PartialEq, Clone)]
pub struct SenderName(String);

impl SenderName {
    const MAX_LENGTH: usize = 256;

    pub fn parse(s: String) -> Result<SenderName, SenderNameError> {
        if s.trim().is_empty() {
            return Err(SenderNameError::EmptyOrWhitespace);
        }
        if s.graphemes(true).count() > SenderName::MAX_LENGTH {
            return Err(SenderNameError::TooLong);
        }
        if s.chars().any(char::is_control) {
            return Err(SenderNameError::ContainsControlCharacters);
        }
        Ok(Self(s))
    }
}

impl AsRef<str> for SenderName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SenderName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
