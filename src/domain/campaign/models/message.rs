#[derive(thiserror::Error, Debug)]
pub enum MessageError {
    #[error("Invalid email subject: {0}")]
    InvalidSubject(String),
    #[error("Invalid email Html content: {0}")]
    InvalidHtmlContent(String),
    #[error("Unknown email importance: {0}")]
    UnknownImportance(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    subject: EmailSubject,
    html_content: EmailHtmlContent,
    importance: EmailImportance,
}

impl EmailMessage {
    pub fn new(
        subject: EmailSubject,
        html_content: EmailHtmlContent,
        importance: EmailImportance,
    ) -> Self {
        Self {
            subject,
            html_content,
            importance,
        }
    }
    pub fn subject_as_ref(&self) -> &EmailSubject {
        &self.subject
    }
    pub fn html_as_ref(&self) -> &EmailHtmlContent {
        &self.html_content
    }
    pub fn importance(&self) -> EmailImportance {
        self.importance
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailSubject(String);

impl TryFrom<String> for EmailSubject {
    type Error = MessageError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        EmailSubject::try_from(value.as_str())
    }
}

impl TryFrom<&str> for EmailSubject {
    type Error = MessageError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        if !value.trim().is_empty() {
            Ok(Self(value.to_string()))
        } else {
            Err(MessageError::InvalidSubject(
                "EmailSubject cannot be empty.".into(),
            ))
        }
    }
}

impl AsRef<str> for EmailSubject {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailHtmlContent(String);

impl TryFrom<String> for EmailHtmlContent {
    type Error = MessageError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if !value.is_empty() {
            Ok(Self(value))
        } else {
            Err(MessageError::InvalidHtmlContent(
                "EmailHtmlContent cannot be empty.".into(),
            ))
        }
    }
}

impl TryFrom<&str> for EmailHtmlContent {
    type Error = MessageError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        EmailHtmlContent::try_from(value.to_string())
    }
}

impl AsRef<str> for EmailHtmlContent {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<EmailHtmlContent> for String {
    fn from(content: EmailHtmlContent) -> Self {
        content.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum EmailImportance {
    Low,
    Normal,
    #[default]
    High,
}

impl EmailImportance {
    const LOW: &'static str = "low";
    const NORMAL: &'static str = "normal";
    const HIGH: &'static str = "high";

    pub fn parse(importance: &str) -> Result<EmailImportance, MessageError> {
        match importance.trim().to_lowercase().as_str() {
            Self::LOW => Ok(EmailImportance::Low),
            Self::NORMAL => Ok(EmailImportance::Normal),
            Self::HIGH => Ok(EmailImportance::High),
            other => Err(MessageError::UnknownImportance(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EmailImportance::Low => Self::LOW,
            EmailImportance::Normal => Self::NORMAL,
            EmailImportance::High => Self::HIGH,
        }
    }
}
