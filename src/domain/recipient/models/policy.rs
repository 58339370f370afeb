use crate::domain::recipient::errors::RecipientError;
use regex::Regex;

/// Restricts which addresses a campaign may be delivered to.
///
/// The pattern must match at the start of the address; a trailing anchor is
/// left to the pattern itself.
#[derive(Debug, Clone, Default)]
pub struct AddressPolicy {
    pattern: Option<Regex>,
}

impl AddressPolicy {
    pub fn new(pattern: Option<&str>) -> Result<AddressPolicy, RecipientError> {
        let pattern = match pattern.map(str::trim) {
            None | Some("") => None,
            Some(pattern) => Some(
                Regex::new(&format!("^(?:{})", pattern))
                    .map_err(|e| RecipientError::InvalidPolicy(e.to_string()))?,
            ),
        };
        Ok(Self { pattern })
    }

    pub fn allows(&self, address: impl AsRef<str>) -> bool {
        match &self.pattern {
            Some(pattern) => pattern.is_match(address.as_ref()),
            None => true,
        }
    }

    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_ref().map(Regex::as_str)
    }
}
