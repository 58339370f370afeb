use super::email::RecipientEmail;
use crate::domain::recipient::errors::RecipientError;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// A single row of the recipient table.
///
/// Every column is kept, in table order, so the row can be handed to the
/// template as-is and reported back verbatim when a delivery fails.
#[derive(Debug, Clone, PartialEq)]
pub struct Recipient {
    row_number: usize,
    email: RecipientEmail,
    fields: Vec<(String, String)>,
}

impl Recipient {
    pub const EMAIL_COLUMN: &'static str = "email_address";

    /// Builds a recipient from one table record.
    ///
    /// Missing trailing values read as empty strings. Extra values make the
    /// row malformed.
    pub fn from_record(
        row_number: usize,
        headers: &[String],
        mut values: Vec<String>,
    ) -> Result<Recipient, RecipientError> {
        let extra_values = values.len().saturating_sub(headers.len());
        values.resize(headers.len().max(values.len()), String::new());
        let fields: Vec<(String, String)> = headers.iter().cloned().zip(values).collect();
        let raw_email = fields
            .iter()
            .find(|(header, _)| header == Self::EMAIL_COLUMN)
            .map(|(_, value)| value.clone())
            .ok_or(RecipientError::MissingEmailColumn)?;

        if extra_values > 0 {
            return Err(RecipientError::MalformedRow {
                row: row_number,
                address: raw_email,
                record: fields_to_json(&fields),
                reason: format!(
                    "expected {} fields, found {}",
                    headers.len(),
                    headers.len() + extra_values
                ),
            });
        }
        let email = match RecipientEmail::parse(raw_email.clone()) {
            Ok(email) => email,
            Err(e) => {
                return Err(RecipientError::InvalidEmail {
                    row: row_number,
                    address: raw_email,
                    record: fields_to_json(&fields),
                    reason: e.to_string(),
                })
            }
        };

        Ok(Self {
            row_number,
            email,
            fields,
        })
    }

    pub fn row_number(&self) -> usize {
        self.row_number
    }

    pub fn email(&self) -> &RecipientEmail {
        &self.email
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(header, _)| header == column)
            .map(|(_, value)| value.as_str())
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The row as a JSON object, keys in column order.
    pub fn to_json(&self) -> String {
        fields_to_json(&self.fields)
    }
}

impl Serialize for Recipient {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        OrderedFields(&self.fields).serialize(serializer)
    }
}

struct OrderedFields<'a>(&'a [(String, String)]);

impl Serialize for OrderedFields<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

fn fields_to_json(fields: &[(String, String)]) -> String {
    serde_json::to_string(&OrderedFields(fields)).unwrap_or_else(|_| String::from("{}"))
}
