//! Device contact records as handed over by the OS contact provider.

use serde::{Deserialize, Serialize};

/// A field that can be requested from the device contact provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContactField {
    PhoneNumbers,
    Name,
}

/// A single phone entry on a device contact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneEntry {
    #[serde(default)]
    pub number: Option<String>,

    /// Provider label such as "mobile" or "home".
    #[serde(default)]
    pub label: Option<String>,
}

/// An opaque device contact snapshot.
///
/// Every field is optional: the provider may omit anything, and a missing
/// field is treated as "nothing usable" rather than an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawContact {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub phone_numbers: Option<Vec<PhoneEntry>>,
}

impl RawContact {
    /// Create a named contact with no phone numbers.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Add a phone number.
    #[must_use]
    pub fn with_phone(mut self, number: impl Into<String>) -> Self {
        self.phone_numbers
            .get_or_insert_with(Vec::new)
            .push(PhoneEntry {
                number: Some(number.into()),
                label: None,
            });
        self
    }

    /// Iterate the non-empty phone number strings of this contact.
    pub fn numbers(&self) -> impl Iterator<Item = &str> {
        self.phone_numbers
            .iter()
            .flatten()
            .filter_map(|entry| entry.number.as_deref())
            .filter(|number| !number.is_empty())
    }
}
