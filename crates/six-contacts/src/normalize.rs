//! Phone number normalisation.
//!
//! A phone identifier is the last ten digits of a number once every
//! non-digit character is stripped. Numbers with fewer than ten digits
//! carry no identifier.

use std::collections::HashSet;

use crate::contact::RawContact;

/// Length of a canonical phone identifier.
pub const IDENTIFIER_LEN: usize = 10;

/// Reduce a raw phone string to its canonical identifier.
///
/// ```
/// use six_contacts::normalize_number;
///
/// assert_eq!(normalize_number("+1 (555) 123-4567").as_deref(), Some("5551234567"));
/// assert_eq!(normalize_number("123"), None);
/// ```
pub fn normalize_number(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.len() < IDENTIFIER_LEN {
        return None;
    }
    Some(digits[digits.len() - IDENTIFIER_LEN..].to_owned())
}

/// Normalise every phone number across `contacts` into a de-duplicated set.
pub fn normalize(contacts: &[RawContact]) -> NormalizedPhoneSet {
    contacts
        .iter()
        .flat_map(RawContact::numbers)
        .filter_map(normalize_number)
        .collect()
}

/// De-duplicated phone identifiers in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct NormalizedPhoneSet {
    numbers: Vec<String>,
    seen: HashSet<String>,
}

impl NormalizedPhoneSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an identifier; returns `false` if it was already present.
    pub fn insert(&mut self, identifier: String) -> bool {
        if self.seen.contains(&identifier) {
            return false;
        }
        self.seen.insert(identifier.clone());
        self.numbers.push(identifier);
        true
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.seen.contains(identifier)
    }

    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.numbers.iter()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.numbers
    }

    pub fn into_vec(self) -> Vec<String> {
        self.numbers
    }
}

impl PartialEq for NormalizedPhoneSet {
    fn eq(&self, other: &Self) -> bool {
        self.seen == other.seen
    }
}

impl Eq for NormalizedPhoneSet {}

impl FromIterator<String> for NormalizedPhoneSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut set = Self::new();
        for identifier in iter {
            set.insert(identifier);
        }
        set
    }
}

impl<'a> IntoIterator for &'a NormalizedPhoneSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::PhoneEntry;
    use proptest::prelude::*;

    fn contact(numbers: &[&str]) -> RawContact {
        numbers
            .iter()
            .fold(RawContact::default(), |c, n| c.with_phone(*n))
    }

    fn as_contacts(set: &NormalizedPhoneSet) -> Vec<RawContact> {
        set.iter().map(|n| contact(&[n.as_str()])).collect()
    }

    #[test]
    fn formatting_variants_collapse() {
        let contacts = vec![
            contact(&["+1 (555) 123-4567"]),
            contact(&["5551234567"]),
        ];

        let set = normalize(&contacts);
        assert_eq!(set.as_slice(), ["5551234567"]);
    }

    #[test]
    fn short_numbers_are_dropped() {
        let set = normalize(&[contact(&["123", "911", "555-0100"])]);
        assert!(set.is_empty());
    }

    #[test]
    fn longer_numbers_keep_last_ten() {
        assert_eq!(
            normalize_number("+44 20 7946 0958 12").as_deref(),
            Some("7946095812")
        );
        assert_eq!(normalize_number("00 1 555 123 4567").as_deref(), Some("5551234567"));
    }

    #[test]
    fn missing_fields_contribute_nothing() {
        let contacts = vec![
            RawContact::named("nobody"),
            RawContact {
                phone_numbers: Some(vec![PhoneEntry::default()]),
                ..Default::default()
            },
            contact(&[""]),
        ];
        assert!(normalize(&contacts).is_empty());
    }

    #[test]
    fn first_seen_order_is_kept() {
        let contacts = vec![
            contact(&["555-999-0000"]),
            contact(&["(555)123-4567", "555 999 0000"]),
        ];
        assert_eq!(normalize(&contacts).as_slice(), ["5559990000", "5551234567"]);
    }

    #[test]
    fn insert_reports_duplicates() {
        let mut set = NormalizedPhoneSet::new();
        assert!(set.insert("5551234567".into()));
        assert!(!set.insert("5551234567".into()));
        assert_eq!(set.len(), 1);
        assert!(set.contains("5551234567"));
    }

    proptest! {
        #[test]
        fn normalization_is_idempotent(numbers in prop::collection::vec("[0-9 ()+-]{0,20}", 0..20)) {
            let contacts: Vec<RawContact> = numbers.iter().map(|n| contact(&[n.as_str()])).collect();
            let once = normalize(&contacts);
            let twice = normalize(&as_contacts(&once));
            prop_assert_eq!(once.as_slice(), twice.as_slice());
        }

        #[test]
        fn identifiers_are_ten_unique_digits(numbers in prop::collection::vec(".{0,24}", 0..20)) {
            let contacts: Vec<RawContact> = numbers.iter().map(|n| contact(&[n.as_str()])).collect();
            let set = normalize(&contacts);

            let unique: HashSet<&String> = set.iter().collect();
            prop_assert_eq!(unique.len(), set.len());
            for id in &set {
                prop_assert_eq!(id.len(), IDENTIFIER_LEN);
                prop_assert!(id.chars().all(|c| c.is_ascii_digit()));
            }
        }
    }
}
