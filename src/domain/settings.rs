use super::money::Percentage;
use serde::{Deserialize, Serialize};

/// One of the two parties sharing the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Person {
    Person1,
    Person2,
}

/// The single split configuration of a ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitConfig {
    pub person1_name: String,
    pub person2_name: String,
    pub person1_percentage: Percentage,
}

impl SplitConfig {
    pub fn new(
        person1_name: impl Into<String>,
        person2_name: impl Into<String>,
        person1_percentage: Percentage,
    ) -> Self {
        Self {
            person1_name: person1_name.into(),
            person2_name: person2_name.into(),
            person1_percentage,
        }
    }

    pub fn person2_percentage(&self) -> Percentage {
        self.person1_percentage.complement()
    }

    /// Resolves a free-text name to a person, ignoring case.
    ///
    /// A name resolves to at most one person; person 1 wins if both names
    /// collide, which the write path rejects anyway.
    pub fn identify(&self, name: &str) -> Option<Person> {
        if same_person(name, &self.person1_name) {
            Some(Person::Person1)
        } else if same_person(name, &self.person2_name) {
            Some(Person::Person2)
        } else {
            None
        }
    }
}

/// Case-insensitive name comparison. No whitespace or diacritic folding.
pub fn same_person(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}
