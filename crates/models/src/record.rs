use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A single stored secret entry.
///
/// Every field defaults when absent from an inbound body, so a client may
/// send only `{"type": "login", "password": "..."}`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Record {
    #[serde(rename = "type", default)]
    pub record_type: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub additional: String,
    #[serde(default)]
    pub favorite: bool,
}

impl Record {
    pub fn new(record_type: impl Into<String>, password: impl Into<String>) -> Self {
        Self { record_type: record_type.into(), password: password.into(), ..Self::default() }
    }
}

/// Name -> record. Keys are already normalized by `validation::validate_name`.
pub type Storage = HashMap<String, Record>;
