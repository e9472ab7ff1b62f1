use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Root payload from the incentive registry API
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegistryResponse {
    /// One JSON object per incentive program
    pub data: Vec<Map<String, Value>>,
}

/// A legal authority attached to a program
///
/// Only the date-bearing fields are read; the registry fills them
/// inconsistently, so any of them may be absent, null, or free text.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorityRecord {
    #[serde(default)]
    pub enacted_date: Option<String>,
    #[serde(default)]
    pub enacted_date_display: Option<String>,
    #[serde(default)]
    pub enacted_text: Option<String>,
    #[serde(default)]
    pub effective_date: Option<String>,
    #[serde(default)]
    pub effective_date_display: Option<String>,
    #[serde(default)]
    pub effective_text: Option<String>,
}

impl AuthorityRecord {
    /// Non-empty date texts in field order
    pub fn date_texts(&self) -> impl Iterator<Item = &str> {
        [
            &self.enacted_date,
            &self.enacted_date_display,
            &self.enacted_text,
            &self.effective_date,
            &self.effective_date_display,
            &self.effective_text,
        ]
        .into_iter()
        .filter_map(|field| field.as_deref())
        .filter(|text| !text.trim().is_empty())
    }
}
