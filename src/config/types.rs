use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::args::{HttpMethod, OutputFormat};
use crate::error::ValidationError;

/// On-disk run configuration. Every field is optional; explicit CLI flags
/// win over file values.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub url: Option<String>,
    pub method: Option<HttpMethod>,
    #[serde(alias = "concurrency")]
    pub clients: Option<usize>,
    /// Header values must be strings; anything else fails to parse.
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(alias = "data")]
    pub post_data: Option<Value>,
    pub duration: Option<DurationValue>,
    pub run_id: Option<String>,
    pub capture_body: Option<bool>,
    pub output_format: Option<OutputFormat>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
}

impl DurationValue {
    pub(crate) fn to_duration(&self) -> Result<Duration, ValidationError> {
        match self {
            DurationValue::Seconds(0) => Err(ValidationError::DurationZero),
            DurationValue::Seconds(secs) => Ok(Duration::from_secs(*secs)),
            DurationValue::Text(text) => super::parse_duration_value(text),
        }
    }
}
