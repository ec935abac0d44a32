use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A document record as handed to index consumers: an identifier, a body and
/// a free-form metadata mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            metadata: Map::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Typed view over the provenance keys written by the report generator.
    pub fn report_metadata(&self) -> Result<ReportMetadata, serde_json::Error> {
        ReportMetadata::deserialize(Value::Object(self.metadata.clone()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub prompt: String,
    pub strategy: String,
    pub document_ids: Vec<String>,
    pub generated_on: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}
