//! Wire record types of the delta payload.
//!
//! The decompressed export is a JSON object `{ "records": [...] }` whose
//! array interleaves concept-like and mapping-like records, each carrying a
//! `"type"` discriminator. `{}` is the valid empty delta. Records are kept as
//! raw JSON values until the importer decodes them, so one malformed record
//! never poisons the surrounding payload.

use serde::Deserialize;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::models::item::RecordKind;

/// Field carrying the record discriminator.
pub const TYPE_FIELD: &str = "type";
/// Discriminator value for concept-like records.
pub const CONCEPT_TYPE: &str = "Concept";
/// Discriminator value for mapping-like records.
pub const MAPPING_TYPE: &str = "Mapping";

/// Decoded delta payload.
#[derive(Debug, Default, Deserialize)]
pub struct DeltaPayload {
    #[serde(default)]
    pub records: Vec<JsonValue>,
}

/// Classify a raw record by its `"type"` tag without fully decoding it.
pub fn kind_of(record: &JsonValue) -> RecordKind {
    match record.get(TYPE_FIELD).and_then(JsonValue::as_str) {
        Some(CONCEPT_TYPE) => RecordKind::Concept,
        Some(MAPPING_TYPE) => RecordKind::Mapping,
        _ => RecordKind::Unknown,
    }
}

/// Pull the external uuid out of a raw record when it carries one, malformed
/// or not. Used to keep the audit identifier on error items.
pub fn external_id_of(record: &JsonValue) -> Option<Uuid> {
    record
        .get("uuid")
        .and_then(JsonValue::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
}

/// One localized name of a concept.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ConceptName {
    pub name: String,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub locale_preferred: bool,
    #[serde(default)]
    pub name_type: Option<String>,
}

/// One localized description of a concept.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ConceptDescription {
    pub description: String,
    #[serde(default)]
    pub locale: Option<String>,
}

/// Concept-like remote record.
#[derive(Debug, Clone, Deserialize)]
pub struct ConceptRecord {
    #[serde(rename = "uuid")]
    pub external_id: Uuid,
    /// Concept code within its source.
    pub id: String,
    pub concept_class: String,
    pub datatype: String,
    #[serde(default)]
    pub names: Vec<ConceptName>,
    #[serde(default)]
    pub descriptions: Vec<ConceptDescription>,
    #[serde(default)]
    pub retired: bool,
    #[serde(default)]
    pub extras: Option<JsonValue>,
}

impl ConceptRecord {
    /// Preferred display name: the locale-preferred entry when present,
    /// otherwise the first name.
    pub fn display_name(&self) -> Option<&str> {
        self.names
            .iter()
            .find(|n| n.locale_preferred)
            .or_else(|| self.names.first())
            .map(|n| n.name.as_str())
    }
}

/// Mapping-like remote record. References concepts by external uuid; targets
/// either another concept (`to_concept`) or a code in an external source
/// (`to_source` + `to_code`).
#[derive(Debug, Clone, Deserialize)]
pub struct MappingRecord {
    #[serde(rename = "uuid")]
    pub external_id: Uuid,
    pub map_type: String,
    pub from_concept: Uuid,
    #[serde(default)]
    pub to_concept: Option<Uuid>,
    #[serde(default)]
    pub to_source: Option<String>,
    #[serde(default)]
    pub to_code: Option<String>,
    #[serde(default)]
    pub retired: bool,
}

impl MappingRecord {
    /// A mapping must target a concept or an external (source, code) pair.
    pub fn has_target(&self) -> bool {
        self.to_concept.is_some() || (self.to_source.is_some() && self.to_code.is_some())
    }
}
