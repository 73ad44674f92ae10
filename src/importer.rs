//! Record importer
//!
//! Classifies one decoded remote record against the local dictionary and
//! produces the audit item for it. Classification and entity upsert are one
//! unit: calling an import twice with the same record never duplicates the
//! local entity, and a malformed record becomes an error-state item instead
//! of a process-ending fault.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{DatabaseConnection, Set};
use serde_json::Value as JsonValue;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{RepositoryError, is_unique_violation};
use crate::models::item::{self, ItemState, RecordKind};
use crate::models::{concept, mapping};
use crate::remote::records::{ConceptRecord, MappingRecord, external_id_of};
use crate::repositories::{ConceptRepository, MappingRepository};

/// Contract for importing one decoded record into the local dictionary.
///
/// The returned item carries the assigned change-state; an `Err` means the
/// store itself failed, which the engine degrades to a per-record failure.
#[async_trait]
pub trait RecordImporter: Send + Sync {
    async fn import_concept(
        &self,
        run_id: Uuid,
        raw: &JsonValue,
    ) -> Result<item::Model, RepositoryError>;

    async fn import_mapping(
        &self,
        run_id: Uuid,
        raw: &JsonValue,
    ) -> Result<item::Model, RepositoryError>;
}

/// SeaORM-backed importer over the concept and mapping repositories.
pub struct DbImporter {
    concepts: ConceptRepository,
    mappings: MappingRepository,
}

impl DbImporter {
    /// Create an importer over the given database connection.
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            concepts: ConceptRepository::new(db.clone()),
            mappings: MappingRepository::new(db),
        }
    }

    /// Classify the transition for a record already present locally.
    ///
    /// The whole normalized payload is the comparison basis: any field the
    /// remote changed counts as material.
    fn classify_existing(stored_payload: &JsonValue, raw: &JsonValue, remote_retired: bool, local_retired: bool) -> ItemState {
        if stored_payload == raw {
            return ItemState::UpToDate;
        }
        if remote_retired && !local_retired {
            return ItemState::Retired;
        }
        ItemState::Updated
    }

    async fn upsert_concept(
        &self,
        run_id: Uuid,
        record: &ConceptRecord,
        raw: &JsonValue,
    ) -> Result<item::Model, RepositoryError> {
        let existing = self.concepts.find_by_external_id(record.external_id).await?;

        let Some(existing) = existing else {
            let now = Utc::now().fixed_offset();
            let inserted = self
                .concepts
                .insert(concept::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    external_id: Set(record.external_id),
                    code: Set(record.id.clone()),
                    concept_class: Set(record.concept_class.clone()),
                    datatype: Set(record.datatype.clone()),
                    display_name: Set(record.display_name().map(String::from)),
                    payload: Set(raw.clone()),
                    retired: Set(record.retired),
                    created_at: Set(now),
                    updated_at: Set(now),
                })
                .await;

            return match inserted {
                Ok(_) => {
                    // A record arriving already retired is still worth the
                    // audit distinction over a plain add.
                    let state = if record.retired {
                        ItemState::Retired
                    } else {
                        ItemState::Added
                    };
                    Ok(item::Model::record(
                        run_id,
                        record.external_id,
                        RecordKind::Concept,
                        state,
                    ))
                }
                // Lost an insert race on the external uuid; fall through to
                // the update path against the row that won.
                Err(RepositoryError::Database { source }) if is_unique_violation(&source) => {
                    let existing = self
                        .concepts
                        .find_by_external_id(record.external_id)
                        .await?
                        .ok_or(RepositoryError::NotFound { entity: "concept" })?;
                    self.update_concept(run_id, record, raw, existing).await
                }
                Err(err) => Err(err),
            };
        };

        self.update_concept(run_id, record, raw, existing).await
    }

    async fn update_concept(
        &self,
        run_id: Uuid,
        record: &ConceptRecord,
        raw: &JsonValue,
        existing: concept::Model,
    ) -> Result<item::Model, RepositoryError> {
        let state = Self::classify_existing(&existing.payload, raw, record.retired, existing.retired);

        if state == ItemState::UpToDate {
            debug!(external_id = %record.external_id, "Concept unchanged");
            return Ok(item::Model::record(
                run_id,
                record.external_id,
                RecordKind::Concept,
                state,
            ));
        }

        let mut active: concept::ActiveModel = existing.into();
        active.code = Set(record.id.clone());
        active.concept_class = Set(record.concept_class.clone());
        active.datatype = Set(record.datatype.clone());
        active.display_name = Set(record.display_name().map(String::from));
        active.payload = Set(raw.clone());
        active.retired = Set(record.retired);
        active.updated_at = Set(Utc::now().fixed_offset());
        self.concepts.update(active).await?;

        Ok(item::Model::record(
            run_id,
            record.external_id,
            RecordKind::Concept,
            state,
        ))
    }

    async fn upsert_mapping(
        &self,
        run_id: Uuid,
        record: &MappingRecord,
        raw: &JsonValue,
    ) -> Result<item::Model, RepositoryError> {
        let existing = self.mappings.find_by_external_id(record.external_id).await?;

        let Some(existing) = existing else {
            let now = Utc::now().fixed_offset();
            let inserted = self
                .mappings
                .insert(mapping::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    external_id: Set(record.external_id),
                    map_type: Set(record.map_type.clone()),
                    from_concept_id: Set(record.from_concept),
                    to_concept_id: Set(record.to_concept),
                    to_source: Set(record.to_source.clone()),
                    to_code: Set(record.to_code.clone()),
                    payload: Set(raw.clone()),
                    retired: Set(record.retired),
                    created_at: Set(now),
                    updated_at: Set(now),
                })
                .await;

            return match inserted {
                Ok(_) => {
                    let state = if record.retired {
                        ItemState::Retired
                    } else {
                        ItemState::Added
                    };
                    Ok(item::Model::record(
                        run_id,
                        record.external_id,
                        RecordKind::Mapping,
                        state,
                    ))
                }
                Err(RepositoryError::Database { source }) if is_unique_violation(&source) => {
                    let existing = self
                        .mappings
                        .find_by_external_id(record.external_id)
                        .await?
                        .ok_or(RepositoryError::NotFound { entity: "mapping" })?;
                    self.update_mapping(run_id, record, raw, existing).await
                }
                Err(err) => Err(err),
            };
        };

        self.update_mapping(run_id, record, raw, existing).await
    }

    async fn update_mapping(
        &self,
        run_id: Uuid,
        record: &MappingRecord,
        raw: &JsonValue,
        existing: mapping::Model,
    ) -> Result<item::Model, RepositoryError> {
        let state = Self::classify_existing(&existing.payload, raw, record.retired, existing.retired);

        if state == ItemState::UpToDate {
            debug!(external_id = %record.external_id, "Mapping unchanged");
            return Ok(item::Model::record(
                run_id,
                record.external_id,
                RecordKind::Mapping,
                state,
            ));
        }

        let mut active: mapping::ActiveModel = existing.into();
        active.map_type = Set(record.map_type.clone());
        active.from_concept_id = Set(record.from_concept);
        active.to_concept_id = Set(record.to_concept);
        active.to_source = Set(record.to_source.clone());
        active.to_code = Set(record.to_code.clone());
        active.payload = Set(raw.clone());
        active.retired = Set(record.retired);
        active.updated_at = Set(Utc::now().fixed_offset());
        self.mappings.update(active).await?;

        Ok(item::Model::record(
            run_id,
            record.external_id,
            RecordKind::Mapping,
            state,
        ))
    }

    /// Build the error item for a record that failed to decode, keeping the
    /// source uuid when one is recoverable.
    fn rejected(run_id: Uuid, raw: &JsonValue, kind: RecordKind, reason: String) -> item::Model {
        let (external_id, reason) = match external_id_of(raw) {
            Some(id) => (id, reason),
            None => (
                Uuid::new_v4(),
                format!("{reason} (record carried no uuid; assigned a fresh one for audit)"),
            ),
        };
        warn!(external_id = %external_id, kind = %kind, reason = %reason, "Record rejected");
        item::Model::rejected(run_id, external_id, kind, reason)
    }
}

#[async_trait]
impl RecordImporter for DbImporter {
    async fn import_concept(
        &self,
        run_id: Uuid,
        raw: &JsonValue,
    ) -> Result<item::Model, RepositoryError> {
        let record: ConceptRecord = match serde_json::from_value(raw.clone()) {
            Ok(record) => record,
            Err(err) => {
                return Ok(Self::rejected(
                    run_id,
                    raw,
                    RecordKind::Concept,
                    format!("malformed concept record: {err}"),
                ));
            }
        };

        self.upsert_concept(run_id, &record, raw).await
    }

    async fn import_mapping(
        &self,
        run_id: Uuid,
        raw: &JsonValue,
    ) -> Result<item::Model, RepositoryError> {
        let record: MappingRecord = match serde_json::from_value(raw.clone()) {
            Ok(record) => record,
            Err(err) => {
                return Ok(Self::rejected(
                    run_id,
                    raw,
                    RecordKind::Mapping,
                    format!("malformed mapping record: {err}"),
                ));
            }
        };

        if !record.has_target() {
            return Ok(Self::rejected(
                run_id,
                raw,
                RecordKind::Mapping,
                "mapping targets neither a concept nor an external (source, code) pair"
                    .to_string(),
            ));
        }

        self.upsert_mapping(run_id, &record, raw).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn identical_payload_is_up_to_date() {
        let payload = json!({"type": "Concept", "uuid": "x", "retired": false});
        assert_eq!(
            DbImporter::classify_existing(&payload, &payload, false, false),
            ItemState::UpToDate
        );
    }

    #[test]
    fn fresh_retirement_wins_over_plain_update() {
        let stored = json!({"retired": false, "names": []});
        let incoming = json!({"retired": true, "names": []});
        assert_eq!(
            DbImporter::classify_existing(&stored, &incoming, true, false),
            ItemState::Retired
        );
    }

    #[test]
    fn changed_payload_on_an_already_retired_entity_is_updated() {
        let stored = json!({"retired": true, "datatype": "N/A"});
        let incoming = json!({"retired": true, "datatype": "Coded"});
        assert_eq!(
            DbImporter::classify_existing(&stored, &incoming, true, true),
            ItemState::Updated
        );
    }

    #[test]
    fn unretire_is_an_update() {
        let stored = json!({"retired": true});
        let incoming = json!({"retired": false});
        assert_eq!(
            DbImporter::classify_existing(&stored, &incoming, false, true),
            ItemState::Updated
        );
    }
}
