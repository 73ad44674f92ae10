//! Importer classification tests against an in-memory SQLite database.
//!
//! Covers the change-state matrix (added / updated / retired / up_to_date /
//! error) and the idempotent-upsert invariant: the same external uuid never
//! produces two local entities.

mod test_utils;

use anyhow::Result;
use serde_json::json;
use uuid::Uuid;

use termsync::importer::{DbImporter, RecordImporter};
use termsync::models::item::{ItemState, RecordKind};
use termsync::repositories::{ConceptRepository, MappingRepository};

use test_utils::{concept_record, mapping_record, setup_test_db};

const CONCEPT_UUID: &str = "6c1bbb30-9b34-4477-86b5-2b9e843e1103";
const OTHER_CONCEPT_UUID: &str = "ca57dc26-9361-4b51-943c-a5c9fb42bfa8";
const MAPPING_UUID: &str = "697bf112-a7ca-3ae3-af4f-8b46e3af7f10";

#[tokio::test]
async fn new_concept_is_added_and_persisted() -> Result<()> {
    let db = setup_test_db().await?;
    let importer = DbImporter::new(db.clone());
    let concepts = ConceptRepository::new(db);
    let run_id = Uuid::new_v4();

    let item = importer
        .import_concept(run_id, &concept_record(CONCEPT_UUID, "1001"))
        .await?;

    assert_eq!(item.state, ItemState::Added.as_str());
    assert_eq!(item.kind, RecordKind::Concept.as_str());
    assert_eq!(item.run_id, run_id);
    assert_eq!(item.external_id, Uuid::parse_str(CONCEPT_UUID)?);

    let stored = concepts
        .find_by_external_id(Uuid::parse_str(CONCEPT_UUID)?)
        .await?
        .expect("concept persisted");
    assert_eq!(stored.code, "1001");
    assert_eq!(stored.display_name.as_deref(), Some("Concept 1001"));
    assert!(!stored.retired);

    Ok(())
}

#[tokio::test]
async fn reimporting_an_identical_concept_is_up_to_date() -> Result<()> {
    let db = setup_test_db().await?;
    let importer = DbImporter::new(db.clone());
    let concepts = ConceptRepository::new(db);
    let raw = concept_record(CONCEPT_UUID, "1001");

    importer.import_concept(Uuid::new_v4(), &raw).await?;
    let second = importer.import_concept(Uuid::new_v4(), &raw).await?;

    assert_eq!(second.state, ItemState::UpToDate.as_str());
    assert_eq!(concepts.count().await?, 1);

    Ok(())
}

#[tokio::test]
async fn changed_payload_updates_the_concept_in_place() -> Result<()> {
    let db = setup_test_db().await?;
    let importer = DbImporter::new(db.clone());
    let concepts = ConceptRepository::new(db);

    importer
        .import_concept(Uuid::new_v4(), &concept_record(CONCEPT_UUID, "1001"))
        .await?;

    let mut changed = concept_record(CONCEPT_UUID, "1001");
    changed["datatype"] = json!("Coded");
    let item = importer.import_concept(Uuid::new_v4(), &changed).await?;

    assert_eq!(item.state, ItemState::Updated.as_str());
    assert_eq!(concepts.count().await?, 1);

    let stored = concepts
        .find_by_external_id(Uuid::parse_str(CONCEPT_UUID)?)
        .await?
        .expect("concept persisted");
    assert_eq!(stored.datatype, "Coded");

    Ok(())
}

#[tokio::test]
async fn retirement_is_a_state_change_not_a_deletion() -> Result<()> {
    let db = setup_test_db().await?;
    let importer = DbImporter::new(db.clone());
    let concepts = ConceptRepository::new(db);

    importer
        .import_concept(Uuid::new_v4(), &concept_record(CONCEPT_UUID, "1001"))
        .await?;

    let mut retired = concept_record(CONCEPT_UUID, "1001");
    retired["retired"] = json!(true);
    let item = importer.import_concept(Uuid::new_v4(), &retired).await?;

    assert_eq!(item.state, ItemState::Retired.as_str());

    let stored = concepts
        .find_by_external_id(Uuid::parse_str(CONCEPT_UUID)?)
        .await?
        .expect("retired concept still present");
    assert!(stored.retired);

    Ok(())
}

#[tokio::test]
async fn unretiring_counts_as_an_update() -> Result<()> {
    let db = setup_test_db().await?;
    let importer = DbImporter::new(db.clone());

    let mut retired = concept_record(CONCEPT_UUID, "1001");
    retired["retired"] = json!(true);
    importer.import_concept(Uuid::new_v4(), &retired).await?;

    let item = importer
        .import_concept(Uuid::new_v4(), &concept_record(CONCEPT_UUID, "1001"))
        .await?;

    assert_eq!(item.state, ItemState::Updated.as_str());

    Ok(())
}

#[tokio::test]
async fn concept_arriving_already_retired_is_inserted_retired() -> Result<()> {
    let db = setup_test_db().await?;
    let importer = DbImporter::new(db.clone());
    let concepts = ConceptRepository::new(db);

    let mut raw = concept_record(CONCEPT_UUID, "1001");
    raw["retired"] = json!(true);
    let item = importer.import_concept(Uuid::new_v4(), &raw).await?;

    assert_eq!(item.state, ItemState::Retired.as_str());
    let stored = concepts
        .find_by_external_id(Uuid::parse_str(CONCEPT_UUID)?)
        .await?
        .expect("concept persisted despite arriving retired");
    assert!(stored.retired);

    Ok(())
}

#[tokio::test]
async fn malformed_concept_becomes_an_error_item() -> Result<()> {
    let db = setup_test_db().await?;
    let importer = DbImporter::new(db.clone());
    let concepts = ConceptRepository::new(db);

    // Missing uuid and datatype.
    let raw = json!({
        "type": "Concept",
        "id": "1001",
        "concept_class": "Diagnosis"
    });
    let item = importer.import_concept(Uuid::new_v4(), &raw).await?;

    assert_eq!(item.state, ItemState::Error.as_str());
    let message = item.error_message.expect("reason retained");
    assert!(message.contains("malformed concept record"));
    assert!(message.contains("no uuid"));
    assert_eq!(concepts.count().await?, 0);

    Ok(())
}

#[tokio::test]
async fn malformed_record_with_uuid_keeps_its_identifier() -> Result<()> {
    let db = setup_test_db().await?;
    let importer = DbImporter::new(db.clone());

    // Carries a uuid but no decodable body.
    let raw = json!({
        "type": "Concept",
        "uuid": CONCEPT_UUID,
        "id": 42
    });
    let item = importer.import_concept(Uuid::new_v4(), &raw).await?;

    assert_eq!(item.state, ItemState::Error.as_str());
    assert_eq!(item.external_id, Uuid::parse_str(CONCEPT_UUID)?);

    Ok(())
}

#[tokio::test]
async fn mapping_roundtrip_add_then_up_to_date_then_update() -> Result<()> {
    let db = setup_test_db().await?;
    let importer = DbImporter::new(db.clone());
    let mappings = MappingRepository::new(db);
    let raw = mapping_record(MAPPING_UUID, CONCEPT_UUID, OTHER_CONCEPT_UUID);

    let added = importer.import_mapping(Uuid::new_v4(), &raw).await?;
    assert_eq!(added.state, ItemState::Added.as_str());

    let unchanged = importer.import_mapping(Uuid::new_v4(), &raw).await?;
    assert_eq!(unchanged.state, ItemState::UpToDate.as_str());

    let mut changed = raw.clone();
    changed["map_type"] = json!("NARROWER-THAN");
    let updated = importer.import_mapping(Uuid::new_v4(), &changed).await?;
    assert_eq!(updated.state, ItemState::Updated.as_str());

    assert_eq!(mappings.count().await?, 1);
    let stored = mappings
        .find_by_external_id(Uuid::parse_str(MAPPING_UUID)?)
        .await?
        .expect("mapping persisted");
    assert_eq!(stored.map_type, "NARROWER-THAN");
    assert_eq!(
        stored.from_concept_id,
        Uuid::parse_str(CONCEPT_UUID).unwrap()
    );

    Ok(())
}

#[tokio::test]
async fn mapping_into_an_external_source_is_supported() -> Result<()> {
    let db = setup_test_db().await?;
    let importer = DbImporter::new(db.clone());
    let mappings = MappingRepository::new(db);

    let raw = json!({
        "type": "Mapping",
        "uuid": MAPPING_UUID,
        "map_type": "SAME-AS",
        "from_concept": CONCEPT_UUID,
        "to_source": "ICD-10",
        "to_code": "R50.9"
    });
    let item = importer.import_mapping(Uuid::new_v4(), &raw).await?;

    assert_eq!(item.state, ItemState::Added.as_str());
    let stored = mappings
        .find_by_external_id(Uuid::parse_str(MAPPING_UUID)?)
        .await?
        .expect("mapping persisted");
    assert_eq!(stored.to_source.as_deref(), Some("ICD-10"));
    assert_eq!(stored.to_code.as_deref(), Some("R50.9"));
    assert!(stored.to_concept_id.is_none());

    Ok(())
}

#[tokio::test]
async fn mapping_without_a_target_is_rejected() -> Result<()> {
    let db = setup_test_db().await?;
    let importer = DbImporter::new(db.clone());
    let mappings = MappingRepository::new(db);

    let raw = json!({
        "type": "Mapping",
        "uuid": MAPPING_UUID,
        "map_type": "SAME-AS",
        "from_concept": CONCEPT_UUID,
        "to_source": "ICD-10"
    });
    let item = importer.import_mapping(Uuid::new_v4(), &raw).await?;

    assert_eq!(item.state, ItemState::Error.as_str());
    assert!(
        item.error_message
            .expect("reason retained")
            .contains("targets neither")
    );
    assert_eq!(mappings.count().await?, 0);

    Ok(())
}
