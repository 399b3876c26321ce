//! Patient aggregate operations: uniqueness enforcement, parent/child wiring,
//! caregiver reconciliation, ownership checks on delete.
//!
//! Every mutating operation runs inside one transaction spanning its duplicate
//! checks, reads, and writes; any failure rolls the whole operation back.

use std::collections::HashSet;

use rusqlite::Connection;
use uuid::Uuid;

use crate::db::repository::{address, caregiver, patient};
use crate::db::DatabaseError;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{Address, Caregiver, CaregiverDraft, Patient, PatientDraft};

/// Create a patient aggregate: the patient row, its address, and any supplied
/// caregivers, all with fresh ids and back-references set.
pub fn create_patient(conn: &mut Connection, draft: &PatientDraft) -> ServiceResult<Patient> {
    tracing::info!(email = %draft.email, "attempting to create a new patient");

    let tx = conn.transaction().map_err(DatabaseError::from)?;

    if patient::exists_duplicate(
        &tx,
        &draft.first_name,
        &draft.last_name,
        draft.date_of_birth,
        None,
    )? {
        return Err(ServiceError::DuplicatePatient);
    }

    let patient = assemble_aggregate(draft);
    patient::insert_patient(&tx, &patient).map_err(map_save_error)?;
    address::insert_address(&tx, &patient.address)?;
    for entry in &patient.caregivers {
        caregiver::insert_caregiver(&tx, entry).map_err(map_save_error)?;
    }

    tx.commit().map_err(DatabaseError::from)?;
    tracing::info!(patient_id = %patient.id, "successfully created new patient");
    Ok(patient)
}

/// Fetch a patient aggregate by id. Absence is not an error.
pub fn get_patient(conn: &Connection, id: &Uuid) -> ServiceResult<Option<Patient>> {
    tracing::info!(patient_id = %id, "searching for patient");
    let patient = patient::find_patient(conn, id)?;
    if patient.is_some() {
        tracing::info!(patient_id = %id, "found patient");
    } else {
        tracing::warn!(patient_id = %id, "no patient found");
    }
    Ok(patient)
}

/// Term search over name, email, and phone. Empty result is not an error.
pub fn search_patients(conn: &Connection, term: &str) -> ServiceResult<Vec<Patient>> {
    tracing::info!(term, "searching for patients");
    let patients = patient::search_by_term(conn, term)?;
    tracing::info!(term, count = patients.len(), "patient search finished");
    Ok(patients)
}

/// Replace a patient's scalar fields from the draft and reconcile its
/// caregiver collection. An absent caregiver list leaves the existing
/// caregivers untouched; a present list becomes the new collection wholesale,
/// destroying any caregiver omitted from it.
pub fn update_patient(
    conn: &mut Connection,
    id: &Uuid,
    draft: &PatientDraft,
) -> ServiceResult<Patient> {
    tracing::info!(patient_id = %id, "attempting to update patient");

    let tx = conn.transaction().map_err(DatabaseError::from)?;

    let Some(existing) = patient::find_patient(&tx, id)? else {
        tracing::error!(patient_id = %id, "update failed; patient not found");
        return Err(ServiceError::PatientNotFound(*id));
    };

    if patient::exists_duplicate(
        &tx,
        &draft.first_name,
        &draft.last_name,
        draft.date_of_birth,
        Some(id),
    )? {
        return Err(ServiceError::DuplicatePatient);
    }

    let mut updated = existing.clone();
    apply_scalar_fields(&mut updated, draft);

    if let Some(drafts) = &draft.caregivers {
        updated.caregivers = reconcile_caregivers(&tx, id, &existing.caregivers, drafts)?;
    }

    patient::update_patient(&tx, &updated).map_err(map_save_error)?;
    address::update_address(&tx, &updated.address)?;

    tx.commit().map_err(DatabaseError::from)?;
    tracing::info!(patient_id = %id, "successfully updated patient");
    Ok(updated)
}

/// Add a single new caregiver to an existing patient.
pub fn add_caregiver(
    conn: &mut Connection,
    patient_id: &Uuid,
    draft: &CaregiverDraft,
) -> ServiceResult<Caregiver> {
    tracing::info!(patient_id = %patient_id, "attempting to add a new caregiver");

    let tx = conn.transaction().map_err(DatabaseError::from)?;

    if !patient::exists_by_id(&tx, patient_id)? {
        tracing::error!(patient_id = %patient_id, "failed to add caregiver; patient not found");
        return Err(ServiceError::PatientNotFound(*patient_id));
    }

    if caregiver::exists_duplicate(
        &tx,
        patient_id,
        &draft.first_name,
        &draft.last_name,
        &draft.email,
        &draft.phone_number,
        &draft.relationship_to_patient,
        None,
    )? {
        return Err(ServiceError::DuplicateCaregiver);
    }

    let caregiver = new_caregiver(draft, patient_id);
    caregiver::insert_caregiver(&tx, &caregiver).map_err(map_save_error)?;

    tx.commit().map_err(DatabaseError::from)?;
    tracing::info!(
        caregiver_id = %caregiver.id,
        patient_id = %patient_id,
        "successfully added new caregiver"
    );
    Ok(caregiver)
}

/// Delete one caregiver through its owning patient. Rejected unless the
/// caregiver's back-reference matches the supplied patient id, so a caller
/// cannot delete another patient's caregiver by mixing ids.
pub fn delete_caregiver(
    conn: &mut Connection,
    patient_id: &Uuid,
    caregiver_id: &Uuid,
) -> ServiceResult<()> {
    tracing::info!(caregiver_id = %caregiver_id, patient_id = %patient_id, "attempting to delete caregiver");

    let tx = conn.transaction().map_err(DatabaseError::from)?;

    let Some(caregiver) = caregiver::find_caregiver(&tx, caregiver_id)? else {
        tracing::error!(caregiver_id = %caregiver_id, "failed to delete caregiver; caregiver not found");
        return Err(ServiceError::CaregiverNotFound(*caregiver_id));
    };

    if caregiver.patient_id != *patient_id {
        tracing::error!(
            caregiver_id = %caregiver_id,
            patient_id = %patient_id,
            owner_id = %caregiver.patient_id,
            "attempted to delete a caregiver that does not belong to the patient"
        );
        return Err(ServiceError::OwnershipViolation {
            caregiver_id: *caregiver_id,
            patient_id: *patient_id,
        });
    }

    caregiver::delete_caregiver(&tx, caregiver_id)?;

    tx.commit().map_err(DatabaseError::from)?;
    tracing::info!(caregiver_id = %caregiver_id, patient_id = %patient_id, "successfully deleted caregiver");
    Ok(())
}

/// Delete a patient; the address, caregivers, and medical history go with it.
pub fn delete_patient(conn: &mut Connection, id: &Uuid) -> ServiceResult<()> {
    tracing::info!(patient_id = %id, "attempting to delete patient");

    let tx = conn.transaction().map_err(DatabaseError::from)?;

    if !patient::exists_by_id(&tx, id)? {
        tracing::error!(patient_id = %id, "delete failed; patient not found");
        return Err(ServiceError::PatientNotFound(*id));
    }
    patient::delete_patient(&tx, id)?;

    tx.commit().map_err(DatabaseError::from)?;
    tracing::info!(patient_id = %id, "successfully deleted patient");
    Ok(())
}

/// Reconcile the caregiver collection toward the draft list: entries with an
/// id must belong to this patient and are overwritten in place, entries
/// without an id are inserted as new, and current caregivers missing from the
/// draft are destroyed.
fn reconcile_caregivers(
    conn: &Connection,
    patient_id: &Uuid,
    current: &[Caregiver],
    drafts: &[CaregiverDraft],
) -> ServiceResult<Vec<Caregiver>> {
    let mut replacement = Vec::with_capacity(drafts.len());

    for entry in drafts {
        if caregiver::exists_duplicate(
            conn,
            patient_id,
            &entry.first_name,
            &entry.last_name,
            &entry.email,
            &entry.phone_number,
            &entry.relationship_to_patient,
            entry.id.as_ref(),
        )? {
            return Err(ServiceError::DuplicateCaregiver);
        }

        match entry.id {
            None => {
                let caregiver = new_caregiver(entry, patient_id);
                caregiver::insert_caregiver(conn, &caregiver).map_err(map_save_error)?;
                replacement.push(caregiver);
            }
            Some(id) => {
                if !current.iter().any(|c| c.id == id) {
                    return Err(ServiceError::CaregiverNotFound(id));
                }
                let updated = Caregiver {
                    id,
                    first_name: entry.first_name.clone(),
                    last_name: entry.last_name.clone(),
                    email: entry.email.clone(),
                    phone_number: entry.phone_number.clone(),
                    relationship_to_patient: entry.relationship_to_patient.clone(),
                    patient_id: *patient_id,
                };
                caregiver::update_caregiver(conn, &updated).map_err(map_save_error)?;
                replacement.push(updated);
            }
        }
    }

    // Current caregivers omitted from the draft are destroyed, not unlinked.
    let draft_ids: HashSet<Uuid> = drafts.iter().filter_map(|d| d.id).collect();
    for existing in current {
        if !draft_ids.contains(&existing.id) {
            caregiver::delete_caregiver(conn, &existing.id)?;
        }
    }

    Ok(replacement)
}

fn assemble_aggregate(draft: &PatientDraft) -> Patient {
    let patient_id = Uuid::new_v4();
    let caregivers = draft
        .caregivers
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(|entry| new_caregiver(entry, &patient_id))
        .collect();

    Patient {
        id: patient_id,
        first_name: draft.first_name.clone(),
        last_name: draft.last_name.clone(),
        email: draft.email.clone(),
        phone_number: draft.phone_number.clone(),
        height_cm: draft.height_cm,
        weight_kg: draft.weight_kg,
        date_of_birth: draft.date_of_birth,
        ethnicity: draft.ethnicity.clone(),
        type_of_diabetes: draft.type_of_diabetes.clone(),
        date_of_diagnosis: draft.date_of_diagnosis,
        biological_sex: draft.biological_sex.clone(),
        notes: draft.notes.clone(),
        assigned_physician: draft.assigned_physician.clone(),
        medical_history: draft.medical_history.clone(),
        address: Address {
            id: Uuid::new_v4(),
            mailing_address: draft.address.mailing_address.clone(),
            zipcode: draft.address.zipcode.clone(),
            county: draft.address.county.clone(),
            state: draft.address.state.clone(),
            country: draft.address.country.clone(),
            patient_id,
        },
        caregivers,
    }
}

/// Overwrite scalar fields, medical history, and address fields from the
/// draft. The address keeps its id and back-reference; the caregiver
/// collection is reconciled separately.
fn apply_scalar_fields(patient: &mut Patient, draft: &PatientDraft) {
    patient.first_name = draft.first_name.clone();
    patient.last_name = draft.last_name.clone();
    patient.email = draft.email.clone();
    patient.phone_number = draft.phone_number.clone();
    patient.height_cm = draft.height_cm;
    patient.weight_kg = draft.weight_kg;
    patient.date_of_birth = draft.date_of_birth;
    patient.ethnicity = draft.ethnicity.clone();
    patient.type_of_diabetes = draft.type_of_diabetes.clone();
    patient.date_of_diagnosis = draft.date_of_diagnosis;
    patient.biological_sex = draft.biological_sex.clone();
    patient.notes = draft.notes.clone();
    patient.assigned_physician = draft.assigned_physician.clone();
    patient.medical_history = draft.medical_history.clone();
    patient.address.mailing_address = draft.address.mailing_address.clone();
    patient.address.zipcode = draft.address.zipcode.clone();
    patient.address.county = draft.address.county.clone();
    patient.address.state = draft.address.state.clone();
    patient.address.country = draft.address.country.clone();
}

fn new_caregiver(draft: &CaregiverDraft, patient_id: &Uuid) -> Caregiver {
    Caregiver {
        id: Uuid::new_v4(),
        first_name: draft.first_name.clone(),
        last_name: draft.last_name.clone(),
        email: draft.email.clone(),
        phone_number: draft.phone_number.clone(),
        relationship_to_patient: draft.relationship_to_patient.clone(),
        patient_id: *patient_id,
    }
}

/// The unique indexes behind the duplicate rules close the window between a
/// passing predicate check and the insert. A violation on one of them is the
/// same business failure as a failed predicate, so it maps to the matching
/// duplicate error instead of a storage error. SQLite names the violated
/// columns in the message ("UNIQUE constraint failed: patients.first_name,
/// ..."), which identifies the index: only the identity indexes cover
/// `patients.first_name` / `caregivers.patient_id`.
fn map_save_error(err: DatabaseError) -> ServiceError {
    let duplicate = match &err {
        DatabaseError::Sqlite(rusqlite::Error::SqliteFailure(code, Some(msg)))
            if code.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            if msg.contains("patients.first_name") {
                Some(ServiceError::DuplicatePatient)
            } else if msg.contains("caregivers.patient_id") {
                Some(ServiceError::DuplicateCaregiver)
            } else {
                None
            }
        }
        _ => None,
    };
    duplicate.unwrap_or(ServiceError::Storage(err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::models::AddressDraft;
    use chrono::NaiveDate;

    fn patient_draft(first: &str, last: &str, email: &str) -> PatientDraft {
        PatientDraft {
            first_name: first.into(),
            last_name: last.into(),
            email: email.into(),
            phone_number: "555-123-4567".into(),
            height_cm: 170.0,
            weight_kg: 65.0,
            date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            ethnicity: "White".into(),
            type_of_diabetes: "Type 1".into(),
            date_of_diagnosis: NaiveDate::from_ymd_opt(2015, 6, 1).unwrap(),
            biological_sex: "Female".into(),
            notes: None,
            assigned_physician: "Dr. Chen".into(),
            medical_history: vec!["Hypertension".into()],
            address: AddressDraft {
                mailing_address: "12 Main St".into(),
                zipcode: "12345".into(),
                county: "Kings".into(),
                state: "NY".into(),
                country: "USA".into(),
            },
            caregivers: None,
        }
    }

    fn caregiver_draft(first: &str, email: &str) -> CaregiverDraft {
        CaregiverDraft {
            id: None,
            first_name: first.into(),
            last_name: "Connor".into(),
            email: email.into(),
            phone_number: "555-111-2222".into(),
            relationship_to_patient: "Mother".into(),
        }
    }

    #[test]
    fn create_assigns_ids_and_back_references() {
        let mut conn = open_memory_database().unwrap();
        let mut draft = patient_draft("Jane", "Doe", "jane@x.com");
        draft.caregivers = Some(vec![caregiver_draft("Sarah", "sarah@x.com")]);

        let patient = create_patient(&mut conn, &draft).unwrap();

        assert_eq!(patient.address.patient_id, patient.id);
        assert_eq!(patient.caregivers.len(), 1);
        assert_eq!(patient.caregivers[0].patient_id, patient.id);

        let reloaded = get_patient(&conn, &patient.id).unwrap().unwrap();
        assert_eq!(reloaded.email, "jane@x.com");
        assert_eq!(reloaded.caregivers.len(), 1);
        assert_eq!(reloaded.address.id, patient.address.id);
    }

    #[test]
    fn create_rejects_duplicate_identity() {
        let mut conn = open_memory_database().unwrap();
        create_patient(&mut conn, &patient_draft("Jane", "Doe", "jane@x.com")).unwrap();

        let err = create_patient(&mut conn, &patient_draft("Jane", "Doe", "jane2@x.com"))
            .unwrap_err();
        assert!(matches!(err, ServiceError::DuplicatePatient));
    }

    #[test]
    fn create_allows_same_name_different_birth_date() {
        let mut conn = open_memory_database().unwrap();
        create_patient(&mut conn, &patient_draft("Jane", "Doe", "jane@x.com")).unwrap();

        let mut other = patient_draft("Jane", "Doe", "jane2@x.com");
        other.date_of_birth = NaiveDate::from_ymd_opt(1991, 2, 2).unwrap();
        assert!(create_patient(&mut conn, &other).is_ok());
    }

    #[test]
    fn create_with_two_identical_caregivers_is_rejected() {
        let mut conn = open_memory_database().unwrap();
        let mut draft = patient_draft("Jane", "Doe", "jane@x.com");
        draft.caregivers = Some(vec![
            caregiver_draft("Sarah", "sarah@x.com"),
            caregiver_draft("Sarah", "sarah@x.com"),
        ]);

        // No predicate runs at creation time; the unique index catches it.
        let err = create_patient(&mut conn, &draft).unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateCaregiver));
        // Nothing persisted
        assert!(search_patients(&conn, "jane@x.com").unwrap().is_empty());
    }

    #[test]
    fn get_missing_patient_is_none() {
        let conn = open_memory_database().unwrap();
        assert!(get_patient(&conn, &Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn search_returns_empty_for_no_match() {
        let mut conn = open_memory_database().unwrap();
        create_patient(&mut conn, &patient_draft("Jane", "Doe", "jane@x.com")).unwrap();

        assert_eq!(search_patients(&conn, "doe").unwrap().len(), 1);
        assert!(search_patients(&conn, "nobody").unwrap().is_empty());
    }

    #[test]
    fn update_overwrites_scalars_and_keeps_address_identity() {
        let mut conn = open_memory_database().unwrap();
        let patient = create_patient(&mut conn, &patient_draft("Jane", "Doe", "jane@x.com"))
            .unwrap();

        let mut draft = patient_draft("Jane", "Doe", "jane@new.com");
        draft.weight_kg = 70.0;
        draft.address.state = "CA".into();
        let updated = update_patient(&mut conn, &patient.id, &draft).unwrap();

        assert_eq!(updated.email, "jane@new.com");
        assert_eq!(updated.weight_kg, 70.0);
        assert_eq!(updated.address.state, "CA");
        // Address identity and back-reference survive the overwrite
        assert_eq!(updated.address.id, patient.address.id);
        assert_eq!(updated.address.patient_id, patient.id);
    }

    #[test]
    fn update_missing_patient_is_not_found() {
        let mut conn = open_memory_database().unwrap();
        let id = Uuid::new_v4();
        let err = update_patient(&mut conn, &id, &patient_draft("Jane", "Doe", "jane@x.com"))
            .unwrap_err();
        assert!(matches!(err, ServiceError::PatientNotFound(missing) if missing == id));
    }

    #[test]
    fn update_rejects_identity_collision_with_another_patient() {
        let mut conn = open_memory_database().unwrap();
        create_patient(&mut conn, &patient_draft("Jane", "Doe", "jane@x.com")).unwrap();
        let mut other_draft = patient_draft("Bob", "Smith", "bob@x.com");
        other_draft.date_of_birth = NaiveDate::from_ymd_opt(1985, 3, 3).unwrap();
        let other = create_patient(&mut conn, &other_draft).unwrap();

        // Renaming Bob to Jane Doe with Jane's date of birth collides
        let collision = patient_draft("Jane", "Doe", "bob@x.com");
        let err = update_patient(&mut conn, &other.id, &collision).unwrap_err();
        assert!(matches!(err, ServiceError::DuplicatePatient));
    }

    #[test]
    fn update_excludes_own_id_from_duplicate_check() {
        let mut conn = open_memory_database().unwrap();
        let patient = create_patient(&mut conn, &patient_draft("Jane", "Doe", "jane@x.com"))
            .unwrap();

        // Same identity triple, changed weight: not a duplicate of itself
        let mut draft = patient_draft("Jane", "Doe", "jane@x.com");
        draft.weight_kg = 72.5;
        let updated = update_patient(&mut conn, &patient.id, &draft).unwrap();
        assert_eq!(updated.weight_kg, 72.5);
    }

    #[test]
    fn update_reconciles_caregiver_collection() {
        let mut conn = open_memory_database().unwrap();
        let mut draft = patient_draft("Jane", "Doe", "jane@x.com");
        draft.caregivers = Some(vec![
            caregiver_draft("Sarah", "sarah@x.com"),
            caregiver_draft("Tom", "tom@x.com"),
        ]);
        let patient = create_patient(&mut conn, &draft).unwrap();
        let kept = patient
            .caregivers
            .iter()
            .find(|c| c.first_name == "Sarah")
            .unwrap()
            .clone();
        let dropped = patient
            .caregivers
            .iter()
            .find(|c| c.first_name == "Tom")
            .unwrap()
            .clone();

        // Keep Sarah with changed fields, omit Tom, add a new caregiver.
        let mut update = patient_draft("Jane", "Doe", "jane@x.com");
        let mut kept_entry = caregiver_draft("Sarah", "sarah@new.com");
        kept_entry.id = Some(kept.id);
        update.caregivers = Some(vec![kept_entry, caregiver_draft("Nina", "nina@x.com")]);

        let updated = update_patient(&mut conn, &patient.id, &update).unwrap();

        assert_eq!(updated.caregivers.len(), 2);
        let sarah = updated.caregivers.iter().find(|c| c.id == kept.id).unwrap();
        assert_eq!(sarah.email, "sarah@new.com");
        let nina = updated
            .caregivers
            .iter()
            .find(|c| c.first_name == "Nina")
            .unwrap();
        assert_ne!(nina.id, dropped.id);

        // The omitted caregiver was destroyed, not merely unlinked
        assert!(crate::db::repository::caregiver::find_caregiver(&conn, &dropped.id)
            .unwrap()
            .is_none());
    }

    #[test]
    fn update_with_identical_caregiver_list_is_idempotent() {
        let mut conn = open_memory_database().unwrap();
        let mut draft = patient_draft("Jane", "Doe", "jane@x.com");
        draft.caregivers = Some(vec![caregiver_draft("Sarah", "sarah@x.com")]);
        let patient = create_patient(&mut conn, &draft).unwrap();
        let existing = patient.caregivers[0].clone();

        let mut same = patient_draft("Jane", "Doe", "jane@x.com");
        same.caregivers = Some(vec![CaregiverDraft {
            id: Some(existing.id),
            first_name: existing.first_name.clone(),
            last_name: existing.last_name.clone(),
            email: existing.email.clone(),
            phone_number: existing.phone_number.clone(),
            relationship_to_patient: existing.relationship_to_patient.clone(),
        }]);

        let updated = update_patient(&mut conn, &patient.id, &same).unwrap();
        assert_eq!(updated.caregivers.len(), 1);
        assert_eq!(updated.caregivers[0].id, existing.id);
    }

    #[test]
    fn update_without_caregiver_list_leaves_collection_untouched() {
        let mut conn = open_memory_database().unwrap();
        let mut draft = patient_draft("Jane", "Doe", "jane@x.com");
        draft.caregivers = Some(vec![caregiver_draft("Sarah", "sarah@x.com")]);
        let patient = create_patient(&mut conn, &draft).unwrap();

        let mut update = patient_draft("Jane", "Doe", "jane@x.com");
        update.weight_kg = 70.0;
        update.caregivers = None;
        update_patient(&mut conn, &patient.id, &update).unwrap();

        let reloaded = get_patient(&conn, &patient.id).unwrap().unwrap();
        assert_eq!(reloaded.caregivers.len(), 1);
        assert_eq!(reloaded.caregivers[0].id, patient.caregivers[0].id);
    }

    #[test]
    fn update_with_unknown_caregiver_id_fails_and_persists_nothing() {
        let mut conn = open_memory_database().unwrap();
        let mut draft = patient_draft("Jane", "Doe", "jane@x.com");
        draft.caregivers = Some(vec![caregiver_draft("Sarah", "sarah@x.com")]);
        let patient = create_patient(&mut conn, &draft).unwrap();

        // A new caregiver followed by an entry whose id the patient does not own:
        // the failure must roll back the already-inserted new caregiver too.
        let stranger = Uuid::new_v4();
        let mut unknown_entry = caregiver_draft("Lea", "lea@x.com");
        unknown_entry.id = Some(stranger);
        let mut update = patient_draft("Jane", "Doe", "jane@x.com");
        update.weight_kg = 99.0;
        update.caregivers = Some(vec![caregiver_draft("Nina", "nina@x.com"), unknown_entry]);

        let err = update_patient(&mut conn, &patient.id, &update).unwrap_err();
        assert!(matches!(err, ServiceError::CaregiverNotFound(missing) if missing == stranger));

        let reloaded = get_patient(&conn, &patient.id).unwrap().unwrap();
        assert_eq!(reloaded.weight_kg, 65.0);
        assert_eq!(reloaded.caregivers.len(), 1);
        assert_eq!(reloaded.caregivers[0].first_name, "Sarah");
    }

    #[test]
    fn update_rejects_caregiver_duplicate_within_patient() {
        let mut conn = open_memory_database().unwrap();
        let mut draft = patient_draft("Jane", "Doe", "jane@x.com");
        draft.caregivers = Some(vec![
            caregiver_draft("Sarah", "sarah@x.com"),
            caregiver_draft("Tom", "tom@x.com"),
        ]);
        let patient = create_patient(&mut conn, &draft).unwrap();
        let tom = patient
            .caregivers
            .iter()
            .find(|c| c.first_name == "Tom")
            .unwrap();

        // Rewriting Tom's fields to Sarah's exact tuple collides with Sarah
        let mut collision = caregiver_draft("Sarah", "sarah@x.com");
        collision.id = Some(tom.id);
        let sarah = patient
            .caregivers
            .iter()
            .find(|c| c.first_name == "Sarah")
            .unwrap();
        let sarah_entry = CaregiverDraft {
            id: Some(sarah.id),
            first_name: sarah.first_name.clone(),
            last_name: sarah.last_name.clone(),
            email: sarah.email.clone(),
            phone_number: sarah.phone_number.clone(),
            relationship_to_patient: sarah.relationship_to_patient.clone(),
        };
        let mut update = patient_draft("Jane", "Doe", "jane@x.com");
        update.caregivers = Some(vec![sarah_entry, collision]);

        let err = update_patient(&mut conn, &patient.id, &update).unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateCaregiver));

        // Whole update rolled back; Tom is unchanged
        let reloaded = get_patient(&conn, &patient.id).unwrap().unwrap();
        let tom_after = reloaded.caregivers.iter().find(|c| c.id == tom.id).unwrap();
        assert_eq!(tom_after.email, "tom@x.com");
    }

    #[test]
    fn add_caregiver_then_identical_tuple_is_rejected() {
        let mut conn = open_memory_database().unwrap();
        let patient = create_patient(&mut conn, &patient_draft("Jane", "Doe", "jane@x.com"))
            .unwrap();

        let added = add_caregiver(
            &mut conn,
            &patient.id,
            &caregiver_draft("Sarah", "sarah@x.com"),
        )
        .unwrap();
        assert_eq!(added.patient_id, patient.id);

        let err = add_caregiver(
            &mut conn,
            &patient.id,
            &caregiver_draft("Sarah", "sarah@x.com"),
        )
        .unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateCaregiver));

        // A single differing field is acceptable
        let mut aunt = caregiver_draft("Sarah", "sarah@x.com");
        aunt.relationship_to_patient = "Aunt".into();
        assert!(add_caregiver(&mut conn, &patient.id, &aunt).is_ok());
    }

    #[test]
    fn add_caregiver_to_missing_patient_is_not_found() {
        let mut conn = open_memory_database().unwrap();
        let id = Uuid::new_v4();
        let err = add_caregiver(&mut conn, &id, &caregiver_draft("Sarah", "sarah@x.com"))
            .unwrap_err();
        assert!(matches!(err, ServiceError::PatientNotFound(missing) if missing == id));
    }

    #[test]
    fn delete_caregiver_requires_matching_owner() {
        let mut conn = open_memory_database().unwrap();
        let p1 = create_patient(&mut conn, &patient_draft("Jane", "Doe", "jane@x.com")).unwrap();
        let mut other = patient_draft("Bob", "Smith", "bob@x.com");
        other.date_of_birth = NaiveDate::from_ymd_opt(1985, 3, 3).unwrap();
        let p2 = create_patient(&mut conn, &other).unwrap();
        let caregiver = add_caregiver(
            &mut conn,
            &p2.id,
            &caregiver_draft("Sarah", "sarah@x.com"),
        )
        .unwrap();

        // Addressed through the wrong patient: rejected, caregiver intact
        let err = delete_caregiver(&mut conn, &p1.id, &caregiver.id).unwrap_err();
        assert!(matches!(err, ServiceError::OwnershipViolation { .. }));
        assert!(crate::db::repository::caregiver::find_caregiver(&conn, &caregiver.id)
            .unwrap()
            .is_some());

        // Addressed through the owner: deleted
        delete_caregiver(&mut conn, &p2.id, &caregiver.id).unwrap();
        assert!(crate::db::repository::caregiver::find_caregiver(&conn, &caregiver.id)
            .unwrap()
            .is_none());
    }

    #[test]
    fn delete_missing_caregiver_is_not_found() {
        let mut conn = open_memory_database().unwrap();
        let patient = create_patient(&mut conn, &patient_draft("Jane", "Doe", "jane@x.com"))
            .unwrap();
        let id = Uuid::new_v4();
        let err = delete_caregiver(&mut conn, &patient.id, &id).unwrap_err();
        assert!(matches!(err, ServiceError::CaregiverNotFound(missing) if missing == id));
    }

    #[test]
    fn delete_patient_cascades_to_address_and_caregivers() {
        let mut conn = open_memory_database().unwrap();
        let mut draft = patient_draft("Jane", "Doe", "jane@x.com");
        draft.caregivers = Some(vec![
            caregiver_draft("Sarah", "sarah@x.com"),
            caregiver_draft("Tom", "tom@x.com"),
        ]);
        let patient = create_patient(&mut conn, &draft).unwrap();

        delete_patient(&mut conn, &patient.id).unwrap();

        assert!(get_patient(&conn, &patient.id).unwrap().is_none());
        assert!(
            crate::db::repository::address::find_by_patient(&conn, &patient.id)
                .unwrap()
                .is_none()
        );
        for caregiver in &patient.caregivers {
            assert!(
                crate::db::repository::caregiver::find_caregiver(&conn, &caregiver.id)
                    .unwrap()
                    .is_none()
            );
        }
    }

    #[test]
    fn delete_missing_patient_is_not_found() {
        let mut conn = open_memory_database().unwrap();
        let id = Uuid::new_v4();
        let err = delete_patient(&mut conn, &id).unwrap_err();
        assert!(matches!(err, ServiceError::PatientNotFound(missing) if missing == id));
    }
}
