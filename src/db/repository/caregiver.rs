use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::Caregiver;

pub fn insert_caregiver(conn: &Connection, caregiver: &Caregiver) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO caregivers (id, first_name, last_name, email, phone_number,
         relationship_to_patient, patient_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            caregiver.id.to_string(),
            caregiver.first_name,
            caregiver.last_name,
            caregiver.email,
            caregiver.phone_number,
            caregiver.relationship_to_patient,
            caregiver.patient_id.to_string(),
        ],
    )?;
    Ok(())
}

/// Overwrites scalar fields in place; id and patient back-reference are untouched.
pub fn update_caregiver(conn: &Connection, caregiver: &Caregiver) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE caregivers SET first_name = ?2, last_name = ?3, email = ?4, phone_number = ?5,
         relationship_to_patient = ?6
         WHERE id = ?1",
        params![
            caregiver.id.to_string(),
            caregiver.first_name,
            caregiver.last_name,
            caregiver.email,
            caregiver.phone_number,
            caregiver.relationship_to_patient,
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Caregiver".into(),
            id: caregiver.id.to_string(),
        });
    }
    Ok(())
}

pub fn find_caregiver(conn: &Connection, id: &Uuid) -> Result<Option<Caregiver>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, first_name, last_name, email, phone_number, relationship_to_patient,
             patient_id
             FROM caregivers WHERE id = ?1",
            params![id.to_string()],
            caregiver_row,
        )
        .optional()?;

    row.map(caregiver_from_row).transpose()
}

pub fn list_for_patient(conn: &Connection, patient_id: &Uuid) -> Result<Vec<Caregiver>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, first_name, last_name, email, phone_number, relationship_to_patient,
         patient_id
         FROM caregivers WHERE patient_id = ?1",
    )?;

    let rows = stmt.query_map(params![patient_id.to_string()], caregiver_row)?;

    let mut caregivers = Vec::new();
    for row in rows {
        caregivers.push(caregiver_from_row(row?)?);
    }
    Ok(caregivers)
}

/// Duplicate predicate scoped to one patient: exact match on the full
/// (first name, last name, email, phone, relationship) tuple, optionally
/// excluding one caregiver id.
#[allow(clippy::too_many_arguments)]
pub fn exists_duplicate(
    conn: &Connection,
    patient_id: &Uuid,
    first_name: &str,
    last_name: &str,
    email: &str,
    phone_number: &str,
    relationship_to_patient: &str,
    exclude_id: Option<&Uuid>,
) -> Result<bool, DatabaseError> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM caregivers
         WHERE patient_id = ?1 AND first_name = ?2 AND last_name = ?3 AND email = ?4
           AND phone_number = ?5 AND relationship_to_patient = ?6
           AND (?7 IS NULL OR id != ?7))",
        params![
            patient_id.to_string(),
            first_name,
            last_name,
            email,
            phone_number,
            relationship_to_patient,
            exclude_id.map(|id| id.to_string()),
        ],
        |row| row.get(0),
    )?;
    Ok(exists)
}

pub fn delete_caregiver(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM caregivers WHERE id = ?1",
        params![id.to_string()],
    )?;
    if deleted == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Caregiver".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

// Internal row type for Caregiver mapping
struct CaregiverRow {
    id: String,
    first_name: String,
    last_name: String,
    email: String,
    phone_number: String,
    relationship_to_patient: String,
    patient_id: String,
}

fn caregiver_row(row: &rusqlite::Row<'_>) -> Result<CaregiverRow, rusqlite::Error> {
    Ok(CaregiverRow {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        phone_number: row.get(4)?,
        relationship_to_patient: row.get(5)?,
        patient_id: row.get(6)?,
    })
}

fn caregiver_from_row(row: CaregiverRow) -> Result<Caregiver, DatabaseError> {
    Ok(Caregiver {
        id: Uuid::parse_str(&row.id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        first_name: row.first_name,
        last_name: row.last_name,
        email: row.email,
        phone_number: row.phone_number,
        relationship_to_patient: row.relationship_to_patient,
        patient_id: Uuid::parse_str(&row.patient_id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
    })
}
