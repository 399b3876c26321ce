use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::Patient;

use super::{address, caregiver};

pub fn insert_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO patients (id, first_name, last_name, email, phone_number, height_cm,
         weight_kg, date_of_birth, ethnicity, type_of_diabetes, date_of_diagnosis,
         biological_sex, notes, assigned_physician)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            patient.id.to_string(),
            patient.first_name,
            patient.last_name,
            patient.email,
            patient.phone_number,
            patient.height_cm,
            patient.weight_kg,
            patient.date_of_birth.to_string(),
            patient.ethnicity,
            patient.type_of_diabetes,
            patient.date_of_diagnosis.to_string(),
            patient.biological_sex,
            patient.notes,
            patient.assigned_physician,
        ],
    )?;
    replace_medical_history(conn, &patient.id, &patient.medical_history)?;
    Ok(())
}

pub fn update_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE patients SET first_name = ?2, last_name = ?3, email = ?4, phone_number = ?5,
         height_cm = ?6, weight_kg = ?7, date_of_birth = ?8, ethnicity = ?9,
         type_of_diabetes = ?10, date_of_diagnosis = ?11, biological_sex = ?12, notes = ?13,
         assigned_physician = ?14
         WHERE id = ?1",
        params![
            patient.id.to_string(),
            patient.first_name,
            patient.last_name,
            patient.email,
            patient.phone_number,
            patient.height_cm,
            patient.weight_kg,
            patient.date_of_birth.to_string(),
            patient.ethnicity,
            patient.type_of_diabetes,
            patient.date_of_diagnosis.to_string(),
            patient.biological_sex,
            patient.notes,
            patient.assigned_physician,
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Patient".into(),
            id: patient.id.to_string(),
        });
    }
    replace_medical_history(conn, &patient.id, &patient.medical_history)?;
    Ok(())
}

fn replace_medical_history(
    conn: &Connection,
    patient_id: &Uuid,
    history: &[String],
) -> Result<(), DatabaseError> {
    conn.execute(
        "DELETE FROM patient_medical_history WHERE patient_id = ?1",
        params![patient_id.to_string()],
    )?;
    let mut stmt = conn.prepare(
        "INSERT INTO patient_medical_history (patient_id, condition_name) VALUES (?1, ?2)",
    )?;
    for condition in history {
        stmt.execute(params![patient_id.to_string(), condition])?;
    }
    Ok(())
}

/// Load the full aggregate: patient row + medical history + address + caregivers.
pub fn find_patient(conn: &Connection, id: &Uuid) -> Result<Option<Patient>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, first_name, last_name, email, phone_number, height_cm, weight_kg,
             date_of_birth, ethnicity, type_of_diabetes, date_of_diagnosis, biological_sex,
             notes, assigned_physician
             FROM patients WHERE id = ?1",
            params![id.to_string()],
            patient_row_from_rusqlite,
        )
        .optional()?;

    match row {
        Some(row) => Ok(Some(hydrate(conn, row)?)),
        None => Ok(None),
    }
}

pub fn exists_by_id(conn: &Connection, id: &Uuid) -> Result<bool, DatabaseError> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM patients WHERE id = ?1)",
        params![id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// Duplicate predicate backing the patient identity rule: exact match on
/// (first name, last name, date of birth), optionally excluding one id for
/// update-in-place checks.
pub fn exists_duplicate(
    conn: &Connection,
    first_name: &str,
    last_name: &str,
    date_of_birth: NaiveDate,
    exclude_id: Option<&Uuid>,
) -> Result<bool, DatabaseError> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM patients
         WHERE first_name = ?1 AND last_name = ?2 AND date_of_birth = ?3
           AND (?4 IS NULL OR id != ?4))",
        params![
            first_name,
            last_name,
            date_of_birth.to_string(),
            exclude_id.map(|id| id.to_string()),
        ],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// Case-insensitive substring search over name and email; phone is matched
/// as a raw substring.
pub fn search_by_term(conn: &Connection, term: &str) -> Result<Vec<Patient>, DatabaseError> {
    let pattern = format!("%{term}%");
    let mut stmt = conn.prepare(
        "SELECT id, first_name, last_name, email, phone_number, height_cm, weight_kg,
         date_of_birth, ethnicity, type_of_diabetes, date_of_diagnosis, biological_sex,
         notes, assigned_physician
         FROM patients
         WHERE LOWER(first_name) LIKE LOWER(?1) OR LOWER(last_name) LIKE LOWER(?1)
            OR LOWER(email) LIKE LOWER(?1) OR phone_number LIKE ?1",
    )?;

    let rows = stmt.query_map(params![pattern], |row| Ok(patient_row_from_rusqlite(row)))?;

    let mut patients = Vec::new();
    for row in rows {
        patients.push(hydrate(conn, row??)?);
    }
    Ok(patients)
}

pub fn delete_patient(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let deleted = conn.execute("DELETE FROM patients WHERE id = ?1", params![id.to_string()])?;
    if deleted == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Patient".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

// Internal row type for Patient mapping
struct PatientRow {
    id: String,
    first_name: String,
    last_name: String,
    email: String,
    phone_number: String,
    height_cm: f64,
    weight_kg: f64,
    date_of_birth: String,
    ethnicity: String,
    type_of_diabetes: String,
    date_of_diagnosis: String,
    biological_sex: String,
    notes: Option<String>,
    assigned_physician: String,
}

fn patient_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<PatientRow, rusqlite::Error> {
    Ok(PatientRow {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        phone_number: row.get(4)?,
        height_cm: row.get(5)?,
        weight_kg: row.get(6)?,
        date_of_birth: row.get(7)?,
        ethnicity: row.get(8)?,
        type_of_diabetes: row.get(9)?,
        date_of_diagnosis: row.get(10)?,
        biological_sex: row.get(11)?,
        notes: row.get(12)?,
        assigned_physician: row.get(13)?,
    })
}

fn hydrate(conn: &Connection, row: PatientRow) -> Result<Patient, DatabaseError> {
    let id = Uuid::parse_str(&row.id)
        .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?;

    let mut stmt = conn.prepare(
        "SELECT condition_name FROM patient_medical_history WHERE patient_id = ?1",
    )?;
    let medical_history = stmt
        .query_map(params![row.id], |r| r.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    let address = address::find_by_patient(conn, &id)?.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "Address".into(),
        id: row.id.clone(),
    })?;
    let caregivers = caregiver::list_for_patient(conn, &id)?;

    Ok(Patient {
        id,
        first_name: row.first_name,
        last_name: row.last_name,
        email: row.email,
        phone_number: row.phone_number,
        height_cm: row.height_cm,
        weight_kg: row.weight_kg,
        date_of_birth: parse_date(&row.date_of_birth)?,
        ethnicity: row.ethnicity,
        type_of_diabetes: row.type_of_diabetes,
        date_of_diagnosis: parse_date(&row.date_of_diagnosis)?,
        biological_sex: row.biological_sex,
        notes: row.notes,
        assigned_physician: row.assigned_physician,
        medical_history,
        address,
        caregivers,
    })
}

fn parse_date(value: &str) -> Result<NaiveDate, DatabaseError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
}
