use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::Address;

pub fn insert_address(conn: &Connection, address: &Address) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO addresses (id, mailing_address, zipcode, county, state, country, patient_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            address.id.to_string(),
            address.mailing_address,
            address.zipcode,
            address.county,
            address.state,
            address.country,
            address.patient_id.to_string(),
        ],
    )?;
    Ok(())
}

pub fn update_address(conn: &Connection, address: &Address) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE addresses SET mailing_address = ?2, zipcode = ?3, county = ?4, state = ?5,
         country = ?6
         WHERE id = ?1",
        params![
            address.id.to_string(),
            address.mailing_address,
            address.zipcode,
            address.county,
            address.state,
            address.country,
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Address".into(),
            id: address.id.to_string(),
        });
    }
    Ok(())
}

pub fn find_by_patient(conn: &Connection, patient_id: &Uuid) -> Result<Option<Address>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, mailing_address, zipcode, county, state, country, patient_id
             FROM addresses WHERE patient_id = ?1",
            params![patient_id.to_string()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                ))
            },
        )
        .optional()?;

    let Some((id, mailing_address, zipcode, county, state, country, patient_id)) = row else {
        return Ok(None);
    };

    Ok(Some(Address {
        id: Uuid::parse_str(&id).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        mailing_address,
        zipcode,
        county,
        state,
        country,
        patient_id: Uuid::parse_str(&patient_id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
    }))
}
