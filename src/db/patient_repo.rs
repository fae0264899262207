use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{decode_error, from_json_list, parse_id, parse_timestamp, to_json_list};
use crate::models::{DietType, Location, MealSelection, MealType, NewPatient, Patient};

#[derive(Clone)]
pub struct PatientRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct PatientRow {
    id: String,
    first_name: String,
    last_name: String,
    wing: String,
    room_number: String,
    diet_type: String,
    ada_friendly: bool,
    notes: String,
    discharged: bool,
    created_at: String,
    updated_at: String,
}

#[derive(sqlx::FromRow)]
struct MealRow {
    meal: String,
    items: String,
    juices: String,
    drinks: String,
    complete: bool,
}

impl PatientRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a patient with an empty, incomplete selection for every meal.
    pub async fn create(&self, patient: &NewPatient) -> Result<Patient, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO patients (id, first_name, last_name, wing, room_number, diet_type, ada_friendly, notes, discharged, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?)
            "#,
        )
        .bind(&id_str)
        .bind(&patient.first_name)
        .bind(&patient.last_name)
        .bind(&patient.location.wing)
        .bind(&patient.location.room_number)
        .bind(patient.diet_type.as_str())
        .bind(patient.ada_friendly)
        .bind(&patient.notes)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        for meal in MealType::ALL {
            sqlx::query("INSERT INTO patient_meals (patient_id, meal) VALUES (?, ?)")
                .bind(&id_str)
                .bind(meal.as_str())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        self.get_by_id(id).await?.ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Patient>, sqlx::Error> {
        let row: Option<PatientRow> = sqlx::query_as("SELECT * FROM patients WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => self.hydrate_patient(row).await.map(Some),
            None => Ok(None),
        }
    }

    /// Patients currently admitted, ordered by wing then room.
    pub async fn list_active(&self) -> Result<Vec<Patient>, sqlx::Error> {
        let rows: Vec<PatientRow> = sqlx::query_as(
            "SELECT * FROM patients WHERE discharged = 0 ORDER BY wing COLLATE NOCASE, room_number COLLATE NOCASE",
        )
        .fetch_all(&self.pool)
        .await?;

        self.hydrate_all(rows).await
    }

    pub async fn list_all(&self) -> Result<Vec<Patient>, sqlx::Error> {
        let rows: Vec<PatientRow> = sqlx::query_as(
            "SELECT * FROM patients ORDER BY discharged, wing COLLATE NOCASE, room_number COLLATE NOCASE, last_name",
        )
        .fetch_all(&self.pool)
        .await?;

        self.hydrate_all(rows).await
    }

    /// The active patient occupying `location`, ignoring `exclude`.
    pub async fn find_active_in_room(
        &self,
        location: &Location,
        exclude: Option<Uuid>,
    ) -> Result<Option<Patient>, sqlx::Error> {
        let exclude = exclude.map(|id| id.to_string());

        let row: Option<PatientRow> = sqlx::query_as(
            r#"
            SELECT * FROM patients
            WHERE discharged = 0
              AND LOWER(wing) = LOWER(?)
              AND LOWER(room_number) = LOWER(?)
              AND (? IS NULL OR id != ?)
            LIMIT 1
            "#,
        )
        .bind(&location.wing)
        .bind(&location.room_number)
        .bind(&exclude)
        .bind(&exclude)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => self.hydrate_patient(row).await.map(Some),
            None => Ok(None),
        }
    }

    /// Overwrite the demographic fields; meal selections are untouched.
    pub async fn update(&self, id: Uuid, patient: &NewPatient) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE patients
            SET first_name = ?, last_name = ?, wing = ?, room_number = ?, diet_type = ?,
                ada_friendly = ?, notes = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&patient.first_name)
        .bind(&patient.last_name)
        .bind(&patient.location.wing)
        .bind(&patient.location.room_number)
        .bind(patient.diet_type.as_str())
        .bind(patient.ada_friendly)
        .bind(&patient.notes)
        .bind(Utc::now().to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn set_discharged(&self, id: Uuid, discharged: bool) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE patients SET discharged = ?, updated_at = ? WHERE id = ?")
                .bind(discharged)
                .bind(Utc::now().to_rfc3339())
                .bind(id.to_string())
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        // CASCADE removes meal selections and open orders
        let result = sqlx::query("DELETE FROM patients WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Replace the items, juices and drinks for one meal, keeping its
    /// completion flag.
    pub async fn set_meal_selection(
        &self,
        id: Uuid,
        meal: MealType,
        selection: &MealSelection,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE patient_meals SET items = ?, juices = ?, drinks = ? WHERE patient_id = ? AND meal = ?",
        )
        .bind(to_json_list(&selection.items))
        .bind(to_json_list(&selection.juices))
        .bind(to_json_list(&selection.drinks))
        .bind(id.to_string())
        .bind(meal.as_str())
        .execute(&self.pool)
        .await?;

        self.touch(id).await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn set_meal_complete(
        &self,
        id: Uuid,
        meal: MealType,
        complete: bool,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE patient_meals SET complete = ? WHERE patient_id = ? AND meal = ?")
                .bind(complete)
                .bind(id.to_string())
                .bind(meal.as_str())
                .execute(&self.pool)
                .await?;

        self.touch(id).await?;
        Ok(result.rows_affected() > 0)
    }

    /// Flip one meal's completion flag, returning the new value.
    pub async fn toggle_meal_complete(
        &self,
        id: Uuid,
        meal: MealType,
    ) -> Result<Option<bool>, sqlx::Error> {
        let complete: Option<bool> = sqlx::query_scalar(
            "UPDATE patient_meals SET complete = NOT complete WHERE patient_id = ? AND meal = ? RETURNING complete",
        )
        .bind(id.to_string())
        .bind(meal.as_str())
        .fetch_optional(&self.pool)
        .await?;

        self.touch(id).await?;
        Ok(complete)
    }

    /// Clear completion flags for every active patient. Returns rows changed.
    pub async fn reset_completion(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE patient_meals SET complete = 0
            WHERE complete = 1
              AND patient_id IN (SELECT id FROM patients WHERE discharged = 0)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn touch(&self, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE patients SET updated_at = ? WHERE id = ?")
            .bind(Utc::now().to_rfc3339())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn hydrate_all(&self, rows: Vec<PatientRow>) -> Result<Vec<Patient>, sqlx::Error> {
        let mut patients = Vec::with_capacity(rows.len());
        for row in rows {
            patients.push(self.hydrate_patient(row).await?);
        }
        Ok(patients)
    }

    async fn hydrate_patient(&self, row: PatientRow) -> Result<Patient, sqlx::Error> {
        let meals: Vec<MealRow> = sqlx::query_as(
            "SELECT meal, items, juices, drinks, complete FROM patient_meals WHERE patient_id = ?",
        )
        .bind(&row.id)
        .fetch_all(&self.pool)
        .await?;

        let diet_type: DietType = row.diet_type.parse().map_err(decode_error)?;

        let mut patient = Patient {
            id: parse_id(&row.id)?,
            first_name: row.first_name,
            last_name: row.last_name,
            location: Location::new(row.wing, row.room_number),
            diet_type,
            ada_friendly: row.ada_friendly,
            notes: row.notes,
            discharged: row.discharged,
            breakfast: MealSelection::default(),
            lunch: MealSelection::default(),
            dinner: MealSelection::default(),
            created_at: parse_timestamp(&row.created_at),
            updated_at: parse_timestamp(&row.updated_at),
        };

        for meal_row in meals {
            let meal: MealType = meal_row.meal.parse().map_err(decode_error)?;
            *patient.meal_mut(meal) = MealSelection {
                items: from_json_list(&meal_row.items),
                juices: from_json_list(&meal_row.juices),
                drinks: from_json_list(&meal_row.drinks),
                complete: meal_row.complete,
            };
        }

        Ok(patient)
    }
}
