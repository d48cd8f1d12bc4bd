//! Patient profiles.
//!
//! A patient profile is an optional 1:1 extension of a user account. Deleting
//! the owning user deletes the profile; deleting the profile cascades into the
//! patient's appointments (schema policy, see `db`).

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use utoipa::ToSchema;

use crate::error::{ApiError, ApiResult};

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Patient {
    pub id: i64,
    pub user_id: i64,
    pub age: i64,
    pub gender: String,
    pub phone: String,
    pub address: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NewPatient {
    pub user_id: i64,
    #[serde(default)]
    pub age: i64,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdatePatient {
    pub age: Option<i64>,
    pub gender: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Data operations over patient profiles.
#[derive(Clone)]
pub struct PatientService {
    pool: SqlitePool,
}

impl PatientService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates a patient profile for an existing user.
    ///
    /// # Errors
    ///
    /// `NotFound` when the user does not exist; `Conflict` when the user
    /// already has a patient profile.
    pub async fn create(&self, new: NewPatient) -> ApiResult<Patient> {
        if new.age < 0 {
            return Err(ApiError::Validation("age cannot be negative".into()));
        }

        let user_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)")
                .bind(new.user_id)
                .fetch_one(&self.pool)
                .await?;
        if !user_exists {
            return Err(ApiError::NotFound(format!("user {} not found", new.user_id)));
        }

        sqlx::query(
            "INSERT INTO patients (user_id, age, gender, phone, address) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(new.user_id)
        .bind(new.age)
        .bind(&new.gender)
        .bind(&new.phone)
        .bind(&new.address)
        .execute(&self.pool)
        .await
        .map_err(|e| ApiError::conflict_on_unique(e, "user already has a patient profile"))?;

        self.find_by_user(new.user_id)
            .await?
            .ok_or_else(|| ApiError::Internal("patient row missing after insert".into()))
    }

    pub async fn list(&self) -> ApiResult<Vec<Patient>> {
        let patients = sqlx::query_as::<_, Patient>("SELECT * FROM patients ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(patients)
    }

    pub async fn get(&self, id: i64) -> ApiResult<Patient> {
        sqlx::query_as::<_, Patient>("SELECT * FROM patients WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("patient {id} not found")))
    }

    pub async fn find_by_user(&self, user_id: i64) -> ApiResult<Option<Patient>> {
        let patient = sqlx::query_as::<_, Patient>("SELECT * FROM patients WHERE user_id = ?1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(patient)
    }

    pub async fn update(&self, id: i64, update: UpdatePatient) -> ApiResult<Patient> {
        let current = self.get(id).await?;

        let age = update.age.unwrap_or(current.age);
        if age < 0 {
            return Err(ApiError::Validation("age cannot be negative".into()));
        }

        sqlx::query(
            "UPDATE patients SET age = ?1, gender = ?2, phone = ?3, address = ?4 WHERE id = ?5",
        )
        .bind(age)
        .bind(update.gender.unwrap_or(current.gender))
        .bind(update.phone.unwrap_or(current.phone))
        .bind(update.address.unwrap_or(current.address))
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.get(id).await
    }

    pub async fn delete(&self, id: i64) -> ApiResult<()> {
        let result = sqlx::query("DELETE FROM patients WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound(format!("patient {id} not found")));
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) async fn seed_user(pool: &SqlitePool, username: &str) -> i64 {
    sqlx::query("INSERT INTO users (username, password_hash) VALUES (?1, 'x')")
        .bind(username)
        .execute(pool)
        .await
        .expect("user inserts")
        .last_insert_rowid()
}
