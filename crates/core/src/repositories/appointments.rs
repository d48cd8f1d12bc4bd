//! Appointment ledger.
//!
//! Booking always resolves the patient server-side from the authenticated
//! identity; the patient field is never caller input. "My appointments" joins
//! through the caller's patient profile and degrades to an empty list when
//! there is none.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use utoipa::ToSchema;

use crate::error::{ApiError, ApiResult};
use crate::repositories::patients::PatientService;

pub const STATUS_PENDING: &str = "pending";

#[derive(Clone, Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct Appointment {
    pub id: i64,
    pub patient_id: Option<i64>,
    pub doctor_id: i64,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub status: String,
    pub notes: Option<String>,
}

/// Booking payload. The patient is taken from the caller's identity, so it
/// does not appear here.
#[derive(Debug, Deserialize, ToSchema)]
pub struct BookAppointment {
    pub doctor_id: i64,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateAppointment {
    pub doctor_id: Option<i64>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub status: Option<String>,
    pub notes: Option<String>,
}

/// Data operations over the appointment ledger.
#[derive(Clone)]
pub struct AppointmentService {
    pool: SqlitePool,
}

impl AppointmentService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Books an appointment for the identity behind `user_id`.
    ///
    /// # Errors
    ///
    /// `Permission` when the user has no patient profile (and nothing is
    /// persisted); `NotFound` when the target doctor does not exist.
    pub async fn book_for_user(&self, user_id: i64, new: BookAppointment) -> ApiResult<Appointment> {
        let patient = PatientService::new(self.pool.clone())
            .find_by_user(user_id)
            .await?
            .ok_or_else(|| {
                ApiError::Permission(
                    "you must have a patient profile to book an appointment".into(),
                )
            })?;

        self.ensure_doctor(new.doctor_id).await?;

        let id = sqlx::query(
            "INSERT INTO appointments (patient_id, doctor_id, date, time, status, notes) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(patient.id)
        .bind(new.doctor_id)
        .bind(new.date)
        .bind(new.time)
        .bind(STATUS_PENDING)
        .bind(&new.notes)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        self.get(id).await
    }

    /// The caller's own appointments, date-descending. A missing patient
    /// profile yields an empty list, never an error.
    pub async fn list_for_user(&self, user_id: i64) -> ApiResult<Vec<Appointment>> {
        let patient = match PatientService::new(self.pool.clone())
            .find_by_user(user_id)
            .await?
        {
            Some(patient) => patient,
            None => return Ok(Vec::new()),
        };

        let appointments = sqlx::query_as::<_, Appointment>(
            "SELECT * FROM appointments WHERE patient_id = ?1 ORDER BY date DESC, time DESC",
        )
        .bind(patient.id)
        .fetch_all(&self.pool)
        .await?;
        Ok(appointments)
    }

    pub async fn list(&self) -> ApiResult<Vec<Appointment>> {
        let appointments =
            sqlx::query_as::<_, Appointment>("SELECT * FROM appointments ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
        Ok(appointments)
    }

    pub async fn get(&self, id: i64) -> ApiResult<Appointment> {
        sqlx::query_as::<_, Appointment>("SELECT * FROM appointments WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("appointment {id} not found")))
    }

    pub async fn update(&self, id: i64, update: UpdateAppointment) -> ApiResult<Appointment> {
        let current = self.get(id).await?;

        let doctor_id = update.doctor_id.unwrap_or(current.doctor_id);
        if doctor_id != current.doctor_id {
            self.ensure_doctor(doctor_id).await?;
        }

        sqlx::query(
            "UPDATE appointments SET doctor_id = ?1, date = ?2, time = ?3, status = ?4, \
             notes = ?5 WHERE id = ?6",
        )
        .bind(doctor_id)
        .bind(update.date.unwrap_or(current.date))
        .bind(update.time.unwrap_or(current.time))
        .bind(update.status.unwrap_or(current.status))
        .bind(update.notes.or(current.notes))
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.get(id).await
    }

    pub async fn delete(&self, id: i64) -> ApiResult<()> {
        let result = sqlx::query("DELETE FROM appointments WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound(format!("appointment {id} not found")));
        }
        Ok(())
    }

    async fn ensure_doctor(&self, doctor_id: i64) -> ApiResult<()> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM doctors WHERE id = ?1)")
            .bind(doctor_id)
            .fetch_one(&self.pool)
            .await?;
        if !exists {
            return Err(ApiError::NotFound(format!("doctor {doctor_id} not found")));
        }
        Ok(())
    }
}
