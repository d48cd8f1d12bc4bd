//! Doctor profiles and public doctor discovery.
//!
//! A doctor profile is the second optional 1:1 extension of a user account,
//! optionally linked to a specialist. Discovery (`list_detailed`) is the one
//! read that joins in the owning user and the specialty record, because the
//! public listing embeds both.

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::SqlitePool;
use utoipa::ToSchema;

use crate::error::{ApiError, ApiResult};
use crate::repositories::accounts::User;
use crate::repositories::specialists::Specialist;
use crate::validation::double_option;

#[derive(Clone, Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct Doctor {
    pub id: i64,
    pub user_id: i64,
    pub specialty_id: Option<i64>,
    pub bio: String,
    pub is_available: bool,
    #[schema(value_type = Vec<String>)]
    pub available_times: Json<Vec<String>>,
}

/// Doctor as exposed by the discovery endpoints: owning user (without
/// credentials) and specialty embedded.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct DoctorDetail {
    pub id: i64,
    pub user: User,
    pub specialty: Option<Specialist>,
    pub bio: String,
    pub is_available: bool,
    #[schema(value_type = Vec<String>)]
    pub available_times: Json<Vec<String>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NewDoctor {
    pub user_id: i64,
    pub specialty_id: Option<i64>,
    #[serde(default)]
    pub bio: String,
    #[serde(default = "default_available")]
    pub is_available: bool,
    #[serde(default)]
    pub available_times: Vec<String>,
}

fn default_available() -> bool {
    true
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateDoctor {
    /// Absent = keep; `null` = clear the specialty.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i64>)]
    pub specialty_id: Option<Option<i64>>,
    pub bio: Option<String>,
    pub is_available: Option<bool>,
    pub available_times: Option<Vec<String>>,
}

#[derive(sqlx::FromRow)]
struct DoctorJoinRow {
    id: i64,
    bio: String,
    is_available: bool,
    available_times: Json<Vec<String>>,
    user_id: i64,
    username: String,
    email: String,
    first_name: String,
    last_name: String,
    is_staff: bool,
    specialty_id: Option<i64>,
    specialty_name: Option<String>,
    specialty_description: Option<String>,
}

impl From<DoctorJoinRow> for DoctorDetail {
    fn from(row: DoctorJoinRow) -> Self {
        let specialty = match (row.specialty_id, row.specialty_name) {
            (Some(id), Some(name)) => Some(Specialist {
                id,
                name,
                description: row.specialty_description.unwrap_or_default(),
            }),
            _ => None,
        };

        DoctorDetail {
            id: row.id,
            user: User {
                id: row.user_id,
                username: row.username,
                email: row.email,
                first_name: row.first_name,
                last_name: row.last_name,
                is_staff: row.is_staff,
            },
            specialty,
            bio: row.bio,
            is_available: row.is_available,
            available_times: row.available_times,
        }
    }
}

const DETAIL_QUERY: &str = "SELECT d.id, d.bio, d.is_available, d.available_times, \
        u.id AS user_id, u.username, u.email, u.first_name, u.last_name, u.is_staff, \
        s.id AS specialty_id, s.name AS specialty_name, s.description AS specialty_description \
     FROM doctors d \
     JOIN users u ON u.id = d.user_id \
     LEFT JOIN specialists s ON s.id = d.specialty_id";

/// Data operations over doctor profiles.
#[derive(Clone)]
pub struct DoctorService {
    pool: SqlitePool,
}

impl DoctorService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates a doctor profile for an existing user.
    ///
    /// # Errors
    ///
    /// `NotFound` when the user or the referenced specialist does not exist;
    /// `Conflict` when the user already has a doctor profile.
    pub async fn create(&self, new: NewDoctor) -> ApiResult<Doctor> {
        let user_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)")
                .bind(new.user_id)
                .fetch_one(&self.pool)
                .await?;
        if !user_exists {
            return Err(ApiError::NotFound(format!("user {} not found", new.user_id)));
        }

        if let Some(specialty_id) = new.specialty_id {
            self.ensure_specialist(specialty_id).await?;
        }

        sqlx::query(
            "INSERT INTO doctors (user_id, specialty_id, bio, is_available, available_times) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(new.user_id)
        .bind(new.specialty_id)
        .bind(&new.bio)
        .bind(new.is_available)
        .bind(Json(new.available_times))
        .execute(&self.pool)
        .await
        .map_err(|e| ApiError::conflict_on_unique(e, "user already has a doctor profile"))?;

        self.find_by_user(new.user_id)
            .await?
            .ok_or_else(|| ApiError::Internal("doctor row missing after insert".into()))
    }

    /// Public doctor discovery, optionally filtered by specialty name
    /// (case-insensitive exact match). An absent or empty filter returns the
    /// full list.
    pub async fn list_detailed(&self, specialty: Option<&str>) -> ApiResult<Vec<DoctorDetail>> {
        let rows = match specialty.map(str::trim).filter(|s| !s.is_empty()) {
            Some(name) => {
                let filtered = format!("{DETAIL_QUERY} WHERE lower(s.name) = lower(?1) ORDER BY d.id");
                sqlx::query_as::<_, DoctorJoinRow>(&filtered)
                    .bind(name)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let all = format!("{DETAIL_QUERY} ORDER BY d.id");
                sqlx::query_as::<_, DoctorJoinRow>(&all)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(rows.into_iter().map(DoctorDetail::from).collect())
    }

    pub async fn get_detailed(&self, id: i64) -> ApiResult<DoctorDetail> {
        let query = format!("{DETAIL_QUERY} WHERE d.id = ?1");
        sqlx::query_as::<_, DoctorJoinRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(DoctorDetail::from)
            .ok_or_else(|| ApiError::NotFound(format!("doctor {id} not found")))
    }

    pub async fn get(&self, id: i64) -> ApiResult<Doctor> {
        sqlx::query_as::<_, Doctor>("SELECT * FROM doctors WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("doctor {id} not found")))
    }

    pub async fn find_by_user(&self, user_id: i64) -> ApiResult<Option<Doctor>> {
        let doctor = sqlx::query_as::<_, Doctor>("SELECT * FROM doctors WHERE user_id = ?1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(doctor)
    }

    pub async fn update(&self, id: i64, update: UpdateDoctor) -> ApiResult<Doctor> {
        let current = self.get(id).await?;

        let specialty_id = match update.specialty_id {
            Some(Some(specialty_id)) => {
                self.ensure_specialist(specialty_id).await?;
                Some(specialty_id)
            }
            Some(None) => None,
            None => current.specialty_id,
        };

        let available_times = update
            .available_times
            .map(Json)
            .unwrap_or(current.available_times);

        sqlx::query(
            "UPDATE doctors SET specialty_id = ?1, bio = ?2, is_available = ?3, \
             available_times = ?4 WHERE id = ?5",
        )
        .bind(specialty_id)
        .bind(update.bio.unwrap_or(current.bio))
        .bind(update.is_available.unwrap_or(current.is_available))
        .bind(available_times)
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.get(id).await
    }

    /// Deletes a doctor. The doctor's appointments (and their payments) are
    /// deleted by the schema's cascade policy.
    pub async fn delete(&self, id: i64) -> ApiResult<()> {
        let result = sqlx::query("DELETE FROM doctors WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound(format!("doctor {id} not found")));
        }
        Ok(())
    }

    async fn ensure_specialist(&self, specialty_id: i64) -> ApiResult<()> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM specialists WHERE id = ?1)")
                .bind(specialty_id)
                .fetch_one(&self.pool)
                .await?;
        if !exists {
            return Err(ApiError::NotFound(format!(
                "specialist {specialty_id} not found"
            )));
        }
        Ok(())
    }
}
