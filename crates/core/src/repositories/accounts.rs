//! Account registration, credential verification, and role resolution.
//!
//! An account is a bare identity until a profile is attached. Registration
//! creates the user row and then exactly one of the two profile kinds; the
//! [`Profile`] enum keeps "at most one kind" structural in the domain layer.
//!
//! Authorization never trusts a stored role hint: [`AccountService::role_for`]
//! derives the role from the staff flag and profile presence at call time.

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::SqlitePool;
use utoipa::ToSchema;

use crate::error::{ApiError, ApiResult};
use crate::repositories::doctors::Doctor;
use crate::repositories::patients::Patient;
use crate::roles::Role;
use crate::security;
use crate::validation::{validate_password, validate_username};

/// User identity as exposed over the API. The password hash never leaves the
/// accounts module.
#[derive(Clone, Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,
}

/// Role-specific capability attached 1:1 to a user identity.
#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum Profile {
    Unassigned,
    Patient(Patient),
    Doctor(Doctor),
}

/// Registration payload: identity fields, credentials, one role selection
/// flag, and the optional fields for the selected profile.
#[derive(Debug, Deserialize, ToSchema)]
pub struct NewAccount {
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub password: String,
    pub password2: String,

    #[serde(default)]
    pub is_patient: bool,
    #[serde(default)]
    pub is_doctor: bool,

    // Patient-specific
    pub age: Option<i64>,
    pub gender: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,

    // Doctor-specific
    pub bio: Option<String>,
    pub specialty_id: Option<i64>,
}

#[derive(sqlx::FromRow)]
struct CredentialRow {
    id: i64,
    password_hash: String,
}

/// Data operations over user accounts.
#[derive(Clone)]
pub struct AccountService {
    pool: SqlitePool,
}

impl AccountService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Registers a new account and attaches exactly one profile.
    ///
    /// # Errors
    ///
    /// - `Validation` when the passwords mismatch, the password is too short,
    ///   the username is malformed, or the role selection is not exactly one
    ///   of patient/doctor
    /// - `Conflict` when the username is already taken
    /// - `NotFound` when a doctor registration names an unknown specialist
    pub async fn register(&self, new: NewAccount) -> ApiResult<(User, Profile)> {
        if new.password != new.password2 {
            return Err(ApiError::Validation("passwords do not match".into()));
        }
        validate_password(&new.password)?;
        validate_username(&new.username)?;

        match (new.is_patient, new.is_doctor) {
            (false, false) => {
                return Err(ApiError::Validation(
                    "you must register as either a patient or a doctor".into(),
                ))
            }
            (true, true) => {
                return Err(ApiError::Validation(
                    "you cannot register as both a patient and a doctor".into(),
                ))
            }
            _ => {}
        }

        // A doctor registration naming a missing specialist must fail before
        // the user row is written; there is no compensating rollback.
        if new.is_doctor {
            if let Some(specialty_id) = new.specialty_id {
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
            }
        }

        let password_hash = security::hash_password(&new.password)?;

        let user_id = sqlx::query(
            "INSERT INTO users (username, email, first_name, last_name, password_hash) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&new.username)
        .bind(&new.email)
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&password_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| ApiError::conflict_on_unique(e, "username already taken"))?
        .last_insert_rowid();

        let profile = if new.is_patient {
            self.attach_patient_profile(user_id, &new).await?
        } else {
            self.attach_doctor_profile(user_id, &new).await?
        };

        let user = self
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::Internal("user row missing after insert".into()))?;

        tracing::info!(username = %user.username, profile = ?profile_kind(&profile), "registered account");
        Ok((user, profile))
    }

    /// Verifies a credential pair and returns the matching user.
    ///
    /// Unknown usernames and wrong passwords are indistinguishable to the
    /// caller.
    pub async fn verify_login(&self, username: &str, password: &str) -> ApiResult<User> {
        let credential =
            sqlx::query_as::<_, CredentialRow>("SELECT id, password_hash FROM users WHERE username = ?1")
                .bind(username)
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| {
                    ApiError::Authentication("invalid username or password".into())
                })?;

        security::verify_password(password, &credential.password_hash)?;

        self.find_by_id(credential.id)
            .await?
            .ok_or_else(|| ApiError::Authentication("invalid username or password".into()))
    }

    pub async fn find_by_id(&self, id: i64) -> ApiResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, first_name, last_name, is_staff FROM users WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn find_by_username(&self, username: &str) -> ApiResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, first_name, last_name, is_staff FROM users \
             WHERE username = ?1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Derives the caller's role from the staff flag and profile presence.
    pub async fn role_for(&self, user: &User) -> ApiResult<Role> {
        if user.is_staff {
            return Ok(Role::Admin);
        }

        let (has_doctor, has_patient): (bool, bool) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM doctors WHERE user_id = ?1), \
                    EXISTS(SELECT 1 FROM patients WHERE user_id = ?1)",
        )
        .bind(user.id)
        .fetch_one(&self.pool)
        .await?;

        Ok(Role::resolve(user.is_staff, has_doctor, has_patient))
    }

    async fn attach_patient_profile(&self, user_id: i64, new: &NewAccount) -> ApiResult<Profile> {
        let age = new.age.unwrap_or(0);
        if age < 0 {
            return Err(ApiError::Validation("age cannot be negative".into()));
        }

        // Create-if-absent keyed on the user: a duplicate attempt is a no-op.
        sqlx::query(
            "INSERT INTO patients (user_id, age, gender, phone, address) \
             VALUES (?1, ?2, ?3, ?4, ?5) \
             ON CONFLICT(user_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(age)
        .bind(new.gender.as_deref().unwrap_or(""))
        .bind(new.phone.as_deref().unwrap_or(""))
        .bind(new.address.as_deref().unwrap_or(""))
        .execute(&self.pool)
        .await?;

        let patient = sqlx::query_as::<_, Patient>("SELECT * FROM patients WHERE user_id = ?1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(Profile::Patient(patient))
    }

    async fn attach_doctor_profile(&self, user_id: i64, new: &NewAccount) -> ApiResult<Profile> {
        sqlx::query(
            "INSERT INTO doctors (user_id, specialty_id, bio, available_times) \
             VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT(user_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(new.specialty_id)
        .bind(new.bio.as_deref().unwrap_or(""))
        .bind(Json(Vec::<String>::new()))
        .execute(&self.pool)
        .await?;

        let doctor = sqlx::query_as::<_, Doctor>("SELECT * FROM doctors WHERE user_id = ?1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(Profile::Doctor(doctor))
    }
}

fn profile_kind(profile: &Profile) -> &'static str {
    match profile {
        Profile::Unassigned => "unassigned",
        Profile::Patient(_) => "patient",
        Profile::Doctor(_) => "doctor",
    }
}

#[cfg(test)]
pub(crate) fn patient_registration(username: &str) -> NewAccount {
    NewAccount {
        username: username.into(),
        email: format!("{username}@example.com"),
        first_name: "Test".into(),
        last_name: "Patient".into(),
        password: "hunter2hunter2".into(),
        password2: "hunter2hunter2".into(),
        is_patient: true,
        is_doctor: false,
        age: Some(30),
        gender: Some("female".into()),
        phone: Some("0700000000".into()),
        address: Some("Nairobi".into()),
        bio: None,
        specialty_id: None,
    }
}

#[cfg(test)]
pub(crate) fn doctor_registration(username: &str) -> NewAccount {
    NewAccount {
        username: username.into(),
        email: format!("{username}@example.com"),
        first_name: "Test".into(),
        last_name: "Doctor".into(),
        password: "hunter2hunter2".into(),
        password2: "hunter2hunter2".into(),
        is_patient: false,
        is_doctor: true,
        age: None,
        gender: None,
        phone: None,
        address: None,
        bio: Some("bio".into()),
        specialty_id: None,
    }
}
