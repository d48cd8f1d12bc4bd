//! Specialist catalog and symptom index.
//!
//! A specialist is a medical specialty category, not an individual
//! practitioner. The symptom index maps free-text keywords onto specialists
//! and backs the public symptom-match lookup.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use utoipa::ToSchema;

use crate::error::{ApiError, ApiResult};

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Specialist {
    pub id: i64,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NewSpecialist {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateSpecialist {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct SymptomEntry {
    pub id: i64,
    pub symptom: String,
    pub specialist_id: i64,
}

/// One symptom-index hit: the matched keyword and the specialist it maps to.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct SymptomMatch {
    pub id: i64,
    pub symptom: String,
    pub specialist: Specialist,
}

#[derive(sqlx::FromRow)]
struct SymptomMatchRow {
    id: i64,
    symptom: String,
    specialist_id: i64,
    specialist_name: String,
    specialist_description: String,
}

impl From<SymptomMatchRow> for SymptomMatch {
    fn from(row: SymptomMatchRow) -> Self {
        SymptomMatch {
            id: row.id,
            symptom: row.symptom,
            specialist: Specialist {
                id: row.specialist_id,
                name: row.specialist_name,
                description: row.specialist_description,
            },
        }
    }
}

/// Data operations over the specialist catalog and symptom index.
#[derive(Clone)]
pub struct SpecialistService {
    pool: SqlitePool,
}

impl SpecialistService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, new: NewSpecialist) -> ApiResult<Specialist> {
        if new.name.trim().is_empty() {
            return Err(ApiError::Validation("specialist name cannot be empty".into()));
        }

        let id = sqlx::query("INSERT INTO specialists (name, description) VALUES (?1, ?2)")
            .bind(&new.name)
            .bind(&new.description)
            .execute(&self.pool)
            .await?
            .last_insert_rowid();

        self.get(id).await
    }

    pub async fn list(&self) -> ApiResult<Vec<Specialist>> {
        let specialists = sqlx::query_as::<_, Specialist>("SELECT * FROM specialists ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(specialists)
    }

    pub async fn get(&self, id: i64) -> ApiResult<Specialist> {
        sqlx::query_as::<_, Specialist>("SELECT * FROM specialists WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("specialist {id} not found")))
    }

    pub async fn update(&self, id: i64, update: UpdateSpecialist) -> ApiResult<Specialist> {
        let current = self.get(id).await?;

        let name = update.name.unwrap_or(current.name);
        if name.trim().is_empty() {
            return Err(ApiError::Validation("specialist name cannot be empty".into()));
        }

        sqlx::query("UPDATE specialists SET name = ?1, description = ?2 WHERE id = ?3")
            .bind(&name)
            .bind(update.description.unwrap_or(current.description))
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.get(id).await
    }

    /// Deletes a specialist. Dependent symptom entries are deleted and any
    /// doctors referencing it have their specialty nulled (schema policy).
    pub async fn delete(&self, id: i64) -> ApiResult<()> {
        let result = sqlx::query("DELETE FROM specialists WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound(format!("specialist {id} not found")));
        }
        Ok(())
    }

    /// Adds a symptom keyword to the index for `specialist_id`.
    pub async fn add_symptom(&self, specialist_id: i64, symptom: &str) -> ApiResult<SymptomEntry> {
        if symptom.trim().is_empty() {
            return Err(ApiError::Validation("symptom cannot be empty".into()));
        }
        // Surfaces NotFound before the foreign-key error would.
        self.get(specialist_id).await?;

        let id = sqlx::query("INSERT INTO symptom_map (symptom, specialist_id) VALUES (?1, ?2)")
            .bind(symptom.trim())
            .bind(specialist_id)
            .execute(&self.pool)
            .await?
            .last_insert_rowid();

        let entry = sqlx::query_as::<_, SymptomEntry>("SELECT * FROM symptom_map WHERE id = ?1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(entry)
    }

    pub async fn list_symptoms(&self, specialist_id: i64) -> ApiResult<Vec<SymptomEntry>> {
        self.get(specialist_id).await?;
        let entries = sqlx::query_as::<_, SymptomEntry>(
            "SELECT * FROM symptom_map WHERE specialist_id = ?1 ORDER BY id",
        )
        .bind(specialist_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    /// Case-insensitive substring match of `term` against stored symptom
    /// keywords. An absent or empty term yields an empty result, never an
    /// error.
    pub async fn match_symptom(&self, term: Option<&str>) -> ApiResult<Vec<SymptomMatch>> {
        let term = match term.map(str::trim) {
            Some(t) if !t.is_empty() => t.to_lowercase(),
            _ => return Ok(Vec::new()),
        };

        // instr() instead of LIKE so '%' and '_' in user input stay literal.
        let rows = sqlx::query_as::<_, SymptomMatchRow>(
            "SELECT m.id, m.symptom, s.id AS specialist_id, s.name AS specialist_name, \
                    s.description AS specialist_description \
             FROM symptom_map m \
             JOIN specialists s ON s.id = m.specialist_id \
             WHERE instr(lower(m.symptom), ?1) > 0 \
             ORDER BY m.id",
        )
        .bind(&term)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SymptomMatch::from).collect())
    }
}

#[cfg(test)]
mod specialists_tests {
    use super::*;
    use crate::db::test_pool;

    async fn seed_specialist(service: &SpecialistService, name: &str) -> Specialist {
        service
            .create(NewSpecialist {
                name: name.into(),
                description: format!("{name} care"),
            })
            .await
            .expect("specialist creates")
    }

    #[tokio::test]
    async fn symptom_match_is_case_insensitive_substring() {
        let pool = test_pool().await;
        let service = SpecialistService::new(pool);
        let derm = seed_specialist(&service, "Dermatology").await;
        let gp = seed_specialist(&service, "General Practice").await;

        service.add_symptom(derm.id, "skin rash").await.expect("entry");
        service.add_symptom(gp.id, "Fever").await.expect("entry");

        let hits = service.match_symptom(Some("FEVER")).await.expect("matches");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].specialist.name, "General Practice");

        // Substring both ways: stored "Fever" found inside a longer query
        // term is not expected, but a short query matches longer keywords.
        let hits = service.match_symptom(Some("rash")).await.expect("matches");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].symptom, "skin rash");
    }

    #[tokio::test]
    async fn absent_or_unmatched_term_yields_empty_list() {
        let pool = test_pool().await;
        let service = SpecialistService::new(pool);

        assert!(service.match_symptom(None).await.expect("ok").is_empty());
        assert!(service.match_symptom(Some("  ")).await.expect("ok").is_empty());
        assert!(service
            .match_symptom(Some("toothache"))
            .await
            .expect("ok")
            .is_empty());
    }

    #[tokio::test]
    async fn wildcard_characters_are_literal() {
        let pool = test_pool().await;
        let service = SpecialistService::new(pool);
        let gp = seed_specialist(&service, "General Practice").await;
        service.add_symptom(gp.id, "fever").await.expect("entry");

        assert!(service
            .match_symptom(Some("%"))
            .await
            .expect("ok")
            .is_empty());
    }

    #[tokio::test]
    async fn deleting_specialist_deletes_symptom_entries() {
        let pool = test_pool().await;
        let service = SpecialistService::new(pool.clone());
        let gp = seed_specialist(&service, "General Practice").await;
        service.add_symptom(gp.id, "fever").await.expect("entry");

        service.delete(gp.id).await.expect("deletes");

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM symptom_map")
            .fetch_one(&pool)
            .await
            .expect("count");
        assert_eq!(remaining, 0);
    }

    #[tokio::test]
    async fn add_symptom_requires_existing_specialist() {
        let pool = test_pool().await;
        let service = SpecialistService::new(pool);

        let err = service
            .add_symptom(999, "fever")
            .await
            .expect_err("dangling specialist rejected");
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
