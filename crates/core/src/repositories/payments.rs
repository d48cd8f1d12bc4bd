//! Payment ledger.
//!
//! One payment per appointment; this is a ledger record only, not a live
//! payment processor. Transaction ids are globally unique and the store is
//! the enforcement point — a duplicate insert surfaces as a conflict and
//! leaves the first record untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use utoipa::ToSchema;

use crate::error::{ApiError, ApiResult};
use crate::validation::Amount;

/// How a payment was made.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PaymentMethod {
    Mpesa,
    Stripe,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct Payment {
    pub id: i64,
    pub appointment_id: i64,
    #[sqlx(rename = "amount_cents")]
    #[schema(value_type = String, example = "1500.00")]
    pub amount: Amount,
    pub method: PaymentMethod,
    pub transaction_id: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NewPayment {
    pub appointment_id: i64,
    #[schema(value_type = String, example = "1500.00")]
    pub amount: Amount,
    pub method: PaymentMethod,
    pub transaction_id: String,
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdatePayment {
    #[schema(value_type = Option<String>)]
    pub amount: Option<Amount>,
    pub method: Option<PaymentMethod>,
    pub transaction_id: Option<String>,
    pub status: Option<String>,
}

/// Data operations over the payment ledger.
#[derive(Clone)]
pub struct PaymentService {
    pool: SqlitePool,
}

impl PaymentService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Records a payment against an appointment.
    ///
    /// # Errors
    ///
    /// `NotFound` when the appointment does not exist; `Conflict` when the
    /// transaction id was already recorded or the appointment already has a
    /// payment.
    pub async fn create(&self, new: NewPayment) -> ApiResult<Payment> {
        if new.transaction_id.trim().is_empty() {
            return Err(ApiError::Validation("transaction id cannot be empty".into()));
        }

        let appointment_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM appointments WHERE id = ?1)")
                .bind(new.appointment_id)
                .fetch_one(&self.pool)
                .await?;
        if !appointment_exists {
            return Err(ApiError::NotFound(format!(
                "appointment {} not found",
                new.appointment_id
            )));
        }

        let id = sqlx::query(
            "INSERT INTO payments (appointment_id, amount_cents, method, transaction_id, \
             status, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(new.appointment_id)
        .bind(new.amount)
        .bind(new.method)
        .bind(new.transaction_id.trim())
        .bind(new.status.as_deref().unwrap_or("pending"))
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Self::classify_unique)?
        .last_insert_rowid();

        self.get(id).await
    }

    pub async fn list(&self) -> ApiResult<Vec<Payment>> {
        let payments = sqlx::query_as::<_, Payment>("SELECT * FROM payments ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(payments)
    }

    pub async fn get(&self, id: i64) -> ApiResult<Payment> {
        sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("payment {id} not found")))
    }

    pub async fn update(&self, id: i64, update: UpdatePayment) -> ApiResult<Payment> {
        let current = self.get(id).await?;

        let transaction_id = update.transaction_id.unwrap_or(current.transaction_id);
        if transaction_id.trim().is_empty() {
            return Err(ApiError::Validation("transaction id cannot be empty".into()));
        }

        sqlx::query(
            "UPDATE payments SET amount_cents = ?1, method = ?2, transaction_id = ?3, \
             status = ?4 WHERE id = ?5",
        )
        .bind(update.amount.unwrap_or(current.amount))
        .bind(update.method.unwrap_or(current.method))
        .bind(transaction_id.trim())
        .bind(update.status.unwrap_or(current.status))
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(Self::classify_unique)?;

        self.get(id).await
    }

    pub async fn delete(&self, id: i64) -> ApiResult<()> {
        let result = sqlx::query("DELETE FROM payments WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound(format!("payment {id} not found")));
        }
        Ok(())
    }

    fn classify_unique(err: sqlx::Error) -> ApiError {
        if let Some(db) = err.as_database_error() {
            if db.is_unique_violation() {
                let message = if db.message().contains("transaction_id") {
                    "transaction id already recorded"
                } else {
                    "appointment already has a payment"
                };
                return ApiError::Conflict(message.into());
            }
        }
        ApiError::Database(err)
    }
}

#[cfg(test)]
mod payments_tests {
    use super::*;
    use crate::db::test_pool;
    use crate::repositories::accounts::{doctor_registration, patient_registration, AccountService};
    use crate::repositories::appointments::{AppointmentService, BookAppointment};
    use crate::repositories::doctors::DoctorService;

    async fn seed_appointment(pool: &SqlitePool) -> i64 {
        let accounts = AccountService::new(pool.clone());
        let (alice, _) = accounts
            .register(patient_registration("alice"))
            .await
            .expect("registers");
        let (bob, _) = accounts
            .register(doctor_registration("dr.bob"))
            .await
            .expect("registers");
        let doctor = DoctorService::new(pool.clone())
            .find_by_user(bob.id)
            .await
            .expect("query ok")
            .expect("profile");

        AppointmentService::new(pool.clone())
            .book_for_user(
                alice.id,
                BookAppointment {
                    doctor_id: doctor.id,
                    date: "2025-06-01".parse().expect("valid date"),
                    time: "09:00:00".parse().expect("valid time"),
                    notes: None,
                },
            )
            .await
            .expect("books")
            .id
    }

    fn payment(appointment_id: i64, transaction_id: &str) -> NewPayment {
        NewPayment {
            appointment_id,
            amount: "1500.00".parse().expect("valid amount"),
            method: PaymentMethod::Mpesa,
            transaction_id: transaction_id.into(),
            status: None,
        }
    }

    #[tokio::test]
    async fn duplicate_transaction_id_conflicts_and_keeps_first() {
        let pool = test_pool().await;
        let appointment_id = seed_appointment(&pool).await;
        let service = PaymentService::new(pool.clone());

        let first = service
            .create(payment(appointment_id, "TXN-1"))
            .await
            .expect("first records");

        // A second appointment so only the transaction id collides.
        let second_appointment = {
            let alice = AccountService::new(pool.clone())
                .find_by_username("alice")
                .await
                .expect("query ok")
                .expect("present");
            let doctor_id: i64 = sqlx::query_scalar("SELECT id FROM doctors LIMIT 1")
                .fetch_one(&pool)
                .await
                .expect("doctor");
            AppointmentService::new(pool.clone())
                .book_for_user(
                    alice.id,
                    BookAppointment {
                        doctor_id,
                        date: "2025-06-02".parse().expect("valid date"),
                        time: "10:00:00".parse().expect("valid time"),
                        notes: None,
                    },
                )
                .await
                .expect("books")
                .id
        };

        let err = service
            .create(payment(second_appointment, "TXN-1"))
            .await
            .expect_err("duplicate rejected");
        assert!(matches!(err, ApiError::Conflict(_)));
        assert!(err.to_string().contains("transaction id"));

        let kept = service.get(first.id).await.expect("first unaffected");
        assert_eq!(kept.transaction_id, "TXN-1");
        assert_eq!(kept.status, "pending");
    }

    #[tokio::test]
    async fn second_payment_for_same_appointment_conflicts() {
        let pool = test_pool().await;
        let appointment_id = seed_appointment(&pool).await;
        let service = PaymentService::new(pool);

        service
            .create(payment(appointment_id, "TXN-1"))
            .await
            .expect("first records");

        let err = service
            .create(payment(appointment_id, "TXN-2"))
            .await
            .expect_err("second rejected");
        assert!(matches!(err, ApiError::Conflict(_)));
        assert!(err.to_string().contains("appointment"));
    }

    #[tokio::test]
    async fn deleting_appointment_cascades_to_payment() {
        let pool = test_pool().await;
        let appointment_id = seed_appointment(&pool).await;
        let service = PaymentService::new(pool.clone());

        service
            .create(payment(appointment_id, "TXN-1"))
            .await
            .expect("records");

        AppointmentService::new(pool.clone())
            .delete(appointment_id)
            .await
            .expect("deletes");

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM payments")
            .fetch_one(&pool)
            .await
            .expect("count");
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn deleting_doctor_cascades_through_to_payment() {
        let pool = test_pool().await;
        let appointment_id = seed_appointment(&pool).await;
        PaymentService::new(pool.clone())
            .create(payment(appointment_id, "TXN-1"))
            .await
            .expect("records");

        let doctor_id: i64 = sqlx::query_scalar("SELECT id FROM doctors LIMIT 1")
            .fetch_one(&pool)
            .await
            .expect("doctor");
        DoctorService::new(pool.clone())
            .delete(doctor_id)
            .await
            .expect("deletes");

        let payments: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM payments")
            .fetch_one(&pool)
            .await
            .expect("count");
        assert_eq!(payments, 0);
    }

    #[tokio::test]
    async fn unknown_appointment_is_not_found() {
        let pool = test_pool().await;
        let err = PaymentService::new(pool)
            .create(payment(999, "TXN-1"))
            .await
            .expect_err("rejected");
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn amount_round_trips_as_fixed_point() {
        let pool = test_pool().await;
        let appointment_id = seed_appointment(&pool).await;

        let recorded = PaymentService::new(pool)
            .create(NewPayment {
                appointment_id,
                amount: "1234.56".parse().expect("valid amount"),
                method: PaymentMethod::Stripe,
                transaction_id: "TXN-1".into(),
                status: Some("paid".into()),
            })
            .await
            .expect("records");

        assert_eq!(recorded.amount.cents(), 123_456);
        assert_eq!(recorded.amount.to_string(), "1234.56");
        assert_eq!(recorded.status, "paid");
    }
}
