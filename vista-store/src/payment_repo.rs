use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use vista_core::repository::{PaymentRepository, RepoError, RepoResult};
use vista_core::{Payment, PaymentStatus};

use crate::database::db_err;

pub struct PgPaymentRepository {
    pool: PgPool,
}

impl PgPaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const PAYMENT_COLUMNS: &str = "id, booking_id, reference, amount, currency, provider, status, \
     authorization_url, access_code, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    booking_id: Uuid,
    reference: String,
    amount: i64,
    currency: String,
    provider: String,
    status: String,
    authorization_url: Option<String>,
    access_code: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = RepoError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        let status = PaymentStatus::parse(&row.status)
            .ok_or_else(|| RepoError::Backend(format!("unknown payment status {:?}", row.status)))?;
        Ok(Payment {
            id: row.id,
            booking_id: row.booking_id,
            reference: row.reference,
            amount: row.amount,
            currency: row.currency,
            provider: row.provider,
            status,
            authorization_url: row.authorization_url,
            access_code: row.access_code,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl PaymentRepository for PgPaymentRepository {
    async fn save_payment(&self, payment: &Payment) -> RepoResult<()> {
        sqlx::query(&format!(
            "INSERT INTO payments ({PAYMENT_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"
        ))
        .bind(payment.id)
        .bind(payment.booking_id)
        .bind(&payment.reference)
        .bind(payment.amount)
        .bind(&payment.currency)
        .bind(&payment.provider)
        .bind(payment.status.as_str())
        .bind(&payment.authorization_url)
        .bind(&payment.access_code)
        .bind(payment.created_at)
        .bind(payment.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn get_payment_for_booking(&self, booking_id: Uuid) -> RepoResult<Option<Payment>> {
        let row: Option<PaymentRow> =
            sqlx::query_as(&format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE booking_id = $1"))
                .bind(booking_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;

        row.map(Payment::try_from).transpose()
    }

    async fn get_payment_by_reference(&self, reference: &str) -> RepoResult<Option<Payment>> {
        let row: Option<PaymentRow> =
            sqlx::query_as(&format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE reference = $1"))
                .bind(reference)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;

        row.map(Payment::try_from).transpose()
    }

    async fn update_payment_status(&self, reference: &str, status: PaymentStatus) -> RepoResult<()> {
        let result = sqlx::query("UPDATE payments SET status = $1, updated_at = NOW() WHERE reference = $2")
            .bind(status.as_str())
            .bind(reference)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound(format!("payment {}", reference)));
        }
        Ok(())
    }
}
