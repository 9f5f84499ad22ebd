use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;
use vista_core::repository::{BookingRepository, RepoError, RepoResult};
use vista_core::{AppliedCoupon, Booking, BookingLine, BookingStatus, Contact};
use vista_shared::Masked;

use crate::database::db_err;

pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_lines(&self, booking_ids: &[Uuid]) -> RepoResult<HashMap<Uuid, Vec<BookingLine>>> {
        let rows: Vec<LineRow> = sqlx::query_as(
            r#"
            SELECT booking_id, unit_id, name, unit_price, quantity, nights, gross, discount, net
            FROM booking_lines WHERE booking_id = ANY($1)
            ORDER BY booking_id, position
            "#,
        )
        .bind(booking_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let mut lines: HashMap<Uuid, Vec<BookingLine>> = HashMap::new();
        for row in rows {
            lines.entry(row.booking_id).or_default().push(row.into());
        }
        Ok(lines)
    }

    async fn hydrate(&self, rows: Vec<BookingRow>) -> RepoResult<Vec<Booking>> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut lines = self.load_lines(&ids).await?;
        rows.into_iter()
            .map(|row| {
                let booking_lines = lines.remove(&row.id).unwrap_or_default();
                row.into_booking(booking_lines)
            })
            .collect()
    }
}

const BOOKING_COLUMNS: &str = "id, reference, explorer_id, contact_name, contact_email, contact_phone, \
     listing_type, listing_id, showtime_id, check_in, check_out, subtotal, discount_total, \
     coupon_code, coupon_discount, total, currency, status, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    reference: String,
    explorer_id: Uuid,
    contact_name: Option<String>,
    contact_email: String,
    contact_phone: Option<String>,
    listing_type: String,
    listing_id: Uuid,
    showtime_id: Option<Uuid>,
    check_in: Option<NaiveDate>,
    check_out: Option<NaiveDate>,
    subtotal: i64,
    discount_total: i64,
    coupon_code: Option<String>,
    coupon_discount: Option<i64>,
    total: i64,
    currency: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BookingRow {
    fn into_booking(self, lines: Vec<BookingLine>) -> RepoResult<Booking> {
        let listing_type = self
            .listing_type
            .parse()
            .map_err(|e: vista_catalog::CatalogError| RepoError::Backend(e.to_string()))?;
        let status = BookingStatus::parse(&self.status)
            .ok_or_else(|| RepoError::Backend(format!("unknown booking status {:?}", self.status)))?;

        Ok(Booking {
            id: self.id,
            reference: self.reference,
            explorer_id: self.explorer_id,
            contact: Contact {
                full_name: self.contact_name,
                email: Masked::new(self.contact_email),
                phone: self.contact_phone,
            },
            listing_type,
            listing_id: self.listing_id,
            showtime_id: self.showtime_id,
            check_in: self.check_in,
            check_out: self.check_out,
            lines,
            subtotal: self.subtotal,
            discount_total: self.discount_total,
            coupon: self.coupon_code.map(|code| AppliedCoupon {
                code,
                discount: self.coupon_discount.unwrap_or(0),
            }),
            total: self.total,
            currency: self.currency,
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct LineRow {
    booking_id: Uuid,
    unit_id: Uuid,
    name: String,
    unit_price: i64,
    quantity: i32,
    nights: i32,
    gross: i64,
    discount: i64,
    net: i64,
}

impl From<LineRow> for BookingLine {
    fn from(row: LineRow) -> Self {
        Self {
            unit_id: row.unit_id,
            name: row.name,
            unit_price: row.unit_price,
            quantity: row.quantity,
            nights: row.nights,
            gross: row.gross,
            discount: row.discount,
            net: row.net,
        }
    }
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn commit_booking(&self, booking: &Booking) -> RepoResult<()> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        for claim in booking.claims() {
            // Conditional increment: the row lock serializes concurrent bookings of the same unit.
            let claimed: Option<(i32,)> = sqlx::query_as(
                r#"
                UPDATE inventory_units
                SET sold_count = sold_count + $1
                WHERE id = $2 AND listing_id = $3 AND sold_count + $1 <= capacity
                RETURNING sold_count
                "#,
            )
            .bind(claim.quantity)
            .bind(claim.unit_id)
            .bind(booking.listing_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err)?;

            if claimed.is_none() {
                let unit: Option<(String, i32, i32)> = sqlx::query_as(
                    "SELECT name, capacity, sold_count FROM inventory_units WHERE id = $1 AND listing_id = $2",
                )
                .bind(claim.unit_id)
                .bind(booking.listing_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_err)?;

                // dropping `tx` rolls back the claims taken so far
                return Err(match unit {
                    Some((name, capacity, sold)) => RepoError::CapacityExceeded {
                        unit: name,
                        requested: claim.quantity,
                        available: (capacity - sold).max(0),
                    },
                    None => RepoError::NotFound(format!("inventory unit {}", claim.unit_id)),
                });
            }
        }

        sqlx::query(&format!(
            "INSERT INTO bookings ({BOOKING_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)"
        ))
        .bind(booking.id)
        .bind(&booking.reference)
        .bind(booking.explorer_id)
        .bind(&booking.contact.full_name)
        .bind(booking.contact.email.expose())
        .bind(&booking.contact.phone)
        .bind(booking.listing_type.as_str())
        .bind(booking.listing_id)
        .bind(booking.showtime_id)
        .bind(booking.check_in)
        .bind(booking.check_out)
        .bind(booking.subtotal)
        .bind(booking.discount_total)
        .bind(booking.coupon.as_ref().map(|c| c.code.as_str()))
        .bind(booking.coupon.as_ref().map(|c| c.discount))
        .bind(booking.total)
        .bind(&booking.currency)
        .bind(booking.status.as_str())
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        for (position, line) in booking.lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO booking_lines
                    (id, booking_id, unit_id, name, unit_price, quantity, nights, gross, discount, net, position)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(booking.id)
            .bind(line.unit_id)
            .bind(&line.name)
            .bind(line.unit_price)
            .bind(line.quantity)
            .bind(line.nights)
            .bind(line.gross)
            .bind(line.discount)
            .bind(line.net)
            .bind(position as i32)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }

        tx.commit().await.map_err(db_err)?;
        debug!(booking_id = %booking.id, "booking transaction committed");
        Ok(())
    }

    async fn get_booking(&self, id: Uuid) -> RepoResult<Option<Booking>> {
        let row: Option<BookingRow> = sqlx::query_as(&format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_for_explorer(&self, explorer_id: Uuid) -> RepoResult<Vec<Booking>> {
        let rows: Vec<BookingRow> = sqlx::query_as(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE explorer_id = $1 ORDER BY created_at DESC"
        ))
        .bind(explorer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        self.hydrate(rows).await
    }

    async fn list_for_listing(&self, listing_id: Uuid) -> RepoResult<Vec<Booking>> {
        let rows: Vec<BookingRow> = sqlx::query_as(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE listing_id = $1 ORDER BY created_at DESC"
        ))
        .bind(listing_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        self.hydrate(rows).await
    }

    async fn confirm_booking(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query(
            "UPDATE bookings SET status = 'confirmed', updated_at = NOW() WHERE id = $1 AND status = 'pending'",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(result.rows_affected() == 1)
    }

    async fn cancel_booking(&self, id: Uuid) -> RepoResult<bool> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let result = sqlx::query(
            "UPDATE bookings SET status = 'cancelled', updated_at = NOW() WHERE id = $1 AND status = 'pending'",
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        sqlx::query(
            r#"
            UPDATE inventory_units u
            SET sold_count = GREATEST(u.sold_count - l.quantity, 0)
            FROM booking_lines l
            WHERE l.booking_id = $1 AND u.id = l.unit_id
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        Ok(true)
    }
}
