use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;
use vista_catalog::{
    Discount, DiscountKind, Listing, ListingDetails, ListingType, RoomType, Showtime, TicketType,
};
use vista_core::repository::{ListingRepository, RepoError, RepoResult};

use crate::database::db_err;

pub struct PgListingRepository {
    pool: PgPool,
}

impl PgListingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ListingRow {
    id: Uuid,
    vendor_id: Uuid,
    listing_type: String,
    title: String,
    description: Option<String>,
    location: Option<String>,
    currency: String,
    is_published: bool,
    starts_at: Option<DateTime<Utc>>,
    ends_at: Option<DateTime<Utc>>,
    duration_minutes: Option<i32>,
    available_until: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct ShowtimeRow {
    id: Uuid,
    starts_at: DateTime<Utc>,
    screen: Option<String>,
}

#[derive(sqlx::FromRow)]
struct UnitRow {
    id: Uuid,
    showtime_id: Option<Uuid>,
    name: String,
    price: i64,
    capacity: i32,
    sold_count: i32,
    max_guests: Option<i32>,
    discount_kind: Option<String>,
    discount_value: Option<i64>,
    discount_ends_at: Option<DateTime<Utc>>,
}

impl UnitRow {
    fn discount(&self) -> Option<Discount> {
        let kind = match self.discount_kind.as_deref()? {
            "percentage" => DiscountKind::Percentage,
            "fixed" => DiscountKind::Fixed,
            _ => return None,
        };
        Some(Discount {
            kind,
            value: self.discount_value.unwrap_or(0),
            ends_at: self.discount_ends_at,
        })
    }

    fn into_ticket(self) -> TicketType {
        let discount = self.discount();
        TicketType {
            id: self.id,
            name: self.name,
            price: self.price,
            capacity: self.capacity,
            sold_count: self.sold_count,
            discount,
        }
    }

    fn into_room(self) -> RoomType {
        let discount = self.discount();
        RoomType {
            id: self.id,
            name: self.name,
            price_per_night: self.price,
            capacity: self.capacity,
            booked_count: self.sold_count,
            max_guests: self.max_guests,
            discount,
        }
    }
}

/// Flat column values for one ticket or room type.
struct UnitInsert<'a> {
    id: Uuid,
    showtime_id: Option<Uuid>,
    kind: &'static str,
    name: &'a str,
    price: i64,
    capacity: i32,
    sold_count: i32,
    max_guests: Option<i32>,
    discount: Option<&'a Discount>,
}

impl<'a> From<&'a TicketType> for UnitInsert<'a> {
    fn from(t: &'a TicketType) -> Self {
        Self {
            id: t.id,
            showtime_id: None,
            kind: "ticket",
            name: &t.name,
            price: t.price,
            capacity: t.capacity,
            sold_count: t.sold_count,
            max_guests: None,
            discount: t.discount.as_ref(),
        }
    }
}

impl<'a> From<&'a RoomType> for UnitInsert<'a> {
    fn from(r: &'a RoomType) -> Self {
        Self {
            id: r.id,
            showtime_id: None,
            kind: "room",
            name: &r.name,
            price: r.price_per_night,
            capacity: r.capacity,
            sold_count: r.booked_count,
            max_guests: r.max_guests,
            discount: r.discount.as_ref(),
        }
    }
}

async fn insert_unit(
    tx: &mut Transaction<'_, Postgres>,
    listing_id: Uuid,
    position: i32,
    unit: UnitInsert<'_>,
) -> RepoResult<()> {
    let discount_kind = unit.discount.map(|d| match d.kind {
        DiscountKind::Percentage => "percentage",
        DiscountKind::Fixed => "fixed",
    });

    sqlx::query(
        r#"
        INSERT INTO inventory_units
            (id, listing_id, showtime_id, unit_kind, name, price, capacity, sold_count, max_guests,
             discount_kind, discount_value, discount_ends_at, position)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        "#,
    )
    .bind(unit.id)
    .bind(listing_id)
    .bind(unit.showtime_id)
    .bind(unit.kind)
    .bind(unit.name)
    .bind(unit.price)
    .bind(unit.capacity)
    .bind(unit.sold_count)
    .bind(unit.max_guests)
    .bind(discount_kind)
    .bind(unit.discount.map(|d| d.value))
    .bind(unit.discount.and_then(|d| d.ends_at))
    .bind(position)
    .execute(&mut **tx)
    .await
    .map_err(db_err)?;
    Ok(())
}

#[async_trait]
impl ListingRepository for PgListingRepository {
    async fn get_listing(&self, id: Uuid) -> RepoResult<Option<Listing>> {
        let row: Option<ListingRow> = sqlx::query_as(
            r#"
            SELECT id, vendor_id, listing_type, title, description, location, currency, is_published,
                   starts_at, ends_at, duration_minutes, available_until, created_at
            FROM listings WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let units: Vec<UnitRow> = sqlx::query_as(
            r#"
            SELECT id, showtime_id, name, price, capacity, sold_count, max_guests,
                   discount_kind, discount_value, discount_ends_at
            FROM inventory_units WHERE listing_id = $1
            ORDER BY position
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let listing_type: ListingType = row
            .listing_type
            .parse()
            .map_err(|e: vista_catalog::CatalogError| RepoError::Backend(e.to_string()))?;

        let details = match listing_type {
            ListingType::Event => ListingDetails::Event {
                starts_at: row
                    .starts_at
                    .ok_or_else(|| RepoError::Backend(format!("event {} has no start time", row.id)))?,
                ends_at: row.ends_at,
                tickets: units.into_iter().map(UnitRow::into_ticket).collect(),
            },
            ListingType::Accommodation => ListingDetails::Accommodation {
                rooms: units.into_iter().map(UnitRow::into_room).collect(),
            },
            ListingType::Leisure => ListingDetails::Leisure {
                available_until: row.available_until,
                tickets: units.into_iter().map(UnitRow::into_ticket).collect(),
            },
            ListingType::Movie => {
                let showtime_rows: Vec<ShowtimeRow> = sqlx::query_as(
                    "SELECT id, starts_at, screen FROM showtimes WHERE listing_id = $1 ORDER BY starts_at",
                )
                .bind(id)
                .fetch_all(&self.pool)
                .await
                .map_err(db_err)?;

                let mut showtimes: Vec<Showtime> = showtime_rows
                    .into_iter()
                    .map(|s| Showtime {
                        id: s.id,
                        starts_at: s.starts_at,
                        screen: s.screen,
                        tickets: Vec::new(),
                    })
                    .collect();
                for unit in units {
                    if let Some(showtime) = showtimes.iter_mut().find(|s| Some(s.id) == unit.showtime_id) {
                        showtime.tickets.push(unit.into_ticket());
                    }
                }
                ListingDetails::Movie {
                    duration_minutes: row.duration_minutes,
                    showtimes,
                }
            }
        };

        Ok(Some(Listing {
            id: row.id,
            vendor_id: row.vendor_id,
            title: row.title,
            description: row.description,
            location: row.location,
            currency: row.currency,
            is_published: row.is_published,
            created_at: row.created_at,
            details,
        }))
    }

    async fn create_listing(&self, listing: &Listing) -> RepoResult<()> {
        let (starts_at, ends_at, duration_minutes, available_until) = match &listing.details {
            ListingDetails::Event { starts_at, ends_at, .. } => (Some(*starts_at), *ends_at, None, None),
            ListingDetails::Movie { duration_minutes, .. } => (None, None, *duration_minutes, None),
            ListingDetails::Leisure { available_until, .. } => (None, None, None, *available_until),
            ListingDetails::Accommodation { .. } => (None, None, None, None),
        };

        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query(
            r#"
            INSERT INTO listings
                (id, vendor_id, listing_type, title, description, location, currency, is_published,
                 starts_at, ends_at, duration_minutes, available_until, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(listing.id)
        .bind(listing.vendor_id)
        .bind(listing.listing_type().as_str())
        .bind(&listing.title)
        .bind(&listing.description)
        .bind(&listing.location)
        .bind(&listing.currency)
        .bind(listing.is_published)
        .bind(starts_at)
        .bind(ends_at)
        .bind(duration_minutes)
        .bind(available_until)
        .bind(listing.created_at)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        match &listing.details {
            ListingDetails::Event { tickets, .. } | ListingDetails::Leisure { tickets, .. } => {
                for (i, t) in tickets.iter().enumerate() {
                    insert_unit(&mut tx, listing.id, i as i32, t.into()).await?;
                }
            }
            ListingDetails::Accommodation { rooms } => {
                for (i, r) in rooms.iter().enumerate() {
                    insert_unit(&mut tx, listing.id, i as i32, r.into()).await?;
                }
            }
            ListingDetails::Movie { showtimes, .. } => {
                let mut position = 0;
                for s in showtimes {
                    sqlx::query("INSERT INTO showtimes (id, listing_id, starts_at, screen) VALUES ($1, $2, $3, $4)")
                        .bind(s.id)
                        .bind(listing.id)
                        .bind(s.starts_at)
                        .bind(&s.screen)
                        .execute(&mut *tx)
                        .await
                        .map_err(db_err)?;

                    for t in &s.tickets {
                        let unit = UnitInsert {
                            showtime_id: Some(s.id),
                            ..UnitInsert::from(t)
                        };
                        insert_unit(&mut tx, listing.id, position, unit).await?;
                        position += 1;
                    }
                }
            }
        }

        tx.commit().await.map_err(db_err)?;
        Ok(())
    }
}
