use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::pricing::{Discount, DiscountKind};
use crate::CatalogError;

/// The four bookable verticals.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ListingType {
    Event,
    Accommodation,
    Movie,
    Leisure,
}

impl ListingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingType::Event => "event",
            ListingType::Accommodation => "accommodation",
            ListingType::Movie => "movie",
            ListingType::Leisure => "leisure",
        }
    }
}

impl fmt::Display for ListingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListingType {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "event" => Ok(ListingType::Event),
            "accommodation" => Ok(ListingType::Accommodation),
            "movie" => Ok(ListingType::Movie),
            "leisure" => Ok(ListingType::Leisure),
            other => Err(CatalogError::UnknownListingType(other.to_string())),
        }
    }
}

/// A priced, capacity-bounded unit of a listing: a ticket type or a room type.
pub trait InventoryUnit {
    fn id(&self) -> Uuid;
    fn name(&self) -> &str;
    /// Price of one unit, in minor units. Rooms are priced per night.
    fn unit_price(&self) -> i64;
    fn capacity(&self) -> i32;
    fn sold(&self) -> i32;
    fn discount(&self) -> Option<&Discount>;

    fn remaining(&self) -> i32 {
        (self.capacity() - self.sold()).max(0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TicketType {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    pub price: i64,
    pub capacity: i32,
    #[serde(default)]
    pub sold_count: i32,
    #[serde(default)]
    pub discount: Option<Discount>,
}

impl InventoryUnit for TicketType {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn unit_price(&self) -> i64 {
        self.price
    }

    fn capacity(&self) -> i32 {
        self.capacity
    }

    fn sold(&self) -> i32 {
        self.sold_count
    }

    fn discount(&self) -> Option<&Discount> {
        self.discount.as_ref()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoomType {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    pub price_per_night: i64,
    /// Number of rooms of this type.
    pub capacity: i32,
    #[serde(default)]
    pub booked_count: i32,
    #[serde(default)]
    pub max_guests: Option<i32>,
    #[serde(default)]
    pub discount: Option<Discount>,
}

impl InventoryUnit for RoomType {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn unit_price(&self) -> i64 {
        self.price_per_night
    }

    fn capacity(&self) -> i32 {
        self.capacity
    }

    fn sold(&self) -> i32 {
        self.booked_count
    }

    fn discount(&self) -> Option<&Discount> {
        self.discount.as_ref()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Showtime {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub starts_at: DateTime<Utc>,
    #[serde(default)]
    pub screen: Option<String>,
    pub tickets: Vec<TicketType>,
}

/// Vertical-specific part of a listing document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "listing_type", rename_all = "lowercase")]
pub enum ListingDetails {
    Event {
        starts_at: DateTime<Utc>,
        #[serde(default)]
        ends_at: Option<DateTime<Utc>>,
        tickets: Vec<TicketType>,
    },
    Accommodation {
        rooms: Vec<RoomType>,
    },
    Movie {
        #[serde(default)]
        duration_minutes: Option<i32>,
        showtimes: Vec<Showtime>,
    },
    Leisure {
        #[serde(default)]
        available_until: Option<DateTime<Utc>>,
        tickets: Vec<TicketType>,
    },
}

impl ListingDetails {
    pub fn listing_type(&self) -> ListingType {
        match self {
            ListingDetails::Event { .. } => ListingType::Event,
            ListingDetails::Accommodation { .. } => ListingType::Accommodation,
            ListingDetails::Movie { .. } => ListingType::Movie,
            ListingDetails::Leisure { .. } => ListingType::Leisure,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Listing {
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub currency: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub details: ListingDetails,
}

impl Listing {
    pub fn listing_type(&self) -> ListingType {
        self.details.listing_type()
    }

    pub fn showtime(&self, showtime_id: Uuid) -> Option<&Showtime> {
        match &self.details {
            ListingDetails::Movie { showtimes, .. } => showtimes.iter().find(|s| s.id == showtime_id),
            _ => None,
        }
    }

    /// Mutable `(sold, capacity)` pair for a ticket or room type, wherever it lives in the document.
    pub(crate) fn unit_counts_mut(&mut self, unit_id: Uuid) -> Option<(&mut i32, i32)> {
        match &mut self.details {
            ListingDetails::Event { tickets, .. } | ListingDetails::Leisure { tickets, .. } => tickets
                .iter_mut()
                .find(|t| t.id == unit_id)
                .map(|t| (&mut t.sold_count, t.capacity)),
            ListingDetails::Accommodation { rooms } => rooms
                .iter_mut()
                .find(|r| r.id == unit_id)
                .map(|r| (&mut r.booked_count, r.capacity)),
            ListingDetails::Movie { showtimes, .. } => showtimes
                .iter_mut()
                .flat_map(|s| s.tickets.iter_mut())
                .find(|t| t.id == unit_id)
                .map(|t| (&mut t.sold_count, t.capacity)),
        }
    }
}

/// Vendor input for a new listing. Ids and timestamps are assigned on [`ListingDraft::into_listing`].
#[derive(Debug, Clone, Deserialize)]
pub struct ListingDraft {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_published")]
    pub is_published: bool,
    #[serde(flatten)]
    pub details: ListingDetails,
}

fn default_currency() -> String {
    "NGN".to_string()
}

fn default_published() -> bool {
    true
}

impl ListingDraft {
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.title.trim().is_empty() {
            return Err(CatalogError::InvalidListing("title is required".into()));
        }
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CatalogError::InvalidListing(format!(
                "currency must be a 3-letter code, got {:?}",
                self.currency
            )));
        }

        match &self.details {
            ListingDetails::Event { starts_at, ends_at, tickets } => {
                if let Some(end) = ends_at {
                    if end < starts_at {
                        return Err(CatalogError::InvalidListing("event ends before it starts".into()));
                    }
                }
                validate_units(tickets, "ticket type")
            }
            ListingDetails::Leisure { tickets, .. } => validate_units(tickets, "ticket type"),
            ListingDetails::Accommodation { rooms } => validate_units(rooms, "room type"),
            ListingDetails::Movie { showtimes, .. } => {
                if showtimes.is_empty() {
                    return Err(CatalogError::InvalidListing("at least one showtime is required".into()));
                }
                showtimes
                    .iter()
                    .try_for_each(|s| validate_units(&s.tickets, "ticket type"))
            }
        }
    }

    /// Builds the stored document. Sold counters always start at zero.
    pub fn into_listing(self, vendor_id: Uuid, now: DateTime<Utc>) -> Listing {
        let mut details = self.details;
        match &mut details {
            ListingDetails::Event { tickets, .. } | ListingDetails::Leisure { tickets, .. } => {
                tickets.iter_mut().for_each(|t| t.sold_count = 0);
            }
            ListingDetails::Accommodation { rooms } => {
                rooms.iter_mut().for_each(|r| r.booked_count = 0);
            }
            ListingDetails::Movie { showtimes, .. } => {
                showtimes
                    .iter_mut()
                    .flat_map(|s| s.tickets.iter_mut())
                    .for_each(|t| t.sold_count = 0);
            }
        }

        Listing {
            id: Uuid::new_v4(),
            vendor_id,
            title: self.title.trim().to_string(),
            description: self.description,
            location: self.location,
            currency: self.currency.to_ascii_uppercase(),
            is_published: self.is_published,
            created_at: now,
            details,
        }
    }
}

/// Upper bound for a unit price or fixed discount, in minor units.
pub const MAX_UNIT_PRICE: i64 = 1_000_000_000_000;

fn validate_units<U: InventoryUnit>(units: &[U], label: &str) -> Result<(), CatalogError> {
    if units.is_empty() {
        return Err(CatalogError::InvalidListing(format!("at least one {} is required", label)));
    }
    for unit in units {
        if unit.name().trim().is_empty() {
            return Err(CatalogError::InvalidListing(format!("{} name is required", label)));
        }
        if unit.capacity() <= 0 {
            return Err(CatalogError::InvalidListing(format!(
                "{} '{}' must have a positive capacity",
                label,
                unit.name()
            )));
        }
        if unit.unit_price() < 0 {
            return Err(CatalogError::InvalidListing(format!(
                "{} '{}' has a negative price",
                label,
                unit.name()
            )));
        }
        if unit.unit_price() > MAX_UNIT_PRICE {
            return Err(CatalogError::InvalidListing(format!(
                "{} '{}' price exceeds {}",
                label,
                unit.name(),
                MAX_UNIT_PRICE
            )));
        }
        if let Some(discount) = unit.discount() {
            let valid = match discount.kind {
                DiscountKind::Percentage => (0..=100).contains(&discount.value),
                DiscountKind::Fixed => (0..=MAX_UNIT_PRICE).contains(&discount.value),
            };
            if !valid {
                return Err(CatalogError::InvalidListing(format!(
                    "{} '{}' has an invalid discount",
                    label,
                    unit.name()
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn movie_json() -> serde_json::Value {
        json!({
            "title": "Night Shift",
            "currency": "ngn",
            "listing_type": "movie",
            "duration_minutes": 118,
            "showtimes": [{
                "starts_at": "2030-01-01T19:00:00Z",
                "screen": "IMAX 1",
                "tickets": [
                    { "name": "Regular", "price": 350000, "capacity": 120, "sold_count": 40 }
                ]
            }]
        })
    }

    #[test]
    fn test_listing_type_parsing() {
        assert_eq!("Event".parse::<ListingType>().unwrap(), ListingType::Event);
        assert_eq!(" leisure ".parse::<ListingType>().unwrap(), ListingType::Leisure);
        assert!(matches!(
            "concert".parse::<ListingType>(),
            Err(CatalogError::UnknownListingType(t)) if t == "concert"
        ));
    }

    #[test]
    fn test_draft_deserializes_tagged_details() {
        let draft: ListingDraft = serde_json::from_value(movie_json()).expect("valid draft");
        assert!(draft.is_published);
        assert_eq!(draft.details.listing_type(), ListingType::Movie);
        draft.validate().unwrap();
    }

    #[test]
    fn test_into_listing_resets_sold_counts() {
        let draft: ListingDraft = serde_json::from_value(movie_json()).unwrap();
        let vendor = Uuid::new_v4();
        let listing = draft.into_listing(vendor, Utc::now());

        assert_eq!(listing.vendor_id, vendor);
        assert_eq!(listing.currency, "NGN");
        match &listing.details {
            ListingDetails::Movie { showtimes, .. } => {
                assert_eq!(showtimes[0].tickets[0].sold_count, 0);
            }
            other => panic!("unexpected details: {:?}", other),
        }
    }

    #[test]
    fn test_draft_rejects_empty_inventory() {
        let draft: ListingDraft = serde_json::from_value(json!({
            "title": "Beach Day",
            "listing_type": "leisure",
            "tickets": []
        }))
        .unwrap();
        assert!(matches!(draft.validate(), Err(CatalogError::InvalidListing(_))));
    }

    #[test]
    fn test_draft_rejects_oversized_percentage() {
        let draft: ListingDraft = serde_json::from_value(json!({
            "title": "Jazz Night",
            "listing_type": "event",
            "starts_at": "2030-05-01T18:00:00Z",
            "tickets": [{
                "name": "VIP", "price": 5000, "capacity": 10,
                "discount": { "kind": "percentage", "value": 150 }
            }]
        }))
        .unwrap();
        assert!(draft.validate().is_err());
    }

    #[test]
    fn test_draft_rejects_unpriceable_amounts() {
        let draft: ListingDraft = serde_json::from_value(json!({
            "title": "Penthouse",
            "listing_type": "accommodation",
            "rooms": [{ "name": "Suite", "price_per_night": 5_000_000_000_000_000_000i64, "capacity": 1 }]
        }))
        .unwrap();
        assert!(matches!(draft.validate(), Err(CatalogError::InvalidListing(m)) if m.contains("exceeds")));

        let draft: ListingDraft = serde_json::from_value(json!({
            "title": "Gala",
            "listing_type": "event",
            "starts_at": "2030-05-01T18:00:00Z",
            "tickets": [{
                "name": "Table", "price": MAX_UNIT_PRICE, "capacity": 4,
                "discount": { "kind": "fixed", "value": i64::MAX }
            }]
        }))
        .unwrap();
        assert!(draft.validate().is_err());
    }

    #[test]
    fn test_unit_counts_mut_finds_showtime_tickets() {
        let draft: ListingDraft = serde_json::from_value(movie_json()).unwrap();
        let mut listing = draft.into_listing(Uuid::new_v4(), Utc::now());
        let ticket_id = match &listing.details {
            ListingDetails::Movie { showtimes, .. } => showtimes[0].tickets[0].id,
            _ => unreachable!(),
        };

        let (sold, capacity) = listing.unit_counts_mut(ticket_id).expect("ticket exists");
        *sold += 3;
        assert_eq!(capacity, 120);
        assert!(listing.unit_counts_mut(Uuid::new_v4()).is_none());
    }
}
