use chrono::{Duration, Utc};
use uuid::Uuid;
use vista_catalog::{Listing, ListingDetails, TicketType};
use vista_core::repository::ListingRepository;
use vista_core::{Booking, BookingLine, BookingStatus, Contact};
use vista_shared::Masked;

/// A published event a month out with one 1000-priced ticket type.
pub(crate) fn festival(capacity: i32) -> (Listing, Uuid) {
    let ticket_id = Uuid::new_v4();
    let listing = Listing {
        id: Uuid::new_v4(),
        vendor_id: Uuid::new_v4(),
        title: "Afro Nation".to_string(),
        description: None,
        location: None,
        currency: "NGN".to_string(),
        is_published: true,
        created_at: Utc::now(),
        details: ListingDetails::Event {
            starts_at: Utc::now() + Duration::days(30),
            ends_at: None,
            tickets: vec![TicketType {
                id: ticket_id,
                name: "GA".to_string(),
                price: 1000,
                capacity,
                sold_count: 0,
                discount: None,
            }],
        },
    };
    (listing, ticket_id)
}

pub(crate) fn booking(listing: &Listing, unit_id: Uuid, quantity: i32) -> Booking {
    let gross = 1000 * quantity as i64;
    Booking {
        id: Uuid::new_v4(),
        reference: vista_core::booking::generate_reference(),
        explorer_id: Uuid::new_v4(),
        contact: Contact {
            full_name: None,
            email: Masked::new("ada@example.com".to_string()),
            phone: None,
        },
        listing_type: listing.listing_type(),
        listing_id: listing.id,
        showtime_id: None,
        check_in: None,
        check_out: None,
        lines: vec![BookingLine {
            unit_id,
            name: "GA".to_string(),
            unit_price: 1000,
            quantity,
            nights: 1,
            gross,
            discount: 0,
            net: gross,
        }],
        subtotal: gross,
        discount_total: 0,
        coupon: None,
        total: gross,
        currency: "NGN".to_string(),
        status: BookingStatus::Pending,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// Sold count of the festival's only ticket type.
pub(crate) async fn sold(store: &dyn ListingRepository, listing_id: Uuid) -> i32 {
    match store.get_listing(listing_id).await.unwrap().unwrap().details {
        ListingDetails::Event { tickets, .. } => tickets[0].sold_count,
        _ => unreachable!(),
    }
}
