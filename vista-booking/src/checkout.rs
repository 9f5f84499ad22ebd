//! Turns a checkout request into a priced, pending [`Booking`].
//!
//! Everything here is pure: the listing is passed in as read, nothing is persisted.
//! The inventory check is repeated inside the booking transaction, this pass only
//! rejects requests that cannot succeed early and prices the rest.

use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashSet;
use uuid::Uuid;
use vista_catalog::{coupon, inventory, InventoryUnit, LineQuote, Listing, ListingDetails, PricingEngine};
use vista_core::booking::generate_reference;
use vista_core::{AppliedCoupon, Booking, BookingLine, BookingStatus, Contact, Principal};
use vista_shared::Masked;

use crate::error::{BookingError, BookingResult};
use crate::models::{ContactDetails, CreateBookingRequest, ItemSelection};

#[derive(Debug, Clone)]
pub struct CheckoutRules {
    pub max_quantity_per_line: i32,
    pub max_nights: i64,
}

impl Default for CheckoutRules {
    fn default() -> Self {
        Self {
            max_quantity_per_line: 20,
            max_nights: 30,
        }
    }
}

pub struct CheckoutPlanner {
    rules: CheckoutRules,
}

impl CheckoutPlanner {
    pub fn new(rules: CheckoutRules) -> Self {
        Self { rules }
    }

    pub fn plan(
        &self,
        explorer: &Principal,
        req: &CreateBookingRequest,
        listing: &Listing,
        now: DateTime<Utc>,
    ) -> BookingResult<Booking> {
        let coupon = match req.coupon_code.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            Some(code) => Some(
                coupon::lookup(code)
                    .ok_or_else(|| BookingError::InvalidInput(format!("Coupon code '{}' is not valid", code)))?,
            ),
            None => None,
        };
        let contact = contact_for(explorer, req.contact.as_ref())?;

        let mut showtime_id = None;
        let mut stay = None;

        let lines = match &listing.details {
            ListingDetails::Event { starts_at, ends_at, tickets } => {
                if ends_at.unwrap_or(*starts_at) <= now {
                    return Err(BookingError::InvalidInput("This event has already taken place".into()));
                }
                self.price_units(tickets, &req.items, 1, now)?
            }
            ListingDetails::Accommodation { rooms } => {
                let (check_in, check_out, nights) = self.stay(req.check_in, req.check_out, now)?;
                stay = Some((check_in, check_out));
                self.price_units(rooms, &req.items, nights, now)?
            }
            ListingDetails::Movie { showtimes, .. } => {
                let id = req
                    .showtime_id
                    .ok_or_else(|| BookingError::InvalidInput("showtime_id is required for movie bookings".into()))?;
                let showtime = showtimes
                    .iter()
                    .find(|s| s.id == id)
                    .ok_or_else(|| BookingError::InvalidInput("Showtime does not belong to this movie".into()))?;
                if showtime.starts_at <= now {
                    return Err(BookingError::InvalidInput("This showtime has already started".into()));
                }
                showtime_id = Some(id);
                self.price_units(&showtime.tickets, &req.items, 1, now)?
            }
            ListingDetails::Leisure { available_until, tickets } => {
                if available_until.is_some_and(|until| until <= now) {
                    return Err(BookingError::InvalidInput("This activity is no longer available".into()));
                }
                self.price_units(tickets, &req.items, 1, now)?
            }
        };

        let totals = PricingEngine::summarize(&lines, coupon.as_ref())?;

        Ok(Booking {
            id: Uuid::new_v4(),
            reference: generate_reference(),
            explorer_id: explorer.id,
            contact,
            listing_type: listing.listing_type(),
            listing_id: listing.id,
            showtime_id,
            check_in: stay.map(|(check_in, _)| check_in),
            check_out: stay.map(|(_, check_out)| check_out),
            lines: lines.into_iter().map(BookingLine::from).collect(),
            subtotal: totals.subtotal,
            discount_total: totals.discount_total,
            coupon: coupon.map(|c| AppliedCoupon {
                code: c.code.to_string(),
                discount: totals.coupon_discount,
            }),
            total: totals.total,
            currency: listing.currency.clone(),
            status: BookingStatus::Pending,
            created_at: now,
            updated_at: now,
        })
    }

    fn price_units<U: InventoryUnit>(
        &self,
        units: &[U],
        items: &[ItemSelection],
        nights: i32,
        now: DateTime<Utc>,
    ) -> BookingResult<Vec<LineQuote>> {
        if items.is_empty() {
            return Err(BookingError::InvalidInput("Select at least one ticket or room".into()));
        }

        let mut seen = HashSet::new();
        items
            .iter()
            .map(|item| {
                if !seen.insert(item.unit_id) {
                    return Err(BookingError::InvalidInput(format!(
                        "Item {} appears more than once",
                        item.unit_id
                    )));
                }
                if item.quantity < 1 || item.quantity > self.rules.max_quantity_per_line {
                    return Err(BookingError::InvalidInput(format!(
                        "Quantity must be between 1 and {}",
                        self.rules.max_quantity_per_line
                    )));
                }
                let unit = units.iter().find(|u| u.id() == item.unit_id).ok_or_else(|| {
                    BookingError::InvalidInput(format!("Unknown ticket or room type: {}", item.unit_id))
                })?;

                inventory::check_availability(unit, item.quantity)?;

                Ok(PricingEngine::quote_line(unit, item.quantity, nights, now)?)
            })
            .collect()
    }

    fn stay(
        &self,
        check_in: Option<NaiveDate>,
        check_out: Option<NaiveDate>,
        now: DateTime<Utc>,
    ) -> BookingResult<(NaiveDate, NaiveDate, i32)> {
        let (check_in, check_out) = match (check_in, check_out) {
            (Some(i), Some(o)) => (i, o),
            _ => {
                return Err(BookingError::InvalidInput(
                    "check_in and check_out are required for accommodation bookings".into(),
                ))
            }
        };
        if check_in < now.date_naive() {
            return Err(BookingError::InvalidInput("check_in cannot be in the past".into()));
        }
        let nights = (check_out - check_in).num_days();
        if nights < 1 {
            return Err(BookingError::InvalidInput("check_out must be after check_in".into()));
        }
        if nights > self.rules.max_nights {
            return Err(BookingError::InvalidInput(format!(
                "Stays are limited to {} nights",
                self.rules.max_nights
            )));
        }
        Ok((check_in, check_out, nights as i32))
    }
}

fn contact_for(explorer: &Principal, details: Option<&ContactDetails>) -> BookingResult<Contact> {
    let details = details.cloned().unwrap_or_default();
    let email = details
        .email
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| explorer.email.clone());

    if !email.contains('@') {
        return Err(BookingError::InvalidInput("A valid contact email is required".into()));
    }

    Ok(Contact {
        full_name: details.full_name.filter(|n| !n.trim().is_empty()),
        email: Masked::new(email),
        phone: details.phone.filter(|p| !p.trim().is_empty()),
    })
}
