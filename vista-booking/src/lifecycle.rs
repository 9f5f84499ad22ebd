use vista_core::{BookingStatus, PaymentStatus};

use crate::error::{BookingError, BookingResult};

/// What a payment outcome does to a pending booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Confirm,
    Cancel,
    /// Payment still in flight, leave the booking pending.
    Hold,
}

impl Settlement {
    pub fn for_payment(status: PaymentStatus) -> Self {
        match status {
            PaymentStatus::Success => Settlement::Confirm,
            PaymentStatus::Failed | PaymentStatus::Abandoned => Settlement::Cancel,
            PaymentStatus::Pending => Settlement::Hold,
        }
    }

    pub fn target(&self) -> Option<BookingStatus> {
        match self {
            Settlement::Confirm => Some(BookingStatus::Confirmed),
            Settlement::Cancel => Some(BookingStatus::Cancelled),
            Settlement::Hold => None,
        }
    }
}

/// Whether an explorer cancel should run: `Ok(true)` for a pending booking,
/// `Ok(false)` when it is already cancelled.
pub fn ensure_cancellable(status: BookingStatus) -> BookingResult<bool> {
    match status {
        BookingStatus::Pending => Ok(true),
        BookingStatus::Cancelled => Ok(false),
        BookingStatus::Confirmed => Err(BookingError::InvalidInput(
            "A confirmed booking cannot be cancelled here".into(),
        )),
    }
}
