pub mod checkout;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod orchestrator;
pub mod service;

pub use checkout::{CheckoutPlanner, CheckoutRules};
pub use error::{BookingError, BookingResult};
pub use lifecycle::Settlement;
pub use models::{BookingReceipt, ContactDetails, CreateBookingRequest, ItemSelection, PaymentNotification};
pub use orchestrator::PaymentOrchestrator;
pub use service::BookingService;
