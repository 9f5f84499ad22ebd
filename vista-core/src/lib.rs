pub mod booking;
pub mod identity;
pub mod payment;
pub mod repository;

pub use booking::{AppliedCoupon, Booking, BookingLine, BookingStatus, Contact};
pub use identity::{Principal, Role};
pub use payment::{GatewayError, Payment, PaymentGateway, PaymentStatus};
pub use repository::{BookingRepository, ListingRepository, PaymentRepository, RepoError, RepoResult};
