use vista_catalog::{CatalogError, InventoryError};
use vista_core::{GatewayError, RepoError};

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    /// The request was well formed but cannot be fulfilled, e.g. sold out.
    #[error("{0}")]
    BookingFailed(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("{0}")]
    Internal(String),
}

impl From<RepoError> for BookingError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(what) => BookingError::NotFound(what),
            e @ RepoError::CapacityExceeded { .. } => BookingError::BookingFailed(e.to_string()),
            e => BookingError::Internal(e.to_string()),
        }
    }
}

impl From<InventoryError> for BookingError {
    fn from(err: InventoryError) -> Self {
        match err {
            e @ InventoryError::InsufficientInventory { .. } => BookingError::BookingFailed(e.to_string()),
            e => BookingError::InvalidInput(e.to_string()),
        }
    }
}

impl From<CatalogError> for BookingError {
    fn from(err: CatalogError) -> Self {
        BookingError::InvalidInput(err.to_string())
    }
}

pub type BookingResult<T> = Result<T, BookingError>;
