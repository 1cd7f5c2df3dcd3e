pub mod bookings;
pub mod documents;
pub mod quotations;

pub use bookings::{BookingService, DealerIdentity, ResolveOutcome, SubmitOutcome};
pub use documents::{DocumentOutcome, DocumentRenderer};
pub use quotations::QuotationService;

use showroom_core::errors::ApplicationError;
use showroom_db::repositories::RepositoryError;

pub(crate) fn persistence(error: RepositoryError) -> ApplicationError {
    ApplicationError::Persistence(error.to_string())
}
