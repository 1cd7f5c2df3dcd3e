use showroom_core::domain::quotation::Quotation;
use showroom_core::errors::ApplicationError;

/// Seam for the external system that turns a quotation into a shareable
/// document. The service only records the returned reference; rendering is
/// someone else's problem.
pub trait DocumentRenderer: Send + Sync {
    fn render(&self, quotation: &Quotation) -> Result<String, ApplicationError>;
}

/// Outcome of a document request against a quotation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentOutcome {
    pub reference: String,
    /// False when the stored document already matched the current
    /// selections and was reused as-is.
    pub regenerated: bool,
}
