//! Invoicing, payments and client balances.

pub mod domain;
pub mod router;
pub mod service;

pub use domain::{
    Invoice, InvoiceDraft, InvoiceFilter, InvoiceId, InvoiceView, Payment, PaymentDraft,
    PaymentFilter, PaymentId, PaymentMethod, PaymentState,
};
pub use router::billing_routes;
pub use service::BillingService;
