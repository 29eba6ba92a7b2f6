use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::ClientId;
use crate::money::Money;
use crate::shipments::ShipmentId;
use crate::store::record_id;

record_id!(InvoiceId, "invoice");
record_id!(PaymentId, "payment");

/// Invoice over a set of a client's shipments. Amounts are frozen at
/// creation: `ht` before tax, `tva` the tax, `ttc` the total due.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub client_id: ClientId,
    pub shipment_ids: Vec<ShipmentId>,
    pub amount_ht: Money,
    pub amount_tva: Money,
    pub amount_ttc: Money,
    pub vat_percent: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    BankTransfer,
    Cheque,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub invoice_id: InvoiceId,
    pub amount: Money,
    pub method: PaymentMethod,
    pub paid_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    Unpaid,
    PartiallyPaid,
    Paid,
}

impl PaymentState {
    pub fn of(total_due: Money, total_paid: Money) -> Self {
        if !total_paid.is_positive() {
            Self::Unpaid
        } else if total_paid < total_due {
            Self::PartiallyPaid
        } else {
            Self::Paid
        }
    }
}

/// Invoice with its settlement figures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceView {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub total_paid: Money,
    pub remaining_amount: Money,
    pub payment_state: PaymentState,
    pub payments: Vec<Payment>,
}

impl InvoiceView {
    pub fn new(invoice: Invoice, payments: Vec<Payment>) -> Self {
        let total_paid: Money = payments.iter().map(|payment| payment.amount).sum();
        Self {
            remaining_amount: invoice.amount_ttc - total_paid,
            payment_state: PaymentState::of(invoice.amount_ttc, total_paid),
            total_paid,
            invoice,
            payments,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceDraft {
    pub client_id: ClientId,
    pub shipment_ids: Vec<ShipmentId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDraft {
    pub amount: Money,
    pub method: PaymentMethod,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvoiceFilter {
    #[serde(default)]
    pub client_id: Option<ClientId>,
    /// Matches the creation day.
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentFilter {
    #[serde(default)]
    pub invoice_id: Option<InvoiceId>,
    #[serde(default)]
    pub method: Option<PaymentMethod>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_state_follows_paid_amount() {
        let due = Money::from_cents(11_900);
        assert_eq!(PaymentState::of(due, Money::ZERO), PaymentState::Unpaid);
        assert_eq!(
            PaymentState::of(due, Money::from_cents(5_000)),
            PaymentState::PartiallyPaid
        );
        assert_eq!(PaymentState::of(due, due), PaymentState::Paid);
    }
}
