use std::collections::BTreeSet;

use tracing::info;

use super::domain::{
    Invoice, InvoiceDraft, InvoiceFilter, InvoiceId, InvoiceView, Payment, PaymentDraft,
    PaymentFilter, PaymentId,
};
use crate::clock::Clock;
use crate::error::DeliveryError;
use crate::money::Money;
use crate::store::{Database, Schema};

/// Invoices, payments and the client balance they drive. A client's
/// balance is what it still owes: invoices add to it, payments and invoice
/// deletion take from it.
pub struct BillingService<'a> {
    db: &'a Database,
    clock: &'a dyn Clock,
    vat_percent: u32,
}

impl<'a> BillingService<'a> {
    pub fn new(db: &'a Database, clock: &'a dyn Clock, vat_percent: u32) -> Self {
        Self {
            db,
            clock,
            vat_percent,
        }
    }

    pub fn create_invoice(&self, draft: InvoiceDraft) -> Result<InvoiceView, DeliveryError> {
        if draft.shipment_ids.is_empty() {
            return Err(DeliveryError::validation(
                "an invoice needs at least one shipment",
            ));
        }
        let shipment_ids: Vec<_> = draft
            .shipment_ids
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let now = self.clock.now();
        let vat_percent = self.vat_percent;

        self.db.write(|schema| {
            schema.clients.require(draft.client_id.0)?;
            let mut amount_ht = Money::ZERO;
            for shipment_id in &shipment_ids {
                let shipment = schema.shipments.require(shipment_id.0)?;
                if shipment.client_id != draft.client_id {
                    return Err(DeliveryError::validation(format!(
                        "shipment {} does not belong to client {}",
                        shipment.tracking_number, draft.client_id
                    )));
                }
                if let Some(existing) = invoice_of(schema, *shipment_id) {
                    return Err(DeliveryError::conflict(format!(
                        "shipment {} is already on invoice {existing}",
                        shipment.tracking_number
                    )));
                }
                amount_ht = amount_ht
                    .checked_add(shipment.total_price)
                    .ok_or_else(DeliveryError::amount_out_of_range)?;
            }
            let amount_tva = amount_ht
                .checked_percent(vat_percent)
                .ok_or_else(DeliveryError::amount_out_of_range)?;
            let amount_ttc = amount_ht
                .checked_add(amount_tva)
                .ok_or_else(DeliveryError::amount_out_of_range)?;
            let balance = schema
                .clients
                .require(draft.client_id.0)?
                .balance
                .checked_add(amount_ttc)
                .ok_or_else(DeliveryError::amount_out_of_range)?;

            let invoice = schema
                .invoices
                .insert_with(|id| Invoice {
                    id: InvoiceId(id),
                    client_id: draft.client_id,
                    shipment_ids,
                    amount_ht,
                    amount_tva,
                    amount_ttc,
                    vat_percent,
                    created_at: now,
                })
                .clone();
            schema.clients.require_mut(draft.client_id.0)?.balance = balance;
            info!(
                invoice_id = invoice.id.0,
                client_id = invoice.client_id.0,
                ttc = %invoice.amount_ttc,
                "invoice created"
            );
            Ok(InvoiceView::new(invoice, Vec::new()))
        })
    }

    pub fn register_payment(
        &self,
        invoice_id: InvoiceId,
        draft: PaymentDraft,
    ) -> Result<InvoiceView, DeliveryError> {
        if !draft.amount.is_positive() {
            return Err(DeliveryError::validation(
                "payment amount must be positive",
            ));
        }
        let now = self.clock.now();
        self.db.write(|schema| {
            let current = view(schema, invoice_id)?;
            if draft.amount > current.remaining_amount {
                return Err(DeliveryError::validation(format!(
                    "payment of {} exceeds the remaining {}",
                    draft.amount, current.remaining_amount
                )));
            }
            let client_id = current.invoice.client_id;
            let balance = schema
                .clients
                .require(client_id.0)?
                .balance
                .checked_sub(draft.amount)
                .ok_or_else(DeliveryError::amount_out_of_range)?;

            let payment = schema.payments.insert_with(|id| Payment {
                id: PaymentId(id),
                invoice_id,
                amount: draft.amount,
                method: draft.method,
                paid_at: now,
            });
            info!(
                invoice_id = invoice_id.0,
                payment_id = payment.id.0,
                amount = %payment.amount,
                method = ?payment.method,
                "payment registered"
            );
            schema.clients.require_mut(client_id.0)?.balance = balance;
            view(schema, invoice_id)
        })
    }

    pub fn get(&self, id: InvoiceId) -> Result<InvoiceView, DeliveryError> {
        self.db.read(|schema| view(schema, id))
    }

    /// Removes the invoice and its payments; the unpaid remainder is
    /// forgiven from the client balance.
    pub fn delete_invoice(&self, id: InvoiceId) -> Result<(), DeliveryError> {
        self.db.write(|schema| {
            let current = view(schema, id)?;
            let client_id = current.invoice.client_id;
            let balance = schema
                .clients
                .require(client_id.0)?
                .balance
                .checked_sub(current.remaining_amount)
                .ok_or_else(DeliveryError::amount_out_of_range)?;

            schema.payments.retain(|payment| payment.invoice_id != id);
            for reclamation in schema.reclamations.values_mut() {
                if reclamation.invoice_id == Some(id) {
                    reclamation.invoice_id = None;
                }
            }
            schema.invoices.remove(id.0);
            schema.clients.require_mut(client_id.0)?.balance = balance;
            info!(
                invoice_id = id.0,
                forgiven = %current.remaining_amount,
                "invoice deleted"
            );
            Ok(())
        })
    }

    pub fn list_invoices(&self, filter: &InvoiceFilter) -> Vec<InvoiceView> {
        self.db.read(|schema| {
            schema
                .invoices
                .values()
                .filter(|invoice| filter.client_id.map_or(true, |id| invoice.client_id == id))
                .filter(|invoice| {
                    filter
                        .date
                        .map_or(true, |day| invoice.created_at.date_naive() == day)
                })
                .map(|invoice| InvoiceView::new(invoice.clone(), payments_of(schema, invoice.id)))
                .collect()
        })
    }

    pub fn list_payments(&self, filter: &PaymentFilter) -> Vec<Payment> {
        self.db.read(|schema| {
            schema
                .payments
                .values()
                .filter(|payment| filter.invoice_id.map_or(true, |id| payment.invoice_id == id))
                .filter(|payment| filter.method.map_or(true, |method| payment.method == method))
                .cloned()
                .collect()
        })
    }
}

fn view(schema: &Schema, id: InvoiceId) -> Result<InvoiceView, DeliveryError> {
    let invoice = schema.invoices.require(id.0)?.clone();
    Ok(InvoiceView::new(invoice, payments_of(schema, id)))
}

fn payments_of(schema: &Schema, id: InvoiceId) -> Vec<Payment> {
    schema
        .payments
        .values()
        .filter(|payment| payment.invoice_id == id)
        .cloned()
        .collect()
}

fn invoice_of(schema: &Schema, shipment_id: crate::shipments::ShipmentId) -> Option<InvoiceId> {
    schema
        .invoices
        .values()
        .find(|invoice| invoice.shipment_ids.contains(&shipment_id))
        .map(|invoice| invoice.id)
}
