use chrono::{DateTime, Utc};
use tracing::info;

use super::domain::{
    CompletionReport, StopView, Tour, TourDetail, TourDraft, TourExportRow, TourFilter, TourId,
    TourListing, TourPatch, TourStats, TourStatus, TourStop, TourStopId,
};
use super::journal::{self, JournalPeriod, TourJournal};
use crate::catalog::{DriverId, VehicleId};
use crate::clock::Clock;
use crate::error::DeliveryError;
use crate::export::CsvExport;
use crate::shipments::workflow;
use crate::shipments::{ShipmentId, ShipmentStatus};
use crate::store::{Database, Schema};

pub struct TourService<'a> {
    db: &'a Database,
    clock: &'a dyn Clock,
}

impl<'a> TourService<'a> {
    pub fn new(db: &'a Database, clock: &'a dyn Clock) -> Self {
        Self { db, clock }
    }

    pub fn create(&self, draft: TourDraft) -> Result<Tour, DeliveryError> {
        let now = self.clock.now();
        self.db.write(|schema| {
            require_crew(schema, draft.driver_id, draft.vehicle_id)?;
            let tour = schema.tours.insert_with(|id| Tour {
                id: TourId(id),
                driver_id: draft.driver_id,
                vehicle_id: draft.vehicle_id,
                tour_date: draft.tour_date,
                starting_hour: None,
                finishing_hour: None,
                kilometers: 0.0,
                fuel_consumption: 0.0,
                status: TourStatus::Pending,
                comments: draft.comments.trim().to_string(),
                has_delay: false,
                delay_minutes: 0,
                has_technical_issue: false,
                technical_issue_description: String::new(),
                created_at: now,
                updated_at: now,
            });
            info!(tour_id = tour.id.0, date = %tour.tour_date, "tour planned");
            Ok(tour.clone())
        })
    }

    pub fn update(&self, id: TourId, patch: TourPatch) -> Result<Tour, DeliveryError> {
        let now = self.clock.now();
        self.db.write(|schema| {
            let tour = schema.tours.require(id.0)?;
            if tour.status.is_closed() {
                return Err(DeliveryError::TourState(format!(
                    "tour {id} is {} and read-only",
                    tour.status
                )));
            }
            require_crew(schema, patch.driver_id, patch.vehicle_id)?;

            let tour = schema.tours.require_mut(id.0)?;
            if let Some(driver_id) = patch.driver_id {
                tour.driver_id = Some(driver_id);
            }
            if let Some(vehicle_id) = patch.vehicle_id {
                tour.vehicle_id = Some(vehicle_id);
            }
            if let Some(tour_date) = patch.tour_date {
                tour.tour_date = tour_date;
            }
            if let Some(comments) = patch.comments {
                tour.comments = comments.trim().to_string();
            }
            tour.updated_at = now;
            Ok(tour.clone())
        })
    }

    pub fn add_shipment(
        &self,
        tour_id: TourId,
        shipment_id: ShipmentId,
    ) -> Result<TourDetail, DeliveryError> {
        let now = self.clock.now();
        self.db.write(|schema| {
            require_pending(schema, tour_id)?;
            let shipment = schema.shipments.require(shipment_id.0)?;
            if shipment.status != ShipmentStatus::Registered {
                return Err(DeliveryError::conflict(format!(
                    "shipment {} is {} and cannot join a tour",
                    shipment.tracking_number, shipment.status
                )));
            }
            if let Some(current) = shipment.tour_id {
                return Err(DeliveryError::conflict(format!(
                    "shipment {} is already on tour {current}",
                    shipment.tracking_number
                )));
            }
            attach(schema, tour_id, shipment_id);
            touch(schema, tour_id, now)?;
            detail(schema, tour_id)
        })
    }

    pub fn remove_shipment(
        &self,
        tour_id: TourId,
        shipment_id: ShipmentId,
    ) -> Result<TourDetail, DeliveryError> {
        let now = self.clock.now();
        self.db.write(|schema| {
            require_pending(schema, tour_id)?;
            let on_tour = schema
                .tour_stops
                .values()
                .any(|stop| stop.tour_id == tour_id && stop.shipment_id == shipment_id);
            if !on_tour {
                return Err(DeliveryError::NotFound {
                    entity: TourStopId::ENTITY,
                    id: shipment_id.0,
                });
            }
            schema
                .tour_stops
                .retain(|stop| !(stop.tour_id == tour_id && stop.shipment_id == shipment_id));
            if let Some(shipment) = schema.shipments.get_mut(shipment_id.0) {
                shipment.tour_id = None;
            }
            touch(schema, tour_id, now)?;
            detail(schema, tour_id)
        })
    }

    /// Sends the tour out: registered shipments on it move to transit.
    pub fn start(&self, id: TourId) -> Result<TourDetail, DeliveryError> {
        let now = self.clock.now();
        self.db.write(|schema| {
            let tour = schema.tours.require(id.0)?;
            if tour.status != TourStatus::Pending {
                return Err(DeliveryError::TourState(format!(
                    "tour {id} is {} and cannot start",
                    tour.status
                )));
            }
            if tour.driver_id.is_none() || tour.vehicle_id.is_none() {
                return Err(DeliveryError::TourState(format!(
                    "tour {id} needs a driver and a vehicle before it starts"
                )));
            }
            let shipments = stop_shipments(schema, id);
            if shipments.is_empty() {
                return Err(DeliveryError::TourState(format!(
                    "tour {id} has no shipments"
                )));
            }

            let tour = schema.tours.require_mut(id.0)?;
            tour.status = TourStatus::InProgress;
            tour.starting_hour = Some(now);
            tour.updated_at = now;
            let mut moved = 0;
            for shipment_id in shipments {
                let registered = schema
                    .shipments
                    .get(shipment_id.0)
                    .is_some_and(|shipment| shipment.status == ShipmentStatus::Registered);
                if registered
                    && workflow::apply(schema, shipment_id, ShipmentStatus::Transit, None, now)?
                {
                    moved += 1;
                }
            }
            info!(tour_id = id.0, shipments_in_transit = moved, "tour started");
            detail(schema, id)
        })
    }

    /// Closes the tour with the driver's report. Delivered stops move their
    /// shipments to delivered, the rest still in transit go back to sorting.
    /// Without an explicit list, every stop that can still be delivered is.
    pub fn complete(
        &self,
        id: TourId,
        report: CompletionReport,
    ) -> Result<TourDetail, DeliveryError> {
        let now = self.clock.now();
        self.db.write(|schema| {
            let tour = schema.tours.require(id.0)?;
            if tour.status != TourStatus::InProgress {
                return Err(DeliveryError::TourState(format!(
                    "tour {id} is {} and cannot be completed",
                    tour.status
                )));
            }
            ensure_measure("kilometers", report.kilometers)?;
            ensure_measure("fuel_consumption", report.fuel_consumption)?;

            let on_tour = stop_shipments(schema, id);
            let delivered = match &report.delivered {
                Some(listed) => {
                    if let Some(stray) = listed.iter().find(|shipment| !on_tour.contains(shipment)) {
                        return Err(DeliveryError::validation(format!(
                            "shipment {stray} is not on tour {id}"
                        )));
                    }
                    let mut listed = listed.clone();
                    listed.sort();
                    listed.dedup();
                    listed
                }
                // stops diverted during the run (failed, back at sorting) stay out
                None => on_tour
                    .iter()
                    .copied()
                    .filter(|shipment_id| {
                        schema.shipments.get(shipment_id.0).is_some_and(|shipment| {
                            shipment.status == ShipmentStatus::Delivered
                                || shipment.status.can_transition_to(ShipmentStatus::Delivered)
                        })
                    })
                    .collect(),
            };
            for shipment_id in &delivered {
                workflow::check(schema, *shipment_id, ShipmentStatus::Delivered)?;
            }

            let tour = schema.tours.require_mut(id.0)?;
            tour.status = TourStatus::Completed;
            tour.finishing_hour = Some(now);
            tour.kilometers = report.kilometers;
            tour.fuel_consumption = report.fuel_consumption;
            tour.has_delay = report.has_delay;
            tour.delay_minutes = if report.has_delay { report.delay_minutes } else { 0 };
            tour.has_technical_issue = report.has_technical_issue;
            tour.technical_issue_description = report.technical_issue_description.trim().to_string();
            if let Some(comments) = report.comments {
                tour.comments = comments.trim().to_string();
            }
            tour.updated_at = now;

            for stop in schema.tour_stops.values_mut() {
                if stop.tour_id == id && delivered.contains(&stop.shipment_id) {
                    stop.delivered = true;
                    stop.delivered_at = Some(now);
                }
            }
            for shipment_id in &on_tour {
                if delivered.contains(shipment_id) {
                    workflow::apply(schema, *shipment_id, ShipmentStatus::Delivered, None, now)?;
                } else if schema
                    .shipments
                    .get(shipment_id.0)
                    .is_some_and(|shipment| shipment.status == ShipmentStatus::Transit)
                {
                    workflow::apply(schema, *shipment_id, ShipmentStatus::Sorting, None, now)?;
                }
            }
            info!(
                tour_id = id.0,
                delivered = delivered.len(),
                returned = on_tour.len() - delivered.len(),
                "tour completed"
            );
            detail(schema, id)
        })
    }

    /// Cancels a pending tour. Its shipments keep their status and leave the tour.
    pub fn cancel(&self, id: TourId) -> Result<Tour, DeliveryError> {
        let now = self.clock.now();
        self.db.write(|schema| {
            let tour = schema.tours.require(id.0)?;
            if tour.status != TourStatus::Pending {
                return Err(DeliveryError::TourState(format!(
                    "tour {id} is {} and cannot be cancelled",
                    tour.status
                )));
            }
            detach_all(schema, id);
            let tour = schema.tours.require_mut(id.0)?;
            tour.status = TourStatus::Cancelled;
            tour.updated_at = now;
            info!(tour_id = id.0, "tour cancelled");
            Ok(tour.clone())
        })
    }

    pub fn delete(&self, id: TourId) -> Result<(), DeliveryError> {
        self.db.write(|schema| {
            let tour = schema.tours.require(id.0)?;
            if tour.status == TourStatus::InProgress {
                return Err(DeliveryError::TourState(format!(
                    "tour {id} is in progress"
                )));
            }
            if schema
                .incidents
                .values()
                .any(|incident| incident.tour_id == Some(id))
            {
                return Err(DeliveryError::conflict(format!("tour {id} has incidents")));
            }
            detach_all(schema, id);
            schema.tours.remove(id.0);
            info!(tour_id = id.0, "tour deleted");
            Ok(())
        })
    }

    pub fn get(&self, id: TourId) -> Result<TourDetail, DeliveryError> {
        self.db.read(|schema| detail(schema, id))
    }

    pub fn list(&self, filter: &TourFilter) -> TourListing {
        self.db.read(|schema| {
            let needle = filter
                .q
                .as_deref()
                .map(|q| q.trim().to_lowercase())
                .filter(|q| !q.is_empty());
            let tours: Vec<Tour> = schema
                .tours
                .values()
                .filter(|tour| filter.status.map_or(true, |status| tour.status == status))
                .filter(|tour| match &needle {
                    None => true,
                    Some(needle) => search_text(schema, tour).contains(needle.as_str()),
                })
                .cloned()
                .collect();
            let stats = tours.iter().fold(TourStats::default(), |mut stats, tour| {
                stats.total += 1;
                match tour.status {
                    TourStatus::Pending => stats.pending += 1,
                    TourStatus::InProgress => stats.in_progress += 1,
                    TourStatus::Completed => stats.completed += 1,
                    TourStatus::Cancelled => {}
                }
                stats.total_km += tour.kilometers;
                stats.total_fuel += tour.fuel_consumption;
                stats
            });
            TourListing { tours, stats }
        })
    }

    pub fn journal(&self, period: JournalPeriod) -> TourJournal {
        let today = self.clock.today();
        self.db.read(|schema| journal::build(schema, period, today))
    }

    pub fn export(&self) -> Result<CsvExport, DeliveryError> {
        self.db.read(|schema| {
            let rows: Vec<TourExportRow> = schema
                .tours
                .values()
                .map(|tour| TourExportRow {
                    tour: tour.clone(),
                    driver_name: driver_name(schema, tour.driver_id),
                    vehicle_plate: vehicle_plate(schema, tour.vehicle_id),
                    shipment_count: stop_shipments(schema, tour.id).len(),
                })
                .collect();
            CsvExport::build("tours", rows.iter())
        })
    }
}

/// Fails unless the tour exists and has not started.
pub(crate) fn require_pending(schema: &Schema, tour_id: TourId) -> Result<(), DeliveryError> {
    let tour = schema.tours.require(tour_id.0)?;
    if tour.status == TourStatus::Pending {
        Ok(())
    } else {
        Err(DeliveryError::TourState(format!(
            "tour {tour_id} is {} and no longer accepts shipments",
            tour.status
        )))
    }
}

/// Appends the shipment as the tour's last stop.
pub(crate) fn attach(schema: &mut Schema, tour_id: TourId, shipment_id: ShipmentId) {
    let order = schema
        .tour_stops
        .values()
        .filter(|stop| stop.tour_id == tour_id)
        .map(|stop| stop.order)
        .max()
        .unwrap_or(0)
        + 1;
    schema.tour_stops.insert_with(|id| TourStop {
        id: TourStopId(id),
        tour_id,
        shipment_id,
        order,
        delivered: false,
        delivered_at: None,
        notes: String::new(),
    });
    if let Some(shipment) = schema.shipments.get_mut(shipment_id.0) {
        shipment.tour_id = Some(tour_id);
    }
}

fn detach_all(schema: &mut Schema, tour_id: TourId) {
    for shipment_id in stop_shipments(schema, tour_id) {
        if let Some(shipment) = schema.shipments.get_mut(shipment_id.0) {
            shipment.tour_id = None;
        }
    }
    schema.tour_stops.retain(|stop| stop.tour_id != tour_id);
}

fn stop_shipments(schema: &Schema, tour_id: TourId) -> Vec<ShipmentId> {
    let mut stops: Vec<&TourStop> = schema
        .tour_stops
        .values()
        .filter(|stop| stop.tour_id == tour_id)
        .collect();
    stops.sort_by_key(|stop| stop.order);
    stops.into_iter().map(|stop| stop.shipment_id).collect()
}

fn require_crew(
    schema: &Schema,
    driver_id: Option<DriverId>,
    vehicle_id: Option<VehicleId>,
) -> Result<(), DeliveryError> {
    if let Some(driver_id) = driver_id {
        schema.drivers.require(driver_id.0)?;
    }
    if let Some(vehicle_id) = vehicle_id {
        schema.vehicles.require(vehicle_id.0)?;
    }
    Ok(())
}

fn touch(schema: &mut Schema, tour_id: TourId, now: DateTime<Utc>) -> Result<(), DeliveryError> {
    schema.tours.require_mut(tour_id.0)?.updated_at = now;
    Ok(())
}

fn ensure_measure(field: &str, value: f64) -> Result<(), DeliveryError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(DeliveryError::validation(format!(
            "{field} cannot be negative"
        )))
    }
}

fn driver_name(schema: &Schema, driver_id: Option<DriverId>) -> Option<String> {
    driver_id
        .and_then(|id| schema.drivers.get(id.0))
        .map(|driver| driver.full_name())
}

fn vehicle_plate(schema: &Schema, vehicle_id: Option<VehicleId>) -> Option<String> {
    vehicle_id
        .and_then(|id| schema.vehicles.get(id.0))
        .map(|vehicle| vehicle.plate_number.clone())
}

fn search_text(schema: &Schema, tour: &Tour) -> String {
    let mut text = tour.comments.to_lowercase();
    if let Some(name) = driver_name(schema, tour.driver_id) {
        text.push(' ');
        text.push_str(&name.to_lowercase());
    }
    if let Some(plate) = vehicle_plate(schema, tour.vehicle_id) {
        text.push(' ');
        text.push_str(&plate.to_lowercase());
    }
    text
}

pub(crate) fn detail(schema: &Schema, id: TourId) -> Result<TourDetail, DeliveryError> {
    let tour = schema.tours.require(id.0)?.clone();
    let mut stops: Vec<StopView> = schema
        .tour_stops
        .values()
        .filter(|stop| stop.tour_id == id)
        .filter_map(|stop| {
            schema.shipments.get(stop.shipment_id.0).map(|shipment| StopView {
                stop: stop.clone(),
                tracking_number: shipment.tracking_number.clone(),
                status: shipment.status,
                weight_kg: shipment.weight_kg,
                volume_m3: shipment.volume_m3,
            })
        })
        .collect();
    stops.sort_by_key(|view| view.stop.order);

    Ok(TourDetail {
        driver_name: driver_name(schema, tour.driver_id),
        vehicle_plate: vehicle_plate(schema, tour.vehicle_id),
        shipment_count: stops.len(),
        delivered_count: stops.iter().filter(|view| view.stop.delivered).count(),
        total_weight: stops.iter().map(|view| view.weight_kg).sum(),
        total_volume: stops.iter().map(|view| view.volume_m3).sum(),
        stops,
        tour,
    })
}
