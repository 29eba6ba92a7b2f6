use serde::Deserialize;
use tracing::info;

use super::domain::{
    Client, ClientDraft, ClientId, Destination, DestinationDraft, DestinationId, Driver,
    DriverDraft, DriverId, ServiceType, ServiceTypeDraft, ServiceTypeId, Vehicle, VehicleDraft,
    VehicleId, Zone, ZoneDraft, ZoneId,
};
use crate::clock::Clock;
use crate::error::DeliveryError;
use crate::export::CsvExport;
use crate::money::Money;
use crate::store::{Database, Schema, Table};

/// Free-text filter shared by the reference-data listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogQuery {
    #[serde(default)]
    pub q: Option<String>,
}

impl CatalogQuery {
    pub fn search(text: &str) -> Self {
        Self {
            q: Some(text.to_string()),
        }
    }

    fn matches(&self, fields: &[&str]) -> bool {
        match self.q.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(needle) => {
                let needle = needle.to_lowercase();
                fields
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
            }
        }
    }
}

/// CRUD over clients, drivers, vehicles, zones, destinations and service types.
pub struct CatalogService<'a> {
    db: &'a Database,
    clock: &'a dyn Clock,
}

impl<'a> CatalogService<'a> {
    pub fn new(db: &'a Database, clock: &'a dyn Clock) -> Self {
        Self { db, clock }
    }

    pub fn list_clients(&self, query: &CatalogQuery) -> Vec<Client> {
        self.db.read(|schema| {
            schema
                .clients
                .values()
                .filter(|client| {
                    query.matches(&[&client.name, &client.code, &client.email, &client.phone])
                })
                .cloned()
                .collect()
        })
    }

    pub fn client(&self, id: ClientId) -> Result<Client, DeliveryError> {
        self.db.read(|schema| schema.clients.require(id.0).cloned())
    }

    pub fn create_client(&self, draft: ClientDraft) -> Result<Client, DeliveryError> {
        draft.validate()?;
        let created_at = self.clock.now();
        self.db.write(|schema| {
            ensure_client_unique(schema, None, &draft)?;
            let client = schema.clients.insert_with(|id| Client {
                id: ClientId(id),
                code: draft.code.trim().to_string(),
                name: draft.name.trim().to_string(),
                phone: draft.phone.trim().to_string(),
                email: draft.email.trim().to_string(),
                address: draft.address.trim().to_string(),
                client_type: draft.client_type.trim().to_string(),
                balance: Money::ZERO,
                created_at,
            });
            info!(client_id = client.id.0, code = %client.code, "client created");
            Ok(client.clone())
        })
    }

    pub fn update_client(&self, id: ClientId, draft: ClientDraft) -> Result<Client, DeliveryError> {
        draft.validate()?;
        self.db.write(|schema| {
            schema.clients.require(id.0)?;
            ensure_client_unique(schema, Some(id), &draft)?;
            let client = schema.clients.require_mut(id.0)?;
            client.code = draft.code.trim().to_string();
            client.name = draft.name.trim().to_string();
            client.phone = draft.phone.trim().to_string();
            client.email = draft.email.trim().to_string();
            client.address = draft.address.trim().to_string();
            client.client_type = draft.client_type.trim().to_string();
            Ok(client.clone())
        })
    }

    pub fn delete_client(&self, id: ClientId) -> Result<(), DeliveryError> {
        self.db.write(|schema| {
            schema.clients.require(id.0)?;
            if schema.shipments.values().any(|s| s.client_id == id) {
                return Err(DeliveryError::conflict(format!(
                    "client {id} still has shipments"
                )));
            }
            if schema.invoices.values().any(|invoice| invoice.client_id == id) {
                return Err(DeliveryError::conflict(format!(
                    "client {id} still has invoices"
                )));
            }
            if schema.reclamations.values().any(|r| r.client_id == id) {
                return Err(DeliveryError::conflict(format!(
                    "client {id} still has reclamations"
                )));
            }
            schema.clients.remove(id.0);
            info!(client_id = id.0, "client deleted");
            Ok(())
        })
    }

    pub fn export_clients(&self) -> Result<CsvExport, DeliveryError> {
        self.db
            .read(|schema| CsvExport::build("clients", schema.clients.values()))
    }

    pub fn list_drivers(&self, query: &CatalogQuery) -> Vec<Driver> {
        self.db.read(|schema| {
            schema
                .drivers
                .values()
                .filter(|driver| {
                    query.matches(&[
                        &driver.first_name,
                        &driver.last_name,
                        &driver.license_number,
                        &driver.phone,
                    ])
                })
                .cloned()
                .collect()
        })
    }

    pub fn driver(&self, id: DriverId) -> Result<Driver, DeliveryError> {
        self.db.read(|schema| schema.drivers.require(id.0).cloned())
    }

    pub fn create_driver(&self, draft: DriverDraft) -> Result<Driver, DeliveryError> {
        draft.validate()?;
        self.db.write(|schema| {
            ensure_unique(
                &schema.drivers,
                None,
                |driver| (driver.id.0, driver.license_number.as_str()),
                &draft.license_number,
                "license_number",
            )?;
            let driver = schema.drivers.insert_with(|id| Driver {
                id: DriverId(id),
                first_name: draft.first_name.trim().to_string(),
                last_name: draft.last_name.trim().to_string(),
                license_number: draft.license_number.trim().to_string(),
                phone: draft.phone.trim().to_string(),
                available: draft.available,
            });
            info!(driver_id = driver.id.0, "driver created");
            Ok(driver.clone())
        })
    }

    pub fn update_driver(&self, id: DriverId, draft: DriverDraft) -> Result<Driver, DeliveryError> {
        draft.validate()?;
        self.db.write(|schema| {
            schema.drivers.require(id.0)?;
            ensure_unique(
                &schema.drivers,
                Some(id.0),
                |driver| (driver.id.0, driver.license_number.as_str()),
                &draft.license_number,
                "license_number",
            )?;
            let driver = schema.drivers.require_mut(id.0)?;
            driver.first_name = draft.first_name.trim().to_string();
            driver.last_name = draft.last_name.trim().to_string();
            driver.license_number = draft.license_number.trim().to_string();
            driver.phone = draft.phone.trim().to_string();
            driver.available = draft.available;
            Ok(driver.clone())
        })
    }

    pub fn delete_driver(&self, id: DriverId) -> Result<(), DeliveryError> {
        self.db.write(|schema| {
            schema.drivers.require(id.0)?;
            if schema.tours.values().any(|tour| tour.driver_id == Some(id)) {
                return Err(DeliveryError::conflict(format!(
                    "driver {id} is assigned to a tour"
                )));
            }
            schema.drivers.remove(id.0);
            info!(driver_id = id.0, "driver deleted");
            Ok(())
        })
    }

    pub fn export_drivers(&self) -> Result<CsvExport, DeliveryError> {
        self.db
            .read(|schema| CsvExport::build("drivers", schema.drivers.values()))
    }

    pub fn list_vehicles(&self, query: &CatalogQuery) -> Vec<Vehicle> {
        self.db.read(|schema| {
            schema
                .vehicles
                .values()
                .filter(|vehicle| query.matches(&[&vehicle.plate_number, &vehicle.vehicle_type]))
                .cloned()
                .collect()
        })
    }

    pub fn vehicle(&self, id: VehicleId) -> Result<Vehicle, DeliveryError> {
        self.db.read(|schema| schema.vehicles.require(id.0).cloned())
    }

    pub fn create_vehicle(&self, draft: VehicleDraft) -> Result<Vehicle, DeliveryError> {
        draft.validate()?;
        self.db.write(|schema| {
            ensure_unique(
                &schema.vehicles,
                None,
                |vehicle| (vehicle.id.0, vehicle.plate_number.as_str()),
                &draft.plate_number,
                "plate_number",
            )?;
            let vehicle = schema.vehicles.insert_with(|id| Vehicle {
                id: VehicleId(id),
                plate_number: draft.plate_number.trim().to_string(),
                vehicle_type: draft.vehicle_type.trim().to_string(),
                capacity_kg: draft.capacity_kg,
                status: draft.status,
            });
            info!(vehicle_id = vehicle.id.0, plate = %vehicle.plate_number, "vehicle created");
            Ok(vehicle.clone())
        })
    }

    pub fn update_vehicle(
        &self,
        id: VehicleId,
        draft: VehicleDraft,
    ) -> Result<Vehicle, DeliveryError> {
        draft.validate()?;
        self.db.write(|schema| {
            schema.vehicles.require(id.0)?;
            ensure_unique(
                &schema.vehicles,
                Some(id.0),
                |vehicle| (vehicle.id.0, vehicle.plate_number.as_str()),
                &draft.plate_number,
                "plate_number",
            )?;
            let vehicle = schema.vehicles.require_mut(id.0)?;
            vehicle.plate_number = draft.plate_number.trim().to_string();
            vehicle.vehicle_type = draft.vehicle_type.trim().to_string();
            vehicle.capacity_kg = draft.capacity_kg;
            vehicle.status = draft.status;
            Ok(vehicle.clone())
        })
    }

    pub fn delete_vehicle(&self, id: VehicleId) -> Result<(), DeliveryError> {
        self.db.write(|schema| {
            schema.vehicles.require(id.0)?;
            if schema.tours.values().any(|tour| tour.vehicle_id == Some(id)) {
                return Err(DeliveryError::conflict(format!(
                    "vehicle {id} is assigned to a tour"
                )));
            }
            schema.vehicles.remove(id.0);
            info!(vehicle_id = id.0, "vehicle deleted");
            Ok(())
        })
    }

    pub fn export_vehicles(&self) -> Result<CsvExport, DeliveryError> {
        self.db
            .read(|schema| CsvExport::build("vehicles", schema.vehicles.values()))
    }

    pub fn list_zones(&self, query: &CatalogQuery) -> Vec<Zone> {
        self.db.read(|schema| {
            schema
                .zones
                .values()
                .filter(|zone| query.matches(&[&zone.name]))
                .cloned()
                .collect()
        })
    }

    pub fn zone(&self, id: ZoneId) -> Result<Zone, DeliveryError> {
        self.db.read(|schema| schema.zones.require(id.0).cloned())
    }

    pub fn create_zone(&self, draft: ZoneDraft) -> Result<Zone, DeliveryError> {
        draft.validate()?;
        self.db.write(|schema| {
            let zone = schema.zones.insert_with(|id| Zone {
                id: ZoneId(id),
                name: draft.name.trim().to_string(),
                base_price: draft.base_price,
            });
            info!(zone_id = zone.id.0, base_price = %zone.base_price, "zone created");
            Ok(zone.clone())
        })
    }

    /// Existing shipments keep their stored price until they are saved again.
    pub fn update_zone(&self, id: ZoneId, draft: ZoneDraft) -> Result<Zone, DeliveryError> {
        draft.validate()?;
        self.db.write(|schema| {
            let zone = schema.zones.require_mut(id.0)?;
            zone.name = draft.name.trim().to_string();
            zone.base_price = draft.base_price;
            Ok(zone.clone())
        })
    }

    /// Removes the zone together with its destinations, unless a shipment
    /// still ships to one of them.
    pub fn delete_zone(&self, id: ZoneId) -> Result<(), DeliveryError> {
        self.db.write(|schema| {
            schema.zones.require(id.0)?;
            let destinations: Vec<DestinationId> = schema
                .destinations
                .values()
                .filter(|destination| destination.zone_id == id)
                .map(|destination| destination.id)
                .collect();
            if let Some(used) = destinations
                .iter()
                .find(|destination| destination_in_use(schema, **destination))
            {
                return Err(DeliveryError::conflict(format!(
                    "zone {id} has destination {used} referenced by shipments"
                )));
            }
            schema
                .destinations
                .retain(|destination| destination.zone_id != id);
            schema.zones.remove(id.0);
            info!(
                zone_id = id.0,
                cascaded_destinations = destinations.len(),
                "zone deleted"
            );
            Ok(())
        })
    }

    pub fn export_zones(&self) -> Result<CsvExport, DeliveryError> {
        self.db
            .read(|schema| CsvExport::build("zones", schema.zones.values()))
    }

    pub fn list_destinations(&self, query: &CatalogQuery) -> Vec<Destination> {
        self.db.read(|schema| {
            schema
                .destinations
                .values()
                .filter(|destination| {
                    query.matches(&[
                        &destination.city,
                        &destination.country,
                        &destination.postal_code,
                    ])
                })
                .cloned()
                .collect()
        })
    }

    pub fn destination(&self, id: DestinationId) -> Result<Destination, DeliveryError> {
        self.db
            .read(|schema| schema.destinations.require(id.0).cloned())
    }

    pub fn create_destination(
        &self,
        draft: DestinationDraft,
    ) -> Result<Destination, DeliveryError> {
        draft.validate()?;
        self.db.write(|schema| {
            schema.zones.require(draft.zone_id.0)?;
            let destination = schema.destinations.insert_with(|id| Destination {
                id: DestinationId(id),
                city: draft.city.trim().to_string(),
                country: draft.country.trim().to_string(),
                zone_id: draft.zone_id,
                postal_code: draft.postal_code.trim().to_string(),
            });
            info!(
                destination_id = destination.id.0,
                zone_id = destination.zone_id.0,
                "destination created"
            );
            Ok(destination.clone())
        })
    }

    pub fn update_destination(
        &self,
        id: DestinationId,
        draft: DestinationDraft,
    ) -> Result<Destination, DeliveryError> {
        draft.validate()?;
        self.db.write(|schema| {
            schema.zones.require(draft.zone_id.0)?;
            let destination = schema.destinations.require_mut(id.0)?;
            destination.city = draft.city.trim().to_string();
            destination.country = draft.country.trim().to_string();
            destination.zone_id = draft.zone_id;
            destination.postal_code = draft.postal_code.trim().to_string();
            Ok(destination.clone())
        })
    }

    pub fn delete_destination(&self, id: DestinationId) -> Result<(), DeliveryError> {
        self.db.write(|schema| {
            schema.destinations.require(id.0)?;
            if destination_in_use(schema, id) {
                return Err(DeliveryError::conflict(format!(
                    "destination {id} is referenced by shipments"
                )));
            }
            schema.destinations.remove(id.0);
            info!(destination_id = id.0, "destination deleted");
            Ok(())
        })
    }

    pub fn export_destinations(&self) -> Result<CsvExport, DeliveryError> {
        self.db
            .read(|schema| CsvExport::build("destinations", schema.destinations.values()))
    }

    pub fn list_service_types(&self, query: &CatalogQuery) -> Vec<ServiceType> {
        self.db.read(|schema| {
            schema
                .service_types
                .values()
                .filter(|service| query.matches(&[&service.name]))
                .cloned()
                .collect()
        })
    }

    pub fn service_type(&self, id: ServiceTypeId) -> Result<ServiceType, DeliveryError> {
        self.db
            .read(|schema| schema.service_types.require(id.0).cloned())
    }

    pub fn create_service_type(
        &self,
        draft: ServiceTypeDraft,
    ) -> Result<ServiceType, DeliveryError> {
        draft.validate()?;
        self.db.write(|schema| {
            let service = schema.service_types.insert_with(|id| ServiceType {
                id: ServiceTypeId(id),
                name: draft.name.trim().to_string(),
                weight_rate: draft.weight_rate,
                volume_rate: draft.volume_rate,
            });
            info!(service_type_id = service.id.0, name = %service.name, "service type created");
            Ok(service.clone())
        })
    }

    pub fn update_service_type(
        &self,
        id: ServiceTypeId,
        draft: ServiceTypeDraft,
    ) -> Result<ServiceType, DeliveryError> {
        draft.validate()?;
        self.db.write(|schema| {
            let service = schema.service_types.require_mut(id.0)?;
            service.name = draft.name.trim().to_string();
            service.weight_rate = draft.weight_rate;
            service.volume_rate = draft.volume_rate;
            Ok(service.clone())
        })
    }

    pub fn delete_service_type(&self, id: ServiceTypeId) -> Result<(), DeliveryError> {
        self.db.write(|schema| {
            schema.service_types.require(id.0)?;
            if schema
                .shipments
                .values()
                .any(|shipment| shipment.service_type_id == id)
            {
                return Err(DeliveryError::conflict(format!(
                    "service type {id} is referenced by shipments"
                )));
            }
            schema.service_types.remove(id.0);
            info!(service_type_id = id.0, "service type deleted");
            Ok(())
        })
    }

    pub fn export_service_types(&self) -> Result<CsvExport, DeliveryError> {
        self.db
            .read(|schema| CsvExport::build("service-types", schema.service_types.values()))
    }
}

fn destination_in_use(schema: &Schema, id: DestinationId) -> bool {
    schema
        .shipments
        .values()
        .any(|shipment| shipment.destination_id == id)
}

fn ensure_client_unique(
    schema: &Schema,
    exclude: Option<ClientId>,
    draft: &ClientDraft,
) -> Result<(), DeliveryError> {
    let exclude = exclude.map(|id| id.0);
    ensure_unique(
        &schema.clients,
        exclude,
        |client| (client.id.0, client.code.as_str()),
        &draft.code,
        "code",
    )?;
    ensure_unique(
        &schema.clients,
        exclude,
        |client| (client.id.0, client.email.as_str()),
        &draft.email,
        "email",
    )
}

fn ensure_unique<T, F>(
    table: &Table<T>,
    exclude: Option<u64>,
    key: F,
    candidate: &str,
    field: &str,
) -> Result<(), DeliveryError>
where
    F: Fn(&T) -> (u64, &str),
{
    let candidate = candidate.trim();
    let taken = table.values().map(&key).any(|(id, value)| {
        Some(id) != exclude && value.trim().eq_ignore_ascii_case(candidate)
    });
    if taken {
        Err(DeliveryError::conflict(format!(
            "{} with {field} '{candidate}' already exists",
            table.entity()
        )))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;

    fn client_draft(code: &str, email: &str) -> ClientDraft {
        ClientDraft {
            code: code.to_string(),
            name: "Atlas Trading".to_string(),
            phone: "+213 555 0101".to_string(),
            email: email.to_string(),
            address: "12 Rue Didouche".to_string(),
            client_type: "business".to_string(),
        }
    }

    #[test]
    fn client_code_and_email_are_unique() {
        let db = Database::new();
        let clock = SystemClock;
        let catalog = CatalogService::new(&db, &clock);
        catalog
            .create_client(client_draft("C-001", "ops@atlas.example"))
            .expect("first client");

        let duplicate_code = catalog.create_client(client_draft("c-001", "other@atlas.example"));
        assert!(matches!(duplicate_code, Err(DeliveryError::Conflict(_))));

        let duplicate_email = catalog.create_client(client_draft("C-002", "OPS@atlas.example"));
        assert!(matches!(duplicate_email, Err(DeliveryError::Conflict(_))));
    }

    #[test]
    fn updating_a_client_keeps_its_own_code() {
        let db = Database::new();
        let clock = SystemClock;
        let catalog = CatalogService::new(&db, &clock);
        let client = catalog
            .create_client(client_draft("C-001", "ops@atlas.example"))
            .expect("client");

        let mut draft = client_draft("C-001", "ops@atlas.example");
        draft.name = "Atlas Trading SARL".to_string();
        let updated = catalog.update_client(client.id, draft).expect("update");
        assert_eq!(updated.name, "Atlas Trading SARL");
        assert_eq!(updated.balance, Money::ZERO);
    }

    #[test]
    fn rejects_malformed_email() {
        let db = Database::new();
        let clock = SystemClock;
        let catalog = CatalogService::new(&db, &clock);
        let result = catalog.create_client(client_draft("C-009", "not-an-email"));
        assert!(matches!(result, Err(DeliveryError::Validation(_))));
    }

    #[test]
    fn destination_requires_existing_zone() {
        let db = Database::new();
        let clock = SystemClock;
        let catalog = CatalogService::new(&db, &clock);
        let result = catalog.create_destination(DestinationDraft {
            city: "Oran".to_string(),
            country: "Algeria".to_string(),
            zone_id: ZoneId(42),
            postal_code: "31000".to_string(),
        });
        assert!(matches!(
            result,
            Err(DeliveryError::NotFound { entity: "zone", id: 42 })
        ));
    }

    #[test]
    fn deleting_a_zone_cascades_unused_destinations() {
        let db = Database::new();
        let clock = SystemClock;
        let catalog = CatalogService::new(&db, &clock);
        let zone = catalog
            .create_zone(ZoneDraft {
                name: "North".to_string(),
                base_price: Money::from_cents(500),
            })
            .expect("zone");
        catalog
            .create_destination(DestinationDraft {
                city: "Algiers".to_string(),
                country: "Algeria".to_string(),
                zone_id: zone.id,
                postal_code: "16000".to_string(),
            })
            .expect("destination");

        catalog.delete_zone(zone.id).expect("zone deleted");
        assert!(catalog.list_destinations(&CatalogQuery::default()).is_empty());
    }

    #[test]
    fn search_filters_case_insensitively() {
        let db = Database::new();
        let clock = SystemClock;
        let catalog = CatalogService::new(&db, &clock);
        for (first, license) in [("Samir", "LIC-1"), ("Nadia", "LIC-2")] {
            catalog
                .create_driver(DriverDraft {
                    first_name: first.to_string(),
                    last_name: "Haddad".to_string(),
                    license_number: license.to_string(),
                    phone: String::new(),
                    available: true,
                })
                .expect("driver");
        }

        let found = catalog.list_drivers(&CatalogQuery::search("nad"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].first_name, "Nadia");
        assert_eq!(catalog.list_drivers(&CatalogQuery::default()).len(), 2);
    }

    #[test]
    fn export_lists_every_vehicle() {
        let db = Database::new();
        let clock = SystemClock;
        let catalog = CatalogService::new(&db, &clock);
        catalog
            .create_vehicle(VehicleDraft {
                plate_number: "123-456-16".to_string(),
                vehicle_type: "van".to_string(),
                capacity_kg: 1200.0,
                status: Default::default(),
            })
            .expect("vehicle");

        let export = catalog.export_vehicles().expect("export");
        let text = export.as_text();
        assert!(text.starts_with("id,plate_number,type,capacity_kg,status\n"));
        assert!(text.contains("123-456-16,van,1200,Available"));
    }
}
