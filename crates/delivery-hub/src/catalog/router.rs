use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use super::domain::{
    Client, ClientDraft, ClientId, Destination, DestinationDraft, DestinationId, Driver,
    DriverDraft, DriverId, ServiceType, ServiceTypeDraft, ServiceTypeId, Vehicle, VehicleDraft,
    VehicleId, Zone, ZoneDraft, ZoneId,
};
use super::service::CatalogQuery;
use crate::error::DeliveryError;
use crate::export::CsvExport;
use crate::hub::DeliveryHub;

/// CRUD and export endpoints for every reference-data resource.
pub fn catalog_routes() -> Router<DeliveryHub> {
    Router::new()
        .route("/api/v1/clients", get(list_clients).post(create_client))
        .route("/api/v1/clients/export", get(export_clients))
        .route(
            "/api/v1/clients/:id",
            get(get_client).put(update_client).delete(delete_client),
        )
        .route("/api/v1/drivers", get(list_drivers).post(create_driver))
        .route("/api/v1/drivers/export", get(export_drivers))
        .route(
            "/api/v1/drivers/:id",
            get(get_driver).put(update_driver).delete(delete_driver),
        )
        .route("/api/v1/vehicles", get(list_vehicles).post(create_vehicle))
        .route("/api/v1/vehicles/export", get(export_vehicles))
        .route(
            "/api/v1/vehicles/:id",
            get(get_vehicle).put(update_vehicle).delete(delete_vehicle),
        )
        .route("/api/v1/zones", get(list_zones).post(create_zone))
        .route("/api/v1/zones/export", get(export_zones))
        .route(
            "/api/v1/zones/:id",
            get(get_zone).put(update_zone).delete(delete_zone),
        )
        .route(
            "/api/v1/destinations",
            get(list_destinations).post(create_destination),
        )
        .route("/api/v1/destinations/export", get(export_destinations))
        .route(
            "/api/v1/destinations/:id",
            get(get_destination)
                .put(update_destination)
                .delete(delete_destination),
        )
        .route(
            "/api/v1/service-types",
            get(list_service_types).post(create_service_type),
        )
        .route("/api/v1/service-types/export", get(export_service_types))
        .route(
            "/api/v1/service-types/:id",
            get(get_service_type)
                .put(update_service_type)
                .delete(delete_service_type),
        )
}

async fn list_clients(
    State(hub): State<DeliveryHub>,
    Query(query): Query<CatalogQuery>,
) -> Json<Vec<Client>> {
    Json(hub.catalog().list_clients(&query))
}

async fn create_client(
    State(hub): State<DeliveryHub>,
    Json(draft): Json<ClientDraft>,
) -> Result<(StatusCode, Json<Client>), DeliveryError> {
    let client = hub.catalog().create_client(draft)?;
    Ok((StatusCode::CREATED, Json(client)))
}

async fn get_client(
    State(hub): State<DeliveryHub>,
    Path(id): Path<ClientId>,
) -> Result<Json<Client>, DeliveryError> {
    hub.catalog().client(id).map(Json)
}

async fn update_client(
    State(hub): State<DeliveryHub>,
    Path(id): Path<ClientId>,
    Json(draft): Json<ClientDraft>,
) -> Result<Json<Client>, DeliveryError> {
    hub.catalog().update_client(id, draft).map(Json)
}

async fn delete_client(
    State(hub): State<DeliveryHub>,
    Path(id): Path<ClientId>,
) -> Result<StatusCode, DeliveryError> {
    hub.catalog().delete_client(id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn export_clients(State(hub): State<DeliveryHub>) -> Result<CsvExport, DeliveryError> {
    hub.catalog().export_clients()
}

async fn list_drivers(
    State(hub): State<DeliveryHub>,
    Query(query): Query<CatalogQuery>,
) -> Json<Vec<Driver>> {
    Json(hub.catalog().list_drivers(&query))
}

async fn create_driver(
    State(hub): State<DeliveryHub>,
    Json(draft): Json<DriverDraft>,
) -> Result<(StatusCode, Json<Driver>), DeliveryError> {
    let driver = hub.catalog().create_driver(draft)?;
    Ok((StatusCode::CREATED, Json(driver)))
}

async fn get_driver(
    State(hub): State<DeliveryHub>,
    Path(id): Path<DriverId>,
) -> Result<Json<Driver>, DeliveryError> {
    hub.catalog().driver(id).map(Json)
}

async fn update_driver(
    State(hub): State<DeliveryHub>,
    Path(id): Path<DriverId>,
    Json(draft): Json<DriverDraft>,
) -> Result<Json<Driver>, DeliveryError> {
    hub.catalog().update_driver(id, draft).map(Json)
}

async fn delete_driver(
    State(hub): State<DeliveryHub>,
    Path(id): Path<DriverId>,
) -> Result<StatusCode, DeliveryError> {
    hub.catalog().delete_driver(id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn export_drivers(State(hub): State<DeliveryHub>) -> Result<CsvExport, DeliveryError> {
    hub.catalog().export_drivers()
}

async fn list_vehicles(
    State(hub): State<DeliveryHub>,
    Query(query): Query<CatalogQuery>,
) -> Json<Vec<Vehicle>> {
    Json(hub.catalog().list_vehicles(&query))
}

async fn create_vehicle(
    State(hub): State<DeliveryHub>,
    Json(draft): Json<VehicleDraft>,
) -> Result<(StatusCode, Json<Vehicle>), DeliveryError> {
    let vehicle = hub.catalog().create_vehicle(draft)?;
    Ok((StatusCode::CREATED, Json(vehicle)))
}

async fn get_vehicle(
    State(hub): State<DeliveryHub>,
    Path(id): Path<VehicleId>,
) -> Result<Json<Vehicle>, DeliveryError> {
    hub.catalog().vehicle(id).map(Json)
}

async fn update_vehicle(
    State(hub): State<DeliveryHub>,
    Path(id): Path<VehicleId>,
    Json(draft): Json<VehicleDraft>,
) -> Result<Json<Vehicle>, DeliveryError> {
    hub.catalog().update_vehicle(id, draft).map(Json)
}

async fn delete_vehicle(
    State(hub): State<DeliveryHub>,
    Path(id): Path<VehicleId>,
) -> Result<StatusCode, DeliveryError> {
    hub.catalog().delete_vehicle(id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn export_vehicles(State(hub): State<DeliveryHub>) -> Result<CsvExport, DeliveryError> {
    hub.catalog().export_vehicles()
}

async fn list_zones(
    State(hub): State<DeliveryHub>,
    Query(query): Query<CatalogQuery>,
) -> Json<Vec<Zone>> {
    Json(hub.catalog().list_zones(&query))
}

async fn create_zone(
    State(hub): State<DeliveryHub>,
    Json(draft): Json<ZoneDraft>,
) -> Result<(StatusCode, Json<Zone>), DeliveryError> {
    let zone = hub.catalog().create_zone(draft)?;
    Ok((StatusCode::CREATED, Json(zone)))
}

async fn get_zone(
    State(hub): State<DeliveryHub>,
    Path(id): Path<ZoneId>,
) -> Result<Json<Zone>, DeliveryError> {
    hub.catalog().zone(id).map(Json)
}

async fn update_zone(
    State(hub): State<DeliveryHub>,
    Path(id): Path<ZoneId>,
    Json(draft): Json<ZoneDraft>,
) -> Result<Json<Zone>, DeliveryError> {
    hub.catalog().update_zone(id, draft).map(Json)
}

async fn delete_zone(
    State(hub): State<DeliveryHub>,
    Path(id): Path<ZoneId>,
) -> Result<StatusCode, DeliveryError> {
    hub.catalog().delete_zone(id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn export_zones(State(hub): State<DeliveryHub>) -> Result<CsvExport, DeliveryError> {
    hub.catalog().export_zones()
}

async fn list_destinations(
    State(hub): State<DeliveryHub>,
    Query(query): Query<CatalogQuery>,
) -> Json<Vec<Destination>> {
    Json(hub.catalog().list_destinations(&query))
}

async fn create_destination(
    State(hub): State<DeliveryHub>,
    Json(draft): Json<DestinationDraft>,
) -> Result<(StatusCode, Json<Destination>), DeliveryError> {
    let destination = hub.catalog().create_destination(draft)?;
    Ok((StatusCode::CREATED, Json(destination)))
}

async fn get_destination(
    State(hub): State<DeliveryHub>,
    Path(id): Path<DestinationId>,
) -> Result<Json<Destination>, DeliveryError> {
    hub.catalog().destination(id).map(Json)
}

async fn update_destination(
    State(hub): State<DeliveryHub>,
    Path(id): Path<DestinationId>,
    Json(draft): Json<DestinationDraft>,
) -> Result<Json<Destination>, DeliveryError> {
    hub.catalog().update_destination(id, draft).map(Json)
}

async fn delete_destination(
    State(hub): State<DeliveryHub>,
    Path(id): Path<DestinationId>,
) -> Result<StatusCode, DeliveryError> {
    hub.catalog().delete_destination(id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn export_destinations(State(hub): State<DeliveryHub>) -> Result<CsvExport, DeliveryError> {
    hub.catalog().export_destinations()
}

async fn list_service_types(
    State(hub): State<DeliveryHub>,
    Query(query): Query<CatalogQuery>,
) -> Json<Vec<ServiceType>> {
    Json(hub.catalog().list_service_types(&query))
}

async fn create_service_type(
    State(hub): State<DeliveryHub>,
    Json(draft): Json<ServiceTypeDraft>,
) -> Result<(StatusCode, Json<ServiceType>), DeliveryError> {
    let service = hub.catalog().create_service_type(draft)?;
    Ok((StatusCode::CREATED, Json(service)))
}

async fn get_service_type(
    State(hub): State<DeliveryHub>,
    Path(id): Path<ServiceTypeId>,
) -> Result<Json<ServiceType>, DeliveryError> {
    hub.catalog().service_type(id).map(Json)
}

async fn update_service_type(
    State(hub): State<DeliveryHub>,
    Path(id): Path<ServiceTypeId>,
    Json(draft): Json<ServiceTypeDraft>,
) -> Result<Json<ServiceType>, DeliveryError> {
    hub.catalog().update_service_type(id, draft).map(Json)
}

async fn delete_service_type(
    State(hub): State<DeliveryHub>,
    Path(id): Path<ServiceTypeId>,
) -> Result<StatusCode, DeliveryError> {
    hub.catalog().delete_service_type(id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn export_service_types(
    State(hub): State<DeliveryHub>,
) -> Result<CsvExport, DeliveryError> {
    hub.catalog().export_service_types()
}
