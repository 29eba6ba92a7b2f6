use crate::demo::{demo_hub, run_demo, seed, DemoArgs};
use crate::infra::InMemoryAlertPublisher;
use crate::server;
use chrono::Local;
use clap::{Args, Parser, Subcommand, ValueEnum};
use delivery_hub::config::ServerConfig;
use delivery_hub::error::AppError;
use delivery_hub::export::CsvExport;
use delivery_hub::money::Money;
use delivery_hub::pricing;
use delivery_hub::DeliveryHub;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Delivery Hub",
    about = "Run the delivery management service and its operator tools",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Price a parcel from explicit rates
    Quote(QuoteArgs),
    /// Write a CSV export of one resource
    Export(ExportArgs),
    /// Run a scripted delivery day end to end
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

impl ServeArgs {
    pub(crate) fn apply(self, server: &mut ServerConfig) {
        if let Some(host) = self.host {
            server.host = host;
        }
        if let Some(port) = self.port {
            server.port = port;
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct QuoteArgs {
    /// Zone base price, e.g. 500.00
    #[arg(long)]
    pub(crate) base_price: Money,
    /// Charge per kilogram
    #[arg(long)]
    pub(crate) weight_rate: Money,
    /// Charge per cubic meter
    #[arg(long)]
    pub(crate) volume_rate: Money,
    /// Parcel weight in kilograms
    #[arg(long)]
    pub(crate) weight: f64,
    /// Parcel volume in cubic meters
    #[arg(long)]
    pub(crate) volume: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum ExportResource {
    Clients,
    Drivers,
    Vehicles,
    Zones,
    Destinations,
    ServiceTypes,
    Shipments,
    Tours,
}

#[derive(Args, Debug)]
pub(crate) struct ExportArgs {
    #[arg(value_enum)]
    pub(crate) resource: ExportResource,
    /// Seed the scripted demo data before exporting
    #[arg(long)]
    pub(crate) demo: bool,
    /// Write to this file instead of stdout
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Quote(args) => run_quote(args),
        Command::Export(args) => run_export(args),
        Command::Demo(args) => run_demo(args),
    }
}

fn run_quote(args: QuoteArgs) -> Result<(), AppError> {
    let quote = pricing::quote(
        args.base_price,
        args.weight_rate,
        args.volume_rate,
        args.weight,
        args.volume,
    )?;
    println!("Base price     {:>12}", quote.base);
    println!("Weight charge  {:>12}", quote.weight_charge);
    println!("Volume charge  {:>12}", quote.volume_charge);
    println!("Total          {:>12}", quote.total);
    Ok(())
}

fn run_export(args: ExportArgs) -> Result<(), AppError> {
    let hub = if args.demo {
        let hub = demo_hub(InMemoryAlertPublisher::default());
        seed(&hub, Local::now().date_naive())?;
        hub
    } else {
        DeliveryHub::builder().build()
    };

    let export = export_resource(&hub, args.resource)?;
    match args.output {
        Some(path) => {
            std::fs::write(&path, &export.body)?;
            println!("wrote {} to {}", export.filename, path.display());
        }
        None => print!("{}", export.as_text()),
    }
    Ok(())
}

pub(crate) fn export_resource(
    hub: &DeliveryHub,
    resource: ExportResource,
) -> Result<CsvExport, AppError> {
    let catalog = hub.catalog();
    let export = match resource {
        ExportResource::Clients => catalog.export_clients(),
        ExportResource::Drivers => catalog.export_drivers(),
        ExportResource::Vehicles => catalog.export_vehicles(),
        ExportResource::Zones => catalog.export_zones(),
        ExportResource::Destinations => catalog.export_destinations(),
        ExportResource::ServiceTypes => catalog.export_service_types(),
        ExportResource::Shipments => hub.shipments().export(),
        ExportResource::Tours => hub.tours().export(),
    }?;
    Ok(export)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn cli_defaults_to_serve_without_subcommand() {
        let cli = Cli::try_parse_from(["delivery-hub"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn serve_flags_override_the_configured_address() {
        let mut server = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
        };
        ServeArgs {
            host: None,
            port: Some(8081),
        }
        .apply(&mut server);
        assert_eq!(server.host, "127.0.0.1");
        assert_eq!(server.port, 8081);
    }

    #[test]
    fn quote_arguments_parse_as_money() {
        let cli = Cli::try_parse_from([
            "delivery-hub",
            "quote",
            "--base-price",
            "500",
            "--weight-rate",
            "125.00",
            "--volume-rate",
            "2000",
            "--weight",
            "2.5",
            "--volume",
            "0.15",
        ])
        .expect("parses");
        match cli.command {
            Some(Command::Quote(args)) => {
                assert_eq!(args.weight_rate, Money::from_cents(12_500));
                assert_eq!(args.weight, 2.5);
            }
            other => panic!("expected quote command, got {other:?}"),
        }
    }

    #[test]
    fn shipment_export_of_demo_day_lists_both_parcels() {
        let hub = demo_hub(InMemoryAlertPublisher::default());
        seed(&hub, NaiveDate::from_ymd_opt(2025, 5, 12).expect("valid date")).expect("seed");
        let export = export_resource(&hub, ExportResource::Shipments).expect("export");
        assert_eq!(export.filename, "shipments.csv");
        assert_eq!(export.as_text().lines().count(), 3);
    }
}
