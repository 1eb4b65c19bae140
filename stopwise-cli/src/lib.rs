//! Command-line interface for managing and optimising address lists.
#![forbid(unsafe_code)]

use std::io::Write;

use clap::{Parser, Subcommand};
use stopwise_core::{AddressListService, Geocoder, ServiceConfig};
use stopwise_data::{HttpGeocoder, SqliteAddressListStore};

mod args;
mod commands;
mod error;

pub use error::CliError;

use args::{
    CreateArgs, ListArgs, OptimizeArgs, RecipientsArgs, ShowArgs, StoreConfig, UpdateArgs,
};
use commands::{DisabledGeocoder, write_json};

/// Run the Stopwise CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;
    let mut stdout = std::io::stdout().lock();
    runtime.block_on(dispatch(cli.command, &mut stdout))
}

#[derive(Debug, Parser)]
#[command(
    name = "stopwise",
    about = "Geocode address lists and order them into efficient routes",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Geocode addresses and store them as a new list.
    Create(CreateArgs),
    /// List the owner's address lists.
    List(ListArgs),
    /// Show one address list.
    Show(ShowArgs),
    /// Reorder a list nearest-first and print a directions link.
    Optimize(OptimizeArgs),
    /// Replace the recipients of a list.
    Recipients(RecipientsArgs),
    /// Edit addresses in a list.
    Update(UpdateArgs),
}

async fn dispatch(command: Command, writer: &mut dyn Write) -> Result<(), CliError> {
    match command {
        Command::Create(args) => {
            let config = args.into_config()?;
            let geocoder = HttpGeocoder::with_config(config.geocoder.clone()).map_err(|source| {
                CliError::BuildGeocoder {
                    base_url: config.geocoder.base_url.clone(),
                    source,
                }
            })?;
            let service = open_service(&config.store, geocoder, config.service_config())?;
            write_json(writer, &commands::create(&service, &config).await?)
        }
        Command::List(args) => {
            let config = args.into_config()?;
            let service = open_service(&config, DisabledGeocoder, ServiceConfig::default())?;
            write_json(writer, &commands::list(&service, &config).await?)
        }
        Command::Show(args) => {
            let config = args.into_config()?;
            let service = open_service(&config.store, DisabledGeocoder, ServiceConfig::default())?;
            write_json(writer, &commands::show(&service, &config).await?)
        }
        Command::Optimize(args) => {
            let config = args.into_config()?;
            let service = open_service(&config.store, DisabledGeocoder, ServiceConfig::default())?;
            write_json(writer, &commands::optimize(&service, &config).await?)
        }
        Command::Recipients(args) => {
            let config = args.into_config()?;
            let service = open_service(&config.store, DisabledGeocoder, ServiceConfig::default())?;
            write_json(writer, &commands::recipients(&service, &config).await?)
        }
        Command::Update(args) => {
            let config = args.into_config()?;
            let service = open_service(&config.store, DisabledGeocoder, ServiceConfig::default())?;
            write_json(writer, &commands::update(&service, &config).await?)
        }
    }
}

fn open_service<G: Geocoder>(
    store: &StoreConfig,
    geocoder: G,
    config: ServiceConfig,
) -> Result<AddressListService<G, SqliteAddressListStore>, CliError> {
    let sqlite = SqliteAddressListStore::open(&store.database).map_err(|source| {
        CliError::OpenStore {
            path: store.database.clone(),
            source,
        }
    })?;
    Ok(AddressListService::with_config(geocoder, sqlite, config))
}

#[cfg(test)]
mod tests;
