use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use uuid::Uuid;

use velostore::config::Config;
use velostore::garage::bike::BikeRowAction;
use velostore::garage::detail::BikeDetailAction;
use velostore::garage::{
    garage_reducer, GarageAction, GarageEnvironment, GarageState, JsonFileStore, StaticCatalog,
};
use velostore::reducer::BoxReducer;
use velostore::{logging, ReducerExt, Store, TokioScheduler};

#[derive(Parser, Debug)]
#[command(name = "velostore", version, about = "Track bikes, rides and component service")]
struct Cli {
    /// Config file (default: the platform config directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Garage data file, overriding the config.
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show every bike with its odometer and components.
    List,
    /// Add a bike.
    Add { name: String },
    /// Log a ride.
    Ride { name: String, km: f64 },
    /// Rename a bike.
    Rename { name: String, new_name: String },
    /// Mark a component as serviced at the current odometer reading.
    Service { name: String, component: String },
    /// Look up the bike's manufacturer.
    Info { name: String },
}

type GarageStore = Store<BoxReducer<GarageState, GarageAction, GarageEnvironment>>;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_tracing();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("loading configuration")?;

    let data_file = cli.data.clone().unwrap_or_else(|| config.garage.data_file());
    tracing::debug!(path = %data_file.display(), "using garage file");

    let environment = GarageEnvironment {
        persistence: Arc::new(JsonFileStore::new(data_file)),
        catalog: Arc::new(StaticCatalog::builtin()),
        scheduler: TokioScheduler::shared(),
        persist_debounce: config.garage.persist_debounce(),
    };
    let store: GarageStore = Store::with_options(
        GarageState::default(),
        garage_reducer().boxed(),
        environment,
        config.store_options(),
    );

    store.send(GarageAction::Load);
    store.wait_for_effects().await;
    check_error(&store)?;

    run_command(&store, cli.command).await?;
    store.wait_for_effects().await;
    check_error(&store)
}

async fn run_command(store: &GarageStore, command: Command) -> Result<()> {
    match command {
        Command::List => {
            print_garage(&store.state());
        }
        Command::Add { name } => {
            store.send(GarageAction::AddBike {
                id: Uuid::new_v4(),
                name: name.clone(),
            });
            check_error(store)?;
            println!("Added {}", name.trim());
        }
        Command::Ride { name, km } => {
            if !(km.is_finite() && km > 0.0) {
                bail!("ride distance must be a positive number of kilometres");
            }
            let id = find_bike(store, &name)?;
            store.send(GarageAction::Bike(id, BikeRowAction::LogRide { km }));
            print_bike(store, id);
        }
        Command::Rename { name, new_name } => {
            let id = find_bike(store, &name)?;
            store.send(GarageAction::Bike(id, BikeRowAction::Rename(new_name)));
            print_bike(store, id);
        }
        Command::Service { name, component } => {
            let id = find_bike(store, &name)?;
            store.send(GarageAction::Select(id));
            store.send(GarageAction::Detail(BikeDetailAction::ServiceComponent(
                component,
            )));
            store.send(GarageAction::Dismiss);
            print_bike(store, id);
        }
        Command::Info { name } => {
            let id = find_bike(store, &name)?;
            store.send(GarageAction::Select(id));
            store.send(GarageAction::Detail(BikeDetailAction::LoadBrandInfo));
            store.wait_for_effects().await;
            let detail = store
                .with_state(|state| state.selected.clone())
                .ok_or_else(|| anyhow!("detail screen closed unexpectedly"))?;
            match (detail.brand, detail.error) {
                (Some(info), _) => println!(
                    "{}: {} brand from {}, founded {}",
                    detail.bike.name, info.brand, info.country, info.founded
                ),
                (None, Some(error)) => println!("{}: {}", detail.bike.name, error),
                (None, None) => println!("{}: no brand information", detail.bike.name),
            }
            store.send(GarageAction::Dismiss);
        }
    }
    Ok(())
}

fn find_bike(store: &GarageStore, name: &str) -> Result<Uuid> {
    store
        .with_state(|state| state.bike_named(name).map(|b| b.id))
        .ok_or_else(|| anyhow!("no bike named '{}'", name))
}

fn check_error(store: &GarageStore) -> Result<()> {
    match store.with_state(|state| state.last_error.clone()) {
        Some(error) => Err(anyhow!(error)),
        None => Ok(()),
    }
}

fn print_bike(store: &GarageStore, id: Uuid) {
    store.with_state(|state| {
        if let Some(bike) = state.bike(id) {
            println!(
                "{}: {:.1} km over {} rides",
                bike.name, bike.distance_km, bike.rides
            );
            for component in &bike.components {
                println!(
                    "  {}: {:.1} km since service",
                    component.name,
                    component.km_since_service(bike)
                );
            }
        }
    });
}

fn print_garage(state: &GarageState) {
    if state.bikes.is_empty() {
        println!("The garage is empty.");
        return;
    }
    for bike in &state.bikes {
        println!(
            "{}: {:.1} km over {} rides, {} components",
            bike.name,
            bike.distance_km,
            bike.rides,
            bike.components.len()
        );
    }
}
