use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
mod cli;
mod view;
use cli::{Cli, Commands};

use my_arbolitos::analysis::AnalysisGenerator;
use my_arbolitos::clock::{Clock, SystemClock};
use my_arbolitos::config::Config;
use my_arbolitos::error::TrackerError;
use my_arbolitos::kv;
use my_arbolitos::models::sort_by_latest;
use my_arbolitos::store::HistoryStore;
use my_arbolitos::summary::{insights, summarize};
use my_arbolitos::tracker::Tracker;

#[tokio::main]
async fn main() -> Result<()> {
    let mut config = Config::from_env()?;
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("my_arbolitos={}", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Some(backend) = cli.backend {
        config.backend = backend;
    }
    if let Some(path) = cli.store {
        config.store_path = path;
    }
    info!(backend = ?config.backend, "starting my-arbolitos v{}", env!("CARGO_PKG_VERSION"));

    let backend = match kv::open(&config).await {
        Ok(backend) => backend,
        Err(e) => {
            error!(error = %e, "could not open storage");
            eprintln!("Error al abrir el almacenamiento: {}", e);
            return Err(e.into());
        }
    };
    let store = HistoryStore::new(backend);

    run(cli.command, store, &config).await.map_err(report)
}

async fn run(command: Commands, store: HistoryStore, config: &Config) -> Result<(), TrackerError> {
    match command {
        Commands::Analyze(args) => {
            let generator = AnalysisGenerator::system(config.analysis_delay);
            let mut tracker = Tracker::new(store, generator);

            println!("Analizando imagen...");
            let analysis = tracker
                .analyze_file(args.image.as_deref(), &args.plant_id, args.name)
                .await?;
            view::print_analysis(&analysis);
        }
        Commands::List => {
            let mut plants = store.get_all().await?;
            sort_by_latest(&mut plants);
            view::print_plant_list(&plants);
        }
        Commands::View { plant_id } => match store.get_history(&plant_id).await? {
            Some(history) => view::print_timeline(&history),
            None => println!("No se encontró planta con ID {}", plant_id),
        },
        Commands::Summary { plant_id, days } => match store.get_history(&plant_id).await? {
            Some(history) => {
                let summary = summarize(&history, SystemClock.now(), days);
                view::print_summary(&summary, &history, &insights(&history));
            }
            None => println!("No se encontró planta con ID {}", plant_id),
        },
        Commands::Export { plant_id, out } => {
            let path = store.export_to(&out, &plant_id).await?;
            println!("Historial exportado a {}", path.display());
        }
        Commands::Rename { plant_id, name } => {
            let history = store.set_plant_name(&plant_id, Some(name)).await?;
            println!("Planta ID {} ahora se llama '{}'", plant_id, history.display_name());
        }
        Commands::Remove { plant_id } => {
            if store.delete(&plant_id).await? {
                println!("Planta ID {} removida", plant_id);
            } else {
                println!("No se encontró planta con ID {}", plant_id);
            }
        }
    }
    Ok(())
}

/// Prints the user-facing message for a failed command and keeps the
/// details in the log.
fn report(e: TrackerError) -> anyhow::Error {
    if !e.is_input_error() {
        error!(error = %e, "command failed");
    }
    eprintln!("{}", e.user_message());
    e.into()
}
