use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use species_marker::app::App;
use species_marker::config::ConfigLoader;
use species_marker::error::MarkerError;
use species_marker::output::ConsoleOutput;
use species_marker::phylopic::PhylopicHttpClient;
use species_marker::store::Store;

#[derive(Parser)]
#[command(name = "species-marker")]
#[command(about = "A CLI tool for creating map markers for species")]
#[command(
    long_about = "Fetches species silhouettes from PhyloPic and embeds them in a map-marker SVG."
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Create a new marker")]
    MakeMarker(MakeMarkerArgs),
}

#[derive(Args)]
struct MakeMarkerArgs {
    species: String,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<MarkerError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &MarkerError) -> u8 {
    match error {
        MarkerError::Network(_)
        | MarkerError::Http(_)
        | MarkerError::Status { .. }
        | MarkerError::Decode(_) => 3,
        MarkerError::NoMarkers { .. } => 4,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::MakeMarker(args) => run_make_marker(args),
    }
}

fn run_make_marker(args: MakeMarkerArgs) -> miette::Result<()> {
    let settings = ConfigLoader::resolve(None)?;
    let client = PhylopicHttpClient::new(&settings)?;
    let app = App::new(
        Store::new(settings.output_dir.clone()),
        client,
        settings.image_base_url.clone(),
    );

    let report = app.make_marker(&args.species, &ConsoleOutput)?;
    ConsoleOutput::print_summary(&report).into_diagnostic()?;

    if !report.items.is_empty() && report.markers_created() == 0 {
        return Err(MarkerError::NoMarkers {
            failed: report.failures(),
        }
        .into());
    }
    Ok(())
}
