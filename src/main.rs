//! Docker Flow command-line entry point

use clap::Parser;
use docker_flow::compose::{DockerCompose, OverlayFile};
use docker_flow::config::{FlowArgs, FlowConfig};
use docker_flow::container::DockerCli;
use docker_flow::discovery::ConsulStore;
use docker_flow::error::{FlowError, Result};
use docker_flow::flow::FlowOrchestrator;
use docker_flow::proxy::DockerFlowProxy;
use tracing_subscriber::EnvFilter;

/// Docker Flow - blue-green deployments with Docker Compose
#[derive(Parser)]
#[command(name = "docker-flow")]
#[command(author = "Evoker Industries")]
#[command(version)]
#[command(about = "Blue-green deployments of Docker Compose services", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(flatten)]
    flow: FlowArgs,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli.flow).await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(args: FlowArgs) -> Result<()> {
    let working_dir = std::env::current_dir()
        .map_err(|e| FlowError::Config(format!("could not read the working directory: {}", e)))?;
    let config = FlowConfig::load(args, &working_dir)?;

    tracing::info!(
        "Running flow [{}] for {}",
        config
            .flow
            .iter()
            .map(|step| step.as_str())
            .collect::<Vec<_>>()
            .join(", "),
        config.service_name
    );

    let overlay = OverlayFile::default();
    let compose = DockerCompose::new(
        overlay.path(),
        Some(config.project.clone()),
        config.compose_host(),
    );
    let store = ConsulStore::new(&config.consul_address);
    let proxy = DockerFlowProxy::new(config.proxy_settings(), DockerCli::new(config.proxy_docker()));

    let orchestrator = FlowOrchestrator::new(config.flow_settings(), overlay, compose, store, proxy);
    orchestrator.run(&config.flow).await?;

    tracing::info!("Flow finished");
    Ok(())
}
