mod cli;
mod error;
mod local_k8s;
mod logs;
mod mode;

use std::future::Future;
use std::path::Path;
use std::process::ExitCode;

use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::command::{CliCommand, LogsOptions, TridentCli};
use error::LogsError;
use local_k8s::kubectl::Kubectl;
use logs::Collector;
use mode::OperatingMode;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = TridentCli::new();
    init_tracing(cli.global.debug);

    let result = match &cli.command {
        CliCommand::Logs(opts) => logs_command(opts, || mode::discover(&cli.global)).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn logs_command<D, F>(opts: &LogsOptions, discover: D) -> Result<(), LogsError>
where
    D: FnOnce() -> F,
    F: Future<Output = Result<OperatingMode, LogsError>>,
{
    // Checked before discovery so a bad flag never reaches the cluster.
    let request = opts.request()?;

    let (target, cluster) = discover().await?.into_tunnel()?;
    let kubectl = Kubectl::new(&target.kubernetes_cli);
    debug!("fetching logs with {}", kubectl.binary().display());

    Collector::new(&target, &cluster, &kubectl)
        .run(&request, Path::new("."))
        .await
}
