//! Operating mode discovery.
//!
//! `tridentctl` either talks to a Trident server directly (`--server`) or
//! tunnels through the Kubernetes CLI into the cluster running Trident.

use std::path::PathBuf;

use kube::Client;
use tracing::{debug, info};

use crate::cli::command::GlobalOptions;
use crate::error::LogsError;
use crate::local_k8s::pods::KubeCluster;

/// CLIs tried in order when `--kubectl` is not given.
const KUBERNETES_CLIS: [&str; 2] = ["oc", "kubectl"];

/// Where the Trident installation lives in tunnel mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunnelTarget {
    pub kubernetes_cli: PathBuf,
    pub namespace: String,
    pub controller_pod: String,
}

pub enum OperatingMode {
    Direct { server: String },
    Tunnel { target: TunnelTarget, cluster: KubeCluster },
}

impl OperatingMode {
    pub fn into_tunnel(self) -> Result<(TunnelTarget, KubeCluster), LogsError> {
        match self {
            OperatingMode::Tunnel { target, cluster } => Ok((target, cluster)),
            OperatingMode::Direct { server } => {
                debug!("direct mode against {}", server);
                Err(LogsError::UnsupportedMode)
            }
        }
    }
}

pub async fn discover(opts: &GlobalOptions) -> Result<OperatingMode, LogsError> {
    if let Some(server) = &opts.server {
        return Ok(OperatingMode::Direct {
            server: server.clone(),
        });
    }

    let kubernetes_cli = find_kubernetes_cli(opts.kubectl.as_ref())?;
    let client = Client::try_default()
        .await
        .map_err(|e| LogsError::Discovery(format!("could not load the kubeconfig; {}", e)))?;
    let namespace = opts
        .namespace
        .clone()
        .unwrap_or_else(|| client.default_namespace().to_string());

    let cluster = KubeCluster::new(client);
    let controller_pod = cluster
        .controller_pod(&namespace)
        .await
        .map_err(|e| LogsError::Discovery(e.to_string()))?;

    info!(
        "tunnel mode: cli={}, namespace={}, controller pod={}",
        kubernetes_cli.display(),
        namespace,
        controller_pod
    );

    Ok(OperatingMode::Tunnel {
        target: TunnelTarget {
            kubernetes_cli,
            namespace,
            controller_pod,
        },
        cluster,
    })
}

fn find_kubernetes_cli(explicit: Option<&PathBuf>) -> Result<PathBuf, LogsError> {
    if let Some(path) = explicit {
        return Ok(path.clone());
    }
    KUBERNETES_CLIS
        .iter()
        .find_map(|cli| which::which(cli).ok())
        .ok_or_else(|| {
            LogsError::Discovery(format!(
                "could not find the Kubernetes CLI; tried {}",
                KUBERNETES_CLIS.join(", ")
            ))
        })
}
