use std::collections::BTreeMap;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::{
    api::{Api, ListParams},
    Client, ResourceExt,
};
use thiserror::Error;
use tracing::debug;

/// Name of the main Trident container in both controller and node pods.
pub const CONTAINER_TRIDENT: &str = "trident-main";

pub const CONTROLLER_LABEL: &str = "app=controller.csi.trident.netapp.io";
pub const NODE_LABEL: &str = "app=node.csi.trident.netapp.io";

#[derive(Debug, Error)]
pub enum ClusterError {
    #[error(transparent)]
    Kube(#[from] kube::Error),

    #[error("could not find a running Trident controller pod in namespace {0}")]
    NoControllerPod(String),

    #[error("could not find a Trident node pod on node {0}")]
    NoNodePod(String),

    #[error("pod {0} has no spec")]
    MissingSpec(String),
}

/// Lookups over the running Trident pod set.
#[async_trait]
pub trait ClusterQuery: Send + Sync {
    /// Containers of `pod` other than the main Trident container.
    async fn list_sidecars(&self, pod: &str, namespace: &str) -> Result<Vec<String>, ClusterError>;

    /// Trident node pods keyed by the node they are scheduled on.
    async fn list_nodes(&self, namespace: &str) -> Result<BTreeMap<String, String>, ClusterError>;

    /// The Trident node pod scheduled on `node`.
    async fn node_pod(&self, node: &str, namespace: &str) -> Result<String, ClusterError>;
}

#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
}

impl KubeCluster {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn pods(&self, namespace: &str) -> Api<Pod> {
        Api::namespaced(self.client.clone(), namespace)
    }

    pub async fn controller_pod(&self, namespace: &str) -> Result<String, ClusterError> {
        let lp = ListParams::default().labels(CONTROLLER_LABEL);
        let pods = self.pods(namespace).list(&lp).await?;
        pick_controller_pod(&pods.items).ok_or_else(|| ClusterError::NoControllerPod(namespace.to_string()))
    }
}

#[async_trait]
impl ClusterQuery for KubeCluster {
    async fn list_sidecars(&self, pod: &str, namespace: &str) -> Result<Vec<String>, ClusterError> {
        let pod = self.pods(namespace).get(pod).await?;
        sidecar_names(&pod)
    }

    async fn list_nodes(&self, namespace: &str) -> Result<BTreeMap<String, String>, ClusterError> {
        let lp = ListParams::default().labels(NODE_LABEL);
        let pods = self.pods(namespace).list(&lp).await?;
        let nodes = node_pods(&pods.items);
        debug!("found {} trident node pod(s) in {}", nodes.len(), namespace);
        Ok(nodes)
    }

    async fn node_pod(&self, node: &str, namespace: &str) -> Result<String, ClusterError> {
        let lp = ListParams::default()
            .labels(NODE_LABEL)
            .fields(&format!("spec.nodeName={}", node));
        let pods = self.pods(namespace).list(&lp).await?;
        pods.items
            .first()
            .map(|p| p.name_any())
            .ok_or_else(|| ClusterError::NoNodePod(node.to_string()))
    }
}

fn sidecar_names(p: &Pod) -> Result<Vec<String>, ClusterError> {
    let spec = p.spec.as_ref().ok_or_else(|| ClusterError::MissingSpec(p.name_any()))?;
    Ok(spec
        .containers
        .iter()
        .filter(|c| c.name != CONTAINER_TRIDENT)
        .map(|c| c.name.clone())
        .collect())
}

fn node_pods(pods: &[Pod]) -> BTreeMap<String, String> {
    pods.iter()
        .filter_map(|p| {
            let node = p.spec.as_ref()?.node_name.clone()?;
            Some((node, p.name_any()))
        })
        .collect()
}

fn pick_controller_pod(pods: &[Pod]) -> Option<String> {
    pods.iter().find(|p| is_running(p)).map(|p| p.name_any())
}

fn is_running(p: &Pod) -> bool {
    p.status
        .as_ref()
        .and_then(|s| s.phase.as_deref())
        .map_or(false, |phase| phase == "Running")
}
