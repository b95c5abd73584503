//! In-memory cluster and fetcher used by the collector tests.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::local_k8s::kubectl::{FetchError, LogFetcher};
use crate::local_k8s::pods::{ClusterError, ClusterQuery};
use crate::mode::TunnelTarget;

pub const NAMESPACE: &str = "trident";
pub const CONTROLLER_POD: &str = "trident-controller-7d4b9";

pub fn tunnel_target() -> TunnelTarget {
    TunnelTarget {
        kubernetes_cli: "kubectl".into(),
        namespace: NAMESPACE.to_string(),
        controller_pod: CONTROLLER_POD.to_string(),
    }
}

/// Two nodes, `worker-1` (`trident-node-a`) and `worker-2` (`trident-node-b`).
pub struct FakeCluster {
    pub nodes: BTreeMap<String, String>,
    pub sidecars: HashMap<String, Vec<String>>,
    pub broken_node_listing: bool,
    pub broken_sidecar_listing: HashSet<String>,
}

impl Default for FakeCluster {
    fn default() -> Self {
        let nodes = [("worker-1", "trident-node-a"), ("worker-2", "trident-node-b")]
            .into_iter()
            .map(|(n, p)| (n.to_string(), p.to_string()))
            .collect();
        let sidecars = [
            (CONTROLLER_POD, vec!["csi-provisioner", "csi-attacher"]),
            ("trident-node-a", vec!["driver-registrar"]),
            ("trident-node-b", vec!["driver-registrar"]),
        ]
        .into_iter()
        .map(|(p, cs)| (p.to_string(), cs.into_iter().map(String::from).collect()))
        .collect();
        Self {
            nodes,
            sidecars,
            broken_node_listing: false,
            broken_sidecar_listing: HashSet::new(),
        }
    }
}

#[async_trait]
impl ClusterQuery for FakeCluster {
    async fn list_sidecars(&self, pod: &str, _namespace: &str) -> Result<Vec<String>, ClusterError> {
        if self.broken_sidecar_listing.contains(pod) {
            return Err(ClusterError::MissingSpec(pod.to_string()));
        }
        Ok(self.sidecars.get(pod).cloned().unwrap_or_default())
    }

    async fn list_nodes(&self, namespace: &str) -> Result<BTreeMap<String, String>, ClusterError> {
        if self.broken_node_listing {
            return Err(ClusterError::NoControllerPod(namespace.to_string()));
        }
        Ok(self.nodes.clone())
    }

    async fn node_pod(&self, node: &str, _namespace: &str) -> Result<String, ClusterError> {
        self.nodes
            .get(node)
            .cloned()
            .ok_or_else(|| ClusterError::NoNodePod(node.to_string()))
    }
}

/// Answers `<pod>/<container>` (plus ` previous`) and records every call.
#[derive(Default)]
pub struct FakeFetcher {
    pub failing: HashSet<(String, String)>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn failing(pairs: &[(&str, &str)]) -> Self {
        Self {
            failing: pairs
                .iter()
                .map(|(p, c)| (p.to_string(), c.to_string()))
                .collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LogFetcher for FakeFetcher {
    async fn fetch(
        &self,
        pod: &str,
        namespace: &str,
        container: &str,
        previous: bool,
    ) -> Result<Vec<u8>, FetchError> {
        assert_eq!(namespace, NAMESPACE);
        let mut line = format!("{}/{}", pod, container);
        if previous {
            line.push_str(" previous");
        }
        self.calls.lock().unwrap().push(line.clone());

        if self.failing.contains(&(pod.to_string(), container.to_string())) {
            return Err(FetchError {
                output: format!("Error from server: no logs for {}.\n", line).into_bytes(),
            });
        }
        Ok(line.into_bytes())
    }
}
