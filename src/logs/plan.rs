use tracing::debug;

use super::request::{LogRequest, LogType};
use crate::error::LogsError;
use crate::local_k8s::pods::{ClusterQuery, CONTAINER_TRIDENT};
use crate::mode::TunnelTarget;

pub const LOG_NAME_CONTROLLER: &str = "trident-controller";
pub const LOG_NAME_NODE: &str = "trident-node";

/// One log stream to fetch. Sidecars of `pod` are expanded while fetching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTarget {
    pub name: String,
    pub pod: String,
    pub container: String,
    pub previous: bool,
    pub sidecars: bool,
}

impl FetchTarget {
    pub fn sidecar_name(&self, container: &str) -> String {
        format!("{}-sidecar-{}", self.name, container)
    }
}

#[derive(Debug, Default)]
pub struct FetchPlan {
    targets: Vec<FetchTarget>,
}

impl FetchPlan {
    /// Resolves the pods behind `request`. Current instances come first,
    /// then previous ones when requested.
    ///
    /// A failed node lookup drops only the node targets. Controller targets
    /// are still planned and the failure is handed back with the plan.
    pub async fn resolve(
        request: &LogRequest,
        target: &TunnelTarget,
        cluster: &dyn ClusterQuery,
    ) -> (Self, Option<LogsError>) {
        let namespace = target.namespace.as_str();
        let controller = matches!(request.log_type, LogType::All) || request.node.is_none();

        let nodes = match (&request.log_type, &request.node) {
            (_, Some(node)) => cluster
                .node_pod(node, namespace)
                .await
                .map(|pod| vec![(node.clone(), pod)]),
            (LogType::All, None) => cluster
                .list_nodes(namespace)
                .await
                .map(|nodes| nodes.into_iter().collect()),
            (_, None) => Ok(Vec::new()),
        };
        let (nodes, failure): (Vec<(String, String)>, _) = match nodes {
            Ok(nodes) => (nodes, None),
            Err(e) => (Vec::new(), Some(LogsError::ListNodes(e))),
        };

        let mut plan = FetchPlan::default();
        let instances: &[bool] = if request.previous { &[false, true] } else { &[false] };
        for &previous in instances {
            if controller {
                plan.push(LOG_NAME_CONTROLLER, &target.controller_pod, previous, request.sidecars);
            }
            for (node, pod) in &nodes {
                let name = format!("{}-{}", LOG_NAME_NODE, node);
                plan.push(&name, pod, previous, request.sidecars);
            }
        }

        debug!(
            "resolved {} log target(s) for log type {}",
            plan.targets.len(),
            request.log_type
        );
        (plan, failure)
    }

    fn push(&mut self, base: &str, pod: &str, previous: bool, sidecars: bool) {
        let name = if previous {
            format!("{}-previous", base)
        } else {
            base.to_string()
        };
        self.targets.push(FetchTarget {
            name,
            pod: pod.to_string(),
            container: CONTAINER_TRIDENT.to_string(),
            previous,
            sidecars,
        });
    }

    pub fn targets(&self) -> &[FetchTarget] {
        &self.targets
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
