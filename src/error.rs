//! Error taxonomy and disposition, see the error-handling design notes.

use thiserror::Error;

pub type CaResult<T> = Result<T, CaError>;

#[derive(Debug, Error)]
pub enum CaError {
    /// Transient failure talking to the orchestrator API (list/get/update).
    #[error("orchestrator api error: {0}")]
    OrchestratorApi(String),

    /// A cloud-provider RPC (increase_size, delete_nodes, ...) failed.
    #[error("cloud provider error for node group {group}: {message}")]
    ProviderRpc { group: String, message: String },

    /// A provider operation did not complete within its deadline.
    #[error("cloud provider operation timed out for node group {0}")]
    ProviderTimeout(String),

    /// Registered member count has drifted from the group's declared target
    /// for longer than the configured drift threshold.
    #[error("node group {group} size mismatch: expected {expected}, observed {observed}")]
    SizeMismatch {
        group: String,
        expected: u64,
        observed: u64,
    },

    /// Too large a fraction of registered nodes are unready.
    #[error("cluster unhealthy: {0}")]
    ClusterUnhealthy(String),

    /// A node group's last scale-up request expired without the expected
    /// nodes registering.
    #[error("node group {0} unhealthy: scale-up request expired unmet")]
    NodeGroupUnhealthy(String),

    /// A node cannot be drained for one of the reasons in the drain
    /// classifier.
    #[error("node {node} cannot be drained: {reason}")]
    DrainBlocked { node: String, reason: DrainBlockReason },

    /// Startup configuration failed validation. Always fatal.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An estimator or expander name was requested that is not registered.
    /// Always fatal.
    #[error("unknown {kind} implementation: {name}")]
    UnknownStrategy { kind: &'static str, name: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DrainBlockReason {
    #[error("hosts an unreplicated workload")]
    Unreplicated,
    #[error("hosts a workload with local storage")]
    LocalStorage,
    #[error("hosts a system-namespace workload")]
    SystemPod,
    #[error("a matching pod disruption budget allows no further disruptions")]
    PdbBlocked,
    #[error("an owner reference could not be resolved")]
    ReferenceUnresolved,
}
