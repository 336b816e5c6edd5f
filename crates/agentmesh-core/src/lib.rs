//! agentmesh-core: shared types, configuration, session state and workflow-response
//! normalization for the AgentMesh gateway. No network I/O lives here.

mod agents;
pub mod normalizer;
mod session;
pub mod settings;
mod shared;

pub use agents::{base_agent_id, coordinator, find_agent, AgentProfile, AGENTS, COORDINATOR_ID};
pub use normalizer::{
    normalize, normalize_at, MessageType, N8nPayload, NormalizedMessage, NormalizedResponse, ResponseStatus, Role,
};
pub use session::{ConnectionState, ConnectionStatus, SessionState, SessionStore};
pub use settings::{workflow_env_var, CoreConfig, ProviderSettings};
pub use shared::{
    BackendDescriptor, BackendType, ConnectionResult, N8nHealth, UnknownVariant, WorkflowRequest, WorkflowType,
    DEMO_MODE_MESSAGE,
};
