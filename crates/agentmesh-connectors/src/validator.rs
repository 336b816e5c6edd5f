//! Connection validation: decides which probes to run for a backend selection and folds
//! their outcomes into one [`ConnectionResult`].

use crate::error::ProbeError;
use crate::probe::{into_connection_result, ProbeRegistry, ProbeReport};
use agentmesh_core::{BackendDescriptor, BackendType, ConnectionResult, N8nHealth, WorkflowType};
use std::sync::Arc;

pub struct ConnectionValidator {
    registry: Arc<ProbeRegistry>,
}

impl ConnectionValidator {
    pub fn new(registry: Arc<ProbeRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ProbeRegistry {
        &self.registry
    }

    /// Runs the single probe registered for `backend`.
    pub async fn probe(&self, backend: BackendType) -> Result<ProbeReport, ProbeError> {
        let probe = self.registry.get(backend).ok_or(ProbeError::Unsupported(backend))?;
        let outcome = probe.probe().await;
        match &outcome {
            Ok(report) => tracing::debug!(target: "agentmesh::probe", backend = %backend, message = %report.message, "Probe succeeded"),
            Err(e) => tracing::info!(target: "agentmesh::probe", backend = %backend, error = %e, "Probe failed"),
        }
        outcome
    }

    /// Validates a backend. Demo mode answers immediately without any network call.
    /// `workflow` only matters for n8n, where it selects the model API checked behind it.
    pub async fn validate(
        &self,
        backend: BackendType,
        use_demo_mode: bool,
        workflow: Option<WorkflowType>,
    ) -> ConnectionResult {
        if use_demo_mode {
            return ConnectionResult::demo();
        }
        match backend {
            BackendType::N8n => {
                let health = self.n8n_health(workflow).await;
                ConnectionResult {
                    success: health.n8n_available,
                    message: health.message,
                    model_available: health.model_available,
                }
            }
            other => into_connection_result(self.probe(other).await),
        }
    }

    pub async fn validate_descriptor(&self, descriptor: BackendDescriptor, use_demo_mode: bool) -> ConnectionResult {
        match descriptor.probe_target() {
            Some((backend, workflow)) => self.validate(backend, use_demo_mode, workflow).await,
            None => ConnectionResult::demo(),
        }
    }

    /// Two-stage n8n check: the engine first, then the model API its workflow depends on.
    ///
    /// A model failure leaves n8n usable, so it is reported as a warning rather than as
    /// unavailability. The model API is never contacted when n8n itself is down.
    pub async fn n8n_health(&self, workflow: Option<WorkflowType>) -> N8nHealth {
        let workflow_type = workflow.unwrap_or_default();
        let engine = match self.probe(BackendType::N8n).await {
            Ok(report) => report,
            Err(e) => {
                return N8nHealth {
                    n8n_available: false,
                    model_available: None,
                    message: e.to_string(),
                    workflow: workflow_type,
                }
            }
        };

        let model = match workflow.and_then(|w| w.model_backend()) {
            Some(model) => model,
            None => {
                return N8nHealth {
                    n8n_available: true,
                    model_available: None,
                    message: engine.message,
                    workflow: workflow_type,
                }
            }
        };

        match self.probe(model).await {
            Ok(report) => N8nHealth {
                n8n_available: true,
                model_available: Some(true),
                message: format!("{} and {}", engine.message, report.message),
                workflow: workflow_type,
            },
            Err(e) => {
                tracing::warn!(
                    target: "agentmesh::probe",
                    workflow = %workflow_type,
                    error = %e,
                    "n8n reachable but workflow model check failed"
                );
                N8nHealth {
                    n8n_available: true,
                    model_available: Some(false),
                    message: format!("{}, but warning: {}", engine.message, e),
                    workflow: workflow_type,
                }
            }
        }
    }
}
