//! The choreography engine.
//!
//! Per-event pipeline:
//!
//! ```text
//! dedup gate → workflow lookup → per rule (priority ascending):
//!     evaluate condition → decode actionConfig → dispatch
//!                                      └─ any failure → DLQ
//! ```
//!
//! The engine is stateless beyond its injected ports, so it is safe to
//! invoke concurrently from the bus consumer and the administrative
//! event-submission endpoint. Rules dispatch independently: one rule's
//! failure never stops the next rule from being evaluated.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, error, info};

use eventide_server_domain::condition;
use eventide_server_domain::{IncomingEvent, WorkflowRepository, WorkflowRule};

use crate::dedup::DeduplicationService;
use crate::dispatcher::{ActionDispatcher, DispatchError};
use crate::dlq::DlqService;

pub struct ChoreographyEngine {
    repository: Arc<dyn WorkflowRepository>,
    dispatcher: ActionDispatcher,
    dedup: DeduplicationService,
    dlq: DlqService,
}

impl ChoreographyEngine {
    pub fn new(
        repository: Arc<dyn WorkflowRepository>,
        dispatcher: ActionDispatcher,
        dedup: DeduplicationService,
        dlq: DlqService,
    ) -> Self {
        Self {
            repository,
            dispatcher,
            dedup,
            dlq,
        }
    }

    /// Run one event through the pipeline. Side-effecting; never fails:
    /// every failure mode ends in a log line, a DLQ entry, or both.
    pub async fn process(&self, event: &IncomingEvent) {
        info!(
            event_type = %event.event_type,
            source = %event.source,
            event_id = %event.event_id,
            "Processing event"
        );

        if self.dedup.is_duplicate(&event.event_id).await {
            info!(event_id = %event.event_id, "Skipping duplicate event");
            return;
        }

        let workflow = match self
            .repository
            .find_active(&event.event_type, &event.source)
            .await
        {
            Ok(Some(workflow)) => workflow,
            Ok(None) => {
                debug!(
                    event_type = %event.event_type,
                    source = %event.source,
                    "No active workflow for event"
                );
                return;
            }
            Err(e) => {
                error!(error = %e, "Workflow lookup failed");
                return;
            }
        };

        info!(workflow = %workflow.name, workflow_id = %workflow.id, "Matched workflow");

        for rule in &workflow.rules {
            if !condition::evaluate(rule.condition.as_deref(), &event.payload) {
                debug!(priority = rule.priority, condition = ?rule.condition, "Rule skipped");
                continue;
            }

            info!(
                priority = rule.priority,
                action = %rule.action_type,
                "Rule matched"
            );

            if let Err(e) = self.run_rule(rule, event).await {
                error!(rule_id = %rule.id, error = %e, "Failed to dispatch action");

                // Carry the attempt count forward if this event came back
                // through the retry loop.
                let retry_count = event.retry_count();
                self.dlq
                    .enqueue_failure(event, &e.to_string(), retry_count)
                    .await;
            }
        }
    }

    async fn run_rule(
        &self,
        rule: &WorkflowRule,
        event: &IncomingEvent,
    ) -> Result<(), DispatchError> {
        let config: Map<String, Value> = serde_json::from_str(&rule.action_config)
            .map_err(|e| DispatchError::InvalidConfig(e.to_string()))?;

        self.dispatcher
            .dispatch(rule.action_type, &config, event)
            .await
    }
}
