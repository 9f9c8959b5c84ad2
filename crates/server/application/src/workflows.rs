//! Workflow administration use-cases.
//!
//! CRUD over workflow definitions for the HTTP surface. Rules have no
//! independent lifecycle: updates replace the whole rule set.

use std::sync::Arc;

use tracing::info;

use eventide_server_domain::{RepositoryError, Workflow, WorkflowRepository, WorkflowRule};
use eventide_shared::WorkflowId;

#[derive(Debug, thiserror::Error)]
pub enum WorkflowServiceError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Input for creating or replacing a workflow.
#[derive(Debug, Clone)]
pub struct WorkflowDraft {
    pub name: String,
    pub description: Option<String>,
    pub event_type: String,
    pub source: String,
    pub rules: Vec<RuleDraft>,
}

#[derive(Debug, Clone)]
pub struct RuleDraft {
    pub priority: i32,
    pub condition: Option<String>,
    pub action_type: eventide_server_domain::ActionType,
    pub action_config: String,
}

pub struct WorkflowService {
    repository: Arc<dyn WorkflowRepository>,
}

impl WorkflowService {
    pub fn new(repository: Arc<dyn WorkflowRepository>) -> Self {
        Self { repository }
    }

    pub async fn create(&self, draft: WorkflowDraft) -> Result<Workflow, WorkflowServiceError> {
        validate_draft(&draft)?;

        let workflow = Workflow::new(
            draft.name,
            draft.description,
            draft.event_type,
            draft.source,
            draft.rules.into_iter().map(into_rule).collect(),
        );

        let saved = self.repository.save(workflow).await?;
        info!(workflow_id = %saved.id, name = %saved.name, "Workflow created");
        Ok(saved)
    }

    pub async fn list(&self) -> Result<Vec<Workflow>, WorkflowServiceError> {
        Ok(self.repository.find_all().await?)
    }

    pub async fn get(&self, id: WorkflowId) -> Result<Workflow, WorkflowServiceError> {
        self.repository
            .find_by_id(&id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(id).into())
    }

    pub async fn update(
        &self,
        id: WorkflowId,
        draft: WorkflowDraft,
    ) -> Result<Workflow, WorkflowServiceError> {
        validate_draft(&draft)?;

        let mut workflow = self.get(id).await?;
        workflow.name = draft.name;
        workflow.description = draft.description;
        workflow.event_type = draft.event_type;
        workflow.source = draft.source;
        workflow.replace_rules(draft.rules.into_iter().map(into_rule).collect());

        let saved = self.repository.save(workflow).await?;
        info!(workflow_id = %saved.id, "Workflow updated");
        Ok(saved)
    }

    pub async fn delete(&self, id: WorkflowId) -> Result<(), WorkflowServiceError> {
        self.repository.delete(&id).await?;
        info!(workflow_id = %id, "Workflow deleted");
        Ok(())
    }

    pub async fn toggle_status(&self, id: WorkflowId) -> Result<Workflow, WorkflowServiceError> {
        let mut workflow = self.get(id).await?;
        workflow.toggle_status();

        let saved = self.repository.save(workflow).await?;
        info!(workflow_id = %saved.id, status = ?saved.status, "Workflow status toggled");
        Ok(saved)
    }
}

fn validate_draft(draft: &WorkflowDraft) -> Result<(), WorkflowServiceError> {
    let required = [
        ("name", &draft.name),
        ("eventType", &draft.event_type),
        ("source", &draft.source),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(WorkflowServiceError::Validation(format!(
                "{field} is required"
            )));
        }
    }

    for rule in &draft.rules {
        if rule.action_config.trim().is_empty() {
            return Err(WorkflowServiceError::Validation(
                "actionConfig is required".to_string(),
            ));
        }
    }

    Ok(())
}

fn into_rule(draft: RuleDraft) -> WorkflowRule {
    WorkflowRule::new(
        draft.priority,
        draft.condition.filter(|c| !c.trim().is_empty()),
        draft.action_type,
        draft.action_config,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::InMemoryWorkflows;
    use eventide_server_domain::{ActionType, WorkflowStatus};

    fn service() -> WorkflowService {
        WorkflowService::new(Arc::new(InMemoryWorkflows::new()))
    }

    fn draft(event_type: &str, source: &str) -> WorkflowDraft {
        WorkflowDraft {
            name: "Customer Onboarding".into(),
            description: Some("Routes new customers".into()),
            event_type: event_type.into(),
            source: source.into(),
            rules: vec![
                RuleDraft {
                    priority: 5,
                    condition: None,
                    action_type: ActionType::Kafka,
                    action_config: "{\"topic\": \"fallback\"}".into(),
                },
                RuleDraft {
                    priority: 1,
                    condition: Some("payload.plan == 'enterprise'".into()),
                    action_type: ActionType::Webhook,
                    action_config: "{\"url\": \"https://example.com\"}".into(),
                },
            ],
        }
    }

    #[tokio::test]
    async fn create_sorts_rules_by_priority() {
        let service = service();

        let workflow = service
            .create(draft("customer.created", "user-service"))
            .await
            .unwrap();

        assert_eq!(workflow.rules[0].priority, 1);
        assert_eq!(workflow.rules[1].priority, 5);
        assert_eq!(workflow.status, WorkflowStatus::Active);
    }

    #[tokio::test]
    async fn duplicate_selector_is_a_conflict() {
        let service = service();
        service
            .create(draft("customer.created", "user-service"))
            .await
            .unwrap();

        let err = service
            .create(draft("customer.created", "user-service"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WorkflowServiceError::Repository(RepositoryError::Conflict { .. })
        ));
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let service = service();
        let mut d = draft("customer.created", "user-service");
        d.name = "  ".into();

        assert!(matches!(
            service.create(d).await.unwrap_err(),
            WorkflowServiceError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn blank_conditions_become_catch_alls() {
        let service = service();
        let mut d = draft("customer.created", "user-service");
        d.rules[1].condition = Some("   ".into());

        let workflow = service.create(d).await.unwrap();
        assert!(workflow.rules.iter().all(|r| r.condition.is_none()
            || !r.condition.as_deref().unwrap().trim().is_empty()));
    }

    #[tokio::test]
    async fn update_replaces_the_rule_set() {
        let service = service();
        let workflow = service
            .create(draft("customer.created", "user-service"))
            .await
            .unwrap();

        let mut updated = draft("customer.created", "user-service");
        updated.rules.truncate(1);
        let workflow = service.update(workflow.id, updated).await.unwrap();

        assert_eq!(workflow.rules.len(), 1);
    }

    #[tokio::test]
    async fn get_missing_workflow_is_not_found() {
        let service = service();

        let err = service.get(WorkflowId::new()).await.unwrap_err();
        assert!(matches!(
            err,
            WorkflowServiceError::Repository(RepositoryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn toggle_round_trips_status() {
        let service = service();
        let workflow = service
            .create(draft("customer.created", "user-service"))
            .await
            .unwrap();

        let toggled = service.toggle_status(workflow.id).await.unwrap();
        assert_eq!(toggled.status, WorkflowStatus::Inactive);

        let back = service.toggle_status(workflow.id).await.unwrap();
        assert_eq!(back.status, WorkflowStatus::Active);
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let service = service();
        let workflow = service
            .create(draft("customer.created", "user-service"))
            .await
            .unwrap();

        service.delete(workflow.id).await.unwrap();
        assert!(service.get(workflow.id).await.is_err());
    }
}
