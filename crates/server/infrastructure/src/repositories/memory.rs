//! In-memory workflow repository.
//!
//! Enforces the `(event_type, source)` uniqueness constraint and hands
//! out workflows with rules pre-sorted by priority, the same contract a
//! SQL-backed adapter would honor behind the port.

use async_trait::async_trait;
use tokio::sync::RwLock;

use std::collections::HashMap;

use eventide_server_domain::{RepositoryError, Workflow, WorkflowRepository};
use eventide_shared::WorkflowId;

#[derive(Debug, Default)]
pub struct InMemoryWorkflowRepository {
    workflows: RwLock<HashMap<WorkflowId, Workflow>>,
}

impl InMemoryWorkflowRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorkflowRepository for InMemoryWorkflowRepository {
    async fn find_active(
        &self,
        event_type: &str,
        source: &str,
    ) -> Result<Option<Workflow>, RepositoryError> {
        let workflows = self.workflows.read().await;
        Ok(workflows
            .values()
            .find(|w| w.is_active() && w.event_type == event_type && w.source == source)
            .cloned())
    }

    async fn find_by_id(&self, id: &WorkflowId) -> Result<Option<Workflow>, RepositoryError> {
        Ok(self.workflows.read().await.get(id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Workflow>, RepositoryError> {
        Ok(self.workflows.read().await.values().cloned().collect())
    }

    async fn save(&self, mut workflow: Workflow) -> Result<Workflow, RepositoryError> {
        workflow.sort_rules();

        let mut workflows = self.workflows.write().await;

        let conflict = workflows.values().any(|existing| {
            existing.id != workflow.id
                && existing.event_type == workflow.event_type
                && existing.source == workflow.source
        });
        if conflict {
            return Err(RepositoryError::Conflict {
                event_type: workflow.event_type.clone(),
                event_source: workflow.source.clone(),
            });
        }

        workflows.insert(workflow.id, workflow.clone());
        Ok(workflow)
    }

    async fn delete(&self, id: &WorkflowId) -> Result<(), RepositoryError> {
        self.workflows
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound(*id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eventide_server_domain::{ActionType, WorkflowRule};

    fn workflow(event_type: &str, source: &str) -> Workflow {
        Workflow::new(
            "wf".into(),
            None,
            event_type.into(),
            source.into(),
            vec![
                WorkflowRule::new(9, None, ActionType::Kafka, "{\"topic\":\"b\"}".into()),
                WorkflowRule::new(1, None, ActionType::Kafka, "{\"topic\":\"a\"}".into()),
            ],
        )
    }

    #[tokio::test]
    async fn save_and_find_active() {
        let repo = InMemoryWorkflowRepository::new();
        let saved = repo.save(workflow("customer.created", "user-service")).await.unwrap();

        let found = repo
            .find_active("customer.created", "user-service")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, saved.id);
    }

    #[tokio::test]
    async fn inactive_workflows_are_not_matched() {
        let repo = InMemoryWorkflowRepository::new();
        let mut wf = workflow("customer.created", "user-service");
        wf.toggle_status();
        repo.save(wf).await.unwrap();

        assert!(repo
            .find_active("customer.created", "user-service")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn selector_uniqueness_is_enforced() {
        let repo = InMemoryWorkflowRepository::new();
        repo.save(workflow("customer.created", "user-service")).await.unwrap();

        let err = repo
            .save(workflow("customer.created", "user-service"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict { .. }));
    }

    #[tokio::test]
    async fn resaving_the_same_workflow_is_an_update() {
        let repo = InMemoryWorkflowRepository::new();
        let mut wf = repo.save(workflow("customer.created", "user-service")).await.unwrap();

        wf.name = "renamed".into();
        let saved = repo.save(wf).await.unwrap();
        assert_eq!(saved.name, "renamed");
        assert_eq!(repo.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rules_come_back_sorted_by_priority() {
        let repo = InMemoryWorkflowRepository::new();
        let saved = repo.save(workflow("t", "s")).await.unwrap();

        let found = repo.find_by_id(&saved.id).await.unwrap().unwrap();
        let priorities: Vec<i32> = found.rules.iter().map(|r| r.priority).collect();
        assert_eq!(priorities, vec![1, 9]);
    }

    #[tokio::test]
    async fn deleting_missing_workflow_is_not_found() {
        let repo = InMemoryWorkflowRepository::new();
        assert!(matches!(
            repo.delete(&WorkflowId::new()).await.unwrap_err(),
            RepositoryError::NotFound(_)
        ));
    }
}
