//! Request and response DTOs for the administrative API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use eventide_server_application::{RuleDraft, WorkflowDraft};
use eventide_server_domain::{ActionType, Workflow, WorkflowRule, WorkflowStatus};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub event_type: String,
    pub source: String,
    #[serde(default)]
    pub rules: Vec<WorkflowRuleRequest>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRuleRequest {
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub condition: Option<String>,
    pub action_type: ActionType,
    pub action_config: String,
}

impl From<WorkflowRequest> for WorkflowDraft {
    fn from(request: WorkflowRequest) -> Self {
        Self {
            name: request.name,
            description: request.description,
            event_type: request.event_type,
            source: request.source,
            rules: request.rules.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<WorkflowRuleRequest> for RuleDraft {
    fn from(request: WorkflowRuleRequest) -> Self {
        Self {
            priority: request.priority,
            condition: request.condition,
            action_type: request.action_type,
            action_config: request.action_config,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub event_type: String,
    pub source: String,
    pub status: WorkflowStatus,
    pub rules: Vec<WorkflowRuleResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRuleResponse {
    pub id: Uuid,
    pub priority: i32,
    pub condition: Option<String>,
    pub action_type: ActionType,
    pub action_config: String,
}

impl From<Workflow> for WorkflowResponse {
    fn from(workflow: Workflow) -> Self {
        Self {
            id: workflow.id.0,
            name: workflow.name,
            description: workflow.description,
            event_type: workflow.event_type,
            source: workflow.source,
            status: workflow.status,
            rules: workflow.rules.into_iter().map(Into::into).collect(),
            created_at: workflow.created_at,
            updated_at: workflow.updated_at,
        }
    }
}

impl From<WorkflowRule> for WorkflowRuleResponse {
    fn from(rule: WorkflowRule) -> Self {
        Self {
            id: rule.id.0,
            priority: rule.priority,
            condition: rule.condition,
            action_type: rule.action_type,
            action_config: rule.action_config,
        }
    }
}
