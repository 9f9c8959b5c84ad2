//! Workflow aggregate: a `(eventType, source)` selector plus an ordered
//! sequence of condition → action rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use eventide_shared::{RuleId, WorkflowId};

/// Whether a workflow is actively listening for events or paused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowStatus {
    Active,
    Inactive,
}

impl WorkflowStatus {
    pub fn toggled(self) -> Self {
        match self {
            Self::Active => Self::Inactive,
            Self::Inactive => Self::Active,
        }
    }
}

/// The side effect a rule fires when its condition matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    /// Publish the event payload onto a bus topic.
    Kafka,
    /// POST the whole event to an external URL.
    Webhook,
    /// Generic HTTP call with configurable method and headers.
    Http,
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Kafka => write!(f, "KAFKA"),
            Self::Webhook => write!(f, "WEBHOOK"),
            Self::Http => write!(f, "HTTP"),
        }
    }
}

/// A single condition → action pair owned by a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRule {
    pub id: RuleId,
    /// Rules are evaluated in ascending priority order.
    pub priority: i32,
    /// Condition expression evaluated against the event payload.
    /// `None` or blank always matches (catch-all rule).
    pub condition: Option<String>,
    pub action_type: ActionType,
    /// JSON object with action-specific configuration:
    /// KAFKA `{"topic": "...", "key": "..."}`, WEBHOOK `{"url": "..."}`,
    /// HTTP `{"url": "...", "method": "POST", "headers": {...}}`.
    pub action_config: String,
}

impl WorkflowRule {
    pub fn new(
        priority: i32,
        condition: Option<String>,
        action_type: ActionType,
        action_config: String,
    ) -> Self {
        Self {
            id: RuleId::new(),
            priority,
            condition,
            action_type,
            action_config,
        }
    }
}

/// A workflow: what event to listen for, where it comes from, and what to
/// do when it arrives.
///
/// At most one workflow exists per `(event_type, source)` pair; the
/// repository enforces the constraint. Rules are kept sorted by priority
/// ascending, ties in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: WorkflowId,
    pub name: String,
    pub description: Option<String>,
    pub event_type: String,
    pub source: String,
    pub status: WorkflowStatus,
    pub rules: Vec<WorkflowRule>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Workflow {
    pub fn new(
        name: String,
        description: Option<String>,
        event_type: String,
        source: String,
        rules: Vec<WorkflowRule>,
    ) -> Self {
        let now = Utc::now();
        let mut workflow = Self {
            id: WorkflowId::new(),
            name,
            description,
            event_type,
            source,
            status: WorkflowStatus::Active,
            rules,
            created_at: now,
            updated_at: now,
        };
        workflow.sort_rules();
        workflow
    }

    pub fn is_active(&self) -> bool {
        self.status == WorkflowStatus::Active
    }

    /// Replace the rule set wholesale; rules have no life of their own
    /// outside their workflow.
    pub fn replace_rules(&mut self, rules: Vec<WorkflowRule>) {
        self.rules = rules;
        self.sort_rules();
        self.touch();
    }

    pub fn toggle_status(&mut self) {
        self.status = self.status.toggled();
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Stable sort, so equal priorities keep their insertion order.
    pub fn sort_rules(&mut self) {
        self.rules.sort_by_key(|rule| rule.priority);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(priority: i32, config: &str) -> WorkflowRule {
        WorkflowRule::new(priority, None, ActionType::Kafka, config.to_string())
    }

    #[test]
    fn rules_are_sorted_by_priority_on_construction() {
        let workflow = Workflow::new(
            "wf".into(),
            None,
            "customer.created".into(),
            "user-service".into(),
            vec![rule(5, "a"), rule(1, "b"), rule(3, "c")],
        );

        let priorities: Vec<i32> = workflow.rules.iter().map(|r| r.priority).collect();
        assert_eq!(priorities, vec![1, 3, 5]);
    }

    #[test]
    fn equal_priorities_keep_insertion_order() {
        let workflow = Workflow::new(
            "wf".into(),
            None,
            "t".into(),
            "s".into(),
            vec![rule(5, "first"), rule(1, "second"), rule(5, "third")],
        );

        let configs: Vec<&str> = workflow
            .rules
            .iter()
            .map(|r| r.action_config.as_str())
            .collect();
        assert_eq!(configs, vec!["second", "first", "third"]);
    }

    #[test]
    fn new_workflows_start_active() {
        let workflow = Workflow::new("wf".into(), None, "t".into(), "s".into(), vec![]);
        assert!(workflow.is_active());
    }

    #[test]
    fn toggle_flips_status_and_touches() {
        let mut workflow = Workflow::new("wf".into(), None, "t".into(), "s".into(), vec![]);
        let before = workflow.updated_at;

        workflow.toggle_status();
        assert_eq!(workflow.status, WorkflowStatus::Inactive);
        workflow.toggle_status();
        assert_eq!(workflow.status, WorkflowStatus::Active);
        assert!(workflow.updated_at >= before);
    }

    #[test]
    fn status_serializes_screaming_snake_case() {
        assert_eq!(
            serde_json::to_string(&WorkflowStatus::Active).unwrap(),
            "\"ACTIVE\""
        );
        assert_eq!(
            serde_json::to_string(&ActionType::Webhook).unwrap(),
            "\"WEBHOOK\""
        );
    }

    #[test]
    fn replace_rules_resorts() {
        let mut workflow = Workflow::new("wf".into(), None, "t".into(), "s".into(), vec![]);
        workflow.replace_rules(vec![rule(9, "a"), rule(2, "b")]);
        assert_eq!(workflow.rules[0].priority, 2);
    }
}
