//! Domain layer of the Eventide choreography platform.
//!
//! Holds the wire types flowing through the pipeline ([`events`],
//! [`dlq`]), the workflow aggregate ([`workflows`]), the condition
//! expression evaluator ([`condition`]) and the ports implemented by the
//! infrastructure layer ([`ports`]). Everything here is side-effect free;
//! I/O lives behind the port traits.

pub mod condition;
pub mod dlq;
pub mod events;
pub mod ports;
pub mod workflows;

pub use condition::Condition;
pub use dlq::{DeadEnvelope, DlqEnvelope, RawDlqEnvelope};
pub use events::{IncomingEvent, RETRY_COUNT_FIELD};
pub use ports::{
    BusError, EventBus, HttpClient, HttpError, KeyValueStore, KvError, RepositoryError,
    WorkflowRepository,
};
pub use workflows::{ActionType, Workflow, WorkflowRule, WorkflowStatus};
