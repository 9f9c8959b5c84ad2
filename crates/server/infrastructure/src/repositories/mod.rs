//! Workflow repository adapters.

mod memory;

pub use memory::InMemoryWorkflowRepository;
