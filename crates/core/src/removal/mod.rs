//! The safe bucket-removal workflow
//!
//! A removal request flows through endpoint resolution, an emptiness
//! pre-flight, optional recursive cleanup (enumerate → plan → execute,
//! pipelined), and a mandatory emptiness re-check before the bucket itself
//! is removed.

pub mod enumerate;
pub mod execute;
pub mod guard;
pub mod plan;
pub mod resolver;
pub mod workflow;

pub use enumerate::ObjectVersionEnumerator;
pub use execute::DeletionExecutor;
pub use plan::DeletionPlanner;
pub use resolver::{DEFAULT_REGION, EndpointResolver, regional_endpoint};
pub use workflow::{RemovalSummary, RemovalWorkflow};
