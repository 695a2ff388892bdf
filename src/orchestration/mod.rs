//! # Orchestration
//!
//! Discovery, ordering and batched execution of resource actions.
//!
//! ## Execution strategies
//!
//! - **sequential**: one resource at a time in sorted order.
//! - **parallel**: every resource at once.
//! - **grouped_parallel** (default): equal priorities run concurrently; each
//!   priority group completes fully before the next one is dispatched.
//!
//! Start sorts by ascending priority and stop by descending. Status is never
//! sorted and never mutates or notifies.

mod executor;
pub mod orchestrator;
pub mod planning;

pub use orchestrator::{Orchestrator, OrchestratorBuilder};
pub use planning::{order_for_action, partition_by_priority, plan_batches, resolve_regions, Batch};
