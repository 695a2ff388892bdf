//! # Registry Infrastructure
//!
//! Maps resource-type tags to handler constructors.

pub mod handler_factory;

pub use handler_factory::{HandlerConstructor, HandlerFactory};
