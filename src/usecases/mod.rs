//! Application use cases. Orchestrate domain logic via ports.

pub mod batch_service;

pub use batch_service::BatchService;
