//! Adapters. Infrastructure implementations of the port traits.

pub mod api;
pub mod submit;
pub mod ui;
