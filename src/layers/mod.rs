//! # Layers
//!
//! Each layer declares one slice of the stack into a [`crate::stack::StackBuilder`]
//! and returns handles to what later layers need. Layers run in the order
//! listed here; a layer may only use handles from layers before it.

pub mod alarms;
pub mod api;
pub mod compute;
pub mod database;
pub mod edge;
pub mod iam;
pub mod network;
pub mod outputs;
pub mod pipeline;
pub mod storage;
