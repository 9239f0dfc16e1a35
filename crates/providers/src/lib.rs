//! Concrete credential validators
//!
//! One probe per supported service, the static catalog describing them, and
//! the registry that binds catalog entries to probes at startup.

pub mod ack;
pub mod ai;
pub mod catalog;
pub mod chat;
pub mod payment;
pub mod registry;

#[cfg(test)]
mod test_support;

pub use catalog::{Catalog, Category, CategoryGroup};
pub use registry::{IMPLEMENTATIONS, Registry, UnknownProvider, probe_for};
