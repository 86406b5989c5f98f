//! Infrastructure layer - Adapters for CloudStack, caches, and observability

pub mod cache;
pub mod cloudstack;
pub mod logging;
pub mod observability;
pub mod services;
