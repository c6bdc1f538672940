//! Configuration, domain records and the storage/queue seams

pub mod config;
pub mod models;
pub mod queue;
pub mod store;
