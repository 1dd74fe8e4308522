//! Subsystems built on the record store.

pub mod ingest;
pub mod ltv;
