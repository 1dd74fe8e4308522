//! Core modules: the event model, the record store and the shared
//! primitives (errors, config, journal, time, console rendering).

pub mod config;
pub mod error;
pub mod event;
pub mod journal;
pub mod store;
pub mod time;
pub mod tui;
pub mod validate;
