//! `Tickbox`: a local-first todo list with retrying persistence.

pub mod app;
pub mod config;
pub mod persistence;
pub mod report;
pub mod store;
pub mod tasks;
