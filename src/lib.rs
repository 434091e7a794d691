//! posadmin: terminal admin console for an inventory / point-of-sale backend

pub mod api;
pub mod cli;
pub mod config;
pub mod console;
pub mod models;
pub mod session;
