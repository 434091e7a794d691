//! Console screens

pub mod dashboard;
pub mod entity;
pub mod login;

pub use dashboard::{DashboardOutcome, DashboardScreen};
pub use entity::{EntityOutcome, EntityScreen};
pub use login::{LoginOutcome, LoginScreen};
