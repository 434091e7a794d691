//! Terminal admin console
//!
//! Login, a dashboard, and paginated CRUD screens for categories and
//! products, all driven by one event loop in [`App`].

pub mod app;
pub mod components;
pub mod screens;
pub mod traits;
pub mod ui;

pub use app::App;
pub use traits::ScreenAction;

pub use screens::{DashboardScreen, EntityScreen, LoginScreen};
