//! HTTP surface: JSON handlers over `alive-core`, bearer-token middleware
//! and the router that wires them together.

pub mod auth;
pub mod checkin;
pub mod contacts;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod notifications;
pub mod routes;
pub mod state;

pub use routes::router;
pub use state::{AppState, AppStateInner};
