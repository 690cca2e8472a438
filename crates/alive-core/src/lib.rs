//! Check-in, inactivity detection and contact notification.
//!
//! Everything here works against an injected [`alive_db::RecordStore`] and a
//! pair of [`channels::Channel`]s, so the HTTP layer and the scheduler share
//! one implementation.

pub mod accounts;
pub mod channels;
pub mod checkin;
pub mod contacts;
pub mod error;
pub mod fanout;
pub mod history;
pub mod scanner;
pub mod scheduler;
pub mod templates;

mod convert;

pub use error::{CoreError, CoreResult};

#[cfg(test)]
pub(crate) mod testutil;
