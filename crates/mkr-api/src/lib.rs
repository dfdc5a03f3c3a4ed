//! Scraping client for the MKR university timetable service.
//!
//! MKR has no public API: every query is an HTML form submission guarded by a
//! rotating anti-forgery token and a session cookie. This crate hides that
//! behind a typed async facade:
//!
//! - session bookkeeping (cookie continuity, token rotation on every exchange),
//! - the stale-token retry protocol for form submissions,
//! - select-list and embedded-JSON parsers for the returned markup,
//! - per-resource time-boxed caching of query results.
//!
//! # Example
//!
//! ```no_run
//! use mkr_api::{MkrApi, Result};
//!
//! # async fn example() -> Result<()> {
//! let api = MkrApi::builder()
//!     .base_url("https://vnz.mkr.org.ua")
//!     .build()?;
//!
//! for structure in api.load_structures().await? {
//!     println!("{}: {}", structure.id, structure.name);
//! }
//! # Ok(())
//! # }
//! ```

mod cache;
pub mod client;
pub mod error;
mod parse;
mod session;
mod transport;
pub mod types;

pub use client::{ApiBuilder, MkrApi};
pub use error::{Error, Result};
pub use types::{GroupScheduleRequest, KeyValuePair, ScheduleEvent, TeacherScheduleRequest};
