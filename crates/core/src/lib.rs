//! Kitasuro domain core.
//!
//! Pure logic shared by the database, event and API crates: comment anchors
//! and their render-time resolution, the itinerary aggregate and its pricing,
//! tour form validation, proposal lifecycle and onboarding status. Nothing
//! in here performs I/O.

pub mod anchor;
pub mod comment;
pub mod error;
pub mod itinerary;
pub mod onboarding;
pub mod overlay;
pub mod pricing;
pub mod proposal;
pub mod roles;
pub mod session;
pub mod theme;
pub mod tour_form;
pub mod types;
