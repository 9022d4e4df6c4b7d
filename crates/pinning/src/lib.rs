//! Pin listing export for pinshift.
//!
//! This crate provides:
//! - The `PinListing` abstraction over a paginated pin listing endpoint
//! - `fetch_all`, which pages through a listing into one ordered result
//! - `PinningClient`, the HTTP implementation for the pinning service API

pub mod client;
pub mod error;
pub mod listing;

pub use client::PinningClient;
pub use error::{PinningError, PinningResult};
pub use listing::{ListingPage, PinListing, fetch_all};
