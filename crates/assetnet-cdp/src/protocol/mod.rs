//! CDP protocol domain types.
//!
//! Only the two domains the asset discovery engine speaks are modeled here:
//! `Network` (observational events) and `Fetch` (request interception).

pub mod fetch;
pub mod network;
