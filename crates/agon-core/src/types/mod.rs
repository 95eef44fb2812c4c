//! Core AGON types.
//!
//! These types enforce invariants at construction time, so a client can only
//! be built against a well-formed backend address.

mod base_url;
mod user;

pub use base_url::BaseUrl;
pub use user::{Role, User};
