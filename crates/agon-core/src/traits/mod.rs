//! Core traits at the seams between the client, its storage and the UI.

mod identity;
mod navigator;
mod store;

pub use identity::{IdentitySource, LivenessProbe};
pub use navigator::Navigator;
pub use store::{StorageKey, TokenStore};
