//! agon-core - Core types and traits for the AGON portal API client.

pub mod credentials;
pub mod error;
pub mod events;
pub mod memory;
pub mod request;
pub mod tokens;
pub mod traits;
pub mod types;

pub use credentials::Credentials;
pub use error::Error;
pub use events::{InvalidationReason, SessionEvent};
pub use memory::MemoryTokenStore;
pub use request::{ApiRequest, ApiResponse, LOGIN_PATH, REFRESH_PATH};
pub use tokens::{AccessToken, RefreshToken, TokenPair};
pub use traits::{IdentitySource, LivenessProbe, Navigator, StorageKey, TokenStore};
pub use types::{BaseUrl, Role, User};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
