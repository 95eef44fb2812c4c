//! agon-store - Filesystem-backed token storage.

mod file;

pub use file::FileTokenStore;
