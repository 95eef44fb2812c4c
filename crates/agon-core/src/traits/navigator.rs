//! Navigation seam for the UI layer.

/// The piece of the front end that owns routing.
///
/// The client never navigates itself; a redirector listening for session
/// events calls into this trait.
pub trait Navigator: Send + Sync {
    /// The route currently shown.
    fn current_route(&self) -> String;

    /// Move to `route`.
    fn navigate(&self, route: &str);
}
