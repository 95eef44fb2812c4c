//! Shared state for a single CLI invocation.

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use tokio::sync::broadcast::{self, error::TryRecvError};

use agon_client::{ApiClient, ClientConfig, LoginRedirector};
use agon_core::{BaseUrl, Navigator, SessionEvent};
use agon_store::FileTokenStore;

use crate::output;

/// Token file name inside the data directory.
const TOKEN_FILE: &str = "tokens.json";

/// Client, token store and login redirect wired together for one command.
pub struct CliContext {
    client: ApiClient,
    store: Arc<FileTokenStore>,
    redirector: LoginRedirector,
    events: broadcast::Receiver<SessionEvent>,
}

impl CliContext {
    /// Build the context for a command running on `route`.
    pub fn new(api_url: &str, route: &str) -> Result<Self> {
        let base_url = BaseUrl::new(api_url).context("Invalid API URL")?;
        let store = Arc::new(FileTokenStore::new(token_path()?));

        let config = ClientConfig::new(base_url)
            .with_user_agent(concat!("agon-cli/", env!("AGON_VERSION")));
        let client =
            ApiClient::new(config, store.clone()).context("Failed to create API client")?;

        let events = client.subscribe();
        let redirector = LoginRedirector::new(Arc::new(TerminalNavigator::at(route)));

        Ok(Self {
            client,
            store,
            redirector,
            events,
        })
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn store(&self) -> &FileTokenStore {
        &self.store
    }

    /// Hand the session events raised during the command to the redirect.
    ///
    /// A deliberate `logout` is skipped, the command has already said so.
    pub fn settle(&mut self) {
        loop {
            match self.events.try_recv() {
                Ok(SessionEvent::LoggedOut) => {}
                Ok(event) => {
                    self.redirector.handle(&event);
                }
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
    }
}

/// Get the token file path, creating the data directory if needed.
fn token_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "agon").context("Could not determine data directory")?;

    let data_dir = dirs.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data directory")?;

    Ok(data_dir.join(TOKEN_FILE))
}

/// A terminal has no screens to switch between, so "navigating" to the login
/// route means telling the user to sign in again.
struct TerminalNavigator {
    route: Mutex<String>,
}

impl TerminalNavigator {
    fn at(route: &str) -> Self {
        Self {
            route: Mutex::new(route.to_string()),
        }
    }
}

impl Navigator for TerminalNavigator {
    fn current_route(&self) -> String {
        self.route
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn navigate(&self, route: &str) {
        *self.route.lock().unwrap_or_else(PoisonError::into_inner) = route.to_string();
        output::alert("Your session has expired. Run 'agon login' to sign in again.");
    }
}
