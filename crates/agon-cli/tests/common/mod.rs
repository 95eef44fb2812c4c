//! Helpers for running the `agon` binary against a mock backend.

#![allow(dead_code)]

use std::path::PathBuf;
use std::process::{Command, Output};

use tempfile::TempDir;
use wiremock::MockServer;

use agon_core::{StorageKey, TokenStore};
use agon_store::FileTokenStore;

/// An isolated HOME plus the API URL the CLI should talk to.
pub struct TestEnv {
    home: TempDir,
    api_url: String,
}

impl TestEnv {
    /// Environment pointing at a wiremock server.
    pub fn new(server: &MockServer) -> Self {
        Self::with_api_url(format!("http://127.0.0.1:{}/api", server.address().port()))
    }

    pub fn with_api_url(api_url: impl Into<String>) -> Self {
        Self {
            home: TempDir::new().expect("Failed to create temp HOME"),
            api_url: api_url.into(),
        }
    }

    /// Where the CLI keeps its tokens under this HOME.
    pub fn token_path(&self) -> PathBuf {
        self.home.path().join("data").join("agon").join("tokens.json")
    }

    /// Token store backed by the CLI's token file.
    pub fn store(&self) -> FileTokenStore {
        FileTokenStore::new(self.token_path())
    }

    /// Pretend an earlier `agon login` stored these tokens.
    pub fn seed_session(&self, access: &str, refresh: Option<&str>) {
        let store = self.store();
        store.set(StorageKey::AccessToken, access).unwrap();
        if let Some(refresh) = refresh {
            store.set(StorageKey::RefreshToken, refresh).unwrap();
        }
        store.set(StorageKey::Username, "1001234567").unwrap();
    }

    pub fn stored(&self, key: StorageKey) -> Option<String> {
        self.store().get(key).unwrap()
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_agon"));
        cmd.args(args);
        cmd.env("HOME", self.home.path());
        cmd.env("XDG_DATA_HOME", self.home.path().join("data"));
        cmd.env("AGON_API_URL", &self.api_url);
        cmd.env("NO_COLOR", "1");
        cmd.env_remove("AGON_USERNAME");
        cmd.env_remove("AGON_PASSWORD");
        cmd.env_remove("RUST_LOG");
        cmd
    }

    /// Run the CLI off the async runtime so the mock server keeps serving.
    pub async fn run(&self, args: &[&str]) -> Output {
        let mut cmd = self.command(args);
        tokio::task::spawn_blocking(move || cmd.output().expect("Failed to execute CLI"))
            .await
            .expect("CLI task panicked")
    }

    /// Run the CLI and expect success, returning stdout.
    pub async fn run_success(&self, args: &[&str]) -> String {
        let output = self.run(args).await;
        if !output.status.success() {
            panic!(
                "CLI command failed: {:?}\nstderr: {}",
                args,
                String::from_utf8_lossy(&output.stderr)
            );
        }
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    /// Run the CLI and expect failure, returning stderr.
    pub async fn run_failure(&self, args: &[&str]) -> String {
        let output = self.run(args).await;
        if output.status.success() {
            panic!(
                "CLI command should have failed: {:?}\nstdout: {}",
                args,
                String::from_utf8_lossy(&output.stdout)
            );
        }
        String::from_utf8_lossy(&output.stderr).to_string()
    }
}
