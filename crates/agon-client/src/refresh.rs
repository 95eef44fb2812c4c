//! Token refresh call.
//!
//! The refresh endpoint is reached through its own HTTP client with a short
//! timeout. It never goes through [`crate::ApiClient::send`], so a failing
//! refresh cannot trigger another refresh.

use std::time::Duration;

use tracing::{debug, instrument, trace};

use agon_core::error::{Error, HttpError};
use agon_core::{BaseUrl, RefreshToken, Result};

use crate::endpoints::{REFRESH_PATH, RefreshRequest, RefreshResponse};

#[derive(Debug, Clone)]
pub(crate) struct Refresher {
    client: reqwest::Client,
    url: String,
}

impl Refresher {
    pub(crate) fn new(base_url: &BaseUrl, timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            url: base_url.endpoint(REFRESH_PATH),
        })
    }

    /// Exchange a refresh token for a new access token.
    #[instrument(skip_all, fields(url = %self.url))]
    pub(crate) async fn refresh(&self, token: &RefreshToken) -> Result<RefreshResponse> {
        debug!("Exchanging refresh token");

        let response = self
            .client
            .post(&self.url)
            .json(&RefreshRequest {
                refresh: token.as_str(),
            })
            .send()
            .await?;

        let status = response.status();
        trace!(status = %status, "Refresh response");

        if status.is_success() {
            Ok(response.json::<RefreshResponse>().await?)
        } else {
            let bytes = response.bytes().await?;
            Err(Error::Http(HttpError::from_body(status.as_u16(), &bytes)))
        }
    }
}
