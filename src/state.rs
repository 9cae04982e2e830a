use std::sync::Arc;

use reqwest::Client;

use crate::{api::ContestApi, config::Config};

pub struct AppState {
    pub config: Config,
    pub client: Client,
}

impl AppState {
    pub fn new() -> Arc<Self> {
        let config = Config::load();

        Arc::new(Self {
            config,
            client: Client::new(),
        })
    }

    /// A contest-scoped API client sharing the process-wide connection pool.
    pub fn api(&self, contest_id: u64) -> ContestApi {
        ContestApi::with_client(
            self.client.clone(),
            &self.config.api_base_url,
            contest_id,
            self.config.page_size,
            self.config.api_token.clone(),
        )
    }
}
