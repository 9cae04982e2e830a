//! # Contest API client
//!
//! Thin typed wrapper over the contest server's REST endpoints, scoped to one
//! contest. Entity lists and edits go through `api/contests/{id}/...`; the
//! validation queue endpoints live under `contests/{id}/...`.

use regex::Regex;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::{
    error::AppError,
    models::{
        Beer, BeerLookup, Bonus, Brewery, BreweryLookup, CheckinPage, Contest, Decision,
        FieldErrors, Player,
    },
    queue::slice_bounds,
};

#[derive(Clone)]
pub struct ContestApi {
    client: Client,
    base_url: String,
    contest_id: u64,
    page_size: u32,
    token: Option<String>,
}

impl ContestApi {
    pub fn new(base_url: &str, contest_id: u64, page_size: u32, token: Option<String>) -> Self {
        Self::with_client(Client::new(), base_url, contest_id, page_size, token)
    }

    pub fn with_client(
        client: Client,
        base_url: &str,
        contest_id: u64,
        page_size: u32,
        token: Option<String>,
    ) -> Self {
        ContestApi {
            client,
            base_url: base_url.to_string(),
            contest_id,
            page_size,
            token,
        }
    }

    pub fn contest_id(&self) -> u64 {
        self.contest_id
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// `api/contests/{id}/{tail}` -- entity collections.
    fn api_url(&self, tail: &str) -> String {
        format!(
            "{}api/contests/{}/{}",
            self.base_url, self.contest_id, tail
        )
    }

    /// `contests/{id}/{tail}` -- validation endpoints.
    fn contest_url(&self, tail: &str) -> String {
        format!("{}contests/{}/{}", self.base_url, self.contest_id, tail)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: String,
        query: &[(&str, String)],
    ) -> Result<T, AppError> {
        debug!("GET {url}");
        let response = self
            .authorized(self.client.get(&url).query(query))
            .header("Accept", "application/json")
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    async fn post_json<B: Serialize + ?Sized>(&self, url: String, body: &B) -> Result<(), AppError> {
        debug!("POST {url}");
        let response = self
            .authorized(self.client.post(&url).json(body))
            .header("Accept", "application/json")
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn delete(&self, url: String) -> Result<(), AppError> {
        debug!("DELETE {url}");
        let response = self
            .authorized(self.client.delete(&url))
            .header("Accept", "application/json")
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    pub async fn contest(&self) -> Result<Contest, AppError> {
        self.get_json(
            format!("{}api/contests/{}", self.base_url, self.contest_id),
            &[],
        )
        .await
    }

    pub async fn beers(&self) -> Result<Vec<Beer>, AppError> {
        self.get_json(self.api_url("beers"), &[]).await
    }

    pub async fn breweries(&self) -> Result<Vec<Brewery>, AppError> {
        self.get_json(self.api_url("breweries"), &[]).await
    }

    pub async fn bonuses(&self) -> Result<Vec<Bonus>, AppError> {
        self.get_json(self.api_url("bonuses"), &[]).await
    }

    pub async fn players(&self) -> Result<Vec<Player>, AppError> {
        let mut players: Vec<Player> = self.get_json(self.api_url("players"), &[]).await?;
        players.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(players)
    }

    pub async fn add_entity(
        &self,
        plural: &str,
        body: &serde_json::Value,
    ) -> Result<(), AppError> {
        self.post_json(self.api_url(&format!("{plural}/")), body)
            .await
    }

    pub async fn delete_entity(&self, plural: &str, id: u64) -> Result<(), AppError> {
        self.delete(self.api_url(&format!("{plural}/{id}"))).await
    }

    /// One page of the unvalidated checkin queue, oldest first.
    pub async fn unvalidated_checkins(&self, page: u32) -> Result<CheckinPage, AppError> {
        let (start, end) = slice_bounds(page, self.page_size);
        self.get_json(
            self.contest_url("unvalidated_checkins"),
            &[
                ("slice_start", start.to_string()),
                ("slice_end", end.to_string()),
                ("page_size", self.page_size.to_string()),
            ],
        )
        .await
    }

    /// Commits a validation decision; the upstream server scores the checkin
    /// and drops it from the unvalidated list.
    pub async fn validate(&self, decision: &Decision) -> Result<(), AppError> {
        self.post_json(self.contest_url("checkins"), decision).await
    }

    /// Throws an unvalidated checkin away without scoring it.
    pub async fn dismiss(&self, checkin_id: u64) -> Result<(), AppError> {
        self.delete(self.contest_url(&format!("unvalidated_checkins/{checkin_id}")))
            .await
    }

    pub async fn lookup_beer(&self, untappd_url: &str) -> Result<BeerLookup, AppError> {
        require_untappd_url("beer", untappd_url)?;
        self.get_json(
            format!("{}api/lookup/beer", self.base_url),
            &[("url", untappd_url.to_string())],
        )
        .await
    }

    pub async fn lookup_brewery(&self, untappd_url: &str) -> Result<BreweryLookup, AppError> {
        require_untappd_url("brewery", untappd_url)?;
        self.get_json(
            format!("{}api/lookup/brewery", self.base_url),
            &[("url", untappd_url.to_string())],
        )
        .await
    }
}

/// Rejects lookup URLs that do not point at an Untappd beer or brewery page
/// before a request goes upstream.
pub fn require_untappd_url(kind: &'static str, url: &str) -> Result<(), AppError> {
    let pattern = match kind {
        "beer" => r"^https?://(www\.)?untappd\.com/b/[^/]+/\d+",
        _ => r"^https?://(www\.)?untappd\.com/(brewery|w)/[^/]+",
    };
    let re = Regex::new(pattern).expect("lookup pattern must compile");
    if re.is_match(url) {
        Ok(())
    } else {
        Err(AppError::BadLookupUrl {
            kind,
            url: url.to_string(),
        })
    }
}

async fn check(response: Response) -> Result<Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    warn!("Upstream returned {status}: {body}");
    if status == StatusCode::BAD_REQUEST {
        if let Ok(errors) = serde_json::from_str::<FieldErrors>(&body) {
            return Err(AppError::Rejected(errors));
        }
    }
    Err(AppError::UpstreamStatus { status, body })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api() -> ContestApi {
        ContestApi::new("http://localhost:8000/", 7, 25, None)
    }

    #[test]
    fn test_entity_and_contest_urls() {
        let api = api();
        assert_eq!(
            api.api_url("beers"),
            "http://localhost:8000/api/contests/7/beers"
        );
        assert_eq!(
            api.contest_url("unvalidated_checkins"),
            "http://localhost:8000/contests/7/unvalidated_checkins"
        );
        assert_eq!(
            api.contest_url("unvalidated_checkins/19"),
            "http://localhost:8000/contests/7/unvalidated_checkins/19"
        );
    }

    #[test]
    fn test_untappd_url_check() {
        assert!(require_untappd_url("beer", "https://untappd.com/b/bells-hopslam/4093").is_ok());
        assert!(
            require_untappd_url("beer", "https://www.untappd.com/b/surly-furious/1269").is_ok()
        );
        assert!(require_untappd_url("beer", "https://untappd.com/brewery/4093").is_err());
        assert!(require_untappd_url("beer", "https://example.com/b/x/1").is_err());

        assert!(require_untappd_url("brewery", "https://untappd.com/brewery/bells").is_ok());
        assert!(require_untappd_url("brewery", "https://untappd.com/w/bells/42").is_ok());
        assert!(require_untappd_url("brewery", "https://untappd.com/b/bells-hopslam/4093").is_err());
    }
}
