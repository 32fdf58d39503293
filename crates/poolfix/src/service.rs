use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;

use crate::cache::{FixtureCache, StoreError};
use crate::fetcher::{FetchError, Fetcher};
use crate::parser::{parse_fixtures, parse_weeks};
use crate::types::{FixtureRecord, FixturesResponse, LATEST_WEEK, WeekEntry};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Failed to fetch upstream page: {0}")]
    Fetch(#[from] FetchError),
    #[error("Fixture cache failure: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid failure policy '{0}'. Accepted values: 'strict', 'lenient'")]
pub struct FailurePolicyParseError(String);

/// What an upstream fetch failure turns into.
///
/// `Strict` surfaces it to the caller. `Lenient` logs it and answers with an
/// empty list that is not written to the cache. Store failures surface under
/// both policies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    #[default]
    Strict,
    Lenient,
}

impl FromStr for FailurePolicy {
    type Err = FailurePolicyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(FailurePolicy::Strict),
            "lenient" => Ok(FailurePolicy::Lenient),
            _ => Err(FailurePolicyParseError(s.to_string())),
        }
    }
}

impl Display for FailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailurePolicy::Strict => write!(f, "strict"),
            FailurePolicy::Lenient => write!(f, "lenient"),
        }
    }
}

/// Upstream page locations.
#[derive(Debug, Clone)]
pub struct Site {
    base_url: String,
}

impl Site {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn latest_url(&self) -> String {
        format!("{}/", self.base_url)
    }

    pub fn results_url(&self, date: &str) -> String {
        format!("{}/results/{}", self.base_url, date)
    }
}

impl Default for Site {
    fn default() -> Self {
        Self::new(crate::BASE_URL)
    }
}

/// Serves fixtures from the cache, scraping the site on a miss.
pub struct FixtureService {
    fetcher: Arc<dyn Fetcher>,
    cache: FixtureCache,
    site: Site,
    policy: FailurePolicy,
}

impl FixtureService {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        cache: FixtureCache,
        site: Site,
        policy: FailurePolicy,
    ) -> Self {
        Self {
            fetcher,
            cache,
            site,
            policy,
        }
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    pub async fn latest_fixtures(&self) -> Result<FixturesResponse, ServiceError> {
        let url = self.site.latest_url();
        self.cached_fixtures(LATEST_WEEK, &url).await
    }

    pub async fn fixtures_for_date(&self, date: &str) -> Result<FixturesResponse, ServiceError> {
        let url = self.site.results_url(date);
        self.cached_fixtures(date, &url).await
    }

    /// Lists the weeks offered by the site's week picker. Never cached.
    pub async fn available_weeks(&self) -> Result<Vec<WeekEntry>, ServiceError> {
        let url = self.site.latest_url();
        let Some(html) = self.fetch(&url).await? else {
            return Ok(Vec::new());
        };
        let weeks = parse_weeks(&html);
        log::info!("Found {} week(s) on {}", weeks.len(), url);
        Ok(weeks)
    }

    async fn cached_fixtures(
        &self,
        key: &str,
        url: &str,
    ) -> Result<FixturesResponse, ServiceError> {
        if let Some(set) = self.cache.lookup(key).await? {
            log::info!("Serving fixtures from cache: {}", key);
            return Ok(FixturesResponse::from_cache(set));
        }

        let Some(html) = self.fetch(url).await? else {
            return Ok(FixturesResponse::fresh(key, Vec::new()));
        };
        let fixtures: Vec<FixtureRecord> = parse_fixtures(&html);
        log::info!("Scraped {} fixture(s) for {}", fixtures.len(), key);

        self.cache.upsert(key, &fixtures).await?;
        Ok(FixturesResponse::fresh(key, fixtures))
    }

    /// `Ok(None)` means the fetch failed and the lenient policy swallowed it.
    async fn fetch(&self, url: &str) -> Result<Option<String>, ServiceError> {
        match self.fetcher.fetch(url).await {
            Ok(html) => Ok(Some(html)),
            Err(e) if self.policy == FailurePolicy::Lenient => {
                log::warn!("Fetch of {} failed, answering with an empty list: {}", url, e);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}
