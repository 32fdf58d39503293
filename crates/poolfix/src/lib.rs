pub mod cache;
pub mod fetcher;
pub mod parser;
pub mod service;
pub mod types;

pub use cache::{FixtureCache, StoreError};
pub use fetcher::{FetchError, Fetcher, FetcherOptions, HttpFetcher};
pub use service::{FailurePolicy, FixtureService, ServiceError, Site};

pub const BASE_URL: &str = "https://ablefast.com";
