#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! Place search: the Tencent suggestion API behind a trait, plus the retry
//! and pagination loop every institution query goes through.

/// `[search]` and `[retry]` settings.
#[path = "../settings.rs"]
pub mod settings;

/// Search and fetch errors.
#[path = "../error.rs"]
pub mod error;

/// Client trait and the Tencent binding.
#[path = "../client.rs"]
pub mod client;

/// Retry and backoff policy.
#[path = "../retry.rs"]
pub mod retry;

/// Paged harvesting of one keyword.
#[path = "../pager.rs"]
pub mod pager;

pub use client::{
    sign_request, Credentials, PageRequest, PlaceSearchClient, SearchPage, TencentPlaceClient,
};
pub use error::{FetchError, SearchError};
pub use pager::{total_pages, HarvestEnd, PageFetcher, PageHarvest, RetryNotice};
pub use retry::{Backoff, RetryPolicy};
pub use settings::{RetrySettings, SearchSettings};
