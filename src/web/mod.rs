//! Web page retrieval for job postings

pub mod fetcher;

pub use fetcher::{FetchedPage, WebFetcher};
