//! GitHub collaborators: the REST client, the per-user profile builder,
//! and the corpus crawler that feeds the candidate store.

pub mod client;
pub mod crawl;
pub mod profile;

pub use client::GithubClient;
