pub mod api;
pub mod config;
pub mod humanize;
pub mod observability;
pub mod retrieval;
pub mod sanitize;
pub mod storage;
pub mod streaming;
