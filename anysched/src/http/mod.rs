//! REST plumbing shared by the backend adapters

pub mod client;

pub use client::HttpClient;
