// src/idealista/mod.rs
pub mod client;
pub mod models;
pub mod parser;

pub use models::{load_raw_batch, RawListing};
