// src/normalize/mod.rs
pub mod assembler;
pub mod table;

pub use assembler::normalize_batch;
pub use table::to_record_batch;
