// Pipeline ingestion: turning uploaded bytes into header-keyed rows

pub mod decoder;

pub use decoder::{decode, decode_str};
