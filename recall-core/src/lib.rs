//! # recall-core
//!
//! Long-term memory for conversational characters.
//!
//! Every character owns a [`MemoryEngine`] over a [`VectorStore`]:
//!
//! - **Ingestion**: unrated memories get a poignancy rating from the LLM,
//!   missing embeddings are backfilled, then the memory is indexed.
//! - **Retrieval**: one or more query memories are embedded concurrently,
//!   each asks the store for its own top-k, and the candidates are merged by
//!   description (max score wins), ranked and truncated.
//!
//! The store itself is a boundary: [`store::BruteForceStore`] and
//! [`store::HnswStore`] are the in-process implementations.

#![deny(clippy::unwrap_used)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod aggregation;
pub mod config;
pub mod embedding;
pub mod error;
pub mod store;
pub mod types;

pub use aggregation::MemoryEngine;
pub use config::{GeneralConfig, MemoryConfig, RecallConfig, StoreKind};
pub use error::{RecallError, Result};
pub use store::VectorStore;
pub use types::*;
