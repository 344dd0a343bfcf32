//! Turn history storage
//!
//! Provides [`JsonlHistoryStore`], an append-only JSONL file implementing
//! both history ports.

mod jsonl_store;

pub use jsonl_store::JsonlHistoryStore;
