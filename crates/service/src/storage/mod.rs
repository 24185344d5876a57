//! Storage implementations for the record repository.

pub mod memory_store;

pub use memory_store::InMemoryRecordRepository;
