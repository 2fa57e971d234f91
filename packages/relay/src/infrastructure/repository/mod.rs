//! Message history storage implementations.
//!
//! - `inmemory`: bounded per-workspace buffers

pub mod inmemory;

pub use inmemory::InMemoryMessageRepository;
