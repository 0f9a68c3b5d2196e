// Cache module for local result caching.
// Stores GitHub API responses in a single TTL-checked JSON index.

pub mod paths;
pub mod store;

pub use store::{
    CacheBackend, CacheEntry, CacheIndex, CacheStore, DEFAULT_TTL, FileBackend, Lookup,
    MemoryBackend,
};
pub(crate) use store::write_atomic;
