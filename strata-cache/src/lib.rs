//! STRATA Cache - Memoization and Named Locks
//!
//! Two long-lived singletons shared by request-scoped workers:
//!
//! - [`CacheService`]: keyed, stampede-safe memoization with hierarchical
//!   invalidation. At most one factory runs per key at any moment; unrelated
//!   keys never contend.
//! - [`LockService`]: a registry of named mutexes for caller-defined
//!   critical sections, opaque to the cache.
//!
//! Neither component knows about entities or storage; keys are ordered
//! tuples of string parts joined with a two-underscore separator.

mod config;
mod lock;
mod service;

pub use config::CacheSettings;
pub use lock::{LockHandle, LockService};
pub use service::{compose_key, CacheService, CachedValue, KEY_SEPARATOR};
