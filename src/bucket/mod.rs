//! Versioned cache buckets for response snapshots.
//!
//! A bucket is a named persistent key-value store mapping request identities
//! to stored response snapshots. Exactly one bucket (the current version) is
//! queried at fetch time; superseded buckets are purged on activation.

mod snapshot;
mod store;

pub use snapshot::ResponseSnapshot;
pub use store::{BucketStore, NoopStore, SqliteStore};
