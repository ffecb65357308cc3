/// Generated identities are UUIDv4. The engine is storage-agnostic; ids are
/// minted at build/audit time and are not stable across rebuilds (content
/// fingerprints are, see [`crate::hashing`]).
pub type EntityId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
