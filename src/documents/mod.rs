//! Document database access: keys, snapshots, queries and the [`DocumentStore`]
//! collaborator the dashboard reads from and writes to.
//!
//! [`InMemoryDocumentStore`] implements the full contract in process memory,
//! including live listeners, and is what tests and demos run against.

mod converter;
pub mod error;
mod evaluator;
pub(crate) mod fields;
mod key;
mod memory;
mod query;
mod snapshot;
mod store;

pub use converter::{decode_fields, encode_fields, DocumentConverter};
pub use error::{DocumentError, DocumentErrorCode, DocumentResult};
pub use key::{validate_collection_id, DocumentKey};
pub use memory::InMemoryDocumentStore;
pub use query::{FieldFilter, FilterOperator, Query};
pub use snapshot::{DocumentCursor, DocumentData, DocumentSnapshot, QuerySnapshot};
pub use store::{
    snapshot_stream, DocumentStore, ListenerRegistration, SnapshotCallback, SnapshotStream,
    Unsubscribe,
};
