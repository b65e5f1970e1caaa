//! Content-addressed storage
//!
//! Checksum computation, canonical path derivation and the read-only
//! existence checks performed against the canonical store.

pub mod hash;
pub mod layout;
pub mod store;

// Re-export main types
pub use hash::{
    checksum_bytes, checksum_file, checksum_files_parallel, checksum_reader, checksum_stream,
    file_timestamp, ChecksumRequest, DEFAULT_CHUNK_SIZE,
};
#[cfg(unix)]
pub use hash::checksum_fd;
pub use layout::{CanonicalPath, CanonicalPathResolver, StorageLayout};
pub use store::ContentStore;
