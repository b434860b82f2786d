pub const DEFAULT_HOST: &str = "firebasestorage.googleapis.com";

/// First chunk size of a resumable upload; later chunks grow by doubling.
pub const RESUMABLE_UPLOAD_CHUNK_SIZE: usize = 256 * 1024;

pub const MAX_RESUMABLE_CHUNK_SIZE: usize = 32 * 1024 * 1024;
