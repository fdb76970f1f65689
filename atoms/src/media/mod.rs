pub mod memory;
pub mod model;
pub mod service;

pub use memory::{MemoryBlobStore, SignedUrl};
pub use model::{image_key, DEFAULT_CONTENT_TYPE};
pub use service::{BlobStore, S3BlobStore};
