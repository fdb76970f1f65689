pub mod memory;
pub mod policy;
pub mod service;

pub use memory::MemoryLabelDetector;
pub use policy::LabelPolicy;
pub use service::{LabelDetector, RekognitionLabelDetector};
