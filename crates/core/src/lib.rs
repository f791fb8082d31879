// Core domain types for the Mosaiq multi-source metrics gateway

pub mod target;
pub mod timeline;
pub mod types;

pub use target::{ApiKind, Family, Target};
pub use timeline::{jitter, QUERY_STEP_MILLIS};
pub use types::*;
