//! Config - 레지스트리 설정
//!
//! - `registry.rs` - RegistryConfig (signature conflict policy, slot capacity, tracing)

mod registry;

pub use registry::{ConflictPolicy, RegistryConfig, REGISTRY_CONFIG_FILE};
