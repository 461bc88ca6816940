//! Registry Config - 레지스트리 동작 설정
//!
//! Loaded from JSON (camelCase keys), e.g.
//!
//! ```text
//! {
//!   "onConflict": "reject",
//!   "slotCapacity": 16,
//!   "traceEmissions": true
//! }
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 설정 파일명
pub const REGISTRY_CONFIG_FILE: &str = "wheel.json";

/// 같은 이름이 다른 시그니처로 존재할 때 `Registry::create` 의 동작
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// 기존 이벤트 그대로 반환
    #[default]
    Keep,
    /// `WrongType` 으로 실패
    Reject,
}

/// 레지스트리 설정 (생성되는 모든 이벤트가 상속)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryConfig {
    #[serde(default)]
    pub on_conflict: ConflictPolicy,

    /// 새 이벤트의 초기 슬롯 용량
    #[serde(default)]
    pub slot_capacity: usize,

    /// 모든 emit() 을 trace 레벨로 로깅
    #[serde(default)]
    pub trace_emissions: bool,
}

impl RegistryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.on_conflict = policy;
        self
    }

    pub fn with_slot_capacity(mut self, capacity: usize) -> Self {
        self.slot_capacity = capacity;
        self
    }

    pub fn with_trace_emissions(mut self, enabled: bool) -> Self {
        self.trace_emissions = enabled;
        self
    }

    // ========================================================================
    // Load / Save
    // ========================================================================

    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse registry config: {}", e)))
    }

    /// JSON 로드
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// JSON 로드 (Optional)
    pub fn load_optional(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }
        Self::load(path).map(Some)
    }

    /// JSON 저장
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| Error::Config(format!("Failed to create directory: {}", e)))?;
            }
        }
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize: {}", e)))?;
        std::fs::write(path, content)
            .map_err(|e| Error::Config(format!("Failed to write {}: {}", path.display(), e)))
    }
}
