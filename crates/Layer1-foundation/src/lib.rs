//! # wheel-foundation
//!
//! Foundation layer for WHEEL (Wye-Homologous Event Emitter Library):
//! - Error: 에러 모델 (WrongType, WrongArguments, NoSuchEvent, ...)
//! - Handle: 콜백 위치를 공유하는 셀
//! - Signature: 콜백 시그니처 식별 및 타입 소거
//! - Config: 레지스트리 설정 (JSON)
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  wheel-core                                              │
//! │  Registry ──name──► Event ──► Slot { callback, handle } │
//! │                                                          │
//! │                     │ uses                               │
//! │                     ▼                                    │
//! │  wheel-foundation                                        │
//! │  SignatureInfo · Callback · Interceptor · Handle · Error │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod handle;
pub mod signature;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Handle
// ============================================================================
pub use handle::{Handle, INVALID};

// ============================================================================
// Signature (타입 식별)
// ============================================================================
pub use signature::{
    describe_args, Callback, Interceptor, IntoCallback, IntoInterceptor, Signature,
    SignatureInfo,
};

// ============================================================================
// Config (설정)
// ============================================================================
pub use config::{ConflictPolicy, RegistryConfig, REGISTRY_CONFIG_FILE};
