//! # wheel-core
//!
//! WHEEL (Wye-Homologous Event Emitter Library) 런타임 레이어
//!
//! - `event`: 시그니처에 묶인 이벤트, 가중치 순서 디스패치, 지연 삽입/제거
//! - `registry`: 이름으로 이벤트를 생성/조회/폐기
//!
//! # 사용 예시
//!
//! ```ignore
//! use wheel_core::{Registry, RegistryConfig};
//!
//! let registry = Registry::with_config(RegistryConfig::load("wheel.json")?);
//! let saved = registry.create::<fn(String)>("file-saved")?;
//!
//! saved.on(|path: String| println!("saved {path}"))?;
//! saved.insert(|path: String| reindex(&path), 10)?;   // runs first
//!
//! saved.emit(("notes.md".to_string(),))?;
//! ```
//!
//! Callbacks are plain closures; the signature is inferred from the
//! closure's parameters and checked against the event at insert time.

pub mod event;
pub mod registry;

// Re-exports: Event
pub use event::{Event, Hook, Weight};

// Re-exports: Registry
pub use registry::Registry;

// Re-exports: Foundation
pub use wheel_foundation::{
    describe_args, Callback, ConflictPolicy, Error, Handle, Interceptor, IntoCallback,
    IntoInterceptor, RegistryConfig, Result, Signature, SignatureInfo, INVALID,
    REGISTRY_CONFIG_FILE,
};
