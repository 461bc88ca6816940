//! Registry - 이름으로 이벤트 관리
//!
//! Events are created once per name and bound to a signature for life.
//! Lookups hand out `Arc<Event>`; emitting never touches the registry lock.

use crate::event::{self, Event};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};
use wheel_foundation::{
    ConflictPolicy, Error, Handle, RegistryConfig, Result, Signature, SignatureInfo,
};

/// 이름으로 관리되는 이벤트 모음
///
/// 레지스트리끼리는 독립적이며 전역 공유 상태가 없습니다.
pub struct Registry {
    id: u64,
    config: RegistryConfig,
    default_signature: Option<SignatureInfo>,
    events: RwLock<BTreeMap<String, Arc<Event>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            id: event::next_id(),
            config,
            default_signature: None,
            events: RwLock::new(BTreeMap::new()),
        }
    }

    /// `get_or_create` 가 없는 이벤트를 `S` 로 생성하는 레지스트리
    pub fn with_default<S: Signature>() -> Self {
        Self::new().autovivify::<S>()
    }

    /// `get_or_create` 의 기본 시그니처 설정
    pub fn autovivify<S: Signature>(mut self) -> Self {
        self.default_signature = Some(SignatureInfo::of::<S>());
        self
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn default_signature(&self) -> Option<&SignatureInfo> {
        self.default_signature.as_ref()
    }

    // ========================================================================
    // Create / Lookup
    // ========================================================================

    /// Returns the event called `name`, creating it bound to `S` if absent.
    ///
    /// An existing event bound to another signature is returned unchanged
    /// under [`ConflictPolicy::Keep`] and rejected with `WrongType` under
    /// [`ConflictPolicy::Reject`].
    pub fn create<S: Signature>(&self, name: &str) -> Result<Arc<Event>> {
        self.create_with(name, &SignatureInfo::of::<S>())
    }

    fn create_with(&self, name: &str, signature: &SignatureInfo) -> Result<Arc<Event>> {
        let mut events = self.events.write();
        if let Some(existing) = events.get(name) {
            return self.resolve_conflict(existing, signature);
        }

        let event = Arc::new(Event::constrained(
            name,
            signature.clone(),
            Some(self.id),
            &self.config,
        ));
        events.insert(name.to_string(), Arc::clone(&event));
        debug!(event = name, signature = %signature, "Created event");
        Ok(event)
    }

    fn resolve_conflict(&self, existing: &Arc<Event>, requested: &SignatureInfo) -> Result<Arc<Event>> {
        if existing.signature() == requested {
            return Ok(Arc::clone(existing));
        }

        match self.config.on_conflict {
            ConflictPolicy::Keep => {
                warn!(
                    event = existing.name(),
                    bound = %existing.signature(),
                    requested = %requested,
                    "Event already exists with another signature, keeping it"
                );
                Ok(Arc::clone(existing))
            }
            ConflictPolicy::Reject => {
                debug!(event = existing.name(), requested = %requested, "Rejected signature conflict");
                Err(Error::wrong_type(
                    existing.name(),
                    "function",
                    Some("create()"),
                    vec![existing.signature().name().to_string()],
                    requested.name(),
                ))
            }
        }
    }

    /// `name` 조회, 기본 시그니처가 있으면 없는 이벤트 생성
    pub fn get_or_create(&self, name: &str) -> Result<Arc<Event>> {
        if let Some(event) = self.get(name) {
            return Ok(event);
        }
        match &self.default_signature {
            Some(signature) => self.create_with(name, signature),
            None => Err(Error::no_such_event(name)),
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<Event>> {
        self.events.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.events.read().contains_key(name)
    }

    /// 정렬된 이벤트 이름 목록
    pub fn names(&self) -> Vec<String> {
        self.events.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// 호출 스레드가 이 레지스트리의 이벤트에 마지막으로 insert 한 핸들
    pub fn handle(&self) -> Option<Handle> {
        event::last_handle(self.id)
    }

    // ========================================================================
    // Retire
    // ========================================================================

    /// Removes the event, running its remove hook for every slot.
    ///
    /// Outstanding handles become invalid. Anyone still holding the
    /// `Arc<Event>` gets `NoSuchEvent` from `insert` and `emit`.
    pub fn retire(&self, name: &str) -> &Self {
        let removed = self.events.write().remove(name);
        if let Some(event) = removed {
            event.retire();
            debug!(event = name, "Retired event");
        }
        self
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        let events = std::mem::take(self.events.get_mut());
        for event in events.values() {
            event.retire();
        }
        event::forget_staged(self.id);
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("events", &self.names())
            .field("default_signature", &self.default_signature)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_is_idempotent() {
        let registry = Registry::new();
        let a = registry.create::<fn(u32)>("tick").unwrap();
        let b = registry.create::<fn(u32)>("tick").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_conflict_keep_returns_existing() {
        let registry = Registry::new();
        let first = registry.create::<fn(u32)>("tick").unwrap();
        let second = registry.create::<fn(String)>("tick").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(second.signature().is::<fn(u32)>());
    }

    #[test]
    fn test_conflict_reject() {
        let config = RegistryConfig::new().with_conflict_policy(ConflictPolicy::Reject);
        let registry = Registry::with_config(config);
        registry.create::<fn(u32)>("tick").unwrap();

        let err = registry.create::<fn(String)>("tick").unwrap_err();
        assert!(err.is_type_error());
        assert!(err.to_string().contains("create()"));
        assert!(registry.create::<fn(u32)>("tick").is_ok());
    }

    #[test]
    fn test_get_or_create_without_default() {
        let registry = Registry::new();
        let err = registry.get_or_create("missing").unwrap_err();
        assert!(err.is_lookup_error());
        assert_eq!(err.to_string(), "No such event: \"missing\".");
        assert!(!registry.contains("missing"));
    }

    #[test]
    fn test_autovivify() {
        let registry = Registry::with_default::<fn(&'static str)>();
        let event = registry.get_or_create("log").unwrap();
        assert!(event.signature().is::<fn(&'static str)>());
        assert!(registry.contains("log"));
        assert!(Arc::ptr_eq(&event, &registry.get_or_create("log").unwrap()));
    }

    #[test]
    fn test_names_sorted() {
        let registry = Registry::new();
        registry.create::<fn()>("b").unwrap();
        registry.create::<fn()>("a").unwrap();
        assert_eq!(registry.names(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_retire() {
        let registry = Registry::new();
        let event = registry.create::<fn()>("gone").unwrap();
        let handle = event.subscribe(|| {}, 0).unwrap();

        registry.retire("gone").retire("never-existed");
        assert!(!registry.contains("gone"));
        assert!(!handle.is_valid());
        assert!(event.emit(()).unwrap_err().is_lookup_error());

        // the name can be reused with a new signature
        let fresh = registry.create::<fn(u8)>("gone").unwrap();
        assert!(fresh.signature().is::<fn(u8)>());
    }

    #[test]
    fn test_registry_handle_spans_events() {
        let registry = Registry::new();
        let a = registry.create::<fn()>("a").unwrap();
        let b = registry.create::<fn(u8)>("b").unwrap();

        let ha = a.subscribe(|| {}, 0).unwrap();
        assert_eq!(registry.handle(), Some(ha));
        let hb = b.subscribe(|_: u8| {}, 0).unwrap();
        assert_eq!(registry.handle(), Some(hb.clone()));
        assert_eq!(b.handle(), Some(hb));
    }

    #[test]
    fn test_config_inherited() {
        let config = RegistryConfig::new().with_slot_capacity(8).with_trace_emissions(true);
        let registry = Registry::with_config(config.clone());
        assert_eq!(registry.config(), &config);
        let event = registry.create::<fn()>("traced").unwrap();
        event.on(|| {}).unwrap();
        assert!(event.emit(()).is_ok());
    }

    #[test]
    fn test_drop_invalidates_outstanding_handles() {
        let registry = Registry::new();
        let event = registry.create::<fn()>("held").unwrap();
        let handle = event.subscribe(|| {}, 0).unwrap();
        drop(registry);

        assert!(!handle.is_valid());
        assert!(event.is_retired());
    }
}
