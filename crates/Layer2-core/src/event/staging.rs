//! Per-thread staging
//!
//! Two pieces of state belong to the calling thread rather than to an event:
//! metadata staged by `with_meta` for that thread's next insert, and the
//! handle of that thread's most recent insert. Both are keyed by the id of
//! the event (or registry) they belong to, so two threads sharing one event
//! never see each other's values.

use super::meta::{Meta, MetaType};
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use wheel_foundation::Handle;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// 이벤트/레지스트리의 프로세스 고유 ID
pub(crate) fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Default)]
struct Staged {
    meta: Option<Meta>,
    last_handle: Option<Handle>,
}

impl Staged {
    fn is_empty(&self) -> bool {
        self.meta.is_none() && self.last_handle.is_none()
    }
}

thread_local! {
    static STAGED: RefCell<HashMap<u64, Staged>> = RefCell::new(HashMap::new());
}

/// 이 스레드가 `id` 에 staging 해둔 메타데이터 교체
pub(crate) fn stage_meta(id: u64, meta: Meta) {
    STAGED.with(|staged| {
        staged.borrow_mut().entry(id).or_default().meta = Some(meta);
    });
}

pub(crate) fn staged_meta_type(id: u64) -> Option<MetaType> {
    STAGED.with(|staged| {
        staged
            .borrow()
            .get(&id)
            .and_then(|s| s.meta.as_ref())
            .map(Meta::meta_type)
    })
}

pub(crate) fn take_meta(id: u64) -> Option<Meta> {
    STAGED.with(|staged| {
        let mut staged = staged.borrow_mut();
        let entry = staged.get_mut(&id)?;
        let meta = entry.meta.take();
        if entry.is_empty() {
            staged.remove(&id);
        }
        meta
    })
}

pub(crate) fn discard_meta(id: u64) {
    drop(take_meta(id));
}

/// `ids` 의 모든 id 에 대해 `handle` 을 최근 insert 로 기록
pub(crate) fn record_handle(ids: &[u64], handle: &Handle) {
    STAGED.with(|staged| {
        let mut staged = staged.borrow_mut();
        for id in ids {
            staged.entry(*id).or_default().last_handle = Some(handle.clone());
        }
    });
}

pub(crate) fn last_handle(id: u64) -> Option<Handle> {
    STAGED.with(|staged| {
        staged
            .borrow()
            .get(&id)
            .and_then(|s| s.last_handle.clone())
    })
}

/// Drops this thread's entry for `id`.
///
/// Other threads keep theirs until they stage or insert against a new id;
/// their stale handles are already invalid by then.
pub(crate) fn forget(id: u64) {
    // The thread-local may already be gone during thread teardown.
    let _ = STAGED.try_with(|staged| {
        if let Ok(mut staged) = staged.try_borrow_mut() {
            staged.remove(&id);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let a = next_id();
        let b = next_id();
        assert_ne!(a, b);
    }

    #[test]
    fn test_meta_is_taken_once() {
        let id = next_id();
        stage_meta(id, Meta::new(5u8));
        assert!(staged_meta_type(id).is_some_and(|t| t.is::<u8>()));

        let meta = take_meta(id).unwrap();
        assert_eq!(meta.downcast_ref::<u8>(), Some(&5));
        assert!(take_meta(id).is_none());
        assert!(staged_meta_type(id).is_none());
    }

    #[test]
    fn test_staging_is_per_thread() {
        let id = next_id();
        stage_meta(id, Meta::new("here"));

        let seen = std::thread::spawn(move || staged_meta_type(id).is_some())
            .join()
            .unwrap();
        assert!(!seen);
        assert!(staged_meta_type(id).is_some());
        forget(id);
        assert!(staged_meta_type(id).is_none());
    }

    #[test]
    fn test_last_handle_recorded_under_each_id() {
        let event = next_id();
        let registry = next_id();
        let handle = Handle::new(0);

        record_handle(&[event, registry], &handle);
        assert_eq!(last_handle(event), Some(handle.clone()));
        assert_eq!(last_handle(registry), Some(handle));

        forget(event);
        assert!(last_handle(event).is_none());
        forget(registry);
    }
}
