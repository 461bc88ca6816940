//! Handle - 등록된 콜백의 위치를 가리키는 공유 셀
//!
//! A handle is the only piece of event state shared without the event's lock.
//! The owning event rewrites the stored index whenever the slot moves, and
//! writes [`INVALID`] once the slot is gone, so every clone held by callers
//! observes the change.
//!
//! ```text
//!   caller ──┐
//!   hook   ──┼──► Arc<AtomicIsize> ◄── Slot (inside Event)
//!   meta   ──┘        │
//!                     ▼
//!              index │ -1 (invalid)
//! ```

use std::fmt;
use std::sync::atomic::{AtomicIsize, Ordering};
use std::sync::Arc;

/// 무효화된 핸들에 저장되는 값
pub const INVALID: isize = -1;

/// Shared, reference-counted index of a registered callback.
///
/// Equality is identity: two handles are equal only when they are clones of
/// the same cell, regardless of the index they currently hold.
#[derive(Clone)]
pub struct Handle(Arc<AtomicIsize>);

impl Handle {
    /// `index` 를 가리키는 핸들 생성
    pub fn new(index: usize) -> Self {
        Self(Arc::new(AtomicIsize::new(index as isize)))
    }

    /// 이미 무효인 핸들 생성
    pub fn detached() -> Self {
        Self(Arc::new(AtomicIsize::new(INVALID)))
    }

    /// 현재 인덱스 (무효화 후 `None`)
    pub fn index(&self) -> Option<usize> {
        let raw = self.0.load(Ordering::Acquire);
        if raw < 0 {
            None
        } else {
            Some(raw as usize)
        }
    }

    /// 원시 값: 인덱스 또는 `-1`
    pub fn get(&self) -> isize {
        self.0.load(Ordering::Acquire)
    }

    pub fn is_valid(&self) -> bool {
        self.get() != INVALID
    }

    /// 새 인덱스로 이동. 소유 이벤트만 호출
    pub fn set(&self, index: usize) {
        self.0.store(index as isize, Ordering::Release);
    }

    /// 무효 표시. 소유 이벤트만 호출
    pub fn invalidate(&self) {
        self.0.store(INVALID, Ordering::Release);
    }

    /// `self` 와 `other` 가 같은 셀인지
    pub fn same(&self, other: &Handle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for Handle {
    fn default() -> Self {
        Self::detached()
    }
}

impl PartialEq for Handle {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl Eq for Handle {}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index() {
            Some(index) => write!(f, "Handle({})", index),
            None => write!(f, "Handle(invalid)"),
        }
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}
