//! Event Engine - 슬롯 저장소와 디스패치
//!
//! All mutable state sits behind one re-entrant lock. The `RefCell` inside it
//! is only ever borrowed for bookkeeping: user code (callbacks, hooks,
//! interceptors) always runs with no borrow held, so it may call straight
//! back into the same event.

use super::meta::{Meta, MetaType};
use super::slot::{position_for, Slot, Weight};
use super::staging;
use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use std::any::{type_name, Any};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tracing::trace;
use wheel_foundation::{
    describe_args, Callback, Error, Handle, Interceptor, IntoCallback, RegistryConfig, Result,
    Signature, SignatureInfo,
};

/// on-insert / on-remove 훅
pub type Hook = Arc<dyn Fn(&Handle) + Send + Sync>;

type StateGuard<'a> = ReentrantMutexGuard<'a, RefCell<State>>;

// ============================================================================
// State
// ============================================================================

pub(crate) struct State {
    pub slots: Vec<Slot>,
    pub pending_inserts: VecDeque<Slot>,
    pub pending_removes: VecDeque<Handle>,
    /// 진행 중인 emit 중첩 수
    pub depth: usize,
    /// 진행 중인 flush 중첩 수
    pub flushing: usize,
    pub retired: bool,
    pub on_insert: Option<Hook>,
    pub on_remove: Option<Hook>,
    /// 바인딩된 시그니처의 `Interceptor<S::Args>`
    pub interceptor: Option<Box<dyn Any + Send + Sync>>,
    pub accepted_meta: Vec<MetaType>,
}

impl State {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            pending_inserts: VecDeque::new(),
            pending_removes: VecDeque::new(),
            depth: 0,
            flushing: 0,
            retired: false,
            on_insert: None,
            on_remove: None,
            interceptor: None,
            accepted_meta: Vec::new(),
        }
    }

    /// Structural changes are queued while an emission runs, and also while
    /// earlier queued inserts are still waiting, so a pending slot's handle
    /// always equals `slots.len() + its queue position`.
    pub fn is_deferring(&self) -> bool {
        self.depth > 0 || !self.pending_inserts.is_empty()
    }

    /// 핸들이 가리키는 슬롯 (live 또는 pending). 무효 핸들이나 다른 이벤트의
    /// 핸들이면 `None`
    pub fn slot(&self, handle: &Handle) -> Option<&Slot> {
        let index = handle.index()?;
        let len = self.slots.len();
        let slot = if index < len {
            self.slots.get(index)
        } else {
            self.pending_inserts.get(index - len)
        }?;
        slot.handle.same(handle).then_some(slot)
    }

    pub fn slot_mut(&mut self, handle: &Handle) -> Option<&mut Slot> {
        let index = handle.index()?;
        let len = self.slots.len();
        let slot = if index < len {
            self.slots.get_mut(index)
        } else {
            self.pending_inserts.get_mut(index - len)
        }?;
        if slot.handle.same(handle) {
            Some(slot)
        } else {
            None
        }
    }

    /// 아무도 flush 하지 않을 대기 작업. 이를 쌓은 emit 이 flush 전에 unwind 됨
    fn is_stranded(&self) -> bool {
        self.depth == 0
            && self.flushing == 0
            && (!self.pending_inserts.is_empty() || !self.pending_removes.is_empty())
    }

    fn is_runnable(&self, handle: &Handle) -> bool {
        self.slot(handle).is_some_and(Slot::is_runnable)
    }

    /// weight 순서로 삽입하고 그 뒤 핸들 번호를 모두 갱신
    fn place(&mut self, slot: Slot) {
        let at = position_for(&self.slots, slot.weight);
        self.slots.insert(at, slot);
        for (index, slot) in self.slots.iter().enumerate().skip(at) {
            slot.handle.set(index);
        }
        self.renumber_pending();
    }

    fn renumber_pending(&self) {
        let base = self.slots.len();
        for (offset, slot) in self.pending_inserts.iter().enumerate() {
            slot.handle.set(base + offset);
        }
    }

    fn handles(&self) -> Vec<Handle> {
        self.slots
            .iter()
            .chain(self.pending_inserts.iter())
            .map(|slot| slot.handle.clone())
            .collect()
    }

    pub fn interceptor<A: 'static>(&self) -> Option<Interceptor<A>> {
        self.interceptor
            .as_ref()?
            .downcast_ref::<Interceptor<A>>()
            .cloned()
    }

    fn ensure_live(&self, event: &str) -> Result<()> {
        if self.retired {
            Err(Error::no_such_event(event))
        } else {
            Ok(())
        }
    }
}

// ============================================================================
// Event
// ============================================================================

/// A named dispatch point bound to a single call signature.
///
/// Every method takes `&self`; share an event as `Arc<Event>` across threads.
/// Calls on one event are serialized by its lock. Callbacks, hooks and
/// interceptors run on the caller's thread and may re-enter the event.
pub struct Event {
    pub(super) id: u64,
    pub(super) owner: Option<u64>,
    pub(super) name: String,
    pub(super) signature: SignatureInfo,
    trace_emissions: bool,
    state: ReentrantMutex<RefCell<State>>,
}

impl Event {
    /// 기본 설정의 독립 이벤트 생성
    pub fn new<S: Signature>(name: impl Into<String>) -> Self {
        Self::constrained(name, SignatureInfo::of::<S>(), None, &RegistryConfig::default())
    }

    /// 수명 동안 `signature` 에 바인딩된 이벤트 생성
    pub(crate) fn constrained(
        name: impl Into<String>,
        signature: SignatureInfo,
        owner: Option<u64>,
        config: &RegistryConfig,
    ) -> Self {
        Self {
            id: staging::next_id(),
            owner,
            name: name.into(),
            signature,
            trace_emissions: config.trace_emissions,
            state: ReentrantMutex::new(RefCell::new(State::with_capacity(config.slot_capacity))),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> &SignatureInfo {
        &self.signature
    }

    /// 상태에 `f` 실행. `f` 안에서 사용자 코드 호출 금지
    pub(super) fn with_state<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        f(&mut state)
    }

    // ========================================================================
    // Insert
    // ========================================================================

    /// Registers `callback` at `weight`.
    ///
    /// Fails with `WrongType` when the closure's signature is not the bound
    /// one, or when staged metadata is not of an accepted type. During an
    /// emission the slot is queued and placed (and announced to the on-insert
    /// hook) once the emission finishes.
    pub fn insert<S, F>(&self, callback: F, weight: Weight) -> Result<&Self>
    where
        S: Signature,
        F: IntoCallback<S>,
    {
        self.insert_slot(callback, weight)?;
        Ok(self)
    }

    /// 반환값 없는 `insert(callback, 0)`
    pub fn on<S, F>(&self, callback: F) -> Result<()>
    where
        S: Signature,
        F: IntoCallback<S>,
    {
        self.insert_slot(callback, 0).map(|_| ())
    }

    /// [`insert`](Self::insert) 후 새 핸들 반환
    pub fn subscribe<S, F>(&self, callback: F, weight: Weight) -> Result<Handle>
    where
        S: Signature,
        F: IntoCallback<S>,
    {
        self.insert_slot(callback, weight)
    }

    /// 호출 스레드가 이 이벤트에 마지막으로 insert 한 핸들
    pub fn handle(&self) -> Option<Handle> {
        staging::last_handle(self.id)
    }

    fn insert_slot<S, F>(&self, callback: F, weight: Weight) -> Result<Handle>
    where
        S: Signature,
        F: IntoCallback<S>,
    {
        let guard = self.state.lock();
        self.settle(&guard);
        let (handle, deferred) = {
            let mut state = guard.borrow_mut();
            state.ensure_live(&self.name)?;
            if !self.signature.is::<S>() {
                return Err(Error::wrong_type(
                    &self.name,
                    "function",
                    Some("insert()"),
                    vec![self.signature.name().to_string()],
                    type_name::<S>(),
                ));
            }
            state.check_meta(&self.name, staging::staged_meta_type(self.id))?;

            let handle = Handle::new(state.slots.len() + state.pending_inserts.len());
            let mut callback: Callback<S::Args> = callback.into_callback();
            if let Some(interceptor) = state.interceptor::<S::Args>() {
                let inner = callback;
                let bound = handle.clone();
                callback = Arc::new(move |args: S::Args| interceptor(&bound, &inner, args));
            }

            let meta: Option<Meta> = staging::take_meta(self.id);
            let slot = Slot::new(Box::new(callback), handle.clone(), meta, weight);
            match self.owner {
                Some(owner) => staging::record_handle(&[self.id, owner], &handle),
                None => staging::record_handle(&[self.id], &handle),
            }

            let deferred = state.is_deferring();
            if deferred {
                state.pending_inserts.push_back(slot);
            } else {
                state.place(slot);
            }
            (handle, deferred)
        };

        if deferred {
            trace!(event = %self.name, handle = %handle, weight, "Deferred insert");
        } else {
            trace!(event = %self.name, handle = %handle, weight, "Inserted callback");
            self.fire_on_insert(&guard, &handle);
        }
        Ok(handle)
    }

    // ========================================================================
    // Remove
    // ========================================================================

    /// Unregisters the callback behind `handle`.
    ///
    /// Invalid handles and handles from other events are ignored. During an
    /// emission the slot is skipped for the rest of it and removed at flush.
    pub fn remove(&self, handle: &Handle) -> &Self {
        if !handle.is_valid() {
            return self;
        }

        let guard = self.state.lock();
        self.settle(&guard);
        let deferred = {
            let mut state = guard.borrow_mut();
            let deferring = state.is_deferring();
            let Some(slot) = state.slot_mut(handle) else {
                return self;
            };
            if slot.removing {
                return self;
            }
            if deferring {
                let first = !slot.scheduled_for_removal;
                slot.scheduled_for_removal = true;
                if first {
                    state.pending_removes.push_back(handle.clone());
                }
            }
            deferring
        };

        if deferred {
            trace!(event = %self.name, handle = %handle, "Deferred removal");
        } else {
            self.remove_now(&guard, handle);
        }
        self
    }

    /// 훅 먼저, 그다음 swap-and-pop
    fn remove_now(&self, guard: &StateGuard<'_>, handle: &Handle) {
        let hook = {
            let mut state = guard.borrow_mut();
            let Some(slot) = state.slot_mut(handle) else {
                return;
            };
            // a hook removing its own handle lands here again
            if slot.removing {
                return;
            }
            slot.removing = true;
            state.on_remove.clone()
        };
        if let Some(hook) = hook {
            let unmark = Unmark { guard, handle };
            hook(handle);
            std::mem::forget(unmark);
        }

        let (index, removed) = {
            let mut state = guard.borrow_mut();
            // the hook may already have removed it
            let Some(index) = handle.index() else {
                return;
            };
            if state.slots.get(index).map_or(true, |s| !s.handle.same(handle)) {
                return;
            }
            let removed = state.slots.swap_remove(index);
            if let Some(moved) = state.slots.get(index) {
                moved.handle.set(index);
            }
            state.renumber_pending();
            handle.invalidate();
            (index, removed)
        };
        trace!(event = %self.name, index, weight = removed.weight, "Removed callback");
        drop(removed);
    }

    /// 일반 제거 경로로 모든 콜백 제거
    pub fn clear(&self) -> &Self {
        let guard = self.state.lock();
        let handles = guard.borrow().handles();
        for handle in &handles {
            self.remove(handle);
        }
        self
    }

    /// 등록된 콜백 수 (대기 중인 insert 포함)
    pub fn len(&self) -> usize {
        self.with_state(|state| state.slots.len() + state.pending_inserts.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `handle` 의 저장된 콜백 (interceptor 래핑 포함)
    pub fn get_callback<S: Signature>(&self, handle: &Handle) -> Result<Callback<S::Args>> {
        if !self.signature.is::<S>() {
            return Err(Error::wrong_type(
                &self.name,
                "function",
                Some("get_callback()"),
                vec![self.signature.name().to_string()],
                type_name::<S>(),
            ));
        }
        self.with_state(|state| {
            state
                .slot(handle)
                .and_then(|slot| slot.callback.downcast_ref::<Callback<S::Args>>())
                .cloned()
                .ok_or_else(|| Error::stale_handle(&self.name))
        })
    }

    // ========================================================================
    // Emit
    // ========================================================================

    /// Calls every registered callback with a clone of `args`.
    ///
    /// `args` is the argument tuple of the bound signature: `()` for `fn()`,
    /// `(x,)` for `fn(X)`, `(x, y)` for `fn(X, Y)`. Anything else fails with
    /// `WrongArguments` before a callback runs.
    ///
    /// Callbacks inserted during the emission first run on the next one.
    /// Callbacks removed during it are skipped if they have not run yet.
    pub fn emit<A: Clone + 'static>(&self, args: A) -> Result<()> {
        let guard = self.state.lock();
        self.settle(&guard);
        let snapshot: Vec<(Handle, Callback<A>)> = {
            let mut state = guard.borrow_mut();
            state.ensure_live(&self.name)?;
            if !self.signature.accepts_args::<A>() {
                return Err(Error::wrong_arguments(
                    &self.name,
                    self.signature.parameters(),
                    describe_args::<A>(),
                ));
            }
            state
                .slots
                .iter()
                .filter_map(|slot| {
                    slot.callback
                        .downcast_ref::<Callback<A>>()
                        .map(|callback| (slot.handle.clone(), Arc::clone(callback)))
                })
                .collect()
        };

        if self.trace_emissions {
            trace!(event = %self.name, slots = snapshot.len(), "Emitting");
        }

        {
            let _depth = CounterGuard::enter(&guard, Counter::Depth);
            for (handle, callback) in &snapshot {
                let runnable = guard.borrow().is_runnable(handle);
                if runnable {
                    callback(args.clone());
                }
            }
        }

        self.flush(&guard);
        Ok(())
    }

    /// 대기 insert 적용 후 대기 remove 적용
    fn flush(&self, guard: &StateGuard<'_>) {
        enum Step {
            Insert(Handle),
            Remove(Handle),
        }

        let _flushing = CounterGuard::enter(guard, Counter::Flushing);
        loop {
            let step = {
                let mut state = guard.borrow_mut();
                if let Some(slot) = state.pending_inserts.pop_front() {
                    let handle = slot.handle.clone();
                    state.place(slot);
                    Step::Insert(handle)
                } else if let Some(handle) = state.pending_removes.pop_front() {
                    Step::Remove(handle)
                } else {
                    break;
                }
            };

            match step {
                Step::Insert(handle) => {
                    trace!(event = %self.name, handle = %handle, "Flushed insert");
                    self.fire_on_insert(guard, &handle);
                }
                Step::Remove(handle) => self.remove_now(guard, &handle),
            }
        }
    }

    /// unwind 된 emit 이 남긴 대기 작업 flush
    fn settle(&self, guard: &StateGuard<'_>) {
        let stranded = guard.borrow().is_stranded();
        if stranded {
            trace!(event = %self.name, "Flushing work left by an unwound emission");
            self.flush(guard);
        }
    }

    fn fire_on_insert(&self, guard: &StateGuard<'_>, handle: &Handle) {
        let hook = guard.borrow().on_insert.clone();
        if let Some(hook) = hook {
            hook(handle);
        }
    }

    // ========================================================================
    // Retire
    // ========================================================================

    /// 이벤트를 비우고 이후 insert/emit 거부
    pub(crate) fn retire(&self) {
        let guard = self.state.lock();
        self.clear();
        guard.borrow_mut().retired = true;
    }

    pub fn is_retired(&self) -> bool {
        self.with_state(|state| state.retired)
    }
}

#[derive(Clone, Copy)]
enum Counter {
    Depth,
    Flushing,
}

/// 카운터 증가, 스코프 종료 시 (unwind 포함) 감소
struct CounterGuard<'a, 'b> {
    guard: &'a StateGuard<'b>,
    counter: Counter,
}

impl<'a, 'b> CounterGuard<'a, 'b> {
    fn enter(guard: &'a StateGuard<'b>, counter: Counter) -> Self {
        *Self::counter_of(&mut guard.borrow_mut(), counter) += 1;
        Self { guard, counter }
    }

    fn counter_of(state: &mut State, counter: Counter) -> &mut usize {
        match counter {
            Counter::Depth => &mut state.depth,
            Counter::Flushing => &mut state.flushing,
        }
    }
}

impl Drop for CounterGuard<'_, '_> {
    fn drop(&mut self) {
        if let Ok(mut state) = self.guard.try_borrow_mut() {
            let value = Self::counter_of(&mut state, self.counter);
            *value = value.saturating_sub(1);
        }
    }
}

/// on-remove 훅이 unwind 되면 `removing` 표시 해제 (이후 다시 제거 가능)
struct Unmark<'a, 'b, 'c> {
    guard: &'a StateGuard<'b>,
    handle: &'c Handle,
}

impl Drop for Unmark<'_, '_, '_> {
    fn drop(&mut self) {
        if let Ok(mut state) = self.guard.try_borrow_mut() {
            if let Some(slot) = state.slot_mut(self.handle) {
                slot.removing = false;
            }
        }
    }
}

impl Drop for Event {
    fn drop(&mut self) {
        let state = self.state.get_mut().get_mut();
        for slot in state.slots.iter().chain(state.pending_inserts.iter()) {
            slot.handle.invalidate();
        }
        staging::forget(self.id);
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guard = self.state.lock();
        let mut out = f.debug_struct("Event");
        out.field("name", &self.name)
            .field("signature", &self.signature);
        if let Ok(state) = guard.try_borrow() {
            out.field("slots", &state.slots.len())
                .field("pending_inserts", &state.pending_inserts.len())
                .field("pending_removes", &state.pending_removes.len())
                .field("emitting", &(state.depth > 0));
        }
        out.finish()
    }
}
