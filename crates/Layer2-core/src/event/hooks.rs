//! Hooks & Interceptor
//!
//! - on-insert: called with the new handle once the slot is in place
//! - on-remove: called with the handle before the slot is taken out
//! - interceptor: wraps every callback inserted after it is set
//!
//! All three run synchronously under the event's lock and may call back
//! into the event. Removing the fresh handle from an on-insert hook is the
//! usual way to make a callback that never runs.

use super::engine::{Event, Hook};
use std::sync::Arc;
use tracing::debug;
use wheel_foundation::{
    Error, Handle, Interceptor, IntoInterceptor, Result, Signature, SignatureInfo,
};

impl Event {
    pub fn set_on_insert<F>(&self, hook: F) -> &Self
    where
        F: Fn(&Handle) + Send + Sync + 'static,
    {
        let hook: Hook = Arc::new(hook);
        self.with_state(|state| state.on_insert = Some(hook));
        self
    }

    pub fn unset_on_insert(&self) -> &Self {
        self.with_state(|state| state.on_insert = None);
        self
    }

    pub fn set_on_remove<F>(&self, hook: F) -> &Self
    where
        F: Fn(&Handle) + Send + Sync + 'static,
    {
        let hook: Hook = Arc::new(hook);
        self.with_state(|state| state.on_remove = Some(hook));
        self
    }

    pub fn unset_on_remove(&self) -> &Self {
        self.with_state(|state| state.on_remove = None);
        self
    }

    /// 이후 insert 되는 콜백을 감쌀 interceptor 설정
    ///
    /// The interceptor receives the slot's handle, the user callback and the
    /// emitted arguments, and decides whether and how often the callback
    /// runs. Slots inserted earlier keep the wrapping they were created with.
    pub fn set_interceptor<S, F>(&self, interceptor: F) -> Result<&Self>
    where
        S: Signature,
        F: IntoInterceptor<S>,
    {
        if !self.signature.is::<S>() {
            return Err(Error::wrong_type(
                &self.name,
                "function",
                Some("set_interceptor()"),
                vec![self.signature.interceptor().to_string()],
                SignatureInfo::of::<S>().interceptor(),
            ));
        }

        let interceptor: Interceptor<S::Args> = interceptor.into_interceptor();
        self.with_state(|state| state.interceptor = Some(Box::new(interceptor)));
        debug!(event = %self.name, "Interceptor set");
        Ok(self)
    }

    pub fn unset_interceptor(&self) -> &Self {
        self.with_state(|state| state.interceptor = None);
        self
    }

    pub fn has_interceptor(&self) -> bool {
        self.with_state(|state| state.interceptor.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use wheel_foundation::Callback;

    #[test]
    fn test_hooks_see_handles() {
        let event = Event::new::<fn()>("hooks");
        let seen = Arc::new(Mutex::new(Vec::new()));

        let inserted = seen.clone();
        let removed = seen.clone();
        event
            .set_on_insert(move |h| inserted.lock().push(("insert", h.get())))
            .set_on_remove(move |h| removed.lock().push(("remove", h.get())));

        let a = event.subscribe(|| {}, 0).unwrap();
        let _b = event.subscribe(|| {}, 0).unwrap();
        event.remove(&a);

        // the remove hook still sees the pre-removal index
        assert_eq!(
            *seen.lock(),
            vec![("insert", 0), ("insert", 1), ("remove", 0)]
        );
    }

    #[test]
    fn test_unset_hooks() {
        let event = Event::new::<fn()>("hooks");
        let count = Arc::new(Mutex::new(0));
        let c = count.clone();
        event.set_on_insert(move |_| *c.lock() += 1);
        event.on(|| {}).unwrap();
        event.unset_on_insert();
        event.on(|| {}).unwrap();
        assert_eq!(*count.lock(), 1);
    }

    #[test]
    fn test_interceptor_wraps_later_inserts_only() {
        let event = Event::new::<fn(u32)>("intercepted");
        let log = Arc::new(Mutex::new(Vec::new()));

        let l = log.clone();
        event.on(move |n: u32| l.lock().push(n)).unwrap();

        event
            .set_interceptor(|_: &Handle, inner: &Callback<(u32,)>, n: u32| {
                inner((n,));
                inner((n + 100,));
            })
            .unwrap();
        assert!(event.has_interceptor());

        let l = log.clone();
        event.on(move |n: u32| l.lock().push(n)).unwrap();

        event.emit((1u32,)).unwrap();
        assert_eq!(*log.lock(), vec![1, 1, 101]);

        event.unset_interceptor();
        assert!(!event.has_interceptor());
    }

    #[test]
    fn test_interceptor_can_suppress() {
        let event = Event::new::<fn()>("muted");
        let hits = Arc::new(Mutex::new(0));
        event
            .set_interceptor(|_: &Handle, _: &Callback<()>| {})
            .unwrap();
        let h = hits.clone();
        event.on(move || *h.lock() += 1).unwrap();
        event.emit(()).unwrap();
        assert_eq!(*hits.lock(), 0);
    }

    #[test]
    fn test_interceptor_signature_mismatch() {
        let event = Event::new::<fn(u32)>("typed");
        let err = event
            .set_interceptor(|_: &Handle, _: &Callback<(i64,)>, _: i64| {})
            .unwrap_err();
        assert!(err.is_type_error());
        let message = err.to_string();
        assert!(message.contains("set_interceptor()"));
        assert!(message.contains("Callback<(u32,)>"));
    }
}
