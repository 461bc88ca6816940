//! # Event
//!
//! 하나의 시그니처에 묶인 이름 있는 디스패치 지점
//!
//! ## 구조
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Event "signal"  (fn(u32))                                    │
//! │  ReentrantMutex<RefCell<State>>                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │ slots (weight desc)   [w3] [w2] [w1] [w0] [w0]          │  │
//! │  │ pending_inserts       queued while emitting             │  │
//! │  │ pending_removes       flushed after pending_inserts     │  │
//! │  │ on_insert · on_remove · interceptor · accepted_meta     │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//!        ▲ per-thread staging: with_meta() value, last handle
//! ```
//!
//! ## 사용 예시
//!
//! ```ignore
//! use wheel_core::Event;
//!
//! let event = Event::new::<fn(u32)>("tick");
//! event.insert(|n: u32| println!("low {n}"), 0)?
//!      .insert(|n: u32| println!("high {n}"), 10)?;
//!
//! let handle = event.with_meta("audit").subscribe(|n: u32| audit(n), 5)?;
//! event.emit((7u32,))?;     // high, audit, low
//! event.remove(&handle);
//! ```

mod engine;
mod hooks;
mod meta;
mod slot;
mod staging;

pub use engine::{Event, Hook};
pub use slot::Weight;

pub(crate) use staging::{forget as forget_staged, last_handle, next_id};
