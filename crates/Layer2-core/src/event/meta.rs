//! Metadata - 콜백별 부가 데이터
//!
//! Metadata rides along with a slot without ever reaching the callback.
//! Hooks and interceptors read it back through the handle they are given.
//!
//! ```text
//!   event.with_meta(("retry", 3u8))     staged for this thread's next insert
//!        .insert(cb, 0)?                consumed here, stored in the slot
//!
//!   event.get_meta::<(&str, u8)>(&h)?   exact type match or WrongType
//! ```

use super::engine::{Event, State};
use super::staging;
use std::any::{type_name, Any, TypeId};
use wheel_foundation::{Error, Handle, Result};

/// 슬롯 (또는 staging 영역) 에 메타데이터가 없을 때 보고되는 타입 이름
pub(crate) const NO_META: &str = "(no metadata)";

// ============================================================================
// Meta
// ============================================================================

pub(crate) struct Meta {
    value: Box<dyn Any + Send + Sync>,
    ty: MetaType,
}

impl Meta {
    pub fn new<M: Any + Send + Sync>(value: M) -> Self {
        Self {
            value: Box::new(value),
            ty: MetaType::of::<M>(),
        }
    }

    pub fn meta_type(&self) -> MetaType {
        self.ty
    }

    pub fn downcast_ref<M: Any>(&self) -> Option<&M> {
        self.value.downcast_ref::<M>()
    }
}

/// 메타데이터 타입 식별자 + 진단용 이름
#[derive(Debug, Clone, Copy)]
pub(crate) struct MetaType {
    id: TypeId,
    name: &'static str,
}

impl MetaType {
    pub fn of<M: Any>() -> Self {
        Self {
            id: TypeId::of::<M>(),
            name: type_name::<M>(),
        }
    }

    pub fn is<M: Any>(&self) -> bool {
        self.id == TypeId::of::<M>()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for MetaType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for MetaType {}

impl State {
    /// staging 된 메타데이터 타입이 허용 목록에 있는지 확인
    pub(super) fn check_meta(&self, event: &str, staged: Option<MetaType>) -> Result<()> {
        if self.accepted_meta.is_empty() {
            return Ok(());
        }
        if let Some(staged) = staged {
            if self.accepted_meta.contains(&staged) {
                return Ok(());
            }
        }
        Err(Error::wrong_type(
            event,
            "meta",
            Some("insert()"),
            self.accepted_meta
                .iter()
                .map(|ty| ty.name().to_string())
                .collect(),
            staged.map_or(NO_META, |ty| ty.name()),
        ))
    }
}

// ============================================================================
// Event metadata API
// ============================================================================

impl Event {
    /// Stages `meta` for the calling thread's next successful insert into
    /// this event. Staging again replaces the previous value.
    ///
    /// Tuples bundle several values: `event.with_meta((1u8, "tag"))`.
    pub fn with_meta<M: Any + Send + Sync>(&self, meta: M) -> &Self {
        staging::stage_meta(self.id, Meta::new(meta));
        self
    }

    /// 이 스레드의 staging 메타데이터 폐기
    pub fn discard_meta(&self) -> &Self {
        staging::discard_meta(self.id);
        self
    }

    /// 허용 메타데이터 타입에 `M` 추가
    ///
    /// 목록이 비어있지 않으면 모든 insert 가 허용 타입 중 하나의 메타데이터를
    /// staging 해야 합니다.
    pub fn meta_accepts<M: Any + Send + Sync>(&self) -> &Self {
        let ty = MetaType::of::<M>();
        self.with_state(|state| {
            if !state.accepted_meta.contains(&ty) {
                state.accepted_meta.push(ty);
            }
        });
        self
    }

    /// 메타데이터 제약 모두 해제
    pub fn meta_accepts_anything(&self) -> &Self {
        self.with_state(|state| state.accepted_meta.clear());
        self
    }

    /// 슬롯 메타데이터 복사본. 요청 타입이 저장된 타입과 정확히 같아야 함
    pub fn get_meta<M: Any + Clone>(&self, handle: &Handle) -> Result<M> {
        self.with_state(|state| {
            let slot = state
                .slot(handle)
                .ok_or_else(|| Error::stale_handle(&self.name))?;
            let (stored, value) = match &slot.meta {
                Some(meta) => (meta.meta_type().name(), meta.downcast_ref::<M>()),
                None => (NO_META, None),
            };
            value.cloned().ok_or_else(|| {
                Error::wrong_type(
                    &self.name,
                    "meta",
                    Some("get_meta()"),
                    vec![stored.to_string()],
                    type_name::<M>(),
                )
            })
        })
    }

    /// 슬롯 메타데이터와 기록된 타입 덮어쓰기
    pub fn set_meta<M: Any + Send + Sync>(&self, handle: &Handle, meta: M) -> Result<&Self> {
        let previous = self.with_state(|state| {
            state
                .slot_mut(handle)
                .map(|slot| slot.meta.replace(Meta::new(meta)))
                .ok_or_else(|| Error::stale_handle(&self.name))
        })?;
        drop(previous);
        Ok(self)
    }

    /// 슬롯 메타데이터가 정확히 `M` 타입인지 (stale 핸들, 메타 없는 슬롯은 false)
    pub fn is_meta_of<M: Any>(&self, handle: &Handle) -> bool {
        self.with_state(|state| {
            state
                .slot(handle)
                .and_then(|slot| slot.meta.as_ref())
                .is_some_and(|meta| meta.meta_type().is::<M>())
        })
    }

    pub fn has_meta(&self, handle: &Handle) -> bool {
        self.with_state(|state| {
            state
                .slot(handle)
                .is_some_and(|slot| slot.meta.is_some())
        })
    }
}
