//! Slot - 이벤트에 등록된 콜백 하나

use super::meta::Meta;
use std::any::Any;
use wheel_foundation::Handle;

/// 디스패치 우선순위. 클수록 먼저 실행, `0` 은 항상 맨 뒤
pub type Weight = u16;

/// [`Event`](super::Event) 에 등록된 콜백 하나
///
/// `callback` 은 바인딩된 시그니처의 `Callback<S::Args>` 를 담습니다.
/// 시그니처 토큰 비교 후에만 downcast 합니다.
pub(crate) struct Slot {
    pub callback: Box<dyn Any + Send + Sync>,
    pub handle: Handle,
    pub meta: Option<Meta>,
    pub weight: Weight,
    /// 실행 중인 emit 에서 건너뜀, flush 때 제거
    pub scheduled_for_removal: bool,
    /// on-remove 훅 실행 중. 다시 들어온 remove 는 무시됨
    pub removing: bool,
}

impl Slot {
    pub fn new(
        callback: Box<dyn Any + Send + Sync>,
        handle: Handle,
        meta: Option<Meta>,
        weight: Weight,
    ) -> Self {
        Self {
            callback,
            handle,
            meta,
            weight,
            scheduled_for_removal: false,
            removing: false,
        }
    }

    /// 현재 emit 에서 아직 호출해도 되는지
    pub fn is_runnable(&self) -> bool {
        !self.scheduled_for_removal && !self.removing && self.handle.is_valid()
    }
}

/// `weight` 슬롯이 `slots` 에서 들어갈 위치
///
/// 0 은 맨 뒤에 추가. 그 외에는 더 낮은 weight 를 가진 첫 슬롯 앞에 들어가며,
/// 같은 weight 끼리는 삽입 순서가 유지됩니다.
pub(crate) fn position_for(slots: &[Slot], weight: Weight) -> usize {
    if weight == 0 {
        return slots.len();
    }
    slots
        .iter()
        .position(|slot| slot.weight < weight)
        .unwrap_or(slots.len())
}
