//! Signature - 이벤트 콜백 타입 식별
//!
//! An event is bound to exactly one call signature, written as a function
//! pointer type such as `fn(u32, String)`. The signature never changes after
//! creation; everything an event stores is type-erased and only cast back
//! after the recorded [`TypeId`] token has been compared.
//!
//! ```text
//!   |x: u32, s: String| { .. }        ──IntoCallback<fn(u32, String)>──►
//!   Callback<(u32, String)>           ──Box<dyn Any>──► Slot
//!
//!   emit((7u32, "x".to_string()))     TypeId::of::<(u32, String)>()
//!                                      == SignatureInfo::args_id ?
//! ```
//!
//! Signatures take 0 to 8 parameters. Every parameter is an owned
//! `Clone + 'static` value because each callback receives its own copy of
//! the emitted arguments.

use crate::handle::Handle;
use std::any::{type_name, TypeId};
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Erased callables
// ============================================================================

/// 정규화된 콜백: 인자 튜플 하나를 받고 반환값 없음
pub type Callback<Args> = Arc<dyn Fn(Args) + Send + Sync>;

/// An interceptor receives the slot's handle and the wrapped callback ahead
/// of the real arguments, and decides whether (and how often) to call it.
pub type Interceptor<Args> = Arc<dyn Fn(&Handle, &Callback<Args>, Args) + Send + Sync>;

// ============================================================================
// Signature Trait
// ============================================================================

/// A call signature an event can be bound to.
///
/// Implemented for `fn()`, `fn(A)`, ..., `fn(A, B, C, D, E, F, G, H)`.
pub trait Signature: 'static {
    /// `emit` 에 전달되는 인자 튜플
    type Args: Clone + 'static;

    /// 쉼표로 구분된 파라미터 타입 이름 (진단용)
    fn parameters() -> String;
}

/// Conversion of a closure into the erased callback of signature `S`.
///
/// `S` is inferred from the closure's parameter list, so
/// `event.insert(|n: u32| ..., 0)` selects `fn(u32)`.
pub trait IntoCallback<S: Signature> {
    fn into_callback(self) -> Callback<S::Args>;
}

/// Conversion of a closure into an interceptor for signature `S`.
pub trait IntoInterceptor<S: Signature> {
    fn into_interceptor(self) -> Interceptor<S::Args>;
}

macro_rules! impl_signature {
    ($($arg:ident),*) => {
        impl<$($arg: Clone + 'static),*> Signature for fn($($arg),*) {
            type Args = ($($arg,)*);

            fn parameters() -> String {
                let names: Vec<&'static str> = vec![$(type_name::<$arg>()),*];
                names.join(", ")
            }
        }

        impl<Func, $($arg: Clone + 'static),*> IntoCallback<fn($($arg),*)> for Func
        where
            Func: Fn($($arg),*) + Send + Sync + 'static,
        {
            #[allow(non_snake_case)]
            fn into_callback(self) -> Callback<($($arg,)*)> {
                Arc::new(move |($($arg,)*): ($($arg,)*)| (self)($($arg),*))
            }
        }

        impl<Func, $($arg: Clone + 'static),*> IntoInterceptor<fn($($arg),*)> for Func
        where
            Func: Fn(&Handle, &Callback<($($arg,)*)>, $($arg),*) + Send + Sync + 'static,
        {
            #[allow(non_snake_case)]
            fn into_interceptor(self) -> Interceptor<($($arg,)*)> {
                Arc::new(
                    move |handle: &Handle, inner: &Callback<($($arg,)*)>, ($($arg,)*): ($($arg,)*)| {
                        (self)(handle, inner, $($arg),*)
                    },
                )
            }
        }
    };
}

impl_signature!();
impl_signature!(A);
impl_signature!(A, B);
impl_signature!(A, B, C);
impl_signature!(A, B, C, D);
impl_signature!(A, B, C, D, E);
impl_signature!(A, B, C, D, E, F);
impl_signature!(A, B, C, D, E, F, G);
impl_signature!(A, B, C, D, E, F, G, H);

// ============================================================================
// SignatureInfo
// ============================================================================

/// Runtime identity of a bound signature.
///
/// Recorded once when the event is created. Holds the token compared by
/// `insert`/`get_callback`/`set_interceptor`, the token compared by `emit`,
/// and the names used in error messages.
#[derive(Clone)]
pub struct SignatureInfo {
    id: TypeId,
    args_id: TypeId,
    name: &'static str,
    parameters: String,
    interceptor: String,
}

impl SignatureInfo {
    pub fn of<S: Signature>() -> Self {
        let parameters = S::parameters();
        let interceptor = if parameters.is_empty() {
            format!("fn(&Handle, &Callback<{}>)", type_name::<S::Args>())
        } else {
            format!(
                "fn(&Handle, &Callback<{}>, {})",
                type_name::<S::Args>(),
                parameters
            )
        };

        Self {
            id: TypeId::of::<S>(),
            args_id: TypeId::of::<S::Args>(),
            name: type_name::<S>(),
            parameters,
            interceptor,
        }
    }

    /// 시그니처 자체의 토큰 (`fn(..)`)
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// 인자 튜플의 토큰
    pub fn args_id(&self) -> TypeId {
        self.args_id
    }

    /// e.g. `fn(u32, alloc::string::String)`
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// e.g. `u32, alloc::string::String`
    pub fn parameters(&self) -> &str {
        &self.parameters
    }

    /// 기대되는 interceptor 형태 (진단용)
    pub fn interceptor(&self) -> &str {
        &self.interceptor
    }

    pub fn is<S: Signature>(&self) -> bool {
        self.id == TypeId::of::<S>()
    }

    /// `A` 타입 인자 튜플로 emit 가능한지
    pub fn accepts_args<A: 'static>(&self) -> bool {
        self.args_id == TypeId::of::<A>()
    }
}

impl PartialEq for SignatureInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for SignatureInfo {}

impl fmt::Debug for SignatureInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SignatureInfo").field(&self.name).finish()
    }
}

impl fmt::Display for SignatureInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Parameter list of an emitted argument tuple, in the same format as
/// [`Signature::parameters`]. Non-tuple values are described as-is.
pub fn describe_args<A: 'static>() -> String {
    let name = type_name::<A>();
    match name.strip_prefix('(').and_then(|n| n.strip_suffix(')')) {
        Some(inner) => inner.strip_suffix(',').unwrap_or(inner).to_string(),
        None => name.to_string(),
    }
}
