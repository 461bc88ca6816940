//! Error types for WHEEL
//!
//! Every failure is local to the call that caused it: nothing is retried,
//! nothing is swallowed, and a rejected operation never leaves partial state
//! behind.

use thiserror::Error;

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, Error>;

/// WHEEL 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Type checking
    // ========================================================================
    /// A callback, interceptor or metadata value did not have an accepted type.
    #[error("{}", wrong_type_message(.event, .what, .scope, .accepted, .found))]
    WrongType {
        /// 값을 거부한 이벤트 이름
        event: String,
        /// What was being checked ("function", "meta", "interceptor")
        what: &'static str,
        /// Operation that performed the check (e.g. "insert()")
        scope: Option<&'static str>,
        /// 이벤트가 허용하는 타입 목록
        accepted: Vec<String>,
        /// 실제로 전달된 타입
        found: String,
    },

    /// `emit()` was called with an argument tuple that differs from the
    /// bound signature in arity or in any parameter type.
    #[error(
        "Wrong arguments for emit() in event \"{event}\":\n  expected: ({expected})\n     found: ({found})"
    )]
    WrongArguments {
        event: String,
        expected: String,
        found: String,
    },

    // ========================================================================
    // Lookup
    // ========================================================================
    #[error("No such event: \"{name}\".")]
    NoSuchEvent { name: String },

    /// The handle is invalidated, belongs to another event, or its slot is gone.
    #[error("Stale handle used with event \"{event}\"")]
    StaleHandle { event: String },

    // ========================================================================
    // Configuration
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// WrongType 생성 헬퍼
    pub fn wrong_type(
        event: impl Into<String>,
        what: &'static str,
        scope: Option<&'static str>,
        accepted: Vec<String>,
        found: impl Into<String>,
    ) -> Self {
        Error::WrongType {
            event: event.into(),
            what,
            scope,
            accepted,
            found: found.into(),
        }
    }

    /// WrongArguments 생성 헬퍼
    pub fn wrong_arguments(
        event: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Error::WrongArguments {
            event: event.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn no_such_event(name: impl Into<String>) -> Self {
        Error::NoSuchEvent { name: name.into() }
    }

    pub fn stale_handle(event: impl Into<String>) -> Self {
        Error::StaleHandle {
            event: event.into(),
        }
    }

    /// 타입 검사 실패인지 확인
    pub fn is_type_error(&self) -> bool {
        matches!(self, Error::WrongType { .. } | Error::WrongArguments { .. })
    }

    /// 조회 실패인지 확인
    pub fn is_lookup_error(&self) -> bool {
        matches!(self, Error::NoSuchEvent { .. } | Error::StaleHandle { .. })
    }
}

fn wrong_type_message(
    event: &str,
    what: &str,
    scope: &Option<&'static str>,
    accepted: &[String],
    found: &str,
) -> String {
    let location = match scope {
        Some(scope) => format!("for {} in", scope),
        None => "for".to_string(),
    };
    let mut message = format!("Wrong {} type {} event \"{}\":\n", what, location, event);
    for accepted in accepted {
        message.push_str(&format!("  expected: {}\n", accepted));
    }
    message.push_str(&format!("     found: {}", found));
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrong_type_message_lists_every_accepted_type() {
        let err = Error::wrong_type(
            "signal",
            "meta",
            Some("insert()"),
            vec!["(i32,)".to_string(), "(u8, u8)".to_string()],
            "(bool,)",
        );

        let text = err.to_string();
        assert!(text.starts_with("Wrong meta type for insert() in event \"signal\":\n"));
        assert!(text.contains("  expected: (i32,)\n"));
        assert!(text.contains("  expected: (u8, u8)\n"));
        assert!(text.ends_with("     found: (bool,)"));
        assert!(err.is_type_error());
    }

    #[test]
    fn test_wrong_type_without_scope() {
        let err = Error::wrong_type("tick", "function", None, vec!["fn()".into()], "fn(i32)");
        assert!(err
            .to_string()
            .starts_with("Wrong function type for event \"tick\":"));
    }

    #[test]
    fn test_classification() {
        assert!(Error::no_such_event("missing").is_lookup_error());
        assert!(Error::stale_handle("tick").is_lookup_error());
        assert!(Error::wrong_arguments("tick", "i32", "u8").is_type_error());
        assert!(!Error::Config("bad".into()).is_type_error());
        assert_eq!(
            Error::no_such_event("missing").to_string(),
            "No such event: \"missing\"."
        );
    }
}
