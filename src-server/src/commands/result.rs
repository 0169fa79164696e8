//! Uniform action result
//!
//! Actions never let an error escape: everything becomes an `ActionResult`.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::domain::DomainError;

/// Message shown for store failures. Details only go to the log.
pub const GENERIC_STORE_MESSAGE: &str = "Something went wrong, please try again";

/// Failure category reported to the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    ValidationError,
    AuthorizationError,
    /// Missing row or someone else's row. Deliberately not distinguished.
    NotFoundOrForbidden,
    StoreError,
}

/// Internal action failure, converted to `ActionResult` at the boundary
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("{0}")]
    Validation(String),
    #[error("You must be signed in to change your list")]
    Unauthorized,
    #[error("Item not found")]
    NotFoundOrForbidden,
    #[error("{}", GENERIC_STORE_MESSAGE)]
    Store(#[source] DomainError),
}

impl ActionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ActionError::Validation(_) => ErrorKind::ValidationError,
            ActionError::Unauthorized => ErrorKind::AuthorizationError,
            ActionError::NotFoundOrForbidden => ErrorKind::NotFoundOrForbidden,
            ActionError::Store(_) => ErrorKind::StoreError,
        }
    }
}

impl From<DomainError> for ActionError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::InvalidInput(msg) => ActionError::Validation(msg),
            other => ActionError::Store(other),
        }
    }
}

/// `{ok: true, item}` or `{ok: false, errorKind, message}`
#[derive(Debug, Clone, PartialEq)]
pub enum ActionResult<T> {
    Ok { item: T },
    Failed { error_kind: ErrorKind, message: String },
}

impl<T> ActionResult<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, ActionResult::Ok { .. })
    }

    pub fn item(&self) -> Option<&T> {
        match self {
            ActionResult::Ok { item } => Some(item),
            ActionResult::Failed { .. } => None,
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            ActionResult::Ok { .. } => None,
            ActionResult::Failed { error_kind, .. } => Some(*error_kind),
        }
    }
}

impl<T> From<Result<T, ActionError>> for ActionResult<T> {
    fn from(result: Result<T, ActionError>) -> Self {
        match result {
            Ok(item) => ActionResult::Ok { item },
            Err(e) => ActionResult::Failed {
                error_kind: e.kind(),
                message: e.to_string(),
            },
        }
    }
}

impl<T: Serialize> Serialize for ActionResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ActionResult::Ok { item } => {
                let mut st = serializer.serialize_struct("ActionResult", 2)?;
                st.serialize_field("ok", &true)?;
                st.serialize_field("item", item)?;
                st.end()
            }
            ActionResult::Failed { error_kind, message } => {
                let mut st = serializer.serialize_struct("ActionResult", 3)?;
                st.serialize_field("ok", &false)?;
                st.serialize_field("errorKind", error_kind)?;
                st.serialize_field("message", message)?;
                st.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_shape() {
        let ok: ActionResult<u32> = Ok(5).into();
        assert_eq!(serde_json::to_value(&ok).unwrap(), json!({"ok": true, "item": 5}));

        let failed: ActionResult<u32> = Err(ActionError::NotFoundOrForbidden).into();
        assert_eq!(
            serde_json::to_value(&failed).unwrap(),
            json!({"ok": false, "errorKind": "NotFoundOrForbidden", "message": "Item not found"})
        );
    }

    #[test]
    fn test_store_errors_hide_details() {
        let e: ActionError = DomainError::Internal("disk I/O error at page 42".to_string()).into();
        assert_eq!(e.kind(), ErrorKind::StoreError);
        assert_eq!(e.to_string(), GENERIC_STORE_MESSAGE);

        let v: ActionError = DomainError::InvalidInput("Title cannot be empty".to_string()).into();
        assert_eq!(v.kind(), ErrorKind::ValidationError);
    }
}
