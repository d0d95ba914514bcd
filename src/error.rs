use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::db::Page;

/// Error returned by every repository, service and sync operation.
///
/// Storage-layer failures never escape as panics or raw `anyhow` errors;
/// they are converted at the operation boundary with [`RepoError::storage`].
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    #[error("validation failed: {0}")]
    ValidationFailed(String),

    #[error("{operation} failed: {message}")]
    StorageFailure {
        operation: &'static str,
        message: String,
    },

    #[error("{0}")]
    PreconditionFailed(String),
}

impl RepoError {
    pub fn not_found(entity: &'static str, id: &str) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Wraps a storage error, keeping the full context chain in the message.
    pub fn storage(operation: &'static str, err: anyhow::Error) -> Self {
        Self::StorageFailure {
            operation,
            message: format!("{:#}", err),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type RepoResult<T> = Result<T, RepoError>;

pub type PaginatedResult<T> = RepoResult<Page<T>>;

/// Wire shape of a [`RepoResult`] for callers on the far side of a
/// serialization boundary: `{"success": true, "data": ..}` or
/// `{"success": false, "error": ".."}`, never both and never neither.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawEnvelope<T>", into = "RawEnvelope<T>")]
#[serde(bound(
    serialize = "T: Serialize + Clone",
    deserialize = "T: Deserialize<'de>"
))]
pub enum ResultEnvelope<T> {
    Success(T),
    Failure(String),
}

impl<T> ResultEnvelope<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::Failure(error) => Some(error),
        }
    }
}

impl<T> From<RepoResult<T>> for ResultEnvelope<T> {
    fn from(result: RepoResult<T>) -> Self {
        match result {
            Ok(data) => Self::Success(data),
            Err(err) => Self::Failure(err.to_string()),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(bound(serialize = "T: Serialize", deserialize = "T: Deserialize<'de>"))]
struct RawEnvelope<T> {
    success: bool,
    // A present `data` is always `Some`, even when it is `null`, so `()` and
    // `None` payloads survive the round trip.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl<T> TryFrom<RawEnvelope<T>> for ResultEnvelope<T> {
    type Error = String;

    fn try_from(raw: RawEnvelope<T>) -> Result<Self, Self::Error> {
        match (raw.success, raw.data, raw.error) {
            (true, Some(data), None) => Ok(Self::Success(data)),
            (false, None, Some(error)) => Ok(Self::Failure(error)),
            (success, _, _) => Err(format!(
                "malformed result envelope (success={})",
                success
            )),
        }
    }
}

impl<T> From<ResultEnvelope<T>> for RawEnvelope<T> {
    fn from(envelope: ResultEnvelope<T>) -> Self {
        match envelope {
            ResultEnvelope::Success(data) => RawEnvelope {
                success: true,
                data: Some(data),
                error: None,
            },
            ResultEnvelope::Failure(error) => RawEnvelope {
                success: false,
                data: None,
                error: Some(error),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_is_prefixed_with_operation() {
        let err = RepoError::storage("update", anyhow::anyhow!("disk full"));
        assert_eq!(err.to_string(), "update failed: disk full");
    }

    #[test]
    fn test_envelope_shapes() -> anyhow::Result<()> {
        let ok = ResultEnvelope::from(RepoResult::Ok(3u32));
        assert_eq!(serde_json::to_string(&ok)?, r#"{"success":true,"data":3}"#);

        let failed = ResultEnvelope::<u32>::from(Err(RepoError::not_found("Team", "team_1")));
        assert_eq!(
            serde_json::to_string(&failed)?,
            r#"{"success":false,"error":"Team 'team_1' not found"}"#
        );

        let parsed: ResultEnvelope<u32> = serde_json::from_str(r#"{"success":false,"error":"nope"}"#)?;
        assert_eq!(parsed.error(), Some("nope"));
        assert!(!parsed.is_success());
        Ok(())
    }

    #[test]
    fn test_empty_payloads_round_trip() -> anyhow::Result<()> {
        let unit = ResultEnvelope::from(RepoResult::Ok(()));
        let json = serde_json::to_string(&unit)?;
        assert_eq!(json, r#"{"success":true,"data":null}"#);
        assert_eq!(serde_json::from_str::<ResultEnvelope<()>>(&json)?, unit);

        let nothing = ResultEnvelope::from(RepoResult::<Option<u32>>::Ok(None));
        let json = serde_json::to_string(&nothing)?;
        let parsed: ResultEnvelope<Option<u32>> = serde_json::from_str(&json)?;
        assert_eq!(parsed, ResultEnvelope::Success(None));
        assert!(parsed.is_success());

        let failed = ResultEnvelope::<()>::from(Err(RepoError::PreconditionFailed("locked".to_string())));
        let json = serde_json::to_string(&failed)?;
        assert_eq!(serde_json::from_str::<ResultEnvelope<()>>(&json)?, failed);
        Ok(())
    }

    #[test]
    fn test_envelope_requires_data_on_success() {
        assert!(serde_json::from_str::<ResultEnvelope<()>>(r#"{"success":true}"#).is_err());
        assert!(serde_json::from_str::<ResultEnvelope<Option<u32>>>(r#"{"success":true}"#).is_err());
    }

    #[test]
    fn test_envelope_rejects_mixed_shapes() {
        assert!(serde_json::from_str::<ResultEnvelope<u32>>(r#"{"success":true,"error":"x"}"#).is_err());
        assert!(serde_json::from_str::<ResultEnvelope<u32>>(r#"{"success":false}"#).is_err());
        assert!(serde_json::from_str::<ResultEnvelope<u32>>(r#"{"success":true,"data":1,"error":"x"}"#).is_err());
    }
}
