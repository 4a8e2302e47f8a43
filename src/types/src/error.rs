// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The core error type for bulk mutate job orchestration.

use crate::model::ApiError;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The error returned by the bulk mutate job helpers.
///
/// Errors come from several sources: the transport may fail while submitting
/// or polling a job, the job itself may end in a failed state, the service
/// may report an error that cannot be attributed to any submitted operation,
/// or a loop budget may expire. Most callers just propagate or log the error;
/// callers that recover from specific conditions use the `is_*` predicates
/// and accessors to classify it.
///
/// Note that per-operation failures are **not** reported through this type.
/// They are absorbed into the outcome lists returned by reconciliation and
/// the exemption retry loop, so that every submitted operation receives an
/// explicit disposition.
///
/// # Example
/// ```
/// use mutate_jobs_types::Error;
/// match example_function() {
///     Err(e) if e.is_job_failed() => {
///         println!("the job failed: {:?}", e.failure_reason());
///     }
///     Err(e) => println!("some other error {e}"),
///     Ok(_) => println!("success"),
/// }
///
/// fn example_function() -> Result<(), Error> {
///     // ... details omitted ...
///     # Err(Error::job_failed(Some("quota exceeded".to_string())))
/// }
/// ```
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    source: Option<BoxError>,
}

impl Error {
    /// Creates an error representing a transport fault.
    ///
    /// Transport faults are never retried by this library; retry policy, if
    /// any, belongs to the service client or the application.
    pub fn transport<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Transport,
            source: Some(source.into()),
        }
    }

    /// The remote call failed before a structured response was received.
    pub fn is_transport(&self) -> bool {
        matches!(self.kind, ErrorKind::Transport)
    }

    /// Creates an error representing a rejected job submission.
    pub fn submission<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Submission,
            source: Some(source.into()),
        }
    }

    /// The batch was rejected at submission, or an effecting call failed
    /// after a clean validation round.
    pub fn is_submission(&self) -> bool {
        matches!(self.kind, ErrorKind::Submission)
    }

    /// Creates an error indicating a result query on a non-terminal job.
    pub fn not_ready() -> Self {
        Self {
            kind: ErrorKind::NotReady,
            source: None,
        }
    }

    /// The job result was requested before the job reached a terminal
    /// status.
    pub fn is_not_ready(&self) -> bool {
        matches!(self.kind, ErrorKind::NotReady)
    }

    /// Creates an error for a job that ended in the failed state.
    pub fn job_failed(reason: Option<String>) -> Self {
        Self {
            kind: ErrorKind::JobFailed(reason),
            source: None,
        }
    }

    /// The job reached the failed terminal status.
    pub fn is_job_failed(&self) -> bool {
        matches!(self.kind, ErrorKind::JobFailed(_))
    }

    /// The failure reason reported by the service, if the job failed and one
    /// was provided.
    pub fn failure_reason(&self) -> Option<&str> {
        match &self.kind {
            ErrorKind::JobFailed(reason) => reason.as_deref(),
            _ => None,
        }
    }

    /// Creates an error for a service error that resolves to no operation.
    ///
    /// Errors whose field path does not encode a valid operation index
    /// cannot be recovered from by dropping or exempting an operation; they
    /// always abort the run, carrying the raw error for inspection.
    pub fn unattributed(error: ApiError) -> Self {
        Self {
            kind: ErrorKind::Unattributed(error),
            source: None,
        }
    }

    /// The service reported an error that cannot be attributed to any
    /// submitted operation.
    pub fn is_unattributed(&self) -> bool {
        matches!(self.kind, ErrorKind::Unattributed(_))
    }

    /// The raw service error behind an unattributed failure.
    pub fn unattributed_error(&self) -> Option<&ApiError> {
        match &self.kind {
            ErrorKind::Unattributed(e) => Some(e),
            _ => None,
        }
    }

    /// Creates an error representing an expired loop budget.
    pub fn exhausted<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Exhausted,
            source: Some(source.into()),
        }
    }

    /// A loop budget expired before the batch settled.
    pub fn is_exhausted(&self) -> bool {
        matches!(self.kind, ErrorKind::Exhausted)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            ErrorKind::Transport => write!(f, "the transport reported an error"),
            ErrorKind::Submission => write!(f, "the job submission was rejected"),
            ErrorKind::NotReady => write!(
                f,
                "the job result was requested before the job reached a terminal status"
            ),
            ErrorKind::JobFailed(None) => write!(f, "the job failed without a reported reason"),
            ErrorKind::JobFailed(Some(reason)) => write!(f, "the job failed: {reason}"),
            ErrorKind::Unattributed(e) => write!(
                f,
                "the service reported an error that resolves to no operation, field path {:?}: {}",
                e.field_path, e.message
            ),
            ErrorKind::Exhausted => write!(f, "a loop budget expired before the batch settled"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

#[derive(Debug)]
enum ErrorKind {
    Transport,
    Submission,
    NotReady,
    JobFailed(Option<String>),
    Unattributed(ApiError),
    Exhausted,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn transport() {
        let error = Error::transport("connection reset");
        assert!(error.is_transport(), "{error:?}");
        assert!(!error.is_job_failed(), "{error:?}");
        assert!(error.source().is_some(), "{error:?}");
    }

    #[test]
    fn submission() {
        let error = Error::submission("malformed batch");
        assert!(error.is_submission(), "{error:?}");
        let display = format!("{error}");
        assert!(display.contains("submission"), "{display}");
    }

    #[test]
    fn not_ready() {
        let error = Error::not_ready();
        assert!(error.is_not_ready(), "{error:?}");
        assert!(error.source().is_none(), "{error:?}");
    }

    #[test]
    fn job_failed_with_reason() {
        let error = Error::job_failed(Some("quota exceeded".to_string()));
        assert!(error.is_job_failed(), "{error:?}");
        assert_eq!(error.failure_reason(), Some("quota exceeded"));
        let display = format!("{error}");
        assert!(display.contains("quota exceeded"), "{display}");
    }

    #[test]
    fn job_failed_without_reason() {
        let error = Error::job_failed(None);
        assert!(error.is_job_failed(), "{error:?}");
        assert_eq!(error.failure_reason(), None);
    }

    #[test]
    fn unattributed() {
        let api_error = ApiError::default()
            .set_field_path("unrelated.path")
            .set_message("internal error");
        let error = Error::unattributed(api_error.clone());
        assert!(error.is_unattributed(), "{error:?}");
        assert_eq!(error.unattributed_error(), Some(&api_error));
        let display = format!("{error}");
        assert!(display.contains("unrelated.path"), "{display}");
    }

    #[test]
    fn exhausted() {
        let error = Error::exhausted("too many rounds");
        assert!(error.is_exhausted(), "{error:?}");
        assert!(error.source().is_some(), "{error:?}");
    }

    #[test]
    fn accessors_on_other_kinds() {
        let error = Error::transport("boom");
        assert_eq!(error.failure_reason(), None);
        assert_eq!(error.unattributed_error(), None);
    }
}
