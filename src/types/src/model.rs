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

use serde::{Deserialize, Serialize};

/// The mutation applied by an [Operation].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum OperationKind {
    /// Create a new entity.
    #[default]
    Add,
    /// Modify an existing entity.
    Update,
    /// Delete an existing entity.
    Remove,
}

/// A single mutation within a batch.
///
/// Operations are identified by their position within the batch that
/// submitted them: the service echoes this index inside the field path of any
/// error it reports, see [operation_index][crate::field_path::operation_index].
///
/// `Operation` is a value type. The exemption retry loop never mutates an
/// operation in place; [with_exemption][Operation::with_exemption] returns a
/// new value with the extra exemption request appended.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
#[non_exhaustive]
pub struct Operation {
    /// The kind of mutation to apply.
    pub kind: OperationKind,

    /// The entity this operation targets. Not set for [OperationKind::Add],
    /// which creates the entity instead.
    pub target_id: Option<String>,

    /// The service-specific operand, e.g. a keyword or an ad.
    pub payload: serde_json::Value,

    /// Exemption requests attached to this operation, in the order they were
    /// granted.
    pub exemption_requests: Vec<ExemptionRequest>,
}

impl Operation {
    /// Sets the value for [kind][Operation::kind].
    pub fn set_kind<T: Into<OperationKind>>(mut self, v: T) -> Self {
        self.kind = v.into();
        self
    }

    /// Sets the value for [target_id][Operation::target_id].
    pub fn set_target_id<T: Into<String>>(mut self, v: T) -> Self {
        self.target_id = Some(v.into());
        self
    }

    /// Sets the value for [payload][Operation::payload].
    pub fn set_payload<T: Into<serde_json::Value>>(mut self, v: T) -> Self {
        self.payload = v.into();
        self
    }

    /// Sets the value for
    /// [exemption_requests][Operation::exemption_requests].
    pub fn set_exemption_requests<T, I>(mut self, v: T) -> Self
    where
        T: IntoIterator<Item = I>,
        I: Into<ExemptionRequest>,
    {
        self.exemption_requests = v.into_iter().map(|v| v.into()).collect();
        self
    }

    /// Returns a copy of this operation with an exemption for `key` appended.
    ///
    /// Exemption requests accumulate: an operation that accrues exemptable
    /// errors over several validation rounds carries one request per granted
    /// key.
    pub fn with_exemption<T: Into<String>>(mut self, key: T) -> Self {
        self.exemption_requests
            .push(ExemptionRequest::default().set_key(key));
        self
    }
}

/// A request to bypass a specific policy violation on resubmission.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
#[non_exhaustive]
pub struct ExemptionRequest {
    /// The server-issued key identifying the violation to bypass.
    pub key: String,
}

impl ExemptionRequest {
    /// Sets the value for [key][ExemptionRequest::key].
    pub fn set_key<T: Into<String>>(mut self, v: T) -> Self {
        self.key = v.into();
        self
    }
}

/// An opaque identifier for a submitted bulk mutate job.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct JobHandle(String);

impl JobHandle {
    pub fn new<T: Into<String>>(id: T) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for JobHandle {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for JobHandle {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// The server-reported state of a bulk mutate job.
///
/// Transitions are server-driven and monotonic: a job observed as
/// [Completed][JobStatus::Completed] or [Failed][JobStatus::Failed] never
/// regresses to an in-progress state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum JobStatus {
    /// The job is queued and has not started processing.
    #[default]
    Pending,
    /// The job is being processed.
    Processing,
    /// The job finished and its result can be retrieved.
    Completed,
    /// The job finished without producing a result.
    Failed,
}

impl JobStatus {
    /// Returns true if no further transition can occur from this status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// A snapshot of a bulk mutate job, as returned by a status query.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
#[non_exhaustive]
pub struct Job {
    /// The handle identifying this job.
    pub handle: JobHandle,

    /// The current status.
    pub status: JobStatus,

    /// The reason the job failed. Only set when `status` is
    /// [Failed][JobStatus::Failed], and even then it may be absent.
    pub failure_reason: Option<String>,
}

impl Job {
    /// Sets the value for [handle][Job::handle].
    pub fn set_handle<T: Into<JobHandle>>(mut self, v: T) -> Self {
        self.handle = v.into();
        self
    }

    /// Sets the value for [status][Job::status].
    pub fn set_status<T: Into<JobStatus>>(mut self, v: T) -> Self {
        self.status = v.into();
        self
    }

    /// Sets the value for [failure_reason][Job::failure_reason].
    pub fn set_failure_reason<T: Into<String>>(mut self, v: T) -> Self {
        self.failure_reason = Some(v.into());
        self
    }
}

/// The per-operation result slot within a [JobResult].
///
/// The service reports one outcome per submitted operation, in submission
/// order. A failed operation still occupies its slot, holding a placeholder
/// instead of an entity.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationOutcome {
    /// The operation was applied; holds the resulting entity.
    Success(serde_json::Value),
    /// The operation was not applied. Details, if any, are reported through
    /// the error list of the enclosing result.
    Failure,
}

impl OperationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, OperationOutcome::Success(_))
    }
}

/// A per-operation error reported by the service.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
#[non_exhaustive]
pub struct ApiError {
    /// The path of the request field this error refers to. Errors caused by
    /// an operation encode its batch index here, e.g.
    /// `operations[7].operand`.
    pub field_path: String,

    /// A developer-facing description of the error.
    pub message: String,

    /// The piece of request data that triggered the error.
    pub trigger: String,

    /// Whether the violation behind this error can be bypassed with an
    /// exemption request.
    pub exemptable: bool,

    /// The key to attach when requesting an exemption. Only meaningful when
    /// `exemptable` is set.
    pub exemption_key: Option<String>,
}

impl ApiError {
    /// Sets the value for [field_path][ApiError::field_path].
    pub fn set_field_path<T: Into<String>>(mut self, v: T) -> Self {
        self.field_path = v.into();
        self
    }

    /// Sets the value for [message][ApiError::message].
    pub fn set_message<T: Into<String>>(mut self, v: T) -> Self {
        self.message = v.into();
        self
    }

    /// Sets the value for [trigger][ApiError::trigger].
    pub fn set_trigger<T: Into<String>>(mut self, v: T) -> Self {
        self.trigger = v.into();
        self
    }

    /// Sets the value for [exemptable][ApiError::exemptable].
    pub fn set_exemptable<T: Into<bool>>(mut self, v: T) -> Self {
        self.exemptable = v.into();
        self
    }

    /// Sets the value for [exemption_key][ApiError::exemption_key].
    pub fn set_exemption_key<T: Into<String>>(mut self, v: T) -> Self {
        self.exemption_key = Some(v.into());
        self
    }

    /// The key to use in an exemption request for this error.
    ///
    /// Returns `None` unless the error is exemptable **and** carries a
    /// non-empty key: the service occasionally flags an error as exemptable
    /// without issuing a key, and such errors cannot be bypassed.
    pub fn exemption(&self) -> Option<&str> {
        if !self.exemptable {
            return None;
        }
        self.exemption_key.as_deref().filter(|k| !k.is_empty())
    }
}

/// The result of a completed bulk mutate job.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
#[non_exhaustive]
pub struct JobResult {
    /// One outcome per submitted operation, aligned by index with the batch.
    pub outcomes: Vec<OperationOutcome>,

    /// The errors reported for failed operations.
    pub errors: Vec<ApiError>,
}

impl JobResult {
    /// Sets the value for [outcomes][JobResult::outcomes].
    pub fn set_outcomes<T, I>(mut self, v: T) -> Self
    where
        T: IntoIterator<Item = I>,
        I: Into<OperationOutcome>,
    {
        self.outcomes = v.into_iter().map(|v| v.into()).collect();
        self
    }

    /// Sets the value for [errors][JobResult::errors].
    pub fn set_errors<T, I>(mut self, v: T) -> Self
    where
        T: IntoIterator<Item = I>,
        I: Into<ApiError>,
    {
        self.errors = v.into_iter().map(|v| v.into()).collect();
        self
    }
}

/// The result of a synchronous `mutate` call.
///
/// A structured failure replaces the exception-and-downcast flow of older
/// client libraries: callers pattern match on the partial failure payload
/// instead of catching a service exception and inspecting its contents.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MutateOutcome {
    /// All operations were accepted; holds one outcome per operation.
    Success(Vec<OperationOutcome>),
    /// At least one operation was rejected; holds the reported errors.
    PartialFailure(Vec<ApiError>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_builder() {
        let op = Operation::default()
            .set_kind(OperationKind::Update)
            .set_target_id("criterion-123")
            .set_payload(serde_json::json!({"text": "mars cruise"}));
        assert_eq!(op.kind, OperationKind::Update);
        assert_eq!(op.target_id.as_deref(), Some("criterion-123"));
        assert!(op.exemption_requests.is_empty());
    }

    #[test]
    fn exemptions_accumulate_in_order() {
        let op = Operation::default()
            .with_exemption("K1")
            .with_exemption("K2");
        let keys = op
            .exemption_requests
            .iter()
            .map(|r| r.key.as_str())
            .collect::<Vec<_>>();
        assert_eq!(keys, vec!["K1", "K2"]);
    }

    #[test]
    fn with_exemption_leaves_original_untouched() {
        let original = Operation::default().set_target_id("x");
        let augmented = original.clone().with_exemption("K1");
        assert!(original.exemption_requests.is_empty());
        assert_eq!(augmented.exemption_requests.len(), 1);
    }

    #[test]
    fn job_status_terminal() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }

    #[test]
    fn api_error_exemption() {
        let granted = ApiError::default()
            .set_exemptable(true)
            .set_exemption_key("K1");
        assert_eq!(granted.exemption(), Some("K1"));

        let no_key = ApiError::default().set_exemptable(true);
        assert_eq!(no_key.exemption(), None);

        let empty_key = ApiError::default()
            .set_exemptable(true)
            .set_exemption_key("");
        assert_eq!(empty_key.exemption(), None);

        let not_exemptable = ApiError::default()
            .set_exemptable(false)
            .set_exemption_key("K1");
        assert_eq!(not_exemptable.exemption(), None);
    }

    #[test]
    fn api_error_wire_format() -> anyhow::Result<()> {
        let error = ApiError::default()
            .set_field_path("operations[7].operand")
            .set_message("policy violation")
            .set_trigger("luxury cruise")
            .set_exemptable(true)
            .set_exemption_key("K1");
        let got = serde_json::to_value(&error)?;
        let want = serde_json::json!({
            "fieldPath": "operations[7].operand",
            "message": "policy violation",
            "trigger": "luxury cruise",
            "exemptable": true,
            "exemptionKey": "K1",
        });
        assert_eq!(got, want);
        let back = serde_json::from_value::<ApiError>(want)?;
        assert_eq!(back, error);
        Ok(())
    }

    #[test]
    fn job_wire_format() -> anyhow::Result<()> {
        let json = serde_json::json!({
            "handle": "job-001",
            "status": "PROCESSING",
        });
        let job = serde_json::from_value::<Job>(json)?;
        assert_eq!(job.handle, JobHandle::new("job-001"));
        assert_eq!(job.status, JobStatus::Processing);
        assert_eq!(job.failure_reason, None);
        Ok(())
    }

    #[test]
    fn operation_outcome_predicates() {
        let success = OperationOutcome::Success(serde_json::json!({"id": 1}));
        assert!(success.is_success());
        assert!(!OperationOutcome::Failure.is_success());
    }
}
