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

//! Maps a job's result set back to the operations that produced it.
//!
//! The service reports results in two parallel shapes: one outcome slot per
//! submitted operation, aligned by batch index, and a list of errors that
//! encode the index of the operation they refer to inside their field path.
//! Reconciliation is a pure function of the batch and the result: no I/O,
//! deterministic, and total. Every batch index receives exactly one
//! classification, and every reported error is either attributed to an
//! operation or collected for unconditional escalation. Unattributed errors
//! are never dropped.

use types::{ApiError, JobResult, Operation, OperationOutcome, field_path};

/// How one attributed error can be recovered from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    /// Resubmitting the operation with an exemption for `key` may succeed.
    Exemptable { key: String },
    /// The operation cannot be fixed by exemption; it must be dropped.
    NonExemptable,
}

/// An error attributed to a specific operation.
#[derive(Clone, Debug, PartialEq)]
pub struct AttributedError {
    /// The raw error as reported by the service.
    pub error: ApiError,
    /// Its recovery classification.
    pub class: ErrorClass,
}

/// The classification of one operation within a reconciled batch.
#[derive(Clone, Debug, PartialEq)]
pub enum Disposition {
    /// The operation was applied; holds the resulting entity.
    Succeeded(serde_json::Value),
    /// The operation was not applied.
    Failed,
}

/// One operation's slice of a reconciled result.
#[derive(Clone, Debug, PartialEq)]
pub struct ReconciledOperation {
    /// The operation's index within the submitted batch.
    pub index: usize,
    /// Whether the operation was applied.
    pub disposition: Disposition,
    /// The errors attributed to this operation, in reported order.
    pub errors: Vec<AttributedError>,
}

impl ReconciledOperation {
    /// Returns true if any attributed error rules out exemption.
    pub fn has_fatal_error(&self) -> bool {
        self.errors
            .iter()
            .any(|e| e.class == ErrorClass::NonExemptable)
    }
}

/// The attribution of a batch of reported errors to operation indices.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Attribution {
    /// The errors attributed to each batch index. Always one entry per
    /// operation, possibly empty.
    pub per_operation: Vec<Vec<AttributedError>>,
    /// Errors whose field path resolves to no operation in the batch.
    pub unattributed: Vec<ApiError>,
}

/// Attributes each reported error to an operation index, or to none.
///
/// An error is attributed when its field path parses to an index within
/// `[0, batch_len)`; see
/// [operation_index][types::field_path::operation_index]. Attributed errors
/// are classified [Exemptable][ErrorClass::Exemptable] only when the service
/// declares them so **and** grants a non-empty exemption key.
pub fn attribute(batch_len: usize, errors: &[ApiError]) -> Attribution {
    let mut per_operation = vec![Vec::new(); batch_len];
    let mut unattributed = Vec::new();
    for error in errors {
        match field_path::operation_index(&error.field_path) {
            Some(index) if index < batch_len => {
                let class = match error.exemption() {
                    Some(key) => ErrorClass::Exemptable {
                        key: key.to_string(),
                    },
                    None => ErrorClass::NonExemptable,
                };
                per_operation[index].push(AttributedError {
                    error: error.clone(),
                    class,
                });
            }
            _ => unattributed.push(error.clone()),
        }
    }
    Attribution {
        per_operation,
        unattributed,
    }
}

/// The reconciled view of one job result.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Reconciliation {
    /// One classified entry per submitted operation, in batch order.
    pub outcomes: Vec<ReconciledOperation>,
    /// Errors whose field path resolves to no operation in the batch. These
    /// must be escalated to the caller; there is no safe partial recovery.
    pub unattributed: Vec<ApiError>,
}

/// Reconciles a job result against the batch that produced it.
///
/// For each index `i` in `batch`, the outcome slot `result.outcomes[i]`
/// determines the disposition: a [Success][OperationOutcome::Success] slot
/// classifies as [Succeeded][Disposition::Succeeded], anything else,
/// including a missing slot, as [Failed][Disposition::Failed]. Reported
/// errors are attributed and attached per [attribute].
pub fn reconcile(batch: &[Operation], result: &JobResult) -> Reconciliation {
    let attribution = attribute(batch.len(), &result.errors);
    let outcomes = attribution
        .per_operation
        .into_iter()
        .enumerate()
        .map(|(index, errors)| {
            let disposition = match result.outcomes.get(index) {
                Some(OperationOutcome::Success(value)) => Disposition::Succeeded(value.clone()),
                _ => Disposition::Failed,
            };
            ReconciledOperation {
                index,
                disposition,
                errors,
            }
        })
        .collect();
    Reconciliation {
        outcomes,
        unattributed: attribution.unattributed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::Operation;

    fn batch(n: usize) -> Vec<Operation> {
        (0..n)
            .map(|i| Operation::default().set_payload(serde_json::json!({"keyword": i})))
            .collect()
    }

    fn error_at(index: usize) -> ApiError {
        ApiError::default()
            .set_field_path(format!("operations[{index}].operand"))
            .set_message("policy violation")
            .set_trigger("trigger text")
    }

    #[test]
    fn returns_one_outcome_per_operation() {
        let batch = batch(4);
        let result = JobResult::default().set_outcomes(vec![
            OperationOutcome::Success(serde_json::json!({"id": 0})),
            OperationOutcome::Failure,
            OperationOutcome::Success(serde_json::json!({"id": 2})),
            OperationOutcome::Failure,
        ]);
        let reconciliation = reconcile(&batch, &result);
        assert_eq!(reconciliation.outcomes.len(), 4);
        let indices = reconciliation
            .outcomes
            .iter()
            .map(|o| o.index)
            .collect::<Vec<_>>();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        assert_eq!(
            reconciliation.outcomes[0].disposition,
            Disposition::Succeeded(serde_json::json!({"id": 0}))
        );
        assert_eq!(reconciliation.outcomes[1].disposition, Disposition::Failed);
    }

    #[test]
    fn empty_batch() {
        let reconciliation = reconcile(&[], &JobResult::default());
        assert!(reconciliation.outcomes.is_empty());
        assert!(reconciliation.unattributed.is_empty());
    }

    #[test]
    fn short_outcome_list_classifies_missing_slots_as_failed() {
        let batch = batch(3);
        let result = JobResult::default().set_outcomes(vec![OperationOutcome::Success(
            serde_json::json!({"id": 0}),
        )]);
        let reconciliation = reconcile(&batch, &result);
        assert_eq!(reconciliation.outcomes.len(), 3);
        assert_eq!(reconciliation.outcomes[1].disposition, Disposition::Failed);
        assert_eq!(reconciliation.outcomes[2].disposition, Disposition::Failed);
    }

    #[test]
    fn errors_attach_to_the_exact_index() {
        let batch = batch(3);
        let result = JobResult::default().set_errors(vec![error_at(1)]);
        let reconciliation = reconcile(&batch, &result);
        assert!(reconciliation.outcomes[0].errors.is_empty());
        assert_eq!(reconciliation.outcomes[1].errors.len(), 1);
        assert!(reconciliation.outcomes[2].errors.is_empty());
        assert!(reconciliation.unattributed.is_empty());
    }

    #[test]
    fn unattributed_paths_are_escalated_not_dropped() {
        let batch = batch(2);
        let stray = ApiError::default()
            .set_field_path("unrelated.path")
            .set_message("internal error");
        let result = JobResult::default().set_errors(vec![stray.clone(), error_at(0)]);
        let reconciliation = reconcile(&batch, &result);
        assert_eq!(reconciliation.unattributed, vec![stray]);
        assert_eq!(reconciliation.outcomes[0].errors.len(), 1);
    }

    #[test]
    fn out_of_range_index_is_unattributed() {
        let batch = batch(2);
        let result = JobResult::default().set_errors(vec![error_at(2)]);
        let reconciliation = reconcile(&batch, &result);
        assert_eq!(reconciliation.unattributed.len(), 1);
        assert!(reconciliation.outcomes.iter().all(|o| o.errors.is_empty()));
    }

    #[test]
    fn classification_requires_a_granted_key() {
        let errors = vec![
            error_at(0).set_exemptable(true).set_exemption_key("K1"),
            error_at(1).set_exemptable(true),
            error_at(2).set_exemptable(false),
        ];
        let attribution = attribute(3, &errors);
        assert_eq!(
            attribution.per_operation[0][0].class,
            ErrorClass::Exemptable {
                key: "K1".to_string()
            }
        );
        assert_eq!(
            attribution.per_operation[1][0].class,
            ErrorClass::NonExemptable
        );
        assert_eq!(
            attribution.per_operation[2][0].class,
            ErrorClass::NonExemptable
        );
    }

    #[test]
    fn multiple_errors_on_one_operation_keep_reported_order() {
        let errors = vec![
            error_at(1).set_message("first"),
            error_at(1).set_message("second"),
        ];
        let attribution = attribute(2, &errors);
        let messages = attribution.per_operation[1]
            .iter()
            .map(|e| e.error.message.as_str())
            .collect::<Vec<_>>();
        assert_eq!(messages, vec!["first", "second"]);
    }

    #[test]
    fn has_fatal_error() {
        let op = ReconciledOperation {
            index: 0,
            disposition: Disposition::Failed,
            errors: vec![
                AttributedError {
                    error: error_at(0).set_exemptable(true).set_exemption_key("K1"),
                    class: ErrorClass::Exemptable {
                        key: "K1".to_string(),
                    },
                },
                AttributedError {
                    error: error_at(0),
                    class: ErrorClass::NonExemptable,
                },
            ],
        };
        assert!(op.has_fatal_error());
    }

    #[test]
    fn reconcile_is_deterministic() {
        let batch = batch(3);
        let result = JobResult::default()
            .set_outcomes(vec![
                OperationOutcome::Success(serde_json::json!({"id": 0})),
                OperationOutcome::Failure,
                OperationOutcome::Failure,
            ])
            .set_errors(vec![error_at(1), error_at(2)]);
        assert_eq!(reconcile(&batch, &result), reconcile(&batch, &result));
    }
}
