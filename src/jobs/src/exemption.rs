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

//! Resolves policy violations in a batch by exemption and resubmission.
//!
//! The loop dry-runs the batch with validate-only mutate calls. Violations
//! that the service marks exemptable are answered by attaching the granted
//! exemption key to the originating operation and re-validating; operations
//! with any other violation are dropped and reported with the violation's
//! message. Once a validation round comes back clean, one effecting call
//! applies the surviving batch.
//!
//! Within one run an operation only ever gains exemption tokens or is
//! dropped, never re-added, so the loop settles within `batch.len()` rounds
//! in the worst case. `max_rounds` bounds it independently: the service is
//! not obligated to converge, and a batch that keeps accruing fresh
//! exemptable violations would otherwise loop forever.

use crate::client::MutateJobService;
use crate::reconcile::{ErrorClass, attribute};
use types::{ApiError, Error, MutateOutcome, Operation, OperationOutcome};

/// An operation applied by the final effecting call.
#[derive(Clone, Debug, PartialEq)]
pub struct AcceptedOperation {
    /// The operation as submitted, including any exemption requests it
    /// accrued.
    pub operation: Operation,
    /// The resulting entity, when the service reported one.
    pub outcome: Option<serde_json::Value>,
}

/// An operation removed from the batch, with the reason it was removed.
#[derive(Clone, Debug, PartialEq)]
pub struct DroppedOperation {
    /// The operation as last validated.
    pub operation: Operation,
    /// A human-readable reason built from the violation that removed it.
    pub reason: String,
}

/// The complete accounting of one resolution run.
///
/// Every operation of the input batch appears in exactly one of the two
/// lists.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Resolution {
    /// The operations applied by the effecting call, in batch order.
    pub accepted: Vec<AcceptedOperation>,
    /// The operations dropped during validation, in the order they were
    /// dropped.
    pub dropped: Vec<DroppedOperation>,
}

/// Indicates that the validation round budget expired.
#[derive(thiserror::Error, Debug)]
#[error(
    "exemption loop exhausted, {remaining} operations still failing after {rounds} validation rounds"
)]
pub struct RoundsExhausted {
    /// The number of validation rounds performed.
    pub rounds: u32,
    /// The number of operations still in the batch.
    pub remaining: usize,
}

/// Validates `batch`, resolving exemptable violations, then applies it.
///
/// Runs up to `max_rounds` validate-only `mutate` calls. After each round
/// the reported errors are attributed back to operations:
///
/// * an error that resolves to no operation aborts the run with
///   [Error::unattributed], carrying the raw error. No partial recovery is
///   safe at that point.
/// * an operation with any non-exemptable error is dropped and reported. A
///   non-exemptable error wins over exemptable ones on the same operation.
/// * an operation with only exemptable errors gains one exemption request
///   per granted key. Requests accumulate across rounds; each round
///   re-validates a new batch value, the inputs are never mutated in place.
///
/// A clean round ends validation; one effecting call
/// (`validate_only = false`) then applies the surviving batch and its
/// outcomes populate [Resolution::accepted]. An empty surviving batch skips
/// the effecting call. If the budget expires first the run fails with
/// [Error::exhausted] (source: [RoundsExhausted]), since the surviving
/// operations could no longer be given a definite disposition.
///
/// An already-clean batch therefore costs exactly two remote calls: one
/// validation round and one effecting call.
pub async fn resolve<C>(
    batch: Vec<Operation>,
    client: &C,
    max_rounds: u32,
) -> crate::Result<Resolution>
where
    C: MutateJobService,
{
    let mut pending = batch;
    let mut dropped = Vec::new();
    if pending.is_empty() {
        return Ok(Resolution::default());
    }

    let mut clean = false;
    let mut rounds = 0;
    while rounds < max_rounds {
        rounds += 1;
        let errors = match client.mutate(&pending, true).await? {
            MutateOutcome::Success(_) => {
                clean = true;
                break;
            }
            MutateOutcome::PartialFailure(errors) => errors,
        };
        if errors.is_empty() {
            clean = true;
            break;
        }
        tracing::debug!(
            round = rounds,
            batch_size = pending.len(),
            errors = errors.len(),
            "validation round reported errors"
        );

        let attribution = attribute(pending.len(), &errors);
        if let Some(error) = attribution.unattributed.first() {
            return Err(Error::unattributed(error.clone()));
        }
        let mut next = Vec::with_capacity(pending.len());
        for (operation, errors) in pending.into_iter().zip(attribution.per_operation) {
            if let Some(fatal) = errors.iter().find(|e| e.class == ErrorClass::NonExemptable) {
                let reason = drop_reason(&fatal.error);
                tracing::warn!(%reason, "dropping operation");
                dropped.push(DroppedOperation { operation, reason });
                continue;
            }
            let operation = errors.into_iter().fold(operation, |op, e| match e.class {
                ErrorClass::Exemptable { key } => op.with_exemption(key),
                ErrorClass::NonExemptable => op,
            });
            next.push(operation);
        }
        pending = next;
        if pending.is_empty() {
            return Ok(Resolution {
                accepted: Vec::new(),
                dropped,
            });
        }
    }
    if !clean {
        return Err(Error::exhausted(RoundsExhausted {
            rounds,
            remaining: pending.len(),
        }));
    }

    let outcomes = match client.mutate(&pending, false).await? {
        MutateOutcome::Success(outcomes) => outcomes,
        MutateOutcome::PartialFailure(errors) => {
            // The batch validated clean; a rejection here has no
            // per-operation recovery.
            let detail = errors
                .first()
                .map(|e| drop_reason(e))
                .unwrap_or_else(|| "the effecting call was rejected".to_string());
            return Err(Error::submission(detail));
        }
    };
    let accepted = pending
        .into_iter()
        .enumerate()
        .map(|(index, operation)| AcceptedOperation {
            operation,
            outcome: match outcomes.get(index) {
                Some(OperationOutcome::Success(value)) => Some(value.clone()),
                _ => None,
            },
        })
        .collect();
    Ok(Resolution { accepted, dropped })
}

fn drop_reason(error: &ApiError) -> String {
    if error.trigger.is_empty() {
        error.message.clone()
    } else {
        format!("{} (trigger: '{}')", error.message, error.trigger)
    }
}
