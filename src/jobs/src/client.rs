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

use std::future::Future;
use types::{Job, JobHandle, JobResult, MutateOutcome, Operation};

/// The remote service operations used by the orchestration loops.
///
/// Implementations wrap whatever transport the application uses to reach the
/// mutate job service. They must be safe for concurrent independent calls:
/// distinct orchestration runs share a client but nothing else.
///
/// # Errors
///
/// * `submit_job` fails with [Error::submission][types::Error::submission]
///   on a malformed batch, or [Error::transport][types::Error::transport] on
///   a communication fault.
/// * `get_job_status` fails with [Error::transport][types::Error::transport].
/// * `get_job_result` is valid only once the job status is terminal; it
///   fails with [Error::not_ready][types::Error::not_ready] when called
///   earlier, and [Error::transport][types::Error::transport] on a fault.
/// * `mutate` returns a [MutateOutcome]: per-operation rejections are a
///   structured [PartialFailure][types::MutateOutcome::PartialFailure], not
///   an `Err`.
pub trait MutateJobService: Send + Sync {
    /// Submits a batch of operations for asynchronous processing.
    fn submit_job(
        &self,
        operations: &[Operation],
    ) -> impl Future<Output = crate::Result<JobHandle>> + Send;

    /// Queries the current status of a submitted job.
    fn get_job_status(&self, handle: &JobHandle) -> impl Future<Output = crate::Result<Job>> + Send;

    /// Retrieves the result of a job that reached a terminal status.
    fn get_job_result(
        &self,
        handle: &JobHandle,
    ) -> impl Future<Output = crate::Result<JobResult>> + Send;

    /// Applies (or, with `validate_only`, dry-runs) a batch of operations
    /// synchronously.
    fn mutate(
        &self,
        operations: &[Operation],
        validate_only: bool,
    ) -> impl Future<Output = crate::Result<MutateOutcome>> + Send;
}
