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

//! Types and functions to orchestrate bulk mutate jobs with less boilerplate.
//!
//! Bulk mutation endpoints accept a batch of operations and process it
//! asynchronously: the application submits a job, polls its status until it
//! reaches a terminal state, and then retrieves one outcome per submitted
//! operation. When the service rejects some of the operations, the errors it
//! reports are attributed back to operations by batch index, and some of them
//! can be bypassed by resubmitting the operation with a server-granted
//! exemption.
//!
//! This crate implements that lifecycle over any implementation of
//! [MutateJobService]:
//!
//! * [poller] drives the status polling loop with a bounded attempt budget,
//!   a fixed delay between polls, and cooperative cancellation.
//! * [reconcile] maps a job's heterogeneous result set back to the
//!   originating operations, classifying each reported error.
//! * [exemption] validates a batch, accumulates exemptions for recoverable
//!   policy violations, drops unrecoverable operations, and applies the
//!   surviving batch.
//!
//! Every submitted operation ends in exactly one caller-visible disposition:
//! accepted, or dropped with a reason. Conditions with no safe per-operation
//! recovery (transport faults, errors that resolve to no operation, expired
//! loop budgets) abort the run as a whole with an [Error].

pub use types::{Error, Result};

mod client;
pub use client::MutateJobService;

pub mod exemption;
pub mod poller;
pub mod reconcile;
