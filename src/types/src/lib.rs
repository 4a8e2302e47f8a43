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

//! Wire-level types shared by the bulk mutate job helpers.
//!
//! This crate defines the data model exchanged with the mutate job service:
//! the operations submitted in a batch, the job status and result types
//! returned while polling, and the per-operation errors attached to partial
//! failures. It also defines the core [Error] type used by the orchestration
//! crate, and the parser that recovers an operation index from an error's
//! field path.
//!
//! Nothing in this crate performs I/O.

/// An alias of [std::result::Result] where the error is always [Error].
pub type Result<T> = std::result::Result<T, crate::error::Error>;

pub mod error;
pub mod field_path;

mod model;
pub use model::*;

pub use error::Error;
