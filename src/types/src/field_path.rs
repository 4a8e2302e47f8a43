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

//! Recovers the operation index encoded in an error's field path.
//!
//! The service attributes an error to an operation by encoding the
//! operation's batch index in the error's field path, following the fixed
//! pattern `operations[<index>].operand`. The parser lives here, isolated
//! from the reconciliation logic, so the pattern can change without touching
//! the retry algorithm.

/// Parses an operation index out of `field_path`.
///
/// Accepts paths of the form `operations[<index>].operand`, optionally
/// followed by further field segments, e.g.
/// `operations[2].operand.ad.headline`. Returns `None` for any other shape:
/// such errors cannot be attributed to an operation and must be surfaced
/// unconditionally.
///
/// # Example
/// ```
/// use mutate_jobs_types::field_path::operation_index;
/// assert_eq!(operation_index("operations[7].operand"), Some(7));
/// assert_eq!(operation_index("unrelated.path"), None);
/// ```
pub fn operation_index(field_path: &str) -> Option<usize> {
    let rest = field_path.strip_prefix("operations[")?;
    let close = rest.find(']')?;
    let digits = &rest[..close];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let index = digits.parse::<usize>().ok()?;
    let rest = rest[close + 1..].strip_prefix(".operand")?;
    if rest.is_empty() || rest.starts_with('.') {
        Some(index)
    } else {
        None
    }
}
