// Copyright 2025 dispatchd contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Shared error-chaining primitives used across the `dispatchd` crates.
//!
//! Every crate defines its own `snafu` error enum, but they all compose
//! through [`StackError`] and [`ErrorExt`] so a caller several layers removed
//! from the failure can still render a readable message and recover the root
//! cause.

use std::{any::Any, error::Error as StdError, sync::Arc};

/// Coarse classification of how severely an error should be treated by a
/// caller that cannot inspect the concrete error type.
///
/// The Control Loop uses this to decide whether a fault should only be
/// logged (the adapter will get another chance on the next iteration) or
/// whether it should force the handler back to `Stopped`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    /// Worth logging, but the caller should keep making progress.
    Recoverable,
    /// The caller cannot safely continue and should unwind to a known state.
    Fatal,
}

/// A node in a chain of errors that crosses crate boundaries.
///
/// Implemented by every `snafu`-derived error enum in this workspace so that
/// `ErrorExt::output_msg` and `ErrorExt::root_cause` can walk the full chain
/// without downcasting.
pub trait StackError: StdError {
    fn debug_fmt(&self, layer: usize, buf: &mut Vec<String>);

    fn next(&self) -> Option<&dyn StackError>;

    fn last(&self) -> &dyn StackError
    where
        Self: Sized,
    {
        let Some(mut result) = self.next() else {
            return self;
        };
        while let Some(err) = result.next() {
            result = err;
        }
        result
    }

    /// Whether this layer should be elided when rendering to a user-facing
    /// message (its `source` says everything worth saying).
    fn transparent(&self) -> bool { false }
}

pub trait ErrorExt: StackError {
    fn severity(&self) -> Severity { Severity::Recoverable }

    fn as_any(&self) -> &dyn Any;

    fn output_msg(&self) -> String
    where
        Self: Sized,
    {
        let error = self.last();
        if let Some(external_error) = error.source() {
            let mut root = external_error;
            while let Some(source) = root.source() {
                root = source;
            }
            if error.transparent() {
                format!("{root}")
            } else {
                format!("{error}: {root}")
            }
        } else {
            format!("{error}")
        }
    }

    fn root_cause(&self) -> Option<&dyn StdError>
    where
        Self: Sized,
    {
        let error = self.last();
        let mut source = error.source()?;
        while let Some(next) = source.source() {
            source = next;
        }
        Some(source)
    }
}

impl<T: ?Sized + StackError> StackError for Arc<T> {
    fn debug_fmt(&self, layer: usize, buf: &mut Vec<String>) { self.as_ref().debug_fmt(layer, buf) }

    fn next(&self) -> Option<&dyn StackError> { self.as_ref().next() }
}

impl<T: StackError> StackError for Box<T> {
    fn debug_fmt(&self, layer: usize, buf: &mut Vec<String>) { self.as_ref().debug_fmt(layer, buf) }

    fn next(&self) -> Option<&dyn StackError> { self.as_ref().next() }
}
