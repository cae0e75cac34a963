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

use std::any::Any;

use dispatchd_error::{ErrorExt, Severity, StackError};
use snafu::Snafu;

/// Failure modes that can surface from `Handler::initialize`.
///
/// Everything else this crate reports operationally (cron parse failures,
/// late results, client-id mismatches, timeouts, control-loop faults) is a
/// logged `tracing` event, not a returned error — see the error handling
/// table in the specification this crate implements. A cron parse failure
/// in particular disables the scheduler and is logged where it happens
/// (`lifecycle::Handler::initialize`); it never fails construction, so
/// there is no variant for it here.
#[derive(Snafu, Debug)]
#[snafu(visibility(pub))]
pub enum HandlerError {
    #[snafu(display("handler settings are invalid: {reason}"))]
    InvalidSettings {
        reason: String,
        #[snafu(implicit)]
        loc: snafu::Location,
    },
}

pub type Result<T, E = HandlerError> = std::result::Result<T, E>;

impl StackError for HandlerError {
    fn debug_fmt(&self, _layer: usize, buf: &mut Vec<String>) { buf.push(format!("{self}")); }

    fn next(&self) -> Option<&dyn StackError> { None }
}

impl ErrorExt for HandlerError {
    fn severity(&self) -> Severity { Severity::Recoverable }

    fn as_any(&self) -> &dyn Any { self }
}
