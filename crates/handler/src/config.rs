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

use std::time::Duration;

use bon::Builder;
use smart_default::SmartDefault;

/// Settings recognized by a `Handler`, supplied by the plugin's initializer
/// object (`GetHandlerSettings`).
#[derive(Debug, Clone, SmartDefault, Builder)]
#[builder(finish_fn = build)]
pub struct HandlerSettings {
    /// Identifies the concrete handler type; required.
    #[builder(into)]
    pub handler_name: String,

    /// Cosmetic identifier used to build the handler's full name.
    #[builder(into)]
    pub job_name: String,

    /// Cron expression gating autonomous starts. Empty disables the
    /// scheduler entirely.
    #[default(None)]
    #[builder(default = None, into)]
    pub schedule: Option<String>,

    /// How long a leased job may stay pending before the control loop
    /// requeues it. Zero or negative (represented here as `None`) disables
    /// the timeout sweep.
    #[default(None)]
    #[builder(default = None)]
    pub job_timeout: Option<Duration>,

    /// If true, `Handler::initialize` performs a `Start` before returning.
    #[default(false)]
    #[builder(default = false)]
    pub auto_start: bool,
}

impl HandlerSettings {
    /// `Package/Handler/Job`, the handler's human-readable full name.
    #[must_use]
    pub fn full_name(&self, package_name: &str) -> String {
        format!("{package_name}/{}/{}", self.handler_name, self.job_name)
    }
}
