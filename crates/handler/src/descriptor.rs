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

use std::path::PathBuf;

use bon::Builder;

/// The job script descriptor a Host hands to a `Handler` at construction.
///
/// The Package Loader (plugin discovery, compilation, sandboxing) is out of
/// scope for this crate (see the specification's §1); by the time a
/// `HandlerDescriptor` reaches `Handler::initialize`, `base_folder` already
/// holds the compiled artifact and `job_script` is only carried through for
/// reporting, never parsed or executed here.
#[derive(Debug, Clone, Builder)]
pub struct HandlerDescriptor {
    /// Name of the package the handler belongs to; the first segment of the
    /// handler's `"Package/Handler/Job"` full name.
    #[builder(into)]
    pub package_name: String,

    /// The raw job script text, opaque to this crate.
    #[builder(into, default)]
    pub job_script: String,

    /// Compiler library references declared by the package, carried through
    /// to `HandlerJobInfo` for a deploying worker client.
    #[builder(default)]
    pub compiler_references: Vec<String>,

    /// Worker-side dependencies declared by the package.
    #[builder(default)]
    pub worker_dependencies: Vec<String>,

    /// Base folder under which the package's compiled artifacts live.
    /// Read-only from the handler's perspective after construction.
    #[builder(into)]
    pub base_folder: PathBuf,
}

impl HandlerDescriptor {
    /// Name of the compiled assembly file a worker client would download,
    /// derived from `package_name`. The actual compilation is the Package
    /// Loader's concern; this crate only needs the name for `GetJobInfo`.
    #[must_use]
    pub fn assembly_file_name(&self) -> String { format!("{}.dll", self.package_name) }

    #[must_use]
    pub fn assembly_path(&self) -> PathBuf { self.base_folder.join(self.assembly_file_name()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assembly_path_joins_base_folder() {
        let descriptor = HandlerDescriptor::builder()
            .package_name("demo")
            .base_folder("/srv/packages/demo")
            .build();
        assert_eq!(descriptor.assembly_path(), PathBuf::from("/srv/packages/demo/demo.dll"));
    }
}
