// Copyright 2023 The GitJob Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use k8s_openapi::api::core::v1::{Capabilities, Container, SeccompProfile, SecurityContext, VolumeMount};

use super::{base_mounts, WORKSPACE_DIR};

const COMMAND: &str = "gitcloner";
pub const CONTAINER_NAME: &str = "gitcloner-initializer";

/// Build and return the container spec for the cloner.
///
/// The cloner is invoked as `gitcloner <repo> /workspace [flags...]`, the flags
/// come from [`crate::credential::contribute`].
pub fn container(repo: &str, image: &str, extra_args: Vec<String>, extra_mounts: Vec<VolumeMount>) -> Container {
    let mut arguments = vec![repo.to_string(), WORKSPACE_DIR.to_string()];
    arguments.extend(extra_args);

    let mut volume_mounts = base_mounts();
    volume_mounts.extend(extra_mounts);

    Container {
        name: CONTAINER_NAME.to_string(),
        image: Some(image.to_string()),
        command: Some(vec![COMMAND.into()]),
        args: Some(arguments),
        volume_mounts: Some(volume_mounts),
        security_context: Some(security_context()),
        ..Default::default()
    }
}

/// The restricted security context of the cloner, never derived from user input.
pub fn security_context() -> SecurityContext {
    SecurityContext {
        allow_privilege_escalation: Some(false),
        read_only_root_filesystem: Some(true),
        privileged: Some(false),
        capabilities: Some(Capabilities { drop: Some(vec!["ALL".into()]), ..Default::default() }),
        run_as_non_root: Some(true),
        seccomp_profile: Some(SeccompProfile { type_: "RuntimeDefault".into(), ..Default::default() }),
        ..Default::default()
    }
}
