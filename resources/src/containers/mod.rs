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

pub mod gitcloner;

use k8s_openapi::api::core::v1::{SecretVolumeSource, Volume, VolumeMount};

/// Where the repository is cloned to inside the init container.
pub const WORKSPACE_DIR: &str = "/workspace";
/// Where the clone is visible inside the main containers.
pub const SOURCE_DIR: &str = "/workspace/source";
pub const TMP_DIR: &str = "/tmp";

pub const CREDENTIALS_DIR: &str = "/gitjob/credentials";
pub const SSH_DIR: &str = "/gitjob/ssh";
pub const CA_BUNDLE_DIR: &str = "/gitjob/cabundle";
pub const CA_BUNDLE_FILE: &str = "additional-ca.crt";

pub const WORKSPACE_VOLUME_NAME: &str = "git-cloner";
pub const TMP_VOLUME_NAME: &str = "git-cloner-empty-dir";
pub const CREDENTIAL_VOLUME_NAME: &str = "git-credential";
pub const CA_BUNDLE_VOLUME_NAME: &str = "additional-ca";

/// The volumes every generated Job starts with, in this order.
pub fn base_volumes() -> Vec<Volume> {
    vec![empty_dir_volume(WORKSPACE_VOLUME_NAME), empty_dir_volume(TMP_VOLUME_NAME)]
}

/// The mounts every cloner starts with, in this order.
pub fn base_mounts() -> Vec<VolumeMount> {
    vec![mount(WORKSPACE_VOLUME_NAME, WORKSPACE_DIR), mount(TMP_VOLUME_NAME, TMP_DIR)]
}

/// volume mount of the cloned repository for the main containers
#[inline]
pub fn source_mount() -> VolumeMount {
    mount(WORKSPACE_VOLUME_NAME, SOURCE_DIR)
}

#[inline]
pub fn empty_dir_volume(name: &str) -> Volume {
    Volume {
        name: name.to_string(),
        empty_dir: Some(Default::default()),
        ..Default::default()
    }
}

#[inline]
pub fn secret_volume(name: &str, secret_name: &str) -> Volume {
    Volume {
        name: name.to_string(),
        secret: Some(SecretVolumeSource {
            secret_name: Some(secret_name.to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

#[inline]
pub fn mount(name: &str, mount_path: &str) -> VolumeMount {
    VolumeMount { name: name.to_string(), mount_path: mount_path.to_string(), ..Default::default() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_volumes() {
        let volumes = base_volumes();

        assert_eq!(volumes.len(), 2);
        assert_eq!(volumes[0].name, "git-cloner");
        assert_eq!(volumes[1].name, "git-cloner-empty-dir");
        assert!(volumes.iter().all(|volume| volume.empty_dir.is_some() && volume.secret.is_none()));
    }

    #[test]
    fn test_base_mounts() {
        let mounts = base_mounts();

        assert_eq!(mounts[0].mount_path, "/workspace");
        assert_eq!(mounts[1].mount_path, "/tmp");
    }

    #[test]
    fn test_secret_volume() {
        let volume = secret_volume("git-credential", "secretName");

        assert_eq!(volume.secret.unwrap().secret_name, Some("secretName".into()));
        assert!(volume.empty_dir.is_none());
    }
}
