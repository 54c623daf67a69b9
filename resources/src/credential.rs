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

use k8s_openapi::api::core::v1::{Volume, VolumeMount};

use crate::containers::{
    mount, secret_volume, CA_BUNDLE_DIR, CA_BUNDLE_FILE, CA_BUNDLE_VOLUME_NAME, CREDENTIALS_DIR,
    CREDENTIAL_VOLUME_NAME, SSH_DIR,
};
use crate::flags;
use crate::secret::{Credential, BASIC_AUTH_PASSWORD_KEY, SSH_AUTH_PRIVATE_KEY};

/// Extra arguments, volumes and mounts the cloner needs beyond its base setup.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Contribution {
    pub args: Vec<String>,
    pub volumes: Vec<Volume>,
    pub mounts: Vec<VolumeMount>,
}

/// Collect the contributions of the credential, the CA bundle and the TLS flag,
/// always in that order.
pub fn contribute(credential: &Credential, name: &str, ca_bundle: bool, skip_tls: bool) -> Contribution {
    let mut contribution = Contribution::default();

    contribution.credential(credential);
    if ca_bundle {
        contribution.ca_bundle(name);
    }
    if skip_tls {
        contribution.skip_tls();
    }

    contribution
}

impl Contribution {
    fn credential(&mut self, credential: &Credential) {
        match credential {
            Credential::None => {}
            Credential::BasicAuth { secret_name, username } => {
                let password_file = format!("{}/{}", CREDENTIALS_DIR, BASIC_AUTH_PASSWORD_KEY);
                self.add(
                    secret_volume(CREDENTIAL_VOLUME_NAME, secret_name),
                    mount(CREDENTIAL_VOLUME_NAME, CREDENTIALS_DIR),
                    flags(&[("username", username.as_str()), ("password-file", password_file.as_str())]),
                );
            }
            Credential::SshAuth { secret_name } => {
                let private_key_file = format!("{}/{}", SSH_DIR, SSH_AUTH_PRIVATE_KEY);
                self.add(
                    secret_volume(CREDENTIAL_VOLUME_NAME, secret_name),
                    mount(CREDENTIAL_VOLUME_NAME, SSH_DIR),
                    flags(&[("ssh-private-key-file", private_key_file.as_str())]),
                );
            }
        }
    }

    /// The bundle is read from the `<name>-cabundle` secret.
    fn ca_bundle(&mut self, name: &str) {
        let ca_bundle_file = format!("{}/{}", CA_BUNDLE_DIR, CA_BUNDLE_FILE);
        self.add(
            secret_volume(CA_BUNDLE_VOLUME_NAME, &format!("{}-cabundle", name)),
            mount(CA_BUNDLE_VOLUME_NAME, CA_BUNDLE_DIR),
            flags(&[("ca-bundle-file", ca_bundle_file.as_str())]),
        );
    }

    fn skip_tls(&mut self) {
        self.args.push("--insecure-skip-tls".into());
    }

    #[inline]
    fn add(&mut self, volume: Volume, mount: VolumeMount, args: Vec<String>) {
        self.volumes.push(volume);
        self.mounts.push(mount);
        self.args.extend(args);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic_auth() -> Credential {
        Credential::BasicAuth { secret_name: "secretName".into(), username: "user".into() }
    }

    fn ssh_auth() -> Credential {
        Credential::SshAuth { secret_name: "secretName".into() }
    }

    #[test]
    fn test_contribute_nothing() {
        assert_eq!(contribute(&Credential::None, "test", false, false), Contribution::default());
    }

    #[test]
    fn test_contribute_basic_auth() {
        let contribution = contribute(&basic_auth(), "test", false, false);

        assert_eq!(contribution.args, vec!["--username", "user", "--password-file", "/gitjob/credentials/password"]);
        assert_eq!(contribution.volumes, vec![secret_volume("git-credential", "secretName")]);
        assert_eq!(contribution.mounts, vec![mount("git-credential", "/gitjob/credentials")]);
    }

    #[test]
    fn test_contribute_ssh_auth() {
        let contribution = contribute(&ssh_auth(), "test", false, false);

        assert_eq!(contribution.args, vec!["--ssh-private-key-file", "/gitjob/ssh/ssh-privatekey"]);
        assert!(!contribution.args.contains(&"--username".to_string()));
        assert_eq!(contribution.volumes, vec![secret_volume("git-credential", "secretName")]);
        assert_eq!(contribution.mounts, vec![mount("git-credential", "/gitjob/ssh")]);
    }

    #[test]
    fn test_contribute_ca_bundle() {
        let contribution = contribute(&Credential::None, "test", true, false);

        assert_eq!(contribution.args, vec!["--ca-bundle-file", "/gitjob/cabundle/additional-ca.crt"]);
        assert_eq!(contribution.volumes, vec![secret_volume("additional-ca", "test-cabundle")]);
        assert_eq!(contribution.mounts, vec![mount("additional-ca", "/gitjob/cabundle")]);
    }

    #[test]
    fn test_contribute_skip_tls() {
        let contribution = contribute(&Credential::None, "test", false, true);

        assert_eq!(contribution.args, vec!["--insecure-skip-tls"]);
        assert!(contribution.volumes.is_empty());
        assert!(contribution.mounts.is_empty());
    }

    #[test]
    fn test_contribute_all() {
        let contribution = contribute(&ssh_auth(), "test", true, true);

        assert_eq!(
            contribution.args,
            vec![
                "--ssh-private-key-file",
                "/gitjob/ssh/ssh-privatekey",
                "--ca-bundle-file",
                "/gitjob/cabundle/additional-ca.crt",
                "--insecure-skip-tls",
            ]
        );
        assert_eq!(
            contribution.volumes,
            vec![secret_volume("git-credential", "secretName"), secret_volume("additional-ca", "test-cabundle")]
        );
        assert_eq!(
            contribution.mounts,
            vec![mount("git-credential", "/gitjob/ssh"), mount("additional-ca", "/gitjob/cabundle")]
        );
    }
}
