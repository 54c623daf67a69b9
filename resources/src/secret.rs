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

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Secret;
use kube::runtime::reflector::{ObjectRef, Store};

use crate::error::{Error, Result};

pub const BASIC_AUTH_SECRET_TYPE: &str = "kubernetes.io/basic-auth";
pub const SSH_AUTH_SECRET_TYPE: &str = "kubernetes.io/ssh-auth";

pub const BASIC_AUTH_USERNAME_KEY: &str = "username";
pub const BASIC_AUTH_PASSWORD_KEY: &str = "password";
pub const SSH_AUTH_PRIVATE_KEY: &str = "ssh-privatekey";

/// Read access to secrets, usually backed by a watch-driven cache.
pub trait SecretCache {
    fn get(&self, namespace: &str, name: &str) -> Option<Secret>;
}

impl SecretCache for Store<Secret> {
    fn get(&self, namespace: &str, name: &str) -> Option<Secret> {
        let key = ObjectRef::new(name).within(namespace);
        Store::get(self, &key).map(|secret| secret.as_ref().clone())
    }
}

/// Secrets keyed by `(namespace, name)`.
impl SecretCache for BTreeMap<(String, String), Secret> {
    fn get(&self, namespace: &str, name: &str) -> Option<Secret> {
        BTreeMap::get(self, &(namespace.to_string(), name.to_string())).cloned()
    }
}

/// The credential the cloner authenticates with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Credential {
    None,
    BasicAuth { secret_name: String, username: String },
    SshAuth { secret_name: String },
}

impl Credential {
    pub fn kind(&self) -> &'static str {
        match self {
            Credential::None => "none",
            Credential::BasicAuth { .. } => "basic-auth",
            Credential::SshAuth { .. } => "ssh-auth",
        }
    }
}

/// Resolve the credential secret `name` in `namespace`.
///
/// The variant is chosen by the declared type of the secret only; the keys it
/// carries are checked afterwards, never used to guess the type.
pub fn resolve<C>(cache: &C, namespace: &str, name: Option<&str>) -> Result<Credential>
where
    C: SecretCache + ?Sized,
{
    let name = match name {
        Some(name) if !name.is_empty() => name,
        _ => return Ok(Credential::None),
    };

    let secret = cache.get(namespace, name).ok_or_else(|| Error::SecretNotFound {
        namespace: namespace.to_string(),
        name: name.to_string(),
    })?;

    match secret.type_.as_deref() {
        Some(BASIC_AUTH_SECRET_TYPE) => {
            let username = data(&secret, name, BASIC_AUTH_USERNAME_KEY)?;
            let username = String::from_utf8(username.to_vec()).map_err(|_| Error::MalformedSecretData {
                name: name.to_string(),
                key: BASIC_AUTH_USERNAME_KEY,
            })?;
            data(&secret, name, BASIC_AUTH_PASSWORD_KEY)?;

            Ok(Credential::BasicAuth { secret_name: name.to_string(), username })
        }
        Some(SSH_AUTH_SECRET_TYPE) => {
            data(&secret, name, SSH_AUTH_PRIVATE_KEY)?;
            Ok(Credential::SshAuth { secret_name: name.to_string() })
        }
        other => Err(Error::UnsupportedSecretType {
            name: name.to_string(),
            actual: other.unwrap_or_default().to_string(),
            expected: "kubernetes.io/basic-auth or kubernetes.io/ssh-auth",
        }),
    }
}

fn data<'a>(secret: &'a Secret, name: &str, key: &'static str) -> Result<&'a [u8]> {
    secret
        .data
        .as_ref()
        .and_then(|data| data.get(key))
        .map(|value| value.0.as_slice())
        .ok_or_else(|| Error::MalformedSecretData { name: name.to_string(), key })
}

#[cfg(test)]
pub(crate) mod tests {
    use k8s_openapi::ByteString;
    use kube::core::ObjectMeta;

    use super::*;

    pub fn secrets(type_: &str, data: &[(&str, &str)]) -> BTreeMap<(String, String), Secret> {
        let secret = Secret {
            metadata: ObjectMeta {
                name: Some("secretName".into()),
                namespace: Some("default".into()),
                ..Default::default()
            },
            type_: Some(type_.into()),
            data: Some(
                data.iter()
                    .map(|(key, value)| (key.to_string(), ByteString(value.as_bytes().to_vec())))
                    .collect(),
            ),
            ..Default::default()
        };

        BTreeMap::from([(("default".to_string(), "secretName".to_string()), secret)])
    }

    pub fn basic_auth_secrets() -> BTreeMap<(String, String), Secret> {
        secrets(BASIC_AUTH_SECRET_TYPE, &[(BASIC_AUTH_USERNAME_KEY, "user"), (BASIC_AUTH_PASSWORD_KEY, "pass")])
    }

    pub fn ssh_auth_secrets() -> BTreeMap<(String, String), Secret> {
        secrets(SSH_AUTH_SECRET_TYPE, &[(SSH_AUTH_PRIVATE_KEY, "ssh key")])
    }

    #[test]
    fn test_resolve_without_name() {
        let cache = BTreeMap::new();

        assert_eq!(resolve(&cache, "default", None).unwrap(), Credential::None);
        assert_eq!(resolve(&cache, "default", Some("")).unwrap(), Credential::None);
    }

    #[test]
    fn test_resolve_basic_auth() {
        let credential = resolve(&basic_auth_secrets(), "default", Some("secretName")).unwrap();

        assert_eq!(
            credential,
            Credential::BasicAuth { secret_name: "secretName".into(), username: "user".into() }
        );
        assert_eq!(credential.kind(), "basic-auth");
    }

    #[test]
    fn test_resolve_ssh_auth() {
        let credential = resolve(&ssh_auth_secrets(), "default", Some("secretName")).unwrap();

        assert_eq!(credential, Credential::SshAuth { secret_name: "secretName".into() });
    }

    #[test]
    fn test_resolve_by_declared_type_only() {
        // Carries basic-auth keys but is declared as ssh-auth.
        let cache = secrets(
            SSH_AUTH_SECRET_TYPE,
            &[(BASIC_AUTH_USERNAME_KEY, "user"), (BASIC_AUTH_PASSWORD_KEY, "pass"), (SSH_AUTH_PRIVATE_KEY, "key")],
        );

        let credential = resolve(&cache, "default", Some("secretName")).unwrap();
        assert_eq!(credential, Credential::SshAuth { secret_name: "secretName".into() });
    }

    #[test]
    fn test_resolve_not_found() {
        let err = resolve(&basic_auth_secrets(), "other", Some("secretName")).unwrap_err();

        assert!(matches!(err, Error::SecretNotFound { ref namespace, ref name } if namespace == "other" && name == "secretName"));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_resolve_unsupported_type() {
        let cache = secrets("Opaque", &[(BASIC_AUTH_USERNAME_KEY, "user"), (BASIC_AUTH_PASSWORD_KEY, "pass")]);

        let err = resolve(&cache, "default", Some("secretName")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedSecretType { ref actual, .. } if actual == "Opaque"));
        assert!(err.to_string().contains("secretName"));
    }

    #[test]
    fn test_resolve_missing_key() {
        let cache = secrets(BASIC_AUTH_SECRET_TYPE, &[(BASIC_AUTH_USERNAME_KEY, "user")]);
        let err = resolve(&cache, "default", Some("secretName")).unwrap_err();
        assert!(matches!(err, Error::MalformedSecretData { key: BASIC_AUTH_PASSWORD_KEY, .. }));

        let cache = secrets(SSH_AUTH_SECRET_TYPE, &[]);
        let err = resolve(&cache, "default", Some("secretName")).unwrap_err();
        assert!(matches!(err, Error::MalformedSecretData { key: SSH_AUTH_PRIVATE_KEY, .. }));

        let mut cache = basic_auth_secrets();
        for secret in cache.values_mut() {
            let data = secret.data.get_or_insert_with(Default::default);
            data.insert(BASIC_AUTH_USERNAME_KEY.into(), ByteString(vec![0xff, 0xfe, 0xfd]));
        }
        let err = resolve(&cache, "default", Some("secretName")).unwrap_err();
        assert!(matches!(err, Error::MalformedSecretData { key: BASIC_AUTH_USERNAME_KEY, .. }));
        assert!(err.is_configuration());
    }
}
