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

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Secret Not Found: {namespace}/{name}")]
    SecretNotFound { namespace: String, name: String },

    #[error("Unsupported Secret Type: secret {name} has type {actual:?}, expected {expected}")]
    UnsupportedSecretType { name: String, actual: String, expected: &'static str },

    #[error("Malformed Secret Data: secret {name} has no usable {key:?} key")]
    MalformedSecretData { name: String, key: &'static str },

    #[error("MissingObjectKey: {0}")]
    MissingObjectKey(&'static str),

    #[error("Kube Error: {0}")]
    KubeError(#[source] kube::Error),
}

impl Error {
    /// Errors caused by the GitJob or its secrets, retrying will not help until they change.
    pub fn is_configuration(&self) -> bool {
        !matches!(self, Error::KubeError(_))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
