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

use std::ffi::OsString;

use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{Container, EnvVar};
use tracing::warn;

pub const HTTP_PROXY: &str = "HTTP_PROXY";
pub const HTTPS_PROXY: &str = "HTTPS_PROXY";

/// A snapshot of the proxy settings of the host process.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProxyEnv {
    pub http_proxy: Option<String>,
    pub https_proxy: Option<String>,
}

impl ProxyEnv {
    /// Read `HTTP_PROXY` and `HTTPS_PROXY` from the process environment, once.
    pub fn from_env() -> Self {
        Self {
            http_proxy: proxy_var(HTTP_PROXY, std::env::var_os(HTTP_PROXY)),
            https_proxy: proxy_var(HTTPS_PROXY, std::env::var_os(HTTPS_PROXY)),
        }
    }

    pub fn is_set(&self) -> bool {
        [&self.http_proxy, &self.https_proxy]
            .iter()
            .any(|value| value.as_deref().map_or(false, |value| !value.is_empty()))
    }

    /// Both variables when at least one of them is set, nothing otherwise.
    fn vars(&self) -> Vec<EnvVar> {
        if !self.is_set() {
            return vec![];
        }

        vec![
            env_var(HTTP_PROXY, self.http_proxy.clone().unwrap_or_default()),
            env_var(HTTPS_PROXY, self.https_proxy.clone().unwrap_or_default()),
        ]
    }
}

/// A value that is not valid UTF-8 still counts as set and is passed on lossily,
/// so a broken proxy setting fails the clone instead of being bypassed.
fn proxy_var(name: &str, value: Option<OsString>) -> Option<String> {
    value.map(|value| {
        value.into_string().unwrap_or_else(|value| {
            warn!("{} is not valid UTF-8, passing it on lossily", name);
            value.to_string_lossy().into_owned()
        })
    })
}

/// Append `COMMIT` and `EVENT_TYPE` to every main container, then the proxy
/// variables to every main and init container. Existing entries keep their
/// place, injected ones always come last.
pub fn inject(mut job: Job, commit: &str, event_type: &str, proxy: &ProxyEnv) -> Job {
    let proxy_vars = proxy.vars();

    if let Some(pod) = job.spec.as_mut().and_then(|spec| spec.template.spec.as_mut()) {
        for container in pod.containers.iter_mut() {
            append(container, vec![env_var("COMMIT", commit), env_var("EVENT_TYPE", event_type)]);
            append(container, proxy_vars.clone());
        }

        for container in pod.init_containers.iter_mut().flatten() {
            append(container, proxy_vars.clone());
        }
    }

    job
}

#[inline]
fn append(container: &mut Container, vars: Vec<EnvVar>) {
    if !vars.is_empty() {
        container.env.get_or_insert_with(Vec::new).extend(vars);
    }
}

#[inline]
fn env_var(name: &str, value: impl Into<String>) -> EnvVar {
    EnvVar { name: name.to_string(), value: Some(value.into()), value_from: None }
}
