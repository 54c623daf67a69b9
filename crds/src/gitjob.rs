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

use std::fmt::Display;

use convert_case::{Case, Casing};
use k8s_openapi::api::batch::v1::JobSpec;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{Condition, Time};
use k8s_openapi::chrono::Utc;
use k8s_openapi::ByteString;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(CustomResource, Default, Deserialize, Serialize, Clone, Debug, JsonSchema, Validate)]
#[kube(
    group = "gitjob.cattle.io",
    version = "v1",
    kind = "GitJob",
    namespaced,
    status = "GitJobStatus",
    shortname = "gj",
    printcolumn = r#"{"name":"Repo","type":"string","jsonPath":".spec.git.repo"}"#,
    printcolumn = r#"{"name":"Commit","type":"string","jsonPath":".status.gitEvent.commit"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct GitJobSpec {
    /// The git repository to clone and how to authenticate against it
    #[validate]
    pub git: GitInfo,
    /// Template of the Job that runs against the cloned repository. Its init
    /// containers and volumes are always replaced by the cloner's own.
    #[serde(default)]
    pub job_spec: JobSpec,
}

#[derive(Default, Deserialize, Serialize, Clone, Debug, JsonSchema, Validate, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GitInfo {
    /// The repository URL, passed verbatim to the cloner
    #[validate(length(min = 1))]
    pub repo: String,
    #[serde(default)]
    pub credential: GitCredential,
}

#[derive(Default, Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GitCredential {
    /// Name of a `kubernetes.io/basic-auth` or `kubernetes.io/ssh-auth` secret
    /// in the namespace of the GitJob
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret_name: Option<String>,
    /// PEM encoded CA bundle used to verify the git server. The bundle itself
    /// is expected in the `<name>-cabundle` secret.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<String>")]
    pub ca_bundle: Option<ByteString>,
    /// Skip TLS verification when talking to the git server
    #[serde(default, rename = "insecureSkipTLSVerify")]
    pub insecure_skip_tls_verify: bool,
}

impl GitCredential {
    /// The credential secret name, if one is requested.
    pub fn secret_name(&self) -> Option<&str> {
        self.client_secret_name.as_deref().filter(|name| !name.is_empty())
    }

    pub fn has_ca_bundle(&self) -> bool {
        self.ca_bundle.as_ref().map_or(false, |bundle| !bundle.0.is_empty())
    }
}

#[derive(Default, Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GitJobStatus {
    /// The latest event observed on the repository
    #[serde(default)]
    pub git_event: GitEvent,
    /// Name of the Job generated for the latest event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

#[derive(Default, Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GitEvent {
    #[serde(default)]
    pub commit: String,
    #[serde(default)]
    pub github_meta: GithubMeta,
}

#[derive(Default, Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GithubMeta {
    #[serde(default)]
    pub event: String,
}

impl GitJob {
    /// The commit of the latest event, empty if nothing was observed yet.
    pub fn commit(&self) -> &str {
        self.status.as_ref().map_or("", |status| status.git_event.commit.as_str())
    }

    /// The type of the latest event, empty if nothing was observed yet.
    pub fn event_type(&self) -> &str {
        self.status.as_ref().map_or("", |status| status.git_event.github_meta.event.as_str())
    }
}

impl GitJobStatus {
    /// Whether an equivalent condition is already recorded, ignoring its transition time.
    pub fn has_condition(&self, condition: &Condition) -> bool {
        self.conditions.iter().any(|c| {
            c.type_ == condition.type_
                && c.status == condition.status
                && c.reason == condition.reason
                && c.message == condition.message
        })
    }

    /// Returns the conditions with `condition` replacing any existing one of the same type.
    pub fn with_condition(&self, condition: Condition) -> Vec<Condition> {
        let mut conditions: Vec<Condition> =
            self.conditions.iter().filter(|c| c.type_ != condition.type_).cloned().collect();
        conditions.push(condition);
        conditions
    }
}

pub enum GitJobState {
    /// The Job definition could be generated from the spec
    Generated,
    /// The generated Job exists in the cluster
    Submitted,
}

impl GitJobState {
    pub fn generated(status: bool, reason: &str, message: Option<String>) -> Condition {
        GitJobState::create(GitJobState::Generated, status, reason, message)
    }

    pub fn submitted(status: bool, reason: &str, message: Option<String>) -> Condition {
        GitJobState::create(GitJobState::Submitted, status, reason, message)
    }

    #[inline]
    fn create(state: GitJobState, status: bool, reason: &str, message: Option<String>) -> Condition {
        Condition {
            type_: state.to_string(),
            status: status.to_string().to_case(Case::Pascal),
            last_transition_time: Time(Utc::now()),
            reason: reason.to_case(Case::Pascal),
            observed_generation: None,
            message: message.unwrap_or_default(),
        }
    }
}

impl Display for GitJobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GitJobState::Generated => f.write_str("Generated"),
            GitJobState::Submitted => f.write_str("Submitted"),
        }
    }
}
