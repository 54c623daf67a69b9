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

use gitjob_crds::GitJob;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Condition;
use kube::api::{Patch, PatchParams};
use kube::{Api, Client, ResourceExt};
use serde_json::json;
use tracing::info;

use crate::error::{Error, Result};

/// Record `conditions` on the GitJob, each replacing the previous condition of
/// the same type, along with the generated Job name when there is one.
pub async fn patch_status(
    client: &Client,
    gitjob: &GitJob,
    conditions: Vec<Condition>,
    job_name: Option<&str>,
) -> Result<()> {
    let namespace = gitjob.namespace().ok_or_else(|| Error::MissingObjectKey(".metadata.namespace"))?;
    let api: Api<GitJob> = Api::namespaced(client.clone(), &namespace);

    let mut current = gitjob.status.clone().unwrap_or_default();
    for condition in &conditions {
        current.conditions = current.with_condition(condition.clone());
    }

    let mut status = json!({ "status": { "conditions": current.conditions } });
    if let Some(job_name) = job_name {
        status["status"]["jobName"] = json!(job_name);
    }

    let gitjob = api
        .patch_status(gitjob.name_any().as_str(), &PatchParams::default(), &Patch::Merge(&status))
        .await
        .map_err(Error::KubeError)?;

    for condition in conditions {
        info!("Patched status {:?} with reason {:?} for GitJob {}", condition.type_, condition.reason, gitjob.name_any());
    }

    Ok(())
}
