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

use gitjob_crds::GitJob;
use k8s_openapi::api::batch::v1::Job;
use kube::api::PostParams;
use kube::core::ObjectMeta;
use kube::{Api, Client, Resource, ResourceExt};
use sha2::{Digest, Sha256};

use crate::containers::{base_volumes, gitcloner, source_mount};
use crate::credential::Contribution;
use crate::error::{Error, Result};

const COMMIT_ANNOTATION_KEY: &str = "gitjob.cattle.io/commit";
const MAX_NAME_LENGTH: usize = 63;
const SUFFIX_LENGTH: usize = 5;

pub async fn exists(client: &Client, namespace: &str, name: &str) -> Result<bool> {
    let api: Api<Job> = Api::namespaced(client.clone(), namespace);
    Ok(api.get_opt(name).await.map_err(Error::KubeError)?.is_some())
}

pub async fn create(client: &Client, namespace: &str, resource: Job) -> Result<Job> {
    let api: Api<Job> = Api::namespaced(client.clone(), namespace);
    tracing::debug!("The Job resource:\n {:?}\n", resource);

    let job = api.create(&PostParams::default(), &resource).await.map_err(Error::KubeError)?;

    tracing::info!("Created Job: {}", job.name_any());
    Ok(job)
}

/// Create a Job that clones the repository before running the user's template.
///
/// The template's init containers and volumes are replaced, everything else in
/// `spec.jobSpec` is kept as written.
pub fn new(gitjob: &GitJob, image: &str, contribution: Contribution) -> Job {
    let labels = BTreeMap::from([
        ("app.kubernetes.io/name".to_string(), gitjob.name_any()),
        ("app.kubernetes.io/managed-by".to_string(), "gitjob".to_string()),
    ]);
    let annotations = BTreeMap::from([(COMMIT_ANNOTATION_KEY.to_string(), gitjob.commit().to_string())]);

    let mut spec = gitjob.spec.job_spec.clone();
    let template = &mut spec.template;
    template
        .metadata
        .get_or_insert_with(ObjectMeta::default)
        .labels
        .get_or_insert_with(BTreeMap::new)
        .extend(labels.clone());

    let Contribution { args, volumes, mounts } = contribution;
    let mut pod = template.spec.take().unwrap_or_default();

    pod.init_containers = Some(vec![gitcloner::container(&gitjob.spec.git.repo, image, args, mounts)]);

    let mut all_volumes = base_volumes();
    all_volumes.extend(volumes);
    pod.volumes = Some(all_volumes);

    // Jobs only accept Never or OnFailure
    if pod.restart_policy.as_deref().map_or(true, str::is_empty) {
        pod.restart_policy = Some("Never".into());
    }

    for container in pod.containers.iter_mut() {
        container.volume_mounts.get_or_insert_with(Vec::new).push(source_mount());
    }

    template.spec = Some(pod);

    Job {
        metadata: ObjectMeta {
            name: Some(name(gitjob)),
            namespace: gitjob.namespace(),
            owner_references: gitjob.controller_owner_ref(&()).map(|owner| vec![owner]),
            labels: Some(labels),
            annotations: Some(annotations),
            ..Default::default()
        },
        spec: Some(spec),
        ..Default::default()
    }
}

/// The Job name, unique per repository and commit: `<gitjob>-<hash>`.
pub fn name(gitjob: &GitJob) -> String {
    let digest = Sha256::digest(format!("{}{}", gitjob.spec.git.repo, gitjob.commit()));
    let hash = format!("{:x}", digest);

    let prefix: String = gitjob.name_any().chars().take(MAX_NAME_LENGTH - SUFFIX_LENGTH - 1).collect();
    format!("{}-{}", prefix.trim_end_matches('-'), &hash[..SUFFIX_LENGTH])
}
