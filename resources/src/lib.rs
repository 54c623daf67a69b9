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
use k8s_openapi::api::batch::v1::Job;
use kube::ResourceExt;
use tracing::debug;

use self::env::ProxyEnv;
use self::error::{Error, Result};
use self::secret::SecretCache;

pub mod containers;
pub mod credential;
pub mod env;
pub mod error;
pub mod event;
pub mod gitjob;
pub mod job;
pub mod secret;

/// Translate `gitjob` into the Job that clones its repository and runs its template.
///
/// Looks up the credential secret through `secrets` when one is requested, the
/// proxy settings are taken from the given snapshot. Either a complete Job is
/// returned or nothing is.
pub fn generate<C>(gitjob: &GitJob, image: &str, secrets: &C, proxy: &ProxyEnv) -> Result<Job>
where
    C: SecretCache + ?Sized,
{
    let name = gitjob.name_any();
    let namespace = gitjob.namespace().ok_or_else(|| Error::MissingObjectKey(".metadata.namespace"))?;
    let git_credential = &gitjob.spec.git.credential;

    let resolved = secret::resolve(secrets, &namespace, git_credential.secret_name())?;
    debug!("Resolved {} credential for GitJob {}/{}", resolved.kind(), namespace, name);

    let contribution = credential::contribute(
        &resolved,
        &name,
        git_credential.has_ca_bundle(),
        git_credential.insecure_skip_tls_verify,
    );

    let job = job::new(gitjob, image, contribution);
    let job = env::inject(job, gitjob.commit(), gitjob.event_type(), proxy);
    debug!("Generated Job {} for GitJob {}/{}", job.name_any(), namespace, name);

    Ok(job)
}

/// Returns a list of arguments as separate `--key value` pairs.
#[inline]
pub fn flags(args: &[(&str, &str)]) -> Vec<String> {
    args.iter()
        .flat_map(|(key, value)| [format!("--{}", key), value.to_string()])
        .collect()
}
