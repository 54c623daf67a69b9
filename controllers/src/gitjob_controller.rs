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

use std::sync::Arc;
use std::time::Duration;

use futures::{future, StreamExt};
use gitjob_crds::{GitJob, GitJobState};
use gitjob_resources::env::ProxyEnv;
use gitjob_resources::event::{trace, warning};
use gitjob_resources::{gitjob, job};
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Condition;
use kube::api::ListParams;
use kube::runtime::controller::Action;
use kube::runtime::events::Recorder;
use kube::runtime::reflector::{ObjectRef, Store};
use kube::runtime::{watcher, Controller};
use kube::{Api, Resource, ResourceExt};
use tracing::{debug, error, info, warn};
use validator::Validate;

use crate::context::Context;
use crate::errors::{Error, Result};
use crate::secret_watcher;

pub async fn new(ctx: &Arc<Context>) {
    let api: Api<GitJob> = ctx.api();

    // Ensure GitJob CRD is installed before loop-watching
    if let Err(e) = api.list(&ListParams::default().limit(1)).await {
        error!("GitJob CRD is not queryable; {e:?}. Is the CRD installed?");
        info!("Installation: gitjob-crdgen | kubectl apply -f -");
        std::process::exit(1);
    }

    // Secrets are read from the store, reconciling before it is synced would
    // report secrets that exist as missing.
    if !secret_watcher::ready(&ctx.secrets).await {
        return;
    }

    let jobs: Api<Job> = ctx.api();
    let secrets: Api<Secret> = ctx.api();
    let controller = Controller::new(api, watcher::Config::default());
    let gitjobs = controller.store();

    controller
        .owns(jobs, watcher::Config::default())
        .watches(secrets, watcher::Config::default(), move |secret| referencing(&gitjobs, &secret))
        .run(reconcile, error_policy, ctx.clone())
        .for_each(|_| future::ready(()))
        .await
}

/// The reconciler that will be called when either object change
pub async fn reconcile(gitjob: Arc<GitJob>, ctx: Arc<Context>) -> Result<Action> {
    info!("Reconciling GitJob \"{}\"", gitjob.name_any());

    let namespace = gitjob.namespace().ok_or_else(|| Error::MissingObjectKey(".metadata.namespace"))?;
    let recorder = ctx.recorder(gitjob.object_ref(&()));

    if let Err(err) = gitjob.spec.validate() {
        let message = err.to_string();
        warning(&recorder, "InvalidSpec", &message).await;
        report(&ctx, &gitjob, vec![GitJobState::generated(false, "invalid spec", Some(message))], None).await?;
        return Err(Error::ValidationError(err));
    }

    // The proxy settings are read once for every translation.
    let proxy = ProxyEnv::from_env();
    let resource = match gitjob_resources::generate(&gitjob, &ctx.config.image, &ctx.secrets, &proxy) {
        Ok(resource) => resource,
        Err(err) => {
            let message = err.to_string();
            warning(&recorder, "GenerateFailed", &message).await;
            report(&ctx, &gitjob, vec![GitJobState::generated(false, "generate failed", Some(message))], None).await?;
            return Err(Error::ResourceError(err));
        }
    };

    let name = resource.name_any();
    if job::exists(&ctx.k8s, &namespace, &name).await.map_err(Error::ResourceError)? {
        debug!("The Job {} already exists", name);
    } else {
        job::create(&ctx.k8s, &namespace, resource).await.map_err(Error::ResourceError)?;
        submitted(&recorder, &name, gitjob.commit()).await;
    }

    let conditions = vec![
        GitJobState::generated(true, "generated", None),
        GitJobState::submitted(true, "created", None),
    ];
    report(&ctx, &gitjob, conditions, Some(&name)).await?;

    Ok(Action::await_change())
}

/// an error handler that will be called when the reconciler fails with access to both the
/// object that caused the failure and the actual error
pub fn error_policy(gitjob: Arc<GitJob>, error: &Error, ctx: Arc<Context>) -> Action {
    match error {
        Error::ResourceError(err) if err.is_configuration() => {
            warn!("GitJob {} is misconfigured: {}", gitjob.name_any(), err)
        }
        Error::ValidationError(err) => warn!("GitJob {} is invalid: {}", gitjob.name_any(), err),
        _ => error!("reconcile failed: {:?}", error),
    }

    Action::requeue(Duration::from_secs(ctx.config.requeue_seconds))
}

/// The GitJobs that read their credential from `secret`.
fn referencing(gitjobs: &Store<GitJob>, secret: &Secret) -> Vec<ObjectRef<GitJob>> {
    let name = secret.name_any();
    gitjobs
        .state()
        .iter()
        .filter(|gitjob| gitjob.namespace() == secret.namespace())
        .filter(|gitjob| gitjob.spec.git.credential.secret_name() == Some(name.as_str()))
        .map(|gitjob| ObjectRef::from_obj(gitjob.as_ref()))
        .collect()
}

async fn submitted(recorder: &Recorder, name: &str, commit: &str) {
    trace(recorder, format!("Created Job {} for commit {:?}", name, commit)).await
}

/// Patch the status only when something changed, an unchanged status must not
/// trigger another reconciliation.
async fn report(ctx: &Context, gitjob: &GitJob, conditions: Vec<Condition>, job_name: Option<&str>) -> Result<()> {
    let status = gitjob.status.clone().unwrap_or_default();

    let changed = conditions.iter().any(|condition| !status.has_condition(condition))
        || (job_name.is_some() && status.job_name.as_deref() != job_name);
    if !changed {
        return Ok(());
    }

    gitjob::patch_status(&ctx.k8s, gitjob, conditions, job_name).await.map_err(Error::ResourceError)
}

#[cfg(test)]
mod tests {
    use gitjob_crds::{GitCredential, GitInfo, GitJobSpec};
    use kube::core::ObjectMeta;
    use kube::runtime::reflector;

    use super::*;

    fn gitjob(name: &str, namespace: &str, secret: Option<&str>) -> GitJob {
        let mut gitjob = GitJob::new(
            name,
            GitJobSpec {
                git: GitInfo {
                    repo: "repo".into(),
                    credential: GitCredential { client_secret_name: secret.map(Into::into), ..Default::default() },
                },
                ..Default::default()
            },
        );
        gitjob.metadata.namespace = Some(namespace.into());
        gitjob
    }

    fn secret(name: &str, namespace: &str) -> Secret {
        Secret {
            metadata: ObjectMeta { name: Some(name.into()), namespace: Some(namespace.into()), ..Default::default() },
            ..Default::default()
        }
    }

    #[test]
    fn test_referencing() {
        let (gitjobs, mut writer) = reflector::store::<GitJob>();
        writer.apply_watcher_event(&watcher::Event::Restarted(vec![
            gitjob("with-secret", "default", Some("secretName")),
            gitjob("other-secret", "default", Some("other")),
            gitjob("no-secret", "default", None),
            gitjob("other-namespace", "other", Some("secretName")),
        ]));

        let refs = referencing(&gitjobs, &secret("secretName", "default"));
        assert_eq!(refs, vec![ObjectRef::new("with-secret").within("default")]);

        assert!(referencing(&gitjobs, &secret("unknown", "default")).is_empty());
    }
}
