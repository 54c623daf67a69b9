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

use futures::{future, StreamExt};
use k8s_openapi::api::core::v1::Secret;
use kube::runtime::reflector::{self, store::Writer, Store};
use kube::runtime::{watcher, WatchStreamExt};
use kube::{Api, ResourceExt};
use tracing::{debug, error, info};

use crate::context::Context;

/// Keep the secret store of the context in sync with the cluster.
///
/// The translator only ever reads from the store. Callers wait for [`ready`]
/// before reading, so that an unsynced store is not taken for a missing secret.
pub async fn new(ctx: &Arc<Context>, writer: Writer<Secret>) {
    let api: Api<Secret> = ctx.api();
    let stream = watcher(api, watcher::Config::default()).default_backoff();

    reflector::reflector(writer, stream)
        .applied_objects()
        .for_each(|secret| {
            match secret {
                Ok(secret) => debug!("Cached secret {}/{}", secret.namespace().unwrap_or_default(), secret.name_any()),
                Err(err) => error!("Resolve secret stream failed: {}", err),
            }
            future::ready(())
        })
        .await
}

/// Wait until the first listing of secrets has reached the store.
///
/// Returns false when the watcher went away before that happened.
pub async fn ready(secrets: &Store<Secret>) -> bool {
    match secrets.wait_until_ready().await {
        Ok(()) => {
            info!("Secret store is ready with {} secrets", secrets.state().len());
            true
        }
        Err(err) => {
            error!("Secret store never became ready: {}", err);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use kube::core::ObjectMeta;
    use kube::runtime::reflector::ObjectRef;

    use super::*;

    fn secret() -> Secret {
        Secret {
            metadata: ObjectMeta {
                name: Some("secretName".into()),
                namespace: Some("default".into()),
                ..Default::default()
            },
            type_: Some("kubernetes.io/basic-auth".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_not_ready_before_first_listing() {
        let (secrets, mut writer) = reflector::store::<Secret>();

        let pending = tokio::time::timeout(Duration::from_millis(50), ready(&secrets)).await;
        assert!(pending.is_err());
        assert!(secrets.get(&ObjectRef::new("secretName").within("default")).is_none());

        writer.apply_watcher_event(&watcher::Event::Restarted(vec![secret()]));
        assert!(ready(&secrets).await);
        assert!(secrets.get(&ObjectRef::new("secretName").within("default")).is_some());
    }

    #[tokio::test]
    async fn test_not_ready_when_watcher_is_gone() {
        let (secrets, writer) = reflector::store::<Secret>();
        drop(writer);
        assert!(!ready(&secrets).await);
    }
}
