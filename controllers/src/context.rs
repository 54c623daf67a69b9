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

use k8s_openapi::api::core::v1::{ObjectReference, Secret};
use kube::runtime::events::Recorder;
use kube::runtime::reflector::Store;
use kube::{Api, Client, Resource};

use crate::config::Config;

/// The state shared by the controller and the watchers.
pub struct Context {
    pub k8s: Client,
    /// Secrets seen by the secret watcher, the read-through cache of the translator.
    pub secrets: Store<Secret>,
    pub config: Config,
}

impl Context {
    pub fn new(k8s: Client, secrets: Store<Secret>, config: Config) -> Context {
        Context { k8s, secrets, config }
    }

    pub fn recorder(&self, reference: ObjectReference) -> Recorder {
        Recorder::new(self.k8s.clone(), "gitjob-controllers".into(), reference)
    }

    /// An Api scoped to the configured namespace, or to all namespaces.
    pub fn api<K>(&self) -> Api<K>
    where
        K: Resource<Scope = k8s_openapi::NamespaceResourceScope>,
        <K as Resource>::DynamicType: Default,
    {
        match &self.config.namespace {
            Some(namespace) => Api::namespaced(self.k8s.clone(), namespace),
            None => Api::all(self.k8s.clone()),
        }
    }
}
