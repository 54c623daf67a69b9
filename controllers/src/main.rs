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

use clap::Parser;
use k8s_openapi::api::core::v1::Secret;
use kube::runtime::reflector;
use kube::Client;
use tracing_subscriber::EnvFilter;

mod config;
mod context;
mod errors;

use crate::config::Config;
use crate::context::Context;

mod gitjob_controller;
mod secret_watcher;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // This returns an error if the `.env` file doesn't exist, but that's not what we want
    // since we're not going to use a `.env` file if we deploy this application.
    dotenv::dotenv().ok();

    // Parse our configuration from the environment.
    // This will exit with a help message if something is wrong.
    let config = Config::parse();
    tracing::debug!("The current configuration reads: {:?}", config);

    // The secret watcher fills the store, the controller reads from it.
    let (secrets, writer) = reflector::store::<Secret>();
    let ctx = Arc::new(Context::new(Client::try_default().await?, secrets, config));

    // Creates the controller and watcher and waits on both concurrent branches,
    // returning when **the first** branch completes and cancelling the other.
    tokio::select! {
        _ = secret_watcher::new(&ctx, writer) => tracing::warn!("secret watcher exited"),
        _ = gitjob_controller::new(&ctx) => tracing::warn!("gitjob controller exited"),
    }

    Ok(())
}
