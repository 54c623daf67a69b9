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

/// The configuration parameters for the controller.
///
/// These can either be passed on the command line, or pulled from environment variables.
/// The latter is preferred as environment variables are one of the recommended ways to
/// get configuration from Kubernetes in deployment.
///
/// For development convenience, these can also be read from a `.env` file in the working
/// directory where the controller is started.
#[derive(clap::Parser, Debug)]
pub struct Config {
    /// The image of the gitcloner init container added to every Job.
    #[clap(long, env = "GITJOB_IMAGE", default_value = "rancher/gitjob:latest")]
    pub image: String,

    /// Only watch GitJobs and Secrets in this namespace, all namespaces when unset.
    #[clap(long, env = "GITJOB_NAMESPACE")]
    pub namespace: Option<String>,

    /// Seconds to wait before reconciling a GitJob again after a failure.
    #[clap(long, env = "GITJOB_REQUEUE_SECONDS", default_value_t = 60)]
    pub requeue_seconds: u64,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn test_parse_args() {
        let config = Config::try_parse_from([
            "gitjob-controllers",
            "--image",
            "rancher/gitjob:v0.1.96",
            "--namespace",
            "cattle-system",
            "--requeue-seconds",
            "10",
        ])
        .unwrap();

        assert_eq!(config.image, "rancher/gitjob:v0.1.96");
        assert_eq!(config.namespace, Some("cattle-system".into()));
        assert_eq!(config.requeue_seconds, 10);
    }
}
