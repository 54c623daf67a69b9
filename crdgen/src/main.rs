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
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Parser;
use gitjob_crds::GitJob;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::CustomResourceExt;

/// Generate custom resource definitions for GitJob.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Print the names of the custom resource definition.
    #[arg(short, long)]
    list: bool,
    /// Names of the custom resource definition, separated by comma.
    #[arg(short, long)]
    names: Option<String>,
    /// Which output path to write to, If not specified, will print to stdout.
    #[arg(short, long)]
    output: Option<String>,
}

fn mappings() -> BTreeMap<&'static str, (&'static str, CustomResourceDefinition)> {
    BTreeMap::from([("gitjob", ("gitjob.yaml", GitJob::crd()))])
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mappings = mappings();

    // Print the names of the custom resource definition sorted by name.
    if args.list {
        for name in mappings.keys() {
            println!("{}", name);
        }
        return Ok(());
    }

    let dir = match &args.output {
        Some(output) => {
            let path = Path::new(output);
            if !path.exists() {
                bail!("The given output path is not exists");
            }
            Some(path)
        }
        None => None,
    };

    for (filename, definition) in select(&mappings, args.names.as_deref())? {
        generate(dir, filename, definition)?;
    }

    Ok(())
}

/// Pick the definitions for the comma separated `names`, all of them when not specified.
fn select<'a>(
    mappings: &'a BTreeMap<&'static str, (&'static str, CustomResourceDefinition)>,
    names: Option<&str>,
) -> Result<Vec<(&'static str, &'a CustomResourceDefinition)>> {
    let names: Vec<&str> = match names {
        Some(names) => names.split(',').map(str::trim).collect(),
        None => mappings.keys().copied().collect(),
    };

    names
        .into_iter()
        .map(|name| match mappings.get(name) {
            Some((filename, definition)) => Ok((*filename, definition)),
            None => bail!("The given name is not valid: {}", name),
        })
        .collect()
}

/// Generate custom resource definitions with the given output path and filename.
fn generate(dir: Option<&Path>, filename: &str, definition: &CustomResourceDefinition) -> Result<()> {
    let data = serde_yaml::to_string(definition)?;

    match dir {
        Some(dir) => {
            let path = dir.join(filename);
            fs::write(&path, data).with_context(|| format!("Couldn't write to file: {}", path.display()))?
        }
        None => println!("{}\n---\n", data),
    }

    Ok(())
}
