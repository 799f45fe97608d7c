// Copyright 2019 Guillaume Becquin
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # Resources for datasets and model files
//!
//! Two kinds of files are accessed by this crate:
//! - dataset files (GLUE archives and TSV files), downloaded through a `cached-path` cache that
//!   can be relocated per data manager (`GlueDataConfig::cache_dir`) or globally with the
//!   `GLUE_CACHE` environment variable
//! - model files (configuration, vocabulary, weights), resolved from a local directory or from
//!   the Hugging Face hub using the `rust-bert` resources (cached under `RUSTBERT_CACHE`)

use crate::common::error::GlueError;
use cached_path::{Cache, Options, ProgressBar};
use dirs::cache_dir;
use lazy_static::lazy_static;
use rust_bert::resources::{LocalResource, RemoteResource, ResourceProvider};
use std::path::{Path, PathBuf};

lazy_static! {
    /// Default dataset cache location, `$GLUE_CACHE` or `<user cache>/.glue-bert`
    pub static ref DEFAULT_CACHE_DIRECTORY: PathBuf = _get_cache_directory();
}

fn _get_cache_directory() -> PathBuf {
    match std::env::var("GLUE_CACHE") {
        Ok(value) => PathBuf::from(value),
        Err(_) => {
            let mut home = cache_dir().unwrap_or_else(std::env::temp_dir);
            home.push(".glue-bert");
            home
        }
    }
}

/// Builds a dataset cache rooted at `dir`, or at `DEFAULT_CACHE_DIRECTORY` if not provided.
pub fn build_cache(dir: Option<&Path>) -> Result<Cache, GlueError> {
    let dir = dir.map_or_else(|| DEFAULT_CACHE_DIRECTORY.clone(), Path::to_path_buf);
    Ok(Cache::builder()
        .dir(dir)
        .progress_bar(Some(ProgressBar::Light))
        .build()?)
}

/// # Remote dataset file
/// Points to a file or archive reachable by URL. Archives are extracted by the cache and the
/// local path then refers to the extraction directory.
#[derive(PartialEq, Clone, Debug)]
pub struct RemoteFile {
    pub url: String,
    pub cache_subdir: String,
    pub extract: bool,
}

impl RemoteFile {
    pub fn new(url: &str, cache_subdir: &str) -> RemoteFile {
        RemoteFile {
            url: url.to_string(),
            cache_subdir: cache_subdir.to_string(),
            extract: false,
        }
    }

    pub fn archive(url: &str, cache_subdir: &str) -> RemoteFile {
        RemoteFile {
            extract: true,
            ..RemoteFile::new(url, cache_subdir)
        }
    }

    pub fn get_local_path(&self, cache: &Cache) -> Result<PathBuf, GlueError> {
        let options = Options::default().subdir(&self.cache_subdir);
        let options = if self.extract {
            options.extract()
        } else {
            options
        };
        log::info!("Fetching {}", self.url);
        Ok(cache.cached_path_with_options(&self.url, &options)?)
    }
}

/// # Location of a model's files
/// Either a local directory or a Hugging Face hub repository identifier.
#[derive(PartialEq, Clone, Debug)]
pub enum ModelLocation {
    Local(PathBuf),
    Hub(String),
}

impl ModelLocation {
    /// A name pointing to an existing directory is treated as local, anything else as a hub id.
    pub fn from_name(model_name: &str) -> ModelLocation {
        let path = Path::new(model_name);
        if path.is_dir() {
            ModelLocation::Local(path.to_path_buf())
        } else {
            ModelLocation::Hub(model_name.to_string())
        }
    }

    pub fn resource(&self, file_name: &str) -> Box<dyn ResourceProvider> {
        match self {
            ModelLocation::Local(dir) => Box::new(LocalResource {
                local_path: dir.join(file_name),
            }),
            ModelLocation::Hub(model_name) => {
                let url = format!(
                    "https://huggingface.co/{}/resolve/main/{}",
                    model_name, file_name
                );
                let stem = file_name.split('.').next().unwrap_or(file_name);
                Box::new(RemoteResource::new(
                    &url,
                    &format!("{}/{}", model_name, stem),
                ))
            }
        }
    }

    /// Resolves `file_name` to a local path, downloading it when needed.
    pub fn get_local_path(&self, file_name: &str) -> Result<PathBuf, GlueError> {
        let path = self.resource(file_name).get_local_path().map_err(|e| {
            GlueError::ModelResolution(format!("could not fetch {} for {}: {}", file_name, self, e))
        })?;
        if !path.is_file() {
            return Err(GlueError::ModelResolution(format!(
                "{} not found for {}",
                file_name, self
            )));
        }
        Ok(path)
    }
}

impl std::fmt::Display for ModelLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelLocation::Local(dir) => write!(f, "{}", dir.display()),
            ModelLocation::Hub(model_name) => write!(f, "{}", model_name),
        }
    }
}
