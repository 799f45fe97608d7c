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

//! # GLUE raw datasets
//!
//! Raw examples are read from the tab-separated files of the GLUE distribution. Two providers
//! are available:
//! - `GlueRemoteProvider` downloads the task files and caches them locally
//! - `GlueDirectoryProvider` reads an existing GLUE data directory (`SST-2/`, `MRPC/`, `RTE/`,
//!   each holding `train.tsv`, `dev.tsv` and `test.tsv`)
//!
//! Columns are looked up by name so that both the GLUE layout and the original MSR paraphrase
//! corpus layout can be read. Labels of the test split are never kept.

use crate::common::error::GlueError;
use crate::common::resources::{build_cache, RemoteFile};
use crate::glue::task::{GlueTask, TextFields};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// # Dataset split
pub enum Split {
    Train,
    Validation,
    Test,
}

impl Split {
    pub fn name(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Validation => "validation",
            Split::Test => "test",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
/// # Raw input record
/// Named text fields and an optional label (missing for test data).
pub struct RawExample {
    pub fields: BTreeMap<String, String>,
    pub label: Option<i64>,
}

impl RawExample {
    pub fn new(label: Option<i64>) -> RawExample {
        RawExample {
            fields: BTreeMap::new(),
            label,
        }
    }

    pub fn with_field(mut self, name: &str, value: &str) -> RawExample {
        self.fields.insert(name.to_string(), value.to_string());
        self
    }

    pub fn field(&self, name: &str) -> Result<&str, GlueError> {
        self.fields
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| GlueError::ValueError(format!("example has no field {}", name)))
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
/// # Collection of named splits
pub struct GlueDatasets {
    splits: BTreeMap<Split, Vec<RawExample>>,
}

impl GlueDatasets {
    pub fn new() -> GlueDatasets {
        GlueDatasets::default()
    }

    pub fn with_split(mut self, split: Split, examples: Vec<RawExample>) -> GlueDatasets {
        self.insert(split, examples);
        self
    }

    pub fn insert(&mut self, split: Split, examples: Vec<RawExample>) {
        self.splits.insert(split, examples);
    }

    pub fn get(&self, split: Split) -> Option<&[RawExample]> {
        self.splits.get(&split).map(Vec::as_slice)
    }

    pub fn require(&self, split: Split) -> Result<&[RawExample], GlueError> {
        self.get(split).ok_or_else(|| {
            GlueError::DataUnavailable(format!("dataset has no {} split", split))
        })
    }

    pub fn len(&self, split: Split) -> usize {
        self.get(split).map_or(0, <[RawExample]>::len)
    }

    pub fn splits(&self) -> impl Iterator<Item = (Split, &[RawExample])> {
        self.splits
            .iter()
            .map(|(split, examples)| (*split, examples.as_slice()))
    }

    /// Keeps at most `max_samples` examples of every split except the test split, in order.
    pub fn truncate(&mut self, max_samples: usize) {
        for (split, examples) in self.splits.iter_mut() {
            if *split != Split::Test {
                examples.truncate(max_samples);
            }
        }
    }

    pub fn sizes_summary(&self) -> String {
        self.splits
            .iter()
            .map(|(split, examples)| format!("{}: {}", split, examples.len()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Source of raw GLUE splits.
pub trait DatasetProvider {
    fn load(&self, task: GlueTask) -> Result<GlueDatasets, GlueError>;
}

/// # Local GLUE data directory
pub struct GlueDirectoryProvider {
    root: PathBuf,
}

impl GlueDirectoryProvider {
    pub fn new<P: AsRef<Path>>(root: P) -> GlueDirectoryProvider {
        GlueDirectoryProvider {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn task_directory(task: GlueTask) -> &'static str {
        match task {
            GlueTask::Sst2 => "SST-2",
            GlueTask::Mrpc => "MRPC",
            GlueTask::Rte => "RTE",
        }
    }
}

impl DatasetProvider for GlueDirectoryProvider {
    fn load(&self, task: GlueTask) -> Result<GlueDatasets, GlueError> {
        let dir = self.root.join(GlueDirectoryProvider::task_directory(task));
        let mut datasets = GlueDatasets::new()
            .with_split(Split::Train, read_tsv(dir.join("train.tsv"), task, Split::Train)?)
            .with_split(
                Split::Validation,
                read_tsv(dir.join("dev.tsv"), task, Split::Validation)?,
            );
        let test_path = dir.join("test.tsv");
        if test_path.is_file() {
            datasets.insert(Split::Test, read_tsv(test_path, task, Split::Test)?);
        }
        Ok(datasets)
    }
}

/// # GLUE files downloaded from their public location
pub struct GlueRemoteProvider {
    cache_dir: Option<PathBuf>,
}

impl GlueRemoteProvider {
    pub const SST2_ARCHIVE: &'static str = "https://dl.fbaipublicfiles.com/glue/data/SST-2.zip";
    pub const RTE_ARCHIVE: &'static str = "https://dl.fbaipublicfiles.com/glue/data/RTE.zip";
    pub const MRPC_TRAIN: &'static str =
        "https://dl.fbaipublicfiles.com/senteval/senteval_data/msr_paraphrase_train.txt";
    pub const MRPC_TEST: &'static str =
        "https://dl.fbaipublicfiles.com/senteval/senteval_data/msr_paraphrase_test.txt";
    pub const MRPC_DEV_IDS: &'static str =
        "https://dl.fbaipublicfiles.com/glue/data/mrpc_dev_ids.tsv";

    pub fn new(cache_dir: Option<PathBuf>) -> GlueRemoteProvider {
        GlueRemoteProvider { cache_dir }
    }

    fn load_mrpc(&self) -> Result<GlueDatasets, GlueError> {
        let cache = build_cache(self.cache_dir.as_deref())?;
        let train_path = RemoteFile::new(GlueRemoteProvider::MRPC_TRAIN, "glue/mrpc")
            .get_local_path(&cache)?;
        let test_path = RemoteFile::new(GlueRemoteProvider::MRPC_TEST, "glue/mrpc")
            .get_local_path(&cache)?;
        let dev_ids_path = RemoteFile::new(GlueRemoteProvider::MRPC_DEV_IDS, "glue/mrpc")
            .get_local_path(&cache)?;

        let dev_ids = read_id_pairs(dev_ids_path)?;
        let (train, valid) = partition_mrpc(
            read_tsv(train_path, GlueTask::Mrpc, Split::Train)?,
            &dev_ids,
        );
        let test = read_tsv(test_path, GlueTask::Mrpc, Split::Test)?;

        Ok(GlueDatasets::new()
            .with_split(Split::Train, train)
            .with_split(Split::Validation, valid)
            .with_split(Split::Test, test))
    }
}

impl DatasetProvider for GlueRemoteProvider {
    fn load(&self, task: GlueTask) -> Result<GlueDatasets, GlueError> {
        let archive = match task {
            GlueTask::Sst2 => GlueRemoteProvider::SST2_ARCHIVE,
            GlueTask::Rte => GlueRemoteProvider::RTE_ARCHIVE,
            GlueTask::Mrpc => return self.load_mrpc(),
        };
        let cache = build_cache(self.cache_dir.as_deref())?;
        let extracted = RemoteFile::archive(archive, &format!("glue/{}", task)).get_local_path(&cache)?;
        GlueDirectoryProvider::new(extracted).load(task)
    }
}

/// Splits the MSR paraphrase training examples into the GLUE training and development splits.
/// Examples whose `(#1 ID, #2 ID)` pair is listed in `dev_ids` form the development split.
fn partition_mrpc(
    examples: Vec<RawExample>,
    dev_ids: &HashSet<(String, String)>,
) -> (Vec<RawExample>, Vec<RawExample>) {
    let (valid, train) = examples
        .into_iter()
        .partition(|example| match mrpc_id_pair(example) {
            Some(ids) => dev_ids.contains(&ids),
            None => false,
        });
    (train, valid)
}

fn mrpc_id_pair(example: &RawExample) -> Option<(String, String)> {
    Some((
        example.fields.get("#1 ID")?.clone(),
        example.fields.get("#2 ID")?.clone(),
    ))
}

/// Maps the column names of the GLUE and MSR files onto the field names used by the tasks.
fn canonical_column(task: GlueTask, header: &str) -> String {
    let header = header.trim_start_matches('\u{feff}').trim();
    match (task, header) {
        (GlueTask::Mrpc, "#1 String") => "sentence1".to_string(),
        (GlueTask::Mrpc, "#2 String") => "sentence2".to_string(),
        (GlueTask::Mrpc, "Quality") => "label".to_string(),
        (_, other) => other.to_string(),
    }
}

fn tsv_reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.delimiter(b'\t').quoting(false).flexible(true);
    builder
}

/// Reads one split of a GLUE task from a tab-separated file with a header row.
pub fn read_tsv<P: AsRef<Path>>(
    path: P,
    task: GlueTask,
    split: Split,
) -> Result<Vec<RawExample>, GlueError> {
    let path = path.as_ref();
    let mut reader = tsv_reader_builder()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| GlueError::DataUnavailable(format!("{}: {}", path.display(), e)))?;
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|header| canonical_column(task, header))
        .collect();

    let descriptor = task.descriptor();
    let required: Vec<&str> = match descriptor.text_fields {
        TextFields::Single(field) => vec![field],
        TextFields::Pair(field_a, field_b) => vec![field_a, field_b],
    };
    for field in required.iter() {
        if !headers.iter().any(|header| header == field) {
            return Err(GlueError::DataUnavailable(format!(
                "{}: missing column {}",
                path.display(),
                field
            )));
        }
    }
    let label_column = headers.iter().position(|header| header == "label");
    if split != Split::Test && label_column.is_none() {
        return Err(GlueError::DataUnavailable(format!(
            "{}: missing label column",
            path.display()
        )));
    }

    let mut examples = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() < headers.len() {
            return Err(GlueError::DataUnavailable(format!(
                "{}: row {} has {} columns, expected {}",
                path.display(),
                row + 1,
                record.len(),
                headers.len()
            )));
        }
        let mut example = RawExample::new(None);
        for (column, (header, value)) in headers.iter().zip(record.iter()).enumerate() {
            if Some(column) == label_column {
                if split != Split::Test {
                    example.label = Some(descriptor.parse_label(value).map_err(|e| {
                        GlueError::DataUnavailable(format!("{}: {}", path.display(), e))
                    })?);
                }
            } else {
                example.fields.insert(header.clone(), value.to_string());
            }
        }
        examples.push(example);
    }
    log::debug!(
        "Read {} {} examples from {}",
        examples.len(),
        split,
        path.display()
    );
    Ok(examples)
}

fn read_id_pairs<P: AsRef<Path>>(path: P) -> Result<HashSet<(String, String)>, GlueError> {
    let mut reader = tsv_reader_builder().has_headers(false).from_path(path)?;
    let mut ids = HashSet::new();
    for record in reader.records() {
        let record = record?;
        if let (Some(id_1), Some(id_2)) = (record.get(0), record.get(1)) {
            ids.insert((id_1.trim().to_string(), id_2.trim().to_string()));
        }
    }
    Ok(ids)
}
