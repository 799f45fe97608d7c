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

//! # GLUE data manager
//!
//! Turns a task name and a model name into tokenized, length-sorted batch streams.
//!
//! ```no_run
//! # fn main() -> Result<(), glue_bert::GlueError> {
//! use glue_bert::glue::data_manager::{GlueDataConfig, GlueDataManager};
//!
//! let config = GlueDataConfig {
//!     max_length: 128,
//!     train_batch_size: 16,
//!     ..GlueDataConfig::new("mrpc", "prajjwal1/bert-tiny")
//! };
//! let mut manager = GlueDataManager::new(config)?;
//! let loaders = manager.create_dataloaders(None, Some(1000))?;
//! for batch in loaders.train.iter() {
//!     assert_eq!(batch.sequence_length(), 128);
//! }
//! let test_stream = manager.create_test_dataloader(None)?;
//! # Ok(())
//! # }
//! ```

use crate::common::error::GlueError;
use crate::glue::batch::{
    BatchStream, CategoryVocab, GlueDataLoaders, IndexSplitter, LabelledFrame, StreamOptions,
    MIN_MAX_LENGTH,
};
use crate::glue::dataset::{DatasetProvider, GlueDatasets, GlueRemoteProvider, RawExample, Split};
use crate::glue::metrics::Metric;
use crate::glue::task::{GlueTask, TaskDescriptor, TextInput};
use crate::glue::tokenizer::GlueTokenizer;
use std::path::PathBuf;
use std::sync::Arc;
use tch::Device;

/// # Configuration for a GLUE data manager
pub struct GlueDataConfig {
    /// Task name, one of `sst2`, `mrpc` or `rte` (case-insensitive)
    pub task_name: String,
    /// Model name or local model directory, used to resolve the tokenizer
    pub model_name: String,
    /// Length of every tokenized row (padded or truncated)
    pub max_length: usize,
    /// Training batch size
    pub train_batch_size: usize,
    /// Validation and test batch size, twice the training batch size if not set
    pub val_batch_size: Option<usize>,
    /// Dataset cache directory, `GLUE_CACHE` or the user cache directory if not set
    pub cache_dir: Option<PathBuf>,
    /// Shuffle the order of training batches on every pass
    pub shuffle_train: bool,
    /// Device on which batches are created
    pub device: Device,
}

impl GlueDataConfig {
    pub fn new(task_name: &str, model_name: &str) -> GlueDataConfig {
        GlueDataConfig {
            task_name: task_name.to_string(),
            model_name: model_name.to_string(),
            ..Default::default()
        }
    }
}

impl Default for GlueDataConfig {
    fn default() -> GlueDataConfig {
        GlueDataConfig {
            task_name: "sst2".to_string(),
            model_name: "prajjwal1/bert-tiny".to_string(),
            max_length: 512,
            train_batch_size: 32,
            val_batch_size: None,
            cache_dir: None,
            shuffle_train: true,
            device: Device::Cpu,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
/// # Progress of a data manager session
pub enum SessionState {
    Initialized,
    DatasetsLoaded,
    TrainBatchesBuilt,
    TestBatchesBuilt,
}

/// # GLUE data manager
pub struct GlueDataManager {
    descriptor: TaskDescriptor,
    vocab: CategoryVocab,
    tokenizer: Arc<GlueTokenizer>,
    provider: Box<dyn DatasetProvider>,
    max_length: usize,
    train_batch_size: usize,
    val_batch_size: usize,
    shuffle_train: bool,
    device: Device,
    datasets: Option<GlueDatasets>,
    loaders: Option<GlueDataLoaders>,
    state: SessionState,
}

impl GlueDataManager {
    /// Builds a data manager, resolving the tokenizer from `config.model_name`.
    pub fn new(config: GlueDataConfig) -> Result<GlueDataManager, GlueError> {
        //    validate the task before any download
        config.task_name.parse::<GlueTask>()?;
        let tokenizer = GlueTokenizer::from_pretrained(&config.model_name)?;
        GlueDataManager::new_with_tokenizer(config, tokenizer)
    }

    /// Builds a data manager with an existing tokenizer. `config.model_name` is ignored.
    pub fn new_with_tokenizer(
        config: GlueDataConfig,
        tokenizer: GlueTokenizer,
    ) -> Result<GlueDataManager, GlueError> {
        let task = config.task_name.parse::<GlueTask>()?;
        if config.max_length < MIN_MAX_LENGTH {
            return Err(GlueError::InvalidConfiguration(format!(
                "max_length must be at least {}, got {}",
                MIN_MAX_LENGTH, config.max_length
            )));
        }
        let val_batch_size = config
            .val_batch_size
            .unwrap_or(2 * config.train_batch_size);
        if config.train_batch_size == 0 || val_batch_size == 0 {
            return Err(GlueError::InvalidConfiguration(
                "batch sizes must be strictly positive".into(),
            ));
        }
        let descriptor = task.descriptor();

        Ok(GlueDataManager {
            vocab: CategoryVocab::new(descriptor.num_labels),
            descriptor,
            tokenizer: Arc::new(tokenizer),
            provider: Box::new(GlueRemoteProvider::new(config.cache_dir)),
            max_length: config.max_length,
            train_batch_size: config.train_batch_size,
            val_batch_size,
            shuffle_train: config.shuffle_train,
            device: config.device,
            datasets: None,
            loaders: None,
            state: SessionState::Initialized,
        })
    }

    /// Replaces the source of the raw splits (remote GLUE files by default).
    pub fn with_provider<D: DatasetProvider + 'static>(mut self, provider: D) -> GlueDataManager {
        self.provider = Box::new(provider);
        self
    }

    pub fn task(&self) -> &TaskDescriptor {
        &self.descriptor
    }

    pub fn metrics(&self) -> &[Metric] {
        &self.descriptor.metrics
    }

    pub fn num_labels(&self) -> i64 {
        self.descriptor.num_labels
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn val_batch_size(&self) -> usize {
        self.val_batch_size
    }

    pub fn datasets(&self) -> Option<&GlueDatasets> {
        self.datasets.as_ref()
    }

    pub fn dataloaders(&self) -> Option<&GlueDataLoaders> {
        self.loaders.as_ref()
    }

    /// Loads the task splits, from `custom_datasets` if provided or from the dataset provider
    /// otherwise. Splits other than the test split are cut to `max_samples` examples.
    pub fn load_datasets(
        &mut self,
        custom_datasets: Option<GlueDatasets>,
        max_samples: Option<usize>,
    ) -> Result<&GlueDatasets, GlueError> {
        log::info!("Loading datasets for {}...", self.descriptor.task);
        let mut datasets = match custom_datasets {
            Some(datasets) => datasets,
            None => self.provider.load(self.descriptor.task)?,
        };
        if let Some(max_samples) = max_samples {
            datasets.truncate(max_samples);
        }
        log::info!("Dataset sizes: {}", datasets.sizes_summary());

        if self.state < SessionState::DatasetsLoaded {
            self.state = SessionState::DatasetsLoaded;
        }
        Ok(self.datasets.insert(datasets))
    }

    fn labelled_inputs(&self, examples: &[RawExample]) -> Result<Vec<(TextInput, i64)>, GlueError> {
        examples
            .iter()
            .map(|example| {
                let (text, label) = self.descriptor.extract_labelled(example)?;
                Ok((text, self.vocab.encode(label)?))
            })
            .collect()
    }

    /// Builds the training and validation batch streams. Datasets are (re)loaded first if none
    /// are loaded yet or if `custom_datasets` is provided.
    pub fn create_dataloaders(
        &mut self,
        custom_datasets: Option<GlueDatasets>,
        max_samples: Option<usize>,
    ) -> Result<&GlueDataLoaders, GlueError> {
        if self.datasets.is_none() || custom_datasets.is_some() {
            self.load_datasets(custom_datasets, max_samples)?;
        }
        let datasets = self
            .datasets
            .as_ref()
            .ok_or_else(|| GlueError::Precedence("datasets must be loaded first".into()))?;

        let train = self.labelled_inputs(datasets.require(Split::Train)?)?;
        let valid = self.labelled_inputs(datasets.require(Split::Validation)?)?;

        let frame = LabelledFrame::from_splits(train, valid);
        let splitter = IndexSplitter::new(frame.validation_range());
        let ((train_texts, train_labels), (valid_texts, valid_labels)) =
            splitter.split_frame(&frame);

        let train = BatchStream::new(
            train_texts,
            train_labels,
            self.tokenizer.clone(),
            StreamOptions {
                batch_size: self.train_batch_size,
                max_length: self.max_length,
                shuffle: self.shuffle_train,
                device: self.device,
            },
        )?;
        let valid = BatchStream::new(
            valid_texts,
            valid_labels,
            self.tokenizer.clone(),
            StreamOptions {
                batch_size: self.val_batch_size,
                max_length: self.max_length,
                shuffle: false,
                device: self.device,
            },
        )?;
        log::info!(
            "Built {} training batches and {} validation batches",
            train.num_batches(),
            valid.num_batches()
        );

        self.state = SessionState::TrainBatchesBuilt;
        Ok(self
            .loaders
            .insert(GlueDataLoaders::new(train, valid, self.vocab.clone())))
    }

    /// Builds a batch stream over unlabelled examples with the training tokenization pipeline.
    /// Uses `test_data` if provided and not empty, the loaded test split otherwise.
    pub fn create_test_dataloader(
        &mut self,
        test_data: Option<&[RawExample]>,
    ) -> Result<BatchStream, GlueError> {
        let loaders = self.loaders.as_ref().ok_or_else(|| {
            GlueError::Precedence(
                "training batches must be created first by calling create_dataloaders()".into(),
            )
        })?;
        let test_data = match test_data {
            Some(examples) if !examples.is_empty() => examples,
            _ => self
                .datasets
                .as_ref()
                .and_then(|datasets| datasets.get(Split::Test))
                .ok_or(GlueError::NoTestData)?,
        };
        if test_data.is_empty() {
            return Err(GlueError::NoTestData);
        }
        let texts = test_data
            .iter()
            .map(|example| self.descriptor.extract(example))
            .collect::<Result<Vec<_>, _>>()?;
        let stream = loaders.test_dl(texts)?;

        self.state = SessionState::TestBatchesBuilt;
        Ok(stream)
    }
}
