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

//! # Length-sorted batch streams
//!
//! Examples are ordered by decreasing text length and chunked into batches so that a batch
//! holds sentences of similar length. Batches are tokenized lazily when the stream is
//! iterated: every row of a batch is padded or truncated to exactly `max_length` tokens.
//!
//! Training and validation examples are first gathered in a single `LabelledFrame`; an
//! `IndexSplitter` over the validation index range separates them again.

use crate::common::error::GlueError;
use crate::glue::dataset::Split;
use crate::glue::task::TextInput;
use crate::glue::tokenizer::{EncodedInput, GlueTokenizer};
use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;
use tch::{Device, Kind, Tensor};

/// Tensors addressed by name, as produced by Python-style tokenizers.
pub type NamedTensors = HashMap<String, Tensor>;

/// # Batch of tokenized examples
/// `input_ids`, `attention_mask` and `token_type_ids` have shape (*batch size*, *max_length*),
/// `labels` has shape (*batch size*).
pub struct TokenizedBatch {
    pub input_ids: Tensor,
    pub attention_mask: Tensor,
    pub token_type_ids: Option<Tensor>,
    pub labels: Tensor,
}

impl TokenizedBatch {
    pub fn collate(
        encoded: &[EncodedInput],
        labels: &[i64],
        with_token_type_ids: bool,
        device: Device,
    ) -> TokenizedBatch {
        let stack = |rows: Vec<Tensor>| Tensor::stack(rows.as_slice(), 0).to(device);
        let input_ids = stack(
            encoded
                .iter()
                .map(|input| Tensor::from_slice(&input.input_ids))
                .collect(),
        );
        let attention_mask = stack(
            encoded
                .iter()
                .map(|input| Tensor::from_slice(&input.attention_mask))
                .collect(),
        );
        let token_type_ids = if with_token_type_ids {
            Some(stack(
                encoded
                    .iter()
                    .map(|input| Tensor::from_slice(&input.token_type_ids))
                    .collect(),
            ))
        } else {
            None
        };
        let labels = Tensor::from_slice(labels).to_kind(Kind::Int64).to(device);

        TokenizedBatch {
            input_ids,
            attention_mask,
            token_type_ids,
            labels,
        }
    }

    pub fn batch_size(&self) -> i64 {
        self.input_ids.size()[0]
    }

    pub fn sequence_length(&self) -> i64 {
        self.input_ids.size()[1]
    }

    /// Named view of the model inputs (labels excluded).
    pub fn to_named_tensors(&self) -> NamedTensors {
        let mut named = NamedTensors::new();
        named.insert("input_ids".to_string(), self.input_ids.shallow_clone());
        named.insert(
            "attention_mask".to_string(),
            self.attention_mask.shallow_clone(),
        );
        if let Some(token_type_ids) = &self.token_type_ids {
            named.insert("token_type_ids".to_string(), token_type_ids.shallow_clone());
        }
        named
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// # Label categories
/// Categories are the integers `0..num_labels`, in increasing order.
pub struct CategoryVocab {
    categories: Vec<i64>,
}

impl CategoryVocab {
    pub fn new(num_labels: i64) -> CategoryVocab {
        CategoryVocab {
            categories: (0..num_labels).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Placeholder category given to unlabelled rows.
    pub fn first(&self) -> i64 {
        self.categories.first().copied().unwrap_or(0)
    }

    pub fn encode(&self, label: i64) -> Result<i64, GlueError> {
        self.categories
            .iter()
            .position(|category| *category == label)
            .map(|position| position as i64)
            .ok_or_else(|| {
                GlueError::ValueError(format!(
                    "label {} outside of the {} task categories",
                    label,
                    self.categories.len()
                ))
            })
    }

    pub fn decode(&self, index: i64) -> Option<i64> {
        self.categories.get(index as usize).copied()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FrameRow {
    pub text: TextInput,
    pub label: i64,
    pub split: Split,
}

#[derive(Clone, Debug, Default, PartialEq)]
/// # Training and validation rows in one indexed frame
pub struct LabelledFrame {
    rows: Vec<FrameRow>,
}

impl LabelledFrame {
    pub fn from_splits(train: Vec<(TextInput, i64)>, valid: Vec<(TextInput, i64)>) -> LabelledFrame {
        let tag = |split: Split| move |(text, label): (TextInput, i64)| FrameRow { text, label, split };
        let rows = train
            .into_iter()
            .map(tag(Split::Train))
            .chain(valid.into_iter().map(tag(Split::Validation)))
            .collect();
        LabelledFrame { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[FrameRow] {
        &self.rows
    }

    /// Index range of the rows tagged as validation rows.
    pub fn validation_range(&self) -> Range<usize> {
        let start = self
            .rows
            .iter()
            .position(|row| row.split == Split::Validation)
            .unwrap_or(self.rows.len());
        start..self.rows.len()
    }

    fn select(&self, indices: &[usize]) -> (Vec<TextInput>, Vec<i64>) {
        indices
            .iter()
            .map(|index| {
                let row = &self.rows[*index];
                (row.text.clone(), row.label)
            })
            .unzip()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// # Deterministic splitter: indices inside the range go to validation, others to training
pub struct IndexSplitter {
    valid: Range<usize>,
}

impl IndexSplitter {
    pub fn new(valid: Range<usize>) -> IndexSplitter {
        IndexSplitter { valid }
    }

    pub fn split(&self, len: usize) -> (Vec<usize>, Vec<usize>) {
        (0..len).partition(|index| !self.valid.contains(index))
    }

    pub fn split_frame(
        &self,
        frame: &LabelledFrame,
    ) -> ((Vec<TextInput>, Vec<i64>), (Vec<TextInput>, Vec<i64>)) {
        let (train, valid) = self.split(frame.len());
        (frame.select(&train), frame.select(&valid))
    }
}

/// Shortest row length accepted by the streams: the three special tokens of a pair plus one
/// text token.
pub const MIN_MAX_LENGTH: usize = 4;

#[derive(Clone, Copy, Debug)]
pub struct StreamOptions {
    pub batch_size: usize,
    pub max_length: usize,
    pub shuffle: bool,
    pub device: Device,
}

/// # Stream of tokenized batches
pub struct BatchStream {
    texts: Vec<TextInput>,
    labels: Vec<i64>,
    order: Vec<usize>,
    tokenizer: Arc<GlueTokenizer>,
    options: StreamOptions,
}

impl BatchStream {
    pub fn new(
        texts: Vec<TextInput>,
        labels: Vec<i64>,
        tokenizer: Arc<GlueTokenizer>,
        options: StreamOptions,
    ) -> Result<BatchStream, GlueError> {
        if texts.len() != labels.len() {
            return Err(GlueError::ValueError(format!(
                "{} texts provided for {} labels",
                texts.len(),
                labels.len()
            )));
        }
        if options.batch_size == 0 {
            return Err(GlueError::InvalidConfiguration(
                "batch size must be strictly positive".into(),
            ));
        }
        if options.max_length < MIN_MAX_LENGTH {
            return Err(GlueError::InvalidConfiguration(format!(
                "max_length must be at least {}, got {}",
                MIN_MAX_LENGTH, options.max_length
            )));
        }
        let lengths = texts.iter().map(TextInput::text_length).collect::<Vec<_>>();
        let mut order = (0..texts.len()).collect::<Vec<_>>();
        order.sort_by(|a, b| lengths[*b].cmp(&lengths[*a]));
        log::debug!(
            "Built stream of {} examples in {} batches of up to {}",
            texts.len(),
            (texts.len() + options.batch_size - 1) / options.batch_size,
            options.batch_size
        );

        Ok(BatchStream {
            texts,
            labels,
            order,
            tokenizer,
            options,
        })
    }

    /// Number of examples in the stream.
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    pub fn num_batches(&self) -> usize {
        (self.len() + self.options.batch_size - 1) / self.options.batch_size
    }

    pub fn batch_size(&self) -> usize {
        self.options.batch_size
    }

    pub fn max_length(&self) -> usize {
        self.options.max_length
    }

    pub fn texts(&self) -> &[TextInput] {
        &self.texts
    }

    pub fn labels(&self) -> &[i64] {
        &self.labels
    }

    /// Example indices in stream order (decreasing text length).
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn iter(&self) -> BatchIter<'_> {
        let num_batches = self.num_batches();
        let batch_order = if self.options.shuffle && num_batches > 1 {
            let permutation = Tensor::randperm(num_batches as i64, (Kind::Int64, Device::Cpu));
            (0..num_batches)
                .map(|i| permutation.int64_value(&[i as i64]) as usize)
                .collect()
        } else {
            (0..num_batches).collect()
        };
        BatchIter {
            stream: self,
            batch_order,
            position: 0,
        }
    }

    fn batch(&self, batch_index: usize) -> TokenizedBatch {
        let start = batch_index * self.options.batch_size;
        let end = (start + self.options.batch_size).min(self.len());
        let indices = &self.order[start..end];
        let texts = indices
            .iter()
            .map(|index| self.texts[*index].clone())
            .collect::<Vec<_>>();
        let labels = indices
            .iter()
            .map(|index| self.labels[*index])
            .collect::<Vec<_>>();
        let encoded = self.tokenizer.encode_batch(&texts, self.options.max_length);
        TokenizedBatch::collate(
            &encoded,
            &labels,
            self.tokenizer.returns_token_type_ids(),
            self.options.device,
        )
    }
}

impl<'a> IntoIterator for &'a BatchStream {
    type Item = TokenizedBatch;
    type IntoIter = BatchIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct BatchIter<'a> {
    stream: &'a BatchStream,
    batch_order: Vec<usize>,
    position: usize,
}

impl<'a> Iterator for BatchIter<'a> {
    type Item = TokenizedBatch;

    fn next(&mut self) -> Option<TokenizedBatch> {
        let batch_index = *self.batch_order.get(self.position)?;
        self.position += 1;
        Some(self.stream.batch(batch_index))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.batch_order.len() - self.position;
        (remaining, Some(remaining))
    }
}

impl<'a> ExactSizeIterator for BatchIter<'a> {}

/// # Training and validation streams
/// Also holds what is needed to build test streams with the same tokenization pipeline.
pub struct GlueDataLoaders {
    pub train: BatchStream,
    pub valid: BatchStream,
    vocab: CategoryVocab,
}

impl GlueDataLoaders {
    pub fn new(train: BatchStream, valid: BatchStream, vocab: CategoryVocab) -> GlueDataLoaders {
        GlueDataLoaders {
            train,
            valid,
            vocab,
        }
    }

    pub fn vocab(&self) -> &CategoryVocab {
        &self.vocab
    }

    /// Builds an unshuffled stream for unlabelled texts, every row labelled with the first
    /// category. Uses the tokenizer, maximum length, device and batch size of the validation
    /// stream.
    pub fn test_dl(&self, texts: Vec<TextInput>) -> Result<BatchStream, GlueError> {
        let labels = vec![self.vocab.first(); texts.len()];
        BatchStream::new(
            texts,
            labels,
            self.valid.tokenizer.clone(),
            StreamOptions {
                shuffle: false,
                ..self.valid.options
            },
        )
    }
}
