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

//! # Tokenization stage of the batch pipeline
//! Wraps a `BertTokenizer` (used by both BERT and DistilBERT checkpoints) and produces inputs
//! padded or truncated to exactly `max_length` tokens.

use crate::common::config::{read_lower_case, read_model_type};
use crate::common::error::GlueError;
use crate::common::resources::ModelLocation;
use crate::glue::task::TextInput;
use rust_bert::pipelines::common::ModelType;
use rust_tokenizers::tokenizer::{BertTokenizer, Tokenizer, TruncationStrategy};
use rust_tokenizers::vocab::Vocab;
use rust_tokenizers::TokenizedInput;
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Eq)]
/// # Tokenized example of fixed length
pub struct EncodedInput {
    pub input_ids: Vec<i64>,
    pub attention_mask: Vec<i64>,
    pub token_type_ids: Vec<i64>,
}

/// # Tokenizer for GLUE text inputs
pub struct GlueTokenizer {
    tokenizer: BertTokenizer,
    pad_id: i64,
    return_token_type_ids: bool,
}

impl GlueTokenizer {
    /// Wraps an existing tokenizer. `return_token_type_ids` should be false for architectures
    /// without segment embeddings (e.g. DistilBERT).
    pub fn new(tokenizer: BertTokenizer, return_token_type_ids: bool) -> GlueTokenizer {
        let vocab = tokenizer.vocab();
        let pad_id = vocab.token_to_id(vocab.get_pad_value());
        GlueTokenizer {
            tokenizer,
            pad_id,
            return_token_type_ids,
        }
    }

    pub fn from_file<P: AsRef<Path>>(
        vocab_path: P,
        lower_case: bool,
        return_token_type_ids: bool,
    ) -> Result<GlueTokenizer, GlueError> {
        let vocab_path = vocab_path.as_ref();
        let vocab_path = vocab_path.to_str().ok_or_else(|| {
            GlueError::ModelResolution(format!("invalid vocabulary path {}", vocab_path.display()))
        })?;
        let tokenizer = BertTokenizer::from_file(vocab_path, lower_case, lower_case)?;
        Ok(GlueTokenizer::new(tokenizer, return_token_type_ids))
    }

    /// Resolves the tokenizer of a model from a local directory or a hub repository. The
    /// vocabulary and `config.json` are required, `tokenizer_config.json` is read if present
    /// and lower casing is assumed otherwise.
    pub fn from_pretrained(model_name: &str) -> Result<GlueTokenizer, GlueError> {
        let location = ModelLocation::from_name(model_name);
        let vocab_path = location.get_local_path("vocab.txt")?;
        let model_type = read_model_type(location.get_local_path("config.json")?, model_name)?;
        let lower_case = match location
            .get_local_path("tokenizer_config.json")
            .and_then(read_lower_case)
        {
            Ok(value) => value.unwrap_or(true),
            Err(e) => {
                log::debug!("No tokenizer configuration for {}: {}", location, e);
                true
            }
        };
        log::info!(
            "Loaded {:?} tokenizer for {} (lower case: {})",
            model_type,
            location,
            lower_case
        );
        GlueTokenizer::from_file(
            vocab_path,
            lower_case,
            matches!(model_type, ModelType::Bert),
        )
    }

    pub fn pad_id(&self) -> i64 {
        self.pad_id
    }

    pub fn returns_token_type_ids(&self) -> bool {
        self.return_token_type_ids
    }

    /// Tokenizes a batch of text inputs, truncating the longest sequence first and padding
    /// every row to exactly `max_length` tokens.
    pub fn encode_batch(&self, texts: &[TextInput], max_length: usize) -> Vec<EncodedInput> {
        texts
            .iter()
            .map(|text| {
                let tokenized = match text {
                    TextInput::Single(text) => self.tokenizer.encode(
                        text,
                        None,
                        max_length,
                        &TruncationStrategy::LongestFirst,
                        0,
                    ),
                    TextInput::Pair(text_a, text_b) => self.tokenizer.encode(
                        text_a,
                        Some(text_b.as_str()),
                        max_length,
                        &TruncationStrategy::LongestFirst,
                        0,
                    ),
                };
                self.pad_to_length(tokenized, max_length)
            })
            .collect()
    }

    fn pad_to_length(&self, tokenized: TokenizedInput, max_length: usize) -> EncodedInput {
        let mut input_ids = tokenized.token_ids;
        input_ids.truncate(max_length);
        let mut token_type_ids = tokenized
            .segment_ids
            .iter()
            .map(|segment_id| i64::from(*segment_id))
            .collect::<Vec<i64>>();
        token_type_ids.truncate(max_length);

        let mut attention_mask = vec![1; input_ids.len()];
        attention_mask.resize(max_length, 0);
        input_ids.resize(max_length, self.pad_id);
        token_type_ids.resize(max_length, 0);

        EncodedInput {
            input_ids,
            attention_mask,
            token_type_ids,
        }
    }
}
