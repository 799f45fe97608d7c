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

//! # Sequence classification models for GLUE tasks
//!
//! A model name either matches one of the compact BERT architectures, built from scratch with
//! random weights, or refers to a pretrained checkpoint (local directory or Hugging Face hub
//! repository holding `config.json` and `rust_model.ot` or `model.safetensors`). BERT and
//! DistilBERT checkpoints are supported.
//!
//! ```no_run
//! # fn main() -> Result<(), glue_bert::GlueError> {
//! use glue_bert::glue::model::{count_parameters, get_wrapped_model};
//! use tch::Device;
//!
//! let wrapper = get_wrapped_model("prajjwal1/bert-tiny", "sst2", None, Device::Cpu)?;
//! println!("{} trainable parameters", count_parameters(wrapper.model()));
//! # Ok(())
//! # }
//! ```

use crate::common::config::{read_config, read_model_type};
use crate::common::error::GlueError;
use crate::common::resources::ModelLocation;
use crate::glue::batch::{NamedTensors, TokenizedBatch};
use crate::glue::task::num_labels_for_task;
use rust_bert::bert::{BertConfig, BertForSequenceClassification};
use rust_bert::distilbert::{DistilBertConfig, DistilBertModelClassifier};
use rust_bert::pipelines::common::ModelType;
use std::collections::HashMap;
use tch::{nn, Device, Tensor};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// # Compact BERT architecture trained from scratch
pub struct CompactArchitecture {
    pub name: &'static str,
    pub hidden_size: i64,
    pub num_hidden_layers: i64,
    pub num_attention_heads: i64,
    pub intermediate_size: i64,
}

pub const COMPACT_ARCHITECTURES: [CompactArchitecture; 3] = [
    CompactArchitecture {
        name: "prajjwal1/bert-tiny",
        hidden_size: 128,
        num_hidden_layers: 2,
        num_attention_heads: 2,
        intermediate_size: 512,
    },
    CompactArchitecture {
        name: "prajjwal1/bert-mini",
        hidden_size: 256,
        num_hidden_layers: 4,
        num_attention_heads: 4,
        intermediate_size: 1024,
    },
    CompactArchitecture {
        name: "prajjwal1/bert-small",
        hidden_size: 512,
        num_hidden_layers: 4,
        num_attention_heads: 8,
        intermediate_size: 2048,
    },
];

impl CompactArchitecture {
    pub fn from_name(model_name: &str) -> Option<CompactArchitecture> {
        COMPACT_ARCHITECTURES
            .iter()
            .find(|architecture| architecture.name == model_name)
            .copied()
    }

    /// BERT configuration of the architecture, with dropout 0.1 on hidden and attention
    /// probabilities and BERT base defaults for the vocabulary and positions.
    pub fn config(&self, num_labels: i64) -> BertConfig {
        let (id2label, label2id) = label_mapping(num_labels);
        BertConfig {
            hidden_size: self.hidden_size,
            num_hidden_layers: self.num_hidden_layers,
            num_attention_heads: self.num_attention_heads,
            intermediate_size: self.intermediate_size,
            hidden_dropout_prob: 0.1,
            attention_probs_dropout_prob: 0.1,
            id2label: Some(id2label),
            label2id: Some(label2id),
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// # Resolved model reference
pub enum ModelSpec {
    Compact(CompactArchitecture),
    Pretrained(String),
}

impl ModelSpec {
    /// Compact architectures take precedence, any other name is a pretrained reference.
    pub fn resolve(model_name: &str) -> ModelSpec {
        match CompactArchitecture::from_name(model_name) {
            Some(architecture) => ModelSpec::Compact(architecture),
            None => ModelSpec::Pretrained(model_name.to_string()),
        }
    }
}

fn label_mapping(num_labels: i64) -> (HashMap<i64, String>, HashMap<String, i64>) {
    let id2label = (0..num_labels)
        .map(|id| (id, format!("LABEL_{}", id)))
        .collect::<HashMap<_, _>>();
    let label2id = id2label
        .iter()
        .map(|(id, label)| (label.clone(), *id))
        .collect();
    (id2label, label2id)
}

/// # Architecture specific classification model
pub enum SequenceClassifier {
    Bert(BertForSequenceClassification),
    DistilBert(DistilBertModelClassifier),
}

impl SequenceClassifier {
    pub fn model_type(&self) -> ModelType {
        match self {
            SequenceClassifier::Bert(_) => ModelType::Bert,
            SequenceClassifier::DistilBert(_) => ModelType::DistilBert,
        }
    }

    /// Raw classification scores of shape (*batch size*, *num_labels*). Segment ids are only
    /// given to architectures using them.
    pub fn forward_t(&self, input: &ModelInput<'_>, train: bool) -> Result<Tensor, GlueError> {
        Ok(match self {
            SequenceClassifier::Bert(model) => {
                model
                    .forward_t(
                        Some(input.input_ids),
                        Some(input.attention_mask),
                        input.token_type_ids,
                        None,
                        None,
                        train,
                    )
                    .logits
            }
            SequenceClassifier::DistilBert(model) => {
                model
                    .forward_t(
                        Some(input.input_ids),
                        Some(input.attention_mask),
                        None,
                        train,
                    )?
                    .logits
            }
        })
    }
}

/// # Classification model and its variables
pub struct GlueModel {
    var_store: nn::VarStore,
    classifier: SequenceClassifier,
    spec: ModelSpec,
    num_labels: i64,
}

impl GlueModel {
    /// Builds a randomly initialized compact BERT classifier.
    pub fn compact(
        architecture: CompactArchitecture,
        num_labels: i64,
        device: Device,
    ) -> Result<GlueModel, GlueError> {
        let var_store = nn::VarStore::new(device);
        let config = architecture.config(num_labels);
        let model = BertForSequenceClassification::new(var_store.root(), &config)?;
        let classifier = SequenceClassifier::Bert(model);
        log::info!(
            "Built {} from scratch ({} layers, hidden size {}, {} labels)",
            architecture.name,
            architecture.num_hidden_layers,
            architecture.hidden_size,
            num_labels
        );
        Ok(GlueModel {
            var_store,
            classifier,
            spec: ModelSpec::Compact(architecture),
            num_labels,
        })
    }

    /// Loads a BERT or DistilBERT checkpoint with a classification head of `num_labels`
    /// outputs. Variables missing from the checkpoint (typically the head) keep their random
    /// initialization.
    pub fn pretrained(
        model_name: &str,
        num_labels: i64,
        device: Device,
    ) -> Result<GlueModel, GlueError> {
        let location = ModelLocation::from_name(model_name);
        let config_path = location.get_local_path("config.json")?;
        let model_type = read_model_type(&config_path, model_name)?;
        let weights_path = location.get_local_path("rust_model.ot").or_else(|e| {
            log::debug!("{}, trying safetensors weights", e);
            location.get_local_path("model.safetensors")
        })?;

        let (id2label, label2id) = label_mapping(num_labels);
        let mut var_store = nn::VarStore::new(device);
        let classifier = match model_type {
            ModelType::Bert => {
                let mut config: BertConfig = read_config(&config_path)?;
                config.id2label = Some(id2label);
                config.label2id = Some(label2id);
                SequenceClassifier::Bert(BertForSequenceClassification::new(
                    var_store.root(),
                    &config,
                )?)
            }
            ModelType::DistilBert => {
                let mut config: DistilBertConfig = read_config(&config_path)?;
                config.id2label = Some(id2label);
                config.label2id = Some(label2id);
                SequenceClassifier::DistilBert(DistilBertModelClassifier::new(
                    var_store.root(),
                    &config,
                )?)
            }
            other => {
                return Err(GlueError::ModelResolution(format!(
                    "unsupported model type {:?}",
                    other
                )));
            }
        };

        let missing = var_store.load_partial(&weights_path).map_err(|e| {
            GlueError::ModelResolution(format!(
                "incompatible checkpoint {}: {}",
                weights_path.display(),
                e
            ))
        })?;
        if !missing.is_empty() {
            log::warn!(
                "Weights not found in the {} checkpoint and newly initialized: {}",
                location,
                missing.join(", ")
            );
        }
        log::info!("Loaded pretrained {:?} model {}", model_type, location);

        Ok(GlueModel {
            var_store,
            classifier,
            spec: ModelSpec::Pretrained(model_name.to_string()),
            num_labels,
        })
    }

    pub fn var_store(&self) -> &nn::VarStore {
        &self.var_store
    }

    pub fn var_store_mut(&mut self) -> &mut nn::VarStore {
        &mut self.var_store
    }

    pub fn classifier(&self) -> &SequenceClassifier {
        &self.classifier
    }

    pub fn model_type(&self) -> ModelType {
        self.classifier.model_type()
    }

    pub fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    pub fn num_labels(&self) -> i64 {
        self.num_labels
    }
}

/// Builds the classification model for `model_name`. The label count defaults to the one of
/// the task, or 2 for tasks outside of the supported set.
pub fn get_pretrained_model(
    model_name: &str,
    task_name: &str,
    num_labels: Option<i64>,
    device: Device,
) -> Result<GlueModel, GlueError> {
    let num_labels = num_labels.unwrap_or_else(|| num_labels_for_task(task_name));
    if num_labels < 1 {
        return Err(GlueError::InvalidConfiguration(format!(
            "num_labels must be strictly positive, got {}",
            num_labels
        )));
    }
    match ModelSpec::resolve(model_name) {
        ModelSpec::Compact(architecture) => GlueModel::compact(architecture, num_labels, device),
        ModelSpec::Pretrained(name) => GlueModel::pretrained(&name, num_labels, device),
    }
}

/// Number of parameters requiring gradients.
pub fn count_parameters(model: &GlueModel) -> usize {
    model
        .var_store
        .trainable_variables()
        .iter()
        .filter(|tensor| tensor.requires_grad())
        .map(Tensor::numel)
        .sum()
}

/// # Model inputs
/// Canonical batch record given to the models.
pub struct ModelInput<'a> {
    pub input_ids: &'a Tensor,
    pub attention_mask: &'a Tensor,
    pub token_type_ids: Option<&'a Tensor>,
}

impl<'a> ModelInput<'a> {
    /// Reads `input_ids`, `attention_mask` and the optional `token_type_ids` by name.
    pub fn from_named(named: &'a NamedTensors) -> Result<ModelInput<'a>, GlueError> {
        let required = |name: &str| {
            named
                .get(name)
                .ok_or_else(|| GlueError::ValueError(format!("missing model input {}", name)))
        };
        Ok(ModelInput {
            input_ids: required("input_ids")?,
            attention_mask: required("attention_mask")?,
            token_type_ids: named.get("token_type_ids"),
        })
    }
}

impl<'a> From<&'a TokenizedBatch> for ModelInput<'a> {
    fn from(batch: &'a TokenizedBatch) -> ModelInput<'a> {
        ModelInput {
            input_ids: &batch.input_ids,
            attention_mask: &batch.attention_mask,
            token_type_ids: batch.token_type_ids.as_ref(),
        }
    }
}

/// # Loosely shaped model inputs
/// Either a map of named tensors or a sequence made of a single such map.
pub enum BatchInput<'a> {
    Named(&'a NamedTensors),
    Sequence(&'a [NamedTensors]),
}

impl<'a> BatchInput<'a> {
    pub fn normalize(self) -> Result<ModelInput<'a>, GlueError> {
        match self {
            BatchInput::Named(named) => ModelInput::from_named(named),
            BatchInput::Sequence([named]) => ModelInput::from_named(named),
            BatchInput::Sequence(sequence) => Err(GlueError::ValueError(format!(
                "expected a single map of named tensors, got a sequence of {}",
                sequence.len()
            ))),
        }
    }
}

/// # Wrapper exposing a single forward pass returning raw scores
pub struct ModelWrapper {
    model: GlueModel,
}

impl ModelWrapper {
    pub fn new(model: GlueModel) -> ModelWrapper {
        ModelWrapper { model }
    }

    pub fn model(&self) -> &GlueModel {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut GlueModel {
        &mut self.model
    }

    pub fn into_inner(self) -> GlueModel {
        self.model
    }

    /// Scores of shape (*batch size*, *num_labels*). Hidden states, attentions and any other
    /// model output are dropped.
    pub fn forward_t(&self, input: ModelInput<'_>, train: bool) -> Result<Tensor, GlueError> {
        self.model.classifier.forward_t(&input, train)
    }

    pub fn forward_batch(&self, batch: &TokenizedBatch, train: bool) -> Result<Tensor, GlueError> {
        self.forward_t(ModelInput::from(batch), train)
    }

    pub fn forward_named(&self, input: BatchInput<'_>, train: bool) -> Result<Tensor, GlueError> {
        self.forward_t(input.normalize()?, train)
    }
}

/// Builds and wraps the classification model for `model_name`.
pub fn get_wrapped_model(
    model_name: &str,
    task_name: &str,
    num_labels: Option<i64>,
    device: Device,
) -> Result<ModelWrapper, GlueError> {
    Ok(ModelWrapper::new(get_pretrained_model(
        model_name, task_name, num_labels, device,
    )?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tch::{no_grad, Kind};

    const TINY_DISTILBERT_CONFIG: &str = r#"{
        "model_type": "distilbert", "activation": "gelu", "attention_dropout": 0.1, "dim": 32,
        "dropout": 0.1, "hidden_dim": 64, "initializer_range": 0.02,
        "max_position_embeddings": 64, "n_heads": 2, "n_layers": 1, "qa_dropout": 0.1,
        "seq_classif_dropout": 0.2, "sinusoidal_pos_embds": false, "tie_weights_": false,
        "vocab_size": 100
    }"#;

    fn sample_inputs() -> (Tensor, Tensor, Tensor) {
        let input_ids = Tensor::from_slice(&[2i64, 13, 14, 15, 3, 0, 2, 6, 7, 3, 0, 0]).view((2, 6));
        let attention_mask =
            Tensor::from_slice(&[1i64, 1, 1, 1, 1, 0, 1, 1, 1, 1, 0, 0]).view((2, 6));
        let token_type_ids = Tensor::zeros(&[2, 6], (Kind::Int64, Device::Cpu));
        (input_ids, attention_mask, token_type_ids)
    }

    fn scores(wrapper: &ModelWrapper, with_token_type_ids: bool) -> anyhow::Result<Tensor> {
        let (input_ids, attention_mask, token_type_ids) = sample_inputs();
        let input = ModelInput {
            input_ids: &input_ids,
            attention_mask: &attention_mask,
            token_type_ids: if with_token_type_ids {
                Some(&token_type_ids)
            } else {
                None
            },
        };
        Ok(no_grad(|| wrapper.forward_t(input, false))?)
    }

    /// Saves a randomly initialized bert-tiny classifier and its configuration to `dir`.
    fn save_bert_checkpoint(dir: &Path, num_labels: i64) -> anyhow::Result<GlueModel> {
        let model = GlueModel::compact(COMPACT_ARCHITECTURES[0], num_labels, Device::Cpu)?;
        let mut config = serde_json::to_value(COMPACT_ARCHITECTURES[0].config(num_labels))?;
        config["model_type"] = serde_json::Value::from("bert");
        fs::write(dir.join("config.json"), serde_json::to_string(&config)?)?;
        model.var_store().save(dir.join("rust_model.ot"))?;
        Ok(model)
    }

    #[test]
    fn compact_names_resolve_to_architectures() {
        match ModelSpec::resolve("prajjwal1/bert-mini") {
            ModelSpec::Compact(architecture) => {
                assert_eq!(architecture.hidden_size, 256);
                assert_eq!(architecture.num_hidden_layers, 4);
                assert_eq!(architecture.num_attention_heads, 4);
                assert_eq!(architecture.intermediate_size, 1024);
            }
            other => panic!("unexpected spec {:?}", other),
        }
        assert_eq!(
            ModelSpec::resolve("bert-base-uncased"),
            ModelSpec::Pretrained("bert-base-uncased".to_string())
        );
    }

    #[test]
    fn compact_config_sets_dropout_and_labels() {
        let config = COMPACT_ARCHITECTURES[0].config(3);
        assert_eq!(config.hidden_dropout_prob, 0.1);
        assert_eq!(config.attention_probs_dropout_prob, 0.1);
        assert_eq!(config.id2label.unwrap().len(), 3);
        assert_eq!(config.label2id.unwrap()["LABEL_2"], 2);
    }

    #[test]
    fn sequence_inputs_must_hold_one_map() {
        let named = NamedTensors::new();
        assert!(BatchInput::Sequence(&[]).normalize().is_err());
        assert!(BatchInput::Named(&named).normalize().is_err());

        let mut named = NamedTensors::new();
        named.insert("input_ids".into(), Tensor::zeros(&[1, 4], (Kind::Int64, Device::Cpu)));
        named.insert("attention_mask".into(), Tensor::ones(&[1, 4], (Kind::Int64, Device::Cpu)));
        let sequence = vec![named];
        let input = BatchInput::Sequence(&sequence).normalize().unwrap();
        assert!(input.token_type_ids.is_none());
    }

    fn bert_parameter_count(architecture: &CompactArchitecture, num_labels: i64) -> i64 {
        let config = architecture.config(num_labels);
        let hidden = config.hidden_size;
        let intermediate = config.intermediate_size;
        let embeddings =
            (config.vocab_size + config.max_position_embeddings + config.type_vocab_size) * hidden
                + 2 * hidden;
        let attention = 4 * (hidden * hidden + hidden) + 2 * hidden;
        let feed_forward =
            (hidden * intermediate + intermediate) + (intermediate * hidden + hidden) + 2 * hidden;
        let pooler = hidden * hidden + hidden;
        let classifier = hidden * num_labels + num_labels;
        embeddings + config.num_hidden_layers * (attention + feed_forward) + pooler + classifier
    }

    #[test]
    fn compact_parameter_count_matches_layer_shapes() -> anyhow::Result<()> {
        let cases = [(COMPACT_ARCHITECTURES[0], 2), (COMPACT_ARCHITECTURES[1], 3)];
        for (architecture, num_labels) in cases.iter() {
            let model = GlueModel::compact(*architecture, *num_labels, Device::Cpu)?;
            assert_eq!(
                count_parameters(&model) as i64,
                bert_parameter_count(architecture, *num_labels)
            );
        }
        Ok(())
    }

    #[test]
    fn scores_have_one_column_per_label() -> anyhow::Result<()> {
        let wrapper = get_wrapped_model("prajjwal1/bert-tiny", "mrpc", Some(3), Device::Cpu)?;
        let input_ids = Tensor::from_slice(&[101i64, 2023, 2003, 102, 0, 0]).view((1, 6));
        let attention_mask = Tensor::from_slice(&[1i64, 1, 1, 1, 0, 0]).view((1, 6));
        let token_type_ids = Tensor::zeros(&[1, 6], (Kind::Int64, Device::Cpu));

        let mut named = NamedTensors::new();
        named.insert("input_ids".into(), input_ids.shallow_clone());
        named.insert("attention_mask".into(), attention_mask.shallow_clone());
        let without_segments = no_grad(|| wrapper.forward_named(BatchInput::Named(&named), false))?;

        named.insert("token_type_ids".into(), token_type_ids);
        let sequence = vec![named];
        let with_segments =
            no_grad(|| wrapper.forward_named(BatchInput::Sequence(&sequence), false))?;

        assert_eq!(without_segments.size(), vec![1, 3]);
        assert_eq!(with_segments.size(), vec![1, 3]);
        //    zero segment ids are the default of BERT models
        assert!(without_segments.allclose(&with_segments, 1e-5, 1e-6, false));
        Ok(())
    }

    #[test]
    fn frozen_model_has_no_trainable_parameters() -> anyhow::Result<()> {
        let mut model = get_pretrained_model("prajjwal1/bert-tiny", "rte", None, Device::Cpu)?;
        assert!(count_parameters(&model) > 0);
        model.var_store_mut().freeze();
        assert_eq!(count_parameters(&model), 0);
        Ok(())
    }

    #[test]
    fn unknown_task_defaults_to_two_labels() -> anyhow::Result<()> {
        let wrapper = get_wrapped_model("prajjwal1/bert-tiny", "cola", None, Device::Cpu)?;
        assert_eq!(wrapper.model().num_labels(), 2);
        let input_ids = Tensor::ones(&[3, 8], (Kind::Int64, Device::Cpu));
        let attention_mask = Tensor::ones(&[3, 8], (Kind::Int64, Device::Cpu));
        let scores = no_grad(|| {
            wrapper.forward_t(
                ModelInput {
                    input_ids: &input_ids,
                    attention_mask: &attention_mask,
                    token_type_ids: None,
                },
                false,
            )
        })?;
        assert_eq!(scores.size(), vec![3, 2]);
        Ok(())
    }

    #[test]
    fn pretrained_bert_checkpoint_is_reloaded() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let saved = ModelWrapper::new(save_bert_checkpoint(dir.path(), 3)?);
        let model_name = dir.path().to_str().unwrap();

        let loaded = get_wrapped_model(model_name, "mrpc", Some(3), Device::Cpu)?;
        assert_eq!(loaded.model().spec(), &ModelSpec::Pretrained(model_name.to_string()));
        assert!(matches!(loaded.model().model_type(), ModelType::Bert));
        assert_eq!(loaded.model().num_labels(), 3);

        let expected = scores(&saved, true)?;
        let output = scores(&loaded, true)?;
        assert_eq!(output.size(), vec![2, 3]);
        assert!(output.allclose(&expected, 1e-5, 1e-6, false));
        Ok(())
    }

    #[test]
    fn missing_classification_head_is_initialized() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        save_bert_checkpoint(dir.path(), 2)?;
        let weights_path = dir.path().join("rust_model.ot");
        let encoder_weights = Tensor::load_multi(&weights_path)?
            .into_iter()
            .filter(|(name, _)| !name.starts_with("classifier"))
            .collect::<Vec<_>>();
        Tensor::save_multi(&encoder_weights, &weights_path)?;

        let wrapper = get_wrapped_model(dir.path().to_str().unwrap(), "rte", Some(4), Device::Cpu)?;
        assert_eq!(scores(&wrapper, false)?.size(), vec![2, 4]);
        Ok(())
    }

    #[test]
    fn incompatible_or_missing_checkpoints_fail_resolution() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        save_bert_checkpoint(dir.path(), 3)?;
        let model_name = dir.path().to_str().unwrap();
        assert!(matches!(
            get_pretrained_model(model_name, "sst2", Some(5), Device::Cpu),
            Err(GlueError::ModelResolution(_))
        ));

        fs::remove_file(dir.path().join("rust_model.ot"))?;
        assert!(matches!(
            get_pretrained_model(model_name, "sst2", Some(3), Device::Cpu),
            Err(GlueError::ModelResolution(_))
        ));

        fs::write(dir.path().join("config.json"), r#"{"model_type": "gpt2"}"#)?;
        assert!(matches!(
            get_pretrained_model(model_name, "sst2", None, Device::Cpu),
            Err(GlueError::ModelResolution(_))
        ));
        Ok(())
    }

    #[test]
    fn pretrained_distilbert_ignores_token_type_ids() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut config: DistilBertConfig = serde_json::from_str(TINY_DISTILBERT_CONFIG)?;
        let (id2label, label2id) = label_mapping(2);
        config.id2label = Some(id2label);
        config.label2id = Some(label2id);
        let var_store = nn::VarStore::new(Device::Cpu);
        DistilBertModelClassifier::new(var_store.root(), &config)?;
        var_store.save(dir.path().join("rust_model.ot"))?;
        fs::write(dir.path().join("config.json"), TINY_DISTILBERT_CONFIG)?;

        let wrapper = get_wrapped_model(dir.path().to_str().unwrap(), "sst2", None, Device::Cpu)?;
        assert!(matches!(wrapper.model().model_type(), ModelType::DistilBert));
        let with_segments = scores(&wrapper, true)?;
        let without_segments = scores(&wrapper, false)?;
        assert_eq!(with_segments.size(), vec![2, 2]);
        assert!(with_segments.allclose(&without_segments, 1e-5, 1e-6, false));
        Ok(())
    }

    #[test]
    fn invalid_label_count_is_rejected() {
        assert!(matches!(
            get_pretrained_model("prajjwal1/bert-tiny", "sst2", Some(0), Device::Cpu),
            Err(GlueError::InvalidConfiguration(_))
        ));
    }
}
