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

use crate::common::error::GlueError;
use rust_bert::pipelines::common::ModelType;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Reads a JSON configuration file. Failures are reported as model resolution errors since
/// configuration files always belong to a model.
pub fn read_config<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T, GlueError> {
    let path = path.as_ref();
    let f = File::open(path).map_err(|e| {
        GlueError::ModelResolution(format!("could not open {}: {}", path.display(), e))
    })?;
    let br = BufReader::new(f);
    serde_json::from_reader(br).map_err(|e| {
        GlueError::ModelResolution(format!("could not parse {}: {}", path.display(), e))
    })
}

#[derive(Debug, Deserialize)]
struct ArchitectureHeader {
    model_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenizerHeader {
    do_lower_case: Option<bool>,
}

/// Architecture declared by a model `config.json`. Only BERT and DistilBERT are supported.
/// Configurations without a `model_type` (original TensorFlow exports) fall back on the model
/// name: names containing `distilbert` are DistilBERT models, any other is a BERT model.
pub fn read_model_type<P: AsRef<Path>>(
    config_path: P,
    model_name: &str,
) -> Result<ModelType, GlueError> {
    let header: ArchitectureHeader = read_config(config_path)?;
    match header.model_type.as_deref() {
        Some("bert") => Ok(ModelType::Bert),
        Some("distilbert") => Ok(ModelType::DistilBert),
        Some(other) => Err(GlueError::ModelResolution(format!(
            "unsupported model type {}, expected bert or distilbert",
            other
        ))),
        None => {
            let model_type = model_type_from_name(model_name);
            log::debug!(
                "No model_type in the configuration of {}, using {:?}",
                model_name,
                model_type
            );
            Ok(model_type)
        }
    }
}

fn model_type_from_name(model_name: &str) -> ModelType {
    if model_name.to_lowercase().contains("distilbert") {
        ModelType::DistilBert
    } else {
        ModelType::Bert
    }
}

/// Lower casing flag of a `tokenizer_config.json`, if set.
pub fn read_lower_case<P: AsRef<Path>>(tokenizer_config_path: P) -> Result<Option<bool>, GlueError> {
    let header: TokenizerHeader = read_config(tokenizer_config_path)?;
    Ok(header.do_lower_case)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn model_type_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"model_type": "distilbert", "dim": 768}"#).unwrap();
        assert!(matches!(
            read_model_type(&path, "bert-base-uncased").unwrap(),
            ModelType::DistilBert
        ));

        fs::write(&path, r#"{"model_type": "gpt2"}"#).unwrap();
        assert!(matches!(
            read_model_type(&path, "gpt2"),
            Err(GlueError::ModelResolution(_))
        ));
    }

    #[test]
    fn missing_model_type_falls_back_on_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        //    prajjwal1/bert-tiny configuration
        fs::write(
            &path,
            r#"{"hidden_size": 128, "hidden_act": "gelu", "initializer_range": 0.02,
            "vocab_size": 30522, "hidden_dropout_prob": 0.1, "num_attention_heads": 2,
            "type_vocab_size": 2, "max_position_embeddings": 512, "num_hidden_layers": 2,
            "intermediate_size": 512, "attention_probs_dropout_prob": 0.1}"#,
        )
        .unwrap();
        assert!(matches!(
            read_model_type(&path, "prajjwal1/bert-tiny").unwrap(),
            ModelType::Bert
        ));
        assert!(matches!(
            read_model_type(&path, "my-org/DistilBERT-finetuned").unwrap(),
            ModelType::DistilBert
        ));
    }

    #[test]
    fn lower_case_is_optional() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokenizer_config.json");
        fs::write(&path, r#"{"model_max_length": 512}"#).unwrap();
        assert_eq!(read_lower_case(&path).unwrap(), None);
        fs::write(&path, r#"{"do_lower_case": false}"#).unwrap();
        assert_eq!(read_lower_case(&path).unwrap(), Some(false));
    }
}
