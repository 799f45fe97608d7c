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

use rust_bert::RustBertError;
use rust_tokenizers::error::TokenizerError;
use tch::TchError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GlueError {
    #[error("Unsupported task error: {0}")]
    UnsupportedTask(String),

    #[error("Model resolution error: {0}")]
    ModelResolution(String),

    #[error("Data unavailable error: {0}")]
    DataUnavailable(String),

    #[error("Precedence error: {0}")]
    Precedence(String),

    #[error("No test data available")]
    NoTestData,

    #[error("Invalid configuration error: {0}")]
    InvalidConfiguration(String),

    #[error("Value error: {0}")]
    ValueError(String),

    #[error("Tch tensor error: {0}")]
    TchError(String),
}

impl From<std::io::Error> for GlueError {
    fn from(error: std::io::Error) -> Self {
        GlueError::DataUnavailable(error.to_string())
    }
}

impl From<csv::Error> for GlueError {
    fn from(error: csv::Error) -> Self {
        GlueError::DataUnavailable(error.to_string())
    }
}

impl From<cached_path::Error> for GlueError {
    fn from(error: cached_path::Error) -> Self {
        GlueError::DataUnavailable(error.to_string())
    }
}

impl From<RustBertError> for GlueError {
    fn from(error: RustBertError) -> Self {
        GlueError::ModelResolution(error.to_string())
    }
}

impl From<TokenizerError> for GlueError {
    fn from(error: TokenizerError) -> Self {
        GlueError::ModelResolution(error.to_string())
    }
}

impl From<TchError> for GlueError {
    fn from(error: TchError) -> Self {
        GlueError::TchError(error.to_string())
    }
}
