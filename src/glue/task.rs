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
use crate::glue::dataset::RawExample;
use crate::glue::metrics::{F1Average, Metric};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// # Supported GLUE tasks
pub enum GlueTask {
    /// Stanford Sentiment Treebank, binary sentiment of single sentences
    Sst2,
    /// Microsoft Research Paraphrase Corpus, paraphrase detection on sentence pairs
    Mrpc,
    /// Recognizing Textual Entailment on sentence pairs
    Rte,
}

impl GlueTask {
    pub const ALL: [GlueTask; 3] = [GlueTask::Sst2, GlueTask::Mrpc, GlueTask::Rte];

    pub fn name(&self) -> &'static str {
        match self {
            GlueTask::Sst2 => "sst2",
            GlueTask::Mrpc => "mrpc",
            GlueTask::Rte => "rte",
        }
    }

    pub fn descriptor(&self) -> TaskDescriptor {
        match self {
            GlueTask::Sst2 => TaskDescriptor {
                task: *self,
                text_fields: TextFields::Single("sentence"),
                num_labels: 2,
                label_names: &["negative", "positive"],
                metrics: vec![Metric::Accuracy],
            },
            GlueTask::Mrpc => TaskDescriptor {
                task: *self,
                text_fields: TextFields::Pair("sentence1", "sentence2"),
                num_labels: 2,
                label_names: &["not_equivalent", "equivalent"],
                metrics: vec![Metric::F1(F1Average::Binary), Metric::Accuracy],
            },
            GlueTask::Rte => TaskDescriptor {
                task: *self,
                text_fields: TextFields::Pair("sentence1", "sentence2"),
                num_labels: 2,
                label_names: &["entailment", "not_entailment"],
                metrics: vec![Metric::Accuracy],
            },
        }
    }
}

impl FromStr for GlueTask {
    type Err = GlueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sst2" => Ok(GlueTask::Sst2),
            "mrpc" => Ok(GlueTask::Mrpc),
            "rte" => Ok(GlueTask::Rte),
            other => Err(GlueError::UnsupportedTask(format!(
                "Task {} not supported. Use one of: sst2, mrpc, rte",
                other
            ))),
        }
    }
}

impl fmt::Display for GlueTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Label count used when building models: permissive, unknown tasks get 2 labels.
pub fn num_labels_for_task(task_name: &str) -> i64 {
    task_name
        .parse::<GlueTask>()
        .map(|task| task.descriptor().num_labels)
        .unwrap_or(2)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// # Names of the text fields read from each example
pub enum TextFields {
    Single(&'static str),
    Pair(&'static str, &'static str),
}

impl TextFields {
    pub fn arity(&self) -> usize {
        match self {
            TextFields::Single(_) => 1,
            TextFields::Pair(_, _) => 2,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
/// # Text extracted from an example, one sentence or a sentence pair
pub enum TextInput {
    Single(String),
    Pair(String, String),
}

impl TextInput {
    /// Character length used to order examples, summed over both sentences for pairs.
    pub fn text_length(&self) -> usize {
        match self {
            TextInput::Single(text) => text.chars().count(),
            TextInput::Pair(text_a, text_b) => text_a.chars().count() + text_b.chars().count(),
        }
    }
}

#[derive(Clone, Debug)]
/// # Static description of a GLUE task
/// Holds the text field layout, the number of labels and the evaluation metrics.
pub struct TaskDescriptor {
    pub task: GlueTask,
    pub text_fields: TextFields,
    pub num_labels: i64,
    pub label_names: &'static [&'static str],
    pub metrics: Vec<Metric>,
}

impl TaskDescriptor {
    /// Reads the text input of an example following the task field layout.
    pub fn extract(&self, example: &RawExample) -> Result<TextInput, GlueError> {
        Ok(match self.text_fields {
            TextFields::Single(field) => TextInput::Single(example.field(field)?.to_string()),
            TextFields::Pair(field_a, field_b) => TextInput::Pair(
                example.field(field_a)?.to_string(),
                example.field(field_b)?.to_string(),
            ),
        })
    }

    /// Reads text input and label of a labelled example.
    pub fn extract_labelled(&self, example: &RawExample) -> Result<(TextInput, i64), GlueError> {
        let text = self.extract(example)?;
        let label = example.label.ok_or_else(|| {
            GlueError::ValueError(format!(
                "missing label for a {} training or validation example",
                self.task
            ))
        })?;
        Ok((text, label))
    }

    /// Parses a label given either as an integer or as one of the task label names.
    pub fn parse_label(&self, value: &str) -> Result<i64, GlueError> {
        let value = value.trim();
        if let Ok(label) = value.parse::<i64>() {
            return Ok(label);
        }
        self.label_names
            .iter()
            .position(|name| *name == value)
            .map(|position| position as i64)
            .ok_or_else(|| {
                GlueError::ValueError(format!("invalid label {} for task {}", value, self.task))
            })
    }
}
