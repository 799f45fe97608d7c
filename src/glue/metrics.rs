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

//! # Evaluation metrics
//! Metrics take the raw scores of the model, of shape (*batch size*, *num_labels*), and the
//! integer labels of shape (*batch size*). The predicted class is the argmax of the scores.

use crate::common::error::GlueError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::convert::TryFrom;
use std::fmt;
use tch::{Device, Kind, Tensor};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
/// # Averaging mode for the F1 score
pub enum F1Average {
    /// F1 of the positive class (label 1). Only valid for binary labels.
    Binary,
    /// F1 computed from the counts summed over all classes
    Micro,
    /// Unweighted mean of the per-class F1 scores
    Macro,
    /// Mean of the per-class F1 scores weighted by class support
    Weighted,
}

impl fmt::Display for F1Average {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            F1Average::Binary => "binary",
            F1Average::Micro => "micro",
            F1Average::Macro => "macro",
            F1Average::Weighted => "weighted",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
/// # Evaluation metric of a GLUE task
pub enum Metric {
    Accuracy,
    F1(F1Average),
}

impl Metric {
    pub fn compute(&self, predictions: &Tensor, targets: &Tensor) -> Result<f64, GlueError> {
        match self {
            Metric::Accuracy => accuracy(predictions, targets),
            Metric::F1(average) => f1_score(predictions, targets, *average),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Accuracy => f.write_str("accuracy"),
            Metric::F1(average) => write!(f, "F1Score(average={})", average),
        }
    }
}

fn predicted_classes(predictions: &Tensor, targets: &Tensor) -> Result<(Tensor, Tensor), GlueError> {
    if predictions.dim() != 2 {
        return Err(GlueError::ValueError(format!(
            "expected scores of shape (batch size, num_labels), got {:?}",
            predictions.size()
        )));
    }
    let batch_size = predictions.size()[0];
    if targets.size() != [batch_size] {
        return Err(GlueError::ValueError(format!(
            "expected targets of shape [{}], got {:?}",
            batch_size,
            targets.size()
        )));
    }
    if batch_size == 0 {
        return Err(GlueError::ValueError(
            "cannot compute a metric over an empty batch".into(),
        ));
    }
    let predicted = predictions.argmax(-1, false).to_device(Device::Cpu);
    let targets = targets.to_device(Device::Cpu).to_kind(Kind::Int64);
    Ok((predicted, targets))
}

/// Fraction of rows whose argmax class matches the label.
pub fn accuracy(predictions: &Tensor, targets: &Tensor) -> Result<f64, GlueError> {
    let (predicted, targets) = predicted_classes(predictions, targets)?;
    Ok(predicted
        .eq_tensor(&targets)
        .to_kind(Kind::Float)
        .mean(Kind::Float)
        .double_value(&[]))
}

#[derive(Default, Clone, Copy)]
struct ClassCounts {
    true_positives: usize,
    false_positives: usize,
    false_negatives: usize,
}

impl ClassCounts {
    fn f1(&self) -> f64 {
        let denominator = 2 * self.true_positives + self.false_positives + self.false_negatives;
        if denominator == 0 {
            0.0
        } else {
            (2 * self.true_positives) as f64 / denominator as f64
        }
    }

    fn support(&self) -> usize {
        self.true_positives + self.false_negatives
    }
}

/// F1 score of the argmax predictions, zero where precision and recall are undefined.
pub fn f1_score(
    predictions: &Tensor,
    targets: &Tensor,
    average: F1Average,
) -> Result<f64, GlueError> {
    let (predicted, targets) = predicted_classes(predictions, targets)?;
    let predicted = Vec::<i64>::try_from(&predicted)?;
    let targets = Vec::<i64>::try_from(&targets)?;

    let labels: BTreeSet<i64> = predicted.iter().chain(targets.iter()).copied().collect();
    let counts = |class: i64| {
        predicted
            .iter()
            .zip(targets.iter())
            .fold(ClassCounts::default(), |mut counts, (&p, &t)| {
                match (p == class, t == class) {
                    (true, true) => counts.true_positives += 1,
                    (true, false) => counts.false_positives += 1,
                    (false, true) => counts.false_negatives += 1,
                    (false, false) => {}
                }
                counts
            })
    };

    Ok(match average {
        F1Average::Binary => {
            if labels.iter().any(|label| *label != 0 && *label != 1) {
                return Err(GlueError::ValueError(
                    "binary F1 requires labels in {0, 1}, use another averaging mode".into(),
                ));
            }
            counts(1).f1()
        }
        F1Average::Micro => {
            let total = labels
                .iter()
                .map(|label| counts(*label))
                .fold(ClassCounts::default(), |acc, c| ClassCounts {
                    true_positives: acc.true_positives + c.true_positives,
                    false_positives: acc.false_positives + c.false_positives,
                    false_negatives: acc.false_negatives + c.false_negatives,
                });
            total.f1()
        }
        F1Average::Macro => {
            let scores: Vec<f64> = labels.iter().map(|label| counts(*label).f1()).collect();
            scores.iter().sum::<f64>() / scores.len() as f64
        }
        F1Average::Weighted => {
            let per_class: Vec<ClassCounts> = labels.iter().map(|label| counts(*label)).collect();
            let total_support: usize = per_class.iter().map(ClassCounts::support).sum();
            if total_support == 0 {
                0.0
            } else {
                per_class
                    .iter()
                    .map(|c| c.f1() * c.support() as f64)
                    .sum::<f64>()
                    / total_support as f64
            }
        }
    })
}
