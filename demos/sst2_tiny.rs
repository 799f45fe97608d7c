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

extern crate anyhow;

use glue_bert::glue::data_manager::{GlueDataConfig, GlueDataManager};
use glue_bert::glue::model::{count_parameters, get_wrapped_model};
use tch::nn::OptimizerConfig;
use tch::{nn, no_grad, Device, Tensor};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    //    Set-up data manager and model
    let device = Device::cuda_if_available();
    let config = GlueDataConfig {
        max_length: 64,
        train_batch_size: 16,
        device,
        ..GlueDataConfig::new("sst2", "prajjwal1/bert-tiny")
    };
    let mut manager = GlueDataManager::new(config)?;
    let metrics = manager.metrics().to_vec();
    let loaders = manager.create_dataloaders(None, Some(512))?;

    let wrapper = get_wrapped_model("prajjwal1/bert-tiny", "sst2", None, device)?;
    println!("{} trainable parameters", count_parameters(wrapper.model()));
    let mut optimizer = nn::AdamW::default().build(wrapper.model().var_store(), 1e-4)?;

    //    Fine-tune
    for epoch in 0..2 {
        for batch in loaders.train.iter() {
            let logits = wrapper.forward_batch(&batch, true)?;
            let loss = logits.cross_entropy_for_logits(&batch.labels);
            optimizer.backward_step(&loss);
        }

        let mut predictions = Vec::new();
        let mut targets = Vec::new();
        for batch in loaders.valid.iter() {
            let logits = no_grad(|| wrapper.forward_batch(&batch, false))?;
            predictions.push(logits);
            targets.push(batch.labels);
        }
        let predictions = Tensor::cat(&predictions, 0);
        let targets = Tensor::cat(&targets, 0);
        for metric in metrics.iter() {
            println!(
                "epoch {}: {} = {:.4}",
                epoch,
                metric,
                metric.compute(&predictions, &targets)?
            );
        }
    }
    Ok(())
}
