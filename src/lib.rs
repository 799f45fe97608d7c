//! # GLUE fine-tuning data and models
//!
//! Data management and model construction for fine-tuning BERT style classifiers on the SST-2,
//! MRPC and RTE tasks of the GLUE benchmark. The crate relies on
//! [rust-bert](https://crates.io/crates/rust-bert) for the model architectures,
//! [rust_tokenizers](https://crates.io/crates/rust_tokenizers) for tokenization and
//! [tch-rs](https://crates.io/crates/tch) for tensors.
//!
//! ```no_run
//! # fn main() -> Result<(), glue_bert::GlueError> {
//! use glue_bert::glue::data_manager::{GlueDataConfig, GlueDataManager};
//! use glue_bert::glue::model::get_wrapped_model;
//!
//! let config = GlueDataConfig::new("sst2", "prajjwal1/bert-tiny");
//! let mut manager = GlueDataManager::new(config)?;
//! let loaders = manager.create_dataloaders(None, Some(128))?;
//! let wrapper = get_wrapped_model("prajjwal1/bert-tiny", "sst2", None, tch::Device::Cpu)?;
//! for batch in loaders.train.iter() {
//!     let logits = wrapper.forward_batch(&batch, true)?;
//!     assert_eq!(logits.size()[1], 2);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Downloads are cached under `~/.cache/.glue-bert`, or the directory set in the `GLUE_CACHE`
//! environment variable.

pub mod common;
pub mod glue;

pub use common::error::GlueError;
