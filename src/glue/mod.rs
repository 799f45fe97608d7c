//! # GLUE benchmark tasks
//!
//! Dataset acquisition, batch preparation and classification models for the SST-2, MRPC and
//! RTE tasks of the [GLUE benchmark](https://gluebenchmark.com).
//!
//! - `data_manager`: session object loading the datasets and building train, validation and test batches
//! - `dataset`: raw examples, splits and dataset providers (remote download or local directory)
//! - `task`: task descriptors (text fields, label set and evaluation metrics)
//! - `tokenizer` and `batch`: fixed length tokenization and length-sorted batch streams
//! - `model`: compact or pretrained BERT and DistilBERT sequence classifiers
//! - `metrics`: accuracy and F1 score

pub mod batch;
pub mod data_manager;
pub mod dataset;
pub mod metrics;
pub mod model;
pub mod task;
pub mod tokenizer;
