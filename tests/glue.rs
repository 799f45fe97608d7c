use glue_bert::glue::data_manager::{GlueDataConfig, GlueDataManager, SessionState};
use glue_bert::glue::dataset::{
    DatasetProvider, GlueDatasets, GlueDirectoryProvider, GlueRemoteProvider, RawExample, Split,
};
use glue_bert::glue::metrics::Metric;
use glue_bert::glue::model::{count_parameters, get_wrapped_model, BatchInput};
use glue_bert::glue::task::{GlueTask, TextInput};
use glue_bert::glue::tokenizer::GlueTokenizer;
use glue_bert::GlueError;
use std::fs;
use std::path::Path;
use tch::{no_grad, Device};

const VOCAB: &[&str] = &[
    "[PAD]", "[UNK]", "[CLS]", "[SEP]", "[MASK]", "a", "man", "is", "playing", "guitar", ".",
    "person", "plays", "the", "movie", "was", "great", "bad", "film", "not", "bank", "sold",
    "shares", "company", "profit",
];

fn tokenizer(dir: &Path, return_token_type_ids: bool) -> anyhow::Result<GlueTokenizer> {
    let path = dir.join("vocab.txt");
    fs::write(&path, VOCAB.join("\n"))?;
    Ok(GlueTokenizer::from_file(&path, true, return_token_type_ids)?)
}

fn sst2_example(sentence: &str, label: i64) -> RawExample {
    RawExample::new(Some(label)).with_field("sentence", sentence)
}

fn write_glue_directory(root: &Path) -> anyhow::Result<()> {
    let sst2 = root.join("SST-2");
    fs::create_dir_all(&sst2)?;
    fs::write(
        sst2.join("train.tsv"),
        "sentence\tlabel\nthe movie was great \t1\nthe film was bad \t0\na great film \t1\n",
    )?;
    fs::write(sst2.join("dev.tsv"), "sentence\tlabel\nnot a great movie \t0\n")?;
    fs::write(
        sst2.join("test.tsv"),
        "index\tsentence\n0\tthe movie\n1\ta man is playing guitar .\n",
    )?;

    let mrpc = root.join("MRPC");
    fs::create_dir_all(&mrpc)?;
    let header = "Quality\t#1 ID\t#2 ID\t#1 String\t#2 String\n";
    fs::write(
        mrpc.join("train.tsv"),
        format!(
            "{}1\t1\t2\tThe bank sold shares.\tShares were sold by the bank.\n0\t3\t4\tThe company made a profit.\tThe man plays guitar.\n",
            header
        ),
    )?;
    fs::write(
        mrpc.join("dev.tsv"),
        format!("{}1\t5\t6\tA man is playing guitar.\tA person plays a guitar.\n", header),
    )?;
    Ok(())
}

#[test]
fn sst2_tiny_model_end_to_end() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let config = GlueDataConfig {
        max_length: 64,
        train_batch_size: 2,
        ..GlueDataConfig::new("sst2", "prajjwal1/bert-tiny")
    };
    let mut manager = GlueDataManager::new_with_tokenizer(config, tokenizer(dir.path(), true)?)?;

    let sentences = ["the movie was bad", "a great film", "not great", "the movie was great"];
    let train = sentences
        .iter()
        .zip([0, 1, 0, 1].iter())
        .map(|(sentence, label)| sst2_example(sentence, *label))
        .collect::<Vec<_>>();
    let datasets = GlueDatasets::new()
        .with_split(Split::Train, train)
        .with_split(Split::Validation, vec![sst2_example("a bad film", 0)]);

    let loaders = manager.create_dataloaders(Some(datasets), None)?;
    assert_eq!(loaders.train.len(), 4);
    assert_eq!(loaders.valid.len(), 1);
    assert_eq!(manager.state(), SessionState::TrainBatchesBuilt);

    let wrapper = get_wrapped_model("prajjwal1/bert-tiny", "sst2", None, Device::Cpu)?;
    assert!(count_parameters(wrapper.model()) > 0);
    let loaders = manager.dataloaders().ok_or(GlueError::Precedence("no loaders".into()))?;
    for batch in loaders.train.iter() {
        assert_eq!(batch.sequence_length(), 64);
        let logits = no_grad(|| wrapper.forward_batch(&batch, false))?;
        assert_eq!(logits.size(), vec![batch.batch_size(), 2]);

        let named = batch.to_named_tensors();
        let logits = no_grad(|| wrapper.forward_named(BatchInput::Named(&named), false))?;
        assert_eq!(logits.size()[1], 2);
    }
    Ok(())
}

#[test]
fn mrpc_pairs_keep_sentence_order() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    write_glue_directory(dir.path())?;
    let datasets = GlueDirectoryProvider::new(dir.path()).load(GlueTask::Mrpc)?;
    assert_eq!(datasets.len(Split::Train), 2);
    assert!(datasets.get(Split::Test).is_none());

    let descriptor = GlueTask::Mrpc.descriptor();
    let (text, label) = descriptor.extract_labelled(&datasets.require(Split::Train)?[0])?;
    assert_eq!(
        text,
        TextInput::Pair(
            "The bank sold shares.".to_string(),
            "Shares were sold by the bank.".to_string()
        )
    );
    assert_eq!(label, 1);
    assert_eq!(descriptor.metrics.len(), 2);
    assert!(descriptor.metrics.contains(&Metric::Accuracy));
    Ok(())
}

#[test]
fn directory_provider_feeds_test_batches() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    write_glue_directory(dir.path())?;
    let config = GlueDataConfig {
        max_length: 16,
        train_batch_size: 2,
        shuffle_train: false,
        ..GlueDataConfig::new("SST2", "prajjwal1/bert-tiny")
    };
    let mut manager = GlueDataManager::new_with_tokenizer(config, tokenizer(dir.path(), true)?)?
        .with_provider(GlueDirectoryProvider::new(dir.path()));

    assert!(matches!(
        manager.create_test_dataloader(None),
        Err(GlueError::Precedence(_))
    ));
    let loaders = manager.create_dataloaders(None, None)?;
    assert_eq!(loaders.train.len(), 3);
    assert_eq!(loaders.valid.batch_size(), 4);

    let test = manager.create_test_dataloader(None)?;
    assert_eq!(test.len(), 2);
    assert_eq!(test.labels(), &[0, 0]);
    assert_eq!(manager.state(), SessionState::TestBatchesBuilt);

    let custom = vec![RawExample::new(None).with_field("sentence", "a man plays guitar")];
    let test = manager.create_test_dataloader(Some(custom.as_slice()))?;
    assert_eq!(test.num_batches(), 1);
    Ok(())
}

#[test]
fn distilbert_style_tokenizer_omits_token_type_ids() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let config = GlueDataConfig {
        max_length: 12,
        ..GlueDataConfig::new("rte", "prajjwal1/bert-tiny")
    };
    let mut manager = GlueDataManager::new_with_tokenizer(config, tokenizer(dir.path(), false)?)?;
    let example = RawExample::new(Some(1))
        .with_field("sentence1", "a man is playing guitar .")
        .with_field("sentence2", "a person plays .");
    let datasets = GlueDatasets::new()
        .with_split(Split::Train, vec![example.clone()])
        .with_split(Split::Validation, vec![example]);
    let loaders = manager.create_dataloaders(Some(datasets), None)?;
    for batch in loaders.train.iter() {
        assert!(batch.token_type_ids.is_none());
        assert!(!batch.to_named_tensors().contains_key("token_type_ids"));
    }
    Ok(())
}

#[test]
#[ignore]
fn remote_sst2_download() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let datasets = GlueRemoteProvider::new(Some(dir.path().to_path_buf())).load(GlueTask::Sst2)?;
    assert!(datasets.len(Split::Train) > 60_000);
    assert_eq!(datasets.len(Split::Validation), 872);
    Ok(())
}
