use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bio_extract::{BioReader, Pipeline, PipelineError};
use bio_extract_core::extraction::config::DEFAULT_USER_PROMPT_PREFIX;
use bio_extract_core::extraction::estimate_tokens;
use bio_extract_core::prelude::*;
use serde_json::{json, Value};

/// Answers with a profile derived from the bio unless a bio has a scripted reply queue.
#[derive(Clone, Default)]
struct FakeService {
    scripts: Arc<Mutex<HashMap<String, VecDeque<Result<ServiceReply, ServiceError>>>>>,
    bios: Arc<Mutex<Vec<String>>>,
}

impl FakeService {
    fn script(self, bio: &str, replies: Vec<Result<ServiceReply, ServiceError>>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(bio.to_string(), replies.into());
        self
    }

    fn bios(&self) -> Vec<String> {
        self.bios.lock().unwrap().clone()
    }
}

fn profile_for(bio: &str) -> Value {
    json!({
        "interests": [bio],
        "personality_traits": ["friendly"],
        "hobbies": ["reading"],
        "bio_sentiment": "neutral"
    })
}

#[async_trait]
impl StructuredService for FakeService {
    async fn submit(&self, request: &ExtractionRequest) -> Result<ServiceReply, ServiceError> {
        let bio = request
            .user_prompt
            .strip_prefix(DEFAULT_USER_PROMPT_PREFIX)
            .unwrap_or(&request.user_prompt)
            .to_string();
        self.bios.lock().unwrap().push(bio.clone());

        let scripted = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&bio)
            .and_then(VecDeque::pop_front);
        scripted.unwrap_or_else(|| Ok(ServiceReply::Structured(profile_for(&bio))))
    }
}

fn write_input(dir: &Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("bio.csv");
    fs::write(&path, body).unwrap();
    path
}

fn read_output(path: &Path) -> Vec<ProfileRecord> {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_text_reply_skips_only_that_row() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(
        dir.path(),
        "uid,bio\nu1,*Marathon runner*\nu2,*Just ask*\nu3,*Amateur astronomer*\n",
    );
    let output = dir.path().join("out.json");
    let service = FakeService::default().script(
        "Just ask",
        vec![Ok(ServiceReply::Text("I'd rather not guess.".to_string()))],
    );
    let pipeline = Pipeline::new(Extractor::new(service.clone()));

    let summary = pipeline.run(&input, &output).await.unwrap();

    let profiles = read_output(&output);
    let ids: Vec<&str> = profiles.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["u1", "u3"]);
    assert_eq!(profiles[1].profile.interests, vec!["Amateur astronomer"]);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].id, "u2");
    assert_eq!(summary.failures[0].line, 3);
    assert_eq!(service.bios().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_asterisks_stripped_before_extraction() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "uid,bio\n1,*I love hiking*\n");
    let output = dir.path().join("out.json");
    let service = FakeService::default();
    let pipeline = Pipeline::new(Extractor::new(service.clone()));

    pipeline.run(&input, &output).await.unwrap();

    assert_eq!(service.bios(), vec!["I love hiking"]);
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_retries_do_not_abort_batch() {
    let transient = || Err(ServiceError::Transient("503 Service Unavailable".to_string()));
    let service = FakeService::default().script(
        "flaky",
        vec![transient(), transient(), transient(), transient(), transient()],
    );
    let pipeline = Pipeline::new(Extractor::new(service.clone()));
    let reader = BioReader::from_bytes("id,bio\na,flaky\nb,steady\n");

    let outcome = pipeline.process(reader.records()).await;

    assert_eq!(outcome.profiles.len(), 1);
    assert_eq!(outcome.profiles[0].id, "b");
    assert_eq!(outcome.summary.failures.len(), 1);
    assert_eq!(outcome.summary.failures[0].id, "a");
    assert!(outcome.summary.failures[0].reason.contains("after 5 attempts"));
    assert_eq!(service.bios().iter().filter(|b| *b == "flaky").count(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_summary_totals_token_estimates() {
    let transient = || Err(ServiceError::Transient("503 Service Unavailable".to_string()));
    let service = FakeService::default().script(
        "flaky",
        vec![transient(), transient(), transient(), transient(), transient()],
    );
    let pipeline = Pipeline::new(Extractor::new(service));
    let reader = BioReader::from_bytes("id,bio\na,flaky\nb,steady\n");

    let outcome = pipeline.process(reader.records()).await;

    let prompt_tokens = |bio: &str| {
        let request = pipeline.extractor().build_request(bio);
        estimate_tokens(&request.system_prompt) + estimate_tokens(&request.user_prompt)
    };
    assert_eq!(
        outcome.summary.estimated_input_tokens,
        5 * prompt_tokens("flaky") + prompt_tokens("steady")
    );
    assert_eq!(
        outcome.summary.estimated_output_tokens,
        estimate_tokens(&profile_for("steady").to_string())
    );
}

#[tokio::test(start_paused = true)]
async fn test_empty_lines_are_counted_as_malformed() {
    let service = FakeService::default();
    let pipeline = Pipeline::new(Extractor::new(service.clone()));
    let reader = BioReader::from_bytes("id,bio\n1,first\n\n3,third\n");

    let outcome = pipeline.process(reader.records()).await;

    assert_eq!(outcome.summary.succeeded, 2);
    assert_eq!(outcome.summary.malformed_rows, 1);
    assert_eq!(service.bios(), vec!["first", "third"]);
}

#[tokio::test(start_paused = true)]
async fn test_malformed_rows_are_counted_and_skipped() {
    let service = FakeService::default();
    let pipeline = Pipeline::new(Extractor::new(service.clone()));
    let reader = BioReader::from_bytes("id,bio\n1,first\norphan\n3,third\n");

    let outcome = pipeline.process(reader.records()).await;

    assert_eq!(outcome.summary.succeeded, 2);
    assert_eq!(outcome.summary.malformed_rows, 1);
    assert_eq!(outcome.summary.total(), 3);
    assert_eq!(service.bios(), vec!["first", "third"]);
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_ids_appear_once() {
    let service = FakeService::default();
    let pipeline = Pipeline::new(Extractor::new(service.clone()));
    let reader = BioReader::from_bytes("id,bio\n7,one\n7,two\n8,three\n");

    let outcome = pipeline.process(reader.records()).await;

    let ids: Vec<&str> = outcome.profiles.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["7", "8"]);
    assert_eq!(outcome.summary.failures.len(), 1);
    assert!(outcome.summary.failures[0].reason.contains("duplicate"));
    assert_eq!(service.bios(), vec!["one", "three"]);
}

#[tokio::test(start_paused = true)]
async fn test_missing_input_is_fatal_and_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.json");
    let pipeline = Pipeline::new(Extractor::new(FakeService::default()));

    let err = pipeline
        .run(&dir.path().join("absent.csv"), &output)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Input { .. }));
    assert!(!output.exists());
}

#[tokio::test(start_paused = true)]
async fn test_non_ascii_survives_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "uid,bio\nz1,*J'adore le café et les 山*\n");
    let output = dir.path().join("out.json");
    let pipeline = Pipeline::new(Extractor::new(FakeService::default()));

    pipeline.run(&input, &output).await.unwrap();

    let raw = fs::read_to_string(&output).unwrap();
    assert!(raw.contains("J'adore le café et les 山"));
    assert!(!raw.contains("\\u"));
}
