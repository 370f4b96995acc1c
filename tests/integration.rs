use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn vp_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_vp"))
}

fn write_config(root: &Path, extra: &str) -> PathBuf {
    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"[corpus]
root = "{root}/corpus"

[index]
backend = "sqlite"
path = "{root}/data/vp.sqlite"

[server]
bind = "127.0.0.1:7341"
{extra}
"#,
        root = root.display(),
        extra = extra,
    );

    let config_path = config_dir.join("vp.toml");
    fs::write(&config_path, config_content).unwrap();
    config_path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let corpus = root.join("corpus");
    fs::create_dir_all(&corpus).unwrap();
    fs::write(
        corpus.join("Essay - Future of AI [education, tech].txt"),
        "Machines are learning faster than we are.\n\nSchools will have to change.\n\nI am cautiously hopeful.",
    )
    .unwrap();
    fs::write(
        corpus.join("Podcast - Pilot.txt"),
        "Welcome to the very first episode.\n\nToday we talk about nothing in particular.",
    )
    .unwrap();
    fs::write(corpus.join("random_notes.txt"), "eggs milk bread").unwrap();
    fs::write(corpus.join("ignored.md"), "Markdown is not in the default globs.").unwrap();

    let config_path = write_config(&root, "");
    (tmp, config_path)
}

fn run_vp(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = vp_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("OPENAI_API_KEY")
        .env_remove("ANTHROPIC_API_KEY")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run vp binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn test_chunk_prints_json_with_metadata() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_vp(&config_path, &["chunk"]);
    assert!(success, "chunk failed: stdout={}, stderr={}", stdout, stderr);

    let chunks: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let chunks = chunks.as_array().unwrap();
    assert_eq!(chunks.len(), 3);

    let essay = &chunks[0];
    assert_eq!(essay["metadata"]["title"], "Essay - Future of AI");
    assert_eq!(essay["metadata"]["tags"], serde_json::json!(["education", "tech"]));
    assert_eq!(essay["metadata"]["content_type"], "essay");
    assert_eq!(essay["metadata"]["chunk_id"], 0);
    assert_eq!(
        essay["text"],
        "Machines are learning faster than we are.\n\nSchools will have to change.\n\nI am cautiously hopeful."
    );

    assert_eq!(chunks[1]["metadata"]["content_type"], "podcast");
    assert_eq!(chunks[2]["metadata"]["title"], "random_notes");
    assert_eq!(chunks[2]["metadata"]["content_type"], "general");
    assert_eq!(chunks[2]["metadata"]["word_count"], 3);
}

#[test]
fn test_chunk_small_size_splits_paragraphs() {
    let (tmp, _) = setup_test_env();
    let config_path = write_config(tmp.path(), "[chunking]\nchunk_size = 8\nchunk_overlap = 0\n");

    let (stdout, _, success) = run_vp(&config_path, &["chunk"]);
    assert!(success);
    let chunks: Vec<serde_json::Value> = serde_json::from_str(&stdout).unwrap();

    let essay_ids: Vec<u64> = chunks
        .iter()
        .filter(|c| c["metadata"]["content_type"] == "essay")
        .map(|c| c["metadata"]["chunk_id"].as_u64().unwrap())
        .collect();
    assert_eq!(essay_ids, vec![0, 1, 2]);
}

#[test]
fn test_chunk_output_file() {
    let (tmp, config_path) = setup_test_env();
    let out = tmp.path().join("chunks.json");

    let (_, stderr, success) = run_vp(&config_path, &["chunk", "--output", out.to_str().unwrap()]);
    assert!(success, "chunk --output failed: {}", stderr);

    let written: Vec<serde_json::Value> =
        serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(written.len(), 3);
}

#[test]
fn test_chunk_is_deterministic() {
    let (_tmp, config_path) = setup_test_env();
    let (first, _, _) = run_vp(&config_path, &["chunk"]);
    let (second, _, _) = run_vp(&config_path, &["chunk"]);
    assert_eq!(first, second);
}

#[test]
fn test_ingest_dry_run() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_vp(&config_path, &["ingest", "--dry-run"]);
    assert!(success, "dry run failed: {}", stderr);
    assert!(stdout.contains("dry-run"));
    assert!(stdout.contains("files found: 3"));
    assert!(stdout.contains("files failed: 0"));
    assert!(stdout.contains("chunks: 3"));
}

#[test]
fn test_ingest_dry_run_skips_unreadable_file() {
    let (tmp, config_path) = setup_test_env();
    fs::write(tmp.path().join("corpus/binary.txt"), [0xff, 0xfe, 0xfd]).unwrap();

    let (stdout, _, success) = run_vp(&config_path, &["ingest", "--dry-run"]);
    assert!(success);
    assert!(stdout.contains("files found: 4"));
    assert!(stdout.contains("files failed: 1"));
    assert!(stdout.contains("chunks: 3"));
}

#[test]
fn test_ingest_errors_when_embeddings_disabled() {
    let (_tmp, config_path) = setup_test_env();

    let (_, stderr, success) = run_vp(&config_path, &["ingest"]);
    assert!(!success);
    assert!(stderr.contains("requires embeddings"), "stderr: {}", stderr);
}

#[test]
fn test_query_errors_when_embeddings_disabled() {
    let (_tmp, config_path) = setup_test_env();

    let (_, stderr, success) = run_vp(&config_path, &["query", "future of schools"]);
    assert!(!success);
    assert!(stderr.contains("requires embeddings"));
}

#[test]
fn test_query_empty_text() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_vp(&config_path, &["query", "   "]);
    assert!(success);
    assert!(stdout.contains("No results."));
}

#[test]
fn test_openai_without_key_is_configuration_error() {
    let (tmp, _) = setup_test_env();
    let config_path = write_config(tmp.path(), "[embedding]\nprovider = \"openai\"\n");

    let (_, stderr, success) = run_vp(&config_path, &["query", "anything"]);
    assert!(!success);
    assert!(stderr.contains("OPENAI_API_KEY"), "stderr: {}", stderr);
}

#[test]
fn test_stats_on_empty_index() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_vp(&config_path, &["stats"]);
    assert!(success, "stats failed: {}", stderr);
    assert!(stdout.contains("user_writings"));
    assert!(stdout.contains("Records:     0"));
}

#[test]
fn test_save_empty_collection_and_clear() {
    let (tmp, config_path) = setup_test_env();
    let out = tmp.path().join("backup/collection.json");

    let (stdout, stderr, success) = run_vp(&config_path, &["save", out.to_str().unwrap()]);
    assert!(success, "save failed: {}", stderr);
    assert!(stdout.contains("Saved 0 records"));
    let saved: Vec<serde_json::Value> =
        serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert!(saved.is_empty());

    let (stdout, _, success) = run_vp(&config_path, &["clear"]);
    assert!(success);
    assert!(stdout.contains("Cleared collection user_writings"));
}

#[test]
fn test_invalid_chunking_config_rejected() {
    let (tmp, _) = setup_test_env();
    let config_path = write_config(tmp.path(), "[chunking]\nchunk_size = 0\n");

    let (_, stderr, success) = run_vp(&config_path, &["chunk"]);
    assert!(!success);
    assert!(stderr.contains("chunk_size"), "stderr: {}", stderr);
}

#[test]
fn test_small_chunk_size_with_default_overlap() {
    let (tmp, _) = setup_test_env();
    let config_path = write_config(tmp.path(), "[chunking]\nchunk_size = 100\n");

    let (stdout, stderr, success) = run_vp(&config_path, &["chunk"]);
    assert!(success, "chunk failed: {}", stderr);
    let chunks: Vec<serde_json::Value> = serde_json::from_str(&stdout).unwrap();
    assert_eq!(chunks.len(), 3);
}

#[test]
fn test_chunk_nested_files_keyed_by_relative_path() {
    let (tmp, config_path) = setup_test_env();
    fs::create_dir_all(tmp.path().join("corpus/2023")).unwrap();
    fs::write(tmp.path().join("corpus/2023/random_notes.txt"), "older notes").unwrap();

    let (stdout, _, success) = run_vp(&config_path, &["chunk"]);
    assert!(success);
    let chunks: Vec<serde_json::Value> = serde_json::from_str(&stdout).unwrap();
    let sources: Vec<&str> = chunks
        .iter()
        .map(|c| c["metadata"]["source_file"].as_str().unwrap())
        .collect();
    assert!(sources.contains(&"2023/random_notes.txt"));
    assert!(sources.contains(&"random_notes.txt"));
}

#[test]
fn test_missing_corpus_root() {
    let (tmp, config_path) = setup_test_env();
    fs::remove_dir_all(tmp.path().join("corpus")).unwrap();

    let (_, stderr, success) = run_vp(&config_path, &["chunk"]);
    assert!(!success);
    assert!(stderr.contains("corpus root does not exist"), "stderr: {}", stderr);
}

#[test]
fn test_missing_config_file() {
    let tmp = TempDir::new().unwrap();
    let (_, stderr, success) = run_vp(&tmp.path().join("nope.toml"), &["stats"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"));
}
