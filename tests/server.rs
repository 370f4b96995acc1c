mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use tempfile::TempDir;

use common::{seeded_index, EchoGenerator, HashEmbedder};
use voiceprint::assistant::WritingAssistant;
use voiceprint::config::CorpusConfig;
use voiceprint::embedding::DisabledProvider;
use voiceprint::index::SimilarityIndex;
use voiceprint::server::{build_router, AppState};
use voiceprint_core::chunk::{Chunker, ChunkerConfig};
use voiceprint_core::store::memory::InMemoryStore;

struct TestServer {
    base: String,
    embedder: Arc<HashEmbedder>,
    _corpus: TempDir,
}

fn write_corpus() -> TempDir {
    let tmp = TempDir::new().unwrap();
    std::fs::create_dir_all(tmp.path().join("2024")).unwrap();
    std::fs::write(
        tmp.path().join("Essay - Winter [nature].txt"),
        "Snow covers the beds.\n\nThe garden sleeps until March.",
    )
    .unwrap();
    std::fs::write(tmp.path().join("2024/notes.txt"), "buy seeds").unwrap();
    tmp
}

async fn serve(index: SimilarityIndex, corpus: &TempDir) -> String {
    let index = Arc::new(index);
    let assistant = Arc::new(WritingAssistant::new(
        index.clone(),
        Arc::new(EchoGenerator),
        2,
    ));
    let corpus_config = CorpusConfig {
        root: corpus.path().to_path_buf(),
        ..CorpusConfig::default()
    };
    let chunker = Chunker::new(ChunkerConfig::default()).unwrap();
    let app = build_router(AppState::new(index, assistant, corpus_config, chunker));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn spawn_server() -> TestServer {
    let (index, embedder) = seeded_index().await;
    let corpus = write_corpus();
    let base = serve(index, &corpus).await;
    TestServer {
        base,
        embedder,
        _corpus: corpus,
    }
}

#[tokio::test]
async fn test_health() {
    let server = spawn_server().await;
    let base = &server.base;
    let resp = reqwest::get(format!("{}/health", base)).await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_stats() {
    let server = spawn_server().await;
    let base = &server.base;
    let body: serde_json::Value = reqwest::get(format!("{}/stats", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["total_count"], 4);
    assert_eq!(body["counts_by_content_type"]["essay"], 2);
}

#[tokio::test]
async fn test_query_default_k_and_filter() {
    let server = spawn_server().await;
    let base = &server.base;
    let client = reqwest::Client::new();

    let body: serde_json::Value = client
        .post(format!("{}/query", base))
        .json(&serde_json::json!({"query": "my garden and tomatoes"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["metadata"]["title"], "Essay - Gardens");

    let body: serde_json::Value = client
        .post(format!("{}/query", base))
        .json(&serde_json::json!({
            "query": "anything",
            "k": 10,
            "filter": {"content_type": "podcast"}
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["metadata"]["content_type"], "podcast");
}

#[tokio::test]
async fn test_query_unknown_filter_key_is_400() {
    let server = spawn_server().await;
    let base = &server.base;
    let resp = reqwest::Client::new()
        .post(format!("{}/query", base))
        .json(&serde_json::json!({"query": "x", "filter": {"author": "me"}}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "configuration");
}

#[tokio::test]
async fn test_empty_query_is_400() {
    let server = spawn_server().await;
    let base = &server.base;
    let resp = reqwest::Client::new()
        .post(format!("{}/query", base))
        .json(&serde_json::json!({"query": "  "}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn test_embedding_failure_is_502() {
    let server = spawn_server().await;
    let base = &server.base;
    server.embedder.fail.store(true, Ordering::SeqCst);

    let resp = reqwest::Client::new()
        .post(format!("{}/query", base))
        .json(&serde_json::json!({"query": "garden"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 502);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "embedding_provider");
}

#[tokio::test]
async fn test_draft_uses_style_hint_from_query() {
    let server = spawn_server().await;
    let base = &server.base;
    let body: serde_json::Value = reqwest::Client::new()
        .post(format!("{}/draft", base))
        .json(&serde_json::json!({"query": "Write about gardens [make this more poetic]"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["style_hint"], "more poetic");
    assert_eq!(body["sources"].as_array().unwrap().len(), 2);
    let text = body["text"].as_str().unwrap();
    assert!(text.contains("examples=2"));
    assert!(text.contains("style=more poetic"));
}

#[tokio::test]
async fn test_draft_explicit_style_wins() {
    let server = spawn_server().await;
    let base = &server.base;
    let body: serde_json::Value = reqwest::Client::new()
        .post(format!("{}/draft", base))
        .json(&serde_json::json!({
            "query": "Write about trains (make this shorter)",
            "k": 1,
            "style": "formal"
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["style_hint"], "formal");
    let text = body["text"].as_str().unwrap();
    assert!(text.contains("examples=1"));
    assert!(text.contains("style=formal"));
}

#[tokio::test]
async fn test_corpus_lists_files() {
    let server = spawn_server().await;
    let body: serde_json::Value = reqwest::get(format!("{}/corpus", server.base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let files = body["files"].as_array().unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(files[0]["source_file"], "2024/notes.txt");
    assert_eq!(files[0]["content_type"], "general");
    assert_eq!(files[1]["title"], "Essay - Winter");
    assert_eq!(files[1]["tags"], serde_json::json!(["nature"]));
    assert_eq!(files[1]["chunks"], 1);
    assert!(body["failed"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_ingest_replaces_documents() {
    let server = spawn_server().await;
    let client = reqwest::Client::new();

    let body: serde_json::Value = client
        .post(format!("{}/ingest", server.base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["documents"], 2);
    assert_eq!(body["failed"], 0);
    assert_eq!(body["chunks_written"], 2);

    // Concurrent re-ingests must not duplicate documents.
    let (a, b) = tokio::join!(
        client.post(format!("{}/ingest", server.base)).send(),
        client.post(format!("{}/ingest", server.base)).send(),
    );
    assert_eq!(a.unwrap().status(), 200);
    assert_eq!(b.unwrap().status(), 200);

    let stats: serde_json::Value = reqwest::get(format!("{}/stats", server.base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["total_count"], 6);
    assert_eq!(stats["counts_by_content_type"]["essay"], 3);
}

#[tokio::test]
async fn test_ingest_without_embeddings_is_400() {
    let corpus = write_corpus();
    let index = SimilarityIndex::open(
        "user_writings",
        Arc::new(DisabledProvider),
        Arc::new(InMemoryStore::new()),
    )
    .await
    .unwrap();
    let base = serve(index, &corpus).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/ingest", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "configuration");
}
