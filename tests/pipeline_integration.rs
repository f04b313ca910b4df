//! End-to-end pipeline tests.
//!
//! Wires config, knowledge store, retrieval, prompt assembly, and the real
//! Gemini client together against a local stub, and checks what reaches the
//! wire and what comes back to the shell.

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use secrecy::SecretString;
use selfheal::cli::{AnalyzeCommand, OutputFormat, build_pipeline};
use selfheal::config::SelfhealConfig;
use selfheal::pipeline::{INPUT_NODE, OUTPUT_NODE};
use selfheal::{Error, GenerationOutcome};
use serde_json::{Value, json};

/// Answers one request with `reply` and returns the JSON body it received.
fn stub(reply: Value) -> (String, JoinHandle<Value>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}/v1beta", listener.local_addr().unwrap());

    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream);
        let mut content_length = 0usize;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            let line = line.trim_end().to_ascii_lowercase();
            if line.is_empty() {
                break;
            }
            if let Some(value) = line.strip_prefix("content-length:") {
                content_length = value.trim().parse().unwrap();
            }
        }
        let mut body = vec![0u8; content_length];
        reader.read_exact(&mut body).unwrap();

        let payload = reply.to_string();
        let mut stream = reader.into_inner();
        write!(
            stream,
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\
             Content-Length: {}\r\nConnection: close\r\n\r\n{payload}",
            payload.len()
        )
        .unwrap();

        serde_json::from_slice(&body).unwrap()
    });

    (base_url, handle)
}

fn config_for(base_url: &str) -> SelfhealConfig {
    let mut config = SelfhealConfig::default();
    config.llm.api_key = Some(SecretString::from("pipeline-key"));
    config.llm.base_url = Some(base_url.to_string());
    config
}

#[test]
fn test_incident_to_report() {
    let reply = json!({
        "candidates": [{"content": {"parts": [{"text": "\n1. Free disk on db-01\n"}]}}]
    });
    let (base_url, server) = stub(reply);
    let mut config = config_for(&base_url);
    config.llm.max_output_tokens = Some(200);

    let (pipeline, graph) = build_pipeline(&config).unwrap();
    assert!(graph.is_none());

    let analysis = pipeline
        .analyze("CPU spikes to 95%, Disk space < 5%, Service X failed")
        .unwrap();
    let sent = server.join().unwrap();

    assert_eq!(
        analysis.outcome,
        GenerationOutcome::Report("1. Free disk on db-01".to_string())
    );
    assert_eq!(sent["generationConfig"]["maxOutputTokens"], 200);

    let prompt = sent["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert_eq!(prompt, analysis.prompt);
    assert!(prompt.contains("CPU spikes to 95%, Disk space < 5%, Service X failed"));
    assert!(prompt.contains("Disk space alerts can lead to service crashes."));
}

#[test]
fn test_configured_facts_replace_builtins() {
    let (base_url, server) = stub(json!({"candidates": []}));
    let mut config = config_for(&base_url);
    config.facts = Some(vec![
        "Kafka consumer lag signals a stuck partition.".to_string(),
        "Disk space alerts can lead to service crashes.".to_string(),
    ]);
    config.retrieval.top_k = 1;

    let (pipeline, _) = build_pipeline(&config).unwrap();
    let analysis = pipeline.analyze("kafka consumer lag rising").unwrap();
    server.join().unwrap();

    assert_eq!(analysis.context.len(), 1);
    assert_eq!(
        analysis.context[0].as_str(),
        "Kafka consumer lag signals a stuck partition."
    );
    assert_eq!(analysis.outcome, GenerationOutcome::NoUsableText);
}

#[test]
fn test_graph_recording_through_command() {
    let (base_url, server) =
        stub(json!({"candidates": [{"content": {"parts": [{"text": "Restart X"}]}}]}));
    let mut config = config_for(&base_url);
    config.features.pipeline_graph = true;

    let (pipeline, graph) = build_pipeline(&config).unwrap();
    let graph = graph.unwrap();

    let mut out = Vec::new();
    let analysis = AnalyzeCommand::new(OutputFormat::Text)
        .execute(&pipeline, Some(&graph), "Service X failed", &mut out)
        .unwrap();
    server.join().unwrap();

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("Restart X"));
    assert!(text.contains("Pipeline recorded in graph (local)."));

    let run = graph.run(&analysis.request_id).unwrap();
    let names: Vec<&str> = run.nodes.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, vec![INPUT_NODE, OUTPUT_NODE]);
    assert_eq!(run.nodes[0].length, "Service X failed".len());
    assert_eq!(run.nodes[1].length, "Restart X".len());
}

#[test]
fn test_missing_key_blocks_pipeline() {
    let mut config = SelfhealConfig::default();
    config.llm.api_key = Some(SecretString::from("   "));
    let err = build_pipeline(&config).err().unwrap();
    assert!(matches!(err, Error::MissingApiKey));
    assert_eq!(
        err.to_string(),
        "GEMINI_API_KEY not found. Set environment variable or config file."
    );
}

#[test]
fn test_blank_incident_never_reaches_network() {
    // Nothing listens here; a request would produce RequestFailed, not an error.
    let config = config_for("http://127.0.0.1:1/v1beta");
    let (pipeline, _) = build_pipeline(&config).unwrap();
    let err = pipeline.analyze(" \t\n").unwrap_err();
    assert_eq!(err.to_string(), "invalid input: Please enter system logs or incidents.");
}

#[test]
fn test_concurrent_analyses_are_independent() {
    let (first_url, first) =
        stub(json!({"candidates": [{"content": {"parts": [{"text": "first"}]}}]}));
    let (second_url, second) =
        stub(json!({"candidates": [{"content": {"parts": [{"text": "second"}]}}]}));

    let (p1, _) = build_pipeline(&config_for(&first_url)).unwrap();
    let (p2, _) = build_pipeline(&config_for(&second_url)).unwrap();
    let p1 = Arc::new(p1);

    let t1 = {
        let p1 = Arc::clone(&p1);
        thread::spawn(move || p1.analyze("memory leak").unwrap())
    };
    let t2 = thread::spawn(move || p2.analyze("network latency").unwrap());

    let a1 = t1.join().unwrap();
    let a2 = t2.join().unwrap();
    first.join().unwrap();
    second.join().unwrap();

    assert_eq!(a1.outcome.report(), Some("first"));
    assert_eq!(a2.outcome.report(), Some("second"));
    assert_ne!(a1.request_id, a2.request_id);
    assert_ne!(a1.context, a2.context);
}
