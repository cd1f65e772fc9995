//! End-to-end demo: ingest a document, then ask questions against it.
//!
//! Runs entirely offline with the deterministic in-process collaborators,
//! so it works without any API keys:
//!
//! ```bash
//! cargo run --example corpus_pipeline
//! ```
//!
//! Point `HAYLOFT_INDEX_PATH` / `HAYLOFT_PARENT_STORE_PATH` somewhere else
//! to keep the demo state out of your working directory.

use std::sync::Arc;
use std::time::Instant;

use tracing_subscriber::FmtSubscriber;

use hayloft::pipeline::Pipeline;
use hayloft::services::{
    LexicalOverlapReranker, MockEmbeddingProvider, PlainTextExtractor, StaticCompletionProvider,
};
use hayloft::{PipelineConfig, PipelineError};

const SAMPLE_DOCUMENT: &str = "\
Ownership is Rust's most distinctive feature. Each value has a single owner, \
and when the owner goes out of scope the value is dropped. Moves transfer \
ownership; clones duplicate data explicitly.

Borrowing lets code use a value without taking ownership. Shared references \
allow many readers; a mutable reference demands exclusivity. The borrow \
checker verifies these rules at compile time, which is how Rust prevents \
data races without a garbage collector.

Lifetimes describe how long references remain valid. Most lifetimes are \
inferred, but generic code sometimes names them explicitly so the compiler \
can relate the lifetime of an output to its inputs.";

#[tokio::main]
async fn main() -> Result<(), PipelineError> {
    init_tracing();

    let config = PipelineConfig::from_env();
    println!("index path       : {}", config.index_path.display());
    println!("parent snapshot  : {}", config.parent_store_path.display());

    let pipeline = Pipeline::builder()
        .config(config)
        .embedder(Arc::new(MockEmbeddingProvider::new()))
        .reranker(Arc::new(LexicalOverlapReranker::new()))
        .completion(Arc::new(StaticCompletionProvider::new(
            "Ownership means each value has a single owner; borrowing grants \
             temporary access without transferring it.",
        )))
        .extractor(Arc::new(PlainTextExtractor::new()))
        .build()
        .await?;

    let start = Instant::now();
    let report = pipeline.ingest_text(SAMPLE_DOCUMENT).await?;
    println!(
        "ingested {} parents / {} children in {:?}",
        report.parents,
        report.children,
        start.elapsed()
    );
    println!("parents stored   : {}", pipeline.parent_count());
    println!("children indexed : {}", pipeline.child_count().await?);

    for question in [
        "What does ownership mean in Rust?",
        "How do lifetimes relate outputs to inputs?",
        "What is the capital of France?",
    ] {
        println!("\nQ: {question}");
        let answer = pipeline.answer(question).await;
        println!("A: {}", answer.into_text());
    }

    Ok(())
}

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let subscriber = FmtSubscriber::builder().with_env_filter("info").finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}
