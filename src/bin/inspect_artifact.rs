//! Utility to load a model artifact and print a summary of it.
//!
//! Uses MODEL_PATH (or the first argument) and fails exactly as the server
//! would on an invalid artifact.

use anyhow::Context;
use dotenvy::dotenv;
use loan_default_api::config::Config;
use loan_default_api::forest::ForestPipeline;
use sha2::{Digest, Sha256};
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let path: PathBuf = match std::env::args().nth(1) {
        Some(path) => path.into(),
        None => Config::from_env()?.model_path,
    };

    let bytes = std::fs::read(&path)
        .with_context(|| format!("cannot read artifact {}", path.display()))?;
    let pipeline = ForestPipeline::from_json_slice(&bytes)
        .with_context(|| format!("artifact {} failed validation", path.display()))?;

    println!("Artifact: {}", path.display());
    println!("- sha256: {}", hex::encode(Sha256::digest(&bytes)));
    println!("- trees: {}", pipeline.n_trees());
    println!("- nodes: {}", pipeline.n_nodes());
    println!("- classes: {:?}", pipeline.classes());
    println!("- encoded width: {}", pipeline.width());

    Ok(())
}
