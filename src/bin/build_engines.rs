//! Offline catalog builder.
//!
//! Usage: `build-engines <playground-props.json> [out-dir]`
//!
//! Reads the playground props document and writes one descriptor per engine
//! to `out-dir` (default `./engines`), replacing existing files.

use serpgate::catalog::builder::{build_descriptors, write_descriptors};
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "serpgate=info".into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let props_path = args
        .next()
        .map(PathBuf::from)
        .ok_or_else(|| anyhow::anyhow!("usage: build-engines <playground-props.json> [out-dir]"))?;
    let out_dir = args.next().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("engines"));

    let raw = std::fs::read_to_string(&props_path)?;
    let props: serde_json::Value = serde_json::from_str(&raw)?;

    let descriptors = build_descriptors(&props)?;
    let written = write_descriptors(&out_dir, &descriptors)?;

    tracing::info!(
        engines = written.len(),
        out_dir = %out_dir.display(),
        "Wrote engine files"
    );
    Ok(())
}
