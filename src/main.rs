use anyhow::{Context, Result};
use clap::Parser;
use docx_proposal::config::Args;
use docx_proposal::{generate_proposal, telemetry, ProposalRequest, ScalarRenderer};
use std::fs;
use tracing::info;

fn main() -> Result<()> {
    let args = Args::parse();
    telemetry::init(&args.logging())?;

    let template = fs::read(&args.template)
        .with_context(|| format!("read template {}", args.template.display()))?;
    let raw_request = fs::read_to_string(&args.request)
        .with_context(|| format!("read request {}", args.request.display()))?;
    let request: ProposalRequest = serde_json::from_str(&raw_request)
        .with_context(|| format!("parse request {}", args.request.display()))?;

    let doc = generate_proposal(&template, &request, &ScalarRenderer)
        .context("failed to generate proposal")?;

    let out = args.output_path(&doc.filename);
    fs::write(&out, &doc.bytes).with_context(|| format!("write {}", out.display()))?;
    info!(path = %out.display(), hyperlinks = doc.relationships.len(), "wrote proposal");
    Ok(())
}
