use std::env;
use std::path::Path;

use anyhow::{bail, Context};
use tracing::info;
use tracing_subscriber::EnvFilter;

use uipattern_core::config::{expand_path, Config};
use uipattern_core::types::Requirements;
use uipattern_core::PatternLibrary;
use uipattern_embed::provider_from_settings;
use uipattern_hybrid::RetrievalService;
use uipattern_vector::PatternVectorWriter;

const USAGE: &str = "Usage: uipattern <index|search|stats> [args...]
  index                               embed the corpus into LanceDB
  search <requirements.json|json> [k] rank patterns for the requirements
  stats                               print corpus statistics";

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("{USAGE}");
        std::process::exit(1);
    }
    let cmd = args.remove(0);
    (cmd, args)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let settings = Config::load().context("loading configuration")?.settings()?;
    let (cmd, args) = parse_args();
    match cmd.as_str() {
        "index" => {
            let library = PatternLibrary::load(&expand_path(&settings.corpus.patterns_path))?;
            let provider = provider_from_settings(&settings.semantic)?;
            let uri = expand_path(&settings.semantic.lancedb_uri);
            let writer = PatternVectorWriter::new(&uri.to_string_lossy(), &settings.semantic.table).await?;
            let count = writer.index_patterns(library.patterns(), provider.as_ref()).await?;
            info!(count, provider = provider.provider_id(), uri = %uri.display(), "indexed patterns");
        }
        "search" => {
            let Some(input) = args.first() else { bail!("{USAGE}") };
            let requirements = read_requirements(input)?;
            let service = RetrievalService::from_settings(&settings).await?;
            let top_k = match args.get(1) {
                Some(k) => k.parse().with_context(|| format!("top_k must be a number, got '{k}'"))?,
                None => service.default_top_k(),
            };
            let response = service.search(&requirements, top_k).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        "stats" => {
            let library = PatternLibrary::load(&expand_path(&settings.corpus.patterns_path))?;
            println!("{}", serde_json::to_string_pretty(&library.stats())?);
        }
        other => bail!("unknown command '{other}'\n{USAGE}"),
    }
    Ok(())
}

/// Accept either a path to a JSON file or the JSON itself.
fn read_requirements(input: &str) -> anyhow::Result<Requirements> {
    let raw = if Path::new(input).is_file() {
        std::fs::read_to_string(input).with_context(|| format!("reading {input}"))?
    } else {
        input.to_string()
    };
    serde_json::from_str(&raw).context("parsing requirements JSON")
}
