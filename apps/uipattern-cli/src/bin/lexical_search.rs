use std::env;
use std::path::PathBuf;

use tracing_subscriber::EnvFilter;

use uipattern_core::config::{expand_path, Config};
use uipattern_core::PatternLibrary;
use uipattern_text::LexicalRetriever;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <query> [patterns_path] [--limit N]", args[0]);
        eprintln!("Example: {} 'button variant size' data/patterns --limit 5", args[0]);
        std::process::exit(1);
    }
    let query_text = &args[1];
    let mut limit = 10usize;
    let mut patterns_path: Option<PathBuf> = None;
    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--limit" => {
                let Some(n) = args.get(i + 1).and_then(|s| s.parse().ok()) else {
                    anyhow::bail!("--limit requires a number");
                };
                limit = n;
                i += 1;
            }
            arg if !arg.starts_with('-') => patterns_path = Some(PathBuf::from(arg)),
            _ => {}
        }
        i += 1;
    }
    let patterns_path = match patterns_path {
        Some(p) => p,
        None => expand_path(Config::load()?.settings()?.corpus.patterns_path),
    };

    let library = PatternLibrary::load(&patterns_path)?;
    let retriever = LexicalRetriever::build(library.patterns())?;
    let hits = retriever.search(query_text, limit)?;
    println!("Query: {query_text}");
    println!("Corpus: {} ({} patterns)\n", patterns_path.display(), library.len());
    for (rank, hit) in hits.iter().enumerate() {
        let name = library.get(&hit.id).map_or("", |p| p.name.as_str());
        println!("  {:>2}. score={:.4}  id={}  name={}", rank + 1, hit.score, hit.id, name);
    }
    Ok(())
}
