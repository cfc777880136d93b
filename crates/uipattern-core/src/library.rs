//! The pattern corpus: loaded once, read by every request.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::types::{LibraryStats, Pattern};

/// A corpus file holds either one pattern or a list of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum CorpusFile {
    Many(Vec<Pattern>),
    One(Box<Pattern>),
}

/// Immutable, ordered set of patterns with an id lookup.
#[derive(Debug, Clone, Default)]
pub struct PatternLibrary {
    patterns: Vec<Pattern>,
    by_id: HashMap<String, usize>,
}

impl PatternLibrary {
    /// Build a library, rejecting empty or duplicate ids.
    pub fn new(patterns: Vec<Pattern>) -> Result<Self> {
        let mut by_id = HashMap::with_capacity(patterns.len());
        for (i, p) in patterns.iter().enumerate() {
            if p.id.trim().is_empty() {
                return Err(Error::Corpus(format!("pattern '{}' has an empty id", p.name)));
            }
            if by_id.insert(p.id.clone(), i).is_some() {
                return Err(Error::Corpus(format!("duplicate pattern id '{}'", p.id)));
            }
        }
        Ok(Self { patterns, by_id })
    }

    /// Load from a single JSON file or from every `*.json` file below a directory.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::NotFound(format!("pattern corpus {}", path.display())));
        }
        let files = if path.is_dir() { list_json_files(path) } else { vec![path.to_path_buf()] };
        let mut patterns = Vec::new();
        for file in &files {
            let loaded = read_corpus_file(file)?;
            debug!(file = %file.display(), count = loaded.len(), "loaded corpus file");
            patterns.extend(loaded);
        }
        info!(files = files.len(), patterns = patterns.len(), "pattern corpus loaded");
        Self::new(patterns)
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    pub fn get(&self, id: &str) -> Option<&Pattern> {
        self.by_id.get(id).map(|&i| &self.patterns[i])
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn stats(&self) -> LibraryStats {
        let mut names = BTreeSet::new();
        let mut categories = BTreeSet::new();
        let mut frameworks = BTreeSet::new();
        let mut libraries = BTreeSet::new();
        let mut total_variants = 0;
        let mut total_props = 0;
        for p in &self.patterns {
            insert_non_empty(&mut names, &p.name);
            insert_non_empty(&mut categories, &p.category);
            insert_non_empty(&mut frameworks, &p.framework);
            insert_non_empty(&mut libraries, &p.library);
            total_variants += p.metadata.variants.len();
            total_props += p.metadata.props.len();
        }
        LibraryStats {
            total_patterns: self.patterns.len(),
            component_types: names.into_iter().collect(),
            categories: categories.into_iter().collect(),
            frameworks: frameworks.into_iter().collect(),
            libraries: libraries.into_iter().collect(),
            total_variants,
            total_props,
        }
    }
}

fn insert_non_empty(set: &mut BTreeSet<String>, value: &str) {
    if !value.is_empty() {
        set.insert(value.to_string());
    }
}

fn read_corpus_file(path: &Path) -> Result<Vec<Pattern>> {
    let raw = fs::read_to_string(path)
        .map_err(|e| Error::Corpus(format!("{}: {e}", path.display())))?;
    let parsed: CorpusFile = serde_json::from_str(&raw)
        .map_err(|e| Error::Corpus(format!("{}: {e}", path.display())))?;
    Ok(match parsed {
        CorpusFile::Many(v) => v,
        CorpusFile::One(p) => vec![*p],
    })
}

fn list_json_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(e) => {
                warn!(path = ?e.path(), error = %e, "skipping unreadable corpus entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().to_path_buf())
        .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("json"))
        .collect();
    files.sort();
    files
}
