// input document: {"<entity>": {"<attribute>": <rating>, ...}, ...}
//
// Anything that does not deserialize into that shape is a parse error; no
// other validation is done.

use crate::ratings::store::RatingStore;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("[ReadFile] cannot read {}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("[Unmarshal] cannot parse {}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

pub fn load(path: &Path) -> Result<RatingStore, LoadError> {
    let input = std::fs::read(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let store = parse(&input).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    info!(
        "load {}: {} entities, {} attributes",
        path.display(),
        store.len(),
        store.attribute_count()
    );

    Ok(store)
}

fn parse(input: &[u8]) -> Result<RatingStore, serde_json::Error> {
    serde_json::from_slice(input)
}
