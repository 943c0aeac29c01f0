pub mod config;
pub mod goal;
pub mod session;
pub mod stats;
pub mod tag;
pub mod timer;

use prajna_core::validation::normalize_tag_name;
use prajna_core::{Database, ValidationError};

/// Normalise `--tag` names without touching the store.
pub fn check_tags(names: &[String]) -> Result<Vec<String>, ValidationError> {
    names.iter().map(|name| normalize_tag_name(name)).collect()
}

/// Resolve `--tag` names to ids, creating tags that do not exist yet.
pub fn resolve_tags(db: &Database, names: &[String]) -> Result<Vec<i64>, Box<dyn std::error::Error>> {
    let mut ids = Vec::with_capacity(names.len());
    for name in names {
        ids.push(db.ensure_tag(name)?.id);
    }
    Ok(ids)
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
