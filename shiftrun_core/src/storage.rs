//! Plan persistence with file locking.
//!
//! Plans are stored as pretty JSON. Writes go through a temp file in the
//! target directory and are renamed into place.

use crate::{Error, Plan, Result};
use fs2::FileExt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Save a plan atomically with an exclusive lock on the temp file
pub fn save_plan(plan: &Plan, path: &Path) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let temp = NamedTempFile::new_in(parent)?;
    temp.as_file().lock_exclusive()?;

    {
        let mut writer = std::io::BufWriter::new(temp.as_file());
        let contents = serde_json::to_string_pretty(plan)?;
        writer.write_all(contents.as_bytes())?;
        writer.flush()?;
    }

    temp.as_file().sync_all()?;
    temp.as_file().unlock()?;

    temp.persist(path).map_err(|e| Error::Io(e.error))?;

    tracing::debug!("Saved {}-day plan to {:?}", plan.len(), path);
    Ok(())
}

/// Load a plan with a shared lock.
///
/// Unlike state files, a missing or corrupt plan is an error: there is no
/// sensible default plan.
pub fn load_plan(path: &Path) -> Result<Plan> {
    let file = File::open(path)?;
    file.lock_shared()?;

    let mut contents = String::new();
    let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
    file.unlock()?;
    read?;

    let plan: Plan = serde_json::from_str(&contents)?;
    tracing::debug!("Loaded {}-day plan from {:?}", plan.len(), path);
    Ok(plan)
}
