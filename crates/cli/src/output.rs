//! Export artifacts.

use anyhow::{Context, Result};
use pinshift_core::PinRecord;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use time::macros::format_description;

/// Timestamped path for a pin export, e.g. `pins-20261019T101502123Z.json`.
pub fn export_path(dir: &Path, now: OffsetDateTime) -> Result<PathBuf> {
    let stamp = now
        .format(format_description!(
            "[year][month][day]T[hour][minute][second][subsecond digits:3]Z"
        ))
        .context("failed to format export timestamp")?;
    Ok(dir.join(format!("pins-{stamp}.json")))
}

/// Write `pins` as a JSON array of identifiers to a fresh file in `dir`.
pub async fn write_export(dir: &Path, pins: &[PinRecord]) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;

    let path = export_path(dir, OffsetDateTime::now_utc())?;
    let contents = serde_json::to_vec_pretty(pins)?;
    tokio::fs::write(&path, contents)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}
