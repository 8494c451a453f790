use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::archive::extract_csv;
use crate::error::Result;
use crate::io::ArchiveSource;

/// Make sure the CSV table exists at `destination`.
///
/// When `overwrite` is set, or the file is missing, the archive is fetched
/// from `source` into a temporary file and its table extracted to
/// `destination`. The temporary file is removed on every exit path.
///
/// Returns whether a download took place.
pub async fn ensure_local<S>(source: &S, destination: &Path, overwrite: bool) -> Result<bool>
where
    S: ArchiveSource + ?Sized,
{
    if !overwrite && tokio::fs::try_exists(destination).await? {
        debug!(path = %destination.display(), "zipcodes file already present");
        return Ok(false);
    }

    info!(
        source = %source.describe(),
        destination = %destination.display(),
        "downloading zipcodes archive"
    );

    // Deleted when dropped, including when a `?` below returns early
    let archive = NamedTempFile::new()?.into_temp_path();
    source.fetch_to(&archive).await?;

    let extracted = extract_csv(&archive, destination).await;
    let removed = archive.close();
    extracted?;
    removed?;

    Ok(true)
}
