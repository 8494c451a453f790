use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::{ArchiveSource, ReadAt};
use crate::error::Result;

/// Local file reader with random access support
pub struct LocalFileReader {
    file: std::fs::File,
    size: u64,
}

impl LocalFileReader {
    pub fn new(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let size = file.metadata()?.len();
        Ok(Self { file, size })
    }
}

#[async_trait]
impl ReadAt for LocalFileReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::FileExt;
            Ok(self.file.read_at(buf, offset)?)
        }

        #[cfg(windows)]
        {
            use std::os::windows::fs::FileExt;
            Ok(self.file.seek_read(buf, offset)?)
        }

        #[cfg(not(any(unix, windows)))]
        {
            use std::io::{Read, Seek, SeekFrom};
            let mut file = &self.file;
            file.seek(SeekFrom::Start(offset))?;
            Ok(file.read(buf)?)
        }
    }

    fn size(&self) -> u64 {
        self.size
    }
}

/// Archive that already sits on the local filesystem, e.g. a mirrored copy
/// of the register for offline use
pub struct LocalArchiveSource {
    path: PathBuf,
}

impl LocalArchiveSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ArchiveSource for LocalArchiveSource {
    async fn fetch_to(&self, destination: &Path) -> Result<()> {
        tokio::fs::copy(&self.path, destination).await?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
