//! On-disk module images.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Raw contents of a module's backing file, loaded in one shot.
///
/// This is the on-disk layout. Offsets into it differ from the mapped
/// layout by a fixed loader skew; see [`crate::patch::resolve_address`].
/// The buffer is never modified after loading.
#[derive(Debug)]
pub struct ModuleImage {
    path: PathBuf,
    bytes: Vec<u8>,
}

impl ModuleImage {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = fs::read(&path)?;
        Ok(Self {
            path: path.as_ref().to_path_buf(),
            bytes,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_reads_raw_bytes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0x4D, 0x5A, 0x90, 0x00]).unwrap();

        let image = ModuleImage::load(file.path()).unwrap();
        assert_eq!(image.bytes(), &[0x4D, 0x5A, 0x90, 0x00]);
        assert_eq!(image.len(), 4);
        assert_eq!(image.path(), file.path());
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ModuleImage::load(dir.path().join("nope.dll")).unwrap_err();
        assert!(matches!(err, crate::Error::Io(_)));
    }
}
