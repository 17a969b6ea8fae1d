//! Utility functions to write MGH objects.
//!
//! Files are never written in place: the object is serialized to a
//! temporary file in the destination directory, which is then moved over
//! the output path. A failed write leaves the output path untouched.

use std::fs::{self, File, Permissions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use tempfile::NamedTempFile;

use crate::{object::MghObject, util::is_gz_file, Result};

/// Serialize an object as an uncompressed MGH stream.
pub fn write_mgh<W: Write>(object: &MghObject, mut writer: W) -> Result<()> {
    object.header().write(&mut writer)?;
    object.volume().data().write(&mut writer)?;
    object.trailer().write(&mut writer)?;
    Ok(())
}

/// Options and flags which can be used to configure how an MGH object
/// is written to the file system.
#[derive(Debug, Clone, PartialEq)]
pub struct WriterOptions {
    path: PathBuf,
    /// Whether to compress the output, `None` to decide by file name
    compress: Option<bool>,
    compression: Compression,
    permissions: Option<Permissions>,
}

impl WriterOptions {
    /// Options for writing to the given path. By default, the output is
    /// compressed if the file name ends with ".mgz" or ".gz".
    pub fn new<P: AsRef<Path>>(path: P) -> WriterOptions {
        WriterOptions {
            path: path.as_ref().to_owned(),
            compress: None,
            compression: Compression::default(),
            permissions: None,
        }
    }

    /// Force compression on or off, regardless of the file name.
    pub fn compress(mut self, compress: bool) -> Self {
        self.compress = Some(compress);
        self
    }

    /// Set the Gzip compression level, from 0 (none) to 9 (best).
    pub fn compression_level(mut self, level: u32) -> Self {
        self.compression = Compression::new(level.min(9));
        self
    }

    /// Set the permissions of the written file. By default, an existing
    /// file keeps its permissions and a new one gets those of the
    /// temporary file.
    pub fn permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = Some(permissions);
        self
    }

    /// The output path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the object, returning the number of bytes stored on disk.
    pub fn write_object(&self, object: &MghObject) -> Result<u64> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_owned(),
            _ => PathBuf::from("."),
        };
        let tmp = NamedTempFile::new_in(&dir)?;
        {
            let file: &File = tmp.as_file();
            let mut writer = BufWriter::new(file);
            if self.compress.unwrap_or_else(|| is_gz_file(&self.path)) {
                let mut e = GzEncoder::new(&mut writer, self.compression);
                write_mgh(object, &mut e)?;
                let _ = e.finish()?;
            } else {
                write_mgh(object, &mut writer)?;
            }
            writer.flush()?;
        }
        let permissions = match &self.permissions {
            Some(p) => Some(p.clone()),
            None => fs::metadata(&self.path).ok().map(|m| m.permissions()),
        };
        if let Some(p) = permissions {
            tmp.as_file().set_permissions(p)?;
        }
        let len = tmp.as_file().metadata()?.len();
        let _ = tmp.persist(&self.path)?;
        Ok(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::MghHeader;
    use crate::tag::Trailer;
    use crate::volume::{InMemMghVolume, VoxelData};
    use tempfile::tempdir;

    fn small_object() -> MghObject {
        let volume = InMemMghVolume::new([3, 1, 1, 1], VoxelData::Short(vec![-1, 0, 1])).unwrap();
        MghObject::new(MghHeader::default(), volume, Trailer::default())
    }

    #[test]
    fn write_and_read_back() {
        let dir = tempdir().unwrap();
        for name in &["small.mgh", "small.mgz"] {
            let path = dir.path().join(name);
            let obj = small_object();
            let n = WriterOptions::new(&path).write_object(&obj).unwrap();
            assert_eq!(n, std::fs::metadata(&path).unwrap().len());
            let back = MghObject::from_file(&path).unwrap();
            assert_eq!(back, obj);
        }
    }

    #[test]
    fn compression_follows_file_name() {
        let dir = tempdir().unwrap();
        let raw = dir.path().join("a.mgh");
        let gz = dir.path().join("a.mgz");
        let obj = small_object();
        let n_raw = WriterOptions::new(&raw).write_object(&obj).unwrap();
        let _ = WriterOptions::new(&gz).write_object(&obj).unwrap();
        assert_eq!(n_raw, 284 + 6);
        let bytes = std::fs::read(&gz).unwrap();
        assert_eq!(&bytes[..2], &[0x1f, 0x8b]);
    }

    #[cfg(unix)]
    #[test]
    fn permissions_survive_rewrite() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("T1.mgz");
        let _ = WriterOptions::new(&path).write_object(&small_object()).unwrap();
        fs::set_permissions(&path, Permissions::from_mode(0o644)).unwrap();

        let _ = WriterOptions::new(&path).write_object(&small_object()).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);

        let other = dir.path().join("copy.mgz");
        let _ = WriterOptions::new(&other)
            .permissions(Permissions::from_mode(0o640))
            .write_object(&small_object())
            .unwrap();
        let mode = fs::metadata(&other).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o640);
    }

    #[test]
    fn missing_directory_fails_cleanly() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nope").join("a.mgz");
        assert!(WriterOptions::new(&path).write_object(&small_object()).is_err());
        assert!(!path.exists());
    }
}
