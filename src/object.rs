//! Module for handling and retrieving complete MGH objects.

use crate::error::Result;
use crate::header::MghHeader;
use crate::tag::Trailer;
use crate::typedef::MghType;
use crate::util::is_gz_file;
use crate::volume::{InMemMghVolume, MghVolume, VoxelData};
use flate2::bufread::GzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

const GZ_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Data type for an MGH object that is fully contained in memory.
/// Objects contain a header, a volume and a (possibly empty) trailer.
///
/// The storage type declared in the header always matches the type of
/// the samples held by the volume: the only way to change the samples
/// is through [`set_data`], which updates both.
///
/// [`set_data`]: #method.set_data
#[derive(Debug, PartialEq, Clone)]
pub struct MghObject {
    header: MghHeader,
    volume: InMemMghVolume,
    trailer: Trailer,
}

impl MghObject {
    /// Retrieve the full contents of an MGH object.
    /// If the file's name ends with ".mgz" or ".gz", or the file starts
    /// with the Gzip magic number, it is decoded as a Gzip stream.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use mgz_optimize::MghObject;
    /// # use mgz_optimize::Result;
    ///
    /// # fn run() -> Result<()> {
    /// let obj = MghObject::from_file("aseg.mgz")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<MghObject> {
        let gz = is_gz_file(&path);
        let mut file = BufReader::new(File::open(path)?);
        if gz || file.fill_buf()?.starts_with(&GZ_MAGIC) {
            Self::from_reader(GzDecoder::new(file))
        } else {
            Self::from_reader(file)
        }
    }

    /// Retrieve an MGH object from an uncompressed stream of data.
    pub fn from_reader<R: Read>(mut source: R) -> Result<MghObject> {
        let header = MghHeader::from_reader(&mut source)?;
        let volume = InMemMghVolume::from_reader(&mut source, &header)?;
        let mut rest = Vec::new();
        let _ = source.read_to_end(&mut rest)?;
        let trailer = Trailer::from_bytes(&rest)?;
        Ok(MghObject {
            header,
            volume,
            trailer,
        })
    }

    /// Assemble an object out of its parts. The header's shape and storage
    /// type are taken from the volume.
    pub fn new(mut header: MghHeader, volume: InMemMghVolume, trailer: Trailer) -> Self {
        let dim = volume.dim();
        for (h, d) in header.dim.iter_mut().zip(dim) {
            *h = *d as i32;
        }
        header.datatype = volume.data_type().code();
        MghObject {
            header,
            volume,
            trailer,
        }
    }

    /// Obtain a reference to the MGH header.
    pub fn header(&self) -> &MghHeader {
        &self.header
    }

    /// Obtain a reference to the object's volume.
    pub fn volume(&self) -> &InMemMghVolume {
        &self.volume
    }

    /// Obtain a reference to the object's trailer.
    pub fn trailer(&self) -> &Trailer {
        &self.trailer
    }

    /// The storage type of the samples.
    pub fn data_type(&self) -> MghType {
        self.volume.data_type()
    }

    /// The intent code recorded in the trailer, if any.
    pub fn intent(&self) -> Option<i64> {
        self.trailer.intent()
    }

    /// Record a new intent code.
    pub fn set_intent(&mut self, code: i64) {
        self.trailer.set_intent(code)
    }

    /// Replace the samples with a re-encoded version of themselves, and
    /// update the header's storage type accordingly. Nothing else in the
    /// header changes.
    pub fn set_data(&mut self, data: VoxelData) -> Result<()> {
        let datatype = data.data_type();
        self.volume.set_data(data)?;
        self.header.datatype = datatype.code();
        Ok(())
    }

    /// Move the volume out of the object, discarding the header and trailer.
    pub fn into_volume(self) -> InMemMghVolume {
        self.volume
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::MGH_DATA_START;

    fn sample_stream() -> Vec<u8> {
        let hdr = MghHeader {
            dim: [2, 2, 1, 1],
            datatype: MghType::Int.code(),
            ..MghHeader::default()
        };
        let mut out = Vec::new();
        hdr.write(&mut out).unwrap();
        for v in &[0i32, 1, 2, 300] {
            out.extend_from_slice(&v.to_be_bytes());
        }
        out
    }

    #[test]
    fn read_from_stream() {
        let obj = MghObject::from_reader(&sample_stream()[..]).unwrap();
        assert_eq!(obj.data_type(), MghType::Int);
        assert_eq!(obj.volume().dim(), &[2, 2, 1, 1]);
        assert_eq!(obj.volume().get_f64(&[1, 1, 0, 0]).unwrap(), 300.);
        assert_eq!(obj.intent(), None);
    }

    #[test]
    fn truncated_stream() {
        let stream = sample_stream();
        assert!(MghObject::from_reader(&stream[..MGH_DATA_START + 10]).is_err());
    }

    #[test]
    fn set_data_updates_header() {
        let mut obj = MghObject::from_reader(&sample_stream()[..]).unwrap();
        let narrowed = obj.volume().data().convert_to(MghType::Short).unwrap();
        obj.set_data(narrowed).unwrap();
        assert_eq!(obj.header().datatype, MghType::Short.code());
        assert_eq!(obj.data_type(), MghType::Short);
        assert!(obj.set_data(VoxelData::Uchar(vec![1])).is_err());
        assert_eq!(obj.header().datatype, MghType::Short.code());
    }
}
