//! Helpers for synthesising MGH/MGZ files in tests.
#![allow(dead_code)]

use flate2::write::GzEncoder;
use flate2::Compression;
use mgz_optimize::{MghHeader, MghType, VoxelData};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// A header with distinctive, non-default geometry.
pub fn oblique_header(dim: [i32; 4], datatype: MghType) -> MghHeader {
    let mut reserved = vec![0u8; mgz_optimize::header::RESERVED_LEN];
    reserved[0] = 0xAB;
    reserved[193] = 0xCD;
    MghHeader {
        dim,
        datatype: datatype.code(),
        dof: 7,
        ras_good: 1,
        delta: [0.8, 0.9, 1.1],
        mdc: [
            0.99, 0.01, -0.1, //
            -0.02, 0.05, -0.998, //
            0.1, 0.995, 0.03,
        ],
        pxyz_c: [-3.25, 17.5, 2.125],
        reserved,
        ..MghHeader::default()
    }
}

/// Encode samples in big-endian order.
pub fn payload(data: &VoxelData) -> Vec<u8> {
    let mut out = Vec::new();
    match data {
        VoxelData::Uchar(v) => out.extend_from_slice(v),
        VoxelData::Short(v) => v.iter().for_each(|x| out.extend_from_slice(&x.to_be_bytes())),
        VoxelData::Int(v) => v.iter().for_each(|x| out.extend_from_slice(&x.to_be_bytes())),
        VoxelData::Float(v) => v.iter().for_each(|x| out.extend_from_slice(&x.to_be_bytes())),
    }
    out
}

/// Encode a tagged trailer record.
pub fn record(id: i32, data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&id.to_be_bytes());
    out.extend_from_slice(&(data.len() as i64).to_be_bytes());
    out.extend_from_slice(data);
    out
}

/// A trailer with scan parameters, a command line record, an optional
/// intent record and a legacy record left unparsed.
pub fn trailer(intent: Option<i64>) -> Vec<u8> {
    let mut out: Vec<u8> = [2.3f32, 0.157, 2.98, 900., 256.]
        .iter()
        .flat_map(|v| v.to_be_bytes().to_vec())
        .collect();
    out.extend(record(3, b"mri_convert orig.mgz out.mgz\0"));
    if let Some(code) = intent {
        out.extend(record(mgz_optimize::tag::TAG_INTENT, &code.to_be_bytes()));
    }
    // legacy "use real RAS" record, which has no length field
    out.extend_from_slice(&2i32.to_be_bytes());
    out.extend_from_slice(&1i32.to_be_bytes());
    out
}

/// The full uncompressed byte stream of a volume with oblique geometry.
pub fn mgh_bytes(data: &VoxelData, intent: Option<i64>) -> Vec<u8> {
    let dim = [data.len() as i32, 1, 1, 1];
    let mut out = Vec::new();
    oblique_header(dim, data.data_type()).write(&mut out).unwrap();
    out.extend(payload(data));
    out.extend(trailer(intent));
    out
}

/// Write a volume to `dir/name`, compressed if the name says so.
pub fn write_volume(dir: &Path, name: &str, data: &VoxelData, intent: Option<i64>) -> PathBuf {
    let path = dir.join(name);
    let bytes = mgh_bytes(data, intent);
    if name.ends_with(".mgz") || name.ends_with(".gz") {
        let mut e = GzEncoder::new(Vec::new(), Compression::default());
        e.write_all(&bytes).unwrap();
        fs::write(&path, e.finish().unwrap()).unwrap();
    } else {
        fs::write(&path, bytes).unwrap();
    }
    path
}

/// Read the uncompressed byte stream of a file.
pub fn read_mgh_bytes(path: &Path) -> Vec<u8> {
    let raw = fs::read(path).unwrap();
    if raw.starts_with(&[0x1f, 0x8b]) {
        let mut out = Vec::new();
        let _ = std::io::Read::read_to_end(&mut flate2::read::GzDecoder::new(&raw[..]), &mut out)
            .unwrap();
        out
    } else {
        raw
    }
}
