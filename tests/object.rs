mod util;

use mgz_optimize::tag::{ScanParameters, TAG_INTENT};
use mgz_optimize::{MghError, MghObject, MghType, MghVolume, VoxelData, WriterOptions};
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::tempdir;
use util::{mgh_bytes, read_mgh_bytes, write_volume};

#[test]
fn read_mgz_with_trailer() {
    let dir = tempdir().unwrap();
    let data = VoxelData::Int(vec![0, 2, 41, 2]);
    let path = write_volume(dir.path(), "aseg.mgz", &data, Some(1));

    let obj = MghObject::from_file(&path).unwrap();
    assert_eq!(obj.data_type(), MghType::Int);
    assert_eq!(obj.volume().dim(), &[4, 1, 1, 1]);
    assert_eq!(obj.volume().get_f64(&[2, 0, 0, 0]).unwrap(), 41.);
    assert_eq!(obj.volume().data(), &data);
    assert_eq!(obj.intent(), Some(1));

    let trailer = obj.trailer();
    assert_eq!(
        trailer.scan_parameters(),
        Some(&ScanParameters {
            tr: 2.3,
            flip_angle: 0.157,
            te: 2.98,
            ti: 900.,
            fov: 256.,
        })
    );
    let ids: Vec<i32> = trailer.iter().map(|t| t.id()).collect();
    assert_eq!(ids, vec![3, TAG_INTENT]);
    assert_eq!(trailer.tail().len(), 8);
}

#[test]
fn gzip_detected_by_content() {
    let dir = tempdir().unwrap();
    let data = VoxelData::Uchar(vec![7, 8]);
    let gz = write_volume(dir.path(), "a.mgz", &data, None);
    let renamed = dir.path().join("a.mgh");
    fs::rename(&gz, &renamed).unwrap();

    let obj = MghObject::from_file(&renamed).unwrap();
    assert_eq!(obj.volume().data(), &data);
}

#[test]
fn write_back_is_byte_identical() {
    let dir = tempdir().unwrap();
    for name in &["a.mgz", "a.mgh"] {
        let data = VoxelData::Float(vec![0.25, -1., 3e5]);
        let path = write_volume(dir.path(), name, &data, Some(0));
        let obj = MghObject::from_file(&path).unwrap();

        let out = dir.path().join(format!("copy-{}", name));
        let _ = WriterOptions::new(&out).write_object(&obj).unwrap();
        assert_eq!(read_mgh_bytes(&out), mgh_bytes(&data, Some(0)));
    }
}

#[test]
fn truncated_payload() {
    let bytes = mgh_bytes(&VoxelData::Int(vec![1, 2, 3]), None);
    match MghObject::from_reader(&bytes[..284 + 5]) {
        Err(MghError::TruncatedPayload(12, 5)) => {}
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn unsupported_storage_type() {
    let mut bytes = mgh_bytes(&VoxelData::Uchar(vec![1]), None);
    // storage type code lives right after version and dimensions
    bytes[23] = 2;
    match MghObject::from_reader(&bytes[..]) {
        Err(MghError::UnsupportedDataType(2)) => {}
        other => panic!("unexpected {:?}", other),
    }
}
