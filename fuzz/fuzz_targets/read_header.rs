#![no_main]
use libfuzzer_sys::fuzz_target;
use mgz_optimize::MghHeader;

fuzz_target!(|data: &[u8]| {
    if let Ok(header) = MghHeader::from_reader(data) {
        let _ = header.data_type();
        let _ = header.num_voxels();
        let _ = header.payload_len();
        let mut out = Vec::new();
        let _ = header.write(&mut out);
    }
});
