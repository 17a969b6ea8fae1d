#![no_main]
use libfuzzer_sys::fuzz_target;
use mgz_optimize::writer::write_mgh;
use mgz_optimize::MghObject;

fuzz_target!(|data: &[u8]| {
    if let Ok(obj) = MghObject::from_reader(data) {
        let mut out = Vec::new();
        write_mgh(&obj, &mut out).unwrap();
        assert_eq!(&out[..], data);
    }
});
