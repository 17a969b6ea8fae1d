#![no_main]
use libfuzzer_sys::fuzz_target;
use mgz_optimize::{optimize_object, LabelReference, MghObject, OptimizeOptions};

fuzz_target!(|data: &[u8]| {
    if let Ok(mut obj) = MghObject::from_reader(data) {
        let before = obj.header().clone();
        let reference = LabelReference::freesurfer();
        if optimize_object(&mut obj, "aseg.mgz", &OptimizeOptions::new(), &reference).is_ok() {
            assert!(obj.header().same_geometry(&before));
        }
    }
});
