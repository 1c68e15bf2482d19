#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = uefi_imageinfo::formats::uefi::classify_capsule_header(data, 0);
});
