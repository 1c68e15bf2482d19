#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(report) = uefi_imageinfo::Report::from_json_str(text) {
            let _ = report.to_json_string();
        }
    }
});
