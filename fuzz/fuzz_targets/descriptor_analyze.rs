#![no_main]
use libfuzzer_sys::fuzz_target;
use uefi_imageinfo::formats::uefi::{analyze_descriptor, build_region_table, FlashDescriptor, ImageBounds};

fuzz_target!(|data: &[u8]| {
    let Ok(descriptor) = FlashDescriptor::parse(data) else {
        return;
    };
    let Ok(info) = analyze_descriptor(&descriptor, 0) else {
        return;
    };
    if let Ok(section) = descriptor.region_section() {
        let image = ImageBounds {
            base: 0,
            size: data.len() as u32,
        };
        let regions = build_region_table(section, info.version(), image, 0x1000);
        assert!(regions.windows(2).all(|w| w[0].offset <= w[1].offset));
    }
});
