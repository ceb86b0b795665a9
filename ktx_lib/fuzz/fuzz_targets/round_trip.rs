#![no_main]

use arbitrary::Arbitrary;
use ktx_lib::{header::KtxInfo, BlobIndex, Bundle};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    mip_count: u8,
    array_length: u8,
    is_cubemap: bool,
    info: KtxInfo,
    metadata: Vec<(String, Vec<u8>)>,
    blobs: Vec<(BlobIndex, Vec<u8>)>,
}

fuzz_target!(|input: Input| {
    let Ok(mut bundle) = Bundle::new(
        input.mip_count as u32,
        input.array_length as u32,
        input.is_cubemap,
    ) else {
        return;
    };
    *bundle.info_mut() = input.info;
    for (key, value) in input.metadata {
        let _ = bundle.metadata_mut().push(key, value);
    }
    for (index, data) in input.blobs {
        let _ = bundle.set_blob(index, data);
    }

    let bytes = bundle.to_bytes().unwrap();
    assert_eq!(bundle.serialized_length(), bytes.len());
    assert_eq!(bundle, Bundle::from_bytes(&bytes).unwrap());
});
