#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(bundle) = ktx_lib::Bundle::from_bytes(data) {
        // Anything that parses should write and parse again without changes.
        let bytes = bundle.to_bytes().unwrap();
        assert_eq!(bundle.serialized_length(), bytes.len());
        assert_eq!(bundle, ktx_lib::Bundle::from_bytes(&bytes).unwrap());
    }
});
