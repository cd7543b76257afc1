#![no_main]
use cellboc::prelude::Boc;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(cell) = Boc::decode(data) {
        let encoded = Boc::encode(&cell);
        let decoded = Boc::decode(&encoded).unwrap();
        assert_eq!(decoded.repr_hash(), cell.repr_hash());
    }
});
