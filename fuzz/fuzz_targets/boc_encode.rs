#![no_main]
use cellboc::arbitrary::AnyCell;
use cellboc::prelude::Boc;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|cell: AnyCell| {
    let encoded = Boc::encode(&cell.0);
    let decoded = Boc::decode(&encoded).unwrap();
    assert_eq!(decoded.repr_hash(), cell.0.repr_hash());
});
