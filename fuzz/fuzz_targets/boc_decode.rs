#![no_main]
use libfuzzer_sys::fuzz_target;

use cellboc::prelude::Boc;

fuzz_target!(|data: &[u8]| {
    if let Ok(roots) = Boc::decode_all(data) {
        for cell in roots {
            _ = cell.repr_hash();
            _ = cell.repr_depth();
            _ = cell.display_root().to_string();
        }
    }
});
