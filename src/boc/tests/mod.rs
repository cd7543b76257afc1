use rand::{Rng, SeedableRng};
use rand_xorshift::XorShiftRng;

use super::*;
use crate::cell::{BitString, Cell, CellRef, CellType, HashContext, MAX_BIT_LEN, MAX_EXOTIC_BIT_LEN};
use crate::util::decode_base64;

const CELL_WITH_17_BITS: &str = "te6ccgEBAQEABQAABb23wA==";
const CONTRACT_CODE: &str = "te6ccgECTAEADjkAAgaK2zVLAQQkiu1TIOMDIMD/4wIgwP7jAvILQgMCRwO+7UTQ10nDAfhmifhpIds80wABjhqBAgDXGCD5AQHTAAGU0/8DAZMC+ELi+RDyqJXTAAHyeuLTPwH4QyG58rQg+COBA+iogggbd0CgufK0+GPTHwH4I7zyudMfAds88jxIDwQEfO1E0NdJwwH4ZiLQ0wP6QDD4aak4APhEf29xggiYloBvcm1vc3BvdPhk4wIhxwDjAiHXDR/yvCHjAwHbPPI8Pz4+BAIoIIIQZ6C5X7vjAiCCEH1v8lS74wISBQM8IIIQaLVfP7rjAiCCEHPiIUO64wIgghB9b/JUuuMCDggGAzYw+Eby4Ez4Qm7jACGT1NHQ3vpA0ds8MNs88gBBB0YAaPhL+EnHBfLj6PhL+E34SnDIz4WAygBzz0DOcc8LblUgyM+QU/a2gssfzgHIzs3NyYBA+wADTjD4RvLgTPhCbuMAIZPU0dDe03/6QNN/1NHQ+kDSANTR2zww2zzyAEEJRgRu+Ev4SccF8uPoJcIA8uQaJfhMu/LkJCT6Qm8T1wv/wwAl+EvHBbOw8uQG2zxw+wJVA9s8iSXCAEktSAoBmo6AnCH5AMjPigBAy//J0OIx+EwnobV/+GxVIQL4S1UGVQR/yM+FgMoAc89AznHPC25VQMjPkZ6C5X7Lf85VIMjOygDMzc3JgQCA+wBbCwEKVHFU2zwMArj4S/hN+EGIyM+OK2zWzM7JVQQg+QD4KPpCbxLIz4ZAygfL/8nQBibIz4WIzgH6AovQAAAAAAAAAAAAAAAAB88WIds8zM+DVTDIz5BWgOPuzMsfzgHIzs3NyXH7AEsNADTQ0gABk9IEMd7SAAGT0gEx3vQE9AT0BNFfAwEcMPhCbuMA+Ebyc9HywGQPAhbtRNDXScIBjoDjDRBBA2Zw7UTQ9AVxIYBA9A6OgN9yIoBA9A6OgN9wIIj4bvht+Gz4a/hqgED0DvK91wv/+GJw+GMREUcBAolIBFAgghAPAliqu+MCIIIQIOvHbbvjAiCCEEap1+y74wIgghBnoLlfu+MCMCUcEwRQIIIQSWlYf7rjAiCCEFYlSK264wIgghBmXc6fuuMCIIIQZ6C5X7rjAhoYFhQDSjD4RvLgTPhCbuMAIZPU0dDe03/6QNTR0PpA0gDU0ds8MNs88gBBFUYC5PhJJNs8+QDIz4oAQMv/ydDHBfLkTNs8cvsC+EwloLV/+GwBjjVTAfhJU1b4SvhLcMjPhYDKAHPPQM5xzwtuVVDIz5HDYn8mzst/VTDIzlUgyM5ZyM7Mzc3NzZohyM+FCM6Ab89A4smBAICmArUH+wBfBC1JA+ww+Eby4Ez4Qm7jANMf+ERYb3X4ZNHbPCGOJSPQ0wH6QDAxyM+HIM6NBAAAAAAAAAAAAAAAAA5l3On4zxbMyXCOLvhEIG8TIW8S+ElVAm8RyHLPQMoAc89AzgH6AvQAgGrPQPhEbxXPCx/MyfhEbxTi+wDjAPIAQRc8ATT4RHBvcoBAb3Rwb3H4ZPhBiMjPjits1szOyUsDRjD4RvLgTPhCbuMAIZPU0dDe03/6QNTR0PpA1NHbPDDbPPIAQRlGARb4S/hJxwXy4+jbPDUD8DD4RvLgTPhCbuMA0x/4RFhvdfhk0ds8IY4mI9DTAfpAMDHIz4cgzo0EAAAAAAAAAAAAAAAADJaVh/jPFst/yXCOL/hEIG8TIW8S+ElVAm8RyHLPQMoAc89AzgH6AvQAgGrPQPhEbxXPCx/Lf8n4RG8U4vsA4wDyAEEbPAAg+ERwb3KAQG90cG9x+GT4TARQIIIQMgTsKbrjAiCCEEOE8pi64wIgghBEV0KEuuMCIIIQRqnX7LrjAiMhHx0DSjD4RvLgTPhCbuMAIZPU0dDe03/6QNTR0PpA0gDU0ds8MNs88gBBHkYBzPhL+EnHBfLj6CTCAPLkGiT4TLvy5CQj+kJvE9cL/8MAJPgoxwWzsPLkBts8cPsC+EwlobV/+GwC+EtVE3/Iz4WAygBzz0DOcc8LblVAyM+RnoLlfst/zlUgyM7KAMzNzcmBAID7AEkD4jD4RvLgTPhCbuMA0x/4RFhvdfhk0ds8IY4dI9DTAfpAMDHIz4cgznHPC2EByM+TEV0KEs7NyXCOMfhEIG8TIW8S+ElVAm8RyHLPQMoAc89AzgH6AvQAcc8LaQHI+ERvFc8LH87NyfhEbxTi+wDjAPIAQSA8ACD4RHBvcoBAb3Rwb3H4ZPhKA0Aw+Eby4Ez4Qm7jACGT1NHQ3tN/+kDSANTR2zww2zzyAEEiRgHw+Er4SccF8uPy2zxy+wL4TCSgtX/4bAGOMlRwEvhK+EtwyM+FgMoAc89AznHPC25VMMjPkep7eK7Oy39ZyM7Mzc3JgQCApgK1B/sAjigh+kJvE9cL/8MAIvgoxwWzsI4UIcjPhQjOgG/PQMmBAICmArUH+wDe4l8DSQP0MPhG8uBM+EJu4wDTH/hEWG91+GTTH9HbPCGOJiPQ0wH6QDAxyM+HIM6NBAAAAAAAAAAAAAAAAAsgTsKYzxbKAMlwji/4RCBvEyFvEvhJVQJvEchyz0DKAHPPQM4B+gL0AIBqz0D4RG8VzwsfygDJ+ERvFOL7AOMA8gBBJDwAmvhEcG9ygEBvdHBvcfhkIIIQMgTsKbohghBPR5+juiKCECpKxD66I4IQViVIrbokghAML/INuiWCEH7cHTe6VQWCEA8CWKq6sbGxsbGxBFAgghATMqkxuuMCIIIQFaA4+7rjAiCCEB8BMpG64wIgghAg68dtuuMCLiooJgM0MPhG8uBM+EJu4wAhk9TR0N76QNHbPOMA8gBBJzwBQvhL+EnHBfLj6Ns8cPsCyM+FCM6Ab89AyYEAgKYCtQf7AEoD4jD4RvLgTPhCbuMA0x/4RFhvdfhk0ds8IY4dI9DTAfpAMDHIz4cgznHPC2EByM+SfATKRs7NyXCOMfhEIG8TIW8S+ElVAm8RyHLPQMoAc89AzgH6AvQAcc8LaQHI+ERvFc8LH87NyfhEbxTi+wDjAPIAQSk8ACD4RHBvcoBAb3Rwb3H4ZPhLA0ww+Eby4Ez4Qm7jACGW1NMf1NHQk9TTH+L6QNTR0PpA0ds84wDyAEErPAJ4+En4SscFII6A3/LgZNs8cPsCIPpCbxPXC//DACH4KMcFs7COFCDIz4UIzoBvz0DJgQCApgK1B/sA3l8ELEkBJjAh2zz5AMjPigBAy//J0PhJxwUtAFRwyMv/cG2AQPRD+EpxWIBA9BYBcliAQPQWyPQAyfhOyM+EgPQA9ADPgckD8DD4RvLgTPhCbuMA0x/4RFhvdfhk0ds8IY4mI9DTAfpAMDHIz4cgzo0EAAAAAAAAAAAAAAAACTMqkxjPFssfyXCOL/hEIG8TIW8S+ElVAm8RyHLPQMoAc89AzgH6AvQAgGrPQPhEbxXPCx/LH8n4RG8U4vsA4wDyAEEvPAAg+ERwb3KAQG90cG9x+GT4TQRMIIIIhX76uuMCIIILNpGZuuMCIIIQDC/yDbrjAiCCEA8CWKq64wI7NjMxAzYw+Eby4Ez4Qm7jACGT1NHQ3vpA0ds8MNs88gBBMkYAQvhL+EnHBfLj6PhM8tQuyM+FCM6Ab89AyYEAgKYgtQf7AANGMPhG8uBM+EJu4wAhk9TR0N7Tf/pA1NHQ+kDU0ds8MNs88gBBNEYBFvhK+EnHBfLj8ts8NQGaI8IA8uQaI/hMu/LkJNs8cPsC+EwkobV/+GwC+EtVA/hKf8jPhYDKAHPPQM5xzwtuVUDIz5BkrUbGy3/OVSDIzlnIzszNzc3JgQCA+wBJA0Qw+Eby4Ez4Qm7jACGW1NMf1NHQk9TTH+L6QNHbPDDbPPIAQTdGAij4SvhJxwXy4/L4TSK6joCOgOJfAzo4AXL4SsjO+EsBzvhMAct/+E0Byx9SIMsfUhDO+E4BzCP7BCPQIIs4rbNYxwWT103Q3tdM0O0e7VPJ2zw5AATwAgEy2zxw+wIgyM+FCM6Ab89AyYEAgKYCtQf7AEkD7DD4RvLgTPhCbuMA0x/4RFhvdfhk0ds8IY4lI9DTAfpAMDHIz4cgzo0EAAAAAAAAAAAAAAAACAhX76jPFszJcI4u+EQgbxMhbxL4SVUCbxHIcs9AygBzz0DOAfoC9ACAas9A+ERvFc8LH8zJ+ERvFOL7AOMA8gBBPTwAKO1E0NP/0z8x+ENYyMv/yz/Oye1UACD4RHBvcoBAb3Rwb3H4ZPhOAAr4RvLgTAO8IdYfMfhG8uBM+EJu4wDbPHL7AiDTHzIgghBnoLlfuo49IdN/M/hMIaC1f/hs+EkB+Er4S3DIz4WAygBzz0DOcc8LblUgyM+Qn0I3ps7LfwHIzs3NyYEAgKYCtQf7AEFJQAGMjkAgghAZK1Gxuo41IdN/M/hMIaC1f/hs+Er4S3DIz4WAygBzz0DOcc8LblnIz5BwyoK2zst/zcmBAICmArUH+wDe4lvbPEYASu1E0NP/0z/TADH6QNTR0PpA03/TH9TR+G74bfhs+Gv4avhj+GICCvSkIPShREMAFHNvbCAwLjU3LjEELKAAAAAC2zxy+wKJ+GqJ+Gtw+Gxw+G1JSEhFA6aI+G6JAdAg+kD6QNN/0x/TH/pAN15A+Gr4a/hsMPhtMtQw+G4g+kJvE9cL/8MAIfgoxwWzsI4UIMjPhQjOgG/PQMmBAICmArUH+wDeMNs8+A/yAEdIRgBG+E74TfhM+Ev4SvhD+ELIy//LP8+DzlUwyM7Lf8sfzM3J7VQAAABDgAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAEAEe+CdvEGim/mChtX/bPLYJSgAMghAF9eEAAAwg+GHtHtk=";
const DICT_CELLS: &str =
    "te6ccgEBCAEAMAABAcABAgPPQAUCAgEgBAMACQAAADqgAAkAAABQYAIBIAcGAAkAAAAe4AAJAAAAbCA=";

const NO_INDEX_NO_CRC: ser::Options = ser::Options {
    with_index: false,
    with_crc: false,
    with_cache_bits: false,
    flags: 0,
};

fn random_tree(rng: &mut XorShiftRng, max_depth: usize) -> CellRef {
    let cell_type = match rng.gen_range(0..8) {
        0 => CellType::PrunedBranch,
        1 => CellType::LibraryReference,
        2 => CellType::MerkleProof,
        3 => CellType::MerkleUpdate,
        _ => CellType::Ordinary,
    };
    let max_bits = if cell_type.is_exotic() {
        MAX_EXOTIC_BIT_LEN
    } else {
        MAX_BIT_LEN
    };

    let mut bits = BitString::new();
    for _ in 0..rng.gen_range(0..=max_bits) {
        bits.store_bit(rng.gen()).unwrap();
    }

    let mut cell = Cell::new(cell_type, bits, []).unwrap();
    if max_depth > 0 {
        for _ in 0..rng.gen_range(0..=4) {
            let child = match cell.references().last() {
                // Reuse the previous child sometimes
                Some(prev) if rng.gen_ratio(1, 4) => prev.clone(),
                _ => random_tree(rng, max_depth - 1),
            };
            cell.push_reference(child).unwrap();
        }
    }
    cell.into_ref()
}

fn chain(len: usize) -> CellRef {
    let mut cell = Cell::empty().into_ref();
    for i in 0..len {
        let mut bits = BitString::new();
        bits.store_u32(i as u32).unwrap();
        let mut next = Cell::ordinary(bits);
        next.push_reference(cell).unwrap();
        cell = next.into_ref();
    }
    cell
}

#[test]
fn known_containers_are_reproduced() {
    for boc in [CELL_WITH_17_BITS, CONTRACT_CODE, DICT_CELLS] {
        let data = decode_base64(boc).unwrap();
        let cell = Boc::decode(&data).unwrap();

        let encoded = Boc::encode_with(&cell, NO_INDEX_NO_CRC);
        assert_eq!(encoded, data);
    }
}

#[test]
fn known_hashes() {
    let cell = Boc::decode_base64(CELL_WITH_17_BITS).unwrap();
    assert_eq!(
        cell.repr_hash().to_string(),
        "c7ba51d53c5d69465a8db42169f90bb3b2322f856859ae23fd729fc885670407"
    );
    assert_eq!(cell.repr_depth(), 0);

    let cell = Boc::decode_base64(DICT_CELLS).unwrap();
    assert_eq!(
        cell.repr_hash().to_string(),
        "4bf271459eaed0d24aa2cef2fae5d87327cce9f4cf69f0b83e50ddf9128ee6db"
    );
    assert_eq!(cell.repr_depth(), 3);

    let cell = Boc::decode_base64(CONTRACT_CODE).unwrap();
    assert_eq!(
        cell.repr_hash().to_string(),
        "3f6602aa1baa20ae46859741cc2338f866ffa54dd8e737af39035aac90b2b7d9"
    );
    assert_eq!(cell.repr_depth(), 10);
}

#[test]
fn default_encoding() {
    let cell = Boc::decode_base64(CELL_WITH_17_BITS).unwrap();
    assert_eq!(Boc::encode_base64(&cell), "te6ccsEBAQEABQAFAAW9t8ChX/Tp");

    let cell = Boc::decode_base64(DICT_CELLS).unwrap();
    assert_eq!(
        Boc::encode_base64(&cell),
        "te6ccsEBCAEAMAAECg8WHSIpMAEBwAECA89ABQICASAEAwAJAAAAOqAACQAAAFBgAgEgBwYACQAAAB7gAAkAAABsIHLrDvs="
    );
}

#[test]
fn boc_with_crc() {
    let boc_without_crc = decode_base64(CONTRACT_CODE).unwrap();
    let cell = Boc::decode(&boc_without_crc).unwrap();

    let mut boc_with_crc = Vec::new();
    ser::BocHeader::with_root(&cell)
        .with_index(false)
        .with_crc(true)
        .encode(&mut boc_with_crc);
    assert_eq!(boc_without_crc.len() + 4, boc_with_crc.len());

    let decoded = Boc::decode(&boc_with_crc).unwrap();
    assert_eq!(decoded.as_ref(), cell.as_ref());

    let last_byte = boc_with_crc.last_mut().unwrap();
    *last_byte = !*last_byte;

    assert_eq!(Boc::decode(&boc_with_crc), Err(de::Error::InvalidChecksum));
}

#[test]
fn empty_cell_container() {
    let cell = Cell::empty();
    let data = Boc::encode_with(&cell, NO_INDEX_NO_CRC);

    // magic, flags, offset size, 3 counters, total size, root index, cell
    let ref_size = 1;
    let offset_size = 1;
    assert_eq!(
        data.len(),
        4 + 1 + 1 + 3 * ref_size + offset_size + ref_size + 2
    );
    assert_eq!(
        data,
        [0xb5, 0xee, 0x9c, 0x72, 0x01, 0x01, 1, 1, 0, 2, 0, 0x00, 0x00]
    );

    let decoded = Boc::decode(&data).unwrap();
    assert_eq!(decoded.repr_hash(), cell.repr_hash());
    assert_eq!(decoded.repr_hash(), crate::cell::EMPTY_CELL_HASH);
}

#[test]
fn random_round_trip() {
    let options = [
        ser::Options::default(),
        NO_INDEX_NO_CRC,
        ser::Options {
            with_index: true,
            with_crc: false,
            with_cache_bits: true,
            flags: 0b10,
        },
        ser::Options {
            with_index: false,
            with_crc: true,
            with_cache_bits: false,
            flags: 0b01,
        },
    ];

    for seed in 0..32 {
        let mut rng = XorShiftRng::seed_from_u64(seed);
        let cell = random_tree(&mut rng, 5);

        let mut ctx = HashContext::new();
        let hash = ctx.hash(&cell);
        let depth = ctx.depth(&cell);

        for options in options {
            let data = Boc::encode_with(&cell, options);
            let decoded = Boc::decode(&data).unwrap();
            assert_eq!(decoded.repr_hash(), hash, "seed: {seed}");
            assert_eq!(decoded.repr_depth(), depth, "seed: {seed}");

            // Encoding is deterministic
            assert_eq!(Boc::encode_with(&decoded, options), data, "seed: {seed}");
        }
    }
}

#[test]
fn round_trip_preserves_structure() {
    let mut rng = XorShiftRng::seed_from_u64(123);
    let cell = random_tree(&mut rng, 4);
    let decoded = Boc::decode(Boc::encode(&cell)).unwrap();

    let mut stack = vec![(cell.as_ref(), decoded.as_ref())];
    while let Some((original, decoded)) = stack.pop() {
        assert_eq!(original.cell_type(), decoded.cell_type());
        assert_eq!(original.bits(), decoded.bits());
        assert_eq!(original.references().len(), decoded.references().len());
        for (a, b) in original.references().iter().zip(decoded.references()) {
            stack.push((a.as_ref(), b.as_ref()));
        }
    }
}

#[test]
fn legacy_tags() {
    let cell = Boc::decode_base64(DICT_CELLS).unwrap();

    let mut data = Boc::encode_with(
        &cell,
        ser::Options {
            with_crc: false,
            ..Default::default()
        },
    );
    let ref_size = data[4] & 0b111;

    data[..4].copy_from_slice(&BocTag::Indexed.to_bytes());
    data[4] = ref_size;
    assert_eq!(Boc::decode(&data).unwrap().repr_hash(), cell.repr_hash());

    let mut data = Boc::encode(&cell);
    data.truncate(data.len() - 4);
    data[..4].copy_from_slice(&BocTag::IndexedCrc32.to_bytes());
    data[4] = ref_size;
    let crc = crc32c::crc32c(&data);
    data.extend_from_slice(&crc.to_le_bytes());
    assert_eq!(Boc::decode(&data).unwrap().repr_hash(), cell.repr_hash());

    // Legacy tags always imply an index
    let data = Boc::encode_with(&cell, NO_INDEX_NO_CRC);
    let mut legacy = data.clone();
    legacy[..4].copy_from_slice(&BocTag::Indexed.to_bytes());
    legacy[4] = ref_size;
    assert!(Boc::decode(&legacy).is_err());
}

#[test]
fn any_byte_flip_is_detected() {
    let mut rng = XorShiftRng::seed_from_u64(42);
    let cell = random_tree(&mut rng, 3);
    let data = Boc::encode(&cell);

    let ref_size = (data[4] & 0b111) as usize;
    let offset_size = data[5] as usize;
    let root_list_offset = 6 + ref_size * 3 + offset_size;

    for i in 0..data.len() {
        let mut data = data.clone();
        data[i] ^= 0x5a;

        let res = Boc::decode(&data);
        if i >= root_list_offset {
            assert_eq!(res, Err(de::Error::InvalidChecksum), "byte: {i}");
        } else {
            assert!(res.is_err(), "byte: {i}");
        }
    }
}

#[test]
fn truncated_containers() {
    let cell = Boc::decode_base64(DICT_CELLS).unwrap();
    let data = Boc::encode(&cell);

    for len in 0..data.len() {
        assert!(
            matches!(Boc::decode(&data[..len]), Err(de::Error::UnexpectedEof(_))),
            "len: {len}"
        );
    }
}

#[test]
fn trailing_bytes() {
    let cell = Boc::decode_base64(DICT_CELLS).unwrap();
    for options in [ser::Options::default(), NO_INDEX_NO_CRC] {
        let mut data = Boc::encode_with(&cell, options);
        data.push(0);
        assert_eq!(Boc::decode(&data), Err(de::Error::TrailingBytes));
    }
}

#[test]
fn broken_topological_order() {
    let header = |cells: u8, total: u8| {
        let mut data = BocTag::Generic.to_bytes().to_vec();
        // flags, offset size, cells, roots, absent, total size, root index
        data.extend_from_slice(&[0x01, 0x01, cells, 1, 0, total, 0]);
        data
    };

    // Self reference
    let mut data = header(1, 3);
    data.extend_from_slice(&[0x01, 0x00, 0x00]);
    assert_eq!(Boc::decode(&data), Err(de::Error::InvalidRefOrder));

    // Cycle between two cells
    let mut data = header(2, 6);
    data.extend_from_slice(&[0x01, 0x00, 0x01]);
    data.extend_from_slice(&[0x01, 0x00, 0x00]);
    assert_eq!(Boc::decode(&data), Err(de::Error::InvalidRefOrder));

    // Backward reference to the parent
    let mut data = header(3, 8);
    data.extend_from_slice(&[0x01, 0x00, 0x01]);
    data.extend_from_slice(&[0x00, 0x00]);
    data.extend_from_slice(&[0x01, 0x00, 0x01]);
    assert_eq!(Boc::decode(&data), Err(de::Error::InvalidRefOrder));

    // Out of bounds
    let mut data = header(1, 3);
    data.extend_from_slice(&[0x01, 0x00, 0x05]);
    assert_eq!(Boc::decode(&data), Err(de::Error::InvalidRef));

    // Correct order
    let mut data = header(2, 5);
    data.extend_from_slice(&[0x01, 0x00, 0x01]);
    data.extend_from_slice(&[0x00, 0x00]);
    let cell = Boc::decode(&data).unwrap();
    assert_eq!(cell.references().len(), 1);
}

#[test]
fn invalid_cells() {
    let container = |cell: &[u8]| {
        let mut data = BocTag::Generic.to_bytes().to_vec();
        data.extend_from_slice(&[0x01, 0x01, 1, 1, 0, cell.len() as u8, 0]);
        data.extend_from_slice(cell);
        data
    };

    // Unknown exotic type
    assert_eq!(
        Boc::decode(container(&[0x08, 0x02, 0x07])),
        Err(de::Error::UnknownCellType(7))
    );
    // Missing padding marker
    assert_eq!(
        Boc::decode(container(&[0x00, 0x01, 0x00])),
        Err(de::Error::UnnormalizedCell)
    );
    // Inline hashes
    assert_eq!(
        Boc::decode(container(&[0x10, 0x00])),
        Err(de::Error::InvalidCell)
    );
    // Known exotic type
    let cell = Boc::decode(container(&[0x08, 0x02, 0x03])).unwrap();
    assert_eq!(cell.cell_type(), CellType::MerkleProof);
    assert!(cell.bits().is_empty());
}

#[test]
fn shared_subtree() {
    let mut bits = BitString::new();
    bits.store_u64(0x0123456789abcdef).unwrap();
    let child = Cell::ordinary(bits).into_ref();
    let root = Cell::new(CellType::Ordinary, BitString::new(), [child.clone(), child]).unwrap();

    let mut ctx = HashContext::new();
    ctx.hash(&root);
    assert_eq!(ctx.hashes_computed(), 2);

    let data = Boc::encode(&root);
    let header = BocHeader::decode(&data, &de::Options::default()).unwrap();
    assert_eq!(header.cell_count(), 2);

    let decoded = Boc::decode(&data).unwrap();
    let [a, b] = decoded.references() else {
        panic!("expected two references");
    };
    assert_eq!(a.repr_hash(), b.repr_hash());
    assert_eq!(decoded.repr_hash(), root.repr_hash());
}

#[test]
fn multiple_roots() {
    let mut data = BocTag::Generic.to_bytes().to_vec();
    // flags, offset size, cells, roots, absent, total size, root list
    data.extend_from_slice(&[0x01, 0x01, 2, 2, 0, 5, 1, 0]);
    data.extend_from_slice(&[0x00, 0x02, 0xaa]);
    data.extend_from_slice(&[0x00, 0x00]);

    let roots = Boc::decode_all(&data).unwrap();
    assert_eq!(roots.len(), 2);
    assert!(roots[0].bits().is_empty());
    assert_eq!(roots[1].bits().as_raw_data(), [0xaa]);

    assert_eq!(Boc::decode(&data), Err(de::Error::TooManyRootCells));

    let options = de::Options {
        min_roots: Some(3),
        max_roots: None,
    };
    assert_eq!(
        Boc::decode_ext(&data, &options),
        Err(de::Error::TooFewRootCells)
    );
}

#[test]
fn many_roots() {
    const COUNT: u8 = 33;

    let mut data = BocTag::Generic.to_bytes().to_vec();
    // flags, offset size, cells, roots, absent, total size
    data.extend_from_slice(&[0x01, 0x01, COUNT, COUNT, 0, COUNT * 3]);
    data.extend(0..COUNT);
    for i in 0..COUNT {
        data.extend_from_slice(&[0x00, 0x02, i]);
    }

    let roots = Boc::decode_all(&data).unwrap();
    assert_eq!(roots.len(), COUNT as usize);
    for (i, root) in roots.iter().enumerate() {
        assert_eq!(root.bits().as_raw_data(), [i as u8]);
    }

    let options = de::Options {
        min_roots: None,
        max_roots: Some(32),
    };
    assert_eq!(
        Boc::decode_ext(&data, &options),
        Err(de::Error::TooManyRootCells)
    );
}

#[test]
fn depth_overflow() {
    let cell = chain(u16::MAX as usize);
    assert_eq!(cell.repr_depth(), u16::MAX);
    let data = Boc::encode_with(&cell, NO_INDEX_NO_CRC);
    assert_eq!(Boc::decode(&data).unwrap().repr_depth(), u16::MAX);

    let cell = chain(u16::MAX as usize + 1);
    let data = Boc::encode_with(&cell, NO_INDEX_NO_CRC);
    assert_eq!(Boc::decode(&data), Err(de::Error::DepthOverflow));
}

#[test]
fn base64_helpers() {
    let cell = Boc::decode_base64(DICT_CELLS).unwrap();
    let encoded = Boc::encode_base64(&cell);
    assert_eq!(Boc::decode_base64(&encoded).unwrap(), cell);

    assert_eq!(
        Boc::decode_base64("not a base64!"),
        Err(de::Error::InvalidBase64)
    );
}

#[test]
fn detect_tag() {
    assert!(Boc::has_tag(&decode_base64(DICT_CELLS).unwrap()));
    assert!(Boc::has_tag(&BocTag::Indexed.to_bytes()));
    assert!(!Boc::has_tag(&[0xb5, 0xee, 0x9c]));
    assert!(!Boc::has_tag(&[0; 8]));
}

#[cfg(feature = "serde")]
#[derive(::serde::Serialize, ::serde::Deserialize)]
struct SerdeWithHashBytes {
    some_hash: crate::cell::HashBytes,
}

#[cfg(feature = "serde")]
#[derive(::serde::Serialize, ::serde::Deserialize)]
struct SerdeWithCellRef {
    #[serde(with = "Boc")]
    some_cell: CellRef,
}

#[cfg(feature = "serde")]
#[test]
fn hex_bytes() {
    let hash = crate::cell::HashBytes(rand::random());

    let test = format!(r#"{{"some_hash":"{hash}"}}"#);
    let SerdeWithHashBytes { some_hash } = serde_json::from_str(&test).unwrap();
    assert_eq!(some_hash, hash);

    let serialized = serde_json::to_string(&SerdeWithHashBytes { some_hash }).unwrap();
    assert_eq!(serialized, test);

    assert!(serde_json::from_str::<SerdeWithHashBytes>(r#"{"some_hash":"abcd"}"#).is_err());
}

#[cfg(feature = "serde")]
#[test]
fn struct_with_cell() {
    let boc = "te6ccgEBAQEAWwAAsUgBUkKKaORs1v/d2CpkdS1rueLjL5EbgaivG/SlIBcUZ5cAKkhRTRyNmt/7uwVMjqWtdzxcZfIjcDUV436UpALijPLQ7msoAAYUWGAAAD6o4PtmhMeK8nJA";

    let test = format!(r#"{{"some_cell":"{boc}"}}"#);
    let SerdeWithCellRef { some_cell } = serde_json::from_str(&test).unwrap();

    let original = Boc::decode_base64(boc).unwrap();
    assert_eq!(some_cell.as_ref(), original.as_ref());

    // Default encoding adds index and CRC32C
    let serialized = serde_json::to_string(&SerdeWithCellRef { some_cell }).unwrap();
    let SerdeWithCellRef { some_cell } = serde_json::from_str(&serialized).unwrap();
    assert_eq!(some_cell.as_ref(), original.as_ref());

    assert!(serde_json::from_str::<SerdeWithCellRef>(r#"{"some_cell":"te6cc"}"#).is_err());
}
