use bit_vec::BitVec;

use crate::common::{MAX_CODE_SIZE, MAX_SUB_BLOCK_SIZE};

pub fn bit_vec_for_source_bytes(data: &[u8]) -> BitVec {
    BitVec::from_fn(data.len() * 8, |x| (data[x / 8] >> (x % 8)) & 0b1 == 1)
}

// codes are stored least significant bit first
pub fn read_bits(bits: &BitVec, offset: usize, total: u8) -> u16 {
    let mut result = 0;

    for i in 0..total as usize {
        if bits[offset + i] {
            result |= 1 << i;
        }
    }

    result
}

/// Joins the payload of a sub-block sequence. Returns the payload and the number of bytes consumed,
/// including the terminating empty sub-block.
pub fn read_sub_blocks(data: &[u8]) -> (Vec<u8>, usize) {
    let mut payload = Vec::new();
    let mut offset = 0;

    loop {
        let size = data[offset] as usize;
        assert!(size <= MAX_SUB_BLOCK_SIZE);
        offset += 1;

        if size == 0 {
            return (payload, offset);
        }

        payload.extend_from_slice(&data[offset..offset + size]);
        offset += size;
    }
}

pub struct DecodedStream {
    pub symbols: Vec<u8>,
    pub clear_codes: usize,
}

pub fn decode_lzw(data: &[u8], min_code_size: u8) -> DecodedStream {
    let bits = bit_vec_for_source_bytes(data);
    let clear_code = 1u16 << min_code_size;
    let end_code = clear_code + 1;

    let mut dictionary: Vec<Vec<u8>> = Vec::new();
    init_dictionary(&mut dictionary, clear_code);

    let mut code_size = min_code_size + 1;
    let mut offset = 0;
    let mut prev_code: Option<usize> = None;
    let mut symbols = Vec::new();
    let mut clear_codes = 0;

    while offset + code_size as usize <= bits.len() {
        let code = read_bits(&bits, offset, code_size);
        offset += code_size as usize;

        if code == clear_code {
            init_dictionary(&mut dictionary, clear_code);
            code_size = min_code_size + 1;
            prev_code = None;
            clear_codes += 1;
            continue;
        }

        if code == end_code {
            return DecodedStream {
                symbols,
                clear_codes,
            };
        }

        let code = code as usize;
        let entry = if code < dictionary.len() {
            dictionary[code].clone()
        } else {
            // match to an entry that has just been encoded.
            let prev_code = prev_code.expect("expected prev code to be present for a code not yet in the dictionary");
            let mut entry = dictionary[prev_code].clone();
            entry.push(entry[0]);
            entry
        };

        if let Some(prev_code) = prev_code {
            if dictionary.len() < 4096 {
                let mut new_entry = dictionary[prev_code].clone();
                new_entry.push(entry[0]);
                dictionary.push(new_entry);
            }
        }

        symbols.extend_from_slice(&entry);
        prev_code = Some(code);

        if dictionary.len() == 1 << code_size && code_size < MAX_CODE_SIZE {
            code_size += 1;
        }
    }

    panic!("lzw stream ended without end of information code");
}

fn init_dictionary(dictionary: &mut Vec<Vec<u8>>, clear_code: u16) {
    dictionary.clear();

    for i in 0..clear_code {
        dictionary.push(vec![i as u8]);
    }

    // clear and end of information codes
    dictionary.push(Vec::new());
    dictionary.push(Vec::new());
}
