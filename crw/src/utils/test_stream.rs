//! Canonical encoder for synthesising compressed streams in tests.

use std::io;

use bitstream_io::{BigEndian, BitWrite, BitWriter};

use crate::utils::huffman::HuffmanTable;

#[derive(Debug, Default)]
pub(crate) struct StreamBuilder {
    bits: Vec<bool>,
}

impl StreamBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bits(&mut self, value: u32, len: u32) -> &mut Self {
        for shift in (0..len).rev() {
            self.bits.push((value >> shift) & 1 != 0);
        }
        self
    }

    pub fn symbol(&mut self, table: &HuffmanTable, symbol: u8) -> &mut Self {
        let code = table
            .code_for(symbol)
            .unwrap_or_else(|| panic!("symbol {symbol:#04x} is not in the table"));
        self.bits(code.code as u32, code.length as u32)
    }

    /// Appends a symbol for `run` zeros followed by `value`, plus its magnitude bits.
    pub fn coefficient(&mut self, table: &HuffmanTable, run: u8, value: i32) -> &mut Self {
        let (raw, len) = magnitude_bits(value);
        self.symbol(table, (run << 4) | len as u8);
        self.bits(raw, len)
    }

    pub fn bit_len(&self) -> u64 {
        self.bits.len() as u64
    }

    /// Packs the bits MSB-first, zero-pads the last byte and applies byte stuffing.
    pub fn finish(&self) -> Vec<u8> {
        let mut packed = Vec::new();
        write_bits(&mut packed, &self.bits).expect("writing to a Vec cannot fail");

        let mut stuffed = Vec::with_capacity(packed.len());
        for byte in packed {
            stuffed.push(byte);
            if byte == 0xFF {
                stuffed.push(0x00);
            }
        }
        stuffed
    }
}

fn write_bits(out: &mut Vec<u8>, bits: &[bool]) -> io::Result<()> {
    let mut writer = BitWriter::<_, BigEndian>::new(out);
    for &bit in bits {
        writer.write_bit(bit)?;
    }
    writer.byte_align()
}

/// JPEG magnitude category and raw bits of a signed value.
pub(crate) fn magnitude_bits(value: i32) -> (u32, u32) {
    if value == 0 {
        return (0, 0);
    }

    let len = 32 - value.unsigned_abs().leading_zeros();
    let raw = if value > 0 {
        value as u32
    } else {
        (value + (1 << len) - 1) as u32
    };
    (raw, len)
}

/// Deterministic pseudo-random bytes for stress tests.
pub(crate) fn noise(seed: u32, len: usize) -> Vec<u8> {
    let mut state = seed;
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state >> 24) as u8
        })
        .collect()
}

#[test]
fn magnitude_bits_invert_sign_extension() {
    for value in [-1023, -100, -8, -1, 1, 2, 7, 100, 1023] {
        let (raw, len) = magnitude_bits(value);
        assert_eq!(HuffmanTable::sign_extend(raw, len), value);
    }
    assert_eq!(magnitude_bits(100), (100, 7));
    assert_eq!(magnitude_bits(-4), (0b011, 3));
}
