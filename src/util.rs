// SPDX-License-Identifier: Apache-2.0

/// Check if the n-th bit is set.
///
/// Bits are 0-indexed, from the LSB.
pub(crate) fn is_bit_set<B>(value: B, index: usize) -> bool
where
    B: num_traits::PrimInt + num_traits::Unsigned,
{
    (value & (B::one() << index)) > B::zero()
}

/// Unpack big-endian byte pairs into 16-bit words.
///
/// Panics if `bytes` is not exactly twice as long as `words`; all callers use fixed-size
/// buffers.
pub(crate) fn be_bytes_to_words(bytes: &[u8], words: &mut [u16]) {
    assert_eq!(bytes.len(), words.len() * 2);
    for (word, pair) in words.iter_mut().zip(bytes.chunks_exact(2)) {
        *word = u16::from_be_bytes([pair[0], pair[1]]);
    }
}
