/// Decrypt a message payload with the position-dependent XOR scheme.
///
/// Each byte is shifted by its 1-based position within the run, truncated to
/// eight bits and complemented. The whole run must be decrypted before UTF-8
/// decoding is attempted: multi-byte sequences only become valid once every
/// byte of the run is restored.
pub fn decrypt(data: &[u8]) -> Vec<u8> {
    data.iter()
        .zip(1usize..)
        .map(|(&value, position)| value.wrapping_add(position as u8) ^ 0xFF)
        .collect()
}
