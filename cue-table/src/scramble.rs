//! XOR unscrambling for obfuscated containers.
//!
//! Shipped cue banks are often XOR-scrambled whole-file, keystream seeded
//! from a fixed constant. The decoder applies the transform exactly once,
//! and only when the plain signature is absent; the encoder never
//! re-scrambles.

/// Keystream seed.
pub const SCRAMBLE_SEED: u32 = 0x655F;

/// Keystream multiplier.
pub const SCRAMBLE_MULT: u32 = 0x4115;

/// XOR the buffer against the keystream, in place.
///
/// Each byte is XORed with the low byte of a multiplicative LCG state that
/// advances per byte. XOR makes the transform its own inverse, which is
/// also why running it over already-plain bytes scrambles them; callers
/// must check the signature before calling this.
pub fn unscramble(data: &mut [u8]) {
    let mut state = SCRAMBLE_SEED;
    for byte in data.iter_mut() {
        *byte ^= (state & 0xFF) as u8;
        state = state.wrapping_mul(SCRAMBLE_MULT);
    }
}
