/// Derive a worker seed from a base seed and a (stream, index) pair.
///
/// Every search trial and ensemble member gets its own deterministic seed,
/// so parallel workers never share random state and a run is reproducible
/// from the base seed alone. Splitmix64 finalizer.
#[inline]
pub fn derive_seed(base: u64, stream: u64, index: u64) -> u64 {
    let mut z = base
        ^ stream.wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ index.wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
