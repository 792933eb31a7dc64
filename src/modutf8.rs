//! Encoder for the JVM's modified-UTF-8, used inside `Utf8` constant-pool entries.
//!
//! `U+0000` is encoded as two bytes instead of one, and there is no 4-byte form: code
//! points outside the BMP are represented as a pair of 3-byte surrogate encodings. The
//! rewriting path never needs to decode this encoding back to text, matching and patching
//! both operate directly on the encoded bytes, so only the encoder is exposed here.

/// Encodes `text` into modified UTF-8, exactly sizing the returned buffer.
pub fn encode(text: &str) -> Vec<u8> {
    cesu8::to_java_cesu8(text).into_owned()
}

/// Computes the modified-UTF-8 encoded length of `text` without allocating a `Vec`.
pub fn byte_size(text: &str) -> usize {
    cesu8::to_java_cesu8(text).len()
}
