//! # LTM Checksum
//!
//! LTM protects each frame with a single trailing byte: the XOR of every
//! payload byte. The preamble and the frame type tag are not covered.
//!
//! This catches single-bit flips and most short bursts. It is not meant to
//! resist anything deliberate.

/// Calculate the LTM checksum of a payload
///
/// # Arguments
///
/// * `payload` - Payload bytes (everything between the tag and the checksum)
///
/// # Returns
///
/// * `u8` - XOR of all bytes, `0x00` for an empty payload
///
/// # Examples
///
/// ```no_run
/// use ltm_telemetry::ltm::checksum::xor_checksum;
///
/// let payload = [0xD8, 0x2E, 0x58, 0x02, 0x5A, 0x14, 0x05];
/// let checksum = xor_checksum(&payload);
/// ```
pub fn xor_checksum(payload: &[u8]) -> u8 {
    payload.iter().fold(0u8, |acc, &byte| acc ^ byte)
}
