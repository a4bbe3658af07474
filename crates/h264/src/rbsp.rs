/// Strips emulation prevention bytes from an escaped NAL unit payload.
///
/// Every `0x03` that follows two `0x00` bytes is dropped, turning the
/// escaped byte sequence payload (EBSP) back into the raw byte sequence
/// payload (RBSP) that the Exp-Golomb fields are coded in.
///
/// ISO/IEC-14496-10-2022 - 7.4.1.1
pub fn ebsp_to_rbsp(ebsp: &[u8]) -> Vec<u8> {
    let mut rbsp = Vec::with_capacity(ebsp.len());
    let mut zero_count = 0u8;

    for &byte in ebsp {
        match byte {
            0x03 if zero_count >= 2 => {
                zero_count = 0;
                continue;
            }
            0x00 => zero_count = zero_count.saturating_add(1),
            _ => zero_count = 0,
        }

        rbsp.push(byte);
    }

    rbsp
}
