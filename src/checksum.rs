/// Internet checksum (RFC 1071).
///
/// Words are read in network byte order and the result is meant to be written
/// back with `to_be_bytes`. A trailing odd byte is the high byte of a
/// zero-padded word.
pub fn checksum(mut data: &[u8]) -> u16 {
    let mut sum: u32 = 0;
    while data.len() >= 2 {
        sum = sum.wrapping_add(u16::from_be_bytes([data[0], data[1]]) as u32);
        data = &data[2..];
    }
    if let Some(&last) = data.first() {
        sum = sum.wrapping_add((last as u32) << 8);
    }
    while (sum >> 16) != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    !(sum as u16)
}

/// True when `data` already carries a correct checksum.
pub fn verify(data: &[u8]) -> bool {
    checksum(data) == 0
}
