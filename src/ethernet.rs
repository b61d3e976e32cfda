pub const HEADER_LEN: usize = 14;
pub const ETH_P_IP: u16 = 0x0800;

/// Returns the IPv4 payload of an Ethernet II frame, or `None` for anything
/// else.
pub fn strip_ethernet(frame: &[u8]) -> Option<&[u8]> {
    if frame.len() < HEADER_LEN {
        return None;
    }
    let eth_type = u16::from_be_bytes([frame[12], frame[13]]);
    if eth_type != ETH_P_IP {
        return None;
    }
    Some(&frame[HEADER_LEN..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_ipv4_frame() {
        let mut data = [0u8; 18];
        data[0..6].copy_from_slice(&[0x01, 0x02, 0x03, 0x04, 0x05, 0x06]);
        data[6..12].copy_from_slice(&[0x11, 0x12, 0x13, 0x14, 0x15, 0x16]);
        data[12..14].copy_from_slice(&ETH_P_IP.to_be_bytes());
        data[14..18].copy_from_slice(&[0xAA, 0xBB, 0xCC, 0xDD]);

        assert_eq!(strip_ethernet(&data), Some(&[0xAA, 0xBB, 0xCC, 0xDD][..]));
    }

    #[test]
    fn test_other_ethertypes() {
        let mut data = [0u8; 20];
        data[12..14].copy_from_slice(&0x0806u16.to_be_bytes());
        assert!(strip_ethernet(&data).is_none());
        data[12..14].copy_from_slice(&0x86DDu16.to_be_bytes());
        assert!(strip_ethernet(&data).is_none());
    }

    #[test]
    fn test_too_short() {
        assert!(strip_ethernet(&[0u8; 13]).is_none());
    }
}
