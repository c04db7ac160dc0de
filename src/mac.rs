use pnet::util::MacAddr;

use crate::error::WolError;

const MAC_DELIMITERS: [char; 2] = [ ':', '-' ];

/// Parses `AA:BB:CC:DD:EE:FF`, `aa-bb-cc-dd-ee-ff` or `AABBCCDDEEFF`.
///
/// Delimiters are stripped first, so what remains must be exactly twelve hex
/// digits. Nothing else is accepted.
pub fn parse_mac(input: &str) -> Result<MacAddr, WolError> {
    let digits: String = input
        .chars()
        .filter(|c| !MAC_DELIMITERS.contains(c))
        .collect();

    // from_str_radix tolerates a leading '+', so check the digits up front
    if digits.len() != 12 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(WolError::Format(input.to_string()));
    }

    let mut octets = [0u8; 6];
    for (i, octet) in octets.iter_mut().enumerate() {
        *octet = u8::from_str_radix(&digits[i * 2..i * 2 + 2], 16)
            .map_err(|_| WolError::Format(input.to_string()))?;
    }

    Ok(MacAddr::new(octets[0], octets[1], octets[2], octets[3], octets[4], octets[5]))
}

/// Canonical upper-case, colon separated form.
pub fn format_mac(mac: MacAddr) -> String {
    format!(
        "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
        mac.0, mac.1, mac.2, mac.3, mac.4, mac.5
    )
}
