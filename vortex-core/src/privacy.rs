//! IP anonymization applied before analytics rows are written.

use std::net::IpAddr;

/// Anonymize a client IP.
///
/// - IPv4: last octet replaced with `0` (`203.0.113.77` -> `203.0.113.0`)
/// - IPv6: text after the last `:` replaced with `0000`
/// - anything unparseable: empty string
pub fn anonymize_ip(ip: &str) -> String {
    let ip = ip.trim();
    match ip.parse::<IpAddr>() {
        Ok(IpAddr::V4(_)) => match ip.rfind('.') {
            Some(pos) => format!("{}.0", &ip[..pos]),
            None => String::new(),
        },
        Ok(IpAddr::V6(_)) => match ip.rfind(':') {
            Some(pos) => format!("{}:0000", &ip[..pos]),
            None => String::new(),
        },
        Err(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ipv4_last_octet_zeroed() {
        assert_eq!(anonymize_ip("203.0.113.77"), "203.0.113.0");
        assert_eq!(anonymize_ip("10.0.0.0"), "10.0.0.0");
        assert_eq!(anonymize_ip(" 192.168.1.254 "), "192.168.1.0");
    }

    #[test]
    fn test_ipv6_last_group_replaced() {
        assert_eq!(
            anonymize_ip("2001:db8:85a3:0:0:8a2e:370:7334"),
            "2001:db8:85a3:0:0:8a2e:370:0000"
        );
        assert_eq!(anonymize_ip("::1"), ":0000");
        assert_eq!(anonymize_ip("fe80::1ff:fe23:4567:890a"), "fe80::1ff:fe23:4567:0000");
    }

    #[test]
    fn test_invalid_input_is_blank() {
        assert_eq!(anonymize_ip(""), "");
        assert_eq!(anonymize_ip("not-an-ip"), "");
        assert_eq!(anonymize_ip("300.1.1.1"), "");
    }
}
