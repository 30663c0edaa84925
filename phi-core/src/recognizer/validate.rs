//! Format and checksum validators run on a regex match before it becomes a
//! candidate. A validator only accepts or rejects; it never adjusts scores.

use std::net::{Ipv4Addr, Ipv6Addr};

/// A validator receives the matched text only (no surrounding context).
pub type Validator = fn(&str) -> bool;

fn digits(s: &str) -> Vec<u32> {
    s.chars().filter_map(|c| c.to_digit(10)).collect()
}

/// SSN: area not 000, 666 or 900–999; group not 00; serial not 0000.
/// Accepts `DDD-DD-DDDD` and `DDDDDDDDD`.
pub fn ssn(s: &str) -> bool {
    let d = digits(s);
    if d.len() != 9 {
        return false;
    }
    let area = d[0] * 100 + d[1] * 10 + d[2];
    let group = d[3] * 10 + d[4];
    let serial = d[5] * 1000 + d[6] * 100 + d[7] * 10 + d[8];
    area != 0 && area != 666 && area < 900 && group != 0 && serial != 0
}

/// ITIN: `9DD-DD-DDDD` with the group in 70–88, 90–92 or 94–99.
pub fn itin(s: &str) -> bool {
    let d = digits(s);
    if d.len() != 9 || d[0] != 9 {
        return false;
    }
    let group = d[3] * 10 + d[4];
    matches!(group, 70..=88 | 90..=92 | 94..=99)
}

/// Luhn mod-10 over the digits of `s`, ignoring separators.
pub fn luhn(s: &str) -> bool {
    let d = digits(s);
    if d.len() < 13 || d.len() > 19 {
        return false;
    }
    let sum: u32 = d
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &n)| {
            if i % 2 == 1 {
                let doubled = n * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                n
            }
        })
        .sum();
    sum % 10 == 0
}

/// DEA registration number: two letters + 7 digits where
/// `(d1 + d3 + d5) + 2 * (d2 + d4 + d6)` ends in `d7`.
pub fn dea(s: &str) -> bool {
    let d = digits(s);
    if d.len() != 7 {
        return false;
    }
    let check = (d[0] + d[2] + d[4]) + 2 * (d[1] + d[3] + d[5]);
    check % 10 == d[6]
}

/// Mixed identifier shapes (plates, VINs, health plan suffixes) must carry at
/// least one digit; plates also at least one letter.
pub fn has_digit(s: &str) -> bool {
    s.chars().any(|c| c.is_ascii_digit())
}

pub fn has_letter_and_digit(s: &str) -> bool {
    has_digit(s) && s.chars().any(|c| c.is_ascii_alphabetic())
}

pub fn ipv4(s: &str) -> bool {
    s.parse::<Ipv4Addr>().is_ok()
}

pub fn ipv6(s: &str) -> bool {
    s.parse::<Ipv6Addr>().is_ok() && s.chars().any(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ssn_reserved_ranges() {
        assert!(ssn("123-45-6789"));
        assert!(ssn("123456789"));
        assert!(!ssn("000-12-3456"));
        assert!(!ssn("666-12-3456"));
        assert!(!ssn("900-12-3456"));
        assert!(!ssn("999-12-3456"));
        assert!(!ssn("123-00-4567"));
        assert!(!ssn("123-45-0000"));
    }

    #[test]
    fn test_itin_groups() {
        assert!(itin("942-80-1234"));
        assert!(itin("912-70-1234"));
        assert!(itin("912-92-1234"));
        assert!(itin("912-99-1234"));
        assert!(!itin("912-89-1234"));
        assert!(!itin("912-93-1234"));
        assert!(!itin("812-80-1234"));
    }

    #[test]
    fn test_luhn() {
        assert!(luhn("4111-1111-1111-1111"));
        assert!(luhn("4111 1111 1111 1111"));
        assert!(!luhn("4111-1111-1111-1112"));
        assert!(!luhn("411111"));
    }

    #[test]
    fn test_dea_checksum() {
        // 1+3+5 = 9, 2*(2+4+6) = 24, 33 → 3
        assert!(dea("AB1234563"));
        assert!(!dea("AB1234564"));
    }

    #[test]
    fn test_ip_parsers() {
        assert!(ipv4("192.168.1.1"));
        assert!(!ipv4("256.1.1.1"));
        assert!(ipv6("2001:db8::1"));
        assert!(!ipv6("10:30:45"));
        assert!(!ipv6("::"));
    }
}
