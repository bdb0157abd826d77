// SPDX-License-Identifier: MIT

pub fn pretty_bytes(n: u64) -> String {
    const UNITS: [&str; 7] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];
    let mut val = n as f64;
    let mut idx = 0usize;
    while val >= 1024.0 && idx + 1 < UNITS.len() {
        val /= 1024.0;
        idx += 1;
    }
    if idx == 0 {
        format!("{} {}", sep_u64(n), UNITS[idx])
    } else {
        format!("{:.1} {} ({} B)", val, UNITS[idx], sep_u64(n))
    }
}

/// Groups digits by thousands: `12 345 678`.
pub fn sep_u64(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(c);
    }
    out
}

/// Quotes `s` for a POSIX shell when it holds anything but plain path
/// characters.
pub fn shell_quote(s: &str) -> String {
    let plain = !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./+,:@".contains(c));
    if plain {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes() {
        assert_eq!(pretty_bytes(10), "10 B");
        assert_eq!(pretty_bytes(1023), "1 023 B");
        assert_eq!(pretty_bytes(34_603_008), "33.0 MiB (34 603 008 B)");
    }

    #[test]
    fn thousands() {
        assert_eq!(sep_u64(0), "0");
        assert_eq!(sep_u64(999), "999");
        assert_eq!(sep_u64(1_000), "1 000");
        assert_eq!(sep_u64(12_345_678), "12 345 678");
    }

    #[test]
    fn quoting() {
        assert_eq!(shell_quote("Setup.bin.img"), "Setup.bin.img");
        assert_eq!(shell_quote("/tmp/a b.img"), "'/tmp/a b.img'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(shell_quote(""), "''");
    }
}
