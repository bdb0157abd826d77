// SPDX-License-Identifier: MIT

use crate::{
    core::{
        errors::*,
        resolver::FileAttributes,
        utils::{checksum_utils::sfn_checksum, time_utils},
    },
    fs::fat32::{constant::*, types::Fat32LFNEntry},
};

/// FAT `(date, time, tenths)` for an entry carrying `attr`.
pub fn datetime_from_attr(attr: &FileAttributes) -> (u16, u16, u8) {
    time_utils::fat_datetime(attr.modified.unwrap_or_else(time_utils::fixed_timestamp))
}

/// Characters never allowed in a FAT name, long or short.
#[inline]
fn is_forbidden_char(c: char) -> bool {
    (c as u32) < 0x20 || c == '\u{7F}' || "\"*/:<>?\\|".contains(c)
}

/// Allowed characters in SFN (after uppercase):
/// A–Z, 0–9 and !$%'-_@~`^#&(){}.
#[inline(always)]
fn is_valid_sfn_char(b: u8) -> bool {
    matches!(b,
        b'A'..=b'Z' | b'0'..=b'9' |
        b'!' | b'$' | b'%' | b'\'' | b'-' | b'_' | b'@' | b'~' | b'`' |
        b'^' | b'#' | b'&' | b'(' | b')' | b'{' | b'}'
    )
}

/// Checks that `name` can be stored as a single directory entry.
pub fn validate_name(name: &str) -> FsInjectorResult {
    crate::ensure!(!name.is_empty(), FsInjectorError::InvalidName("empty name"));
    crate::ensure!(
        name != "." && name != "..",
        FsInjectorError::InvalidName("reserved name")
    );
    crate::ensure!(
        name.encode_utf16().count() <= FAT_MAX_LFN_CHARS,
        FsInjectorError::InvalidName("longer than 255 UTF-16 units")
    );
    crate::ensure!(
        !name.chars().any(is_forbidden_char),
        FsInjectorError::InvalidName("character not allowed in a FAT name")
    );
    crate::ensure!(
        !name.ends_with('.') && !name.ends_with(' '),
        FsInjectorError::InvalidName("trailing dot or space")
    );
    Ok(())
}

/// Short-name candidate derived from a long name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShortName {
    pub raw: [u8; 11],
    /// `FAT_NT_LOWER_BASE` / `FAT_NT_LOWER_EXT` bits.
    pub nt_case: u8,
    /// The long name must be kept in LFN slots.
    pub needs_lfn: bool,
    /// Characters were dropped or replaced; a `~N` tail is mandatory.
    pub lossy: bool,
}

impl ShortName {
    pub fn checksum(&self) -> u8 {
        sfn_checksum(&self.raw)
    }
}

#[derive(PartialEq, Eq, Clone, Copy)]
enum Case {
    None,
    Upper,
    Lower,
    Mixed,
}

fn case_of(part: &str) -> Case {
    let upper = part.bytes().any(|b| b.is_ascii_uppercase());
    let lower = part.bytes().any(|b| b.is_ascii_lowercase());
    match (upper, lower) {
        (false, false) => Case::None,
        (true, false) => Case::Upper,
        (false, true) => Case::Lower,
        (true, true) => Case::Mixed,
    }
}

/// Maps one part of a long name into `out`; returns `true` when the mapping
/// lost information.
fn fill_short_part(part: &str, out: &mut [u8]) -> bool {
    let mut lossy = false;
    let mut i = 0;
    for c in part.chars() {
        if c == ' ' || c == '.' {
            lossy = true;
            continue;
        }
        if i == out.len() {
            return true;
        }
        let up = if c.is_ascii() {
            (c as u8).to_ascii_uppercase()
        } else {
            b'_'
        };
        let up = if is_valid_sfn_char(up) { up } else { b'_' };
        lossy |= up == b'_' && c != '_';
        out[i] = up;
        i += 1;
    }
    lossy
}

/// Derives the 8.3 basis name of `name`.
///
/// A name that already is a valid 8.3 name keeps it verbatim; one whose base
/// and extension are each all-lower-case is stored upper-case with the NT
/// case bits set and needs no LFN.
pub fn to_short_name(name: &str) -> ShortName {
    let (base, ext) = match name.rfind('.') {
        Some(pos) if pos > 0 => (&name[..pos], &name[pos + 1..]),
        _ => (name, ""),
    };
    let base = base.trim_start_matches('.');

    let mut raw = [b' '; 11];
    let mut lossy = fill_short_part(base, &mut raw[..8]);
    lossy |= fill_short_part(ext, &mut raw[8..]);
    lossy |= base.is_empty() || name.starts_with('.');

    if raw[0] == FAT_ENTRY_DELETED {
        raw[0] = FAT_KANJI_E5;
    }

    let (bc, ec) = (case_of(base), case_of(ext));
    let mut nt_case = 0;
    if bc == Case::Lower {
        nt_case |= FAT_NT_LOWER_BASE;
    }
    if ec == Case::Lower {
        nt_case |= FAT_NT_LOWER_EXT;
    }
    let needs_lfn = lossy || bc == Case::Mixed || ec == Case::Mixed;

    ShortName {
        raw,
        nt_case: if needs_lfn { 0 } else { nt_case },
        needs_lfn,
        lossy,
    }
}

/// Applies the `~n` numeric tail to a basis name.
pub fn with_numeric_tail(raw: &[u8; 11], n: u32) -> [u8; 11] {
    let tail = format!("~{n}");
    let base_len = raw[..8].iter().position(|&b| b == b' ').unwrap_or(8);
    let keep = base_len.min(8 - tail.len());

    let mut out = *raw;
    out[keep..keep + tail.len()].copy_from_slice(tail.as_bytes());
    for b in &mut out[keep + tail.len()..8] {
        *b = b' ';
    }
    out
}

/// Decodes an 8.3 entry name, honoring the NT lower-case bits.
pub fn decode_sfn(sfn: &[u8; 11], nt_case: u8) -> FsParsingResult<String> {
    let mut raw = *sfn;
    if raw[0] == FAT_KANJI_E5 {
        raw[0] = FAT_ENTRY_DELETED;
    }
    let part = |bytes: &[u8], lower: bool| -> String {
        let len = bytes.iter().rposition(|&b| b != b' ').map_or(0, |p| p + 1);
        bytes[..len]
            .iter()
            .map(|&b| {
                let c = char::from(b);
                if lower { c.to_ascii_lowercase() } else { c }
            })
            .collect()
    };

    let name = part(&raw[..8], nt_case & FAT_NT_LOWER_BASE != 0);
    let ext = part(&raw[8..], nt_case & FAT_NT_LOWER_EXT != 0);
    if name.is_empty() {
        return Err(FsParsingError::Invalid("Empty SFN"));
    }
    if ext.is_empty() {
        Ok(name)
    } else {
        Ok(format!("{name}.{ext}"))
    }
}

/// Decode LFN entries (disk order) into a UTF-8 filename
pub fn decode_lfn(lfns: &[Fat32LFNEntry]) -> FsParsingResult<String> {
    if lfns.len() * FAT_LFN_CHARS_PER_ENTRY > FAT_MAX_LFN_CHARS + FAT_LFN_CHARS_PER_ENTRY {
        return Err(FsParsingError::Invalid("LFN too long"));
    }

    let mut name_utf16 = Vec::with_capacity(lfns.len() * FAT_LFN_CHARS_PER_ENTRY);
    'outer: for entry in lfns.iter().rev() {
        for c in entry.extract_utf16() {
            if c == 0x0000 {
                break 'outer;
            }
            if c == 0xFFFF {
                continue;
            }
            name_utf16.push(c);
        }
    }

    String::from_utf16(&name_utf16).map_err(|_| FsParsingError::Invalid("Invalid LFN"))
}

/// LFN slots for `name`, in disk order (`0x40|N` first, `1` last).
pub fn lfn_entries(name: &str, short: &[u8; 11]) -> Vec<Fat32LFNEntry> {
    let name_utf16: Vec<u16> = name.encode_utf16().collect();
    let count = name_utf16.len().div_ceil(FAT_LFN_CHARS_PER_ENTRY).max(1);
    let checksum = sfn_checksum(short);

    let mut out: Vec<Fat32LFNEntry> = name_utf16
        .chunks(FAT_LFN_CHARS_PER_ENTRY)
        .enumerate()
        .map(|(i, chunk)| {
            let mut chars = [0xFFFFu16; FAT_LFN_CHARS_PER_ENTRY];
            chars[..chunk.len()].copy_from_slice(chunk);
            if chunk.len() < FAT_LFN_CHARS_PER_ENTRY {
                chars[chunk.len()] = 0x0000;
            }
            Fat32LFNEntry::new((i + 1) as u8, i + 1 == count, &chars, checksum)
        })
        .collect();

    out.reverse();
    out
}

/// Case-insensitive name comparison, as FAT lookups do.
pub fn fat_name_eq(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_uppercase)
        .eq(b.chars().flat_map(char::to_uppercase))
}
