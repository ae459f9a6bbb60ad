//! Character sets of FIG 1 labels

/// Enumeration of label character sets
#[derive(Clone, Eq, Hash, PartialEq, Debug, Copy)]
pub enum Charset {
    /// Complete EBU Latin based repertoire
    EbuLatin,
    /// ISO/IEC 8859-1
    Latin1,
    /// ISO/IEC 10646 in UCS-2 (big-endian)
    Ucs2,
    /// ISO/IEC 10646 in UTF-8
    Utf8,
}

impl Charset {
    /// Returns character set signalled in the 4-bit charset field, falling back to EBU Latin for
    /// reserved values.
    #[must_use]
    pub fn from_field(field: u8) -> Self {
        match field {
            4 => Charset::Latin1,
            6 => Charset::Ucs2,
            15 => Charset::Utf8,
            _ => Charset::EbuLatin,
        }
    }
}

/// Code points of EBU Latin characters `0x80` to `0xFF`
const EBU_LATIN_HIGH: [u16; 128] = [
    0x00E1, 0x00E0, 0x00E9, 0x00E8, 0x00ED, 0x00EC, 0x00F3, 0x00F2, 0x00FA, 0x00F9, 0x00D1, 0x00C7,
    0x015E, 0x00DF, 0x00A1, 0x0178, 0x00E2, 0x00E4, 0x00EA, 0x00EB, 0x00EE, 0x00EF, 0x00F4, 0x00F6,
    0x00FB, 0x00FC, 0x00F1, 0x00E7, 0x015F, 0x011F, 0x0131, 0x00FF, 0x0136, 0x0145, 0x00A9, 0x0122,
    0x011E, 0x011B, 0x0148, 0x0151, 0x0150, 0x20AC, 0x00A3, 0x0024, 0x0100, 0x0112, 0x012A, 0x016A,
    0x0137, 0x0146, 0x013B, 0x0123, 0x013C, 0x0130, 0x0144, 0x0171, 0x0170, 0x00BF, 0x013E, 0x00B0,
    0x0101, 0x0113, 0x012B, 0x016B, 0x00C1, 0x00C0, 0x00C9, 0x00C8, 0x00CD, 0x00CC, 0x00D3, 0x00D2,
    0x00DA, 0x00D9, 0x0158, 0x010C, 0x0160, 0x017D, 0x00D0, 0x013F, 0x00C2, 0x00C4, 0x00CA, 0x00CB,
    0x00CE, 0x00CF, 0x00D4, 0x00D6, 0x00DB, 0x00DC, 0x0159, 0x010D, 0x0161, 0x017E, 0x0111, 0x0140,
    0x00C3, 0x00C5, 0x00C6, 0x0152, 0x0177, 0x00DD, 0x00D5, 0x00D8, 0x00DE, 0x014A, 0x0154, 0x0106,
    0x015A, 0x0179, 0x0166, 0x00F0, 0x00E3, 0x00E5, 0x00E6, 0x0153, 0x0175, 0x00FD, 0x00F5, 0x00F8,
    0x00FE, 0x014B, 0x0155, 0x0107, 0x015B, 0x017A, 0x0167, 0x0020,
];

/// Positions below `0x80` where EBU Latin differs from ASCII
const EBU_LATIN_LOW: [(u8, char); 9] = [
    (0x24, '\u{0142}'),
    (0x5C, '\u{016E}'),
    (0x5E, '\u{0141}'),
    (0x60, '\u{0104}'),
    (0x7B, '\u{00AB}'),
    (0x7C, '\u{016F}'),
    (0x7D, '\u{00BB}'),
    (0x7E, '\u{013D}'),
    (0x7F, '\u{0126}'),
];

/// Returns label decoded from raw bytes, without trailing spaces.
///
/// Control characters other than the line break are dropped. EBU Latin follows ASCII from `0x20`
/// to `0x7F` except at the positions listed in `EBU_LATIN_LOW`.
///
/// # Examples
///
/// ```
/// use dabcore::fib::{decode_label, Charset};
///
/// assert_eq!(decode_label(b"Radio \x82t\x82  ", Charset::EbuLatin), "Radio été");
/// assert_eq!(decode_label(b"Caf\xe9", Charset::Latin1), "Café");
/// ```
#[must_use]
pub fn decode_label(raw: &[u8], charset: Charset) -> String {
    let label: String = match charset {
        Charset::EbuLatin => raw.iter().filter_map(|&byte| ebu_latin(byte)).collect(),
        Charset::Latin1 => raw
            .iter()
            .filter(|&&byte| byte >= 0x20 || byte == 0x0A)
            .map(|&byte| char::from(byte))
            .collect(),
        Charset::Ucs2 => char::decode_utf16(
            raw.chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]])),
        )
        .filter_map(Result::ok)
        .filter(|&c| c != '\0')
        .collect(),
        Charset::Utf8 => String::from_utf8_lossy(raw)
            .chars()
            .filter(|&c| c != '\0')
            .collect(),
    };
    label.trim_end().to_string()
}

/// Returns the short label: the characters of a single-byte label selected by the flag field.
#[must_use]
pub fn short_label(raw: &[u8], flags: u16, charset: Charset) -> String {
    let selected: Vec<u8> = raw
        .iter()
        .take(16)
        .enumerate()
        .filter(|&(k, _)| (flags >> (15 - k)) & 1 == 1)
        .map(|(_, &byte)| byte)
        .collect();
    decode_label(&selected, charset).trim_start().to_string()
}

/// Returns character for an EBU Latin byte.
fn ebu_latin(byte: u8) -> Option<char> {
    match byte {
        0x0A => Some('\n'),
        0x20 ..= 0x7F => Some(
            EBU_LATIN_LOW
                .iter()
                .find(|&&(code, _)| code == byte)
                .map_or(char::from(byte), |&(_, c)| c),
        ),
        0x80 ..= 0xFF => char::from_u32(u32::from(EBU_LATIN_HIGH[usize::from(byte - 0x80)])),
        _ => None,
    }
}

#[cfg(test)]
mod tests_of_functions {
    use super::*;

    #[test]
    fn test_from_field() {
        assert_eq!(Charset::from_field(0), Charset::EbuLatin);
        assert_eq!(Charset::from_field(4), Charset::Latin1);
        assert_eq!(Charset::from_field(6), Charset::Ucs2);
        assert_eq!(Charset::from_field(15), Charset::Utf8);
        assert_eq!(Charset::from_field(9), Charset::EbuLatin);
    }

    #[test]
    fn test_decode_label() {
        assert_eq!(decode_label(b"BBC Radio 4     ", Charset::EbuLatin), "BBC Radio 4");
        assert_eq!(decode_label(b"\xa9\x8d", Charset::EbuLatin), "€ß");
        assert_eq!(decode_label(b"A\x01B", Charset::EbuLatin), "AB");
        // Positions where EBU Latin departs from ASCII
        assert_eq!(decode_label(b"$^`~", Charset::EbuLatin), "łŁĄĽ");
        assert_eq!(decode_label(b"\\{|}\x7f", Charset::EbuLatin), "Ů«ů»Ħ");
        assert_eq!(decode_label(b"#%[]_az", Charset::EbuLatin), "#%[]_az");
        // Latin-1 keeps the ASCII meaning
        assert_eq!(decode_label(b"$~", Charset::Latin1), "$~");
        assert_eq!(
            decode_label("Köln".as_bytes(), Charset::Utf8),
            "Köln".to_string()
        );
        assert_eq!(
            decode_label(&[0x00, 0x41, 0x04, 0x14, 0x00, 0x20], Charset::Ucs2),
            "AД"
        );
    }

    #[test]
    fn test_short_label() {
        let raw = b"Classic FM Radio";
        assert_eq!(short_label(raw, 0xFFC0, Charset::EbuLatin), "Classic FM");
        assert_eq!(short_label(raw, 0x0000, Charset::EbuLatin), "");
        assert_eq!(short_label(raw, 0x8080, Charset::EbuLatin), "CF");
    }
}
