// ABOUTME: TP-Data-Coding-Scheme interpretation with the raw octet kept verbatim
// ABOUTME: Derives alphabet, message class and compression from the DCS coding groups

/// Character alphabet selected by the DCS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Alphabet {
    Gsm7,
    EightBit,
    Ucs2,
}

/// Cached interpretation of the raw TP-DCS octet.
///
/// The raw byte is preserved verbatim and re-emitted on encode; the
/// decoded fields are derived views. Coding groups, most significant
/// nibble first:
///
/// - groups 00xx/01xx: bit 5 compression, bits 3-2 alphabet, bit 4
///   gates the class in bits 1-0 (class 0 counts as present)
/// - 0xE0: UCS-2 message-waiting group, no class
/// - 0xF0: data-coding/message-class group, GSM 7-bit, class in bits 1-0
/// - 0xC0: message-waiting discard group, 8-bit, no class
/// - anything else falls back to GSM 7-bit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DataCodingScheme {
    raw: u8,
    alphabet: Alphabet,
    message_class: Option<u8>,
    compressed: bool,
}

impl DataCodingScheme {
    /// Interprets a raw DCS octet.
    pub fn from_raw(raw: u8) -> Self {
        let (alphabet, message_class, compressed) = Self::interpret(raw);
        Self {
            raw,
            alphabet,
            message_class,
            compressed,
        }
    }

    fn interpret(dcs: u8) -> (Alphabet, Option<u8>, bool) {
        if dcs & 0xC0 == 0x00 || dcs & 0xC0 == 0x40 {
            let compressed = dcs & 0x20 != 0;
            let alphabet = match (dcs >> 2) & 0x03 {
                1 => Alphabet::EightBit,
                2 => Alphabet::Ucs2,
                _ => Alphabet::Gsm7,
            };
            let message_class = (dcs & 0x10 != 0).then_some(dcs & 0x03);
            return (alphabet, message_class, compressed);
        }
        match dcs & 0xF0 {
            0xE0 => (Alphabet::Ucs2, None, false),
            0xF0 => (Alphabet::Gsm7, Some(dcs & 0x03), false),
            0xC0 => (Alphabet::EightBit, None, false),
            _ => (Alphabet::Gsm7, None, false),
        }
    }

    /// Builds the canonical octet for an alphabet/class/compression
    /// combination within coding group 00.
    pub fn for_alphabet(
        alphabet: Alphabet,
        message_class: Option<u8>,
        compressed: bool,
    ) -> Self {
        let mut raw = match alphabet {
            Alphabet::Gsm7 => 0x00,
            Alphabet::EightBit => 0x04,
            Alphabet::Ucs2 => 0x08,
        };
        if compressed {
            raw |= 0x20;
        }
        if let Some(class) = message_class {
            raw |= 0x10 | (class & 0x03);
        }
        Self::from_raw(raw)
    }

    /// The verbatim DCS octet.
    pub fn raw(&self) -> u8 {
        self.raw
    }

    pub fn alphabet(&self) -> Alphabet {
        self.alphabet
    }

    pub fn message_class(&self) -> Option<u8> {
        self.message_class
    }

    pub fn compressed(&self) -> bool {
        self.compressed
    }
}

impl Default for DataCodingScheme {
    fn default() -> Self {
        Self::from_raw(0x00)
    }
}

impl From<u8> for DataCodingScheme {
    fn from(raw: u8) -> Self {
        Self::from_raw(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn general_group_alphabets() {
        assert_eq!(DataCodingScheme::from_raw(0x00).alphabet(), Alphabet::Gsm7);
        assert_eq!(
            DataCodingScheme::from_raw(0x04).alphabet(),
            Alphabet::EightBit
        );
        assert_eq!(DataCodingScheme::from_raw(0x08).alphabet(), Alphabet::Ucs2);
        // Reserved alphabet selector 3 falls back to GSM 7-bit.
        assert_eq!(DataCodingScheme::from_raw(0x0C).alphabet(), Alphabet::Gsm7);
    }

    #[test]
    fn compression_and_class_bits() {
        let dcs = DataCodingScheme::from_raw(0x20);
        assert!(dcs.compressed());
        assert_eq!(dcs.message_class(), None);

        let dcs = DataCodingScheme::from_raw(0x13);
        assert!(!dcs.compressed());
        assert_eq!(dcs.message_class(), Some(3));
    }

    #[test]
    fn class_zero_with_class_bit_is_present() {
        // Bit 4 set with class bits 00: class 0 is a valid present class.
        assert_eq!(DataCodingScheme::from_raw(0x10).message_class(), Some(0));
    }

    #[test]
    fn high_coding_groups() {
        let dcs = DataCodingScheme::from_raw(0xE4);
        assert_eq!(dcs.alphabet(), Alphabet::Ucs2);
        assert_eq!(dcs.message_class(), None);

        let dcs = DataCodingScheme::from_raw(0xF2);
        assert_eq!(dcs.alphabet(), Alphabet::Gsm7);
        assert_eq!(dcs.message_class(), Some(2));

        let dcs = DataCodingScheme::from_raw(0xC8);
        assert_eq!(dcs.alphabet(), Alphabet::EightBit);
        assert_eq!(dcs.message_class(), None);

        // 0xD0 group has no special meaning here and defaults to GSM 7-bit.
        let dcs = DataCodingScheme::from_raw(0xD5);
        assert_eq!(dcs.alphabet(), Alphabet::Gsm7);
        assert_eq!(dcs.message_class(), None);
    }

    #[test]
    fn raw_byte_preserved_verbatim() {
        for raw in 0..=255u8 {
            assert_eq!(DataCodingScheme::from_raw(raw).raw(), raw);
        }
    }

    #[test]
    fn for_alphabet_builds_canonical_bytes() {
        assert_eq!(
            DataCodingScheme::for_alphabet(Alphabet::Gsm7, None, false).raw(),
            0x00
        );
        assert_eq!(
            DataCodingScheme::for_alphabet(Alphabet::EightBit, None, false).raw(),
            0x04
        );
        assert_eq!(
            DataCodingScheme::for_alphabet(Alphabet::Ucs2, None, false).raw(),
            0x08
        );
        assert_eq!(
            DataCodingScheme::for_alphabet(Alphabet::Gsm7, Some(1), true).raw(),
            0x31
        );
        let dcs = DataCodingScheme::for_alphabet(Alphabet::Ucs2, Some(2), false);
        assert_eq!(dcs.raw(), 0x1A);
        assert_eq!(dcs.alphabet(), Alphabet::Ucs2);
        assert_eq!(dcs.message_class(), Some(2));
    }
}
