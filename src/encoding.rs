use encoding_rs::Encoding;

/// Possible errors to occur while decoding raw input
#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    #[error("The encoding of the input could not be detected")]
    Undetected,
    #[error("The detected encoding '{0}' is not supported")]
    Unsupported(String),
}

/// A statistical guesser for the character encoding of raw bytes
pub trait Detector {
    /// Returns the label of the most likely encoding, if there is one
    fn detect(&self, bytes: &[u8]) -> Option<String>;
}

/// The default [`Detector`], backed by `chardetng`
#[derive(Clone, Copy, Debug, Default)]
pub struct Chardet;

impl Detector for Chardet {
    fn detect(&self, bytes: &[u8]) -> Option<String> {
        let mut detector = chardetng::EncodingDetector::new();
        detector.feed(bytes, true);

        Some(detector.guess(None, true).name().to_owned())
    }
}

/// Turns raw bytes of an unknown encoding into UTF-8 text
///
/// QIF files carry no encoding declaration. Exports from older banking
/// software are commonly Latin-1 or one of the Windows code pages, so the
/// encoding is guessed from the bytes themselves.
#[derive(Clone, Debug, Default)]
pub struct EncodingResolver<D = Chardet> {
    detector: D,
}

impl EncodingResolver {
    /// Creates a resolver using the default detector
    pub fn new() -> Self {
        Self::default()
    }
}

impl<D: Detector> EncodingResolver<D> {
    /// Creates a resolver using a custom detector
    pub fn with_detector(detector: D) -> Self {
        Self { detector }
    }

    /// Decodes the bytes into text
    ///
    /// A byte order mark decides the encoding on its own. Otherwise input
    /// detected as UTF-8 or ASCII is read as UTF-8 directly, anything else is
    /// converted from the detected encoding. Malformed sequences are replaced
    /// with U+FFFD.
    pub fn decode(&self, bytes: &[u8]) -> Result<String, EncodingError> {
        if let Some((encoding, _)) = Encoding::for_bom(bytes) {
            log::debug!("input starts with a {} byte order mark", encoding.name());
            return Ok(decode_with(encoding, bytes));
        }

        let label = self.detector
            .detect(bytes)
            .ok_or(EncodingError::Undetected)?;
        log::debug!("detected input encoding {label}");

        let encoding = match is_utf8_compatible(&label) {
            true => encoding_rs::UTF_8,
            false => Encoding::for_label(label.as_bytes())
                // the replacement encoding decodes everything into a single U+FFFD
                .filter(|encoding| *encoding != encoding_rs::REPLACEMENT)
                .ok_or_else(|| EncodingError::Unsupported(label.clone()))?,
        };

        Ok(decode_with(encoding, bytes))
    }
}

fn decode_with(encoding: &'static Encoding, bytes: &[u8]) -> String {
    let (text, malformed) = encoding.decode_with_bom_removal(bytes);
    if malformed {
        log::warn!("input contains sequences that are invalid in {}", encoding.name());
    }

    text.into_owned()
}

/// Decodes the bytes into text using the default detector
///
/// See [`EncodingResolver::decode`].
pub fn decode(bytes: &[u8]) -> Result<String, EncodingError> {
    EncodingResolver::new().decode(bytes)
}

fn is_utf8_compatible(label: &str) -> bool {
    label.eq_ignore_ascii_case("UTF-8") || label.eq_ignore_ascii_case("ASCII")
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Option<&'static str>);

    impl Detector for Fixed {
        fn detect(&self, _: &[u8]) -> Option<String> {
            self.0.map(str::to_owned)
        }
    }

    #[test]
    fn utf8_input() {
        let text = decode("!Type:Bank\nPZürich Café\n^\n".as_bytes()).unwrap();
        assert_eq!(text, "!Type:Bank\nPZürich Café\n^\n");
    }

    #[test]
    fn ascii_label_reads_utf8() {
        let resolver = EncodingResolver::with_detector(Fixed(Some("ascii")));
        assert_eq!(resolver.decode(b"!Type:Bank\n").unwrap(), "!Type:Bank\n");
    }

    #[test]
    fn utf8_bom_is_removed() {
        let resolver = EncodingResolver::with_detector(Fixed(Some("utf-8")));
        let text = resolver.decode(b"\xEF\xBB\xBF!Type:Bank\n").unwrap();
        assert_eq!(text, "!Type:Bank\n");
    }

    #[test]
    fn latin1_is_converted() {
        let resolver = EncodingResolver::with_detector(Fixed(Some("ISO-8859-1")));
        let text = resolver.decode(b"PCaf\xe9 M\xfcller").unwrap();
        assert_eq!(text, "PCafé Müller");
    }

    #[test]
    fn windows_1252_is_detected() {
        let bytes = b"!Type:Bank\n\
            D3/4/2021\n\
            T-12,50\n\
            PB\xe4ckerei M\xfcller Stra\xdfe\n\
            MBr\xf6tchen f\xfcr das Fr\xfchst\xfcck, gr\xf6\xdfere T\xfcte, \xc4pfel und K\xe4se\n\
            ^\n";
        let text = decode(bytes).unwrap();

        assert!(text.contains("Bäckerei Müller Straße"));
        assert!(!text.contains('\u{FFFD}'));
    }

    fn utf16(text: &str, little_endian: bool) -> Vec<u8> {
        let mut bytes = match little_endian {
            true => vec![0xFF, 0xFE],
            false => vec![0xFE, 0xFF],
        };
        for unit in text.encode_utf16() {
            match little_endian {
                true => bytes.extend_from_slice(&unit.to_le_bytes()),
                false => bytes.extend_from_slice(&unit.to_be_bytes()),
            }
        }

        bytes
    }

    #[test]
    fn utf16le_with_bom() {
        let text = "!Type:Bank\r\nD1/2/2023\r\nT10\r\nPZürich\r\n^\r\n";
        assert_eq!(decode(&utf16(text, true)).unwrap(), text);
    }

    #[test]
    fn utf16be_with_bom() {
        let text = "!Type:Bank\r\nD1/2/2023\r\nT10\r\nPZürich\r\n^\r\n";
        assert_eq!(decode(&utf16(text, false)).unwrap(), text);
    }

    #[test]
    fn bom_takes_precedence_over_detector() {
        let resolver = EncodingResolver::with_detector(Fixed(None));
        let bytes = utf16("!Type:Bank\n", true);

        assert_eq!(resolver.decode(&bytes).unwrap(), "!Type:Bank\n");
    }

    #[test]
    fn missing_guess() {
        let resolver = EncodingResolver::with_detector(Fixed(None));
        assert!(matches!(resolver.decode(b"!Type:Bank"), Err(EncodingError::Undetected)));
    }

    #[test]
    fn unknown_label() {
        let resolver = EncodingResolver::with_detector(Fixed(Some("x-no-such-encoding")));
        assert!(matches!(
            resolver.decode(b"!Type:Bank"),
            Err(EncodingError::Unsupported(label)) if label == "x-no-such-encoding"
        ));
    }

    #[test]
    fn replacement_label() {
        let resolver = EncodingResolver::with_detector(Fixed(Some("iso-2022-kr")));
        assert!(matches!(resolver.decode(b"!Type:Bank"), Err(EncodingError::Unsupported(_))));
    }
}
