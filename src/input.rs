use std::{io::Read, path::Path};

use crate::{EncodingError, EncodingResolver, FormatError, Parser, QifFile};

/// Possible errors to occur while reading and parsing QIF input
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error(transparent)]
    Format(#[from] FormatError),
}

/// Decodes and parses a complete QIF document
///
/// The encoding of the bytes is detected first, the decoded text is then
/// handed to a lenient [`Parser`]. Either the whole document is parsed, or
/// an error is returned.
pub fn parse_input(bytes: &[u8]) -> Result<QifFile, InputError> {
    parse_input_with(&Parser::new(), bytes)
}

/// Decodes and parses a complete QIF document using the given parser
pub fn parse_input_with(parser: &Parser, bytes: &[u8]) -> Result<QifFile, InputError> {
    let text = EncodingResolver::new().decode(bytes)?;
    Ok(parser.parse(&text)?)
}

/// Reads the reader to its end and parses the collected bytes
pub fn parse_reader<R: Read>(parser: &Parser, mut reader: R) -> Result<QifFile, InputError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;

    parse_input_with(parser, &bytes)
}

/// Reads and parses the QIF file at the given path
pub fn parse_file<P: AsRef<Path>>(parser: &Parser, path: P) -> Result<QifFile, InputError> {
    let bytes = std::fs::read(path)?;

    parse_input_with(parser, &bytes)
}
