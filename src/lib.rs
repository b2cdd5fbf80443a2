pub use self::{
    encoding::{decode, Chardet, Detector, EncodingError, EncodingResolver},
    input::{parse_file, parse_input, parse_input_with, parse_reader, InputError},
    parser::{parse, FormatError, Parser},
    transaction::{Field, QifFile, Transaction},
};

mod encoding;
mod input;
mod parser;
mod transaction;
