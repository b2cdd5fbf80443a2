use std::sync::LazyLock;

use regex::Regex;

use crate::{Field, QifFile, Transaction};

static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"!Type:([^$]*)$").expect("header pattern is valid")
});

/// Possible errors to occur while parsing QIF text
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("The input does not contain a header line")]
    MissingHeader,
    #[error("File does not appear to be a valid qif file (line {line}): {content}")]
    InvalidHeader { line: usize, content: String },
    #[error("Unknown detail code '{tag}' at line {line}")]
    UnknownTag { line: usize, tag: char },
    #[error("Invalid amount '{value}' at line {line}")]
    InvalidAmount { line: usize, value: String },
    #[error("Invalid date '{value}' at line {line}")]
    InvalidDate { line: usize, value: String },
}

/// The QIF record parser
///
/// By default the parser is lenient: amounts that are not numbers end up as
/// `NaN` and dates are reassembled from whatever digits are present. In
/// strict mode both cases fail the parse instead.
#[derive(Clone, Copy, Debug, Default)]
pub struct Parser {
    strict: bool,
}

impl Parser {
    /// Creates a new, lenient parser
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables validation of amounts and dates
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Whether amounts and dates are validated
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Parses a complete QIF document
    ///
    /// The first non-empty line has to be a `!Type:` header. Every following
    /// line is either a terminator (`^`) or a field starting with one of the
    /// tags `D`, `T`, `P`, `L`, `M`, `A` or `N`. The first blank line after the
    /// header ends the records, anything below it is ignored. Any error aborts
    /// the whole parse.
    pub fn parse(&self, text: &str) -> Result<QifFile, FormatError> {
        text.lines()
            .enumerate()
            .try_fold(ParserState::new(), |state, (index, line)| {
                state.step(self, index + 1, line)
            })?
            .finish()
    }

    fn field(&self, line: usize, tag: char, value: &str) -> Result<Field, FormatError> {
        let field = match tag {
            'D' => {
                let (date, complete) = normalize_date(value);
                if self.strict && !complete {
                    return Err(FormatError::InvalidDate { line, value: value.to_owned() });
                }
                Field::Date(date)
            }
            'T' => {
                let amount = parse_amount(value);
                if self.strict && !amount.is_finite() {
                    return Err(FormatError::InvalidAmount { line, value: value.to_owned() });
                }
                Field::Amount(amount)
            }
            'P' if is_account_marker(value) => Field::Account(value.replace("&amp;", "&")),
            'P' => Field::Payee(value.replace("&amp;", "&")),
            'L' => {
                let mut segments = value.split(':');
                Field::Category {
                    category: segments.next().unwrap_or_default().to_owned(),
                    subcategory: segments.next().map(str::to_owned),
                }
            }
            'M' => Field::Description(collapse_spaces(value)),
            'A' => Field::Address(collapse_spaces(value)),
            'N' => Field::Number(value.to_owned()),
            tag => return Err(FormatError::UnknownTag { line, tag }),
        };

        Ok(field)
    }
}

/// Parses a complete QIF document with the default, lenient parser
///
/// See [`Parser::parse`].
pub fn parse(text: &str) -> Result<QifFile, FormatError> {
    Parser::new().parse(text)
}

#[derive(Debug)]
enum Stage {
    ExpectHeader,
    InRecord { kind: String },
    /// A blank line ended the records
    Done { kind: String },
}

/// The state threaded through the lines of one document
#[derive(Debug)]
struct ParserState {
    stage: Stage,
    /// The record currently being built
    current: Transaction,
    /// All records that were terminated so far
    sealed: Vec<Transaction>,
}

impl ParserState {
    fn new() -> Self {
        Self {
            stage: Stage::ExpectHeader,
            current: Transaction::new(),
            sealed: Vec::new(),
        }
    }

    fn step(mut self, parser: &Parser, line_number: usize, line: &str) -> Result<Self, FormatError> {
        let line = line.trim();

        match self.stage {
            Stage::Done { .. } => {}
            Stage::ExpectHeader if line.is_empty() => {}
            Stage::InRecord { ref mut kind } if line.is_empty() => {
                log::debug!("records end at blank line {line_number}");
                let kind = std::mem::take(kind);
                self.stage = Stage::Done { kind };
            }
            Stage::ExpectHeader => {
                let kind = HEADER
                    .captures(line)
                    .and_then(|captures| captures.get(1))
                    .ok_or_else(|| FormatError::InvalidHeader {
                        line: line_number,
                        content: line.to_owned(),
                    })?
                    .as_str()
                    .to_owned();
                log::debug!("found header of type '{kind}' at line {line_number}");
                self.stage = Stage::InRecord { kind };
            }
            Stage::InRecord { .. } if line == "^" => {
                // terminators seal the record even if it has no fields
                let transaction = std::mem::take(&mut self.current);
                log::trace!("sealed record #{} at line {line_number}", self.sealed.len() + 1);
                self.sealed.push(transaction);
            }
            Stage::InRecord { .. } => {
                let mut chars = line.chars();
                // the line is not empty, so there is always a tag
                let tag = chars.next().unwrap_or_default();
                let field = parser.field(line_number, tag, chars.as_str())?;
                self.current.apply(field);
            }
        }

        Ok(self)
    }

    fn finish(mut self) -> Result<QifFile, FormatError> {
        let kind = match self.stage {
            Stage::ExpectHeader => return Err(FormatError::MissingHeader),
            Stage::InRecord { kind } | Stage::Done { kind } => kind,
        };

        if !self.current.is_empty() {
            self.sealed.push(self.current);
        }
        log::debug!("parsed {} transactions", self.sealed.len());

        Ok(QifFile::new(kind, self.sealed))
    }
}

/// Reassembles a day-month-year date as `year-month-day`
///
/// The components are the runs of digits in the value. Two digit years are
/// moved into the 21st century. The returned flag tells whether the value
/// consisted of exactly three components forming an existing calendar day.
fn normalize_date(value: &str) -> (String, bool) {
    let components = value
        .split(|c: char| !c.is_ascii_digit())
        .filter(|component| !component.is_empty())
        .collect::<Vec<_>>();
    let component = |index: usize| components.get(index).copied().unwrap_or_default();

    let (day, month) = (component(0), component(1));
    let year = match component(2) {
        year if year.len() == 2 => format!("20{year}"),
        year => year.to_owned(),
    };

    let complete = components.len() == 3 && is_calendar_day(&year, month, day);
    (format!("{year}-{month}-{day}"), complete)
}

fn is_calendar_day(year: &str, month: &str, day: &str) -> bool {
    match (year.parse::<i32>(), month.parse::<u32>(), day.parse::<u32>()) {
        (Ok(year), Ok(month), Ok(day)) => chrono::NaiveDate::from_ymd_opt(year, month, day).is_some(),
        _ => false,
    }
}

/// Parses an amount, ignoring thousands separators
///
/// Values that are not numbers yield `NaN`, this includes spelled out
/// infinities like `inf`.
fn parse_amount(value: &str) -> f64 {
    match value.replace(',', "").trim().parse::<f64>() {
        Ok(amount) if amount.is_finite() => amount,
        _ => f64::NAN,
    }
}

/// Whether a payee value actually identifies an account
fn is_account_marker(value: &str) -> bool {
    value.chars().count() == 16 && value.starts_with("BE")
}

/// Collapses every run of spaces into a single space
fn collapse_spaces(value: &str) -> String {
    let mut collapsed = String::with_capacity(value.len());
    for c in value.chars() {
        if c != ' ' || !collapsed.ends_with(' ') {
            collapsed.push(c);
        }
    }

    collapsed
}
