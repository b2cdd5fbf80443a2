/// A single normalized field of a QIF record
///
/// Fields are produced by the tag dispatch of the parser and written into
/// the record currently being built with [`Transaction::apply`].
#[derive(Clone, Debug, PartialEq)]
pub enum Field {
    /// `D`: a date reassembled as `year-month-day`
    Date(String),
    /// `T`: the transaction amount, `NaN` when the value was not numeric
    Amount(f64),
    /// `P`: the other party of the transaction
    Payee(String),
    /// `P`: an account marker, see [`Transaction::account`]
    Account(String),
    /// `L`: category and optional subcategory
    Category {
        category: String,
        subcategory: Option<String>,
    },
    /// `M`: the memo line
    Description(String),
    /// `A`: one line of a (possibly multi-line) address
    Address(String),
    /// `N`: check or reference number
    Number(String),
}

/// A transaction record
///
/// A transaction collects the fields found between two terminator lines.
/// Every field is optional, QIF exports only write what they know.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Transaction {
    #[serde(skip_serializing_if = "Option::is_none")]
    date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    account: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    subcategory: Option<String>,
    #[serde(rename = "desc", skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    number: Option<String>,
}

impl Transaction {
    /// Creates a new transaction without any fields
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a field into the transaction
    ///
    /// A field that is already set is overwritten, with the exception of
    /// addresses: every address line is appended to the existing address,
    /// followed by a single space.
    pub fn apply(&mut self, field: Field) {
        match field {
            Field::Date(date) => self.date = Some(date),
            Field::Amount(amount) => self.amount = Some(amount),
            Field::Payee(payee) => self.payee = Some(payee),
            Field::Account(account) => self.account = Some(account),
            Field::Category { category, subcategory } => {
                self.category = Some(category);
                if subcategory.is_some() {
                    self.subcategory = subcategory;
                }
            }
            Field::Description(description) => self.description = Some(description),
            Field::Address(line) => {
                let address = self.address.get_or_insert_with(String::new);
                address.push_str(&line);
                address.push(' ');
            }
            Field::Number(number) => self.number = Some(number),
        }
    }

    /// Whether not a single field has been set yet
    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.amount.is_none()
            && self.payee.is_none()
            && self.account.is_none()
            && self.category.is_none()
            && self.subcategory.is_none()
            && self.description.is_none()
            && self.address.is_none()
            && self.number.is_none()
    }

    /// The date in `year-month-day` order
    ///
    /// The components are not zero padded and not validated unless the
    /// parser runs in strict mode.
    pub fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    /// The amount
    /// Will be `NaN` if the source value was not a number
    pub fn amount(&self) -> Option<f64> {
        self.amount
    }

    pub fn payee(&self) -> Option<&str> {
        self.payee.as_deref()
    }

    /// The account marker
    ///
    /// Some exports put an account identifier into the payee line. A payee
    /// value of exactly 16 characters starting with `BE` is treated as such.
    pub fn account(&self) -> Option<&str> {
        self.account.as_deref()
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn subcategory(&self) -> Option<&str> {
        self.subcategory.as_deref()
    }

    /// The memo, with runs of spaces collapsed
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// All address lines, each followed by a single space
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    /// The check or reference number, verbatim
    pub fn number(&self) -> Option<&str> {
        self.number.as_deref()
    }
}

/// The result of parsing one QIF document
///
/// Holds the type declared in the header line and all transactions in
/// the order they appeared in the input.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct QifFile {
    #[serde(rename = "type")]
    kind: String,
    transactions: Vec<Transaction>,
}

impl QifFile {
    pub(crate) fn new(kind: String, transactions: Vec<Transaction>) -> Self {
        Self { kind, transactions }
    }

    /// The type from the `!Type:` header, e.g. `Bank` or `CCard`
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn into_transactions(self) -> Vec<Transaction> {
        self.transactions
    }
}
