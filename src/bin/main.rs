use std::io::Write;

use clap::Parser as _;

use qif_parser::{Parser, QifFile, Transaction};

/// Converts QIF files to JSON or CSV
#[derive(Debug, clap::Parser)]
#[clap(version)]
struct Args {
    /// The path to the QIF file, stdin is read if omitted
    filename: Option<std::path::PathBuf>,
    /// Fail on amounts and dates that cannot be interpreted
    #[clap(long)]
    strict: bool,
    /// The output format
    #[clap(long, arg_enum, default_value = "json")]
    format: Format,
    /// Pretty print JSON output
    #[clap(long)]
    pretty: bool,
}

#[derive(Clone, Copy, Debug, clap::ArgEnum)]
enum Format {
    Json,
    Csv,
}

/// A transaction as a CSV row
///
/// CSV needs the same columns in every row, so unset fields become empty cells.
#[derive(Debug, serde::Serialize)]
struct Row<'a> {
    date: Option<&'a str>,
    amount: Option<f64>,
    payee: Option<&'a str>,
    account: Option<&'a str>,
    category: Option<&'a str>,
    subcategory: Option<&'a str>,
    desc: Option<&'a str>,
    address: Option<&'a str>,
    number: Option<&'a str>,
}

impl<'a> From<&'a Transaction> for Row<'a> {
    fn from(transaction: &'a Transaction) -> Self {
        Self {
            date: transaction.date(),
            amount: transaction.amount(),
            payee: transaction.payee(),
            account: transaction.account(),
            category: transaction.category(),
            subcategory: transaction.subcategory(),
            desc: transaction.description(),
            address: transaction.address(),
            number: transaction.number(),
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();
    let parser = Parser::new().strict(args.strict);
    let file = match &args.filename {
        Some(filename) => qif_parser::parse_file(&parser, filename)?,
        None => qif_parser::parse_reader(&parser, std::io::stdin().lock())?,
    };
    log::info!("converted {} transactions of type '{}'", file.transactions().len(), file.kind());

    let stdout = std::io::stdout();
    match args.format {
        Format::Json => write_json(stdout.lock(), &file, args.pretty)?,
        Format::Csv => write_csv(stdout.lock(), &file)?,
    }

    Ok(())
}

fn write_json<W: Write>(mut writer: W, file: &QifFile, pretty: bool) -> anyhow::Result<()> {
    match pretty {
        true => serde_json::to_writer_pretty(&mut writer, file)?,
        false => serde_json::to_writer(&mut writer, file)?,
    }
    writeln!(writer)?;

    Ok(())
}

fn write_csv<W: Write>(writer: W, file: &QifFile) -> anyhow::Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(writer);

    for transaction in file.transactions() {
        writer.serialize(Row::from(transaction))?;
    }
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const QIF: &str = "!Type:Bank
        D1/2/2023
        T100.00
        PJohn Doe
        LGroceries:Food
        ^
        NCHK-7
        AMain St
        ^
    ";

    #[test]
    fn json_output() {
        let file = qif_parser::parse(QIF).unwrap();
        let mut output = Vec::new();
        write_json(&mut output, &file, false).unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            concat!(
                r#"{"type":"Bank","transactions":["#,
                r#"{"date":"2023-2-1","amount":100.0,"payee":"John Doe","category":"Groceries","subcategory":"Food"},"#,
                r#"{"address":"Main St ","number":"CHK-7"}]}"#,
                "\n",
            ),
        );
    }

    #[test]
    fn csv_output() {
        let file = qif_parser::parse(QIF).unwrap();
        let mut output = Vec::new();
        write_csv(&mut output, &file).unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            concat!(
                "date,amount,payee,account,category,subcategory,desc,address,number\n",
                "2023-2-1,100.0,John Doe,,Groceries,Food,,,\n",
                ",,,,,,,Main St ,CHK-7\n",
            ),
        );
    }

    #[test]
    fn nan_amounts_become_null() {
        let file = qif_parser::parse("!Type:Bank\nTunknown\n^\n").unwrap();
        let mut output = Vec::new();
        write_json(&mut output, &file, false).unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "{\"type\":\"Bank\",\"transactions\":[{\"amount\":null}]}\n",
        );
    }
}
