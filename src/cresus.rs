use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::NaiveDate;

// Ledger account codes the converter books against.
#[derive(Debug, Clone)]
pub struct Accounts {
    pub bank: String,
    pub contra: String,
}

impl Default for Accounts {
    fn default() -> Self {
        Accounts {
            bank: "1020".to_string(),
            contra: "2000".to_string(),
        }
    }
}

// One output row: Date, Débit, Crédit, N° pièce, Libellé, Montant.
#[derive(Debug, Clone)]
pub struct LedgerEntry {
    pub date: String,
    pub debit_account: String,
    pub credit_account: String,
    pub document_no: String,
    pub description: String,
    pub amount: f64,
}

impl LedgerEntry {
    pub fn build(
        accounts: &Accounts,
        date: String,
        document_no: String,
        description: String,
        debit: f64,
        credit: f64,
    ) -> LedgerEntry {
        let (debit_account, credit_account, amount) = if credit > 0.0 {
            // Money coming in: the bank account receives.
            (accounts.bank.clone(), accounts.contra.clone(), credit)
        } else {
            // Money going out: the bank account pays.
            (accounts.contra.clone(), accounts.bank.clone(), debit)
        };

        LedgerEntry {
            date,
            debit_account,
            credit_account,
            document_no,
            description,
            amount,
        }
    }

    pub fn to_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{:.2}",
            self.date,
            self.debit_account,
            self.credit_account,
            self.document_no,
            self.description,
            self.amount
        )
    }
}

// YYYY-MM-DD to the Swiss DD.MM.YYYY. An empty input stays empty; anything
// unparseable passes through verbatim, matching the files existing imports
// were produced from.
pub fn format_posting_date(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    match NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        Ok(date) => date.format("%d.%m.%Y").to_string(),
        Err(_) => trimmed.to_string(),
    }
}

// Crésus expects raw tab-joined fields with CR+LF line endings; no quoting
// or escaping.
pub fn write_entries<W: Write>(writer: &mut W, entries: &[LedgerEntry]) -> Result<(), String> {
    for entry in entries {
        write!(writer, "{}\r\n", entry.to_line())
            .map_err(|e| format!("Failed to write entry: {}", e))?;
    }
    Ok(())
}

pub fn write_file(path: &Path, entries: &[LedgerEntry]) -> Result<(), String> {
    let file = File::create(path)
        .map_err(|e| format!("Failed to create output file '{}': {}", path.display(), e))?;
    let mut writer = BufWriter::new(file);
    write_entries(&mut writer, entries)?;
    writer
        .flush()
        .map_err(|e| format!("Failed to write output file '{}': {}", path.display(), e))
}
