use serde::Deserialize;
use std::fs;
use std::path::Path;

/// One data row of a UBS account statement, fields trimmed but otherwise
/// untouched. Amounts stay raw strings here so a bad value can be reported
/// per row instead of failing the whole file.
#[derive(Debug, Clone)]
pub struct StatementRecord {
    /// 1-based line number in the source file, for skip messages.
    pub row_number: usize,
    pub posting_date: String,
    pub debit: String,
    pub credit: String,
    pub transaction_no: String,
    pub description1: String,
    pub description2: String,
    pub description3: String,
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(rename = "Date de comptabilisation")]
    posting_date: Option<String>,
    #[serde(rename = "Débit")]
    debit: Option<String>,
    #[serde(rename = "Crédit")]
    credit: Option<String>,
    #[serde(rename = "No de transaction")]
    transaction_no: Option<String>,
    #[serde(rename = "N° de transaction")]
    transaction_no_alt: Option<String>,
    #[serde(rename = "Description1")]
    description1: Option<String>,
    #[serde(rename = "Description2")]
    description2: Option<String>,
    #[serde(rename = "Description3")]
    description3: Option<String>,
}

fn header_line(line: &str) -> bool {
    line.contains("Date de transaction") || line.contains("Date de comptabilisation")
}

fn field(value: Option<String>) -> String {
    value.unwrap_or_default().trim().to_string()
}

pub fn read_statement(path: &Path) -> Result<Vec<StatementRecord>, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read '{}': {}", path.display(), e))?;
    parse_statement(&content)
}

/// UBS exports carry a metadata preamble (account number, period, balances)
/// before the actual column header. Scan for the header row, then hand the
/// rest to the csv crate.
pub fn parse_statement(content: &str) -> Result<Vec<StatementRecord>, String> {
    // Strip UTF-8 BOM if present
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let mut preamble = 0;
    let mut found = false;
    for line in content.lines() {
        if header_line(line) {
            found = true;
            break;
        }
        preamble += 1;
    }
    if !found {
        return Err("Transaction header row not found in CSV file".to_string());
    }

    let table = content
        .lines()
        .skip(preamble)
        .collect::<Vec<_>>()
        .join("\n");

    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_reader(table.as_bytes());

    let mut records = Vec::new();

    for (i, result) in csv_reader.deserialize().enumerate() {
        // First data row sits two lines below the last preamble line.
        let row_number = preamble + 2 + i;
        let raw: RawRecord = result
            .map_err(|e| format!("Failed to parse row {}: {}", row_number, e))?;

        // Older exports label the document number "N° de transaction".
        let transaction_no = [raw.transaction_no, raw.transaction_no_alt]
            .into_iter()
            .flatten()
            .map(|v| v.trim().to_string())
            .find(|v| !v.is_empty())
            .unwrap_or_default();

        records.push(StatementRecord {
            row_number,
            posting_date: field(raw.posting_date),
            debit: field(raw.debit),
            credit: field(raw.credit),
            transaction_no,
            description1: field(raw.description1),
            description2: field(raw.description2),
            description3: field(raw.description3),
        });
    }

    Ok(records)
}

/// Empty means no amount in that column; anything non-empty must be a
/// plain decimal number.
pub fn parse_amount(raw: &str) -> Result<Option<f64>, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<f64>()
        .map(Some)
        .map_err(|_| format!("invalid amount '{}'", trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATEMENT: &str = "\
Numéro de compte:;0230 00123456.40;;;;;;
Du:;2026-02-01;;;;;;
Au:;2026-02-28;;;;;;
Date de transaction;Date de comptabilisation;Monnaie;Débit;Crédit;No de transaction;Description1;Description2;Description3
2026-02-13;2026-02-14;CHF;-51.80;;9938AB12;Coop Pronto;Paiement carte;Genève
2026-02-20;2026-02-21;CHF;;4200.00;9940CD34;Employeur SA;Salaire;
";

    #[test]
    fn test_parses_rows_after_preamble() {
        let records = parse_statement(STATEMENT).unwrap();
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].posting_date, "2026-02-14");
        assert_eq!(records[0].debit, "-51.80");
        assert_eq!(records[0].credit, "");
        assert_eq!(records[0].transaction_no, "9938AB12");
        assert_eq!(records[0].description1, "Coop Pronto");
        assert_eq!(records[0].description2, "Paiement carte");
        assert_eq!(records[0].description3, "Genève");

        assert_eq!(records[1].credit, "4200.00");
        assert_eq!(records[1].description3, "");
    }

    #[test]
    fn test_row_numbers_follow_source_lines() {
        let records = parse_statement(STATEMENT).unwrap();
        // Three preamble lines, header on line 4, data from line 5.
        assert_eq!(records[0].row_number, 5);
        assert_eq!(records[1].row_number, 6);
    }

    #[test]
    fn test_strips_utf8_bom() {
        let content = format!("\u{feff}{}", STATEMENT);
        let records = parse_statement(&content).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_header_without_preamble() {
        let content = "\
Date de comptabilisation;Débit;Crédit;No de transaction;Description1;Description2;Description3
2026-02-14;-12.00;;77;Kiosque;;
";
        let records = parse_statement(content).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].row_number, 2);
        assert_eq!(records[0].description1, "Kiosque");
    }

    #[test]
    fn test_missing_header_is_an_error() {
        let content = "Numéro de compte:;0230 00123456.40\nsolde:;1234.00\n";
        let err = parse_statement(content).unwrap_err();
        assert!(err.contains("header"));
    }

    #[test]
    fn test_alternate_transaction_number_heading() {
        let content = "\
Date de comptabilisation;Débit;Crédit;N° de transaction;Description1;Description2;Description3
2026-02-14;-12.00;;AB99;Kiosque;;
";
        let records = parse_statement(content).unwrap();
        assert_eq!(records[0].transaction_no, "AB99");
    }

    #[test]
    fn test_short_rows_yield_empty_fields() {
        let content = "\
Date de comptabilisation;Débit;Crédit;No de transaction;Description1;Description2;Description3
2026-02-14;-12.00;;55;Kiosque
";
        let records = parse_statement(content).unwrap();
        assert_eq!(records[0].description1, "Kiosque");
        assert_eq!(records[0].description2, "");
        assert_eq!(records[0].description3, "");
    }

    #[test]
    fn test_quoted_fields_keep_semicolons() {
        let content = "\
Date de comptabilisation;Débit;Crédit;No de transaction;Description1;Description2;Description3
2026-02-14;-80.00;;31;\"Dr. Muller;Avenue de la Gare 10;1003;Lausanne\";Consultation;
";
        let records = parse_statement(content).unwrap();
        assert_eq!(
            records[0].description1,
            "Dr. Muller;Avenue de la Gare 10;1003;Lausanne"
        );
    }

    #[test]
    fn test_fields_are_trimmed() {
        let content = "\
Date de comptabilisation;Débit;Crédit;No de transaction;Description1;Description2;Description3
 2026-02-14 ; -12.00 ;; 55 ;  Kiosque  ;;
";
        let records = parse_statement(content).unwrap();
        assert_eq!(records[0].posting_date, "2026-02-14");
        assert_eq!(records[0].debit, "-12.00");
        assert_eq!(records[0].transaction_no, "55");
        assert_eq!(records[0].description1, "Kiosque");
    }

    #[test]
    fn test_parse_amount_accepts_empty_and_signed_values() {
        assert_eq!(parse_amount("").unwrap(), None);
        assert_eq!(parse_amount("   ").unwrap(), None);
        assert_eq!(parse_amount("51.80").unwrap(), Some(51.8));
        assert_eq!(parse_amount("-51.80").unwrap(), Some(-51.8));
        assert_eq!(parse_amount(" 4200.00 ").unwrap(), Some(4200.0));
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        let err = parse_amount("12,80").unwrap_err();
        assert!(err.contains("12,80"));
        assert!(parse_amount("CHF 12.80").is_err());
    }
}
