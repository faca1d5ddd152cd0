mod cresus;
mod csv_parser;
mod describe;
mod extract;
mod rewrite;
mod rules;

use std::path::Path;

use cresus::{Accounts, LedgerEntry};
use csv_parser::StatementRecord;
use extract::{Extractor, Narration};
use rules::RuleSet;

#[derive(Default, Debug)]
struct ConvertStats {
    rows_parsed: usize,
    converted: usize,
    skipped: Vec<String>,
}

fn convert_record(
    record: &StatementRecord,
    extractor: &Extractor,
    rules: &RuleSet,
    accounts: &Accounts,
) -> Result<LedgerEntry, String> {
    let debit = csv_parser::parse_amount(&record.debit)
        .map_err(|e| format!("Row {}: {}", record.row_number, e))?
        .map(f64::abs)
        .unwrap_or(0.0);
    let credit = csv_parser::parse_amount(&record.credit)
        .map_err(|e| format!("Row {}: {}", record.row_number, e))?
        .unwrap_or(0.0);

    if debit == 0.0 && credit == 0.0 {
        return Err(format!("Row {}: no amount", record.row_number));
    }

    let date = cresus::format_posting_date(&record.posting_date);
    if date.is_empty() {
        return Err(format!("Row {}: missing booking date", record.row_number));
    }

    let narration = Narration::new(
        &record.description1,
        &record.description2,
        &record.description3,
    );
    let description = describe::compose(&narration, extractor, rules);

    Ok(LedgerEntry::build(
        accounts,
        date,
        record.transaction_no.clone(),
        description,
        debit,
        credit,
    ))
}

fn convert_records(
    records: &[StatementRecord],
    extractor: &Extractor,
    rules: &RuleSet,
    accounts: &Accounts,
) -> (Vec<LedgerEntry>, ConvertStats) {
    let mut entries = Vec::new();
    let mut stats = ConvertStats {
        rows_parsed: records.len(),
        ..Default::default()
    };

    for record in records {
        match convert_record(record, extractor, rules, accounts) {
            Ok(entry) => {
                entries.push(entry);
                stats.converted += 1;
            }
            Err(reason) => stats.skipped.push(reason),
        }
    }

    (entries, stats)
}

fn print_usage() {
    println!("Usage: cresus-converter <command> [args]");
    println!("Commands:");
    println!("  convert <input.csv> <output.txt> [--rules <file>] [--bank-account <code>] [--contra-account <code>]");
    println!("  preview <input.csv> [--rules <file>] [--limit <n>]");
    println!("  rules [--rules <file>]");
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return Ok(());
    }

    let command = &args[1];

    match command.as_str() {
        "convert" => {
            let mut rules_path = None;
            let mut bank = "1020";
            let mut contra = "2000";
            let mut positional = Vec::new();

            let mut i = 2;
            while i < args.len() {
                match args[i].as_str() {
                    "--rules" => { rules_path = args.get(i + 1).map(|s| s.as_str()); i += 2; }
                    "--bank-account" => {
                        if let Some(v) = args.get(i + 1) { bank = v; }
                        i += 2;
                    }
                    "--contra-account" => {
                        if let Some(v) = args.get(i + 1) { contra = v; }
                        i += 2;
                    }
                    path if !path.starts_with("--") => {
                        positional.push(path);
                        i += 1;
                    }
                    _ => i += 1,
                }
            }

            if positional.len() < 2 {
                println!("Usage: cresus-converter convert <input.csv> <output.txt> [--rules <file>] [--bank-account <code>] [--contra-account <code>]");
                return Ok(());
            }

            let accounts = Accounts {
                bank: bank.to_string(),
                contra: contra.to_string(),
            };
            run_convert(
                Path::new(positional[0]),
                Path::new(positional[1]),
                rules_path.map(Path::new),
                &accounts,
            )
        }
        "preview" => {
            let mut rules_path = None;
            let mut limit = 20;
            let mut input = None;

            let mut i = 2;
            while i < args.len() {
                match args[i].as_str() {
                    "--rules" => { rules_path = args.get(i + 1).map(|s| s.as_str()); i += 2; }
                    "--limit" => {
                        limit = args.get(i + 1).and_then(|s| s.parse().ok()).unwrap_or(20);
                        i += 2;
                    }
                    path if !path.starts_with("--") => {
                        input = Some(path);
                        i += 1;
                    }
                    _ => i += 1,
                }
            }

            if let Some(input) = input {
                run_preview(Path::new(input), rules_path.map(Path::new), limit)
            } else {
                println!("Usage: cresus-converter preview <input.csv> [--rules <file>] [--limit <n>]");
                Ok(())
            }
        }
        "rules" => {
            let mut rules_path = None;

            let mut i = 2;
            while i < args.len() {
                match args[i].as_str() {
                    "--rules" => { rules_path = args.get(i + 1).map(|s| s.as_str()); i += 2; }
                    _ => i += 1,
                }
            }

            run_show_rules(rules_path.map(Path::new));
            Ok(())
        }
        // Backward compatibility: cresus-converter <input.csv> <output.txt> [rules.json]
        path => {
            if let Some(output) = args.get(2) {
                let rules_path = args.get(3).map(|s| Path::new(s.as_str()));
                run_convert(Path::new(path), Path::new(output), rules_path, &Accounts::default())
            } else {
                print_usage();
                Ok(())
            }
        }
    }
}

fn run_convert(
    input: &Path,
    output: &Path,
    rules_path: Option<&Path>,
    accounts: &Accounts,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("UBS to Crésus Converter");
    println!("  Input:      {}", input.display());
    println!("  Output:     {}", output.display());
    println!("  Accounts:   {} (bank) / {} (contra)", accounts.bank, accounts.contra);
    println!();

    let rules = rules::load(rules_path);
    let extractor = Extractor::new();

    let records = csv_parser::read_statement(input)?;
    let (entries, stats) = convert_records(&records, &extractor, &rules, accounts);

    cresus::write_file(output, &entries)?;

    println!("Conversion Complete");
    println!("  Rows parsed:     {}", stats.rows_parsed);
    println!("  Entries written: {}", stats.converted);
    println!("  Rows skipped:    {}", stats.skipped.len());

    if !stats.skipped.is_empty() {
        println!();
        println!("Skipped rows:");
        for reason in stats.skipped.iter().take(10) {
            println!("  - {}", reason);
        }
        if stats.skipped.len() > 10 {
            println!("  ... and {} more", stats.skipped.len() - 10);
        }
    }

    println!();
    println!("Output file: {}", output.display());
    println!("Ready to import into Crésus Comptabilité.");

    Ok(())
}

fn run_preview(
    input: &Path,
    rules_path: Option<&Path>,
    limit: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let rules = rules::load(rules_path);
    let extractor = Extractor::new();

    let records = csv_parser::read_statement(input)?;

    let mut shown = 0;
    for record in &records {
        if limit > 0 && shown >= limit {
            break;
        }

        let narration = Narration::new(
            &record.description1,
            &record.description2,
            &record.description3,
        );
        let description = describe::compose(&narration, &extractor, &rules);
        let date = cresus::format_posting_date(&record.posting_date);

        println!("  {:<10}  {:>10}  {}", date, preview_amount(record), description);
        shown += 1;
    }

    println!();
    println!("{} of {} rows shown", shown, records.len());

    Ok(())
}

fn preview_amount(record: &StatementRecord) -> String {
    let debit = csv_parser::parse_amount(&record.debit).ok().flatten();
    let credit = csv_parser::parse_amount(&record.credit).ok().flatten();

    match (debit, credit) {
        (_, Some(credit)) if credit > 0.0 => format!("{:.2}", credit),
        (Some(debit), _) => format!("{:.2}", -debit.abs()),
        _ => "?".to_string(),
    }
}

fn run_show_rules(rules_path: Option<&Path>) {
    let source = rules_path
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| format!("{} (default)", rules::DEFAULT_RULES_FILE));
    let rules = rules::load(rules_path);

    println!("Rule configuration: {}", source);
    println!("  Enabled:             {}", rules.enabled);
    println!(
        "  Simple replacements: {} ({} enabled)",
        rules.simple.len(),
        rules.simple.iter().filter(|r| r.enabled).count()
    );
    println!(
        "  Regex replacements:  {} ({} enabled)",
        rules.patterns.len(),
        rules.patterns.iter().filter(|r| r.enabled).count()
    );
    println!(
        "  Custom replacements: {} ({} enabled)",
        rules.custom.len(),
        rules.custom.iter().filter(|r| r.enabled).count()
    );
    println!("  Separator:           {:?}", rules.separator);
    println!("Cleanup:");
    println!("  Collapse whitespace:      {}", rules.cleanup.collapse_whitespace);
    println!("  Strip trailing semicolon: {}", rules.cleanup.strip_trailing_semicolon);
    println!("  Strip trailing colon:     {}", rules.cleanup.strip_trailing_colon);
    println!("  Remove empty parentheses: {}", rules.cleanup.remove_empty_parentheses);
    println!("  Trim:                     {}", rules.cleanup.trim);
    if rules.cleanup.max_length == 0 {
        println!("  Max length:               unlimited");
    } else {
        println!("  Max length:               {}", rules.cleanup.max_length);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: &str, debit: &str, credit: &str) -> StatementRecord {
        StatementRecord {
            row_number: 7,
            posting_date: date.to_string(),
            debit: debit.to_string(),
            credit: credit.to_string(),
            transaction_no: "9938AB12".to_string(),
            description1: "Coop Pronto".to_string(),
            description2: String::new(),
            description3: String::new(),
        }
    }

    #[test]
    fn test_outgoing_row_becomes_entry() {
        let entry = convert_record(
            &record("2026-02-14", "-51.80", ""),
            &Extractor::new(),
            &RuleSet::default(),
            &Accounts::default(),
        )
        .unwrap();

        assert_eq!(entry.date, "14.02.2026");
        assert_eq!(entry.debit_account, "2000");
        assert_eq!(entry.credit_account, "1020");
        assert_eq!(entry.document_no, "9938AB12");
        assert_eq!(entry.description, "Coop Pronto");
        assert_eq!(entry.amount, 51.8);
    }

    #[test]
    fn test_incoming_row_becomes_entry() {
        let entry = convert_record(
            &record("2026-02-21", "", "4200.00"),
            &Extractor::new(),
            &RuleSet::default(),
            &Accounts::default(),
        )
        .unwrap();

        assert_eq!(entry.debit_account, "1020");
        assert_eq!(entry.credit_account, "2000");
        assert_eq!(entry.amount, 4200.0);
    }

    #[test]
    fn test_row_without_amount_is_skipped() {
        let reason = convert_record(
            &record("2026-02-14", "", ""),
            &Extractor::new(),
            &RuleSet::default(),
            &Accounts::default(),
        )
        .unwrap_err();

        assert_eq!(reason, "Row 7: no amount");
    }

    #[test]
    fn test_row_without_date_is_skipped() {
        let reason = convert_record(
            &record("", "-51.80", ""),
            &Extractor::new(),
            &RuleSet::default(),
            &Accounts::default(),
        )
        .unwrap_err();

        assert_eq!(reason, "Row 7: missing booking date");
    }

    #[test]
    fn test_row_with_bad_amount_reports_the_value() {
        let reason = convert_record(
            &record("2026-02-14", "12,80", ""),
            &Extractor::new(),
            &RuleSet::default(),
            &Accounts::default(),
        )
        .unwrap_err();

        assert!(reason.contains("Row 7"));
        assert!(reason.contains("12,80"));
    }

    #[test]
    fn test_unrecognised_date_is_kept_verbatim() {
        let entry = convert_record(
            &record("14/02/2026", "-51.80", ""),
            &Extractor::new(),
            &RuleSet::default(),
            &Accounts::default(),
        )
        .unwrap();

        assert_eq!(entry.date, "14/02/2026");
    }

    #[test]
    fn test_empty_descriptions_fall_back_to_placeholder() {
        let mut rec = record("2026-02-14", "-51.80", "");
        rec.description1 = String::new();

        let entry = convert_record(
            &rec,
            &Extractor::new(),
            &RuleSet::default(),
            &Accounts::default(),
        )
        .unwrap();

        assert_eq!(entry.description, describe::PLACEHOLDER);
    }

    #[test]
    fn test_convert_records_collects_stats() {
        let records = vec![
            record("2026-02-14", "-51.80", ""),
            record("2026-02-15", "", ""),
            record("", "-10.00", ""),
        ];

        let (entries, stats) = convert_records(
            &records,
            &Extractor::new(),
            &RuleSet::default(),
            &Accounts::default(),
        );

        assert_eq!(entries.len(), 1);
        assert_eq!(stats.rows_parsed, 3);
        assert_eq!(stats.converted, 1);
        assert_eq!(stats.skipped.len(), 2);
        assert!(stats.skipped[0].contains("no amount"));
        assert!(stats.skipped[1].contains("missing booking date"));
    }
}
