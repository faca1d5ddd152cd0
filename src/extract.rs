use regex::Regex;

// Extraction patterns, named here as data so each can be tested on its own.
// UBS narrations embed labelled metadata in free text; these labels are
// fixed by the export format.
const REFERENCE_QRR: &str = r"Reference no\. QRR:\s*([0-9 ]+)";
const PAYMENT_REASON: &str = r"Motif du paiement:\s*([^;]+)";
const ADDRESS_SUFFIX: &str = r";[^;]*\d{4}[^;]*;[^;]*$";
const IBAN_LABEL: &str = r"Account no\. IBAN:\s*[^;]+;?";
const BIC_SWIFT_LABEL: &str = r":?\s*BI\s*C\s*/\s*SWIFT\s+\w+";
const COSTS_LABEL: &str = r"Coûts:\s*[^;]+;?";
const TRAILING_COLON: &str = r"\s*:\s*$";
const COLON_BEFORE_SEMICOLON: &str = r"\s*:\s*;";
const TRANSACTION_NO_LABEL: &str = r"No de transaction:[^;]+;?";
const FOOTNOTE_MARKER: &str = r"\(\*[a-z]\)[^;]*";
const WHITESPACE_RUN: &str = r"\s+";

#[derive(Debug, Clone, Default)]
pub struct Narration {
    pub primary: String,
    pub secondary: String,
    pub tertiary: String,
}

impl Narration {
    pub fn new(primary: &str, secondary: &str, tertiary: &str) -> Self {
        Narration {
            primary: primary.to_string(),
            secondary: secondary.to_string(),
            tertiary: tertiary.to_string(),
        }
    }

    // All non-empty fields, trimmed, joined with single spaces.
    pub fn joined(&self) -> String {
        [&self.primary, &self.secondary, &self.tertiary]
            .iter()
            .map(|f| f.trim())
            .filter(|f| !f.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedFacts {
    pub beneficiary: Option<String>,
    pub reference: Option<String>,
    pub reason: Option<String>,
}

struct Scrub {
    pattern: Regex,
    replace: &'static str,
}

impl Scrub {
    fn new(pattern: &str, replace: &'static str) -> Self {
        Scrub {
            pattern: fixed(pattern),
            replace,
        }
    }

    fn apply(&self, text: &str) -> String {
        self.pattern.replace_all(text, self.replace).into_owned()
    }
}

fn fixed(pattern: &str) -> Regex {
    Regex::new(pattern).expect("fixed pattern")
}

pub struct Extractor {
    reference: Regex,
    payment_reason: Regex,
    address_suffix: Regex,
    reason_scrubs: Vec<Scrub>,
    field_scrubs: Vec<Scrub>,
}

impl Extractor {
    pub fn new() -> Self {
        Extractor {
            reference: fixed(REFERENCE_QRR),
            payment_reason: fixed(PAYMENT_REASON),
            address_suffix: fixed(ADDRESS_SUFFIX),
            // Order matters: each scrub operates on the previous one's output.
            reason_scrubs: vec![
                Scrub::new(IBAN_LABEL, ""),
                Scrub::new(BIC_SWIFT_LABEL, ""),
                Scrub::new(COSTS_LABEL, ""),
                Scrub::new(TRAILING_COLON, ""),
                Scrub::new(COLON_BEFORE_SEMICOLON, ";"),
                Scrub::new(WHITESPACE_RUN, " "),
            ],
            field_scrubs: vec![
                Scrub::new(TRANSACTION_NO_LABEL, ""),
                Scrub::new(COSTS_LABEL, ""),
                Scrub::new(FOOTNOTE_MARKER, ""),
                Scrub::new(WHITESPACE_RUN, " "),
            ],
        }
    }

    // Total: never fails, even on empty or malformed narration text.
    pub fn extract(&self, narration: &Narration) -> ExtractedFacts {
        let joined = narration.joined();
        if joined.is_empty() {
            return ExtractedFacts::default();
        }

        let beneficiary = self.beneficiary(&narration.primary);

        let reference = self
            .reference
            .captures(&joined)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|s| !s.is_empty());

        let reason = self
            .payment_reason
            .captures(&joined)
            .and_then(|c| c.get(1))
            .map(|m| self.clean_reason(m.as_str()))
            .filter(|s| !s.is_empty());

        ExtractedFacts {
            beneficiary,
            reference,
            reason,
        }
    }

    // The primary field verbatim, with one structural cleanup: a trailing
    // ";<segment with a 4-digit run>;<tail>" address suffix is dropped.
    // Any 4-digit run triggers the strip, postal code or not; output parity
    // with existing imports takes precedence over smarter address handling.
    fn beneficiary(&self, primary: &str) -> Option<String> {
        let trimmed = primary.trim();
        if trimmed.is_empty() {
            return None;
        }
        let stripped = self.address_suffix.replace_all(trimmed, "").into_owned();
        if stripped.is_empty() {
            None
        } else {
            Some(stripped)
        }
    }

    // Strips technical banking metadata out of a raw payment reason.
    pub fn clean_reason(&self, raw: &str) -> String {
        let mut s = raw.trim().to_string();
        for scrub in &self.reason_scrubs {
            s = scrub.apply(&s);
        }
        s.trim()
            .trim_matches(|c| c == ';' || c == ':' || c == ' ')
            .to_string()
    }

    // Lighter cleanup used when no structured facts were found: strips the
    // transaction-number and costs labels and footnote markers from one raw
    // narration field.
    pub fn clean_narration_field(&self, field: &str) -> String {
        let mut s = field.trim().to_string();
        for scrub in &self.field_scrubs {
            s = scrub.apply(&s);
        }
        s.trim().to_string()
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}
