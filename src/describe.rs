use crate::extract::{Extractor, Narration};
use crate::rewrite;
use crate::rules::RuleSet;

// Used whenever a row carries no usable narration at all.
pub const PLACEHOLDER: &str = "Transaction bancaire";

// Builds the ledger description for one row. Total: always returns
// non-empty text.
//
// When extraction found enough structure (two or more parts), the parts are
// joined with the configured separator and run through the substitution
// rules. Otherwise the raw primary/secondary fields are lightly cleaned and
// joined with a fixed " | "; the rule engine never touches that path.
pub fn compose(narration: &Narration, extractor: &Extractor, rules: &RuleSet) -> String {
    let facts = extractor.extract(narration);

    let mut parts: Vec<String> = Vec::new();

    if let Some(beneficiary) = &facts.beneficiary {
        parts.push(beneficiary.clone());
    }

    if let Some(reference) = &facts.reference {
        parts.push(format!("Réf. QRR: {}", reference));
    }

    if let Some(reason) = &facts.reason {
        // Banks often repeat the payee name as the payment reason; drop the
        // duplicate. Case-sensitive, whitespace-normalized comparison.
        let repeats_beneficiary = facts
            .beneficiary
            .as_deref()
            .map(|b| normalize_whitespace(b) == normalize_whitespace(reason))
            .unwrap_or(false);
        if !repeats_beneficiary {
            parts.push(reason.clone());
        }
    }

    if parts.len() >= 2 {
        let joined = parts.join(&rules.separator);
        let rewritten = rewrite::apply(&joined, rules);
        if rewritten.is_empty() {
            PLACEHOLDER.to_string()
        } else {
            rewritten
        }
    } else {
        fallback(narration, extractor)
    }
}

fn fallback(narration: &Narration, extractor: &Extractor) -> String {
    let mut parts: Vec<String> = Vec::new();

    for field in [&narration.primary, &narration.secondary] {
        let cleaned = extractor.clean_narration_field(field);
        if !cleaned.is_empty() {
            parts.push(cleaned);
        }
    }

    if parts.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        parts.join(" | ")
    }
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
