//! Theme classification for archived documents.
//!
//! A small regex table maps life-archive themes (finance, medical, legal,
//! travel, ...) to pattern sets. Classification is keyword-driven and
//! deliberately conservative: patterns are word-boundary anchored and
//! case-insensitive to avoid substring false positives ("scar" must not
//! match "oscar").

use once_cell::sync::Lazy;
use regex::RegexSet;
use serde::{Deserialize, Serialize};

/// Themes recognized by the classifier, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Finance,
    Medical,
    Legal,
    Travel,
    Correspondence,
    Education,
    Home,
    Identity,
}

impl Theme {
    /// Stable string name, used in API responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Finance => "finance",
            Theme::Medical => "medical",
            Theme::Legal => "legal",
            Theme::Travel => "travel",
            Theme::Correspondence => "correspondence",
            Theme::Education => "education",
            Theme::Home => "home",
            Theme::Identity => "identity",
        }
    }
}

/// Pattern table: one entry per theme. Keep patterns lowercase; the sets
/// are compiled case-insensitive.
const THEME_PATTERNS: &[(Theme, &[&str])] = &[
    (
        Theme::Finance,
        &[
            r"\binvoice\b",
            r"\breceipt\b",
            r"\btax(es)?\b",
            r"\bsalary\b",
            r"\bpayroll\b",
            r"\bbank(ing)?\b",
            r"\bmortgage\b",
            r"\bIBAN\b",
            r"\bdividend\b",
            r"\bstatement of account\b",
        ],
    ),
    (
        Theme::Medical,
        &[
            r"\bdiagnos(is|es|ed)\b",
            r"\bprescription\b",
            r"\bclinic(al)?\b",
            r"\bphysician\b",
            r"\bvaccin(e|ation)\b",
            r"\bblood (test|pressure)\b",
            r"\bradiolog(y|ist)\b",
            r"\bpatient\b",
        ],
    ),
    (
        Theme::Legal,
        &[
            r"\bcontract\b",
            r"\bagreement\b",
            r"\bnotary\b",
            r"\bclause\b",
            r"\bplaintiff\b",
            r"\bdefendant\b",
            r"\bpower of attorney\b",
            r"\bjurisdiction\b",
        ],
    ),
    (
        Theme::Travel,
        &[
            r"\bitinerary\b",
            r"\bboarding pass\b",
            r"\bflight\b",
            r"\bhotel\b",
            r"\bvisa\b",
            r"\bbooking (reference|confirmation)\b",
            r"\bcheck-?in\b",
        ],
    ),
    (
        Theme::Correspondence,
        &[
            r"\bdear\b",
            r"\bsincerely\b",
            r"\bbest regards\b",
            r"\bkind regards\b",
            r"\byours (truly|faithfully)\b",
            r"\bre:\s",
        ],
    ),
    (
        Theme::Education,
        &[
            r"\bdiploma\b",
            r"\btranscript\b",
            r"\bsemester\b",
            r"\btuition\b",
            r"\bcourse(work)?\b",
            r"\buniversity\b",
            r"\bgrade point\b",
        ],
    ),
    (
        Theme::Home,
        &[
            r"\blease\b",
            r"\brent(al)?\b",
            r"\butilit(y|ies)\b",
            r"\belectricity\b",
            r"\bplumb(er|ing)\b",
            r"\bhomeowner\b",
            r"\bwarranty\b",
        ],
    ),
    (
        Theme::Identity,
        &[
            r"\bpassport\b",
            r"\bbirth certificate\b",
            r"\bnational id\b",
            r"\bdriver'?s licen[cs]e\b",
            r"\bsocial security\b",
            r"\bresidence permit\b",
        ],
    ),
];

/// Compiled per-theme regex sets, built once on first use.
static COMPILED: Lazy<Vec<(Theme, RegexSet)>> = Lazy::new(|| {
    THEME_PATTERNS
        .iter()
        .map(|(theme, patterns)| {
            let set = RegexSet::new(patterns.iter().map(|p| format!("(?i){}", p)))
                .expect("theme pattern table must compile");
            (*theme, set)
        })
        .collect()
});

/// Classify text into themes.
///
/// Returns matched themes ordered by number of distinct pattern hits
/// (descending), ties broken by canonical theme name. Text with no matches
/// yields an empty vector.
pub fn classify_themes(text: &str) -> Vec<Theme> {
    let mut scored: Vec<(Theme, usize)> = COMPILED
        .iter()
        .filter_map(|(theme, set)| {
            let hits = set.matches(text).iter().count();
            if hits > 0 {
                Some((*theme, hits))
            } else {
                None
            }
        })
        .collect();

    scored.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.as_str().cmp(b.0.as_str())));
    scored.into_iter().map(|(theme, _)| theme).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifies_finance_text() {
        let themes = classify_themes("Attached is the invoice and the bank statement of account.");
        assert_eq!(themes.first(), Some(&Theme::Finance));
    }

    #[test]
    fn test_dominant_theme_ranks_first() {
        let text = "Your flight itinerary and hotel booking confirmation. \
                    The invoice is attached.";
        let themes = classify_themes(text);
        assert_eq!(themes.first(), Some(&Theme::Travel));
        assert!(themes.contains(&Theme::Finance));
    }

    #[test]
    fn test_tie_broken_alphabetically() {
        // One hit each: finance ("receipt") and travel ("visa").
        let themes = classify_themes("receipt for the visa");
        assert_eq!(themes, vec![Theme::Finance, Theme::Travel]);
    }

    #[test]
    fn test_word_boundaries_prevent_substring_matches() {
        // "contractor" must not match the legal pattern \bcontract\b
        let themes = classify_themes("the contractor arrived late");
        assert!(!themes.contains(&Theme::Legal));
    }

    #[test]
    fn test_case_insensitive() {
        let themes = classify_themes("PASSPORT renewal form");
        assert_eq!(themes, vec![Theme::Identity]);
    }

    #[test]
    fn test_no_matches_yields_empty() {
        assert!(classify_themes("the quick brown fox").is_empty());
    }

    #[test]
    fn test_theme_serde_snake_case() {
        assert_eq!(
            serde_json::to_string(&Theme::Correspondence).unwrap(),
            "\"correspondence\""
        );
    }

    #[test]
    fn test_pattern_table_compiles() {
        // Force Lazy evaluation; a bad pattern would panic here.
        assert_eq!(COMPILED.len(), THEME_PATTERNS.len());
    }
}
