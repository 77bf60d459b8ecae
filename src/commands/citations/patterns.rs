use std::iter::Peekable;

use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CitationKind {
    Usc,
    Cfr,
    ExecutiveOrder,
    PublicLaw,
    Act,
    Title,
}

impl CitationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CitationKind::Usc => "usc",
            CitationKind::Cfr => "cfr",
            CitationKind::ExecutiveOrder => "executive_order",
            CitationKind::PublicLaw => "public_law",
            CitationKind::Act => "act",
            CitationKind::Title => "title",
        }
    }
}

// Scanning and canonicalization share these expressions, in this order.
const PATTERN_SPECS: [(CitationKind, &str, &str); 7] = [
    (
        CitationKind::Usc,
        r"(?i)\b(\d+)\s*(?:U\.S\.C\.|USC|U\.S\. Code)\s*§?\s*(\d+(?:\.\d+)*(?:[a-zA-Z0-9]*)?)",
        "${1} USC ${2}",
    ),
    (
        CitationKind::Cfr,
        r"(?i)\b(\d+)\s*(?:C\.F\.R\.|CFR|Code of Federal Regulations)\s*§?\s*(\d+(?:\.\d+)*(?:[a-zA-Z0-9]*)?)",
        "${1} CFR ${2}",
    ),
    (
        CitationKind::ExecutiveOrder,
        r"(?i)\b(?:E\.O\.|Executive\s*Order)\s*(\d+)",
        "Executive Order ${1}",
    ),
    (
        CitationKind::ExecutiveOrder,
        r"(?i)\bEO\s+(\d+)\b",
        "Executive Order ${1}",
    ),
    (
        CitationKind::PublicLaw,
        r"(?i)\b(?:Public\s+Law|P\.L\.)\s*(\d{1,3}[-–]\d{1,4})\b",
        "Public Law ${1}",
    ),
    (
        CitationKind::Act,
        r"(?i)\bAct\s+of\s+(\d{4})\b",
        "Act of ${1}",
    ),
    (CitationKind::Title, r"(?i)\bTitle\s+(\d+)\b", "Title ${1}"),
];

#[derive(Debug)]
struct CitationPattern {
    kind: CitationKind,
    regex: Regex,
    replacement: &'static str,
}

/// Compiled citation recognizers for the six supported citation styles.
///
/// The same instance canonicalizes during extraction and during the
/// standalone cleanup pass so both produce identical text.
#[derive(Debug)]
pub struct CitationMatcher {
    patterns: Vec<CitationPattern>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitationMatch<'t> {
    pub raw: &'t str,
    pub canonical: String,
    pub kind: CitationKind,
    pub start: usize,
    pub end: usize,
}

impl CitationMatcher {
    pub fn new() -> Result<Self> {
        let patterns = PATTERN_SPECS
            .iter()
            .map(|(kind, pattern, replacement)| -> Result<CitationPattern> {
                let regex = Regex::new(pattern).with_context(|| {
                    format!("failed to compile {} citation regex", kind.as_str())
                })?;
                Ok(CitationPattern {
                    kind: *kind,
                    regex,
                    replacement: *replacement,
                })
            })
            .collect::<Result<Vec<CitationPattern>>>()?;

        Ok(Self { patterns })
    }

    pub fn canonicalize(&self, text: &str) -> String {
        let mut canonical = text.to_string();
        for pattern in &self.patterns {
            canonical = pattern
                .regex
                .replace_all(&canonical, pattern.replacement)
                .into_owned();
        }
        canonical
    }

    /// Every citation in `text`, ordered by start offset.
    ///
    /// Each style scans independently, so a match of one kind may overlap a
    /// match of another (for example `Title 9` inside a longer CFR citation).
    pub fn find_iter<'m, 't>(&'m self, text: &'t str) -> CitationMatches<'m, 't> {
        CitationMatches {
            matcher: self,
            text,
            cursors: self
                .patterns
                .iter()
                .map(|pattern| pattern.regex.find_iter(text).peekable())
                .collect(),
        }
    }
}

pub struct CitationMatches<'m, 't> {
    matcher: &'m CitationMatcher,
    text: &'t str,
    cursors: Vec<Peekable<regex::Matches<'m, 't>>>,
}

impl<'t> Iterator for CitationMatches<'_, 't> {
    type Item = CitationMatch<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut earliest: Option<(usize, usize)> = None;
        for (index, cursor) in self.cursors.iter_mut().enumerate() {
            if let Some(found) = cursor.peek() {
                if earliest.is_none_or(|(_, start)| found.start() < start) {
                    earliest = Some((index, found.start()));
                }
            }
        }

        let (index, _) = earliest?;
        let found = self.cursors[index].next()?;
        let raw = &self.text[found.start()..found.end()];

        Some(CitationMatch {
            raw,
            canonical: self.matcher.canonicalize(raw),
            kind: self.matcher.patterns[index].kind,
            start: found.start(),
            end: found.end(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> CitationMatcher {
        CitationMatcher::new().expect("citation regexes compile")
    }

    fn single(text: &str) -> (CitationKind, String) {
        let matcher = matcher();
        let found = matcher.find_iter(text).collect::<Vec<_>>();
        assert_eq!(found.len(), 1, "expected one citation in {text:?}: {found:?}");
        (found[0].kind, found[0].canonical.clone())
    }

    #[test]
    fn usc_with_section_sign_and_suffix() {
        assert_eq!(
            single("42 U.S.C. § 1395a"),
            (CitationKind::Usc, "42 USC 1395a".to_string())
        );
        assert_eq!(
            single("see 21 u.s. code 601 for details"),
            (CitationKind::Usc, "21 USC 601".to_string())
        );
    }

    #[test]
    fn cfr_keeps_decimal_subparts() {
        assert_eq!(
            single("7 CFR 1.2"),
            (CitationKind::Cfr, "7 CFR 1.2".to_string())
        );
        assert_eq!(
            single("under 9 C.F.R. §416.2(b)"),
            (CitationKind::Cfr, "9 CFR 416.2".to_string())
        );
        assert_eq!(
            single("7 Code of Federal Regulations 104.2"),
            (CitationKind::Cfr, "7 CFR 104.2".to_string())
        );
    }

    #[test]
    fn executive_order_spellings_share_canonical_form() {
        for text in ["E.O. 14147", "EO 14147", "executive order 14147", "Executive Order 14147"] {
            assert_eq!(
                single(text),
                (
                    CitationKind::ExecutiveOrder,
                    "Executive Order 14147".to_string()
                ),
                "{text}"
            );
        }
    }

    #[test]
    fn public_law_act_and_title_forms() {
        assert_eq!(
            single("P.L. 113-79"),
            (CitationKind::PublicLaw, "Public Law 113-79".to_string())
        );
        assert_eq!(
            single("public law 104–127"),
            (CitationKind::PublicLaw, "Public Law 104–127".to_string())
        );
        assert_eq!(
            single("the ACT OF 1906"),
            (CitationKind::Act, "Act of 1906".to_string())
        );
        assert_eq!(
            single("TITLE 21"),
            (CitationKind::Title, "Title 21".to_string())
        );
    }

    #[test]
    fn canonicalize_is_idempotent() {
        let matcher = matcher();
        let samples = [
            "42 U.S.C. § 1395a",
            "7 CFR 1.2",
            "9 c.f.r. 416.2",
            "21 U.S. Code 601",
            "E.O. 14147",
            "EO 13990",
            "ExecutiveOrder 12866",
            "P.L. 113-79",
            "Public  Law 104–127",
            "act of 1906",
            "title 9",
            "Title 42 U.S.C. 1395",
        ];

        for sample in samples {
            let once = matcher.canonicalize(sample);
            let twice = matcher.canonicalize(&once);
            assert_eq!(once, twice, "{sample}");
        }
    }

    #[test]
    fn overlapping_kinds_both_fire_in_offset_order() {
        let matcher = matcher();
        let found = matcher
            .find_iter("Title 9 CFR 1.2 and E.O. 12866")
            .map(|found| (found.kind, found.canonical, found.start))
            .collect::<Vec<_>>();

        assert_eq!(
            found,
            vec![
                (CitationKind::Title, "Title 9".to_string(), 0),
                (CitationKind::Cfr, "9 CFR 1.2".to_string(), 6),
                (
                    CitationKind::ExecutiveOrder,
                    "Executive Order 12866".to_string(),
                    20
                ),
            ]
        );
    }

    #[test]
    fn offsets_slice_back_to_raw_text() {
        let matcher = matcher();
        let text = "Pursuant to 21 U.S.C. 601 et seq.";
        let found = matcher.find_iter(text).next().expect("usc citation");
        assert_eq!(&text[found.start..found.end], found.raw);
        assert_eq!(found.raw, "21 U.S.C. 601");
    }

    #[test]
    fn plain_prose_has_no_citations() {
        let matcher = matcher();
        assert_eq!(matcher.find_iter("Inspect the carcass at 10 am.").count(), 0);
    }
}
