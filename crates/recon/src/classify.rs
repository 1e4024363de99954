//! Column classification: which source column backs which canonical field.
//!
//! The label pass walks columns in source order and asks the rule table for
//! the first category whose tokens appear in the normalized label. Each
//! category has an ordered list of target fields; the column goes to the
//! first target that is still free. Filled fields are never overwritten, and
//! a column whose targets are all taken stays unmapped.
//!
//! If `Email` is still free after the label pass, the content fallback
//! assigns the first unmapped column with an `@` in any value.

use serde::Serialize;

use crate::config::ClassifyConfig;
use crate::model::{CanonicalField, ColumnClassification, SourceTable};

// ---------------------------------------------------------------------------
// Rule table
// ---------------------------------------------------------------------------

const EMAIL_TOKENS: &[&str] = &["@", "mail", "מייל", "דוא\"ל", "דואל"];
const PHONE_TOKENS: &[&str] = &["phone", "mobile", "cell", "טלפון", "נייד", "פלאפון"];
const NAME_TOKENS: &[&str] = &["name", "שם"];

const PHONE_ALT_QUALIFIERS: &[&str] =
    &["נוסף", "נוספת", "alt", "secondary", "second", "other", "additional"];
const ENGLISH_QUALIFIERS: &[&str] = &["english", "אנגלית", "לועזית"];
const HEBREW_QUALIFIERS: &[&str] = &["hebrew", "עברית"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCategory {
    Email,
    Phone,
    Name,
}

/// One label predicate: the label contains any of `tokens`.
#[derive(Debug, Clone)]
pub struct Rule {
    pub category: RuleCategory,
    pub tokens: Vec<String>,
}

impl Rule {
    fn matches(&self, label: &str) -> bool {
        contains_any(label, &self.tokens)
    }
}

/// Ordered rules plus the qualifier lists that pick a target within a category.
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<Rule>,
    phone_alt_qualifiers: Vec<String>,
    english_qualifiers: Vec<String>,
    hebrew_qualifiers: Vec<String>,
}

impl RuleTable {
    pub fn builtin() -> Self {
        Self {
            rules: vec![
                Rule { category: RuleCategory::Email, tokens: owned(EMAIL_TOKENS) },
                Rule { category: RuleCategory::Phone, tokens: owned(PHONE_TOKENS) },
                Rule { category: RuleCategory::Name, tokens: owned(NAME_TOKENS) },
            ],
            phone_alt_qualifiers: owned(PHONE_ALT_QUALIFIERS),
            english_qualifiers: owned(ENGLISH_QUALIFIERS),
            hebrew_qualifiers: owned(HEBREW_QUALIFIERS),
        }
    }

    /// Built-in table extended with the configured extra tokens.
    pub fn from_config(config: &ClassifyConfig) -> Self {
        let extra = &config.extra_tokens;
        let mut table = Self::builtin();
        for rule in &mut table.rules {
            let more = match rule.category {
                RuleCategory::Email => &extra.email,
                RuleCategory::Phone => &extra.phone,
                RuleCategory::Name => &extra.name,
            };
            rule.tokens.extend(more.iter().map(|t| normalize_label(t)));
        }
        table
            .phone_alt_qualifiers
            .extend(extra.phone_alt_qualifiers.iter().map(|t| normalize_label(t)));
        table
            .english_qualifiers
            .extend(extra.english_qualifiers.iter().map(|t| normalize_label(t)));
        table
            .hebrew_qualifiers
            .extend(extra.hebrew_qualifiers.iter().map(|t| normalize_label(t)));
        table
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// First matching category for an already-normalized label.
    pub fn category_for(&self, normalized: &str) -> Option<RuleCategory> {
        self.rules.iter().find(|r| r.matches(normalized)).map(|r| r.category)
    }

    /// Target fields for a category, in assignment preference order.
    pub fn targets(&self, category: RuleCategory, normalized: &str) -> Vec<CanonicalField> {
        use CanonicalField::*;
        match category {
            RuleCategory::Email => vec![Email],
            RuleCategory::Phone => {
                if contains_any(normalized, &self.phone_alt_qualifiers) {
                    vec![PhoneAlt, Phone]
                } else {
                    vec![Phone, PhoneAlt]
                }
            }
            RuleCategory::Name => {
                if contains_any(normalized, &self.english_qualifiers) {
                    vec![EnglishName]
                } else if contains_any(normalized, &self.hebrew_qualifiers) {
                    vec![HebrewName]
                } else {
                    vec![HebrewName, EnglishName]
                }
            }
        }
    }

    /// Category and target preference for a raw label, or `None` when no rule matches.
    pub fn lookup(&self, label: &str) -> Option<(RuleCategory, Vec<CanonicalField>)> {
        let normalized = normalize_label(label);
        let category = self.category_for(&normalized)?;
        Some((category, self.targets(category, &normalized)))
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::builtin()
    }
}

fn owned(tokens: &[&str]) -> Vec<String> {
    tokens.iter().map(|t| t.to_string()).collect()
}

fn contains_any(label: &str, tokens: &[String]) -> bool {
    tokens.iter().any(|t| label.contains(t.as_str()))
}

/// Trim, then lowercase latin letters only. Other scripts pass through untouched.
pub fn normalize_label(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    for c in label.trim().chars() {
        if is_latin_letter(c) {
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn is_latin_letter(c: char) -> bool {
    c.is_ascii_alphabetic() || (('\u{00C0}'..='\u{024F}').contains(&c) && c.is_alphabetic())
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchReason {
    /// Mapped by a label rule.
    Label,
    /// Mapped to `Email` by the content fallback.
    Content,
    /// Label is a canonical field label.
    Canonical,
    /// A rule matched but every target field was already filled.
    TargetFull,
    /// No rule matched.
    NoMatch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnReport {
    pub index: usize,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<CanonicalField>,
    pub reason: MatchReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub classification: ColumnClassification,
    pub columns: Vec<ColumnReport>,
}

#[derive(Debug, Clone)]
pub struct Classifier {
    rules: RuleTable,
    content_email_fallback: bool,
}

impl Classifier {
    pub fn new(rules: RuleTable, content_email_fallback: bool) -> Self {
        Self { rules, content_email_fallback }
    }

    pub fn from_config(config: &ClassifyConfig) -> Self {
        Self::new(RuleTable::from_config(config), config.content_email_fallback)
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// Classify one table. Never fails; unmatched fields stay unassigned.
    pub fn classify(&self, table: &SourceTable) -> Classified {
        if table.has_canonical_labels() {
            return classify_canonical(table);
        }

        let mut classification = ColumnClassification::default();
        let mut columns = Vec::with_capacity(table.columns().len());

        for (index, col) in table.columns().iter().enumerate() {
            let (field, reason) = match self.rules.lookup(&col.label) {
                Some((category, targets)) => {
                    match targets.into_iter().find(|f| classification.assign(*f, index)) {
                        Some(field) => {
                            log::debug!("column {index} '{}' -> {field} ({category:?} rule)", col.label);
                            (Some(field), MatchReason::Label)
                        }
                        None => {
                            log::debug!("column {index} '{}' ignored: {category:?} targets full", col.label);
                            (None, MatchReason::TargetFull)
                        }
                    }
                }
                None => (None, MatchReason::NoMatch),
            };
            columns.push(ColumnReport { index, label: col.label.clone(), field, reason });
        }

        if self.content_email_fallback && !classification.is_assigned(CanonicalField::Email) {
            let hit = table.columns().iter().enumerate().find(|(index, col)| {
                classification.field_for(*index).is_none()
                    && col.values.iter().any(|v| v.contains('@'))
            });
            if let Some((index, col)) = hit {
                classification.assign(CanonicalField::Email, index);
                log::debug!("column {index} '{}' -> email (content fallback)", col.label);
                columns[index].field = Some(CanonicalField::Email);
                columns[index].reason = MatchReason::Content;
            }
        }

        Classified { classification, columns }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::from_config(&ClassifyConfig::default())
    }
}

fn classify_canonical(table: &SourceTable) -> Classified {
    let mut classification = ColumnClassification::default();
    let columns = table
        .columns()
        .iter()
        .enumerate()
        .map(|(index, col)| {
            let field = CanonicalField::from_label(&col.label)
                .filter(|f| classification.assign(*f, index));
            let reason = if field.is_some() { MatchReason::Canonical } else { MatchReason::NoMatch };
            ColumnReport { index, label: col.label.clone(), field, reason }
        })
        .collect();
    Classified { classification, columns }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
