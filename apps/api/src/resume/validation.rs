//! Resume validation against its schema registry.
//!
//! Every rule runs on every call and all violations are collected, so the
//! editor can surface them per field in one pass. The result only depends on
//! the inputs: validating the same aggregate twice gives the same answer.
//!
//! # Rules (in reporting order)
//! - sections reference registered schemas; each schema backs at most one
//!   section; values are bound to fields of the section's schema
//! - `personal.fullName` and `personal.email` are non-empty, email is a mailbox
//! - github / linkedin / portfolio, when present, are absolute URLs
//! - required fields hold a non-empty value in every item
//! - `date` values are `"Present"` or `"<Month> <YYYY>"`; a start date may not
//!   be later than the end date that follows it
//! - `link` values, when non-empty, are absolute URLs
//! - item counts lie within `min_items..=max_items`

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::ResumeError;
use crate::resume::models::{present, Resume, Section};
use crate::schema::{FieldType, SchemaId, SchemaRegistry, SectionSchema};

pub const PRESENT: &str = "Present";

pub const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
    )
    .expect("email pattern is valid")
});

static MONTH_YEAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z]+) (\d{4})$").expect("date pattern is valid"));

/// One failed rule, addressed by a dotted path into the resume document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub path: String,
    pub reason: String,
}

impl Violation {
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "violations", rename_all = "snake_case")]
pub enum ValidationResult {
    Valid,
    Invalid(Vec<Violation>),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    pub fn violations(&self) -> &[Violation] {
        match self {
            ValidationResult::Valid => &[],
            ValidationResult::Invalid(violations) => violations,
        }
    }

    pub fn into_result(self) -> Result<(), ResumeError> {
        match self {
            ValidationResult::Valid => Ok(()),
            ValidationResult::Invalid(violations) => Err(ResumeError::ValidationFailed(violations)),
        }
    }
}

/// Validates `resume` against `registry`, reporting every violation.
pub fn validate(resume: &Resume, registry: &SchemaRegistry) -> ValidationResult {
    let mut violations = Vec::new();

    let resolved = check_references(resume, registry, &mut violations);
    check_personal(resume, &mut violations);
    check_social_links(resume, &mut violations);
    check_required_fields(&resolved, &mut violations);
    check_dates(&resolved, &mut violations);
    check_links(&resolved, &mut violations);
    check_cardinality(&resolved, &mut violations);

    if violations.is_empty() {
        ValidationResult::Valid
    } else {
        ValidationResult::Invalid(violations)
    }
}

/// Gate used before persistence and rendering.
pub fn ensure_valid(resume: &Resume, registry: &SchemaRegistry) -> Result<(), ResumeError> {
    validate(resume, registry).into_result()
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_PATTERN.is_match(value)
}

/// True for absolute URLs with a host (`https://…`), false for relative
/// references and host-less schemes such as `javascript:`.
pub fn is_absolute_url(value: &str) -> bool {
    Url::parse(value).map(|url| url.has_host()).unwrap_or(false)
}

/// Parses `"<Month> <YYYY>"` into `(year, month)` with month in `1..=12`.
pub fn parse_month_year(value: &str) -> Option<(i32, u32)> {
    let captures = MONTH_YEAR_PATTERN.captures(value)?;
    let month = MONTHS.iter().position(|m| *m == &captures[1])? as u32 + 1;
    let year = captures[2].parse().ok()?;
    Some((year, month))
}

pub fn is_valid_date(value: &str) -> bool {
    value == PRESENT || parse_month_year(value).is_some()
}

// ────────────────────────────────────────────────────────────────────────────
// Rules
// ────────────────────────────────────────────────────────────────────────────

/// A section paired with its schema; sections whose schema is missing are
/// reported once and skipped by the remaining rules.
struct ResolvedSection<'a> {
    path: String,
    section: &'a Section,
    schema: &'a SectionSchema,
}

fn check_references<'a>(
    resume: &'a Resume,
    registry: &'a SchemaRegistry,
    violations: &mut Vec<Violation>,
) -> Vec<ResolvedSection<'a>> {
    let mut resolved = Vec::new();
    let mut seen: HashMap<SchemaId, usize> = HashMap::new();

    for (index, section) in resume.sections.iter().enumerate() {
        let path = format!("sections[{index}]");

        let Some(schema) = registry.find(section.schema_id) else {
            violations.push(Violation::new(
                format!("{path}.schemaId"),
                format!("schema {} is not registered", section.schema_id),
            ));
            continue;
        };

        if let Some(first) = seen.insert(section.schema_id, index) {
            violations.push(Violation::new(
                format!("{path}.schemaId"),
                format!("schema '{}' is already used by sections[{first}]", schema.title),
            ));
        }

        for (item_index, item) in section.items.iter().enumerate() {
            for field_id in item.values.keys() {
                if schema.field(*field_id).is_none() {
                    violations.push(Violation::new(
                        format!("{path}.items[{item_index}].fields"),
                        format!("field {field_id} is not part of schema '{}'", schema.title),
                    ));
                }
            }
        }

        resolved.push(ResolvedSection {
            path,
            section,
            schema,
        });
    }

    resolved
}

fn check_personal(resume: &Resume, violations: &mut Vec<Violation>) {
    let personal = &resume.personal;

    if personal.full_name.trim().is_empty() {
        violations.push(Violation::new("personal.fullName", "Full name is required"));
    }

    let email = personal.email.trim();
    if email.is_empty() {
        violations.push(Violation::new("personal.email", "Email is required"));
    } else if !is_valid_email(email) {
        violations.push(Violation::new("personal.email", "Invalid email"));
    }
}

fn check_social_links(resume: &Resume, violations: &mut Vec<Violation>) {
    let personal = &resume.personal;
    let links = [
        ("github", &personal.github),
        ("linkedin", &personal.linkedin),
        ("portfolio", &personal.portfolio),
    ];

    for (name, value) in links {
        if let Some(url) = present(value) {
            if !is_absolute_url(url) {
                violations.push(Violation::new(format!("personal.{name}"), "Invalid URL"));
            }
        }
    }
}

fn check_required_fields(sections: &[ResolvedSection<'_>], violations: &mut Vec<Violation>) {
    for resolved in sections {
        let required: Vec<_> = resolved
            .schema
            .ordered_fields()
            .into_iter()
            .filter(|f| f.required)
            .collect();

        for (item_index, item) in resolved.section.items.iter().enumerate() {
            for field in &required {
                if item.value(field.id).trim().is_empty() {
                    violations.push(Violation::new(
                        format!("{}.items[{item_index}].{}", resolved.path, field.name),
                        format!("{} is required", field.label),
                    ));
                }
            }
        }
    }
}

fn check_dates(sections: &[ResolvedSection<'_>], violations: &mut Vec<Violation>) {
    for resolved in sections {
        let date_fields: Vec<_> = resolved
            .schema
            .ordered_fields()
            .into_iter()
            .filter(|f| f.field_type == FieldType::Date)
            .collect();

        for (item_index, item) in resolved.section.items.iter().enumerate() {
            let mut concrete = Vec::new();
            for field in &date_fields {
                let value = item.value(field.id).trim();
                if value.is_empty() {
                    continue;
                }
                let path = format!("{}.items[{item_index}].{}", resolved.path, field.name);
                if value == PRESENT {
                    continue;
                }
                match parse_month_year(value) {
                    Some(date) => concrete.push((path, date)),
                    None => violations.push(Violation::new(
                        path,
                        format!("{} must be \"Present\" or a date like \"March 2021\"", field.label),
                    )),
                }
            }

            if let [(_, start), (end_path, end), ..] = concrete.as_slice() {
                if start > end {
                    violations.push(Violation::new(
                        end_path.clone(),
                        "End date must not be earlier than the start date",
                    ));
                }
            }
        }
    }
}

fn check_links(sections: &[ResolvedSection<'_>], violations: &mut Vec<Violation>) {
    for resolved in sections {
        for (item_index, item) in resolved.section.items.iter().enumerate() {
            for field in resolved.schema.ordered_fields() {
                if field.field_type != FieldType::Link {
                    continue;
                }
                let value = item.value(field.id).trim();
                if !value.is_empty() && !is_absolute_url(value) {
                    violations.push(Violation::new(
                        format!("{}.items[{item_index}].{}", resolved.path, field.name),
                        format!("{} must be an absolute URL", field.label),
                    ));
                }
            }
        }
    }
}

fn check_cardinality(sections: &[ResolvedSection<'_>], violations: &mut Vec<Violation>) {
    for resolved in sections {
        let count = resolved.section.items.len() as u32;
        let (min, max) = (resolved.schema.min_items(), resolved.schema.max_items());
        if count < min || count > max {
            violations.push(Violation::new(
                format!("{}.items", resolved.path),
                format!(
                    "{} must have between {min} and {max} items, found {count}",
                    resolved.section.title
                ),
            ));
        }
    }
}
