// This file is part of the product Campanile.
// SPDX-FileCopyrightText: 2025-2026 Campanile Maintainers
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::HttpResponse;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Field-keyed validation errors. Form validation runs to completion and
/// aggregates every failure instead of stopping at the first one; the HTTP
/// layer renders the collection as a 422 with `{"errors": {field: [..]}}`.
#[derive(Debug, Default, Clone, Serialize)]
pub struct FieldErrors {
    errors: BTreeMap<String, Vec<String>>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.errors.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Consume the collection: `Ok(value)` when clean, `Err(self)` otherwise.
    pub fn into_result<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }

    pub fn to_response(&self) -> HttpResponse {
        HttpResponse::UnprocessableEntity().json(serde_json::json!({ "errors": self.errors }))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.errors {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Trim a form string; an empty or whitespace-only value becomes `None`.
/// Optional slugs, dates and colors are normalized through this before any
/// rule runs.
pub fn trim_to_option(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

/// Split delimited tag input on commas and newlines, trim each entry, drop
/// empties and duplicates, preserving first-seen order. Idempotent: feeding
/// the joined output back in yields the same list.
pub fn parse_delimited_names(raw: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut names = Vec::new();
    for part in raw.split(|c| c == ',' || c == '\n') {
        let trimmed = part.trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.to_string()) {
            names.push(trimmed.to_string());
        }
    }
    names
}

/// Deduplicate an id array, preserving order. Numeric-looking strings have
/// already been coerced by serde at the deserialization boundary.
pub fn dedup_ids(ids: &[u64]) -> Vec<u64> {
    let mut seen = std::collections::HashSet::new();
    ids.iter()
        .copied()
        .filter(|id| seen.insert(*id))
        .collect()
}

pub fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({ "error": "Not found" }))
}

pub fn forbidden() -> HttpResponse {
    HttpResponse::Forbidden().json(serde_json::json!({ "error": "Forbidden" }))
}

pub fn unauthorized() -> HttpResponse {
    HttpResponse::Unauthorized().json(serde_json::json!({ "error": "Authentication required" }))
}

pub fn internal_error(context: &str, err: impl fmt::Display) -> HttpResponse {
    log::error!("{}: {}", context, err);
    HttpResponse::InternalServerError().json(serde_json::json!({ "error": "Internal error" }))
}

pub fn message_response(message: &str) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "message": message }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregates_multiple_errors_per_field() {
        let mut errors = FieldErrors::new();
        errors.add("title", "Title is required");
        errors.add("title", "Title must be at most 255 characters");
        errors.add("slug", "Slug already in use");
        assert!(!errors.is_empty());
        assert_eq!(errors.messages("title").len(), 2);
        assert!(errors.has("slug"));
        assert!(!errors.has("content"));
    }

    #[test]
    fn trim_to_option_drops_blank_values() {
        assert_eq!(trim_to_option(Some("  x ")), Some("x".to_string()));
        assert_eq!(trim_to_option(Some("   ")), None);
        assert_eq!(trim_to_option(Some("")), None);
        assert_eq!(trim_to_option(None), None);
    }

    #[test]
    fn parse_delimited_names_dedups_and_preserves_order() {
        assert_eq!(parse_delimited_names("a, a ,b\nb"), vec!["a", "b"]);
        assert_eq!(
            parse_delimited_names("beta,alpha\n beta , gamma"),
            vec!["beta", "alpha", "gamma"]
        );
        assert!(parse_delimited_names(" , \n ,").is_empty());
    }

    #[test]
    fn parse_delimited_names_is_idempotent() {
        let first = parse_delimited_names("a, a ,b\nb");
        let second = parse_delimited_names(&first.join(","));
        assert_eq!(first, second);
    }

    #[test]
    fn dedup_ids_keeps_first_occurrence() {
        assert_eq!(dedup_ids(&[3, 1, 3, 2, 1]), vec![3, 1, 2]);
    }
}
