// This file is part of the product Campanile.
// SPDX-FileCopyrightText: 2025-2026 Campanile Maintainers
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::locale::LocalizedText;
use crate::validation::{FieldErrors, dedup_ids, trim_to_option};
use serde::Deserialize;
use uuid::Uuid;

pub const MAX_NAME_CHARS: usize = 255;

fn email_is_plausible(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
}

fn check_name(name: &LocalizedText, errors: &mut FieldErrors) {
    if name.is_empty() {
        errors.add("name", "A name is required in at least one language");
    }
    for value in [name.zh_tw.as_deref(), name.en.as_deref()]
        .into_iter()
        .flatten()
    {
        if value.chars().count() > MAX_NAME_CHARS {
            errors.add(
                "name",
                format!("Names must be at most {} characters", MAX_NAME_CHARS),
            );
            break;
        }
    }
}

fn check_email(email: Option<&str>, errors: &mut FieldErrors) -> Option<String> {
    let email = trim_to_option(email)?;
    if !email_is_plausible(&email) {
        errors.add("email", "The email address is not valid");
    }
    Some(email)
}

#[derive(Debug, Clone, Deserialize)]
pub struct TeacherPayload {
    pub name: LocalizedText,
    #[serde(default)]
    pub title: LocalizedText,
    #[serde(default)]
    pub bio: LocalizedText,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub office: Option<String>,
    #[serde(default)]
    pub expertise: LocalizedText,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub visible: Option<bool>,
    #[serde(default)]
    pub sort_order: Option<i32>,
}

impl TeacherPayload {
    pub fn validate(&self) -> Result<NormalizedTeacher, FieldErrors> {
        let mut errors = FieldErrors::new();
        check_name(&self.name, &mut errors);
        let email = check_email(self.email.as_deref(), &mut errors);
        errors.into_result(NormalizedTeacher {
            email,
            office: trim_to_option(self.office.as_deref()),
        })
    }
}

/// Trimmed optional fields the handler applies alongside the payload.
#[derive(Debug, Clone)]
pub struct NormalizedTeacher {
    pub email: Option<String>,
    pub office: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StaffPayload {
    pub name: LocalizedText,
    #[serde(default)]
    pub title: LocalizedText,
    #[serde(default)]
    pub bio: LocalizedText,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub visible: Option<bool>,
    #[serde(default)]
    pub sort_order: Option<i32>,
}

impl StaffPayload {
    pub fn validate(&self) -> Result<Option<String>, FieldErrors> {
        let mut errors = FieldErrors::new();
        check_name(&self.name, &mut errors);
        let email = check_email(self.email.as_deref(), &mut errors);
        errors.into_result(email)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LabPayload {
    pub name: LocalizedText,
    #[serde(default)]
    pub description: LocalizedText,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub teacher_ids: Vec<u64>,
    #[serde(default)]
    pub tag_ids: Vec<u64>,
    #[serde(default)]
    pub visible: Option<bool>,
    #[serde(default)]
    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct NormalizedLab {
    pub website: Option<String>,
    pub teacher_ids: Vec<u64>,
    pub tag_ids: Vec<u64>,
}

impl LabPayload {
    pub fn validate(
        &self,
        teacher_exists: &dyn Fn(u64) -> bool,
        tag_exists: &dyn Fn(u64) -> bool,
    ) -> Result<NormalizedLab, FieldErrors> {
        let mut errors = FieldErrors::new();
        check_name(&self.name, &mut errors);

        let website = trim_to_option(self.website.as_deref());
        if let Some(website) = &website
            && !(website.starts_with("http://") || website.starts_with("https://"))
        {
            errors.add("website", "The website must use http or https");
        }

        let teacher_ids = dedup_ids(&self.teacher_ids);
        for id in &teacher_ids {
            if !teacher_exists(*id) {
                errors.add("teacher_ids", format!("Teacher record {} does not exist", id));
            }
        }
        let tag_ids = dedup_ids(&self.tag_ids);
        for id in &tag_ids {
            if !tag_exists(*id) {
                errors.add("tag_ids", format!("Tag {} does not exist", id));
            }
        }

        errors.into_result(NormalizedLab {
            website,
            teacher_ids,
            tag_ids,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn teacher_requires_a_name() {
        let payload = TeacherPayload {
            name: LocalizedText::default(),
            title: LocalizedText::default(),
            bio: LocalizedText::default(),
            email: None,
            office: None,
            expertise: LocalizedText::default(),
            user_id: None,
            visible: None,
            sort_order: None,
        };
        let errors = payload.validate().unwrap_err();
        assert!(errors.has("name"));
    }

    #[test]
    fn teacher_email_must_be_plausible() {
        let payload = TeacherPayload {
            name: LocalizedText::new(None, Some("Wang".to_string())),
            title: LocalizedText::default(),
            bio: LocalizedText::default(),
            email: Some("not-an-email".to_string()),
            office: None,
            expertise: LocalizedText::default(),
            user_id: None,
            visible: None,
            sort_order: None,
        };
        let errors = payload.validate().unwrap_err();
        assert!(errors.has("email"));
    }

    #[test]
    fn blank_email_normalizes_to_none() {
        let payload = TeacherPayload {
            name: LocalizedText::new(None, Some("Wang".to_string())),
            title: LocalizedText::default(),
            bio: LocalizedText::default(),
            email: Some("   ".to_string()),
            office: Some(" EC512 ".to_string()),
            expertise: LocalizedText::default(),
            user_id: None,
            visible: None,
            sort_order: None,
        };
        let normalized = payload.validate().unwrap();
        assert_eq!(normalized.email, None);
        assert_eq!(normalized.office.as_deref(), Some("EC512"));
    }

    #[test]
    fn lab_validates_members_and_website() {
        let payload = LabPayload {
            name: LocalizedText::new(None, Some("Vision Lab".to_string())),
            description: LocalizedText::default(),
            website: Some("gopher://old.example.edu".to_string()),
            teacher_ids: vec![1, 1, 2],
            tag_ids: vec![],
            visible: None,
            sort_order: None,
        };
        let errors = payload
            .validate(&|id| id == 1, &|_| true)
            .unwrap_err();
        assert!(errors.has("website"));
        assert!(errors.has("teacher_ids"));
    }

    #[test]
    fn lab_dedups_member_ids() {
        let payload = LabPayload {
            name: LocalizedText::new(None, Some("Vision Lab".to_string())),
            description: LocalizedText::default(),
            website: None,
            teacher_ids: vec![2, 1, 2],
            tag_ids: vec![],
            visible: None,
            sort_order: None,
        };
        let normalized = payload.validate(&|_| true, &|_| true).unwrap();
        assert_eq!(normalized.teacher_ids, vec![2, 1]);
    }
}
