// This file is part of the product Campanile.
// SPDX-FileCopyrightText: 2025-2026 Campanile Maintainers
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use serde::{Deserialize, Serialize};

/// The two locales the portal serves. Traditional Chinese is the primary
/// locale of the department; English is the fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Locale {
    #[serde(rename = "zh-TW")]
    ZhTw,
    #[serde(rename = "en")]
    En,
}

impl Locale {
    pub fn other(self) -> Locale {
        match self {
            Locale::ZhTw => Locale::En,
            Locale::En => Locale::ZhTw,
        }
    }
}

/// A bilingual text value with the JSON shape `{"zh-TW": .., "en": ..}`.
///
/// All display resolution goes through [`LocalizedText::resolve`], which
/// applies the fallback chain primary locale, then the other locale, then
/// the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    #[serde(rename = "zh-TW", default, skip_serializing_if = "Option::is_none")]
    pub zh_tw: Option<String>,
    #[serde(rename = "en", default, skip_serializing_if = "Option::is_none")]
    pub en: Option<String>,
}

impl LocalizedText {
    pub fn new(zh_tw: Option<String>, en: Option<String>) -> Self {
        Self { zh_tw, en }
    }

    pub fn from_zh_tw(value: impl Into<String>) -> Self {
        Self {
            zh_tw: Some(value.into()),
            en: None,
        }
    }

    pub fn get(&self, locale: Locale) -> Option<&str> {
        let value = match locale {
            Locale::ZhTw => self.zh_tw.as_deref(),
            Locale::En => self.en.as_deref(),
        };
        value.filter(|text| !text.trim().is_empty())
    }

    /// Resolve for display: `primary -> other locale -> ""`.
    pub fn resolve(&self, primary: Locale) -> &str {
        self.get(primary)
            .or_else(|| self.get(primary.other()))
            .unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.get(Locale::ZhTw).is_none() && self.get(Locale::En).is_none()
    }

    /// Case-insensitive substring match against either locale. Search over
    /// bilingual columns is OR-combined across locales.
    pub fn matches(&self, needle_lower: &str) -> bool {
        [self.zh_tw.as_deref(), self.en.as_deref()]
            .into_iter()
            .flatten()
            .any(|text| text.to_lowercase().contains(needle_lower))
    }

    /// Case-insensitive equality against either locale. Name lookups compare
    /// whole values; substring hits are not a match.
    pub fn equals_ignore_case(&self, needle_lower: &str) -> bool {
        [self.zh_tw.as_deref(), self.en.as_deref()]
            .into_iter()
            .flatten()
            .any(|text| text.to_lowercase() == needle_lower)
    }
}
