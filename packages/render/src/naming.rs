//! # Object naming
//!
//! Display names for referenced objects, resolved by an ordered chain of
//! [`NamingRule`]s. The first rule that claims an object decides its name;
//! a blank decision falls back to the untitled placeholder.
//!
//! ```text
//! Deleted ─► Date ─► Note ─► File ─► Name ─► (blank) Untitled
//! ```

use blocktree_model::{ObjectLayout, ObjectRecord, ObjectTypeRecord};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SNIPPET_MAX_LENGTH: usize = 30;

/// Localized strings used when an object has no usable name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Placeholders {
    pub untitled: String,
    pub deleted: String,
    pub today: String,
    pub yesterday: String,
    pub tomorrow: String,
    /// chrono format string for dates outside the relative window
    pub date_format: String,
}

impl Default for Placeholders {
    fn default() -> Self {
        Self {
            untitled: "Untitled".to_string(),
            deleted: "Deleted object".to_string(),
            today: "Today".to_string(),
            yesterday: "Yesterday".to_string(),
            tomorrow: "Tomorrow".to_string(),
            date_format: "%b %-d, %Y".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamingRule {
    Deleted,
    Date,
    Note,
    File,
    Name,
}

impl NamingRule {
    /// Precedence order
    pub const CHAIN: [NamingRule; 5] = [
        NamingRule::Deleted,
        NamingRule::Date,
        NamingRule::Note,
        NamingRule::File,
        NamingRule::Name,
    ];

    /// `None` passes the object to the next rule
    pub fn apply(self, naming: &ObjectNaming, object: &ObjectRecord<'_>) -> Option<String> {
        let layout = object.layout();
        match self {
            NamingRule::Deleted => object
                .is_deleted()
                .then(|| naming.placeholders.deleted.clone()),
            NamingRule::Date => {
                if layout != Some(ObjectLayout::Date) {
                    return None;
                }
                let date = object
                    .timestamp()
                    .and_then(|secs| DateTime::from_timestamp(secs, 0))
                    .map(|time| naming.relative_date(time.date_naive()));
                Some(date.unwrap_or_default())
            }
            NamingRule::Note => {
                if layout != Some(ObjectLayout::Note) {
                    return None;
                }
                let snippet = object.snippet().unwrap_or_default().replace('\n', " ");
                Some(snippet.chars().take(naming.snippet_max_length).collect())
            }
            NamingRule::File => {
                if !layout.map_or(false, ObjectLayout::is_file_family) {
                    return None;
                }
                let name = object
                    .name()
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or(naming.placeholders.untitled.as_str());
                Some(match object.file_ext().filter(|e| !e.is_empty()) {
                    Some(ext) if !name.ends_with(&format!(".{ext}")) => format!("{name}.{ext}"),
                    _ => name.to_string(),
                })
            }
            NamingRule::Name => Some(object.name().unwrap_or_default().to_string()),
        }
    }
}

/// Naming policy shared by every render pass
#[derive(Debug, Clone)]
pub struct ObjectNaming {
    pub placeholders: Placeholders,
    pub snippet_max_length: usize,
    /// Reference day for relative dates. `None` means the current UTC day.
    pub today: Option<NaiveDate>,
}

impl Default for ObjectNaming {
    fn default() -> Self {
        Self {
            placeholders: Placeholders::default(),
            snippet_max_length: DEFAULT_SNIPPET_MAX_LENGTH,
            today: None,
        }
    }
}

impl ObjectNaming {
    pub fn new(placeholders: Placeholders) -> Self {
        Self {
            placeholders,
            ..Self::default()
        }
    }

    pub fn with_snippet_max_length(mut self, max: usize) -> Self {
        self.snippet_max_length = max;
        self
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// The rule that decides `object`'s name
    pub fn matching_rule(&self, object: &ObjectRecord<'_>) -> NamingRule {
        NamingRule::CHAIN
            .into_iter()
            .find(|rule| rule.apply(self, object).is_some())
            .unwrap_or(NamingRule::Name)
    }

    pub fn object_name(&self, object: &ObjectRecord<'_>) -> String {
        NamingRule::CHAIN
            .into_iter()
            .find_map(|rule| rule.apply(self, object))
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| self.placeholders.untitled.clone())
    }

    pub fn type_name(&self, object_type: &ObjectTypeRecord<'_>) -> String {
        object_type
            .name()
            .filter(|name| !name.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.placeholders.untitled.clone())
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Utc::now().date_naive())
    }

    pub fn relative_date(&self, date: NaiveDate) -> String {
        match (date - self.today()).num_days() {
            0 => self.placeholders.today.clone(),
            -1 => self.placeholders.yesterday.clone(),
            1 => self.placeholders.tomorrow.clone(),
            _ => self.format_date(date),
        }
    }

    pub fn format_date(&self, date: NaiveDate) -> String {
        date.format(&self.placeholders.date_format).to_string()
    }
}
