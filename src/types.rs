//! Shared types used across pipeline stages.
//!
//! [`LessonRecord`] is read from the `codelab.json` the converter writes next
//! to each exported lesson, then handed to the landing page templates as-is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// File name of the metadata sidecar inside every lesson directory.
pub const METADATA_FILE: &str = "codelab.json";

/// Metadata for one exported lesson.
///
/// Decoding is schema-tolerant: unknown fields are ignored, and missing or
/// `null` fields take their empty value. The only hard requirement is
/// well-formed JSON with correctly typed values.
///
/// Keys are matched exactly, apart from the `Updated` alias. Other casings
/// are ignored as unknown fields, and a file carrying both `updated` and
/// `Updated` is rejected as a duplicate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LessonRecord {
    #[serde(deserialize_with = "null_as_default")]
    pub environment: String,
    #[serde(alias = "Updated")]
    pub updated: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    /// Estimated duration in seconds.
    #[serde(deserialize_with = "null_as_default")]
    pub duration: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub author: String,
    #[serde(deserialize_with = "null_as_default")]
    pub summary: String,
    #[serde(deserialize_with = "null_as_default")]
    pub theme: String,
    /// Expected to contain the site's fixed category (see `landing.expected_category`).
    #[serde(deserialize_with = "null_as_default")]
    pub category: Vec<String>,
    /// Free-form technology labels. Compared case-insensitively.
    #[serde(deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub feedback: String,
    /// Link to the lesson, relative to the build output root once aggregated.
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,
}

/// Decode `null` as the type's empty value. claat writes unset slices and
/// strings as `null`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl LessonRecord {
    /// Tags lower-cased, in their original order, duplicates kept.
    pub fn normalized_tags(&self) -> impl Iterator<Item = String> + '_ {
        self.tags.iter().map(|t| t.to_lowercase())
    }
}
