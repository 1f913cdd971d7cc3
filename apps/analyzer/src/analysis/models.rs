//! Analysis record shapes.
//!
//! Two concrete résumé records (`FresherRecord`, `ExperiencedRecord`) sit behind
//! `StructuredRecord`; an analysis call resolves to either one of them or an
//! `ErrorRecord`, never both. Every key of the category's schema is always
//! serialized: absent values are `null` or `""`, never omitted.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResumeCategory {
    Fresher,
    Experienced,
}

impl ResumeCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResumeCategory::Fresher => "Fresher",
            ResumeCategory::Experienced => "Experienced",
        }
    }
}

impl fmt::Display for ResumeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResumeCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fresher" => Ok(ResumeCategory::Fresher),
            "experienced" => Ok(ResumeCategory::Experienced),
            other => Err(format!(
                "unknown resume category '{other}' (expected Fresher or Experienced)"
            )),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Record fields
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default, deserialize_with = "lenient_text")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub phone: String,
    #[serde(default, deserialize_with = "lenient_optional_text")]
    pub linkedin: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EducationEntry {
    #[serde(default, deserialize_with = "lenient_text")]
    pub degree: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub institution: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub year: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    #[serde(default, deserialize_with = "lenient_text")]
    pub role: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub company: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub duration: String,
    #[serde(default, deserialize_with = "lenient_optional_text")]
    pub description: Option<String>,
}

/// Fields shared by both record shapes.
pub trait ResumeProfile {
    fn name(&self) -> &str;
    fn contact(&self) -> &Contact;
    fn education(&self) -> &[EducationEntry];
    fn skills(&self) -> &[String];
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FresherRecord {
    #[serde(rename = "Name", default, deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(rename = "Contact", default, deserialize_with = "null_as_default")]
    pub contact: Contact,
    #[serde(rename = "Education", default, deserialize_with = "lenient_entry_list")]
    pub education: Vec<EducationEntry>,
    #[serde(rename = "Skills", default, deserialize_with = "lenient_text_list")]
    pub skills: Vec<String>,
    #[serde(rename = "Projects", default, deserialize_with = "lenient_text_list")]
    pub projects: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperiencedRecord {
    #[serde(rename = "Name", default, deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(rename = "Contact", default, deserialize_with = "null_as_default")]
    pub contact: Contact,
    #[serde(rename = "Education", default, deserialize_with = "lenient_entry_list")]
    pub education: Vec<EducationEntry>,
    #[serde(rename = "Skills", default, deserialize_with = "lenient_text_list")]
    pub skills: Vec<String>,
    #[serde(rename = "Experience", default, deserialize_with = "lenient_entry_list")]
    pub experience: Vec<ExperienceEntry>,
    #[serde(rename = "Achievements", default, deserialize_with = "lenient_text_list")]
    pub achievements: Vec<String>,
}

macro_rules! impl_resume_profile {
    ($record:ty) => {
        impl ResumeProfile for $record {
            fn name(&self) -> &str {
                &self.name
            }
            fn contact(&self) -> &Contact {
                &self.contact
            }
            fn education(&self) -> &[EducationEntry] {
                &self.education
            }
            fn skills(&self) -> &[String] {
                &self.skills
            }
        }
    };
}

impl_resume_profile!(FresherRecord);
impl_resume_profile!(ExperiencedRecord);

/// A schema-conformant résumé record for one category.
/// Serializes as the flat record mapping, without a tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StructuredRecord {
    Fresher(FresherRecord),
    Experienced(ExperiencedRecord),
}

impl StructuredRecord {
    pub fn category(&self) -> ResumeCategory {
        match self {
            StructuredRecord::Fresher(_) => ResumeCategory::Fresher,
            StructuredRecord::Experienced(_) => ResumeCategory::Experienced,
        }
    }

    pub fn profile(&self) -> &dyn ResumeProfile {
        match self {
            StructuredRecord::Fresher(r) => r,
            StructuredRecord::Experienced(r) => r,
        }
    }

    /// Decodes a JSON object into the record shape for `category`.
    pub fn from_value(category: ResumeCategory, value: Value) -> serde_json::Result<Self> {
        Ok(match category {
            ResumeCategory::Fresher => StructuredRecord::Fresher(serde_json::from_value(value)?),
            ResumeCategory::Experienced => {
                StructuredRecord::Experienced(serde_json::from_value(value)?)
            }
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Analysis results
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecordStatus {
    #[serde(rename = "Analyzed")]
    Analyzed,
    #[serde(rename = "Sample Data - backend unavailable")]
    SampleData,
}

/// A structured record plus where it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyzedRecord {
    #[serde(flatten)]
    pub record: StructuredRecord,
    #[serde(rename = "Category")]
    pub category: ResumeCategory,
    #[serde(rename = "Status")]
    pub status: RecordStatus,
    /// Winning model; `None` for sample data.
    #[serde(rename = "Model")]
    pub model: Option<String>,
    /// Wall-clock duration of the winning attempt.
    #[serde(rename = "Analysis Seconds", serialize_with = "as_seconds")]
    pub elapsed: Option<Duration>,
}

impl AnalyzedRecord {
    pub fn from_model(record: StructuredRecord, model: &str, elapsed: Duration) -> Self {
        Self {
            category: record.category(),
            record,
            status: RecordStatus::Analyzed,
            model: Some(model.to_string()),
            elapsed: Some(elapsed),
        }
    }

    pub fn sample(record: StructuredRecord) -> Self {
        Self {
            category: record.category(),
            record,
            status: RecordStatus::SampleData,
            model: None,
            elapsed: None,
        }
    }

    pub fn is_sample(&self) -> bool {
        self.status == RecordStatus::SampleData
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorRecord {
    #[serde(rename = "Error")]
    pub error: String,
    #[serde(rename = "Details")]
    pub details: String,
    #[serde(rename = "Raw Response")]
    pub raw_response: Option<String>,
    #[serde(rename = "Suggestion")]
    pub suggestion: String,
    #[serde(rename = "Available Models", skip_serializing_if = "Option::is_none")]
    pub available_models: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnalysisResult {
    Record(AnalyzedRecord),
    Error(ErrorRecord),
}

impl AnalysisResult {
    pub fn as_record(&self) -> Option<&AnalyzedRecord> {
        match self {
            AnalysisResult::Record(r) => Some(r),
            AnalysisResult::Error(_) => None,
        }
    }

    pub fn as_error(&self) -> Option<&ErrorRecord> {
        match self {
            AnalysisResult::Error(e) => Some(e),
            AnalysisResult::Record(_) => None,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Lenient decoding helpers
// ────────────────────────────────────────────────────────────────────────────

fn as_seconds<S: Serializer>(elapsed: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
    match elapsed {
        Some(d) => serializer.serialize_f64((d.as_secs_f64() * 1000.0).round() / 1000.0),
        None => serializer.serialize_none(),
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Renders a scalar as text. Objects and arrays have no text form.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(lenient_optional_text(deserializer)?.unwrap_or_default())
}

fn lenient_optional_text<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Null => Ok(None),
        Value::Array(_) | Value::Object(_) => Err(serde::de::Error::custom(format!(
            "expected text, found {}",
            json_kind(&value)
        ))),
        scalar => Ok(scalar_text(&scalar)),
    }
}

/// Keys that name an item; their values lead when an object is flattened.
const TITLE_KEYS: [&str; 4] = ["name", "title", "project", "achievement"];

/// Entry lists where `null` items are dropped rather than failing the record.
fn lenient_entry_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let items = Option::<Vec<Option<T>>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(items.into_iter().flatten().collect())
}

/// A list of strings where items may arrive as numbers or small objects
/// (`{"name": "App", "description": "..."}` becomes `"App - ..."`).
fn lenient_text_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let items = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(items
        .iter()
        .filter_map(|item| match item {
            Value::Object(map) => flatten_object(map),
            other => scalar_text(other),
        })
        .collect())
}

/// Title-like keys first, then the remaining values in key order.
fn flatten_object(map: &serde_json::Map<String, Value>) -> Option<String> {
    let is_title = |key: &str| TITLE_KEYS.contains(&key.to_ascii_lowercase().as_str());
    let titles = map.iter().filter(|(k, _)| is_title(k));
    let rest = map.iter().filter(|(k, _)| !is_title(k));
    let parts: Vec<String> = titles
        .chain(rest)
        .filter_map(|(_, v)| scalar_text(v))
        .collect();
    (!parts.is_empty()).then(|| parts.join(" - "))
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_category_parses_case_insensitively() {
        assert_eq!("fresher".parse::<ResumeCategory>(), Ok(ResumeCategory::Fresher));
        assert_eq!(
            " EXPERIENCED ".parse::<ResumeCategory>(),
            Ok(ResumeCategory::Experienced)
        );
        assert!("senior".parse::<ResumeCategory>().is_err());
    }

    #[test]
    fn test_missing_and_null_fields_become_empty() {
        let record: FresherRecord = serde_json::from_value(json!({
            "Name": null,
            "Contact": null,
            "Skills": null
        }))
        .unwrap();
        assert_eq!(record, FresherRecord::default());
    }

    #[test]
    fn test_numeric_year_is_rendered_as_text() {
        let entry: EducationEntry = serde_json::from_value(json!({
            "degree": "BSc",
            "institution": "MIT",
            "year": 2021
        }))
        .unwrap();
        assert_eq!(entry.year, "2021");
    }

    #[test]
    fn test_object_projects_are_flattened() {
        let record: FresherRecord = serde_json::from_value(json!({
            "Projects": [
                {"name": "Chat App", "description": "Realtime chat"},
                "Portfolio",
                null
            ]
        }))
        .unwrap();
        assert_eq!(record.projects, vec!["Chat App - Realtime chat", "Portfolio"]);
    }

    #[test]
    fn test_flattened_title_leads_regardless_of_key_order() {
        let record: ExperiencedRecord = serde_json::from_value(json!({
            "Achievements": [
                {"description": "Alpha desc", "Title": "Zeta"},
                {"year": 2022, "award": "Hackathon winner"}
            ]
        }))
        .unwrap();
        assert_eq!(
            record.achievements,
            vec!["Zeta - Alpha desc", "Hackathon winner - 2022"]
        );
    }

    #[test]
    fn test_null_entries_are_dropped() {
        let record: ExperiencedRecord = serde_json::from_value(json!({
            "Education": [null, {"degree": "BSc", "institution": "MIT", "year": 2019}],
            "Experience": [{"role": "Engineer", "company": "Acme"}, null]
        }))
        .unwrap();
        assert_eq!(record.education.len(), 1);
        assert_eq!(record.education[0].degree, "BSc");
        assert_eq!(record.experience.len(), 1);
        assert_eq!(record.experience[0].company, "Acme");
    }

    #[test]
    fn test_nested_object_in_text_slot_is_rejected() {
        let result: Result<FresherRecord, _> = serde_json::from_value(json!({
            "Name": {"first": "Jane"}
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_optional_keys_serialize_as_null() {
        let value = serde_json::to_value(Contact {
            email: "jane@x.com".to_string(),
            phone: String::new(),
            linkedin: None,
        })
        .unwrap();
        assert!(value.as_object().unwrap().contains_key("linkedin"));
        assert!(value["linkedin"].is_null());
    }

    #[test]
    fn test_analyzed_record_flattens_with_metadata() {
        let record = StructuredRecord::Fresher(FresherRecord {
            name: "Jane Doe".to_string(),
            ..Default::default()
        });
        let analyzed = AnalyzedRecord::from_model(record, "llama3", Duration::from_millis(1500));
        let value = serde_json::to_value(AnalysisResult::Record(analyzed)).unwrap();

        assert_eq!(value["Name"], "Jane Doe");
        assert_eq!(value["Category"], "Fresher");
        assert_eq!(value["Status"], "Analyzed");
        assert_eq!(value["Model"], "llama3");
        assert_eq!(value["Analysis Seconds"], 1.5);
        assert!(value.get("Projects").is_some());
        assert!(value.get("Experience").is_none());
    }

    #[test]
    fn test_profile_is_shared_across_shapes() {
        let record = StructuredRecord::Experienced(ExperiencedRecord {
            skills: vec!["Rust".to_string()],
            ..Default::default()
        });
        assert_eq!(record.category(), ResumeCategory::Experienced);
        assert_eq!(record.profile().skills(), &["Rust".to_string()][..]);
    }
}
