//! Mock Data Generator: static sample profiles used when every model attempt fails.
//!
//! The samples are built through the same decoder as real model replies, so
//! a sample that drifts from the schema surfaces as a `MockError` rather than
//! a malformed record.

use serde_json::{json, Value};
use thiserror::Error;

use crate::analysis::models::{ResumeCategory, StructuredRecord};

#[derive(Debug, Error)]
#[error("failed to build {category} sample data: {message}")]
pub struct MockError {
    pub category: ResumeCategory,
    pub message: String,
}

/// Source of the last-resort record when the backend cannot deliver one.
///
/// Carried by the `Analyzer` as `Arc<dyn FallbackProvider>`.
pub trait FallbackProvider: Send + Sync {
    fn generate(&self, category: ResumeCategory) -> Result<StructuredRecord, MockError>;
}

/// Default fallback: the static samples below.
pub struct MockDataGenerator;

impl FallbackProvider for MockDataGenerator {
    fn generate(&self, category: ResumeCategory) -> Result<StructuredRecord, MockError> {
        generate_mock(category)
    }
}

/// Returns the deterministic sample record for `category`.
pub fn generate_mock(category: ResumeCategory) -> Result<StructuredRecord, MockError> {
    StructuredRecord::from_value(category, sample_json(category)).map_err(|e| MockError {
        category,
        message: e.to_string(),
    })
}

fn sample_json(category: ResumeCategory) -> Value {
    match category {
        ResumeCategory::Fresher => json!({
            "Name": "Alex Morgan",
            "Contact": {
                "email": "alex.morgan@example.com",
                "phone": "+1 555 0100",
                "linkedin": "linkedin.com/in/alexmorgan"
            },
            "Education": [
                {
                    "degree": "B.Sc. Computer Science",
                    "institution": "State University",
                    "year": "2024"
                }
            ],
            "Skills": ["Python", "JavaScript", "SQL", "Git"],
            "Projects": [
                "Campus event finder web app (React, Flask)",
                "Sentiment analysis of product reviews (scikit-learn)"
            ]
        }),
        ResumeCategory::Experienced => json!({
            "Name": "Jordan Lee",
            "Contact": {
                "email": "jordan.lee@example.com",
                "phone": "+1 555 0199",
                "linkedin": "linkedin.com/in/jordanlee"
            },
            "Education": [
                {
                    "degree": "M.S. Software Engineering",
                    "institution": "Tech Institute",
                    "year": "2015"
                }
            ],
            "Skills": ["Java", "Kubernetes", "PostgreSQL", "System Design"],
            "Experience": [
                {
                    "role": "Senior Software Engineer",
                    "company": "Northwind Systems",
                    "duration": "2019 - Present",
                    "description": "Leads the payments platform team."
                },
                {
                    "role": "Software Engineer",
                    "company": "Contoso Ltd",
                    "duration": "2015 - 2019",
                    "description": null
                }
            ],
            "Achievements": [
                "Reduced checkout latency by 40%",
                "Mentored six junior engineers"
            ]
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    fn keys(record: &StructuredRecord) -> BTreeSet<String> {
        serde_json::to_value(record)
            .unwrap()
            .as_object()
            .unwrap()
            .keys()
            .cloned()
            .collect()
    }

    #[test]
    fn test_fresher_sample_has_exactly_fresher_keys() {
        let record = generate_mock(ResumeCategory::Fresher).unwrap();
        let expected: BTreeSet<String> = ["Name", "Contact", "Education", "Skills", "Projects"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(keys(&record), expected);
        assert_eq!(record.category(), ResumeCategory::Fresher);
    }

    #[test]
    fn test_experienced_sample_has_exactly_experienced_keys() {
        let record = generate_mock(ResumeCategory::Experienced).unwrap();
        let expected: BTreeSet<String> = [
            "Name",
            "Contact",
            "Education",
            "Skills",
            "Experience",
            "Achievements",
        ]
        .into_iter()
        .map(String::from)
        .collect();
        assert_eq!(keys(&record), expected);
        assert_eq!(record.category(), ResumeCategory::Experienced);
    }

    #[test]
    fn test_samples_are_deterministic() {
        for category in [ResumeCategory::Fresher, ResumeCategory::Experienced] {
            assert_eq!(
                generate_mock(category).unwrap(),
                MockDataGenerator.generate(category).unwrap()
            );
        }
    }

    #[test]
    fn test_samples_are_populated() {
        let record = generate_mock(ResumeCategory::Experienced).unwrap();
        let profile = record.profile();
        assert!(!profile.name().is_empty());
        assert!(!profile.skills().is_empty());
        assert!(!profile.education().is_empty());
    }
}
