// Résumé analysis prompt template.
// Replace: {category}, {schema_json}, {json_only_instruction},
//          {missing_data_instruction}, {resume_text}

use serde_json::{json, Value};

use crate::analysis::models::ResumeCategory;

pub const ANALYSIS_PROMPT_TEMPLATE: &str = r#"Analyze this {category} resume and return EXACTLY this JSON structure:
{schema_json}

RULES:
1. {json_only_instruction}
2. All fields must match the schema exactly; do not add or rename keys.
3. {missing_data_instruction}
4. Use only facts present in the resume text. Do NOT invent details.

RESUME TEXT:
{resume_text}"#;

/// The schema skeleton shown to the model for `category`.
pub fn schema_for(category: ResumeCategory) -> Value {
    let mut schema = json!({
        "Name": "string",
        "Contact": {
            "email": "string",
            "phone": "string",
            "linkedin": "string or null"
        },
        "Education": [
            {"degree": "string", "institution": "string", "year": "string"}
        ],
        "Skills": ["string"]
    });

    let extra = match category {
        ResumeCategory::Fresher => json!({
            "Projects": ["string"]
        }),
        ResumeCategory::Experienced => json!({
            "Experience": [
                {
                    "role": "string",
                    "company": "string",
                    "duration": "string",
                    "description": "string or null"
                }
            ],
            "Achievements": ["string"]
        }),
    };

    if let (Some(base), Value::Object(extra)) = (schema.as_object_mut(), extra) {
        base.extend(extra);
    }
    schema
}
