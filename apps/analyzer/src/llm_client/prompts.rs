// Shared prompt fragments.
// Each module that calls the backend defines its own prompts.rs alongside it.

/// Fragment that enforces JSON-only output. Local models get a single
/// user message, so this is embedded in the prompt rather than sent as a system turn.
pub const JSON_ONLY_INSTRUCTION: &str = "\
You MUST respond with valid JSON only. \
Do NOT include any text outside the JSON object. \
Do NOT use markdown code fences. \
Do NOT include explanations or apologies.";

/// Fragment telling the model how to represent absent data.
pub const MISSING_DATA_INSTRUCTION: &str = "\
Every key in the schema must be present. \
For missing information use null or an empty string; never omit a key.";
