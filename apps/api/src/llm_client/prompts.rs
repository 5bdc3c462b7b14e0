// Cross-cutting prompt fragments appended to every flow's system prompt.
// Flow-specific templates live in flows::prompts.

/// Forces a bare JSON answer so the response can be parsed against the flow schema.
pub const JSON_ONLY_SYSTEM: &str = "Answer with a single valid JSON value and nothing else. \
    No prose before or after it, no markdown code fences, no apologies.";

/// Introduces the declared output schema that follows it in the system prompt.
pub const OUTPUT_SCHEMA_PREAMBLE: &str =
    "Your JSON answer MUST conform to this JSON Schema (field names are case-sensitive):";
