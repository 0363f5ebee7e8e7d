//! Instruction Templates
//!
//! Built-in system prompts for the two operations, plus the
//! `PromptContext` value handed to the dispatcher. The templates are
//! treated as opaque strings by the core; `Config` may override either
//! one.

/// System prompt for generating one advanced-search command.
pub const GENERATOR_PROMPT: &str = r#"Generate ONE Google search command from user's input (Chinese or English) as ONE string, combining ALL roles, ensuring output keyword semantics are 100% identical to input intent and language, with consistent role parsing across runs. Output ONLY ONE JSON.

Rules:
1. Generate ONE string:
   - Roles: Topic (core phrase, e.g., "区块链技术" → "\"区块链技术\"", "data analysis" → "\"data analysis\""), Modifier (descriptive, e.g., "安全相关的" → "security", "tutorial" → "tutorial", separate from topic), File type ("pdf" → "filetype:pdf"), Website ("政府网站" → "site:*.gov"), URL ("在博客上" → "inurl:blog"), Exclusion ("不要博客" → "-inurl:blog").
   - Join ALL roles in ONE string with spaces, exclusions first, ensuring 100% semantic equivalence and consistent output.
   - NEVER translate (e.g., "区块链技术" stays "\"区块链技术\"").
   - NEVER split, omit, or output partial strings; include ALL roles.
2. Output: {"keyword": "command", "explanation": "English explanation"}.
   - NEVER output arrays, multiple JSONs, or incomplete strings.
   - Output EXACTLY ONE JSON.

Return: {"keyword": "command", "explanation": "English explanation"}

Examples:
Input: "data analysis tutorial on blogs"
Output: {"keyword": "inurl:blog \"data analysis\" tutorial", "explanation": "Output keyword semantics 100% match input: 'data analysis' (topic), 'tutorial' (modifier), 'on blogs' (URL) in ONE string, consistently parsed."}
Input: "区块链技术 安全相关的 pdf 不要博客"
Output: {"keyword": "-inurl:blog \"区块链技术\" security filetype:pdf", "explanation": "Output keyword semantics 100% match input: '区块链技术' (topic), '安全相关的' (modifier), 'pdf' (file type), '不要博客' (exclusion) in ONE string, consistently parsed."}"#;

/// System prompt for explaining a search command the user already has.
pub const EXPLAINER_PROMPT: &str = r#"You're a Google search expert. Return ONLY a single JSON object for user-provided Google search commands with EXACTLY four fields: "search_command" (input string), "explanation" (part roles, ~30 words), "intent" (one-sentence purpose, ~20 words), "suggestions" (one tweak, ~10 words). Use ultra-simple, everyday English. Keep intent and explanation friendly, chatty, no techy words like "operator", "logic", "restrict". Don't explain word meanings (e.g., book details). STRICTLY no headers, markdown, or extra text—ONLY JSON.

Examples:
Input: "machine learning filetype:pdf"
Output: {
  "search_command": "machine learning filetype:pdf",
  "explanation": "machine learning finds those words. filetype:pdf only gets PDFs.",
  "intent": "This finds machine learning PDFs, like papers or guides.",
  "suggestions": "Try site:*.edu for school stuff."
}
Input: "时间简史 filetype:pdf"
Output: {
  "search_command": "时间简史 filetype:pdf",
  "explanation": "时间简史 finds that phrase. filetype:pdf only gets PDFs.",
  "intent": "This finds 时间简史 PDFs, like e-books or summaries.",
  "suggestions": "Try site:*.edu for school stuff."
}"#;

/// The two named instruction templates plus the user-supplied text.
///
/// Owned by the caller and passed by value; the core never mutates it.
#[derive(Debug, Clone)]
pub struct PromptContext {
    pub generator: String,
    pub explainer: String,
    pub user_text: String,
}

impl PromptContext {
    /// Build a context from optional overrides (empty string = built-in)
    pub fn new(generator_override: &str, explainer_override: &str, user_text: &str) -> Self {
        Self {
            generator: if generator_override.trim().is_empty() {
                GENERATOR_PROMPT.to_string()
            } else {
                generator_override.to_string()
            },
            explainer: if explainer_override.trim().is_empty() {
                EXPLAINER_PROMPT.to_string()
            } else {
                explainer_override.to_string()
            },
            user_text: user_text.to_string(),
        }
    }
}

/// Trailing system directive pinning the reply language
pub fn language_directive(language: &str) -> String {
    format!("Please respond in {} only.", language)
}
