//! Prompt assembly for LLM judgments.
//!
//! - `build_full_prompt` splices user instructions between a schema's fixed
//!   preamble and closing block.
//! - `get_prompt_template` packages the editable state into a `PromptTemplate`
//!   record for persistence.
//! - `PromptConstructor::render` substitutes `{{ key }}` tokens with sample
//!   values, which is what the judge sees once a query is bound.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::prompt::placeholders::{extract_placeholders, is_auto_filled, PLACEHOLDER_RE};
use crate::prompt::schema::OutputSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptTemplate {
    pub output_schema: OutputSchema,
    pub system_prompt_start: String,
    pub system_prompt_end: String,
    pub user_instructions: String,
    pub placeholders: Vec<String>,
}

impl PromptTemplate {
    /// The prompt this template sends to a judge model.
    pub fn full_prompt(&self) -> String {
        build_full_prompt(self.output_schema, &self.user_instructions)
    }
}

pub fn build_full_prompt(schema: OutputSchema, user_instructions: &str) -> String {
    let start = schema.system_prompt_start();
    let end = schema.system_prompt_end();
    let instructions = user_instructions.trim();
    let mut prompt = String::with_capacity(start.len() + instructions.len() + end.len() + 2);
    prompt.push_str(start);
    if !instructions.is_empty() {
        prompt.push_str(instructions);
        prompt.push_str("\n\n");
    }
    prompt.push_str(end);
    prompt
}

/// Placeholders are always re-derived from `user_instructions`.
pub fn get_prompt_template(schema: OutputSchema, user_instructions: &str) -> PromptTemplate {
    PromptTemplate {
        output_schema: schema,
        system_prompt_start: schema.system_prompt_start().to_string(),
        system_prompt_end: schema.system_prompt_end().to_string(),
        user_instructions: user_instructions.to_string(),
        placeholders: extract_placeholders(user_instructions),
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PromptConstructor;

impl PromptConstructor {
    pub fn new() -> Self {
        PromptConstructor
    }

    /// Replace every `{{ key }}` in `template` with `values[key]`.
    ///
    /// Auto-filled placeholders without a value are left as-is for the
    /// judgment run to fill; any other missing value is an error.
    pub fn render(&self, template: &str, values: &BTreeMap<String, String>) -> AppResult<String> {
        let mut out = String::with_capacity(template.len());
        let mut last = 0;
        for caps in PLACEHOLDER_RE.captures_iter(template) {
            let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else { continue };
            let key = inner.as_str().trim();
            let replacement = if key.is_empty() {
                whole.as_str()
            } else if let Some(value) = values.get(key) {
                value.as_str()
            } else if is_auto_filled(key) {
                whole.as_str()
            } else {
                return Err(AppError::PromptConstruction(format!(
                    "Missing input for placeholder: {}",
                    key
                )));
            };
            out.push_str(&template[last..whole.start()]);
            out.push_str(replacement);
            last = whole.end();
        }
        out.push_str(&template[last..]);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_prompt_contains_preamble_instructions_and_closing() {
        let prompt = build_full_prompt(OutputSchema::Score0To1, "Rate {{query}}");
        assert!(prompt.contains("expert search relevance rater"));
        assert!(prompt.contains("Rate {{query}}"));
        assert!(prompt.ends_with(OutputSchema::Score0To1.system_prompt_end()));
    }

    #[test]
    fn blank_instructions_are_omitted() {
        let schema = OutputSchema::Score0To1;
        let expected = format!("{}{}", schema.system_prompt_start(), schema.system_prompt_end());
        assert_eq!(build_full_prompt(schema, ""), expected);
        assert_eq!(build_full_prompt(schema, "  \n\t "), expected);
    }

    #[test]
    fn instructions_are_trimmed_and_followed_by_blank_line() {
        let schema = OutputSchema::Score1To5;
        let prompt = build_full_prompt(schema, "\n  Prefer recent docs.  \n");
        let expected = format!(
            "{}Prefer recent docs.\n\n{}",
            schema.system_prompt_start(),
            schema.system_prompt_end()
        );
        assert_eq!(prompt, expected);
    }

    #[test]
    fn schema_specific_preambles() {
        let binary = build_full_prompt(OutputSchema::RelevantIrrelevant, "x");
        assert!(binary.contains("RELEVANT"));
        assert!(binary.contains("IRRELEVANT"));

        let five = build_full_prompt(OutputSchema::Score1To5, "x");
        assert!(five.contains("Score 5"));
        assert!(five.contains("Score 1"));
        assert!(five.contains("1 to 5"));
    }

    #[test]
    fn template_placeholders_follow_instructions() {
        let t = get_prompt_template(OutputSchema::Score1To5, "{{ b }} then {{a}} then {{b}}");
        assert_eq!(t.placeholders, vec!["b".to_string(), "a".to_string()]);
        assert_eq!(t.system_prompt_start, OutputSchema::Score1To5.system_prompt_start());
        assert_eq!(t.full_prompt(), build_full_prompt(OutputSchema::Score1To5, &t.user_instructions));

        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["outputSchema"], "SCORE_1_5");
        assert!(json.get("systemPromptStart").is_some());
        assert_eq!(json["placeholders"], serde_json::json!(["b", "a"]));
    }

    #[test]
    fn render_fills_exactly_the_extracted_placeholders() {
        let template = "{{ b }} {{a}b}} {{a}} {{  }} {{b}}";
        let names = extract_placeholders(template);
        let values: BTreeMap<String, String> = names.iter().map(|n| (n.clone(), format!("<{}>", n))).collect();
        let out = PromptConstructor::new().render(template, &values).unwrap();
        assert_eq!(out, "<b> {{a}b}} <a> {{  }} <b>");
        assert!(extract_placeholders(&out).is_empty());
    }

    #[test]
    fn render_substitutes_values() {
        let mut values = BTreeMap::new();
        values.insert("queryText".to_string(), "red shoes".to_string());
        let out = PromptConstructor::new()
            .render("Query: {{ queryText }} / {{queryText}}", &values)
            .unwrap();
        assert_eq!(out, "Query: red shoes / red shoes");
    }

    #[test]
    fn render_keeps_auto_filled_and_rejects_missing() {
        let values = BTreeMap::new();
        let out = PromptConstructor::new().render("Hits: {{ hits }}", &values).unwrap();
        assert_eq!(out, "Hits: {{ hits }}");

        let err = PromptConstructor::new().render("{{category}}", &values).unwrap_err();
        assert!(matches!(err, AppError::PromptConstruction(msg) if msg.contains("category")));
    }

    #[test]
    fn render_leaves_non_placeholders_alone() {
        let values = BTreeMap::new();
        let out = PromptConstructor::new().render("json {{}} and {{a}b}} open {{", &values).unwrap();
        assert_eq!(out, "json {{}} and {{a}b}} open {{");
        let out = PromptConstructor::new().render("blank {{   }} stays", &values).unwrap();
        assert_eq!(out, "blank {{   }} stays");
    }
}
