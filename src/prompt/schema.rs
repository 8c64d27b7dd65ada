//! Output schemas a judge model can be asked to emit, with the fixed prompt
//! text that frames each one.
//!
//! The preamble/closing strings are sent verbatim to the judge model; changing
//! their wording changes how the model rates, so treat them as a wire format.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputSchema {
    #[serde(rename = "SCORE_1_5")]
    Score1To5,
    #[default]
    #[serde(rename = "SCORE_0_1")]
    Score0To1,
    #[serde(rename = "RELEVANT_IRRELEVANT")]
    RelevantIrrelevant,
}

/// Rating-type vocabulary understood by the judgment service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LlmRatingType {
    #[serde(rename = "SCORE0_1")]
    Score0To1,
    #[serde(rename = "RELEVANT_IRRELEVANT")]
    RelevantIrrelevant,
}

pub const SYSTEM_PROMPT_END: &str = "Evaluate based on: exact matches, semantic relevance, and overall context between the SearchText and content in Hits.
When a reference is provided, evaluate based on the relevance to both SearchText and its reference.

IMPORTANT: Provide your response ONLY as a JSON array of objects, each with \"id\" and \"rating_score\" fields. You MUST include a rating for EVERY hit provided, even if the rating is low. Do not include any explanation or additional text.";

const SCORE_1_5_START: &str = "You are an expert search relevance rater. Your task is to evaluate the relevance between search query and results with these criteria:
- Score 5: Perfect match, the result fully satisfies the query
- Score 4: Highly relevant with minor variations
- Score 3: Moderately relevant, partially satisfies the query
- Score 2: Marginally relevant, only loosely related
- Score 1: Irrelevant, does not address the query at all
Use whole integers from 1 to 5 only.

";

const SCORE_0_1_START: &str = "You are an expert search relevance rater. Your task is to evaluate the relevance between search query and results with these criteria:
- Score 1.0: Perfect match, highly relevant
- Score 0.7-0.9: Very relevant with minor variations
- Score 0.4-0.6: Moderately relevant
- Score 0.1-0.3: Marginally relevant
- Score 0.0: Not relevant at all

";

const RELEVANT_IRRELEVANT_START: &str = "You are an expert search relevance rater. Your task is to evaluate the relevance between search query and results with these criteria:
- RELEVANT: The result addresses the query and would be useful to the searcher
- IRRELEVANT: The result does not address the query or is off-topic
Use exactly one of the two labels RELEVANT or IRRELEVANT as the rating_score.

";

impl OutputSchema {
    pub const ALL: [OutputSchema; 3] = [
        OutputSchema::Score1To5,
        OutputSchema::Score0To1,
        OutputSchema::RelevantIrrelevant,
    ];

    /// Wire name, e.g. `SCORE_1_5`.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputSchema::Score1To5 => "SCORE_1_5",
            OutputSchema::Score0To1 => "SCORE_0_1",
            OutputSchema::RelevantIrrelevant => "RELEVANT_IRRELEVANT",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OutputSchema::Score1To5 => "Score (1-5)",
            OutputSchema::Score0To1 => "Score (0-1)",
            OutputSchema::RelevantIrrelevant => "Relevant / Irrelevant",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            OutputSchema::Score1To5 => "Integer rating from 1 (irrelevant) to 5 (perfect match)",
            OutputSchema::Score0To1 => "Decimal rating from 0.0 (not relevant) to 1.0 (perfect match)",
            OutputSchema::RelevantIrrelevant => "Binary judgment: RELEVANT or IRRELEVANT",
        }
    }

    pub fn system_prompt_start(&self) -> &'static str {
        match self {
            OutputSchema::Score1To5 => SCORE_1_5_START,
            OutputSchema::Score0To1 => SCORE_0_1_START,
            OutputSchema::RelevantIrrelevant => RELEVANT_IRRELEVANT_START,
        }
    }

    /// Closing instruction block; identical for every schema.
    pub fn system_prompt_end(&self) -> &'static str {
        SYSTEM_PROMPT_END
    }

    /// Rating type sent to the validate-prompt endpoint.
    ///
    /// Only `SCORE_0_1` has its own identifier; every other schema goes out as
    /// `RELEVANT_IRRELEVANT`, including `SCORE_1_5`.
    // TODO: confirm with the judgment service owners whether SCORE_1_5 needs its own rating type.
    pub fn judgment_rating_type(&self) -> LlmRatingType {
        match self {
            OutputSchema::Score0To1 => LlmRatingType::Score0To1,
            OutputSchema::Score1To5 | OutputSchema::RelevantIrrelevant => LlmRatingType::RelevantIrrelevant,
        }
    }
}

impl fmt::Display for OutputSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputSchema {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        OutputSchema::ALL
            .into_iter()
            .find(|schema| schema.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| AppError::InvalidSchema(s.to_string()))
    }
}

impl LlmRatingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmRatingType::Score0To1 => "SCORE0_1",
            LlmRatingType::RelevantIrrelevant => "RELEVANT_IRRELEVANT",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wire_names_case_insensitively() {
        assert_eq!("score_1_5".parse::<OutputSchema>().unwrap(), OutputSchema::Score1To5);
        assert_eq!(" SCORE_0_1 ".parse::<OutputSchema>().unwrap(), OutputSchema::Score0To1);
        assert!(matches!("SCORE_9".parse::<OutputSchema>(), Err(AppError::InvalidSchema(_))));
    }

    #[test]
    fn serde_uses_wire_names() {
        let v = serde_json::to_value(OutputSchema::RelevantIrrelevant).unwrap();
        assert_eq!(v, serde_json::json!("RELEVANT_IRRELEVANT"));
        let back: OutputSchema = serde_json::from_value(serde_json::json!("SCORE_1_5")).unwrap();
        assert_eq!(back, OutputSchema::Score1To5);
    }

    #[test]
    fn rating_type_mapping_collapses_score_1_5() {
        assert_eq!(OutputSchema::Score0To1.judgment_rating_type().as_str(), "SCORE0_1");
        assert_eq!(OutputSchema::Score1To5.judgment_rating_type().as_str(), "RELEVANT_IRRELEVANT");
        assert_eq!(OutputSchema::RelevantIrrelevant.judgment_rating_type().as_str(), "RELEVANT_IRRELEVANT");
        assert_eq!(
            serde_json::to_value(LlmRatingType::Score0To1).unwrap(),
            serde_json::json!("SCORE0_1")
        );
    }

    #[test]
    fn closing_block_is_shared() {
        for schema in OutputSchema::ALL {
            assert_eq!(schema.system_prompt_end(), SYSTEM_PROMPT_END);
            assert!(schema.system_prompt_start().contains("expert search relevance rater"));
        }
        assert!(SYSTEM_PROMPT_END.contains("rating_score"));
    }
}
