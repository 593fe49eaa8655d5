//! Combined reflection and evaluation of accumulated search results.

use serde_json::{Value, json};

use crate::error::Result;
use crate::fallback;
use crate::intent::{enum_values, string_array};
use crate::model::{DecodeError, LanguageModel, StructuredOutput};
use crate::prompts;
use crate::types::{Assessment, NextAction, SearchResult, UserIntent};

impl StructuredOutput for Assessment {
    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "reflection": {
                    "type": "object",
                    "properties": {
                        "is_sufficient": {
                            "type": "boolean",
                            "description": "Whether the research is sufficient"
                        },
                        "knowledge_gap": {
                            "type": "string",
                            "description": "Description of missing information"
                        },
                        "follow_up_queries": string_array("Suggested follow-up search queries"),
                        "confidence_score": {
                            "type": "number",
                            "minimum": 0,
                            "maximum": 1,
                            "description": "Confidence in the research completeness"
                        }
                    },
                    "required": ["is_sufficient", "knowledge_gap", "follow_up_queries", "confidence_score"]
                },
                "evaluation": {
                    "type": "object",
                    "properties": {
                        "should_continue": {
                            "type": "boolean",
                            "description": "Whether to continue searching"
                        },
                        "next_action": {
                            "type": "string",
                            "enum": enum_values(NextAction::ALL.iter().map(NextAction::as_str)),
                            "description": "Next recommended action"
                        },
                        "priority_areas": string_array("Areas to focus on next"),
                        "reasoning": {
                            "type": "string",
                            "description": "Reasoning for the evaluation"
                        }
                    },
                    "required": ["should_continue", "next_action", "priority_areas", "reasoning"]
                }
            },
            "required": ["reflection", "evaluation"]
        })
    }

    fn validate(&self) -> std::result::Result<(), DecodeError> {
        let score = self.reflection.confidence_score;
        if !(0.0..=1.0).contains(&score) {
            return Err(DecodeError::OutOfRange {
                field: "confidence_score",
                value: score.to_string(),
            });
        }
        Ok(())
    }
}

/// Decides whether the research gathered so far is enough.
#[derive(Debug, Clone)]
pub struct ReflectionEvaluator {
    model: LanguageModel,
    temperature: f32,
}

impl ReflectionEvaluator {
    /// Create an evaluator.
    pub fn new(model: LanguageModel, temperature: f32) -> Self {
        Self { model, temperature }
    }

    /// Assess `results` for `query` in one structured call.
    ///
    /// On failure the fallback assessment finalizes the session.
    pub async fn reflect_and_evaluate(
        &self,
        query: &str,
        intent: &UserIntent,
        results: &[SearchResult],
        iteration: u32,
        max_iterations: u32,
    ) -> Assessment {
        let prompt = prompts::reflection_prompt(query, intent, results, iteration, max_iterations);
        let assessment = fallback::or_fallback(
            self.try_assess(prompt).await,
            "reflection_evaluation",
            fallback::assessment,
        );
        tracing::info!(
            iteration,
            sufficient = assessment.reflection.is_sufficient,
            confidence = assessment.reflection.confidence_score,
            next_action = %assessment.evaluation.next_action,
            "Reflection complete"
        );
        assessment
    }

    async fn try_assess(&self, prompt: String) -> Result<Assessment> {
        self.model.invoke_structured(prompt, self.temperature).await
    }
}
