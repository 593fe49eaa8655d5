//! Intent classification and search-query optimization.

use serde_json::{Value, json};

use crate::config::{INTENT_TEMPERATURE, OPTIMIZE_TEMPERATURE};
use crate::error::Result;
use crate::fallback;
use crate::model::{DecodeError, LanguageModel, StructuredOutput};
use crate::prompts;
use crate::types::{IntentAnalysis, OptimizedQueries, PrimaryIntent, UserContext, UserIntent};

// ─────────────────────────────────────────────────────────────────────────────
// Schemas
// ─────────────────────────────────────────────────────────────────────────────

pub(crate) fn string_array(description: &str) -> Value {
    json!({
        "type": "array",
        "items": {"type": "string"},
        "description": description
    })
}

pub(crate) fn enum_values<I, S>(values: I) -> Value
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Value::Array(
        values
            .into_iter()
            .map(|v| Value::String(v.as_ref().to_string()))
            .collect(),
    )
}

fn user_intent_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "primary_intent": {
                "type": "string",
                "enum": enum_values(PrimaryIntent::ALL.iter().map(PrimaryIntent::as_str)),
                "description": "The primary intent behind the user's query"
            },
            "user_context": {
                "type": "string",
                "enum": enum_values(UserContext::ALL.iter().map(UserContext::as_str)),
                "description": "The likely user context or expertise level"
            },
            "focus_areas": string_array("Key areas the research should focus on"),
            "suggested_angles": string_array("Research angles worth exploring")
        },
        "required": ["primary_intent", "user_context", "focus_areas", "suggested_angles"]
    })
}

impl StructuredOutput for IntentAnalysis {
    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "intent": user_intent_schema(),
                "optimized_queries": string_array("2-3 optimized search queries")
            },
            "required": ["intent", "optimized_queries"]
        })
    }

    fn validate(&self) -> std::result::Result<(), DecodeError> {
        if self.optimized_queries.iter().all(|q| q.trim().is_empty()) {
            return Err(DecodeError::EmptyField("optimized_queries"));
        }
        Ok(())
    }
}

impl StructuredOutput for OptimizedQueries {
    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "optimized_queries": string_array("Optimized versions of the input queries")
            },
            "required": ["optimized_queries"]
        })
    }

    fn validate(&self) -> std::result::Result<(), DecodeError> {
        if self.optimized_queries.iter().all(|q| q.trim().is_empty()) {
            return Err(DecodeError::EmptyField("optimized_queries"));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Analyzer
// ─────────────────────────────────────────────────────────────────────────────

/// Classifies queries and proposes searches tailored to the intent.
#[derive(Debug, Clone)]
pub struct IntentAnalyzer {
    model: LanguageModel,
}

impl IntentAnalyzer {
    /// Create an analyzer over the given model.
    pub fn new(model: LanguageModel) -> Self {
        Self { model }
    }

    /// Classify `query`. Never fails: any model or decode error yields the
    /// generic intent with the query itself as the only search.
    pub async fn analyze(&self, query: &str) -> IntentAnalysis {
        fallback::or_fallback(self.try_analyze(query).await, "intent_analysis", || {
            fallback::intent_analysis(query)
        })
    }

    async fn try_analyze(&self, query: &str) -> Result<IntentAnalysis> {
        let mut analysis: IntentAnalysis = self
            .model
            .invoke_structured(prompts::intent_prompt(query), INTENT_TEMPERATURE)
            .await?;
        analysis.optimized_queries.retain(|q| !q.trim().is_empty());
        tracing::debug!(
            intent = %analysis.intent.primary_intent,
            context = %analysis.intent.user_context,
            queries = analysis.optimized_queries.len(),
            "Intent analyzed"
        );
        Ok(analysis)
    }

    /// Rewrite follow-up queries for `intent`.
    ///
    /// Returns the input unchanged when the call fails or yields nothing. An
    /// empty input makes no call.
    pub async fn optimize_queries(&self, queries: &[String], intent: &UserIntent) -> Vec<String> {
        if queries.is_empty() {
            return Vec::new();
        }
        fallback::or_fallback(
            self.try_optimize(queries, intent).await,
            "query_optimization",
            || queries.to_vec(),
        )
    }

    async fn try_optimize(&self, queries: &[String], intent: &UserIntent) -> Result<Vec<String>> {
        let optimized: OptimizedQueries = self
            .model
            .invoke_structured(prompts::optimize_prompt(queries, intent), OPTIMIZE_TEMPERATURE)
            .await?;
        Ok(optimized
            .optimized_queries
            .into_iter()
            .filter(|q| !q.trim().is_empty())
            .collect())
    }
}
