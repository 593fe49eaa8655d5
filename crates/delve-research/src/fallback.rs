//! Fallback values substituted when a model call fails.
//!
//! | Call site            | Fallback                                         |
//! |----------------------|--------------------------------------------------|
//! | intent analysis      | [`intent_analysis`]: general intent, raw query   |
//! | query optimization   | the input queries, unchanged                     |
//! | reflection/evaluation| [`assessment`]: sufficient, finalize             |
//! | final suggestions    | [`SUGGESTIONS_UNAVAILABLE`]                      |
//!
//! Batch search has no fallback; its failure is recorded as an error step.

use std::fmt::Display;

use crate::types::{
    Assessment, IntentAnalysis, NextAction, PrimaryIntent, ReflectionResult, SearchEvaluation,
    UserContext, UserIntent,
};

/// Suggestions text when the model call fails.
pub const SUGGESTIONS_UNAVAILABLE: &str = "Unable to generate suggestions due to analysis error.";

/// Suggestions text when the model answers with nothing.
pub const NO_SUGGESTIONS: &str = "No suggestions available";

/// Intent used when classification fails. The only query is the original one.
pub fn intent_analysis(query: &str) -> IntentAnalysis {
    IntentAnalysis {
        intent: default_intent(),
        optimized_queries: vec![query.to_string()],
    }
}

/// Generic intent.
pub fn default_intent() -> UserIntent {
    UserIntent {
        primary_intent: PrimaryIntent::InformationSeeking,
        user_context: UserContext::GeneralPublic,
        focus_areas: vec!["general information".to_string()],
        suggested_angles: vec!["comprehensive overview".to_string()],
    }
}

/// Assessment used when reflection fails. Always terminates the loop.
pub fn assessment() -> Assessment {
    Assessment {
        reflection: ReflectionResult {
            is_sufficient: true,
            knowledge_gap: "Unable to perform reflection analysis".to_string(),
            follow_up_queries: Vec::new(),
            confidence_score: 0.5,
        },
        evaluation: SearchEvaluation {
            should_continue: false,
            next_action: NextAction::Finalize,
            priority_areas: Vec::new(),
            reasoning: "Unable to perform evaluation analysis".to_string(),
        },
    }
}

/// Unwrap `result`, logging and substituting `fallback()` on error.
pub fn or_fallback<T, E: Display>(
    result: Result<T, E>,
    call_site: &'static str,
    fallback: impl FnOnce() -> T,
) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(call_site, error = %e, "Model call failed, using fallback");
            fallback()
        }
    }
}
