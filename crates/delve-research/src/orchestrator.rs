//! Bounded iterative research loop.
//!
//! The [`ResearchOrchestrator`] drives one session through
//! intent analysis → initial batch search → reflection rounds → final
//! recommendations, recording every step and rendering the log as Markdown.
//!
//! Every step is awaited in order. Model failures degrade to fallbacks or
//! recorded error steps, so a session always produces a report.

use delve_llm::SharedBackend;

use crate::config::{ResearchConfig, SUGGESTION_TEMPERATURE};
use crate::error::{ResearchError, Result};
use crate::fallback;
use crate::intent::IntentAnalyzer;
use crate::model::LanguageModel;
use crate::prompts;
use crate::recorder::StepRecorder;
use crate::reflection::ReflectionEvaluator;
use crate::report;
use crate::search::WebSearcher;
use crate::types::{Assessment, IntentAnalysis, NextAction, SearchResult, StepRecord, UserIntent};

/// Returned instead of a report when the query is blank.
pub const EMPTY_QUERY_MESSAGE: &str = "Please provide a research query";

/// Queries taken from intent analysis for the first batch.
const INITIAL_QUERY_LIMIT: usize = 2;

/// Follow-up queries taken from one reflection round.
const FOLLOW_UP_QUERY_LIMIT: usize = 3;

// ─────────────────────────────────────────────────────────────────────────────
// Step Identifiers
// ─────────────────────────────────────────────────────────────────────────────

/// Step IDs and titles as they appear in the report.
pub mod steps {
    pub const INTENT_ID: &str = "intent_and_optimization";
    pub const INTENT_TITLE: &str = "🎯 Intent Analysis & Query Optimization";
    pub const INITIAL_SEARCH_ID: &str = "batch_initial_search";
    pub const INITIAL_SEARCH_TITLE: &str = "🔍 Batch Initial Research";
    pub const COMPLETION_ID: &str = "completion";
    pub const COMPLETION_TITLE: &str = "🏁 Research Completion";
    pub const MAX_ITERATIONS_ID: &str = "max_iterations";
    pub const MAX_ITERATIONS_TITLE: &str = "⏰ Maximum Iterations Reached";
    pub const SUGGESTIONS_ID: &str = "final_suggestions";
    pub const SUGGESTIONS_TITLE: &str = "💡 Final Recommendations";

    pub fn reflection_id(iteration: u32) -> String {
        format!("reflection_evaluation_{}", iteration)
    }

    pub fn reflection_title(iteration: u32) -> String {
        format!("🤔 Reflection & Evaluation - Iteration {}", iteration)
    }

    pub fn follow_up_id(iteration: u32) -> String {
        format!("batch_followup_{}", iteration)
    }

    pub fn follow_up_title(iteration: u32) -> String {
        format!("🔄 Batch Follow-up Research - Iteration {}", iteration)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Outcome
// ─────────────────────────────────────────────────────────────────────────────

/// Everything a finished session produced.
#[derive(Debug, Clone)]
pub struct ResearchOutcome {
    /// Rendered Markdown report, or the blank-query message.
    pub report: String,
    /// Step log in execution order.
    pub steps: Vec<StepRecord>,
    /// Every search result gathered, in order.
    pub search_results: Vec<SearchResult>,
    /// Reflection rounds executed.
    pub iterations: u32,
    /// Classified intent; `None` only for a blank query.
    pub user_intent: Option<UserIntent>,
}

impl ResearchOutcome {
    fn empty_query() -> Self {
        Self {
            report: EMPTY_QUERY_MESSAGE.to_string(),
            steps: Vec::new(),
            search_results: Vec::new(),
            iterations: 0,
            user_intent: None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Orchestrator
// ─────────────────────────────────────────────────────────────────────────────

/// Runs research sessions against one backend and configuration.
///
/// Session state lives in [`run`](Self::run), so a single orchestrator can
/// serve concurrent sessions without sharing anything mutable.
///
/// # Example
///
/// ```rust,ignore
/// let orchestrator = ResearchOrchestrator::new(ResearchConfig::default(), backend)?;
/// let report = orchestrator.perform_comprehensive_research("solana staking yields").await;
/// println!("{}", report);
/// ```
#[derive(Debug, Clone)]
pub struct ResearchOrchestrator {
    config: ResearchConfig,
    analyzer: IntentAnalyzer,
    searcher: WebSearcher,
    evaluator: ReflectionEvaluator,
    model: LanguageModel,
}

impl ResearchOrchestrator {
    /// Build an orchestrator, rejecting out-of-range settings.
    pub fn new(config: ResearchConfig, backend: SharedBackend) -> Result<Self> {
        config.validate()?;
        let model = LanguageModel::new(backend, &config);
        Ok(Self {
            analyzer: IntentAnalyzer::new(model.clone()),
            searcher: WebSearcher::new(
                model.clone(),
                config.search_temperature,
                config.max_iterations,
            ),
            evaluator: ReflectionEvaluator::new(model.clone(), config.analysis_temperature),
            model,
            config,
        })
    }

    /// Run a session and return the Markdown report.
    pub async fn perform_comprehensive_research(&self, query: &str) -> String {
        self.run(query).await.report
    }

    /// Run a session and return the report with its intermediate state.
    pub async fn run(&self, query: &str) -> ResearchOutcome {
        if query.trim().is_empty() {
            tracing::info!("Rejected blank research query");
            return ResearchOutcome::empty_query();
        }

        let max_iterations = self.config.max_iterations;
        tracing::info!(
            model = %self.model.model(),
            backend = %self.model.backend_name(),
            max_iterations,
            "Starting research session"
        );

        let mut recorder = StepRecorder::new();
        let mut search_results: Vec<SearchResult> = Vec::new();

        // Intent analysis and initial query proposals.
        let mut analysis: Option<IntentAnalysis> = None;
        recorder
            .execute(steps::INTENT_ID, steps::INTENT_TITLE, async {
                let result = self.analyzer.analyze(query).await;
                let content = format!(
                    "{}\n\n**Optimized Queries:**\n{}",
                    report::format_user_intent(&result.intent),
                    result.optimized_queries.join("\n")
                );
                analysis = Some(result);
                Ok::<_, ResearchError>(content)
            })
            .await;
        let analysis = analysis.unwrap_or_else(|| fallback::intent_analysis(query));
        let intent = analysis.intent;

        // Initial batch search.
        let initial: Vec<String> = analysis
            .optimized_queries
            .into_iter()
            .take(INITIAL_QUERY_LIMIT)
            .collect();
        let mut batch: Option<Vec<SearchResult>> = None;
        recorder
            .execute(steps::INITIAL_SEARCH_ID, steps::INITIAL_SEARCH_TITLE, async {
                let results = self.searcher.search_batch(&initial, 0).await?;
                let content = report::format_batch(&results);
                batch = Some(results);
                Ok::<_, ResearchError>(content)
            })
            .await;
        search_results.extend(batch.take().unwrap_or_default());

        // Reflection rounds.
        let mut iteration = 0;
        while iteration < max_iterations {
            iteration += 1;

            let Assessment {
                reflection,
                evaluation,
            } = self
                .evaluator
                .reflect_and_evaluate(query, &intent, &search_results, iteration, max_iterations)
                .await;

            if evaluation.is_terminal() {
                recorder.record(
                    steps::COMPLETION_ID,
                    steps::COMPLETION_TITLE,
                    format!(
                        "Research completed after {} iterations.\n\n**Reason:** {}",
                        iteration, evaluation.reasoning
                    ),
                );
                break;
            }

            recorder.record(
                steps::reflection_id(iteration),
                steps::reflection_title(iteration),
                format!(
                    "{}\n\n{}",
                    report::format_reflection(&reflection),
                    report::format_evaluation(&evaluation)
                ),
            );

            if evaluation.next_action == NextAction::Search {
                let follow_ups: Vec<String> = reflection
                    .follow_up_queries
                    .into_iter()
                    .take(FOLLOW_UP_QUERY_LIMIT)
                    .collect();
                recorder
                    .execute(
                        steps::follow_up_id(iteration),
                        steps::follow_up_title(iteration),
                        async {
                            let queries =
                                self.analyzer.optimize_queries(&follow_ups, &intent).await;
                            let results = self.searcher.search_batch(&queries, iteration).await?;
                            let content = report::format_batch(&results);
                            batch = Some(results);
                            Ok::<_, ResearchError>(content)
                        },
                    )
                    .await;
                search_results.extend(batch.take().unwrap_or_default());
            }

            if iteration >= max_iterations {
                recorder.record(
                    steps::MAX_ITERATIONS_ID,
                    steps::MAX_ITERATIONS_TITLE,
                    format!(
                        "Maximum iterations ({}) reached. Research will now be finalized.",
                        max_iterations
                    ),
                );
                break;
            }
        }

        // Final recommendations.
        let prompt = prompts::suggestions_prompt(
            query,
            &intent,
            iteration,
            &search_results,
            &recorder.titles(),
        );
        recorder
            .execute(steps::SUGGESTIONS_ID, steps::SUGGESTIONS_TITLE, async {
                let text = fallback::or_fallback(
                    self.model.invoke(prompt, SUGGESTION_TEMPERATURE).await,
                    "final_suggestions",
                    || fallback::SUGGESTIONS_UNAVAILABLE.to_string(),
                );
                if text.trim().is_empty() {
                    return Ok(fallback::NO_SUGGESTIONS.to_string());
                }
                Ok::<_, ResearchError>(text)
            })
            .await;

        tracing::info!(
            iterations = iteration,
            searches = search_results.len(),
            steps = recorder.len(),
            "Research session finished"
        );

        let steps = recorder.into_records();
        ResearchOutcome {
            report: report::render(query, &steps),
            steps,
            search_results,
            iterations: iteration,
            user_intent: Some(intent),
        }
    }
}
