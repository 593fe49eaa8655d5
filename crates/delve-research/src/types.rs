//! Data model for a research session.
//!
//! Every value here lives for one session only: a fresh set is created when
//! research starts and dropped once the report is rendered.

use delve_llm::Citation;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─────────────────────────────────────────────────────────────────────────────
// Identifiers
// ─────────────────────────────────────────────────────────────────────────────

/// Unique identifier for a tool invocation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Create a new random session ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// User Intent
// ─────────────────────────────────────────────────────────────────────────────

/// What the user is trying to achieve with their query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryIntent {
    InformationSeeking,
    DecisionMaking,
    ActionPlanning,
    ProblemSolving,
    Learning,
    InvestmentAnalysis,
    MarketResearch,
    TechnicalUnderstanding,
    TrendAnalysis,
    Comparison,
    RiskAssessment,
    OpportunityIdentification,
}

impl PrimaryIntent {
    /// All variants, in schema order.
    pub const ALL: [PrimaryIntent; 12] = [
        Self::InformationSeeking,
        Self::DecisionMaking,
        Self::ActionPlanning,
        Self::ProblemSolving,
        Self::Learning,
        Self::InvestmentAnalysis,
        Self::MarketResearch,
        Self::TechnicalUnderstanding,
        Self::TrendAnalysis,
        Self::Comparison,
        Self::RiskAssessment,
        Self::OpportunityIdentification,
    ];

    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InformationSeeking => "information_seeking",
            Self::DecisionMaking => "decision_making",
            Self::ActionPlanning => "action_planning",
            Self::ProblemSolving => "problem_solving",
            Self::Learning => "learning",
            Self::InvestmentAnalysis => "investment_analysis",
            Self::MarketResearch => "market_research",
            Self::TechnicalUnderstanding => "technical_understanding",
            Self::TrendAnalysis => "trend_analysis",
            Self::Comparison => "comparison",
            Self::RiskAssessment => "risk_assessment",
            Self::OpportunityIdentification => "opportunity_identification",
        }
    }
}

/// Estimated expertise or role of the person asking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserContext {
    Beginner,
    Intermediate,
    Advanced,
    Professional,
    Researcher,
    Investor,
    Trader,
    Developer,
    Analyst,
    GeneralPublic,
}

impl UserContext {
    /// All variants, in schema order.
    pub const ALL: [UserContext; 10] = [
        Self::Beginner,
        Self::Intermediate,
        Self::Advanced,
        Self::Professional,
        Self::Researcher,
        Self::Investor,
        Self::Trader,
        Self::Developer,
        Self::Analyst,
        Self::GeneralPublic,
    ];

    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
            Self::Professional => "professional",
            Self::Researcher => "researcher",
            Self::Investor => "investor",
            Self::Trader => "trader",
            Self::Developer => "developer",
            Self::Analyst => "analyst",
            Self::GeneralPublic => "general_public",
        }
    }
}

impl std::fmt::Display for PrimaryIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Display for UserContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified intent behind a research query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserIntent {
    pub primary_intent: PrimaryIntent,
    pub user_context: UserContext,
    pub focus_areas: Vec<String>,
    pub suggested_angles: Vec<String>,
}

/// Output of intent analysis: the intent plus search queries tailored to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentAnalysis {
    pub intent: UserIntent,
    pub optimized_queries: Vec<String>,
}

/// Output of follow-up query optimization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizedQueries {
    pub optimized_queries: Vec<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Search
// ─────────────────────────────────────────────────────────────────────────────

/// Content returned for one query of a batch search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub query: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<Citation>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Reflection & Evaluation
// ─────────────────────────────────────────────────────────────────────────────

/// Whether the accumulated results answer the query, and what is missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReflectionResult {
    pub is_sufficient: bool,
    pub knowledge_gap: String,
    pub follow_up_queries: Vec<String>,
    /// In `[0, 1]`.
    pub confidence_score: f64,
}

/// Recommended next step of the research loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextAction {
    Search,
    Finalize,
    Clarify,
    Suggest,
}

impl NextAction {
    /// All variants, in schema order.
    pub const ALL: [NextAction; 4] = [Self::Search, Self::Finalize, Self::Clarify, Self::Suggest];

    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Finalize => "finalize",
            Self::Clarify => "clarify",
            Self::Suggest => "suggest",
        }
    }
}

impl std::fmt::Display for NextAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decision on whether to keep researching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchEvaluation {
    pub should_continue: bool,
    pub next_action: NextAction,
    pub priority_areas: Vec<String>,
    pub reasoning: String,
}

impl SearchEvaluation {
    /// True when the loop must stop after this evaluation.
    pub fn is_terminal(&self) -> bool {
        !self.should_continue || self.next_action == NextAction::Finalize
    }
}

/// Reflection and evaluation produced by one combined model call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub reflection: ReflectionResult,
    pub evaluation: SearchEvaluation,
}

// ─────────────────────────────────────────────────────────────────────────────
// Steps
// ─────────────────────────────────────────────────────────────────────────────

/// One executed research step, as shown in the final report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub step_id: String,
    pub title: String,
    pub content: String,
    /// RFC 3339 / ISO-8601 UTC timestamp.
    pub timestamp: String,
}
