//! Prompt text for every model call in a research session.

use crate::types::{SearchResult, UserIntent};

/// Persona shared by search-grounded calls.
pub const SYSTEM_MESSAGE: &str = "You are an advanced AI research analyst conducting comprehensive web research.

CORE CAPABILITIES:
- Perform intelligent web searches with Google Search API
- Conduct reflection analysis on research completeness
- Evaluate search quality and suggest next moves
- Provide multi-iteration research with knowledge gap analysis

RESEARCH WORKFLOW:
1. **Initial Search** - Conduct web search on the topic
2. **Reflection Analysis** - Evaluate research completeness and identify gaps
3. **Search Evaluation** - Determine if more research is needed
4. **Continue Search** - Perform follow-up searches if necessary
5. **Suggest Next Move** - Recommend actions for comprehensive coverage

OUTPUT FOCUS:
- Prioritize recent, authoritative information
- Identify knowledge gaps systematically
- Suggest targeted follow-up research
- Provide confidence assessments";

const SEARCH_INSTRUCTION: &str =
    "Conduct comprehensive web search and provide detailed analysis with current information.";

const INTENT_GUIDE: &str = "Consider various aspects:

INTENT CATEGORIES:
- information_seeking: Looking for general information/facts
- decision_making: Need info to make a specific decision
- action_planning: Planning specific actions/strategies
- problem_solving: Trying to solve a specific problem
- learning: Educational/learning purposes
- investment_analysis: Investment decisions/analysis
- market_research: Market trends/opportunities
- technical_understanding: Deep technical knowledge
- trend_analysis: Understanding trends/patterns
- comparison: Comparing options/alternatives
- risk_assessment: Understanding risks/dangers
- opportunity_identification: Finding opportunities

CONTEXT EXAMPLES:
- Crypto queries → Focus on: price analysis, project fundamentals, market sentiment, regulatory news, technical indicators, DeFi trends, adoption metrics
- Business queries → Focus on: market analysis, competitor research, financial performance, industry trends, strategic insights
- Technology queries → Focus on: technical specifications, implementation guides, best practices, performance metrics, security considerations
- Health queries → Focus on: symptoms, treatments, prevention, expert opinions, latest research, safety information

USER CONTEXT LEVELS:
- beginner: New to the topic, needs basic explanations
- intermediate: Some knowledge, needs practical insights
- advanced: Deep knowledge, needs latest developments
- professional: Work-related, needs comprehensive analysis

Provide structured analysis of the user's likely intent, context, and optimal research focus areas.";

const REFLECTION_GUIDE: &str = "Analyze the research comprehensiveness considering the user's specific intent:

INTENT-SPECIFIC EVALUATION:
- For investment_analysis: Are we covering risk factors, market trends, price drivers, fundamentals?
- For decision_making: Do we have pros/cons, alternatives, recommendations?
- For learning: Is the information educational, well-explained, with examples?
- For problem_solving: Are solutions provided, with actionable steps?
- For market_research: Are trends, statistics, opportunities covered?

Consider:
1. Are all major aspects relevant to the user's intent covered?
2. Is the information current and authoritative for their needs?
3. What specific areas aligned with their intent need more investigation?
4. How confident are you in addressing their primary intent?

Provide reflection analysis with follow-up queries tailored to their intent.";

const EVALUATION_GUIDE: &str = "Current reflection analysis:

Determine the next best action:
- Should we continue searching?
- What should be the priority focus?
- Is the research sufficient to finalize?

Provide structured evaluation with clear reasoning.";

/// Intent classification plus initial query proposals.
pub fn intent_prompt(query: &str) -> String {
    format!(
        "{INTENT_GUIDE}

Additionally, based on the analyzed intent, provide 2-3 optimized search queries that would comprehensively address the user's needs.

Analyze this query: \"{query}\"

Return both the intent analysis and optimized search queries."
    )
}

/// Rewrites follow-up queries for the classified intent.
pub fn optimize_prompt(queries: &[String], intent: &UserIntent) -> String {
    format!(
        "Optimize these search queries based on user intent:

Queries: {}
Intent: {}
Context: {}
Focus Areas: {}

Return optimized versions of each query that are more comprehensive and targeted.",
        numbered(queries),
        intent.primary_intent,
        intent.user_context,
        intent.focus_areas.join(", ")
    )
}

/// One search-grounded call covering a whole batch of queries.
///
/// `iteration` is the 1-based round the batch belongs to.
pub fn search_batch_prompt(
    queries: &[String],
    date: &str,
    iteration: u32,
    max_iterations: u32,
) -> String {
    format!(
        "{SYSTEM_MESSAGE}
{SEARCH_INSTRUCTION}

Current date: {date}
Research iteration: {iteration}/{max_iterations}

Perform comprehensive web search for these queries:
{}

Provide detailed results for each query separately.",
        numbered(queries)
    )
}

/// Combined reflection and evaluation over every result gathered so far.
pub fn reflection_prompt(
    query: &str,
    intent: &UserIntent,
    results: &[SearchResult],
    iteration: u32,
    max_iterations: u32,
) -> String {
    let findings = results
        .iter()
        .enumerate()
        .map(|(i, r)| format!("### Search {}: {}\n{}", i + 1, r.query, r.content))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n");

    format!(
        "You are analyzing research completeness for: {query}

USER INTENT CONTEXT:
- Primary Intent: {}
- Focus Areas: {}

Current research findings:
{findings}

{REFLECTION_GUIDE}

Additionally, {EVALUATION_GUIDE}

Current iteration: {iteration}/{max_iterations}

Provide both reflection analysis and search evaluation.",
        intent.primary_intent,
        intent.focus_areas.join(", ")
    )
}

/// Closing recommendations once the loop has ended.
pub fn suggestions_prompt(
    query: &str,
    intent: &UserIntent,
    iterations: u32,
    results: &[SearchResult],
    step_titles: &[&str],
) -> String {
    let searched = results
        .iter()
        .map(|r| r.query.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Based on the comprehensive research conducted for: {query}

USER INTENT CONTEXT:
- Primary Intent: {}
- User Context: {}
- Focus Areas: {}

Research summary:
- Total iterations: {iterations}
- Total searches: {}
- Research queries: {searched}

Steps completed: {}

Provide final actionable recommendations specifically tailored to the user's intent and context.",
        intent.primary_intent,
        intent.user_context,
        intent.focus_areas.join(", "),
        results.len(),
        step_titles.join(" → ")
    )
}

fn numbered(queries: &[String]) -> String {
    queries
        .iter()
        .enumerate()
        .map(|(i, q)| format!("{}. {}", i + 1, q))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PrimaryIntent, UserContext};

    fn intent() -> UserIntent {
        UserIntent {
            primary_intent: PrimaryIntent::InvestmentAnalysis,
            user_context: UserContext::Investor,
            focus_areas: vec!["fees".into(), "security".into()],
            suggested_angles: vec![],
        }
    }

    #[test]
    fn test_search_batch_prompt() {
        let queries = vec!["solana fees".to_string(), "solana outages".to_string()];
        let prompt = search_batch_prompt(&queries, "2025-01-31", 1, 3);

        assert!(prompt.starts_with(SYSTEM_MESSAGE));
        assert!(prompt.contains("Current date: 2025-01-31"));
        assert!(prompt.contains("Research iteration: 1/3"));
        assert!(prompt.contains("1. solana fees\n2. solana outages"));
    }

    #[test]
    fn test_reflection_prompt_includes_all_results() {
        let results = vec![
            SearchResult {
                query: "q1".into(),
                content: "c1".into(),
                sources: vec![],
            },
            SearchResult {
                query: "q2".into(),
                content: "c2".into(),
                sources: vec![],
            },
        ];
        let prompt = reflection_prompt("topic", &intent(), &results, 2, 4);

        assert!(prompt.contains("### Search 1: q1\nc1\n\n---\n\n### Search 2: q2\nc2"));
        assert!(prompt.contains("- Primary Intent: investment_analysis"));
        assert!(prompt.contains("- Focus Areas: fees, security"));
        assert!(prompt.contains("Current iteration: 2/4"));
    }

    #[test]
    fn test_optimize_prompt() {
        let prompt = optimize_prompt(&["a".to_string(), "b".to_string()], &intent());
        assert!(prompt.contains("Queries: 1. a\n2. b"));
        assert!(prompt.contains("Context: investor"));
    }

    #[test]
    fn test_suggestions_prompt() {
        let prompt = suggestions_prompt("topic", &intent(), 2, &[], &["one", "two"]);
        assert!(prompt.contains("- Total iterations: 2"));
        assert!(prompt.contains("- Total searches: 0"));
        assert!(prompt.contains("Steps completed: one → two"));
    }

    #[test]
    fn test_intent_prompt_quotes_query() {
        assert!(intent_prompt("rust async").contains("Analyze this query: \"rust async\""));
    }
}
