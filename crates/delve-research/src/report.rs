//! Markdown rendering of a research session.
//!
//! Everything here is pure: identical inputs produce byte-identical output.

use std::collections::HashSet;
use std::fmt::Write;

use crate::types::{ReflectionResult, SearchEvaluation, SearchResult, StepRecord, UserIntent};

/// Report title line.
pub const REPORT_HEADER: &str = "# 🔬 Advanced Research Analysis";

/// Summary trailer heading.
pub const SUMMARY_HEADER: &str = "## 📋 Research Summary";

const NONE: &str = "None";

/// Render the full report for `query` from its step log.
pub fn render(query: &str, records: &[StepRecord]) -> String {
    let started = records.first().map(|r| r.timestamp.as_str()).unwrap_or(NONE);
    let mut out = format!(
        "{REPORT_HEADER}\n**Query:** {query}\n**Started:** {started}\n**Total Steps:** {}\n\n",
        records.len()
    );

    let sections: Vec<String> = records
        .iter()
        .enumerate()
        .map(|(i, record)| render_step(i + 1, record))
        .collect();
    out.push_str(&sections.join("\n"));

    let last = records.last().map(|r| r.title.as_str()).unwrap_or(NONE);
    let _ = write!(
        out,
        "\n{SUMMARY_HEADER}\n**Total Steps Executed:** {}\n**Final Status:** {last}\n\n",
        records.len()
    );
    out
}

/// One numbered step section.
pub fn render_step(number: usize, record: &StepRecord) -> String {
    format!(
        "## Step {number}: {}\n**Timestamp:** {}\n**Step ID:** {}\n\n{}\n\n---\n",
        record.title, record.timestamp, record.step_id, record.content
    )
}

/// Intent summary shown in the first step.
pub fn format_user_intent(intent: &UserIntent) -> String {
    format!(
        "**Primary Intent:** {}\n**User Context:** {}\n**Focus Areas:** {}\n**Suggested Research Angles:** {}\n",
        label(intent.primary_intent.as_str()),
        label(intent.user_context.as_str()),
        intent.focus_areas.join(", "),
        intent.suggested_angles.join(", ")
    )
}

/// Reflection summary: sufficiency, confidence and gaps.
pub fn format_reflection(reflection: &ReflectionResult) -> String {
    let sufficiency = if reflection.is_sufficient {
        "✅ Sufficient"
    } else {
        "❌ Needs more research"
    };
    format!(
        "**Research Sufficiency:** {sufficiency}\n**Confidence Score:** {}%\n**Knowledge Gap:** {}\n**Follow-up Queries:** {}\n\n",
        (reflection.confidence_score * 100.0).round() as i64,
        reflection.knowledge_gap,
        list_or_none(&reflection.follow_up_queries)
    )
}

/// Evaluation summary: continuation decision and reasoning.
pub fn format_evaluation(evaluation: &SearchEvaluation) -> String {
    let should_continue = if evaluation.should_continue {
        "✅ Yes"
    } else {
        "❌ No"
    };
    format!(
        "**Should Continue:** {should_continue}\n**Next Action:** {}\n**Priority Areas:** {}\n**Reasoning:** {}\n\n",
        evaluation.next_action.as_str().to_uppercase(),
        list_or_none(&evaluation.priority_areas),
        evaluation.reasoning
    )
}

/// Content of a batch-search step.
pub fn format_batch(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return "_No queries were searched._".to_string();
    }

    let mut out = results
        .iter()
        .map(|r| format!("**Query:** {}\n\n{}", r.query, r.content))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n");

    let mut seen = HashSet::new();
    let sources: Vec<String> = results
        .iter()
        .flat_map(|r| r.sources.iter())
        .filter(|c| seen.insert(c.uri.as_str()))
        .map(|c| format!("- {}", c.to_markdown()))
        .collect();
    if !sources.is_empty() {
        out.push_str("\n\n**Sources:**\n");
        out.push_str(&sources.join("\n"));
    }
    out
}

/// `investment_analysis` → `INVESTMENT ANALYSIS`
fn label(wire: &str) -> String {
    wire.replace('_', " ").to_uppercase()
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        NONE.to_string()
    } else {
        items.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NextAction, PrimaryIntent, UserContext};
    use delve_llm::Citation;

    fn record(n: usize) -> StepRecord {
        StepRecord {
            step_id: format!("step_{}", n),
            title: format!("Title {}", n),
            content: format!("content {}", n),
            timestamp: format!("2025-01-01T00:00:0{}.000Z", n),
        }
    }

    #[test]
    fn test_render_layout() {
        let report = render("rust", &[record(1), record(2)]);

        assert!(report.starts_with(
            "# 🔬 Advanced Research Analysis\n**Query:** rust\n**Started:** 2025-01-01T00:00:01.000Z\n**Total Steps:** 2\n\n## Step 1: Title 1\n"
        ));
        assert!(report.contains(
            "## Step 2: Title 2\n**Timestamp:** 2025-01-01T00:00:02.000Z\n**Step ID:** step_2\n\ncontent 2\n\n---\n"
        ));
        assert!(report.ends_with(
            "\n## 📋 Research Summary\n**Total Steps Executed:** 2\n**Final Status:** Title 2\n\n"
        ));
    }

    #[test]
    fn test_render_is_deterministic() {
        let records = vec![record(1), record(2), record(3)];
        assert_eq!(render("q", &records), render("q", &records));
    }

    #[test]
    fn test_render_keeps_earlier_sections() {
        let records: Vec<_> = (1..=4).map(record).collect();
        let shorter = render("q", &records[..3]);
        let longer = render("q", &records);

        for (i, r) in records[..3].iter().enumerate() {
            let section = render_step(i + 1, r);
            assert!(shorter.contains(&section));
            assert!(longer.contains(&section));
        }
        assert!(longer.contains(&render_step(4, &records[3])));
    }

    #[test]
    fn test_render_empty() {
        let report = render("q", &[]);
        assert!(report.contains("**Total Steps:** 0"));
        assert!(report.contains("**Final Status:** None"));
    }

    #[test]
    fn test_format_user_intent() {
        let intent = UserIntent {
            primary_intent: PrimaryIntent::InvestmentAnalysis,
            user_context: UserContext::GeneralPublic,
            focus_areas: vec!["fees".into(), "risk".into()],
            suggested_angles: vec!["history".into()],
        };
        assert_eq!(
            format_user_intent(&intent),
            "**Primary Intent:** INVESTMENT ANALYSIS\n**User Context:** GENERAL PUBLIC\n**Focus Areas:** fees, risk\n**Suggested Research Angles:** history\n"
        );
    }

    #[test]
    fn test_format_reflection() {
        let reflection = ReflectionResult {
            is_sufficient: false,
            knowledge_gap: "recent data".into(),
            follow_up_queries: vec![],
            confidence_score: 0.456,
        };
        assert_eq!(
            format_reflection(&reflection),
            "**Research Sufficiency:** ❌ Needs more research\n**Confidence Score:** 46%\n**Knowledge Gap:** recent data\n**Follow-up Queries:** None\n\n"
        );
    }

    #[test]
    fn test_format_evaluation() {
        let evaluation = SearchEvaluation {
            should_continue: true,
            next_action: NextAction::Search,
            priority_areas: vec!["a".into(), "b".into()],
            reasoning: "gaps remain".into(),
        };
        assert_eq!(
            format_evaluation(&evaluation),
            "**Should Continue:** ✅ Yes\n**Next Action:** SEARCH\n**Priority Areas:** a, b\n**Reasoning:** gaps remain\n\n"
        );
    }

    #[test]
    fn test_format_batch_dedups_sources() {
        let source = Citation::new("https://a.example").with_title("A");
        let results = vec![
            SearchResult {
                query: "q1".into(),
                content: "shared".into(),
                sources: vec![source.clone()],
            },
            SearchResult {
                query: "q2".into(),
                content: "shared".into(),
                sources: vec![source],
            },
        ];
        assert_eq!(
            format_batch(&results),
            "**Query:** q1\n\nshared\n\n---\n\n**Query:** q2\n\nshared\n\n**Sources:**\n- [A](https://a.example)"
        );
    }

    #[test]
    fn test_format_batch_empty() {
        assert_eq!(format_batch(&[]), "_No queries were searched._");
    }
}
