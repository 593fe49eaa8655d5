//! Append-only log of executed research steps.

use std::future::Future;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::Result;
use crate::types::StepRecord;

/// Number of characters of step output logged at DEBUG.
const PREVIEW_CHARS: usize = 200;

/// Records each step's outcome with a timestamp.
///
/// A failing step never propagates: its error becomes the recorded content and
/// the return value, so the session can carry on.
#[derive(Debug, Default)]
pub struct StepRecorder {
    records: Vec<StepRecord>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl StepRecorder {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `operation` as a step and record its output or its error.
    pub async fn execute<F>(
        &mut self,
        step_id: impl Into<String>,
        title: impl Into<String>,
        operation: F,
    ) -> String
    where
        F: Future<Output = Result<String>>,
    {
        let step_id = step_id.into();
        let title = title.into();
        let timestamp = self.next_timestamp();

        tracing::info!(step_id = %step_id, title = %title, "Executing step");

        let content = match operation.await {
            Ok(content) => {
                tracing::info!(step_id = %step_id, "Step completed");
                tracing::debug!(step_id = %step_id, preview = %preview(&content), "Step output");
                content
            }
            Err(e) => {
                tracing::warn!(step_id = %step_id, error = %e, "Step failed");
                format!("❌ Error in {}: {}", title, e)
            }
        };

        self.push(step_id, title, content.clone(), timestamp);
        content
    }

    /// Record a step whose content is already known.
    pub fn record(
        &mut self,
        step_id: impl Into<String>,
        title: impl Into<String>,
        content: String,
    ) {
        let step_id = step_id.into();
        let timestamp = self.next_timestamp();
        tracing::info!(step_id = %step_id, "Recorded step");
        self.push(step_id, title.into(), content, timestamp);
    }

    /// Recorded steps, oldest first.
    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    /// Titles of recorded steps, oldest first.
    pub fn titles(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.title.as_str()).collect()
    }

    /// Number of recorded steps.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Consume the recorder, returning its records.
    pub fn into_records(self) -> Vec<StepRecord> {
        self.records
    }

    fn push(&mut self, step_id: String, title: String, content: String, at: DateTime<Utc>) {
        self.records.push(StepRecord {
            step_id,
            title,
            content,
            timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
        });
    }

    /// Current time, never earlier than the previous step's.
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let ts = match self.last_timestamp {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last_timestamp = Some(ts);
        ts
    }
}

fn preview(content: &str) -> String {
    content.chars().take(PREVIEW_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResearchError;
    use delve_llm::LlmError;

    #[tokio::test]
    async fn test_successful_step_is_recorded() {
        let mut recorder = StepRecorder::new();

        let out = recorder
            .execute("s1", "First", async { Ok("done".to_string()) })
            .await;

        assert_eq!(out, "done");
        assert_eq!(recorder.len(), 1);
        let record = &recorder.records()[0];
        assert_eq!(record.step_id, "s1");
        assert_eq!(record.title, "First");
        assert_eq!(record.content, "done");
        assert!(record.timestamp.ends_with('Z'));
    }

    #[tokio::test]
    async fn test_failed_step_is_recorded_not_propagated() {
        let mut recorder = StepRecorder::new();

        let out = recorder
            .execute("s1", "Search", async {
                Err::<String, _>(ResearchError::from(LlmError::Network("provider down".into())))
            })
            .await;

        assert_eq!(out, "❌ Error in Search: LLM error: Network error: provider down");
        assert_eq!(recorder.records()[0].content, out);
    }

    #[tokio::test]
    async fn test_timestamps_never_decrease() {
        let mut recorder = StepRecorder::new();
        for i in 0..20 {
            recorder.record(format!("s{}", i), "t", String::new());
        }
        let stamps: Vec<_> = recorder
            .records()
            .iter()
            .map(|r| DateTime::parse_from_rfc3339(&r.timestamp).unwrap())
            .collect();
        assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_titles_in_order() {
        let mut recorder = StepRecorder::new();
        recorder.record("a", "Alpha", String::new());
        recorder.record("b", "Beta", String::new());
        assert_eq!(recorder.titles(), vec!["Alpha", "Beta"]);
        assert_eq!(recorder.into_records().len(), 2);
    }

    #[test]
    fn test_preview_is_char_safe() {
        let long = "é".repeat(500);
        assert_eq!(preview(&long).chars().count(), PREVIEW_CHARS);
    }
}
