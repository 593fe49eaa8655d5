//! Batch web search: one search-grounded call per batch of queries.

use chrono::Utc;

use crate::error::Result;
use crate::model::LanguageModel;
use crate::prompts;
use crate::types::SearchResult;

/// Runs search-grounded model calls over batches of queries.
#[derive(Debug, Clone)]
pub struct WebSearcher {
    model: LanguageModel,
    temperature: f32,
    max_iterations: u32,
}

impl WebSearcher {
    /// Create a searcher.
    pub fn new(model: LanguageModel, temperature: f32, max_iterations: u32) -> Self {
        Self {
            model,
            temperature,
            max_iterations,
        }
    }

    /// Search every query in one call.
    ///
    /// The combined response is attached to each query: the provider returns
    /// one document for the whole batch and it is not split per query.
    /// `current_iteration` is the number of completed rounds; the prompt
    /// reports the round this batch feeds. Failures propagate.
    pub async fn search_batch(
        &self,
        queries: &[String],
        current_iteration: u32,
    ) -> Result<Vec<SearchResult>> {
        if queries.is_empty() {
            return Ok(Vec::new());
        }

        let date = Utc::now().format("%Y-%m-%d").to_string();
        let iteration = current_iteration + 1;
        let prompt = prompts::search_batch_prompt(queries, &date, iteration, self.max_iterations);

        tracing::info!(queries = queries.len(), iteration = current_iteration, "Batch search");
        let grounded = self.model.invoke_with_search(prompt, self.temperature).await?;
        tracing::debug!(
            sources = grounded.sources.len(),
            chars = grounded.content.len(),
            "Batch search returned"
        );

        Ok(queries
            .iter()
            .map(|query| SearchResult {
                query: query.clone(),
                content: grounded.content.clone(),
                sources: grounded.sources.clone(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResearchConfig;
    use crate::error::ResearchError;
    use delve_llm::{Citation, CompletionResponse, ContentBlock, MockBackend, StopReason, Usage};
    use std::sync::Arc;

    fn searcher(backend: Arc<MockBackend>) -> WebSearcher {
        let config = ResearchConfig::default().with_max_iterations(3);
        WebSearcher::new(LanguageModel::new(backend, &config), 0.1, 3)
    }

    #[tokio::test]
    async fn test_batch_shares_content() {
        let response = CompletionResponse::new(
            "id",
            "m",
            vec![ContentBlock::text("part one"), ContentBlock::text("part two")],
            StopReason::EndTurn,
            Usage::default(),
        )
        .with_citations(vec![Citation::new("https://a.example")]);
        let backend = Arc::new(MockBackend::new(vec![Ok(response)]));
        let queries = vec!["q1".to_string(), "q2".to_string()];

        let results = searcher(backend.clone()).search_batch(&queries, 0).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].query, "q1");
        assert_eq!(results[1].query, "q2");
        assert_eq!(results[0].content, "part one\npart two");
        assert_eq!(results[0].content, results[1].content);
        assert_eq!(results[1].sources.len(), 1);

        let requests = backend.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].web_search);
        assert_eq!(requests[0].temperature, Some(0.1));
        assert!(requests[0].messages[0].content.contains("Research iteration: 1/3"));
    }

    #[tokio::test]
    async fn test_empty_batch_makes_no_call() {
        let backend = Arc::new(MockBackend::failing());
        let results = searcher(backend.clone()).search_batch(&[], 1).await.unwrap();
        assert!(results.is_empty());
        assert_eq!(backend.request_count(), 0);
    }

    #[tokio::test]
    async fn test_failure_propagates() {
        let backend = Arc::new(MockBackend::failing());
        let err = searcher(backend)
            .search_batch(&["q".to_string()], 0)
            .await
            .unwrap_err();
        assert!(matches!(err, ResearchError::Llm(_)));
    }
}
