//! Retrieval orchestration: question to grounded answer.

use std::collections::HashSet;

use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::prompt::grounding_prompt;
use super::Pipeline;
use crate::chunking::ParentChunk;
use crate::services::Passage;
use crate::types::{Answer, PipelineError};

impl Pipeline {
    /// Answers a question from the ingested corpus.
    ///
    /// Never returns an error: every collaborator failure is folded into
    /// [`Answer::Failed`] so one bad question cannot take down the
    /// answering service.
    #[instrument(skip_all)]
    pub async fn answer(&self, question: &str) -> Answer {
        let _read = self.gate.read().await;
        match self.answer_inner(question).await {
            Ok(answer) => answer,
            Err(err) => {
                error!(error = %err, "question failed");
                Answer::Failed(err.to_string())
            }
        }
    }

    async fn answer_inner(&self, question: &str) -> Result<Answer, PipelineError> {
        info!(question, "processing question");

        // Step 1: vector search over child chunks.
        let candidates = self
            .index
            .search(question, self.config.retrieval_k, self.embedder.as_ref())
            .await?;

        // Step 2: swap children for their parents, deduplicated in
        // first-seen search order. A child whose parent is missing from the
        // store is skipped, not fatal.
        let mut seen: HashSet<Uuid> = HashSet::new();
        let mut unique_parents: Vec<ParentChunk> = Vec::new();
        for (child, _similarity) in &candidates {
            if !seen.insert(child.parent_id) {
                continue;
            }
            match self.parents.get(&child.parent_id) {
                Some(parent) => unique_parents.push(parent),
                None => {
                    warn!(parent_id = %child.parent_id, "matched child has no stored parent, skipping");
                }
            }
        }

        // Step 3: nothing resolved means no rerank and no generation call.
        if unique_parents.is_empty() {
            info!("no relevant parents resolved");
            return Ok(Answer::NoDocuments);
        }

        // Step 4: rerank the full parents against the question.
        let passages = unique_parents
            .iter()
            .map(|parent| Passage {
                id: parent.id,
                text: parent.text.clone(),
            })
            .collect();
        let mut ranked = self.reranker.rerank(question, passages).await?;
        ranked.truncate(self.config.rerank_top_n);

        // Step 5: assemble the context block in reranked order.
        let sources: Vec<Uuid> = ranked.iter().map(|entry| entry.passage.id).collect();
        let context = ranked
            .iter()
            .map(|entry| entry.passage.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        info!(passages = ranked.len(), "sending reranked context to generator");

        // Steps 6-7: grounded generation, returned verbatim.
        let prompt = grounding_prompt(&context, question);
        let text = self.completion.complete(&prompt).await?;

        Ok(Answer::Answered { text, sources })
    }
}
