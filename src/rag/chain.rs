//! Conversational retrieval chain.

use super::context::{format_chat_history, format_context_for_prompt, Retriever};
use super::{ChatMessage, ChatModel, ConversationTurn, SourceChunk};
use crate::config::Prompts;
use crate::error::{Result, TubeQaError};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Answers questions about one transcript, using prior turns as context.
pub struct ConversationalRetrievalChain {
    llm: Arc<dyn ChatModel>,
    retriever: Retriever,
    prompts: Prompts,
    return_source_documents: bool,
    rephrase_question: bool,
}

impl ConversationalRetrievalChain {
    /// Create a chain that returns sources and rephrases follow-ups.
    pub fn new(llm: Arc<dyn ChatModel>, retriever: Retriever, prompts: Prompts) -> Self {
        Self {
            llm,
            retriever,
            prompts,
            return_source_documents: true,
            rephrase_question: true,
        }
    }

    /// Whether answers carry the chunks they were based on.
    pub fn with_return_source_documents(mut self, enabled: bool) -> Self {
        self.return_source_documents = enabled;
        self
    }

    /// Whether the condensed question (rather than the original) is answered.
    pub fn with_rephrase_question(mut self, enabled: bool) -> Self {
        self.rephrase_question = enabled;
        self
    }

    pub fn model_name(&self) -> &str {
        self.llm.model_name()
    }

    /// Answer a question given the conversation so far.
    #[instrument(skip(self, history), fields(question = %question, turns = history.len()))]
    pub async fn ask(&self, question: &str, history: &[ConversationTurn]) -> Result<QaResponse> {
        if question.trim().is_empty() {
            return Err(TubeQaError::InvalidInput("Question cannot be empty".to_string()));
        }

        let standalone = if history.is_empty() {
            question.to_string()
        } else {
            self.condense_question(question, history).await?
        };
        debug!("Standalone question: {}", standalone);

        let sources = self.retriever.retrieve(&standalone).await?;

        let mut vars = HashMap::new();
        vars.insert("context".to_string(), format_context_for_prompt(&sources));
        vars.insert(
            "question".to_string(),
            if self.rephrase_question {
                standalone.clone()
            } else {
                question.to_string()
            },
        );

        let messages = vec![
            ChatMessage::System(self.prompts.render_with_custom(&self.prompts.rag.qa_system, &vars)),
            ChatMessage::User(self.prompts.render_with_custom(&self.prompts.rag.qa_user, &vars)),
        ];

        let answer = self.llm.complete(&messages).await?;
        info!("Answered with {} source chunks", sources.len());

        Ok(QaResponse {
            answer: answer.trim().to_string(),
            sources: if self.return_source_documents {
                sources
            } else {
                Vec::new()
            },
            generated_question: standalone,
        })
    }

    /// Rewrite a follow-up question so it stands on its own.
    async fn condense_question(&self, question: &str, history: &[ConversationTurn]) -> Result<String> {
        let mut vars = HashMap::new();
        vars.insert("chat_history".to_string(), format_chat_history(history));
        vars.insert("question".to_string(), question.to_string());

        let prompt = self
            .prompts
            .render_with_custom(&self.prompts.rag.condense_question, &vars);
        let condensed = self.llm.complete(&[ChatMessage::User(prompt)]).await?;

        let condensed = condensed.trim();
        if condensed.is_empty() {
            Ok(question.to_string())
        } else {
            Ok(condensed.to_string())
        }
    }
}

/// An answer with the chunks it was based on.
#[derive(Debug, Clone)]
pub struct QaResponse {
    /// The generated answer.
    pub answer: String,
    /// Retrieved chunks, best first (empty when sources are disabled).
    pub sources: Vec<SourceChunk>,
    /// The question used for retrieval.
    pub generated_question: String,
}
