//! Asking a language model a structured question about a transcript.

use super::answer::{answer_instructions, extract_json_object, StructuredAnswer};
use super::transcript::{render_transcript, MessageFilter};
use crate::logs::model::ChatMessage;
use core::marker::PhantomData;
use thiserror::Error;

/// Errors that can occur while scanning a transcript
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Language model failed to generate: {0}")]
    Model(String),

    #[error("No messages left to scan after filtering")]
    EmptyTranscript,

    #[error("Model completion does not contain a JSON object")]
    NoAnswer,

    #[error("Model answer does not match the expected fields: {0}")]
    InvalidAnswer(#[from] serde_json::Error),
}

/// A model which turns a prompt into a completion.
///
/// Transport, retries and rate limiting are left to the implementor.
pub trait LanguageModel {
    fn generate(&self, prompt: &str) -> Result<String, String>;
}

impl<F> LanguageModel for F
where
    F: Fn(&str) -> Result<String, String>,
{
    fn generate(&self, prompt: &str) -> Result<String, String> {
        self(prompt)
    }
}

/// Result of a successful scan.
#[derive(Debug, Clone, PartialEq)]
pub struct Scan<T> {
    pub answer: T,
    /// Full completion returned by the model.
    pub completion: String,
}

/// Asks a question about conversations and parses the answer into `T`.
#[derive(Debug, Clone)]
pub struct Scanner<T> {
    name: String,
    question: String,
    filter: MessageFilter,
    answer: PhantomData<fn() -> T>,
}

impl<T: StructuredAnswer> Scanner<T> {
    /// Creates a scanner reading all messages.
    pub fn new(name: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            question: question.into(),
            filter: MessageFilter::All,
            answer: PhantomData,
        }
    }

    pub fn with_filter(mut self, filter: MessageFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn filter(&self) -> &MessageFilter {
        &self.filter
    }

    /// Renders the messages this scanner reads.
    pub fn transcript(&self, messages: &[ChatMessage]) -> String {
        render_transcript(messages, &self.filter)
    }

    /// Builds the full prompt: transcript, question and answer instructions.
    pub fn prompt(&self, messages: &[ChatMessage]) -> Result<String, ScanError> {
        let transcript = self.transcript(messages);
        if transcript.is_empty() {
            return Err(ScanError::EmptyTranscript);
        }

        Ok(format!(
            "Here is a conversation transcript:\n\n[BEGIN TRANSCRIPT]\n{}[END TRANSCRIPT]\n\n{}\n\n{}",
            transcript,
            self.question,
            answer_instructions::<T>()
        ))
    }

    /// Asks `model` the question about `messages`.
    ///
    /// The answer is the first balanced JSON object in the completion.
    pub fn scan<M>(&self, model: &M, messages: &[ChatMessage]) -> Result<Scan<T>, ScanError>
    where
        M: LanguageModel + ?Sized,
    {
        let prompt = self.prompt(messages)?;
        let completion = model.generate(&prompt).map_err(ScanError::Model)?;
        let json = extract_json_object(&completion).ok_or(ScanError::NoAnswer)?;
        let answer = serde_json::from_str(json)?;

        tracing::debug!(scanner = %self.name, "scanned transcript");
        Ok(Scan { answer, completion })
    }
}
