//! Per-chat prompt collection state.
//!
//! A chat is either idle (no entry) or collecting answers for one command. The tracker only holds
//! state; the processor decides when to start, answer or cancel.

use std::collections::HashMap;

use dbot_core::ChatId;
use tracing::{debug, info};

/// Answers collected so far for one command.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivePrompt {
    pub command: String,
    pub answers: Vec<String>,
}

/// Outcome of recording one answer.
#[derive(Debug, Clone, PartialEq)]
pub enum PromptStep {
    /// More answers needed; the next question to ask. The chat keeps collecting.
    Ask(String),
    /// All questions answered. The entry has been removed.
    Complete { command: String, answers: Vec<String> },
}

/// Active prompts keyed by chat. At most one per chat.
#[derive(Debug, Default)]
pub struct PromptTracker {
    active: HashMap<ChatId, ActivePrompt>,
}

impl PromptTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts collecting for `command` with no answers. Returns the prompt it replaced, if any.
    pub fn start(&mut self, chat_id: ChatId, command: impl Into<String>) -> Option<ActivePrompt> {
        let command = command.into();
        info!(chat_id = %chat_id, command = %command, "prompt started");
        self.active.insert(
            chat_id,
            ActivePrompt {
                command,
                answers: Vec::new(),
            },
        )
    }

    pub fn is_collecting(&self, chat_id: &ChatId) -> bool {
        self.active.contains_key(chat_id)
    }

    pub fn pending(&self, chat_id: &ChatId) -> Option<&ActivePrompt> {
        self.active.get(chat_id)
    }

    /// Appends `answer` for the chat's pending command.
    ///
    /// `questions` are the command's declared prompts. `None` when the chat is not collecting.
    pub fn record_answer(
        &mut self,
        chat_id: &ChatId,
        answer: String,
        questions: &[String],
    ) -> Option<PromptStep> {
        let prompt = self.active.get_mut(chat_id)?;
        prompt.answers.push(answer);
        let collected = prompt.answers.len();
        debug!(
            chat_id = %chat_id,
            command = %prompt.command,
            collected,
            expected = questions.len(),
            "prompt answer recorded"
        );

        if collected < questions.len() {
            return Some(PromptStep::Ask(questions[collected].clone()));
        }
        let prompt = self.active.remove(chat_id)?;
        info!(chat_id = %chat_id, command = %prompt.command, "prompt complete");
        Some(PromptStep::Complete {
            command: prompt.command,
            answers: prompt.answers,
        })
    }

    /// Drops the chat's pending prompt.
    pub fn cancel(&mut self, chat_id: &ChatId) -> Option<ActivePrompt> {
        let cancelled = self.active.remove(chat_id);
        if let Some(prompt) = &cancelled {
            info!(
                chat_id = %chat_id,
                command = %prompt.command,
                collected = prompt.answers.len(),
                "prompt cancelled"
            );
        }
        cancelled
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}
