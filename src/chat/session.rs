//! Single chat session driven by an explicit event queue.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::classifier::HybridClassifier;
use crate::error::ClassifyError;

use super::state::{ChatEvent, ConversationTurn, Screen};

/// Serializable view of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub screen: Screen,
    pub messages: Vec<ConversationTurn>,
    pub input_counter: u64,
}

/// Screen, history, and pending events for one user.
#[derive(Debug, Default)]
pub struct ChatSession {
    screen: Screen,
    messages: Vec<ConversationTurn>,
    /// Number of submissions processed so far.
    input_counter: u64,
    last_input: Option<String>,
    pending: VecDeque<ChatEvent>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn messages(&self) -> &[ConversationTurn] {
        &self.messages
    }

    pub fn input_counter(&self) -> u64 {
        self.input_counter
    }

    pub fn last_input(&self) -> Option<&str> {
        self.last_input.as_deref()
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Queue an event for the next [`process_pending`](Self::process_pending).
    pub fn push(&mut self, event: ChatEvent) {
        self.pending.push_back(event);
    }

    /// Drain the queue in order, returning every turn appended.
    ///
    /// Stops at the first classification failure; the failing event is
    /// dropped and later events stay queued.
    pub fn process_pending(
        &mut self,
        classifier: &HybridClassifier,
    ) -> Result<Vec<ConversationTurn>, ClassifyError> {
        let mut appended = Vec::new();
        while let Some(event) = self.pending.pop_front() {
            appended.extend(self.handle(event, classifier)?);
        }
        Ok(appended)
    }

    /// Apply one event immediately. Returns the turns it appended.
    pub fn handle(
        &mut self,
        event: ChatEvent,
        classifier: &HybridClassifier,
    ) -> Result<Vec<ConversationTurn>, ClassifyError> {
        match event {
            ChatEvent::Start => {
                self.transition(Screen::Chat);
                Ok(Vec::new())
            }
            ChatEvent::Home => {
                if self.transition(Screen::Welcome) {
                    self.messages.clear();
                }
                Ok(Vec::new())
            }
            ChatEvent::Submit(text) => self.submit(&text, classifier),
        }
    }

    fn transition(&mut self, target: Screen) -> bool {
        if !self.screen.can_transition_to(target) {
            debug!(from = %self.screen, to = %target, "Ignoring invalid screen transition");
            return false;
        }
        info!(from = %self.screen, to = %target, "Screen changed");
        self.screen = target;
        true
    }

    fn submit(
        &mut self,
        text: &str,
        classifier: &HybridClassifier,
    ) -> Result<Vec<ConversationTurn>, ClassifyError> {
        if self.screen != Screen::Chat {
            debug!(screen = %self.screen, "Ignoring submit outside chat screen");
            return Ok(Vec::new());
        }
        let text = text.trim();
        if text.is_empty() {
            return Ok(Vec::new());
        }

        let verdict = classifier.classify(text)?;

        let turns = vec![
            ConversationTurn::user(text),
            ConversationTurn::verdict(verdict.label),
        ];
        self.messages.extend(turns.iter().cloned());
        self.last_input = Some(text.to_string());
        self.input_counter += 1;

        info!(
            label = %verdict.label,
            decision = verdict.decision.label(),
            input_counter = self.input_counter,
            "Chat message classified"
        );
        Ok(turns)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            screen: self.screen,
            messages: self.messages.clone(),
            input_counter: self.input_counter,
        }
    }
}
