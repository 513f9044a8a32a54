//! The judge seam: who decides which name wins a collision.
//!
//! Production talks to a remote text-generation service; tests use a
//! scripted judge with canned answers.

use crate::cache::pair_key;
use crate::error::JudgeError;
use async_trait::async_trait;
use std::collections::HashMap;

/// Prompt for a battle adjudication. The only hard contract is the
/// reply: it must be exactly one of the two contestant names.
pub fn winner_prompt(a: &str, b: &str) -> String {
    format!(
        "You are judging a battle to the death between \"{a}\" and \"{b}\".\n\
         Be dumb and fun about it. Channel internet culture, and when the call\n\
         could go either way, let the creative underdog take it.\n\n\
         Respond with ONLY the winning name. No quotes, no explanations, nothing else.\n\n\
         Winner: "
    )
}

/// Prompt for name moderation. The reply protocol is strictly one word.
pub fn moderation_prompt(name: &str) -> String {
    format!(
        "Is the name \"{name}\" appropriate for a family-friendly multiplayer game?\n\n\
         Only treat a name as INAPPROPRIATE if it contains explicit sexual content\n\
         or innuendo, profanity, vulgar language or slurs, or harassing or\n\
         hateful speech. Anything else is fine.\n\n\
         Respond with ONLY one word: \"APPROPRIATE\" or \"INAPPROPRIATE\".\n\n\
         Response: "
    )
}

/// Semantic judge for collisions and name screening.
///
/// Both methods return the oracle's *raw* text; interpretation
/// (validation, quote stripping, the strict moderation protocol) lives
/// in the adjudication pipeline so every implementation is held to the
/// same contract.
#[async_trait]
pub trait Judge: Send + Sync + 'static {
    /// Asks which of the two names wins. The reply should be one of
    /// the inputs, but callers must not assume it is.
    async fn pick_winner(&self, a: &str, b: &str) -> Result<String, JudgeError>;

    /// Asks whether a name is acceptable. The reply should be
    /// `APPROPRIATE` or `INAPPROPRIATE`.
    async fn screen_name(&self, name: &str) -> Result<String, JudgeError>;
}

/// Scripted judge with canned answers, for tests and offline runs.
#[derive(Debug, Default)]
pub struct StaticJudge {
    winners: HashMap<String, String>,
    screen_replies: HashMap<String, String>,
}

impl StaticJudge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the winner for a pair (order-insensitive).
    pub fn with_winner(mut self, a: &str, b: &str, winner: &str) -> Self {
        self.winners.insert(pair_key(a, b), winner.to_string());
        self
    }

    /// Scripts the raw screening reply for a name.
    pub fn with_screen_reply(mut self, name: &str, reply: &str) -> Self {
        self.screen_replies.insert(name.to_string(), reply.to_string());
        self
    }

    /// Marks a name as inappropriate.
    pub fn with_banned(self, name: &str) -> Self {
        self.with_screen_reply(name, "INAPPROPRIATE")
    }
}

#[async_trait]
impl Judge for StaticJudge {
    async fn pick_winner(&self, a: &str, b: &str) -> Result<String, JudgeError> {
        self.winners
            .get(&pair_key(a, b))
            .cloned()
            .ok_or(JudgeError::EmptyReply)
    }

    async fn screen_name(&self, name: &str) -> Result<String, JudgeError> {
        Ok(self
            .screen_replies
            .get(name)
            .cloned()
            .unwrap_or_else(|| "APPROPRIATE".to_string()))
    }
}
