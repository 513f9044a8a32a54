//! SwarmClash oracle: the semantic judge behind collisions.
//!
//! When two rival minions touch, the question is not who was faster but
//! whose *name* wins. This crate owns that question end to end:
//!
//! - [`Judge`] is the seam: production uses [`GeminiJudge`] over the
//!   remote text-generation API, tests use [`StaticJudge`] with canned
//!   answers.
//! - [`VerdictCache`] keeps every settled pair in a JSON file so a
//!   rematch never dials the oracle again.
//! - [`Adjudicator`] ties them together: synchronous cache hits,
//!   coalesced misses, reply validation, random fallback when the
//!   oracle is unavailable or unintelligible, and the strict
//!   name-moderation protocol.
//!
//! The oracle is slow (≥100 ms); nothing in here is allowed to block
//! the simulation tick, and no lock is ever held across oracle I/O.

mod cache;
mod error;
mod gemini;
mod judge;
mod pipeline;

pub use cache::{Verdict, VerdictCache, pair_key};
pub use error::{CacheError, JudgeError};
pub use gemini::{API_KEY_VAR, GeminiJudge};
pub use judge::{Judge, StaticJudge, moderation_prompt, winner_prompt};
pub use pipeline::{Adjudicator, Moderation, Ruling};
