//! The adjudication pipeline: cache in front, judge behind, random
//! fallback underneath.
//!
//! Concurrent misses on the same pair are coalesced: only the first
//! caller performs the oracle round-trip, and everyone waiting on the
//! same key receives that one result.

use crate::cache::{Verdict, VerdictCache, pair_key};
use crate::judge::Judge;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// How a verdict was reached. Lets tests (and logs) tell cache hits,
/// oracle decisions, and random fallbacks apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ruling {
    /// Served synchronously from the cache.
    Cached(Verdict),
    /// The oracle answered with a valid contestant name.
    Decided(Verdict),
    /// Random pick: oracle disabled, errored, or answered nonsense.
    Fallback(Verdict),
}

impl Ruling {
    pub fn verdict(&self) -> &Verdict {
        match self {
            Ruling::Cached(v) | Ruling::Decided(v) | Ruling::Fallback(v) => v,
        }
    }

    pub fn winner(&self) -> &str {
        &self.verdict().winner
    }
}

/// Moderation outcome for a candidate name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Moderation {
    Appropriate,
    Inappropriate,
}

impl Moderation {
    pub fn is_appropriate(self) -> bool {
        matches!(self, Moderation::Appropriate)
    }
}

struct PipelineState {
    cache: VerdictCache,
    pending: HashMap<String, broadcast::Sender<Ruling>>,
}

/// Outcome of [`Adjudicator::probe`].
enum ProbeResult {
    Cached(Verdict),
    Waiter(broadcast::Receiver<Ruling>),
    Miss,
}

/// Cached, coalescing front end to the [`Judge`].
pub struct Adjudicator {
    state: Mutex<PipelineState>,
    judge: Option<Arc<dyn Judge>>,
}

impl Adjudicator {
    /// Builds the pipeline. Passing no judge disables the oracle: every
    /// uncached collision falls back to random and moderation approves
    /// everything.
    pub fn new(cache: VerdictCache, judge: Option<Arc<dyn Judge>>) -> Self {
        Self {
            state: Mutex::new(PipelineState {
                cache,
                pending: HashMap::new(),
            }),
            judge,
        }
    }

    pub fn judge_enabled(&self) -> bool {
        self.judge.is_some()
    }

    /// Synchronous cache probe: no I/O, no suspension. The tick loop
    /// uses this to resolve known pairs inline.
    pub fn lookup(&self, a: &str, b: &str) -> Option<Verdict> {
        self.state.lock().expect("pipeline lock poisoned").cache.get(a, b)
    }

    /// Number of cached verdicts.
    pub fn cached_len(&self) -> usize {
        self.state.lock().expect("pipeline lock poisoned").cache.len()
    }

    /// Settles a collision between two names.
    ///
    /// Cache hits return immediately. On a miss, the first caller asks
    /// the judge (never holding the state lock across the await) and
    /// records the result; concurrent callers for the same pair wait
    /// for that answer instead of dialing the oracle twice.
    /// Synchronous half of [`Self::adjudicate`]: takes the lock, checks the
    /// cache, and either subscribes to an in-flight request or registers
    /// this call as the one that will resolve the miss. Kept fully
    /// synchronous (no `.await`) so the `MutexGuard` never needs to cross
    /// an await point.
    fn probe(&self, key: &str, a: &str, b: &str) -> ProbeResult {
        let mut state = self.state.lock().expect("pipeline lock poisoned");
        if let Some(verdict) = state.cache.get(a, b) {
            return ProbeResult::Cached(verdict);
        }
        match state.pending.get(key).map(|tx| tx.subscribe()) {
            Some(rx) => ProbeResult::Waiter(rx),
            None => {
                let (tx, _) = broadcast::channel(1);
                state.pending.insert(key.to_string(), tx);
                ProbeResult::Miss
            }
        }
    }

    pub async fn adjudicate(&self, a: &str, b: &str) -> Ruling {
        let key = pair_key(a, b);
        match self.probe(&key, a, b) {
            ProbeResult::Cached(verdict) => Ruling::Cached(verdict),
            ProbeResult::Waiter(mut rx) => match rx.recv().await {
                Ok(ruling) => ruling,
                // The resolving task died; settle locally.
                Err(_) => self.record(&key, Ruling::Fallback(random_verdict(a, b))),
            },
            ProbeResult::Miss => self.resolve_miss(&key, a, b).await,
        }
    }

    async fn resolve_miss(&self, key: &str, a: &str, b: &str) -> Ruling {
        let ruling = match &self.judge {
            None => Ruling::Fallback(random_verdict(a, b)),
            Some(judge) => match judge.pick_winner(a, b).await {
                Ok(reply) => match validate_reply(&reply, a, b) {
                    Some(winner) => {
                        let loser = if winner == a { b } else { a };
                        debug!(winner, "oracle decided");
                        Ruling::Decided(Verdict {
                            winner: winner.to_string(),
                            loser: loser.to_string(),
                        })
                    }
                    None => {
                        warn!(reply, "oracle reply matched neither name; falling back");
                        Ruling::Fallback(random_verdict(a, b))
                    }
                },
                Err(err) => {
                    warn!(%err, "oracle call failed; falling back");
                    Ruling::Fallback(random_verdict(a, b))
                }
            },
        };
        self.record(key, ruling)
    }

    /// Stores a freshly settled ruling, wakes coalesced waiters, and
    /// persists the cache.
    fn record(&self, key: &str, ruling: Ruling) -> Ruling {
        let persisted = {
            let mut state = self.state.lock().expect("pipeline lock poisoned");
            let verdict = ruling.verdict();
            state
                .cache
                .insert(&verdict.winner, &verdict.loser, verdict.clone());
            if let Some(tx) = state.pending.remove(key) {
                let _ = tx.send(ruling.clone());
            }
            state.cache.persist()
        };
        if let Err(err) = persisted {
            warn!(%err, "failed to persist oracle cache");
        }
        ruling
    }

    /// Screens a candidate name. Strict protocol: anything other than a
    /// clean `APPROPRIATE` (including judge errors) is inappropriate.
    /// With the oracle disabled, moderation is bypassed.
    pub async fn moderate(&self, name: &str) -> Moderation {
        let Some(judge) = &self.judge else {
            return Moderation::Appropriate;
        };
        match judge.screen_name(name).await {
            Ok(reply) if reply.trim().eq_ignore_ascii_case("APPROPRIATE") => {
                Moderation::Appropriate
            }
            Ok(reply) => {
                debug!(name, reply, "name rejected by moderation");
                Moderation::Inappropriate
            }
            Err(err) => {
                warn!(%err, name, "moderation call failed; rejecting conservatively");
                Moderation::Inappropriate
            }
        }
    }
}

/// Checks the oracle's reply against the two contestants: trimmed, with
/// one level of paired quotes stripped, it must equal one of them.
fn validate_reply<'a>(reply: &str, a: &'a str, b: &'a str) -> Option<&'a str> {
    let cleaned = strip_paired(strip_paired(reply.trim(), '"'), '\'').trim();
    if cleaned == a {
        Some(a)
    } else if cleaned == b {
        Some(b)
    } else {
        None
    }
}

fn strip_paired(text: &str, quote: char) -> &str {
    let stripped = text
        .strip_prefix(quote)
        .and_then(|rest| rest.strip_suffix(quote));
    stripped.unwrap_or(text)
}

fn random_verdict(a: &str, b: &str) -> Verdict {
    use rand::Rng;
    let (winner, loser) = if rand::thread_rng().gen_bool(0.5) {
        (a, b)
    } else {
        (b, a)
    };
    Verdict {
        winner: winner.to_string(),
        loser: loser.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::JudgeError;
    use crate::judge::StaticJudge;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn seeded_cache() -> VerdictCache {
        let mut cache = VerdictCache::in_memory();
        cache.insert(
            "Rock",
            "Paper",
            Verdict {
                winner: "Paper".to_string(),
                loser: "Rock".to_string(),
            },
        );
        cache
    }

    #[tokio::test]
    async fn test_cache_hit_is_synchronous_and_symmetric() {
        let adj = Adjudicator::new(seeded_cache(), None);

        let first = adj.adjudicate("Rock", "Paper").await;
        let second = adj.adjudicate("Paper", "Rock").await;
        assert!(matches!(first, Ruling::Cached(_)));
        assert_eq!(first.winner(), "Paper");
        assert_eq!(second.winner(), "Paper");
    }

    #[tokio::test]
    async fn test_oracle_decision_is_cached() {
        let judge = StaticJudge::new().with_winner("Fire", "Water", "Water");
        let adj = Adjudicator::new(VerdictCache::in_memory(), Some(Arc::new(judge)));

        let first = adj.adjudicate("Fire", "Water").await;
        assert!(matches!(first, Ruling::Decided(_)));
        assert_eq!(first.winner(), "Water");

        let second = adj.adjudicate("Water", "Fire").await;
        assert!(matches!(second, Ruling::Cached(_)));
        assert_eq!(second.winner(), "Water");
    }

    #[tokio::test]
    async fn test_disabled_oracle_falls_back_and_caches() {
        let adj = Adjudicator::new(VerdictCache::in_memory(), None);

        let ruling = adj.adjudicate("Fire", "Water").await;
        assert!(matches!(ruling, Ruling::Fallback(_)));
        let winner = ruling.winner().to_string();

        // The fallback is recorded as the settled value.
        let replay = adj.adjudicate("Fire", "Water").await;
        assert!(matches!(replay, Ruling::Cached(_)));
        assert_eq!(replay.winner(), winner);
    }

    /// Judge that replies with quotes and counts its calls.
    struct QuotingJudge {
        calls: AtomicUsize,
        reply: String,
        delay: Duration,
    }

    #[async_trait]
    impl Judge for QuotingJudge {
        async fn pick_winner(&self, _a: &str, _b: &str) -> Result<String, JudgeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(self.reply.clone())
        }

        async fn screen_name(&self, _name: &str) -> Result<String, JudgeError> {
            Ok("APPROPRIATE".to_string())
        }
    }

    #[tokio::test]
    async fn test_reply_validation_strips_paired_quotes() {
        let judge = QuotingJudge {
            calls: AtomicUsize::new(0),
            reply: "  \"Water\"  ".to_string(),
            delay: Duration::ZERO,
        };
        let adj = Adjudicator::new(VerdictCache::in_memory(), Some(Arc::new(judge)));
        let ruling = adj.adjudicate("Fire", "Water").await;
        assert!(matches!(ruling, Ruling::Decided(_)));
        assert_eq!(ruling.winner(), "Water");
    }

    #[tokio::test]
    async fn test_unrecognized_reply_falls_back() {
        let judge = QuotingJudge {
            calls: AtomicUsize::new(0),
            reply: "Both are great!".to_string(),
            delay: Duration::ZERO,
        };
        let adj = Adjudicator::new(VerdictCache::in_memory(), Some(Arc::new(judge)));
        let ruling = adj.adjudicate("Fire", "Water").await;
        assert!(matches!(ruling, Ruling::Fallback(_)));
        assert!(ruling.winner() == "Fire" || ruling.winner() == "Water");
    }

    #[tokio::test]
    async fn test_concurrent_misses_coalesce_into_one_call() {
        let judge = Arc::new(QuotingJudge {
            calls: AtomicUsize::new(0),
            reply: "Water".to_string(),
            delay: Duration::from_millis(50),
        });
        let adj = Arc::new(Adjudicator::new(
            VerdictCache::in_memory(),
            Some(judge.clone()),
        ));

        let left = {
            let adj = adj.clone();
            tokio::spawn(async move { adj.adjudicate("Fire", "Water").await })
        };
        let right = {
            let adj = adj.clone();
            tokio::spawn(async move { adj.adjudicate("Water", "Fire").await })
        };

        let (left, right) = (left.await.unwrap(), right.await.unwrap());
        assert_eq!(left.winner(), "Water");
        assert_eq!(right.winner(), "Water");
        assert_eq!(judge.calls.load(Ordering::SeqCst), 1, "miss not coalesced");
    }

    #[tokio::test]
    async fn test_moderation_protocol_is_strict() {
        let judge = StaticJudge::new()
            .with_banned("Badword")
            .with_screen_reply("Weird", "maybe fine?");
        let adj = Adjudicator::new(VerdictCache::in_memory(), Some(Arc::new(judge)));

        assert!(adj.moderate("Alice").await.is_appropriate());
        assert!(!adj.moderate("Badword").await.is_appropriate());
        // Anything that is not a clean APPROPRIATE is rejected.
        assert!(!adj.moderate("Weird").await.is_appropriate());
    }

    #[tokio::test]
    async fn test_moderation_bypassed_without_judge() {
        let adj = Adjudicator::new(VerdictCache::in_memory(), None);
        assert!(adj.moderate("Anything At All").await.is_appropriate());
    }
}
