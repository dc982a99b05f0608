//! Governing-instance arbitration for the shared playback rate.
//!
//! Per session, only the most recently activated engine may set the global time scale. A
//! freshly (re)activated governor runs a short warm-up at 1x so the host can settle a pose
//! before edit mode freezes playback.

use hashbrown::HashMap;
use log::debug;

use crate::ids::{EngineId, SessionId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Governor {
    engine: EngineId,
    warmup_remaining: u32,
}

/// Neutral rate applied during warm-up.
pub const WARMUP_RATE: f32 = 1.0;

#[derive(Clone, Debug, Default)]
pub struct ModeRegistry {
    sessions: HashMap<SessionId, Governor>,
}

impl ModeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `engine` the governor of `session` (latest activation wins) and start its warm-up.
    pub fn activate(&mut self, session: SessionId, engine: EngineId, warmup_ticks: u32) {
        let previous = self.sessions.insert(
            session,
            Governor {
                engine,
                warmup_remaining: warmup_ticks,
            },
        );
        if let Some(prev) = previous.filter(|p| p.engine != engine) {
            debug!("engine {} takes over rate control from {}", engine, prev.engine);
        }
    }

    /// Remove `engine` as governor. Returns `false` when it was not governing.
    pub fn deactivate(&mut self, session: SessionId, engine: EngineId) -> bool {
        if self.is_governing(session, engine) {
            self.sessions.remove(&session);
            true
        } else {
            false
        }
    }

    pub fn governor(&self, session: SessionId) -> Option<EngineId> {
        self.sessions.get(&session).map(|g| g.engine)
    }

    pub fn is_governing(&self, session: SessionId, engine: EngineId) -> bool {
        self.governor(session) == Some(engine)
    }

    /// Re-enter warm-up (e.g. after an authoring spawn). Ignored for non-governors.
    pub fn restart_warmup(&mut self, session: SessionId, engine: EngineId, warmup_ticks: u32) {
        if let Some(g) = self.sessions.get_mut(&session).filter(|g| g.engine == engine) {
            g.warmup_remaining = warmup_ticks;
        }
    }

    pub fn warmup_remaining(&self, session: SessionId) -> u32 {
        self.sessions.get(&session).map_or(0, |g| g.warmup_remaining)
    }

    /// Rate `engine` should apply this tick, or `None` if it must leave the rate alone.
    ///
    /// Consumes one warm-up tick when warm-up is pending.
    pub fn rate_for(
        &mut self,
        session: SessionId,
        engine: EngineId,
        authoring: bool,
        edit_rate: f32,
        play_rate: f32,
    ) -> Option<f32> {
        let g = self.sessions.get_mut(&session).filter(|g| g.engine == engine)?;
        if g.warmup_remaining > 0 {
            g.warmup_remaining -= 1;
            return Some(WARMUP_RATE);
        }
        Some(if authoring { edit_rate } else { play_rate })
    }
}
