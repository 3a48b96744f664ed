//! Sound channel bookkeeping.
//!
//! The simulation only needs to know which sounds are playing on which
//! actor ("is the zoom loop on?"). Actual mixing happens in the host; it
//! drains [`SoundChannels::drain_started`] each tic and plays what it finds.

use hecs::Entity;

/// Number of hum variants, from calmest (0) to most urgent.
pub const HUM_VARIANTS: u8 = 16;

/// Sounds the special-stage actors emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundId {
    /// Claw hum, `0..HUM_VARIANTS`.
    ClawHum(u8),
    /// Speed-up zoom loop.
    ClawZoom,
    /// Took a hit.
    ClawHit,
    /// Shell broke open.
    ClawBreak,
}

impl SoundId {
    /// Playback length in tics.
    pub fn length_tics(self) -> u32 {
        match self {
            SoundId::ClawHum(_) => 35,
            SoundId::ClawZoom => 70,
            SoundId::ClawHit => 20,
            SoundId::ClawBreak => 70,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ActiveSound {
    origin: Entity,
    id: SoundId,
    remaining: u32,
}

/// Which sounds are currently playing, per origin actor.
///
/// Every start is also queued for the host. The queue only empties through
/// [`SoundChannels::drain_started`], so a host must drain it once per tic.
#[derive(Debug, Default)]
pub struct SoundChannels {
    active: Vec<ActiveSound>,
    started: Vec<(Entity, SoundId)>,
}

impl SoundChannels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `id` on `origin`. Restarts it if it was already playing there.
    pub fn start(&mut self, origin: Entity, id: SoundId) {
        self.stop(origin, id);
        self.active.push(ActiveSound {
            origin,
            id,
            remaining: id.length_tics(),
        });
        self.started.push((origin, id));
    }

    /// Stop one sound on `origin`.
    pub fn stop(&mut self, origin: Entity, id: SoundId) {
        self.active.retain(|s| !(s.origin == origin && s.id == id));
    }

    /// Stop everything `origin` is playing.
    pub fn stop_all(&mut self, origin: Entity) {
        self.active.retain(|s| s.origin != origin);
    }

    pub fn is_playing(&self, origin: Entity, id: SoundId) -> bool {
        self.active.iter().any(|s| s.origin == origin && s.id == id)
    }

    /// Whether any sound matching `pred` is playing on `origin`.
    pub fn is_playing_any(&self, origin: Entity, pred: impl Fn(SoundId) -> bool) -> bool {
        self.active.iter().any(|s| s.origin == origin && pred(s.id))
    }

    /// Age every channel by one tic and drop finished sounds.
    pub fn tick(&mut self) {
        for s in &mut self.active {
            s.remaining = s.remaining.saturating_sub(1);
        }
        self.active.retain(|s| s.remaining > 0);
    }

    /// Sounds started since the last drain, in start order.
    pub fn drain_started(&mut self) -> Vec<(Entity, SoundId)> {
        std::mem::take(&mut self.started)
    }
}
