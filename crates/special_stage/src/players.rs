//! Player roster and the kart-side reactions the UFO asks for.

use engine_core::{
    hypot, ActorWorld, Entity, Fixed, RandomClass, RandomStreams, TICRATE,
};

/// Most players a level can hold.
pub const MAXPLAYERS: usize = 16;

/// Skins available when a player's displayed skin is shuffled.
pub const DEFAULT_SKIN_COUNT: usize = 8;

/// Tics a stumble lasts.
pub const STUMBLE_TICS: u32 = TICRATE;

/// Marks a kart actor as belonging to a roster slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KartOwner(pub usize);

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct SkinFlags: u32 {
        /// Shows a random skin after landing a hit.
        const IRONMAN = 1 << 0;
    }
}

#[derive(Debug, Clone, Default)]
pub struct PlayerState {
    pub in_game: bool,
    pub spectator: bool,
    pub mo: Option<Entity>,
    /// Map units left along the track.
    pub distance_to_finish: u32,
    /// Momentum relative to the ground.
    pub rmomx: Fixed,
    pub rmomy: Fixed,
    /// Top speed without boosts, in world scale.
    pub kart_speed: Fixed,
    pub sneaker_timer: u32,
    /// Boosts used so far.
    pub num_sneakers: u32,
    /// Invulnerability frames.
    pub flashing: u32,
    pub spinout_timer: u32,
    pub stumble_timer: u32,
    pub skin: usize,
    pub skin_flags: SkinFlags,
    /// Displayed skin when it differs from the real one.
    pub fake_skin: Option<usize>,
    pub no_contest: bool,
    pub exiting: bool,
}

impl PlayerState {
    pub fn in_pain(&self) -> bool {
        self.spinout_timer > 0
    }

    pub fn horizontal_speed(&self) -> Fixed {
        hypot(self.rmomx, self.rmomy)
    }

    pub fn stumble(&mut self) {
        self.stumble_timer = STUMBLE_TICS;
    }

    pub fn do_exit(&mut self) {
        self.exiting = true;
    }

    /// Show a skin other than the real one.
    pub fn randomize_fake_skin(&mut self, rng: &mut RandomStreams, skin_count: usize) {
        if skin_count < 2 {
            return;
        }
        let mut pick = rng.index(RandomClass::RandomSkin, skin_count - 1);
        if pick >= self.skin {
            pick += 1;
        }
        self.fake_skin = Some(pick);
    }
}

/// Fixed-size roster of player slots.
#[derive(Debug, Clone)]
pub struct Players {
    slots: Vec<PlayerState>,
    pub skin_count: usize,
}

impl Default for Players {
    fn default() -> Self {
        Self::new()
    }
}

impl Players {
    pub fn new() -> Self {
        Self {
            slots: vec![PlayerState::default(); MAXPLAYERS],
            skin_count: DEFAULT_SKIN_COUNT,
        }
    }

    /// Put a kart actor into the first free slot.
    pub fn join(&mut self, actors: &mut ActorWorld, mo: Entity, skin: usize) -> Option<usize> {
        let slot = self.slots.iter().position(|p| !p.in_game)?;
        self.slots[slot] = PlayerState {
            in_game: true,
            mo: Some(mo),
            distance_to_finish: u32::MAX,
            skin,
            ..PlayerState::default()
        };
        actors.attach(mo, KartOwner(slot));
        Some(slot)
    }

    pub fn get(&self, slot: usize) -> Option<&PlayerState> {
        self.slots.get(slot)
    }

    pub fn get_mut(&mut self, slot: usize) -> Option<&mut PlayerState> {
        self.slots.get_mut(slot)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &PlayerState)> {
        self.slots.iter().enumerate()
    }

    /// In the game and not spectating.
    pub fn racing_mut(&mut self) -> impl Iterator<Item = &mut PlayerState> {
        self.slots.iter_mut().filter(|p| p.in_game && !p.spectator)
    }

    /// Racing players whose kart actor still exists.
    pub fn in_play<'a>(&'a self, actors: &'a ActorWorld) -> impl Iterator<Item = (usize, &'a PlayerState)> + 'a {
        self.iter()
            .filter(move |(_, p)| p.in_game && !p.spectator && actors.valid_opt(p.mo))
    }

    /// Roster slot owning a kart actor.
    pub fn owner_of(&self, actors: &ActorWorld, mo: Entity) -> Option<usize> {
        actors.get::<KartOwner>(mo).map(|o| o.0)
    }

    /// Count down per-player timers.
    pub fn tick(&mut self) {
        for p in self.slots.iter_mut().filter(|p| p.in_game) {
            p.sneaker_timer = p.sneaker_timer.saturating_sub(1);
            p.flashing = p.flashing.saturating_sub(1);
            p.spinout_timer = p.spinout_timer.saturating_sub(1);
            p.stumble_timer = p.stumble_timer.saturating_sub(1);
        }
    }
}

/// Push two touching actors apart along the line between them, trading
/// momentum along that line in proportion to their masses.
pub fn kart_bounce(actors: &mut ActorWorld, mover: Entity, other: Entity) {
    let (Some(a), Some(b)) = (actors.mobj(mover), actors.mobj(other)) else {
        return;
    };

    let dx = a.x - b.x;
    let dy = a.y - b.y;
    let dist = hypot(dx, dy);
    if dist == Fixed::ZERO {
        return;
    }
    let nx = dx / dist;
    let ny = dy / dist;

    // Closing speed along the normal; positive means they are approaching.
    let closing = (b.momx - a.momx) * nx + (b.momy - a.momy) * ny;
    if closing <= Fixed::ZERO {
        return;
    }

    let total_mass = a.mass + b.mass;
    if total_mass <= Fixed::ZERO {
        return;
    }
    let push_a = closing * 2 * (b.mass / total_mass);
    let push_b = closing * 2 * (a.mass / total_mass);

    if let Some(mo) = actors.mobj_mut(mover) {
        mo.momx += push_a * nx;
        mo.momy += push_a * ny;
    }
    if let Some(mo) = actors.mobj_mut(other) {
        mo.momx -= push_b * nx;
        mo.momy -= push_b * ny;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::{FixedVec3, Mobj, MobjKind, MobjState};

    fn kart(actors: &mut ActorWorld, x: i32) -> Entity {
        actors.spawn(Mobj::new(MobjKind::Player, FixedVec3::from_ints(x, 0, 0), MobjState::Spawn))
    }

    #[test]
    fn join_fills_slots_in_order_and_tags_the_kart() {
        let mut actors = ActorWorld::new();
        let mut players = Players::new();
        let a = kart(&mut actors, 0);
        let b = kart(&mut actors, 100);
        assert_eq!(players.join(&mut actors, a, 0), Some(0));
        assert_eq!(players.join(&mut actors, b, 1), Some(1));
        assert_eq!(players.owner_of(&actors, b), Some(1));
        assert_eq!(players.in_play(&actors).count(), 2);

        actors.despawn(a);
        assert_eq!(players.in_play(&actors).map(|(i, _)| i).collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn roster_is_capped() {
        let mut actors = ActorWorld::new();
        let mut players = Players::new();
        for i in 0..MAXPLAYERS {
            let mo = kart(&mut actors, i as i32);
            assert!(players.join(&mut actors, mo, 0).is_some());
        }
        let extra = kart(&mut actors, 0);
        assert!(players.join(&mut actors, extra, 0).is_none());
    }

    #[test]
    fn fake_skin_never_matches_the_real_one() {
        let mut rng = RandomStreams::new(3);
        let mut p = PlayerState {
            skin: 2,
            ..PlayerState::default()
        };
        for _ in 0..100 {
            p.randomize_fake_skin(&mut rng, 4);
            let fake = p.fake_skin.unwrap();
            assert!(fake < 4 && fake != 2);
        }
    }

    #[test]
    fn head_on_bounce_reverses_the_approach() {
        let mut actors = ActorWorld::new();
        let a = kart(&mut actors, 0);
        let b = kart(&mut actors, 50);
        actors.mobj_mut(a).unwrap().momx = Fixed::from_int(10);

        kart_bounce(&mut actors, a, b);
        let (ma, mb) = (actors.mobj(a).unwrap(), actors.mobj(b).unwrap());
        assert!(ma.momx <= Fixed::ZERO);
        assert!(mb.momx > Fixed::ZERO);

        // Already separating: nothing changes.
        kart_bounce(&mut actors, a, b);
        assert_eq!(actors.mobj(a).unwrap().momx, ma.momx);
    }

    #[test]
    fn timers_count_down() {
        let mut actors = ActorWorld::new();
        let mut players = Players::new();
        let mo = kart(&mut actors, 0);
        let slot = players.join(&mut actors, mo, 0).unwrap();
        let p = players.get_mut(slot).unwrap();
        p.sneaker_timer = 2;
        p.stumble();
        players.tick();
        assert_eq!(players.get(slot).unwrap().sneaker_timer, 1);
        assert_eq!(players.get(slot).unwrap().stumble_timer, STUMBLE_TICS - 1);
    }
}
