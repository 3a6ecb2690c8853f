//! ECS Components for the platformer simulation.
//!
//! Components are pure data containers attached to entities.
//! All game logic lives in systems that query these components.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// SPATIAL COMPONENTS
// ============================================================================

/// 2D position in level space (x grows right, y grows down).
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// 2D velocity vector in px/s.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    pub vx: f32,
    pub vy: f32,
}

impl Velocity {
    pub fn new(vx: f32, vy: f32) -> Self {
        Self { vx, vy }
    }
}

/// Visual extent of an entity.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle, top-left anchored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// How an entity's hitbox is derived from its position and size.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum HitboxShape {
    /// The raw position/size rectangle.
    #[default]
    Bounds,
    /// Horizontally centered on `position.x`, bottom edge at `position.y`,
    /// narrowed to `width_ratio` of the visual width.
    Footed { width_ratio: f32 },
}

impl HitboxShape {
    pub fn hitbox(&self, position: &Position, size: &Size) -> Rect {
        match *self {
            HitboxShape::Bounds => Rect::new(position.x, position.y, size.width, size.height),
            HitboxShape::Footed { width_ratio } => Rect::new(
                position.x - (size.width / 2.0) * width_ratio,
                position.y - size.height,
                size.width * width_ratio,
                size.height,
            ),
        }
    }
}

// ============================================================================
// IDENTITY COMPONENTS
// ============================================================================

/// Insertion order into the world. Order-dependent passes iterate by it.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpawnOrder(pub u64);

/// Archetype tag, used by snapshots and the renderer.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
    Wall,
    Player,
    Zombie,
    Crawler,
    GunBullet,
    GroundCrumbleAttack,
    BloodSplatter,
}

/// Horizontal facing; also the direction a hit came from.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Facing {
    #[default]
    Left,
    Right,
}

impl Facing {
    pub fn sign(&self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }
}

// ============================================================================
// PHYSICS COMPONENTS
// ============================================================================

/// Constant downward acceleration in px/s².
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gravitational {
    pull: f32,
}

impl Gravitational {
    pub fn new(pull: f32) -> Self {
        Self { pull }
    }

    /// Fixed for the component's lifetime; there is no setter.
    pub fn pull(&self) -> f32 {
        self.pull
    }
}

/// Collision filter tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollisionGroup {
    Wall,
    Mob,
    Player,
    PlayerAttack,
    Cadaver,
}

/// Side of an entity on which a contact was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
            Side::Top => Side::Bottom,
            Side::Bottom => Side::Top,
        }
    }
}

/// One entry in a directional contact list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub entity: Entity,
    /// True only on the first tick the pair touches on this side.
    pub initial: bool,
}

/// The four directional contact lists of one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactSet {
    pub left: Vec<Contact>,
    pub right: Vec<Contact>,
    pub top: Vec<Contact>,
    pub bottom: Vec<Contact>,
}

impl ContactSet {
    pub fn side(&self, side: Side) -> &[Contact] {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
            Side::Top => &self.top,
            Side::Bottom => &self.bottom,
        }
    }

    pub fn push(&mut self, side: Side, contact: Contact) {
        match side {
            Side::Left => self.left.push(contact),
            Side::Right => self.right.push(contact),
            Side::Top => self.top.push(contact),
            Side::Bottom => self.bottom.push(contact),
        }
    }

    pub fn is_touching(&self, side: Side) -> bool {
        !self.side(side).is_empty()
    }

    pub fn touches(&self, side: Side, entity: Entity) -> bool {
        self.side(side).iter().any(|c| c.entity == entity)
    }

    /// Whether a contact began on `side` this tick.
    pub fn has_initial(&self, side: Side) -> bool {
        self.side(side).iter().any(|c| c.initial)
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty() && self.right.is_empty() && self.top.is_empty() && self.bottom.is_empty()
    }

    /// All entries in callback dispatch order: bottom, top, left, right.
    pub fn iter(&self) -> impl Iterator<Item = (Side, &Contact)> {
        self.bottom
            .iter()
            .map(|c| (Side::Bottom, c))
            .chain(self.top.iter().map(|c| (Side::Top, c)))
            .chain(self.left.iter().map(|c| (Side::Left, c)))
            .chain(self.right.iter().map(|c| (Side::Right, c)))
    }
}

/// Reaction invoked once per initial contact, on the entity that owns it.
pub type CollisionCallback =
    fn(this: Entity, other: Entity, ctx: &mut crate::systems::collision::CollisionContext<'_, '_, '_>);

/// Marks an entity as a participant in collision detection.
#[derive(Component, Clone)]
pub struct Collidable {
    pub group: CollisionGroup,
    /// Groups this entity tests against as the mover.
    pub collides_with: Vec<CollisionGroup>,
    /// Stationary entities are never pushed by collision resolution.
    pub stationary: bool,
    pub on_collision: Option<CollisionCallback>,
    /// Reserved; resolution does not read it.
    pub restitution: f32,
    pub(crate) contacts: ContactSet,
}

impl Collidable {
    pub fn new(group: CollisionGroup) -> Self {
        Self {
            group,
            collides_with: Vec::new(),
            stationary: false,
            on_collision: None,
            restitution: 0.0,
            contacts: ContactSet::default(),
        }
    }

    pub fn colliding_with(mut self, groups: impl IntoIterator<Item = CollisionGroup>) -> Self {
        self.collides_with = groups.into_iter().collect();
        self
    }

    pub fn stationary(mut self) -> Self {
        self.stationary = true;
        self
    }

    pub fn on_collision(mut self, callback: CollisionCallback) -> Self {
        self.on_collision = Some(callback);
        self
    }

    pub fn wants(&self, group: CollisionGroup) -> bool {
        self.collides_with.contains(&group)
    }

    /// Contacts recorded by the most recent collision pass.
    pub fn contacts(&self) -> &ContactSet {
        &self.contacts
    }

    pub fn is_grounded(&self) -> bool {
        self.contacts.is_touching(Side::Bottom)
    }
}

impl fmt::Debug for Collidable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collidable")
            .field("group", &self.group)
            .field("collides_with", &self.collides_with)
            .field("stationary", &self.stationary)
            .field("has_callback", &self.on_collision.is_some())
            .field("restitution", &self.restitution)
            .field("contacts", &self.contacts)
            .finish()
    }
}

// ============================================================================
// COMBAT COMPONENTS
// ============================================================================

/// Starting attributes; maxima are taken from the starting values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaseStats {
    pub strength: f32,
    pub dexterity: f32,
    pub intelligence: f32,
    pub hp: f32,
    pub mana: f32,
    pub speed: f32,
}

impl Default for BaseStats {
    fn default() -> Self {
        Self {
            strength: 1.0,
            dexterity: 1.0,
            intelligence: 1.0,
            hp: 100.0,
            mana: 100.0,
            speed: 1.0,
        }
    }
}

/// Character attributes.
///
/// `hp <= max_hp` and `mana <= max_mana` hold at assignment; damage is not
/// clamped, so `hp` can go negative to signal death.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub strength: f32,
    pub dexterity: f32,
    pub intelligence: f32,
    pub speed: f32,
    hp: f32,
    max_hp: f32,
    mana: f32,
    max_mana: f32,
}

impl Stats {
    pub fn new(base: BaseStats) -> Self {
        Self {
            strength: base.strength,
            dexterity: base.dexterity,
            intelligence: base.intelligence,
            speed: base.speed,
            hp: base.hp,
            max_hp: base.hp,
            mana: base.mana,
            max_mana: base.mana,
        }
    }

    pub fn hp(&self) -> f32 {
        self.hp
    }

    pub fn max_hp(&self) -> f32 {
        self.max_hp
    }

    pub fn mana(&self) -> f32 {
        self.mana
    }

    pub fn max_mana(&self) -> f32 {
        self.max_mana
    }

    pub fn set_hp(&mut self, hp: f32) {
        self.hp = hp.min(self.max_hp);
    }

    pub fn set_mana(&mut self, mana: f32) {
        self.mana = mana.min(self.max_mana);
    }

    pub fn take_damage(&mut self, points: f32) {
        self.hp -= points;
    }

    pub fn is_dead(&self) -> bool {
        self.hp <= 0.0
    }
}

impl Default for Stats {
    fn default() -> Self {
        Self::new(BaseStats::default())
    }
}

/// A pending hit, applied to [`Stats`] once `trigger_in_ms` runs out.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Damage {
    pub points: f32,
    pub hit_position: Position,
    pub hit_direction: Facing,
    pub trigger_in_ms: f32,
}

impl Damage {
    pub fn new(points: f32, hit_position: Position, hit_direction: Facing) -> Self {
        Self {
            points,
            hit_position,
            hit_direction,
            trigger_in_ms: 0.0,
        }
    }

    pub fn delayed(mut self, trigger_in_ms: f32) -> Self {
        self.trigger_in_ms = trigger_in_ms;
        self
    }
}

// ============================================================================
// LIFECYCLE COMPONENTS
// ============================================================================

/// Removes the entity from the world once `countdown_ms` reaches zero.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Delete {
    pub countdown_ms: f32,
}

impl Delete {
    /// Deleted on the next delete pass.
    pub fn immediate() -> Self {
        Self { countdown_ms: 0.0 }
    }

    pub fn after_ms(countdown_ms: f32) -> Self {
        Self { countdown_ms }
    }
}

// ============================================================================
// ACTION STATE COMPONENTS
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionState {
    #[default]
    NotInUse,
    InUse,
    Complete,
}

/// A timed action: accumulates time while in use and completes after
/// `complete_ms`. Actions with `complete_ms == None` never complete on
/// their own (looping animations such as walking).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionTimer {
    pub state: ActionState,
    pub duration_ms: f32,
    pub complete_ms: Option<f32>,
}

impl ActionTimer {
    pub fn completing_after(complete_ms: f32) -> Self {
        Self {
            complete_ms: Some(complete_ms),
            ..Default::default()
        }
    }

    pub fn looping() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        if self.state == ActionState::NotInUse {
            self.state = ActionState::InUse;
        }
    }

    pub fn reset(&mut self) {
        self.state = ActionState::NotInUse;
        self.duration_ms = 0.0;
    }

    pub fn advance(&mut self, dt_ms: f32) {
        if self.state == ActionState::InUse {
            self.duration_ms += dt_ms;
        }
        if let Some(complete_ms) = self.complete_ms {
            if self.state == ActionState::InUse && self.duration_ms >= complete_ms {
                self.state = ActionState::Complete;
            }
        }
    }

    pub fn is_in_use(&self) -> bool {
        self.state == ActionState::InUse
    }

    pub fn is_complete(&self) -> bool {
        self.state == ActionState::Complete
    }

    pub fn is_idle(&self) -> bool {
        self.state == ActionState::NotInUse
    }

    /// Resets the timer if it has completed.
    pub fn settle(&mut self) {
        if self.is_complete() {
            self.reset();
        }
    }
}

#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Weapon {
    #[default]
    Drawn,
    Holstered,
}

/// Player action timers.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct PlayerActions {
    pub walk: ActionTimer,
    pub sprint: ActionTimer,
    pub draw: ActionTimer,
    pub stow: ActionTimer,
    pub jump: ActionTimer,
    pub ascend: ActionTimer,
    pub descend: ActionTimer,
    pub crouch: ActionTimer,
    pub shoot: ActionTimer,
    pub butt_attack: ActionTimer,
}

impl PlayerActions {
    pub fn new(shoot_cooldown_ms: f32, butt_attack_cooldown_ms: f32) -> Self {
        Self {
            walk: ActionTimer::looping(),
            sprint: ActionTimer::looping(),
            draw: ActionTimer::completing_after(750.0),
            stow: ActionTimer::completing_after(750.0),
            jump: ActionTimer::completing_after(600.0),
            ascend: ActionTimer::looping(),
            descend: ActionTimer::looping(),
            crouch: ActionTimer::completing_after(1000.0),
            shoot: ActionTimer::completing_after(shoot_cooldown_ms),
            butt_attack: ActionTimer::completing_after(butt_attack_cooldown_ms),
        }
    }

    fn timers_mut(&mut self) -> [&mut ActionTimer; 10] {
        [
            &mut self.walk,
            &mut self.sprint,
            &mut self.draw,
            &mut self.stow,
            &mut self.jump,
            &mut self.ascend,
            &mut self.descend,
            &mut self.crouch,
            &mut self.shoot,
            &mut self.butt_attack,
        ]
    }

    pub fn advance(&mut self, dt_ms: f32) {
        for timer in self.timers_mut() {
            timer.advance(dt_ms);
        }
    }

    pub fn settle(&mut self) {
        for timer in self.timers_mut() {
            timer.settle();
        }
    }
}

impl Default for PlayerActions {
    fn default() -> Self {
        Self::new(250.0, 500.0)
    }
}

/// Zombie action timers.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct ZombieActions {
    pub stale: ActionTimer,
    pub walk: ActionTimer,
    pub die: ActionTimer,
}

impl Default for ZombieActions {
    fn default() -> Self {
        let mut stale = ActionTimer::looping();
        stale.start();
        Self {
            stale,
            walk: ActionTimer::looping(),
            die: ActionTimer::completing_after(1000.0),
        }
    }
}

/// Crawler action timers.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct CrawlerActions {
    pub stale: ActionTimer,
    pub walk: ActionTimer,
    pub die: ActionTimer,
    pub jump_attack: ActionTimer,
}

impl Default for CrawlerActions {
    fn default() -> Self {
        let mut stale = ActionTimer::looping();
        stale.start();
        Self {
            stale,
            walk: ActionTimer::looping(),
            die: ActionTimer::completing_after(1000.0),
            jump_attack: ActionTimer::looping(),
        }
    }
}

// ============================================================================
// BUNDLE HELPERS
// ============================================================================

/// Components every simulated entity carries.
#[derive(Bundle, Debug, Clone)]
pub struct Body {
    pub kind: Kind,
    pub position: Position,
    pub size: Size,
    pub velocity: Velocity,
    pub shape: HitboxShape,
}

impl Body {
    pub fn new(kind: Kind, position: Position, size: Size, shape: HitboxShape) -> Self {
        Self {
            kind,
            position,
            size,
            velocity: Velocity::default(),
            shape,
        }
    }

    pub fn with_velocity(mut self, velocity: Velocity) -> Self {
        self.velocity = velocity;
        self
    }
}
