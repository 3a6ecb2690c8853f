//! Player controller.
//!
//! Turns the host's translated input ([`PlayerInput`]) into velocity,
//! facing and action-timer changes, and spawns the player's attacks.
//! Raw key handling lives in the host; this system only sees intents.

use crate::archetypes::{self, GROUND_CRUMBLE_SIZE, GUN_BULLET_SIZE};
use crate::components::*;
use crate::config::SimConfig;
use crate::systems::movement::DeltaTime;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const WALK_SPEED: f32 = 250.0;
pub const SPRINT_SPEED: f32 = 500.0;
/// Upward speed once the jump wind-up completes.
pub const JUMP_SPEED: f32 = 600.0;
/// Horizontal drift of a jump, in the facing direction.
pub const JUMP_DRIFT: f32 = 200.0;
/// Bullets leave the barrel this far up the body, as a share of its height.
const MUZZLE_HEIGHT: f32 = 0.6;

/// A translated input intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerAction {
    WalkLeft,
    WalkRight,
    SprintLeft,
    SprintRight,
    Crouch,
    Jump,
    Leap,
    DrawWeapon,
    StowWeapon,
    Shoot,
    ButtAttack,
}

/// The set of intents held this tick.
#[derive(Resource, Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerInput {
    actions: HashSet<PlayerAction>,
}

impl PlayerInput {
    pub fn new(actions: impl IntoIterator<Item = PlayerAction>) -> Self {
        Self {
            actions: actions.into_iter().collect(),
        }
    }

    pub fn press(&mut self, action: PlayerAction) {
        self.actions.insert(action);
    }

    pub fn release(&mut self, action: PlayerAction) {
        self.actions.remove(&action);
    }

    pub fn clear(&mut self) {
        self.actions.clear();
    }

    pub fn has(&self, action: PlayerAction) -> bool {
        self.actions.contains(&action)
    }

    fn any(&self, actions: &[PlayerAction]) -> bool {
        actions.iter().any(|a| self.has(*a))
    }
}

const WALK_ACTIONS: [PlayerAction; 2] = [PlayerAction::WalkLeft, PlayerAction::WalkRight];
const SPRINT_ACTIONS: [PlayerAction; 2] = [PlayerAction::SprintLeft, PlayerAction::SprintRight];

/// Applies the current [`PlayerInput`] to every player.
///
/// Per player, in order:
/// 1. advance action timers
/// 2. drop actions whose input was released; stop when grounded and idle
/// 3. resolve completed wind-ups (jump launch, weapon drawn)
/// 4. start new actions; movement, jumps and weapon changes need ground
/// 5. reset completed timers
pub fn player_system(
    mut commands: Commands,
    dt: Res<DeltaTime>,
    input: Option<Res<PlayerInput>>,
    config: Option<Res<SimConfig>>,
    mut players: Query<(
        Entity,
        &Position,
        &Size,
        Option<&HitboxShape>,
        &mut Velocity,
        &mut Facing,
        &mut PlayerActions,
        &mut Weapon,
        Option<&Collidable>,
    )>,
) {
    let no_input = PlayerInput::default();
    let input = input.as_deref().unwrap_or(&no_input);
    let config = config.as_deref().cloned().unwrap_or_default();

    for (entity, position, size, shape, mut velocity, mut facing, mut actions, mut weapon, collidable) in
        players.iter_mut()
    {
        actions.advance(dt.millis());
        let grounded = collidable.is_some_and(Collidable::is_grounded);

        // Released inputs
        let moving = input.any(&WALK_ACTIONS) || input.any(&SPRINT_ACTIONS);
        if !moving && grounded {
            velocity.vx = 0.0;
        }
        if !input.any(&WALK_ACTIONS) {
            actions.walk.reset();
        }
        if !input.any(&SPRINT_ACTIONS) {
            actions.sprint.reset();
        }
        if !input.has(PlayerAction::Crouch) {
            actions.crouch.reset();
        }

        // Airborne state
        if grounded {
            actions.ascend.reset();
            actions.descend.reset();
            if velocity.vy > 0.0 {
                velocity.vy = 0.0;
            }
        } else if velocity.vy > 0.0 {
            actions.ascend.reset();
            actions.descend.start();
        }

        if actions.jump.is_complete() {
            velocity.vy = -JUMP_SPEED;
            velocity.vx = facing.sign() * JUMP_DRIFT;
            actions.ascend.start();
            log::trace!("{entity:?} jumps {:?}", *facing);
        }
        if actions.draw.is_complete() {
            *weapon = Weapon::Drawn;
        }

        // New actions
        if grounded {
            for (action, direction, sprint) in [
                (PlayerAction::WalkLeft, Facing::Left, false),
                (PlayerAction::SprintLeft, Facing::Left, true),
                (PlayerAction::WalkRight, Facing::Right, false),
                (PlayerAction::SprintRight, Facing::Right, true),
            ] {
                if !input.has(action) {
                    continue;
                }
                *facing = direction;
                if sprint {
                    velocity.vx = direction.sign() * SPRINT_SPEED;
                    actions.sprint.start();
                } else {
                    velocity.vx = direction.sign() * WALK_SPEED;
                    actions.walk.start();
                }
            }

            if input.has(PlayerAction::Jump) || input.has(PlayerAction::Leap) {
                actions.jump.start();
            }
            if input.has(PlayerAction::Crouch) {
                actions.crouch.start();
            }
            if input.has(PlayerAction::DrawWeapon) {
                actions.draw.start();
            }
            if input.has(PlayerAction::StowWeapon) {
                actions.stow.start();
                *weapon = Weapon::Holstered;
            }
        }

        let hitbox = shape.copied().unwrap_or_default().hitbox(position, size);

        if input.has(PlayerAction::Shoot) && *weapon == Weapon::Drawn && actions.shoot.is_idle() {
            actions.shoot.start();
            let x = match *facing {
                Facing::Left => hitbox.x - GUN_BULLET_SIZE.width,
                Facing::Right => hitbox.right(),
            };
            let muzzle = Position::new(x, position.y - size.height * MUZZLE_HEIGHT);
            commands.spawn(archetypes::gun_bullet(muzzle, *facing, &config));
            log::debug!("{entity:?} fires {:?}", *facing);
        }

        if input.has(PlayerAction::ButtAttack) && grounded && actions.butt_attack.is_idle() {
            actions.butt_attack.start();
            let (center_x, _) = hitbox.center();
            let reach = hitbox.width * 0.5 + GROUND_CRUMBLE_SIZE.width * 0.5;
            let origin = Position::new(center_x + facing.sign() * reach, hitbox.bottom());
            commands.spawn(archetypes::ground_crumble_attack(origin, *facing, &config));
            log::debug!("{entity:?} butt attacks {:?}", *facing);
        }

        actions.settle();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(grounded: bool) -> (World, Schedule, Entity) {
        let mut world = World::new();
        world.insert_resource(DeltaTime(0.1));
        world.init_resource::<PlayerInput>();
        let config = SimConfig::default();
        let player = world.spawn(archetypes::player(Position::new(500.0, 300.0), &config)).id();
        if grounded {
            let floor = world.spawn_empty().id();
            let mut collidable = world.get_mut::<Collidable>(player).unwrap();
            collidable.contacts.push(Side::Bottom, Contact { entity: floor, initial: false });
        }
        let mut schedule = Schedule::default();
        schedule.add_systems(player_system);
        (world, schedule, player)
    }

    fn hold(world: &mut World, actions: &[PlayerAction]) {
        world.insert_resource(PlayerInput::new(actions.iter().copied()));
    }

    fn velocity(world: &World, player: Entity) -> Velocity {
        *world.get::<Velocity>(player).unwrap()
    }

    fn count(world: &mut World, kind: Kind) -> usize {
        let mut query = world.query::<&Kind>();
        query.iter(world).filter(|k| **k == kind).count()
    }

    #[test]
    fn test_walking_and_sprinting_need_ground() {
        let (mut world, mut schedule, player) = setup(true);
        hold(&mut world, &[PlayerAction::WalkRight]);
        schedule.run(&mut world);
        assert_eq!(velocity(&world, player).vx, WALK_SPEED);
        assert_eq!(world.get::<Facing>(player), Some(&Facing::Right));
        assert!(world.get::<PlayerActions>(player).unwrap().walk.is_in_use());

        hold(&mut world, &[PlayerAction::SprintLeft]);
        schedule.run(&mut world);
        assert_eq!(velocity(&world, player).vx, -SPRINT_SPEED);
        let actions = world.get::<PlayerActions>(player).unwrap();
        assert!(actions.sprint.is_in_use());
        assert!(actions.walk.is_idle());

        let (mut world, mut schedule, player) = setup(false);
        hold(&mut world, &[PlayerAction::WalkRight]);
        schedule.run(&mut world);
        assert_eq!(velocity(&world, player).vx, 0.0);
        assert_eq!(world.get::<Facing>(player), Some(&Facing::Left));
    }

    #[test]
    fn test_grounded_player_stops_without_movement_input() {
        let (mut world, mut schedule, player) = setup(true);
        world.entity_mut(player).insert(Velocity::new(250.0, 40.0));
        schedule.run(&mut world);
        assert_eq!(velocity(&world, player), Velocity::new(0.0, 0.0));
    }

    #[test]
    fn test_airborne_player_keeps_momentum() {
        let (mut world, mut schedule, player) = setup(false);
        world.entity_mut(player).insert(Velocity::new(250.0, 40.0));
        schedule.run(&mut world);
        assert_eq!(velocity(&world, player), Velocity::new(250.0, 40.0));
        assert!(world.get::<PlayerActions>(player).unwrap().descend.is_in_use());
    }

    #[test]
    fn test_jump_launches_after_wind_up() {
        let (mut world, mut schedule, player) = setup(true);
        hold(&mut world, &[PlayerAction::Jump]);
        schedule.run(&mut world);
        assert!(world.get::<PlayerActions>(player).unwrap().jump.is_in_use());

        hold(&mut world, &[]);
        for _ in 0..5 {
            schedule.run(&mut world);
            assert_eq!(velocity(&world, player).vy, 0.0);
        }

        schedule.run(&mut world);
        assert_eq!(velocity(&world, player), Velocity::new(-JUMP_DRIFT, -JUMP_SPEED));
        let actions = world.get::<PlayerActions>(player).unwrap();
        assert!(actions.ascend.is_in_use());
        assert!(actions.jump.is_idle());
    }

    #[test]
    fn test_shooting_spawns_bullets_with_cooldown() {
        let (mut world, mut schedule, _) = setup(false);
        hold(&mut world, &[PlayerAction::Shoot]);

        // 250 ms cooldown at 100 ms ticks: fires on ticks 1 and 5.
        for _ in 0..5 {
            schedule.run(&mut world);
        }
        assert_eq!(count(&mut world, Kind::GunBullet), 2);

        let mut bullets = world.query::<(&Kind, &Position, &Velocity)>();
        for (kind, position, velocity) in bullets.iter(&world) {
            if *kind != Kind::GunBullet {
                continue;
            }
            // Facing left: just past the hitbox's left edge, 60% up the body.
            assert_eq!(position.x, 475.0 - GUN_BULLET_SIZE.width);
            assert_eq!(position.y, 300.0 - 140.0 * MUZZLE_HEIGHT);
            assert_eq!(velocity.vx, -SimConfig::default().bullet_speed);
        }
    }

    #[test]
    fn test_holstered_weapon_cannot_fire() {
        let (mut world, mut schedule, player) = setup(true);
        hold(&mut world, &[PlayerAction::StowWeapon]);
        schedule.run(&mut world);
        assert_eq!(world.get::<Weapon>(player), Some(&Weapon::Holstered));

        hold(&mut world, &[PlayerAction::Shoot]);
        schedule.run(&mut world);
        assert_eq!(count(&mut world, Kind::GunBullet), 0);
    }

    #[test]
    fn test_drawing_takes_time() {
        let (mut world, mut schedule, player) = setup(true);
        world.entity_mut(player).insert(Weapon::Holstered);
        hold(&mut world, &[PlayerAction::DrawWeapon]);
        schedule.run(&mut world);
        hold(&mut world, &[]);
        for _ in 0..7 {
            schedule.run(&mut world);
        }
        assert_eq!(world.get::<Weapon>(player), Some(&Weapon::Holstered));
        schedule.run(&mut world);
        assert_eq!(world.get::<Weapon>(player), Some(&Weapon::Drawn));
    }

    #[test]
    fn test_butt_attack_spawns_crumble_in_front() {
        let (mut world, mut schedule, player) = setup(true);
        world.entity_mut(player).insert(Facing::Right);
        hold(&mut world, &[PlayerAction::ButtAttack]);
        schedule.run(&mut world);

        let mut crumbles = world.query::<(&Kind, &Position, &Facing)>();
        let spawned: Vec<_> = crumbles
            .iter(&world)
            .filter(|(kind, ..)| **kind == Kind::GroundCrumbleAttack)
            .map(|(_, position, facing)| (*position, *facing))
            .collect();
        assert_eq!(spawned, vec![(Position::new(500.0 + 25.0 + 125.0, 300.0), Facing::Right)]);
    }

    #[test]
    fn test_butt_attack_needs_ground() {
        let (mut world, mut schedule, _) = setup(false);
        hold(&mut world, &[PlayerAction::ButtAttack]);
        schedule.run(&mut world);
        assert_eq!(count(&mut world, Kind::GroundCrumbleAttack), 0);
    }
}
