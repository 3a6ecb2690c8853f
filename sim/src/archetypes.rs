//! Entity archetypes: the component sets each kind of game object is built
//! from, plus the collision reactions of the player's attacks.
//!
//! Every factory returns a plain bundle; callers spawn it through
//! `SimWorld::spawn`, `World::spawn` or `Commands::spawn`.

use crate::components::*;
use crate::config::SimConfig;
use crate::systems::collision::CollisionContext;
use bevy_ecs::prelude::*;

pub const PLAYER_SIZE: Size = Size { width: 100.0, height: 140.0 };
pub const ZOMBIE_SIZE: Size = Size { width: 140.0, height: 140.0 };
pub const CRAWLER_SIZE: Size = Size { width: 140.0, height: 70.0 };
pub const GUN_BULLET_SIZE: Size = Size { width: 10.0, height: 5.0 };
pub const GROUND_CRUMBLE_SIZE: Size = Size { width: 250.0, height: 50.0 };
/// Sprite frame (46×35) scaled by 2.1.
pub const BLOOD_SPLATTER_SIZE: Size = Size { width: 46.0 * 2.1, height: 35.0 * 2.1 };

/// Knock-up speed of a ground crumble hit.
pub const CRUMBLE_KNOCK_UP: f32 = -200.0;
/// Horizontal knock-back speed of a ground crumble hit.
pub const CRUMBLE_KNOCK_BACK: f32 = 500.0;

/// Immovable level geometry.
pub fn wall(x: f32, y: f32, width: f32, height: f32) -> impl Bundle {
    (
        Body::new(Kind::Wall, Position::new(x, y), Size::new(width, height), HitboxShape::Bounds),
        Collidable::new(CollisionGroup::Wall).stationary(),
    )
}

/// The player character; `position` is its feet.
pub fn player(position: Position, config: &SimConfig) -> impl Bundle {
    (
        Body::new(Kind::Player, position, PLAYER_SIZE, HitboxShape::Footed { width_ratio: 0.5 }),
        Gravitational::new(config.gravity),
        Collidable::new(CollisionGroup::Player).colliding_with([CollisionGroup::Wall]),
        PlayerActions::new(config.shoot_cooldown_ms, config.butt_attack_cooldown_ms),
        Weapon::Drawn,
        Facing::Left,
    )
}

pub fn zombie(position: Position, config: &SimConfig) -> impl Bundle {
    (
        Body::new(Kind::Zombie, position, ZOMBIE_SIZE, HitboxShape::Footed { width_ratio: 0.2 }),
        Gravitational::new(config.gravity),
        Collidable::new(CollisionGroup::Mob).colliding_with([CollisionGroup::Wall]),
        Stats::new(BaseStats::default()),
        ZombieActions::default(),
        Facing::Left,
    )
}

pub fn crawler(position: Position, config: &SimConfig) -> impl Bundle {
    (
        Body::new(Kind::Crawler, position, CRAWLER_SIZE, HitboxShape::Footed { width_ratio: 0.5 }),
        Gravitational::new(config.gravity),
        Collidable::new(CollisionGroup::Mob).colliding_with([CollisionGroup::Wall]),
        Stats::new(BaseStats::default()),
        CrawlerActions::default(),
        Facing::Left,
    )
}

/// A bullet flying in `direction`. `position` is its top-left corner.
pub fn gun_bullet(position: Position, direction: Facing, config: &SimConfig) -> impl Bundle {
    (
        Body::new(Kind::GunBullet, position, GUN_BULLET_SIZE, HitboxShape::Bounds)
            .with_velocity(Velocity::new(direction.sign() * config.bullet_speed, 0.0)),
        Collidable::new(CollisionGroup::PlayerAttack)
            .colliding_with([CollisionGroup::Mob])
            .stationary()
            .on_collision(gun_bullet_hit),
        Delete::after_ms(config.bullet_lifetime_ms),
        direction,
    )
}

/// Shockwave of a butt attack. `position` is its bottom-centre.
pub fn ground_crumble_attack(position: Position, direction: Facing, config: &SimConfig) -> impl Bundle {
    (
        Body::new(
            Kind::GroundCrumbleAttack,
            position,
            GROUND_CRUMBLE_SIZE,
            HitboxShape::Footed { width_ratio: 1.0 },
        ),
        Collidable::new(CollisionGroup::PlayerAttack)
            .colliding_with([CollisionGroup::Mob])
            .stationary()
            .on_collision(ground_crumble_hit),
        Delete::after_ms(config.crumble_duration_ms),
        direction,
    )
}

/// Purely visual; removed after `duration_ms`.
pub fn blood_splatter(position: Position, direction: Facing, duration_ms: f32) -> impl Bundle {
    (
        Body::new(Kind::BloodSplatter, position, BLOOD_SPLATTER_SIZE, HitboxShape::Bounds),
        Delete::after_ms(duration_ms),
        direction,
    )
}

/// A bullet hit: the bullet goes away, the target takes damage and bleeds.
///
/// The hit lands one target-width past the bullet's leading edge, on the
/// side it was travelling toward.
pub fn gun_bullet_hit(this: Entity, other: Entity, ctx: &mut CollisionContext) {
    let bullet = ctx.hitbox(this);
    let target = ctx.hitbox(other);
    let direction = if ctx.velocity(this).vx <= 0.0 {
        Facing::Left
    } else {
        Facing::Right
    };

    let origin_x = match direction {
        Facing::Left => bullet.x,
        Facing::Right => bullet.right(),
    };
    let hit_position = Position::new(origin_x + direction.sign() * target.width, bullet.y);

    let damage = Damage::new(ctx.config().bullet_damage, hit_position, direction);
    let splatter = blood_splatter(hit_position, direction, ctx.config().splatter_duration_ms);

    let commands = ctx.commands();
    commands.entity(this).try_insert(Delete::immediate());
    commands.entity(other).try_insert(damage);
    commands.spawn(splatter);

    log::debug!("bullet {this:?} hit {other:?} at ({}, {})", hit_position.x, hit_position.y);
}

/// A ground crumble hit: the target is thrown up and away from the centre
/// of the shockwave and takes damage where it stands.
pub fn ground_crumble_hit(this: Entity, other: Entity, ctx: &mut CollisionContext) {
    let (attack_center, _) = ctx.hitbox(this).center();
    let (target_center, _) = ctx.hitbox(other).center();

    let mut velocity = ctx.velocity(other);
    velocity.vy = CRUMBLE_KNOCK_UP;

    let mut direction = Facing::Left;
    if attack_center < target_center {
        velocity.vx = CRUMBLE_KNOCK_BACK;
        direction = Facing::Right;
    } else if attack_center > target_center {
        velocity.vx = -CRUMBLE_KNOCK_BACK;
    }
    ctx.set_velocity(other, velocity);

    let damage = Damage::new(ctx.config().crumble_damage, ctx.position(other), direction);
    ctx.commands().entity(other).try_insert(damage);

    log::debug!("ground crumble {this:?} hit {other:?} toward the {direction:?}");
}
