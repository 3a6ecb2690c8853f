//! Collision system - AABB detection, resolution and contact tracking.
//!
//! Each pass runs in four phases over the collidable entities, in spawn
//! order:
//!
//! 1. **Fresh frame** - an empty [`ContactSet`] is allocated per entity.
//!    Nothing written during the scan is visible to the scan itself; the
//!    previous tick's lists stay on the components until phase 3.
//! 2. **Pairwise scan** - every ordered pair `(entity1, entity2)` where
//!    `entity2` collides with `entity1`'s group. Overlapping pairs are
//!    classified by [`contact_side`], recorded on both frames, and
//!    `entity2` is snapped edge-adjacent unless it is stationary.
//! 3. **Swap** - each entity's four lists are replaced wholesale by its
//!    frame.
//! 4. **Dispatch** - every entry flagged `initial` invokes its owner's
//!    [`CollisionCallback`] once. Callbacks act through
//!    [`CollisionContext`]; anything they spawn or attach is deferred to
//!    the end of the pipeline pass.
//!
//! ## Complexity
//!
//! O(n²) over collidables. Levels hold tens of collidables, so there is no
//! broad phase; corrections made early in the scan are seen by later pairs,
//! which makes the result depend on spawn order.

use crate::components::*;
use crate::config::SimConfig;
use bevy_ecs::prelude::*;
use std::collections::HashMap;

/// Query used by the collision pass and handed to callbacks.
pub type BodyQuery<'w, 's> = Query<
    'w,
    's,
    (
        Entity,
        &'static mut Position,
        &'static Size,
        &'static mut Velocity,
        Option<&'static HitboxShape>,
        &'static mut Collidable,
        Option<&'static SpawnOrder>,
    ),
>;

/// Classifies an overlap from `entity1`'s point of view.
///
/// Returns the side of `entity1` on which `entity2` lies, or `None` when
/// the boxes are apart. Touching edges count as overlap. The axis is picked
/// by comparing center offsets normalised by `entity1`'s own dimensions;
/// the comparison is strict, so equal ratios resolve vertically.
pub fn contact_side(hitbox1: &Rect, hitbox2: &Rect) -> Option<Side> {
    let (cx1, cy1) = hitbox1.center();
    let (cx2, cy2) = hitbox2.center();

    let dx = cx2 - cx1;
    let dy = cy2 - cy1;
    let aw = (hitbox2.width + hitbox1.width) * 0.5;
    let ah = (hitbox2.height + hitbox1.height) * 0.5;

    if dx.abs() > aw || dy.abs() > ah {
        return None;
    }

    let side = if (dx / hitbox1.width).abs() > (dy / hitbox1.height).abs() {
        if dx < 0.0 {
            Side::Left
        } else {
            Side::Right
        }
    } else if dy < 0.0 {
        Side::Top
    } else {
        Side::Bottom
    };
    Some(side)
}

/// Offset that makes `hitbox2` edge-adjacent to `hitbox1` on `side`.
pub fn correction(side: Side, hitbox1: &Rect, hitbox2: &Rect) -> (f32, f32) {
    match side {
        Side::Left => (hitbox1.x - hitbox2.x - hitbox2.width, 0.0),
        Side::Right => (hitbox1.x - hitbox2.x + hitbox1.width, 0.0),
        Side::Top => (0.0, hitbox1.y - hitbox2.height - hitbox2.y),
        Side::Bottom => (0.0, hitbox1.y + hitbox1.height - hitbox2.y),
    }
}

/// What a [`CollisionCallback`] may touch.
///
/// Reads and velocity writes go straight to the colliding bodies; spawns,
/// inserts and removals go through [`Commands`] and land after the pass.
/// No callback can trigger another collision scan in the same tick.
pub struct CollisionContext<'a, 'w, 's> {
    commands: Commands<'w, 's>,
    bodies: BodyQuery<'w, 's>,
    config: &'a SimConfig,
}

impl<'a, 'w, 's> CollisionContext<'a, 'w, 's> {
    pub fn commands(&mut self) -> &mut Commands<'w, 's> {
        &mut self.commands
    }

    pub fn config(&self) -> &SimConfig {
        self.config
    }

    pub fn hitbox(&self, entity: Entity) -> Rect {
        hitbox_of(&self.bodies, entity)
    }

    pub fn position(&self, entity: Entity) -> Position {
        match self.bodies.get(entity) {
            Ok((_, position, ..)) => *position,
            Err(err) => panic!("collision callback asked for a non-collidable entity: {err}"),
        }
    }

    pub fn velocity(&self, entity: Entity) -> Velocity {
        match self.bodies.get(entity) {
            Ok((_, _, _, velocity, ..)) => *velocity,
            Err(err) => panic!("collision callback asked for a non-collidable entity: {err}"),
        }
    }

    pub fn set_velocity(&mut self, entity: Entity, velocity: Velocity) {
        match self.bodies.get_mut(entity) {
            Ok((_, _, _, mut current, ..)) => *current = velocity,
            Err(err) => panic!("collision callback asked for a non-collidable entity: {err}"),
        }
    }
}

fn hitbox_of(bodies: &BodyQuery<'_, '_>, entity: Entity) -> Rect {
    match bodies.get(entity) {
        Ok((_, position, size, _, shape, ..)) => shape.copied().unwrap_or_default().hitbox(position, size),
        Err(err) => panic!("collision pass lost track of {entity:?}: {err}"),
    }
}

fn collidable_of<'q>(bodies: &'q BodyQuery<'_, '_>, entity: Entity) -> &'q Collidable {
    match bodies.get(entity) {
        Ok((.., collidable, _)) => collidable,
        Err(err) => panic!("collision pass lost track of {entity:?}: {err}"),
    }
}

fn frame_of(frame: &mut HashMap<Entity, ContactSet>, entity: Entity) -> &mut ContactSet {
    match frame.get_mut(&entity) {
        Some(contacts) => contacts,
        None => panic!("collision frame has no entry for {entity:?}; the fresh frame was not built"),
    }
}

/// Detects and resolves overlaps between collidable entities.
pub fn collision_system(commands: Commands, config: Option<Res<SimConfig>>, mut bodies: BodyQuery) {
    let mut ordered: Vec<(u64, Entity)> = bodies
        .iter()
        .map(|(entity, .., order)| (order.map_or(u64::MAX, |o| o.0), entity))
        .collect();
    ordered.sort_unstable();
    let entities: Vec<Entity> = ordered.into_iter().map(|(_, entity)| entity).collect();

    let mut frame: HashMap<Entity, ContactSet> =
        entities.iter().map(|&entity| (entity, ContactSet::default())).collect();

    for &entity1 in &entities {
        for &entity2 in &entities {
            if entity1 == entity2 {
                continue;
            }

            let collidable1 = collidable_of(&bodies, entity1);
            let collidable2 = collidable_of(&bodies, entity2);
            if !collidable2.wants(collidable1.group) {
                continue;
            }

            let hitbox1 = hitbox_of(&bodies, entity1);
            let hitbox2 = hitbox_of(&bodies, entity2);
            let Some(side) = contact_side(&hitbox1, &hitbox2) else {
                continue;
            };

            // Last tick's lists decide whether this contact is new.
            let initial1 = !collidable1.contacts().touches(side, entity2);
            let initial2 = !collidable2.contacts().touches(side.opposite(), entity1);
            let stationary2 = collidable2.stationary;

            frame_of(&mut frame, entity1).push(side, Contact { entity: entity2, initial: initial1 });
            frame_of(&mut frame, entity2).push(side.opposite(), Contact { entity: entity1, initial: initial2 });

            if initial1 || initial2 {
                log::trace!("{entity1:?} touches {entity2:?} on its {side:?} side");
            }

            if stationary2 {
                continue;
            }

            let (dx, dy) = correction(side, &hitbox1, &hitbox2);
            if let Ok((_, mut position, ..)) = bodies.get_mut(entity2) {
                position.x += dx;
                position.y += dy;
            }
        }
    }

    let mut reactions: Vec<(Entity, Entity, CollisionCallback)> = Vec::new();
    for &entity in &entities {
        let contacts = frame.remove(&entity).unwrap_or_else(|| {
            panic!("collision frame has no entry for {entity:?}; the fresh frame was not built")
        });
        let Ok((.., mut collidable, _)) = bodies.get_mut(entity) else {
            panic!("collision pass lost track of {entity:?}");
        };
        collidable.contacts = contacts;

        if let Some(callback) = collidable.on_collision {
            reactions.extend(
                collidable
                    .contacts
                    .iter()
                    .filter(|(_, contact)| contact.initial)
                    .map(|(_, contact)| (entity, contact.entity, callback)),
            );
        }
    }

    if reactions.is_empty() {
        return;
    }

    let fallback;
    let config = match config.as_deref() {
        Some(config) => config,
        None => {
            fallback = SimConfig::default();
            &fallback
        }
    };
    let mut ctx = CollisionContext {
        commands,
        bodies,
        config,
    };
    for (this, other, callback) in reactions {
        callback(this, other, &mut ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systems::movement::{movement_system, DeltaTime};

    #[derive(Resource, Default)]
    struct Hits(Vec<(Entity, Entity)>);

    fn record_hit(this: Entity, other: Entity, ctx: &mut CollisionContext) {
        ctx.commands().queue(move |world: &mut World| {
            world.resource_mut::<Hits>().0.push((this, other));
        });
    }

    fn body(x: f32, y: f32, width: f32, height: f32) -> (Position, Size, Velocity, HitboxShape) {
        (Position::new(x, y), Size::new(width, height), Velocity::default(), HitboxShape::Bounds)
    }

    fn mover() -> Collidable {
        Collidable::new(CollisionGroup::Player)
            .colliding_with([CollisionGroup::Wall])
            .on_collision(record_hit)
    }

    fn wall() -> Collidable {
        Collidable::new(CollisionGroup::Wall).stationary()
    }

    fn setup() -> (World, Schedule) {
        let mut world = World::new();
        world.insert_resource(DeltaTime(0.016));
        world.init_resource::<Hits>();
        let mut schedule = Schedule::default();
        schedule.add_systems((movement_system, collision_system).chain());
        (world, schedule)
    }

    fn hitbox(world: &World, entity: Entity) -> Rect {
        let position = world.get::<Position>(entity).copied().unwrap_or_default();
        let size = world.get::<Size>(entity).copied().unwrap_or_default();
        HitboxShape::Bounds.hitbox(&position, &size)
    }

    fn contacts(world: &World, entity: Entity) -> ContactSet {
        world
            .get::<Collidable>(entity)
            .map(|c| c.contacts().clone())
            .unwrap_or_default()
    }

    #[test]
    fn test_contact_side_classification() {
        let base = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert_eq!(contact_side(&base, &Rect::new(-90.0, 10.0, 100.0, 80.0)), Some(Side::Left));
        assert_eq!(contact_side(&base, &Rect::new(90.0, 10.0, 100.0, 80.0)), Some(Side::Right));
        assert_eq!(contact_side(&base, &Rect::new(10.0, -90.0, 80.0, 100.0)), Some(Side::Top));
        assert_eq!(contact_side(&base, &Rect::new(10.0, 90.0, 80.0, 100.0)), Some(Side::Bottom));
        assert_eq!(contact_side(&base, &Rect::new(201.0, 0.0, 100.0, 100.0)), None);
    }

    #[test]
    fn test_touching_edges_count_as_contact() {
        let base = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert_eq!(contact_side(&base, &Rect::new(0.0, 100.0, 100.0, 100.0)), Some(Side::Bottom));
    }

    #[test]
    fn test_equal_ratios_resolve_vertically() {
        // Diagonal corner overlap: |dx / w1| == |dy / h1|.
        let base = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert_eq!(contact_side(&base, &Rect::new(50.0, 50.0, 100.0, 100.0)), Some(Side::Bottom));
        assert_eq!(contact_side(&base, &Rect::new(-50.0, -50.0, 100.0, 100.0)), Some(Side::Top));
    }

    #[test]
    fn test_ratio_uses_first_entity_dimensions_only() {
        // Wide first box: a large horizontal offset still reads as vertical.
        let wide = Rect::new(0.0, 0.0, 400.0, 20.0);
        let small = Rect::new(300.0, -15.0, 20.0, 20.0);
        assert_eq!(contact_side(&wide, &small), Some(Side::Top));
        // Swapping the roles flips the classification to horizontal.
        assert_eq!(contact_side(&small, &wide), Some(Side::Left));
    }

    #[test]
    fn test_falling_mover_lands_flush_on_wall() {
        let (mut world, mut schedule) = setup();
        let a = world.spawn((body(100.0, 100.0, 20.0, 20.0), mover(), SpawnOrder(1))).id();
        world.entity_mut(a).insert(Velocity::new(0.0, 500.0));
        let b = world.spawn((body(0.0, 120.0, 100.0, 20.0), wall(), SpawnOrder(0))).id();

        schedule.run(&mut world);

        let hitbox_a = hitbox(&world, a);
        let hitbox_b = hitbox(&world, b);
        assert_eq!(hitbox_a.bottom(), hitbox_b.y);
        assert_eq!(world.get::<Position>(b), Some(&Position::new(0.0, 120.0)));

        let landed = contacts(&world, a);
        assert_eq!(landed.bottom, vec![Contact { entity: b, initial: true }]);
        assert_eq!(contacts(&world, b).top, vec![Contact { entity: a, initial: true }]);

        // Resolution never touches velocity.
        assert_eq!(world.get::<Velocity>(a), Some(&Velocity::new(0.0, 500.0)));
    }

    #[test]
    fn test_approach_over_several_ticks() {
        let (mut world, mut schedule) = setup();
        let a = world.spawn((body(100.0, 50.0, 20.0, 20.0), mover(), SpawnOrder(1))).id();
        world.entity_mut(a).insert(Velocity::new(0.0, 500.0));
        let b = world.spawn((body(0.0, 120.0, 100.0, 20.0), wall(), SpawnOrder(0))).id();

        let mut landed_on = None;
        for tick in 0..10 {
            schedule.run(&mut world);
            if contacts(&world, a).is_touching(Side::Bottom) {
                landed_on = Some(tick);
                break;
            }
        }

        assert_eq!(landed_on, Some(6));
        assert_eq!(hitbox(&world, a).bottom(), 120.0);
        assert_eq!(contacts(&world, a).bottom, vec![Contact { entity: b, initial: true }]);
        assert_eq!(world.resource::<Hits>().0, vec![(a, b)]);
    }

    #[test]
    fn test_initial_contact_fires_once_while_resting() {
        let (mut world, mut schedule) = setup();
        let a = world.spawn((body(40.0, 100.0, 20.0, 20.0), mover(), SpawnOrder(1))).id();
        world.entity_mut(a).insert(Velocity::new(0.0, 100.0));
        let b = world.spawn((body(0.0, 120.0, 100.0, 20.0), wall(), SpawnOrder(0))).id();

        for _ in 0..20 {
            schedule.run(&mut world);
            assert!(contacts(&world, a).touches(Side::Bottom, b));
        }

        assert_eq!(world.resource::<Hits>().0, vec![(a, b)]);
        assert!(!contacts(&world, a).has_initial(Side::Bottom));
    }

    #[test]
    fn test_recontact_after_separation_fires_again() {
        let (mut world, mut schedule) = setup();
        let a = world.spawn((body(40.0, 100.0, 20.0, 20.0), mover(), SpawnOrder(1))).id();
        world.entity_mut(a).insert(Velocity::new(0.0, 100.0));
        world.spawn((body(0.0, 120.0, 100.0, 20.0), wall(), SpawnOrder(0)));

        schedule.run(&mut world);
        schedule.run(&mut world);
        assert_eq!(world.resource::<Hits>().0.len(), 1);

        // Lift the mover clear of the wall for a tick.
        world.entity_mut(a).insert((Position::new(40.0, 20.0), Velocity::default()));
        schedule.run(&mut world);
        assert!(contacts(&world, a).is_empty());

        world.entity_mut(a).insert(Velocity::new(0.0, 5625.0));
        schedule.run(&mut world);
        assert!(contacts(&world, a).has_initial(Side::Bottom));
        assert_eq!(world.resource::<Hits>().0.len(), 2);
    }

    #[test]
    fn test_stationary_entity_never_moves() {
        let (mut world, mut schedule) = setup();
        let b = world.spawn((body(0.0, 100.0, 200.0, 40.0), wall(), SpawnOrder(0))).id();
        for (i, x) in [10.0, 60.0, 110.0, 160.0].into_iter().enumerate() {
            world.spawn((body(x, 90.0, 30.0, 30.0), mover(), SpawnOrder(i as u64 + 1)));
        }

        for _ in 0..5 {
            schedule.run(&mut world);
            assert_eq!(world.get::<Position>(b), Some(&Position::new(0.0, 100.0)));
        }
        assert_eq!(contacts(&world, b).top.len(), 4);
    }

    #[test]
    fn test_no_interpenetration_after_resolution() {
        let (mut world, mut schedule) = setup();
        let floor = world.spawn((body(0.0, 200.0, 500.0, 50.0), wall(), SpawnOrder(0))).id();
        let side_wall = world.spawn((body(300.0, 0.0, 50.0, 200.0), wall(), SpawnOrder(1))).id();
        let falling = world.spawn((body(100.0, 185.0, 40.0, 40.0), mover(), SpawnOrder(2))).id();
        let pushing = world.spawn((body(270.0, 50.0, 40.0, 40.0), mover(), SpawnOrder(3))).id();

        schedule.run(&mut world);

        let floor_box = hitbox(&world, floor);
        let wall_box = hitbox(&world, side_wall);
        assert!(hitbox(&world, falling).bottom() <= floor_box.y);
        assert!(hitbox(&world, pushing).right() <= wall_box.x);
        assert!(contacts(&world, pushing).touches(Side::Right, side_wall));
    }

    #[test]
    fn test_group_filter_is_asymmetric() {
        let (mut world, mut schedule) = setup();
        // Interested in mobs; the mob has no interest back.
        let attack = world
            .spawn((
                body(0.0, 0.0, 50.0, 50.0),
                Collidable::new(CollisionGroup::PlayerAttack)
                    .colliding_with([CollisionGroup::Mob])
                    .stationary()
                    .on_collision(record_hit),
                SpawnOrder(0),
            ))
            .id();
        let mob = world
            .spawn((
                body(10.0, 40.0, 50.0, 50.0),
                Collidable::new(CollisionGroup::Mob).colliding_with([CollisionGroup::Wall]),
                SpawnOrder(1),
            ))
            .id();

        schedule.run(&mut world);

        // Recorded once (mob as entity1, attack as entity2), on both sides.
        assert_eq!(contacts(&world, mob).top, vec![Contact { entity: attack, initial: true }]);
        assert_eq!(contacts(&world, attack).bottom, vec![Contact { entity: mob, initial: true }]);
        assert!(contacts(&world, mob).bottom.is_empty());
        assert_eq!(world.get::<Position>(attack), Some(&Position::new(0.0, 0.0)));
        assert_eq!(world.resource::<Hits>().0, vec![(attack, mob)]);
    }

    #[test]
    fn test_uninterested_pairs_are_ignored() {
        let (mut world, mut schedule) = setup();
        let a = world.spawn((body(0.0, 0.0, 50.0, 50.0), wall(), SpawnOrder(0))).id();
        let b = world.spawn((body(10.0, 10.0, 50.0, 50.0), wall(), SpawnOrder(1))).id();

        schedule.run(&mut world);

        assert!(contacts(&world, a).is_empty());
        assert!(contacts(&world, b).is_empty());
    }

    #[test]
    fn test_stale_contacts_are_overwritten_each_tick() {
        let (mut world, mut schedule) = setup();
        let a = world.spawn((body(40.0, 100.0, 20.0, 20.0), mover(), SpawnOrder(1))).id();
        let b = world.spawn((body(0.0, 120.0, 100.0, 20.0), wall(), SpawnOrder(0))).id();
        schedule.run(&mut world);
        assert!(contacts(&world, b).is_touching(Side::Top));

        world.despawn(a);
        schedule.run(&mut world);
        assert!(contacts(&world, b).is_empty());
    }

    #[test]
    fn test_callback_spawns_are_deferred() {
        fn spawn_marker(_this: Entity, _other: Entity, ctx: &mut CollisionContext) {
            ctx.commands().spawn(Position::new(-1.0, -1.0));
        }

        let (mut world, mut schedule) = setup();
        world.spawn((
            body(40.0, 100.0, 20.0, 20.0),
            Collidable::new(CollisionGroup::Player)
                .colliding_with([CollisionGroup::Wall])
                .on_collision(spawn_marker),
            SpawnOrder(1),
        ));
        world.spawn((body(0.0, 120.0, 100.0, 20.0), wall(), SpawnOrder(0)));

        schedule.run(&mut world);

        let mut markers = world.query::<&Position>();
        let spawned = markers
            .iter(&world)
            .filter(|p| **p == Position::new(-1.0, -1.0))
            .count();
        assert_eq!(spawned, 1);
    }
}
