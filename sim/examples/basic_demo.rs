//! Basic demonstration of the platformer simulation.
//!
//! Run with: cargo run --example basic_demo
//! Set `RUST_LOG=debug` to see hits, deaths and deletions.

use platformer_sim::{Kind, LevelLayout, PlayerAction, PlayerInput, SimConfig, SimWorld};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("=== Platformer - Simulation Demo ===\n");

    let mut sim = match SimWorld::from_level(&LevelLayout::demo(), SimConfig::default()) {
        Ok(sim) => sim,
        Err(err) => {
            eprintln!("failed to load demo level: {err}");
            std::process::exit(1);
        }
    };

    println!("Initial state:");
    print_snapshot(&mut sim);

    // (first tick, last tick, held intents) at 60 ticks/sec
    let script: &[(u64, u64, &[PlayerAction])] = &[
        (0, 30, &[]),
        (30, 150, &[PlayerAction::WalkRight]),
        (150, 160, &[PlayerAction::Jump]),
        (160, 260, &[PlayerAction::SprintRight]),
        (260, 420, &[PlayerAction::Shoot]),
        (420, 440, &[PlayerAction::ButtAttack]),
        (440, 600, &[]),
    ];

    println!("\nRunning 600 ticks (10 seconds at 60 ticks/sec)...\n");
    for tick in 0..600u64 {
        let held = script
            .iter()
            .find(|(start, end, _)| (*start..*end).contains(&tick))
            .map_or(&[][..], |(_, _, actions)| *actions);
        sim.set_player_input(PlayerInput::new(held.iter().copied()));
        sim.step_fixed();

        if (tick + 1) % 60 == 0 {
            println!("--- Tick {} (t={:.1}s) ---", sim.current_tick(), sim.current_time());
            print_snapshot(&mut sim);
        }
    }

    println!("\n=== Final State (JSON) ===\n");
    match sim.snapshot().to_json_pretty() {
        Ok(json) => println!("{json}"),
        Err(err) => eprintln!("failed to serialize snapshot: {err}"),
    }
}

fn print_snapshot(sim: &mut SimWorld) {
    let snapshot = sim.snapshot();
    for entity in snapshot.entities.iter().filter(|e| e.kind != Kind::Wall) {
        let hp = entity.hp.map_or_else(|| "-".to_string(), |hp| format!("{hp:.0}"));
        println!(
            "  {:?}: pos=({:.1}, {:.1}) vel=({:.1}, {:.1}) grounded={} hp={}",
            entity.kind, entity.x, entity.y, entity.vx, entity.vy, entity.grounded, hp
        );
    }
    println!("  walls: {}", snapshot.count(Kind::Wall));
}
