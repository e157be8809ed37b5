//! Mochi Arcade entry point
//!
//! Native builds play one scripted rhythm round and one scripted stacking
//! round against the engines and log the outcome. The browser host drives
//! the library directly.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Mochi Arcade (native) starting...");

    let seed: u64 = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(rand::random);
    log::info!("Seed: {}", seed);

    let mut store = mochi_arcade::MemoryStore::new();
    let settings = mochi_arcade::Settings::load(&store);

    demo::rhythm_round(&settings, &mut store, seed);
    demo::stack_round(&settings, &mut store, seed);
    settings.save(&mut store);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The browser host drives the library directly
}

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use glam::Vec2;
    use rand::Rng;

    use mochi_arcade::highscores::{RHYTHM_RECORD_KEY, rank_for};
    use mochi_arcade::sim::{
        BodyState, PhysicsWorld, RhythmRound, RngState, RoundEvent, RoundSummary, ScriptedWorld,
        StackGeometry, StackRound,
    };
    use mochi_arcade::{KeyValueStore, RecordBook, Settings};

    /// 60 Hz frame
    const FRAME_MS: f64 = 1000.0 / 60.0;

    /// A player whose timing error is roughly normal around zero
    pub fn rhythm_round<S: KeyValueStore>(settings: &Settings, store: &mut S, seed: u64) {
        let mut book = RecordBook::load(store, RHYTHM_RECORD_KEY);
        let mut round = RhythmRound::from_settings(&settings.rhythm, seed);
        let mut rng = RngState::new(seed).with_stream(1).to_rng();
        round.start();

        let mut presses: Vec<_> = round
            .notes
            .iter()
            .map(|n| {
                let error: f64 = (rng.random::<f64>() + rng.random::<f64>() - 1.0) * 150.0;
                (n.time_ms + error, n.lane)
            })
            .collect();
        // Jitter can reorder neighbouring notes
        presses.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut next_press = 0;
        let mut now = 0.0;
        while round.is_playing() {
            now += FRAME_MS;
            while next_press < presses.len() && presses[next_press].0 <= now {
                let (_, lane) = presses[next_press];
                round.on_input(lane, now);
                next_press += 1;
            }
            round.advance_time(now);
        }

        report(round.drain_events(), &mut book, store);
    }

    /// Release near the center, then fake a fall onto the stack
    pub fn stack_round<S: KeyValueStore>(settings: &Settings, store: &mut S, seed: u64) {
        let variant = settings.stack_variant;
        let stack_settings = settings.stack_settings();
        let mut book = RecordBook::load(store, variant.record_key());
        let geometry = StackGeometry::for_canvas(400.0, 700.0);

        let mut world = ScriptedWorld::new();
        let base = world.add_static(Vec2::new(geometry.center_x, geometry.base_top_y), 180.0, 20.0);
        let mut round = StackRound::new(stack_settings, geometry, seed);
        round.add_base(base);
        round.start(&mut world);

        let mut rng = RngState::new(seed).with_stream(2).to_rng();
        let mut aim: f32 = rng.random_range(0.0..40.0);
        let mut frames = 0u32;
        let mut ended = None;

        while round.is_playing() && frames < 60 * 600 {
            frames += 1;
            let Some((id, state)) = round.active.as_ref().map(|b| (b.id, b.state)) else {
                break;
            };
            match state {
                BodyState::Moving => {
                    let x = world.kinematics(id).map_or(0.0, |k| k.pos.x);
                    if (x - geometry.center_x).abs() <= aim {
                        round.release(&mut world);
                    }
                }
                BodyState::Dropping => {
                    world.step();
                    let landing_y = round.top_y(&world) - stack_settings.body_height;
                    if let Some(kin) = world.kinematics(id).filter(|k| k.pos.y >= landing_y) {
                        world.set_position(id, Vec2::new(kin.pos.x, landing_y));
                        world.set_velocity(id, Vec2::ZERO);
                        let below = round.stack.last().copied().unwrap_or(base);
                        round.on_collision(id, below);
                    }
                }
                _ => {}
            }
            round.tick(&mut world, FRAME_MS);

            let (committed, summary) = log_stack_events(round.drain_events());
            if committed {
                // Sloppier as the tower grows
                aim = rng.random_range(0.0..(40.0 + round.score as f32 * 10.0));
            }
            ended = ended.or(summary);
        }

        let rank = rank_for(variant, round.score);
        log::info!("{} tower: {} placed, rank {}", variant.as_str(), round.placed(), rank.name);
        match ended {
            Some(summary) => {
                if book.submit(store, &summary) {
                    println!("New best tower: {}", summary.score);
                }
            }
            None => log::info!("Demo stopped after {} frames", frames),
        }
    }

    fn report<S: KeyValueStore>(events: Vec<RoundEvent>, book: &mut RecordBook, store: &mut S) {
        for event in events {
            if let RoundEvent::RoundEnded(summary) = event {
                println!(
                    "score {} | max combo {} | perfect {} great {} ok {} miss {}",
                    summary.score,
                    summary.max_combo,
                    summary.stats.perfect,
                    summary.stats.great,
                    summary.stats.ok,
                    summary.stats.miss
                );
                if book.submit(store, &summary) {
                    println!("New high score!");
                }
            }
        }
    }

    /// Print placements; reports whether a body committed and the round summary
    fn log_stack_events(events: Vec<RoundEvent>) -> (bool, Option<RoundSummary>) {
        let mut committed = false;
        let mut ended = None;
        for event in events {
            match event {
                RoundEvent::Committed { tier, offset, combo, .. } => {
                    println!("{:?} ({:.1}px) combo {}", tier, offset, combo);
                    committed = true;
                }
                RoundEvent::RoundEnded(summary) => {
                    println!("Round over ({:?}): {} placed", summary.reason, summary.score);
                    ended = Some(summary);
                }
                _ => {}
            }
        }
        (committed, ended)
    }
}
