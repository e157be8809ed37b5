//! Property tests for both engines, driven through the public API

use glam::Vec2;
use proptest::prelude::*;

use mochi_arcade::StackVariant;
use mochi_arcade::sim::{
    BodyId, BodyState, Judgment, JudgmentWindows, Lane, Note, NoteStatus, PhysicsWorld,
    PlacementTier, RhythmRound, RoundEvent, ScriptedWorld, StackGeometry, StackRound,
    WrongLanePolicy,
};

const DT: f64 = 10.0;

fn lane_strategy() -> impl Strategy<Value = Lane> {
    prop_oneof![Just(Lane::Left), Just(Lane::Right)]
}

/// Notes at least 600ms apart so every press has one unambiguous target
fn spaced_notes() -> impl Strategy<Value = Vec<Note>> {
    prop::collection::vec((600.0f64..2000.0, lane_strategy()), 1..30).prop_map(|gaps| {
        let mut t = 1000.0;
        gaps.into_iter()
            .map(|(gap, lane)| {
                t += gap;
                Note::new(t, lane)
            })
            .collect()
    })
}

fn stack_setup(variant: StackVariant, seed: u64) -> (StackRound, ScriptedWorld, BodyId) {
    let geometry = StackGeometry::for_canvas(400.0, 700.0);
    let mut world = ScriptedWorld::new();
    let base = world.add_static(Vec2::new(geometry.center_x, geometry.base_top_y), 180.0, 20.0);
    let mut round = StackRound::new(variant.settings(), geometry, seed);
    round.add_base(base);
    round.start(&mut world);
    (round, world, base)
}

fn active_id(round: &StackRound) -> BodyId {
    round.active.as_ref().map(|b| b.id).expect("active body")
}

/// Release the active body and put it down at `x` just above the base
fn land_at(round: &mut StackRound, world: &mut ScriptedWorld, base: BodyId, x: f32) -> BodyId {
    let id = active_id(round);
    assert!(round.release(world));
    let y = round.geometry.base_top_y - round.settings.body_height;
    world.set_position(id, Vec2::new(x, y));
    world.set_velocity(id, Vec2::ZERO);
    round.on_collision(base, id);
    id
}

proptest! {
    #[test]
    fn test_classify_tiers(d in 0.0f64..400.0) {
        let w = JudgmentWindows::default();
        let expected = if d < 70.0 {
            Judgment::Perfect
        } else if d < 120.0 {
            Judgment::Great
        } else if d < 170.0 {
            Judgment::Ok
        } else {
            Judgment::Miss
        };
        prop_assert_eq!(w.classify(d), expected);
        prop_assert_eq!(w.classify(-d), expected);
    }

    #[test]
    fn test_exact_play_is_all_perfect(notes in spaced_notes()) {
        let n = notes.len();
        let presses: Vec<_> = notes.iter().map(|n| (n.time_ms, n.lane)).collect();
        let mut round = RhythmRound::new(notes, JudgmentWindows::default(), WrongLanePolicy::Consume);
        round.start();

        for (t, lane) in presses {
            round.advance_time(t);
            prop_assert_eq!(round.on_input(lane, t), Some(Judgment::Perfect));
        }
        let last = round.notes.last().map_or(0.0, |n| n.time_ms);
        round.advance_time(last + 2001.0);

        prop_assert!(!round.is_playing());
        prop_assert_eq!(round.board.score, n as u64);
        prop_assert_eq!(round.board.combo.max_combo, n as u32);
        prop_assert_eq!(round.board.stats.miss, 0);
        prop_assert!(round.notes.iter().all(|n| n.status == NoteStatus::Hit));
    }

    #[test]
    fn test_combo_bookkeeping(
        notes in spaced_notes(),
        presses in prop::collection::vec((0.0f64..40_000.0, lane_strategy()), 0..60),
    ) {
        let mut presses = presses;
        presses.sort_by(|a, b| a.0.total_cmp(&b.0));
        let mut round = RhythmRound::new(notes, JudgmentWindows::default(), WrongLanePolicy::Consume);
        round.start();

        let mut prev_max = 0;
        for (t, lane) in presses {
            round.advance_time(t);
            let Some(judgment) = round.on_input(lane, t) else {
                break;
            };
            let combo = round.board.combo;
            if judgment == Judgment::Miss {
                prop_assert_eq!(combo.combo, 0);
            } else {
                prop_assert!(combo.combo >= 1);
            }
            prop_assert!(combo.max_combo >= combo.combo);
            prop_assert!(combo.max_combo >= prev_max);
            prev_max = combo.max_combo;
        }

        // Each note is judged at most once
        let judged_notes: Vec<usize> = round
            .drain_events()
            .into_iter()
            .filter_map(|e| match e {
                RoundEvent::Judged { note, .. } => note,
                _ => None,
            })
            .collect();
        let mut unique = judged_notes.clone();
        unique.sort_unstable();
        unique.dedup();
        prop_assert_eq!(unique.len(), judged_notes.len());
    }

    #[test]
    fn test_dry_fire_touches_no_note(notes in spaced_notes(), lane in lane_strategy()) {
        let mut round = RhythmRound::new(notes, JudgmentWindows::default(), WrongLanePolicy::Consume);
        round.start();
        // Well before the first note, outside every window
        prop_assert_eq!(round.on_input(lane, 0.0), Some(Judgment::Miss));

        let events = round.drain_events();
        prop_assert_eq!(events.len(), 1);
        let dry_fire = matches!(
            events[0],
            RoundEvent::Judged { judgment: Judgment::Miss, note: None, .. }
        );
        prop_assert!(dry_fire);
        prop_assert_eq!(round.pending_count(), round.notes.len());
    }

    #[test]
    fn test_sweep_stays_in_play_area(seed in any::<u64>(), ticks in 1usize..600, tree in any::<bool>()) {
        let variant = if tree { StackVariant::Tree } else { StackVariant::Kagamimochi };
        let (mut round, mut world, _) = stack_setup(variant, seed);
        let id = active_id(&round);
        let s = round.settings;
        let left = round.geometry.center_x - s.play_area_width / 2.0 + s.play_area_margin;
        let right = round.geometry.center_x + s.play_area_width / 2.0 - s.play_area_margin;
        for _ in 0..ticks {
            round.tick(&mut world, DT);
            let x = world.kinematics(id).map(|k| k.pos.x).unwrap_or_default();
            prop_assert!((left..=right).contains(&x), "x = {}", x);
            let offset = (x - round.geometry.center_x).abs();
            prop_assert!(offset <= s.max_offset, "offset = {}", offset);
        }
        prop_assert_eq!(round.active.as_ref().map(|b| b.state), Some(BodyState::Moving));
    }

    #[test]
    fn test_restless_body_never_commits(seed in any::<u64>(), spin in 0.05f32..2.0, ticks in 10usize..300) {
        let (mut round, mut world, base) = stack_setup(StackVariant::Kagamimochi, seed);
        let x = round.geometry.center_x;
        let id = land_at(&mut round, &mut world, base, x);
        for _ in 0..ticks {
            world.set_angular_velocity(id, spin);
            round.tick(&mut world, DT);
        }
        prop_assert!(round.is_playing());
        prop_assert_eq!(round.placed(), 0);
        let committed = round
            .drain_events()
            .iter()
            .any(|e| matches!(e, RoundEvent::Committed { .. }));
        prop_assert!(!committed);
    }

    #[test]
    fn test_resting_placement_tier(offset in 0.0f32..150.0, tree in any::<bool>()) {
        let variant = if tree { StackVariant::Tree } else { StackVariant::Kagamimochi };
        let (mut round, mut world, base) = stack_setup(variant, 7);
        let x = round.geometry.center_x + offset;
        let id = land_at(&mut round, &mut world, base, x);
        for _ in 0..50 {
            round.tick(&mut world, DT);
        }

        let committed = round.drain_events().into_iter().find_map(|e| match e {
            RoundEvent::Committed { body, tier, .. } => Some((body, tier)),
            _ => None,
        });
        let actual_offset = (x - round.geometry.center_x).abs();
        let expected = PlacementTier::classify(actual_offset, &round.settings);
        prop_assert_eq!(committed, Some((id, expected)));
        prop_assert_eq!(round.placed(), 1);
        prop_assert!(world.kinematics(id).is_some_and(|k| k.is_static));
        match expected {
            PlacementTier::Perfect => prop_assert_eq!(round.combo.combo, 1),
            _ => prop_assert_eq!(round.combo.combo, 0),
        }
    }
}

#[test]
fn test_misplaced_body_ends_round() {
    let (mut round, mut world, base) = stack_setup(StackVariant::Kagamimochi, 3);
    let x = round.geometry.center_x + 155.0;
    let id = land_at(&mut round, &mut world, base, x);
    for _ in 0..50 {
        round.tick(&mut world, DT);
    }
    assert!(!round.is_playing());
    assert_eq!(round.placed(), 0);
    // Left dynamic to topple
    assert!(world.kinematics(id).is_some_and(|k| !k.is_static));
}
