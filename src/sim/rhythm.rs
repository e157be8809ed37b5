//! Rhythm judgment engine
//!
//! Consumes a note schedule plus live lane inputs and classifies each
//! input against the nearest pending note. Call `advance_time` at least
//! once per frame so unplayed notes expire into misses.

use serde::{Deserialize, Serialize};

use super::chart::{Lane, Note, NoteStatus, chart_for_tempo};
use super::judgment::{Judgment, JudgmentWindows};
use super::score::Scoreboard;
use super::state::{EndReason, RngState, RoundEvent, RoundPhase, RoundSummary};
use crate::consts::SONG_END_GRACE_MS;
use crate::settings::RhythmSettings;

/// What a press in the wrong lane does to the note it landed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WrongLanePolicy {
    /// The note is used up and can no longer be hit
    #[default]
    Consume,
    /// The press is a miss but the note stays pending
    Ignore,
}

/// A single rhythm round (owned by the game loop, one per song)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RhythmRound {
    pub phase: RoundPhase,
    /// Notes in schedule order
    pub notes: Vec<Note>,
    pub windows: JudgmentWindows,
    pub wrong_lane: WrongLanePolicy,
    pub board: Scoreboard,
    /// Latest clock sample seen (ms since song start)
    pub now_ms: f64,
    #[serde(skip)]
    events: Vec<RoundEvent>,
}

impl RhythmRound {
    /// Create a round over an explicit note list
    pub fn new(mut notes: Vec<Note>, windows: JudgmentWindows, wrong_lane: WrongLanePolicy) -> Self {
        // Stable: equal times keep their schedule order for tie-breaks
        notes.sort_by(|a, b| a.time_ms.total_cmp(&b.time_ms));
        Self {
            phase: RoundPhase::Ready,
            notes,
            windows,
            wrong_lane,
            board: Scoreboard::default(),
            now_ms: 0.0,
            events: Vec::new(),
        }
    }

    /// Create a round with a generated chart for the configured tempo
    pub fn from_settings(settings: &RhythmSettings, seed: u64) -> Self {
        let notes = chart_for_tempo(settings.tempo, &RngState::new(seed));
        log::info!(
            "Generated {} chart: {} notes (seed {})",
            settings.tempo.as_str(),
            notes.len(),
            seed
        );
        Self::new(notes, settings.windows, settings.wrong_lane)
    }

    /// Begin play; resets score and every note
    pub fn start(&mut self) {
        self.phase = RoundPhase::Playing;
        self.board = Scoreboard::default();
        self.now_ms = 0.0;
        self.events.clear();
        for note in &mut self.notes {
            note.status = NoteStatus::Pending;
        }
        log::info!("Rhythm round started ({} notes)", self.notes.len());
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.phase == RoundPhase::Playing
    }

    /// Expire overdue notes and end the round once the song is over.
    /// Returns how many notes expired on this call.
    pub fn advance_time(&mut self, now_ms: f64) -> usize {
        if !self.is_playing() {
            return 0;
        }
        self.now_ms = self.now_ms.max(now_ms);

        let deadline = now_ms - self.windows.miss_ms;
        let mut expired = Vec::new();
        for (index, note) in self.notes.iter_mut().enumerate() {
            if note.is_pending() && note.time_ms < deadline {
                note.status = NoteStatus::Missed;
                expired.push((index, note.lane));
            }
        }
        for &(index, lane) in &expired {
            self.apply(Judgment::Miss, Some(lane), Some(index));
        }

        let song_over = match self.notes.last() {
            Some(last) => now_ms > last.time_ms + SONG_END_GRACE_MS,
            None => true,
        };
        if song_over {
            self.finish(EndReason::SongFinished);
        }

        expired.len()
    }

    /// Judge a lane press at `now_ms`. Returns `None` while not playing.
    pub fn on_input(&mut self, lane: Lane, now_ms: f64) -> Option<Judgment> {
        if !self.is_playing() {
            return None;
        }
        self.now_ms = self.now_ms.max(now_ms);

        let Some((index, diff)) = self.nearest_pending(now_ms) else {
            // Dry fire: nothing to hit
            self.apply(Judgment::Miss, Some(lane), None);
            return Some(Judgment::Miss);
        };

        let note = &mut self.notes[index];
        let judgment = if note.lane != lane {
            if self.wrong_lane == WrongLanePolicy::Consume {
                note.status = NoteStatus::Hit;
            }
            Judgment::Miss
        } else {
            note.status = NoteStatus::Hit;
            self.windows.classify(diff)
        };

        self.apply(judgment, Some(lane), Some(index));
        Some(judgment)
    }

    /// Closest pending note strictly inside the miss window.
    /// Ties go to the earliest in schedule order.
    fn nearest_pending(&self, now_ms: f64) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (index, note) in self.notes.iter().enumerate() {
            if !note.is_pending() {
                continue;
            }
            let d = (note.time_ms - now_ms).abs();
            if best.is_none_or(|(_, best_d)| d < best_d) {
                best = Some((index, d));
            }
        }
        best.filter(|&(_, d)| self.windows.in_range(d))
    }

    fn apply(&mut self, judgment: Judgment, lane: Option<Lane>, note: Option<usize>) {
        self.board.apply(judgment);
        log::debug!(
            "{} at {:.0}ms (combo {})",
            judgment.as_str(),
            self.now_ms,
            self.board.combo.combo
        );
        self.events.push(RoundEvent::Judged {
            judgment,
            lane,
            note,
            combo: self.board.combo.combo,
        });
    }

    fn finish(&mut self, reason: EndReason) {
        if self.phase == RoundPhase::GameOver {
            return;
        }
        self.phase = RoundPhase::GameOver;
        let summary = self.summary(reason);
        log::info!(
            "Rhythm round over: score {}, max combo {}, misses {}",
            summary.score,
            summary.max_combo,
            summary.stats.miss
        );
        self.events.push(RoundEvent::RoundEnded(summary));
    }

    pub fn summary(&self, reason: EndReason) -> RoundSummary {
        RoundSummary {
            score: self.board.score,
            max_combo: self.board.combo.max_combo,
            stats: self.board.stats,
            perfect_count: 0,
            reason,
        }
    }

    /// Number of notes still waiting for input
    pub fn pending_count(&self) -> usize {
        self.notes.iter().filter(|n| n.is_pending()).count()
    }

    /// Take every event emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<RoundEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round(times: &[(f64, Lane)]) -> RhythmRound {
        let notes = times.iter().map(|&(t, lane)| Note::new(t, lane)).collect();
        let mut round = RhythmRound::new(notes, JudgmentWindows::default(), WrongLanePolicy::Consume);
        round.start();
        round
    }

    #[test]
    fn test_exact_inputs_all_perfect() {
        let mut r = round(&[(1000.0, Lane::Left), (1500.0, Lane::Right), (2000.0, Lane::Left)]);
        for (t, lane) in [(1000.0, Lane::Left), (1500.0, Lane::Right), (2000.0, Lane::Left)] {
            r.advance_time(t);
            assert_eq!(r.on_input(lane, t), Some(Judgment::Perfect));
        }
        assert_eq!(r.board.score, 3);
        assert_eq!(r.board.stats.miss, 0);
        assert_eq!(r.board.combo.max_combo, 3);
    }

    #[test]
    fn test_scenario_two_notes() {
        let mut r = round(&[(1000.0, Lane::Left), (2000.0, Lane::Left)]);
        assert_eq!(r.on_input(Lane::Left, 1000.0), Some(Judgment::Perfect));
        assert_eq!(r.on_input(Lane::Left, 2005.0), Some(Judgment::Perfect));

        // Tight windows: 5ms is past PERFECT and GREAT but inside OK
        let notes = vec![Note::new(1000.0, Lane::Left), Note::new(2000.0, Lane::Left)];
        let windows = JudgmentWindows::new(2.0, 4.0, 170.0, 240.0).unwrap();
        let mut r = RhythmRound::new(notes, windows, WrongLanePolicy::Consume);
        r.start();
        assert_eq!(r.on_input(Lane::Left, 1000.0), Some(Judgment::Perfect));
        assert_eq!(r.on_input(Lane::Left, 2005.0), Some(Judgment::Ok));
    }

    #[test]
    fn test_dry_fire_leaves_notes_untouched() {
        let mut r = round(&[(5000.0, Lane::Left)]);
        assert_eq!(r.on_input(Lane::Left, 1000.0), Some(Judgment::Miss));
        assert_eq!(r.notes[0].status, NoteStatus::Pending);
        assert_eq!(r.board.stats.miss, 1);
        let events = r.drain_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            RoundEvent::Judged {
                judgment: Judgment::Miss,
                note: None,
                ..
            }
        ));
    }

    #[test]
    fn test_wrong_lane_consumes_note() {
        let mut r = round(&[(1000.0, Lane::Left)]);
        r.board.combo.extend();
        assert_eq!(r.on_input(Lane::Right, 1000.0), Some(Judgment::Miss));
        assert_eq!(r.notes[0].status, NoteStatus::Hit);
        assert_eq!(r.board.combo.combo, 0);
        // Consumed: a second press is a dry fire
        assert_eq!(r.on_input(Lane::Left, 1000.0), Some(Judgment::Miss));
        assert_eq!(r.board.stats.miss, 2);
    }

    #[test]
    fn test_late_press_past_ok_consumes_note() {
        let mut r = round(&[(1000.0, Lane::Left)]);
        r.board.combo.extend();
        // Inside MISS but past OK: right lane, still a miss
        assert_eq!(r.on_input(Lane::Left, 1200.0), Some(Judgment::Miss));
        assert_eq!(r.notes[0].status, NoteStatus::Hit);
        assert_eq!(r.board.combo.combo, 0);
        assert_eq!(r.board.stats.miss, 1);
        assert_eq!(r.board.score, 0);
        let events = r.drain_events();
        assert!(matches!(
            events[0],
            RoundEvent::Judged {
                judgment: Judgment::Miss,
                note: Some(0),
                ..
            }
        ));
        // Nothing left to expire
        assert_eq!(r.advance_time(1300.0), 0);
    }

    #[test]
    fn test_wrong_lane_ignore_policy() {
        let notes = vec![Note::new(1000.0, Lane::Left)];
        let mut r = RhythmRound::new(notes, JudgmentWindows::default(), WrongLanePolicy::Ignore);
        r.start();
        assert_eq!(r.on_input(Lane::Right, 1000.0), Some(Judgment::Miss));
        assert_eq!(r.notes[0].status, NoteStatus::Pending);
        assert_eq!(r.on_input(Lane::Left, 1010.0), Some(Judgment::Perfect));
    }

    #[test]
    fn test_tie_goes_to_earlier_note() {
        let mut r = round(&[(1000.0, Lane::Left), (1100.0, Lane::Right)]);
        // Equidistant from both: the earlier (Left) note is chosen
        assert_eq!(r.on_input(Lane::Left, 1050.0), Some(Judgment::Perfect));
        assert_eq!(r.notes[0].status, NoteStatus::Hit);
        assert_eq!(r.notes[1].status, NoteStatus::Pending);
    }

    #[test]
    fn test_expiry_marks_missed() {
        let mut r = round(&[(1000.0, Lane::Left), (1000.0, Lane::Right), (9000.0, Lane::Left)]);
        r.board.combo.extend();
        assert_eq!(r.advance_time(1240.0), 0);
        assert_eq!(r.advance_time(1241.0), 2);
        assert!(r.notes[..2].iter().all(|n| n.status == NoteStatus::Missed));
        assert_eq!(r.board.combo.combo, 0);
        assert_eq!(r.board.stats.miss, 2);
        assert_eq!(r.pending_count(), 1);
    }

    #[test]
    fn test_song_end_after_grace() {
        let mut r = round(&[(1000.0, Lane::Left)]);
        r.on_input(Lane::Left, 1000.0);
        r.advance_time(3000.0);
        assert!(r.is_playing());
        r.advance_time(3001.0);
        assert_eq!(r.phase, RoundPhase::GameOver);
        let ended: Vec<_> = r
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, RoundEvent::RoundEnded(_)))
            .collect();
        assert_eq!(ended.len(), 1);
        // Terminal: input is ignored afterwards
        assert_eq!(r.on_input(Lane::Left, 3100.0), None);
        assert_eq!(r.advance_time(9999.0), 0);
    }

    #[test]
    fn test_ready_round_ignores_input() {
        let notes = vec![Note::new(1000.0, Lane::Left)];
        let mut r = RhythmRound::new(notes, JudgmentWindows::default(), WrongLanePolicy::Consume);
        assert_eq!(r.on_input(Lane::Left, 1000.0), None);
        assert_eq!(r.board.stats.total(), 0);
    }

    #[test]
    fn test_generated_round_is_deterministic() {
        let settings = RhythmSettings::default();
        let a = RhythmRound::from_settings(&settings, 99);
        let b = RhythmRound::from_settings(&settings, 99);
        assert_eq!(a.notes.len(), b.notes.len());
        assert!(a.notes.iter().zip(&b.notes).all(|(x, y)| x.time_ms == y.time_ms));
    }
}
