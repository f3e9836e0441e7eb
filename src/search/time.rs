//! Time budgeting for iterative deepening.
//!
//! A [`TimeManager`] is built once per `go` command from the clock state at
//! the root and answers two questions while the search runs: whether to stop
//! mid-iteration (`should_end`, polled periodically from the node loop) and
//! whether to start another iteration at all (`can_end`, checked between
//! iterative-deepening depths).

use crate::moves::types::Move;
use std::cell::Cell;
use std::time::{Duration, Instant};

/// Safety margin subtracted from the reported remaining time, to leave room
/// for engine/GUI communication overhead before a flag fall.
const MOVE_OVERHEAD_MS: f64 = 50.0;

/// Clock state handed down from the `go` command.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeControl {
    pub time_ms: Option<u64>,
    pub increment_ms: u64,
    pub moves_to_go: Option<u32>,
    pub move_number: u32,
    pub node_limit: Option<u64>,
    pub depth_limit: Option<i32>,
    pub movetime_ms: Option<u64>,
    pub infinite: bool,
}

pub struct TimeManager {
    start: Instant,
    optimal: Duration,
    hard: Duration,
    node_limit: Option<u64>,
    depth_limit: Option<i32>,
    infinite: bool,

    stable_iterations: u32,
    last_best_move: Option<Move>,

    /// Cooperative abort latch: set by the host's `stop` command or once
    /// `should_end` itself observes the hard budget blown, so every deeper
    /// frame on the call stack sees the abort without re-reading the clock.
    aborted: Cell<bool>,
}

impl TimeManager {
    /// No time control at all: search until told to stop (used by `go infinite`
    /// and by perft/bench callers that manage their own depth cutoff).
    pub fn unbounded() -> Self {
        Self {
            start: Instant::now(),
            optimal: Duration::from_secs(3600),
            hard: Duration::from_secs(3600),
            node_limit: None,
            depth_limit: None,
            infinite: true,
            stable_iterations: 0,
            last_best_move: None,
            aborted: Cell::new(false),
        }
    }

    pub fn new(tc: TimeControl) -> Self {
        if tc.infinite {
            return Self {
                node_limit: tc.node_limit,
                depth_limit: tc.depth_limit,
                ..Self::unbounded()
            };
        }

        if let Some(movetime) = tc.movetime_ms {
            let budget = Duration::from_millis(movetime.saturating_sub(MOVE_OVERHEAD_MS as u64));
            return Self {
                start: Instant::now(),
                optimal: budget,
                hard: budget,
                node_limit: tc.node_limit,
                depth_limit: tc.depth_limit,
                infinite: false,
                stable_iterations: 0,
                last_best_move: None,
                aborted: Cell::new(false),
            };
        }

        let Some(time_ms) = tc.time_ms else {
            return Self::unbounded();
        };

        let time = time_ms as f64;
        let increment = tc.increment_ms as f64;
        let usable = (time - MOVE_OVERHEAD_MS).max(1.0);

        let optimal_ms = match tc.moves_to_go {
            Some(mtg) if mtg > 0 => 0.75 * (increment + 0.95 * time / mtg as f64),
            _ => {
                let mv = tc.move_number as f64;
                let divider = 41.0 * (1.0 + 1.5 * (mv / 41.0).powi(2)).sqrt() - mv;
                usable / divider.max(1.0) + increment
            }
        }
        .max(1.0);

        // The hard cutoff never exceeds what's actually left on the clock,
        // but always allows at least as long as the optimal budget in case
        // the position turns out to need it.
        let hard_ms = (optimal_ms * 3.0).max(optimal_ms).min(usable);

        Self {
            start: Instant::now(),
            optimal: Duration::from_millis(optimal_ms as u64),
            hard: Duration::from_millis(hard_ms as u64),
            node_limit: tc.node_limit,
            depth_limit: tc.depth_limit,
            infinite: false,
            stable_iterations: 0,
            last_best_move: None,
            aborted: Cell::new(false),
        }
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Polled from inside the node loop, approximately every 1024 nodes:
    /// should the in-flight iteration abort right now?
    pub fn should_end(&self, node_count: u64) -> bool {
        if self.infinite {
            if let Some(limit) = self.node_limit {
                return node_count >= limit;
            }
            return false;
        }
        if let Some(limit) = self.node_limit
            && node_count >= limit
        {
            return true;
        }
        self.start.elapsed() >= self.hard
    }

    /// Cooperative check from inside the node loop: latches `aborted` the
    /// first time the hard budget (or node limit) is blown, so every deeper
    /// frame on the call stack can see the abort with a plain flag read
    /// instead of re-touching the clock.
    #[inline]
    pub fn poll(&self, node_count: u64) -> bool {
        if self.aborted.get() {
            return true;
        }
        if self.should_end(node_count) {
            self.aborted.set(true);
            return true;
        }
        false
    }

    /// True once `poll` (or `stop`) has latched the abort flag.
    #[inline]
    pub fn aborted(&self) -> bool {
        self.aborted.get()
    }

    /// Sets the abort flag directly, for the host's `stop` command.
    #[inline]
    pub fn stop(&self) {
        self.aborted.set(true);
    }

    /// Checked between iterative-deepening depths: is it worth starting the
    /// next iteration? Scales the optimal budget by root-stability, by how
    /// much of the node budget went into the current best move, and by how
    /// strongly correction history disagrees with the raw static eval.
    pub fn can_end(
        &mut self,
        nodes: u64,
        best_move_nodes: u64,
        best_move: Option<Move>,
        depth: i32,
        eval_correction_magnitude: i32,
    ) -> bool {
        if self.infinite {
            if let Some(limit) = self.depth_limit {
                return depth >= limit;
            }
            return false;
        }
        if let Some(limit) = self.depth_limit && depth >= limit {
            return true;
        }

        if best_move == self.last_best_move {
            self.stable_iterations += 1;
        } else {
            self.stable_iterations = 0;
        }
        self.last_best_move = best_move;

        // Stability: up to 30% shorter after five quiet iterations.
        let stability_factor = (1.0 - 0.06 * self.stable_iterations.min(5) as f64).max(0.7);

        // Node fraction: a best move eating most of the node budget is
        // unlikely to be overturned by another iteration.
        let node_fraction = if nodes > 0 {
            best_move_nodes as f64 / nodes as f64
        } else {
            0.0
        };
        let node_fraction_factor = (1.5 - node_fraction).clamp(0.5, 1.5);

        // Eval correction: a static eval the correction tables strongly
        // distrust means the position needs more search, not less.
        let correction_factor = 1.0 + (eval_correction_magnitude.abs() as f64 / 200.0).min(0.5);

        let scaled = self.optimal.as_secs_f64() * stability_factor * node_fraction_factor * correction_factor;
        let scaled = Duration::from_secs_f64(scaled.max(0.0)).min(self.hard);

        self.start.elapsed() >= scaled
    }
}
