//! Simulated engine - deterministic deals with a pseudo search
//!
//! This engine deals real Klondike layouts from a seed but does not play the
//! game: whether a deal is "solvable" and how many states the search needs are
//! derived from a hash of the seed and draw count. It exists to exercise the
//! deferred pool without a native solver.

use crate::cancel::CancelToken;
use crate::draw_count::DrawCount;
use crate::engine::SolverEngine;
use crate::outcome::SolveOutcome;
use std::fmt::Write;

const DECK_SIZE: usize = 52;
const TABLEAU_COLUMNS: usize = 7;
const RANKS: &[u8; 13] = b"A23456789TJQK";
const SUITS: &[u8; 4] = b"CDHS";

/// Seeds are normalized into `0..SEED_MODULUS`
const SEED_MODULUS: i64 = 1 << 31;
/// How often the pseudo search looks at the cancel token
const CANCEL_CHECK_INTERVAL: u64 = 1024;

/// Deterministic stand-in for a native Klondike solver
#[derive(Debug, Clone)]
pub struct SimulatedEngine {
    draw_count: DrawCount,
    applied_seed: i64,
    deck: [u8; DECK_SIZE],
    moves: Vec<String>,
    foundation: u32,
    solve_rate: u8,
    max_nodes: u64,
}

impl Default for SimulatedEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedEngine {
    /// Create an engine where roughly 80% of deals are solvable within 50 000 states
    pub fn new() -> Self {
        let mut engine = Self {
            draw_count: DrawCount::default(),
            applied_seed: 0,
            deck: [0; DECK_SIZE],
            moves: Vec::new(),
            foundation: 0,
            solve_rate: 80,
            max_nodes: 50_000,
        };
        engine.seed(0);
        engine
    }

    /// Percentage of deals that are solvable (clamped to 100)
    pub fn with_solve_rate(mut self, percent: u8) -> Self {
        self.solve_rate = percent.min(100);
        self
    }

    /// Upper bound on the states a deal needs before its outcome is known
    pub fn with_max_nodes(mut self, max_nodes: u64) -> Self {
        self.max_nodes = max_nodes.max(1);
        self
    }

    /// Seed applied by the last call to [`SolverEngine::seed`]
    pub fn applied_seed(&self) -> i64 {
        self.applied_seed
    }

    fn profile(&self) -> DealProfile {
        let h = splitmix64(self.applied_seed as u64 ^ ((self.draw_count.get() as u64) << 40));
        DealProfile {
            required_nodes: 1 + h % self.max_nodes,
            solvable: (h >> 32) % 100 < self.solve_rate as u64,
            minimal: (h >> 16) & 1 == 0,
        }
    }

    fn play_out(&mut self) {
        // Cards go up in the order they were dealt.
        self.moves = self
            .deck
            .iter()
            .map(|&card| format!("{}>F", card_name(card)))
            .collect();
        self.foundation = DECK_SIZE as u32;
    }
}

struct DealProfile {
    required_nodes: u64,
    solvable: bool,
    minimal: bool,
}

impl SolverEngine for SimulatedEngine {
    fn set_draw_count(&mut self, draw_count: DrawCount) {
        self.draw_count = draw_count;
    }

    fn draw_count(&self) -> DrawCount {
        self.draw_count
    }

    fn seed(&mut self, seed: i64) -> i64 {
        self.applied_seed = seed.rem_euclid(SEED_MODULUS);

        let mut state = self.applied_seed as u64;
        for (i, card) in self.deck.iter_mut().enumerate() {
            *card = i as u8;
        }
        for i in (1..DECK_SIZE).rev() {
            state = splitmix64(state);
            let j = (state % (i as u64 + 1)) as usize;
            self.deck.swap(i, j);
        }

        self.reset_to_initial_deal();
        self.applied_seed
    }

    fn reset_to_initial_deal(&mut self) {
        self.moves.clear();
        self.foundation = 0;
    }

    fn attempt_bounded_search(&mut self, budget: u64, cancel: &CancelToken) -> SolveOutcome {
        self.reset_to_initial_deal();
        let profile = self.profile();
        let explored = profile.required_nodes.min(budget);

        for node in 0..explored {
            if node % CANCEL_CHECK_INTERVAL == 0 && cancel.is_cancelled() {
                return SolveOutcome::CouldNotComplete;
            }
            std::hint::black_box(node);
        }

        if profile.required_nodes > budget {
            return SolveOutcome::CouldNotComplete;
        }
        if !profile.solvable {
            return SolveOutcome::Impossible;
        }

        self.play_out();
        if profile.minimal {
            SolveOutcome::SolvedMinimal
        } else {
            SolveOutcome::SolvedMayNotBeMinimal
        }
    }

    fn describe_moves(&self) -> String {
        self.moves.join(" ")
    }

    fn render_initial_diagram(&self) -> String {
        let mut out = String::new();
        let stock_start = TABLEAU_COLUMNS * (TABLEAU_COLUMNS + 1) / 2;
        let _ = writeln!(
            out,
            "Deal {} | draw {} | stock {}",
            self.applied_seed,
            self.draw_count,
            DECK_SIZE - stock_start
        );

        let mut next = 0;
        for column in 0..TABLEAU_COLUMNS {
            let _ = write!(out, "{}:", column + 1);
            for _ in 0..column {
                out.push_str(" ##");
            }
            let _ = writeln!(out, " {}", card_name(self.deck[next + column]));
            next += column + 1;
        }

        let stock: Vec<_> = self.deck[stock_start..]
            .iter()
            .map(|&card| card_name(card))
            .collect();
        let _ = write!(out, "S: {}", stock.join(" "));
        out
    }

    fn solved_card_count(&self) -> u32 {
        self.foundation
    }
}

fn card_name(card: u8) -> String {
    let rank = RANKS[(card % 13) as usize] as char;
    let suit = SUITS[(card / 13) as usize] as char;
    format!("{}{}", rank, suit)
}

fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
