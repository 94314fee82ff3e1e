//! Iterative subset simulation over ε-closures. Time is `O(|states| * |input|)` and space is
//! `O(|states|)` — no backtracking, so no exponential blowup regardless of pattern shape.

use crate::nfa::{Nfa, StateId};
use std::collections::HashSet;

/// Returns `true` iff `nfa` accepts `input` in full: every character advances the current set
/// of states by one step, and acceptance requires a terminal state to be reachable (by ε-moves
/// alone) after the last character.
pub fn simulate(nfa: &Nfa, input: &str) -> bool {
    let mut current = epsilon_closure(nfa, std::iter::once(nfa.start));
    for ch in input.chars() {
        let next = step(nfa, &current, ch);
        if next.is_empty() {
            return false;
        }
        current = epsilon_closure(nfa, next);
    }
    current.iter().any(|&s| nfa.states[s].is_terminal)
}

fn step(nfa: &Nfa, current: &HashSet<StateId>, ch: char) -> HashSet<StateId> {
    current
        .iter()
        .filter_map(|s| nfa.states[*s].transitions.get(&ch))
        .flatten()
        .copied()
        .collect()
}

/// The smallest superset of `seed` closed under ε-transitions, computed with a worklist so
/// that ε-cycles (introduced by unbounded quantifiers) terminate instead of looping forever —
/// a state already in the closure is never re-queued.
fn epsilon_closure(nfa: &Nfa, seed: impl IntoIterator<Item = StateId>) -> HashSet<StateId> {
    let mut closure: HashSet<StateId> = HashSet::new();
    let mut worklist: Vec<StateId> = Vec::new();
    for s in seed {
        if closure.insert(s) {
            worklist.push(s);
        }
    }
    while let Some(s) = worklist.pop() {
        for &next in &nfa.states[s].epsilon_transitions {
            if closure.insert(next) {
                worklist.push(next);
            }
        }
    }
    closure
}

/// A stepping view over an [Nfa], for callers who want to feed characters one at a time
/// instead of calling [simulate] with the whole input up front (e.g. to inspect whether the
/// automaton is already stuck before the input ends).
#[derive(Debug, Clone)]
pub struct NfaEvaluator<'a> {
    nfa: &'a Nfa,
    current: HashSet<StateId>,
}

impl<'a> NfaEvaluator<'a> {
    pub(crate) fn new(nfa: &'a Nfa) -> Self {
        let current = epsilon_closure(nfa, std::iter::once(nfa.start));
        Self { nfa, current }
    }

    /// Advances the evaluator by one character.
    pub fn step(&mut self, ch: char) {
        let next = step(self.nfa, &self.current, ch);
        self.current = epsilon_closure(self.nfa, next);
    }

    /// Whether a terminal state is reachable right now by ε-moves alone.
    pub fn is_accepting(&self) -> bool {
        self.current.iter().any(|&s| self.nfa.states[s].is_terminal)
    }

    /// Whether no state is reachable at all — once true, every future `step` call is a no-op
    /// and the automaton can never accept again.
    pub fn is_stuck(&self) -> bool {
        self.current.is_empty()
    }
}
