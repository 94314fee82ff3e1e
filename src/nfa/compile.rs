//! Thompson construction: translates a [Token] tree into an [Nfa]. Compilation is total —
//! every well-formed AST (the only kind the parser ever produces) compiles without error.

use crate::ast::{Bound, Quantifier, Token};
use crate::nfa::{Nfa, NfaState, StateId};

/// Compiles `ast` (a sequence of top-level tokens, as produced by
/// [parser::parse](crate::parser::parse)) into an [Nfa]. The outermost fragment's entry state
/// becomes the automaton's start state and its exit state becomes the sole terminal state.
pub fn compile(ast: &[Token]) -> Nfa {
    let mut builder = Builder::new();
    let fragment = builder.sequence(ast);
    builder.states[fragment.start].is_start = true;
    builder.states[fragment.end].is_terminal = true;
    Nfa {
        states: builder.states,
        start: fragment.start,
    }
}

/// One entry state and one exit state — the Thompson invariant every compiled fragment obeys.
#[derive(Clone, Copy)]
struct Fragment {
    start: StateId,
    end: StateId,
}

struct Builder {
    states: Vec<NfaState>,
}

impl Builder {
    fn new() -> Self {
        Self { states: Vec::new() }
    }

    fn fresh_state(&mut self) -> StateId {
        let id = self.states.len();
        self.states.push(NfaState::default());
        id
    }

    fn add_epsilon(&mut self, from: StateId, to: StateId) {
        self.states[from].epsilon_transitions.push(to);
    }

    fn add_transition(&mut self, from: StateId, ch: char, to: StateId) {
        self.states[from].transitions.entry(ch).or_default().push(to);
    }

    /// Compiles a concatenation of tokens: each token gets its own fragment, ε-linked in
    /// series. An empty sequence is a single state with no outgoing edge — its entry and exit
    /// coincide, and the caller (e.g. an empty `Group`) decides whether that's reachable.
    fn sequence(&mut self, seq: &[Token]) -> Fragment {
        match seq {
            [] => {
                let s = self.fresh_state();
                Fragment { start: s, end: s }
            }
            [first, rest @ ..] => {
                let mut frag = self.token(first);
                for token in rest {
                    let next = self.token(token);
                    self.add_epsilon(frag.end, next.start);
                    frag = Fragment {
                        start: frag.start,
                        end: next.end,
                    };
                }
                frag
            }
        }
    }

    fn token(&mut self, token: &Token) -> Fragment {
        match token {
            Token::Literal(ch) => {
                let s = self.fresh_state();
                let e = self.fresh_state();
                self.add_transition(s, *ch, e);
                Fragment { start: s, end: e }
            }
            Token::Bracket(set) => {
                let s = self.fresh_state();
                let e = self.fresh_state();
                for &ch in set {
                    self.add_transition(s, ch, e);
                }
                Fragment { start: s, end: e }
            }
            Token::Group(seq) => {
                if seq.is_empty() {
                    let s = self.fresh_state();
                    let e = self.fresh_state();
                    self.add_epsilon(s, e);
                    Fragment { start: s, end: e }
                } else {
                    self.sequence(seq)
                }
            }
            Token::Or(left, right) => {
                let s = self.fresh_state();
                let e = self.fresh_state();
                let fl = self.sequence(left);
                let fr = self.sequence(right);
                self.add_epsilon(s, fl.start);
                self.add_epsilon(s, fr.start);
                self.add_epsilon(fl.end, e);
                self.add_epsilon(fr.end, e);
                Fragment { start: s, end: e }
            }
            Token::Repeat(quantifier, inner) => self.repeat(*quantifier, inner),
        }
    }

    /// Each call to `self.token(inner)` below allocates a brand-new sub-graph. Sharing one
    /// compiled copy of `inner` across repetitions would let the second occurrence loop back
    /// into the first and corrupt the language, so every occurrence gets a fresh fragment.
    fn repeat(&mut self, quantifier: Quantifier, inner: &Token) -> Fragment {
        let s = self.fresh_state();
        let e = self.fresh_state();
        match (quantifier.min, quantifier.max) {
            (0, Bound::Finite(0)) => {
                self.add_epsilon(s, e);
            }
            (0, Bound::Infinite) => {
                let i = self.token(inner);
                self.add_epsilon(s, i.start);
                self.add_epsilon(s, e);
                self.add_epsilon(i.end, i.start);
                self.add_epsilon(i.end, e);
            }
            (1, Bound::Infinite) => {
                let i = self.token(inner);
                self.add_epsilon(s, i.start);
                self.add_epsilon(i.end, i.start);
                self.add_epsilon(i.end, e);
            }
            (0, Bound::Finite(1)) => {
                let i = self.token(inner);
                self.add_epsilon(s, i.start);
                self.add_epsilon(s, e);
                self.add_epsilon(i.end, e);
            }
            (min, max) => {
                let mut cursor = s;
                for _ in 0..min {
                    let i = self.token(inner);
                    self.add_epsilon(cursor, i.start);
                    cursor = i.end;
                }
                match max {
                    Bound::Infinite => {
                        let i = self.token(inner);
                        self.add_epsilon(cursor, i.start);
                        self.add_epsilon(i.end, i.start);
                        self.add_epsilon(i.end, e);
                        self.add_epsilon(cursor, e);
                    }
                    Bound::Finite(max) => {
                        for _ in min..max {
                            let i = self.token(inner);
                            self.add_epsilon(cursor, i.start);
                            let next_cursor = self.fresh_state();
                            self.add_epsilon(cursor, next_cursor);
                            self.add_epsilon(i.end, next_cursor);
                            cursor = next_cursor;
                        }
                        self.add_epsilon(cursor, e);
                    }
                }
            }
        }
        Fragment { start: s, end: e }
    }
}
