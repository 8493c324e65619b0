/*!
The deterministic automaton: compilation by Brzozowski derivatives and the
interpreted matcher.

Each DFA state *is* a normalised expression: the start state is the
normalised pattern and the state reached on a byte is the normalised
derivative. Because normalisation gives structurally equal expressions to
equal derivative classes, the breadth-first discovery below terminates with
one state per class.
*/

use std::collections::{BTreeMap, VecDeque};

use crate::{
    exp::{Exp, Kind},
    util::alphabet::Unit,
    StateID,
};

/// A deterministic finite automaton over bytes.
///
/// Transitions use the default-transition encoding: every state has one
/// edge labelled [`Unit::Rest`] covering the bytes of its Σ-based partition
/// block, and concrete byte edges only where the target differs from the
/// default. Immutable after compilation; matching needs no interior state.
#[derive(Clone, Debug)]
pub struct Dfa {
    error: Option<StateID>,
    empty: Option<StateID>,
    accepting: Vec<bool>,
    transitions: BTreeMap<(StateID, Unit), StateID>,
}

impl Dfa {
    /// Returns the number of states in this automaton.
    pub fn state_len(&self) -> usize {
        self.accepting.len()
    }

    /// Returns the dead state (the state whose expression is ∅), if the
    /// automaton has one.
    pub fn error_state(&self) -> Option<StateID> {
        self.error
    }

    /// Returns the state whose expression is ε, if the automaton has one.
    pub fn empty_state(&self) -> Option<StateID> {
        self.empty
    }

    /// Returns true if and only if the given state is accepting.
    pub fn is_accepting(&self, state: StateID) -> bool {
        self.accepting[state]
    }

    /// Returns the state reached from `state` on `byte`: the concrete edge
    /// if one exists, otherwise the state's default edge.
    pub fn next_state(&self, state: StateID, byte: u8) -> StateID {
        match self.transitions.get(&(state, Unit::Byte(byte))) {
            Some(&next) => next,
            None => self.transitions[&(state, Unit::Rest)],
        }
    }

    /// Returns the concrete byte edges leaving `state`, together with the
    /// state's default target. Used by the native back-end's first-byte
    /// analysis.
    pub(crate) fn edges(
        &self,
        state: StateID,
    ) -> (Vec<(u8, StateID)>, StateID) {
        let mut bytes = Vec::new();
        let mut default = 0;
        let range =
            (state, Unit::Byte(u8::MIN))..=(state, Unit::Rest);
        for (&(_, unit), &target) in self.transitions.range(range) {
            match unit {
                Unit::Byte(byte) => bytes.push((byte, target)),
                Unit::Rest => default = target,
            }
        }
        (bytes, default)
    }

    /// Returns whether the whole input is accepted, by walking from state
    /// 0 and testing the final state. Runs in O(|input|) with constant
    /// memory.
    pub fn matches(&self, input: &[u8]) -> bool {
        let mut state = 0;
        for &byte in input {
            state = self.next_state(state, byte);
        }
        self.is_accepting(state)
    }
}

/// Compiles `exp` into a DFA by breadth-first discovery of its normalised
/// derivatives.
///
/// `exp` must be group free (see [`crate::rewrite::strip_groups`]): the
/// Brzozowski derivative does not accept groups.
pub fn compile_dfa(exp: &Exp) -> Dfa {
    let mut dfa = Dfa {
        error: None,
        empty: None,
        accepting: Vec::new(),
        transitions: BTreeMap::new(),
    };
    let mut states: BTreeMap<Exp, StateID> = BTreeMap::new();
    let mut queue: VecDeque<Exp> = VecDeque::new();

    let start = exp.normalised();
    states.insert(start.clone(), 0);
    queue.push_back(start);

    while let Some(exp) = queue.pop_front() {
        let state = states[&exp];
        if dfa.accepting.len() <= state {
            dfa.accepting.resize(state + 1, false);
        }
        dfa.accepting[state] = exp.is_nullable();
        match exp.kind() {
            Kind::EmptySet => dfa.error = Some(state),
            Kind::EmptyString => dfa.empty = Some(state),
            _ => {}
        }

        let partitions = exp.partitions();
        let mut default = 0;
        for (i, block) in partitions.iter().enumerate() {
            let unit = if i == 0 {
                // The Σ-based head: derive with respect to a byte the
                // block does not single out.
                Unit::Rest
            } else {
                // A ∅-based block: any byte of the block represents it.
                Unit::Byte(block.first().unwrap())
            };
            let derivative = exp.derivative(unit).normalised();
            let target = match states.get(&derivative) {
                Some(&target) => target,
                None => {
                    let target = states.len();
                    states.insert(derivative.clone(), target);
                    queue.push_back(derivative);
                    trace!("discovered state {}", target);
                    target
                }
            };
            if i == 0 {
                dfa.transitions.insert((state, Unit::Rest), target);
                default = target;
            } else if target != default {
                for byte in block.iter() {
                    dfa.transitions.insert((state, Unit::Byte(byte)), target);
                }
            }
        }
    }
    debug!(
        "compiled DFA: {} states, {} transitions",
        states.len(),
        dfa.transitions.len(),
    );
    dfa
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exp;

    #[test]
    fn empty_set_and_empty_string() {
        let dfa = compile_dfa(&exp::empty_set());
        assert_eq!(dfa.state_len(), 1);
        assert_eq!(dfa.error_state(), Some(0));
        assert!(!dfa.matches(b""));
        assert!(!dfa.matches(b"a"));

        let dfa = compile_dfa(&exp::empty_string());
        assert_eq!(dfa.empty_state(), Some(0));
        assert!(dfa.matches(b""));
        assert!(!dfa.matches(b"a"));
    }

    #[test]
    fn literal_concatenation() {
        let dfa = compile_dfa(&exp::concatenation(
            exp::byte(b'a'),
            exp::byte(b'a'),
        ));
        assert!(!dfa.matches(b""));
        assert!(!dfa.matches(b"a"));
        assert!(dfa.matches(b"aa"));
        assert!(!dfa.matches(b"aaa"));
        assert!(!dfa.matches(b"ab"));
    }

    #[test]
    fn kleene_closure_reuses_states() {
        // a∗ needs exactly two states: itself and the dead state.
        let dfa = compile_dfa(&exp::kleene_closure(exp::byte(b'a')));
        assert_eq!(dfa.state_len(), 2);
        assert!(dfa.matches(b""));
        assert!(dfa.matches(b"aaaa"));
        assert!(!dfa.matches(b"ab"));
    }

    #[test]
    fn complement_accepts_everything_else() {
        let dfa = compile_dfa(&exp::complement(exp::byte(b'a')));
        assert!(dfa.matches(b""));
        assert!(!dfa.matches(b"a"));
        assert!(dfa.matches(b"aa"));
        assert!(dfa.matches(b"b"));
    }

    #[test]
    fn conjunction_intersects() {
        // a\C ∩ \Cb: exactly two bytes, starting a, ending b.
        let exp = exp::conjunction(vec![
            exp::concatenation(exp::byte(b'a'), exp::any_byte()),
            exp::concatenation(exp::any_byte(), exp::byte(b'b')),
        ]);
        let dfa = compile_dfa(&exp);
        assert!(dfa.matches(b"ab"));
        assert!(!dfa.matches(b"aa"));
        assert!(!dfa.matches(b"ba"));
        assert!(!dfa.matches(b"bb"));
        assert!(!dfa.matches(b"a"));
        assert!(!dfa.matches(b"abb"));
    }

    #[test]
    fn matches_agrees_with_derivative_fold() {
        let exps = vec![
            exp::kleene_closure(exp::disjunction(vec![
                exp::byte(b'a'),
                exp::concatenation(exp::byte(b'b'), exp::byte(b'c')),
            ])),
            exp::complement(exp::kleene_closure(exp::byte(b'a'))),
            exp::conjunction(vec![
                exp::kleene_closure(exp::byte_range(b'a', b'z')),
                exp::complement(exp::empty_string()),
            ]),
        ];
        let inputs: &[&[u8]] = &[
            b"", b"a", b"b", b"ab", b"bc", b"abc", b"aaa", b"zzz", b"bcbca",
        ];
        for exp in exps {
            let dfa = compile_dfa(&exp);
            for input in inputs {
                assert_eq!(
                    dfa.matches(input),
                    exp.matches(input),
                    "DFA and derivative fold disagree on {:?} / {:?}",
                    exp,
                    input,
                );
            }
        }
    }

    #[test]
    fn compilation_is_deterministic() {
        let exp = exp::kleene_closure(exp::disjunction(vec![
            exp::byte(b'a'),
            exp::byte(b'b'),
        ]));
        let first = compile_dfa(&exp);
        let second = compile_dfa(&exp);
        assert_eq!(first.state_len(), second.state_len());
    }
}
