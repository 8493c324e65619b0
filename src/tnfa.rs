/*!
The tagged nondeterministic automaton: compilation by Antimirov partial
derivatives and the thread-based matcher that resolves sub-matches.

States are normalised expressions, as in the DFA, but a transition fans out
to every cell of the partial derivative and carries that cell's
[`Bindings`]. The matcher simulates the automaton with a priority-ordered
list of threads, each carrying its own capture offsets; the order is the
per-group greedy/lazy/passive discipline of [`Tnfa::matches`].
*/

use std::{
    cmp::Ordering,
    collections::{BTreeMap, VecDeque},
};

use crate::{
    exp::{Exp, Kind, Mode},
    partial::{epsilon_bindings, partial, BindingKind, Bindings},
    util::alphabet::Unit,
    StateID,
};

/// A tagged nondeterministic finite automaton.
///
/// Besides the transition multimap, the automaton carries the mode of every
/// group (indexed by group number), the numbers of the capturing groups,
/// and for each accepting state the terminal bindings that close the groups
/// still open when input ends there.
#[derive(Clone, Debug)]
pub struct Tnfa {
    error: Option<StateID>,
    empty: Option<StateID>,
    accepting: Vec<bool>,
    modes: Vec<Mode>,
    captures: Vec<i32>,
    transitions: BTreeMap<(StateID, Unit), Vec<(StateID, Bindings)>>,
    finals: BTreeMap<StateID, Bindings>,
}

impl Tnfa {
    /// Returns the number of states in this automaton.
    pub fn state_len(&self) -> usize {
        self.accepting.len()
    }

    /// Returns the number of capturing groups.
    pub fn capture_len(&self) -> usize {
        self.captures.len()
    }

    /// Returns the state whose expression is ∅, if the automaton has one.
    pub fn error_state(&self) -> Option<StateID> {
        self.error
    }

    /// Returns the state whose expression is ε, if the automaton has one.
    pub fn empty_state(&self) -> Option<StateID> {
        self.empty
    }

    /// Matches the whole input, resolving sub-matches.
    ///
    /// Returns `None` if the input is not in the language. Otherwise the
    /// returned vector has length `2·capture_len()`, holding the begin and
    /// end offset of each capturing group in order; −1 in both slots means
    /// the group did not match.
    pub fn matches(&self, input: &[u8]) -> Option<Vec<i32>> {
        let offsets_len = 2 * self.modes.len();
        let mut threads: Vec<(StateID, Vec<i32>)> =
            vec![(0, vec![-1; offsets_len])];
        for (pos, &byte) in input.iter().enumerate() {
            // A state may be reached by several threads in one round; the
            // first thread in priority order claims it.
            let mut visited = vec![false; self.state_len()];
            let mut next: Vec<(StateID, Vec<i32>)> = Vec::new();
            for (state, offsets) in &threads {
                let edges = match self
                    .transitions
                    .get(&(*state, Unit::Byte(byte)))
                {
                    Some(edges) => edges,
                    None => match self.transitions.get(&(*state, Unit::Rest))
                    {
                        Some(edges) => edges,
                        None => continue,
                    },
                };
                let mut local: Vec<(StateID, Vec<i32>)> = Vec::new();
                for (target, bindings) in edges {
                    if visited[*target] || self.error == Some(*target) {
                        continue;
                    }
                    visited[*target] = true;
                    let mut offsets = offsets.clone();
                    apply_bindings(bindings, pos as i32, &mut offsets);
                    local.push((*target, offsets));
                }
                local.sort_by(|x, y| self.precedes(&x.1, &y.1));
                next.extend(local);
            }
            threads = next;
            if threads.is_empty() {
                return None;
            }
        }
        let pos = input.len() as i32;
        for (state, mut offsets) in threads {
            if !self.accepting[state] {
                continue;
            }
            if let Some(bindings) = self.finals.get(&state) {
                apply_bindings(bindings, pos, &mut offsets);
            }
            let mut result = Vec::with_capacity(2 * self.captures.len());
            for &group in &self.captures {
                result.push(offsets[2 * group as usize]);
                result.push(offsets[2 * group as usize + 1]);
            }
            return Some(result);
        }
        None
    }

    /// The thread priority order: compares two offset vectors group by
    /// group under the modes vector. A group that matched beats one that
    /// did not; among matched groups, `Passive` expresses no further
    /// preference, earlier begins win, and ties on begin fall to the end
    /// offsets, where `Maximal` prefers later and `Minimal` earlier.
    fn precedes(&self, x: &[i32], y: &[i32]) -> Ordering {
        for (i, &mode) in self.modes.iter().enumerate() {
            let l = 2 * i;
            let r = l + 1;
            match (x[l] == -1, y[l] == -1) {
                (true, true) => continue,
                (true, false) => return Ordering::Greater,
                (false, true) => return Ordering::Less,
                (false, false) => {}
            }
            if mode == Mode::Passive {
                continue;
            }
            if x[l] != y[l] {
                return x[l].cmp(&y[l]);
            }
            if x[r] != y[r] {
                return match mode {
                    Mode::Minimal => x[r].cmp(&y[r]),
                    Mode::Maximal => y[r].cmp(&x[r]),
                    Mode::Passive => unreachable!(),
                };
            }
        }
        Ordering::Equal
    }
}

fn apply_bindings(bindings: &Bindings, pos: i32, offsets: &mut [i32]) {
    for &(group, kind) in bindings {
        let l = 2 * group as usize;
        let r = l + 1;
        match kind {
            BindingKind::Cancel => {
                if offsets[l] != -1 {
                    offsets[l] = -1;
                    offsets[r] = -1;
                }
            }
            BindingKind::Epsilon => {
                if offsets[l] == -1 {
                    offsets[l] = pos;
                    offsets[r] = pos;
                }
            }
            BindingKind::Append => {
                if offsets[l] == -1 {
                    offsets[l] = pos;
                    offsets[r] = pos;
                }
                offsets[r] += 1;
            }
        }
    }
}

/// Compiles `exp` into a TNFA by breadth-first discovery of its normalised
/// partial derivatives.
///
/// `modes` and `captures` are the group table from
/// [`crate::parse_with_groups`]: the mode of every group by number, and
/// the numbers of the capturing groups in order.
pub fn compile_tnfa(exp: &Exp, modes: Vec<Mode>, captures: Vec<i32>) -> Tnfa {
    let mut tnfa = Tnfa {
        error: None,
        empty: None,
        accepting: Vec::new(),
        modes,
        captures,
        transitions: BTreeMap::new(),
        finals: BTreeMap::new(),
    };
    let mut states: BTreeMap<Exp, StateID> = BTreeMap::new();
    let mut queue: VecDeque<Exp> = VecDeque::new();

    let start = exp.normalised();
    states.insert(start.clone(), 0);
    queue.push_back(start);

    while let Some(exp) = queue.pop_front() {
        let state = states[&exp];
        if tnfa.accepting.len() <= state {
            tnfa.accepting.resize(state + 1, false);
        }
        let accepting = exp.is_nullable();
        tnfa.accepting[state] = accepting;
        match exp.kind() {
            Kind::EmptySet => tnfa.error = Some(state),
            Kind::EmptyString => tnfa.empty = Some(state),
            _ => {}
        }
        if accepting {
            tnfa.finals.insert(state, epsilon_bindings(&exp));
        }

        let partitions = exp.partitions();
        for (i, block) in partitions.iter().enumerate() {
            let unit = if i == 0 {
                Unit::Rest
            } else {
                Unit::Byte(block.first().unwrap())
            };
            let outer = partial(&exp, unit);
            let mut edges: Vec<(StateID, Bindings)> = Vec::new();
            for (inner, bindings) in outer {
                let inner = inner.normalised();
                let target = match states.get(&inner) {
                    Some(&target) => target,
                    None => {
                        let target = states.len();
                        states.insert(inner.clone(), target);
                        queue.push_back(inner);
                        trace!("discovered state {}", target);
                        target
                    }
                };
                let edge = (target, bindings);
                if !edges.contains(&edge) {
                    edges.push(edge);
                }
            }
            if edges.is_empty() {
                continue;
            }
            if i == 0 {
                tnfa.transitions.insert((state, Unit::Rest), edges);
            } else {
                for byte in block.iter() {
                    tnfa.transitions
                        .insert((state, Unit::Byte(byte)), edges.clone());
                }
            }
        }
    }
    debug!(
        "compiled TNFA: {} states, {} groups, {} captures",
        states.len(),
        tnfa.modes.len(),
        tnfa.captures.len(),
    );
    tnfa
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_with_groups;

    fn tnfa(pattern: &str) -> Tnfa {
        let (exp, modes, captures) = parse_with_groups(pattern).unwrap();
        compile_tnfa(&exp, modes, captures)
    }

    #[test]
    fn single_capture() {
        let tnfa = tnfa("(a)");
        assert_eq!(tnfa.capture_len(), 1);
        assert_eq!(tnfa.matches(b"a"), Some(vec![0, 1]));
        assert_eq!(tnfa.matches(b""), None);
        assert_eq!(tnfa.matches(b"b"), None);
        assert_eq!(tnfa.matches(b"aa"), None);
    }

    #[test]
    fn no_captures_still_matches() {
        let tnfa = tnfa("a*");
        assert_eq!(tnfa.capture_len(), 0);
        assert_eq!(tnfa.matches(b""), Some(vec![]));
        assert_eq!(tnfa.matches(b"aaa"), Some(vec![]));
        assert_eq!(tnfa.matches(b"b"), None);
    }

    #[test]
    fn capture_under_kleene_reports_last_iteration() {
        let tnfa = tnfa("(a)*");
        assert_eq!(tnfa.matches(b""), Some(vec![-1, -1]));
        assert_eq!(tnfa.matches(b"a"), Some(vec![0, 1]));
        assert_eq!(tnfa.matches(b"aaa"), Some(vec![2, 3]));
    }

    #[test]
    fn alternative_selection() {
        let tnfa = tnfa("(a|ab)");
        // Only the alternative that spans the whole input can win a full
        // match.
        assert_eq!(tnfa.matches(b"a"), Some(vec![0, 1]));
        assert_eq!(tnfa.matches(b"ab"), Some(vec![0, 2]));
    }

    #[test]
    fn unmatched_optional_group() {
        let tnfa = tnfa("(a)?b");
        assert_eq!(tnfa.matches(b"b"), Some(vec![-1, -1]));
        assert_eq!(tnfa.matches(b"ab"), Some(vec![0, 1]));
    }

    #[test]
    fn empty_input_closes_groups_at_zero() {
        let tnfa = tnfa("(a*)(b*)");
        assert_eq!(tnfa.matches(b""), Some(vec![0, 0, 0, 0]));
        assert_eq!(tnfa.matches(b"aab"), Some(vec![0, 2, 2, 3]));
    }

    #[test]
    fn complement_groups_do_not_capture() {
        let tnfa = tnfa("!a");
        assert_eq!(tnfa.capture_len(), 0);
        assert_eq!(tnfa.matches(b""), Some(vec![]));
        assert_eq!(tnfa.matches(b"a"), None);
        assert_eq!(tnfa.matches(b"aa"), Some(vec![]));
    }

    #[test]
    fn agreement_with_the_dfa_on_acceptance() {
        let patterns =
            ["a*b", "(a|b)*", "a.&.b", "!(ab)", "(a)(b)(c)", "[0-9]{2,4}"];
        let inputs: &[&[u8]] = &[
            b"", b"a", b"b", b"ab", b"ba", b"abc", b"aab", b"12", b"12345",
        ];
        for pattern in patterns {
            let tnfa = tnfa(pattern);
            let dfa = crate::compile_dfa(&crate::parse(pattern).unwrap());
            for input in inputs {
                assert_eq!(
                    tnfa.matches(input).is_some(),
                    dfa.matches(input),
                    "TNFA and DFA disagree on {:?} / {:?}",
                    pattern,
                    input,
                );
            }
        }
    }
}
