/*!
The structural recursions that drive automaton construction: nullability,
the Brzozowski derivative and the partitioning of the input alphabet.

The three are mutually consistent: for any expression `e` and any two bytes
drawn from the same block of `e.partitions()`, the normalised derivatives of
`e` are equal, and `e` accepts a string exactly when the derivative chain
over the string's bytes ends in a nullable expression.
*/

use crate::{
    exp::{self, Exp, Node},
    util::alphabet::{partition_intersection, ByteSet, Unit},
};

impl Exp {
    /// Returns true if and only if the empty string is in the language of
    /// this expression.
    pub fn is_nullable(&self) -> bool {
        match *self.node() {
            // ν(∅) = false, ν(ε) = true
            Node::EmptySet => false,
            Node::EmptyString => true,
            // No single-byte expression matches ε.
            Node::AnyByte | Node::Byte(_) | Node::ByteRange(..) => false,
            // ν(r∗) = true
            Node::KleeneClosure(_) => true,
            // ν(r · s) = ν(r) ∧ ν(s)
            Node::Concatenation(ref head, ref tail) => {
                head.is_nullable() && tail.is_nullable()
            }
            // ν(¬r) = ¬ν(r)
            Node::Complement(ref sub) => !sub.is_nullable(),
            // ν(r & s) = ν(r) ∧ ν(s)
            Node::Conjunction(ref subs) => {
                subs.iter().all(Exp::is_nullable)
            }
            // ν(r + s) = ν(r) ∨ ν(s)
            Node::Disjunction(ref subs) => {
                subs.iter().any(Exp::is_nullable)
            }
            Node::Group { ref sub, .. } => sub.is_nullable(),
            Node::CharacterClass { .. } | Node::Quantifier { .. } => {
                unreachable!("nullability of ephemeral {:?}", self.kind())
            }
        }
    }

    /// Returns the Brzozowski derivative of this expression with respect to
    /// the given input unit: the expression whose language is
    /// `{s | u·s ∈ L(self)}`.
    ///
    /// The result is not normalised; callers that need canonical form (for
    /// example to key automaton states) normalise it themselves.
    ///
    /// `Group` is not a valid input: groups are stripped before anything
    /// takes a Brzozowski derivative. Only the Antimirov path understands
    /// groups.
    pub fn derivative(&self, unit: Unit) -> Exp {
        match *self.node() {
            // ∂u∅ = ∂uε = ∅
            Node::EmptySet | Node::EmptyString => exp::empty_set(),
            // ∂u\C = ε
            Node::AnyByte => exp::empty_string(),
            // ∂aa = ε, ∂ab = ∅ for b ≠ a
            Node::Byte(byte) => {
                if unit.as_byte() == Some(byte) {
                    exp::empty_string()
                } else {
                    exp::empty_set()
                }
            }
            // ∂aS = ε if a ∈ S, else ∅
            Node::ByteRange(lo, hi) => match unit.as_byte() {
                Some(byte) if lo <= byte && byte <= hi => exp::empty_string(),
                _ => exp::empty_set(),
            },
            // ∂u(r∗) = ∂ur · r∗
            Node::KleeneClosure(ref sub) => {
                exp::concatenation(sub.derivative(unit), self.clone())
            }
            // ∂u(r · s) = ∂ur · s          if ¬ν(r)
            //           = ∂ur · s + ∂us    if  ν(r)
            Node::Concatenation(ref head, ref tail) => {
                if head.is_nullable() {
                    exp::disjunction(vec![
                        exp::concatenation(
                            head.derivative(unit),
                            tail.clone(),
                        ),
                        tail.derivative(unit),
                    ])
                } else {
                    exp::concatenation(head.derivative(unit), tail.clone())
                }
            }
            // ∂u(¬r) = ¬(∂ur)
            Node::Complement(ref sub) => {
                exp::complement(sub.derivative(unit))
            }
            // ∂u(r & s) = ∂ur & ∂us
            Node::Conjunction(ref subs) => exp::conjunction(
                subs.iter().map(|sub| sub.derivative(unit)).collect(),
            ),
            // ∂u(r + s) = ∂ur + ∂us
            Node::Disjunction(ref subs) => exp::disjunction(
                subs.iter().map(|sub| sub.derivative(unit)).collect(),
            ),
            Node::Group { .. } => {
                unreachable!(
                    "Brzozowski derivative of Group; strip groups first"
                )
            }
            Node::CharacterClass { .. } | Node::Quantifier { .. } => {
                unreachable!("derivative of ephemeral {:?}", self.kind())
            }
        }
    }

    /// Returns the partitioning of the input alphabet for this expression:
    /// the coarsest partition such that the derivative of the expression is
    /// constant on each block.
    ///
    /// The head of the returned list is Σ-based (the stored set holds the
    /// bytes *excluded* from the block); every other element is ∅-based.
    /// See [`crate::util::alphabet::partition_intersection`].
    pub fn partitions(&self) -> Vec<ByteSet> {
        match *self.node() {
            // C(∅) = C(ε) = C(\C) = {Σ}
            Node::EmptySet | Node::EmptyString | Node::AnyByte => {
                vec![ByteSet::empty()]
            }
            // C(a) = {Σ \ a, a}
            Node::Byte(byte) => {
                let set = ByteSet::singleton(byte);
                vec![set, set]
            }
            // C(S) = {Σ \ S, S}
            Node::ByteRange(lo, hi) => {
                let set = ByteSet::range(lo, hi);
                vec![set, set]
            }
            // C(r∗) = C(¬r) = C(r)
            Node::KleeneClosure(ref sub) | Node::Complement(ref sub) => {
                sub.partitions()
            }
            Node::Group { ref sub, .. } => sub.partitions(),
            // C(r · s) = C(r) ∧ C(s) if ν(r), else C(r)
            Node::Concatenation(ref head, ref tail) => {
                if head.is_nullable() {
                    partition_intersection(
                        &head.partitions(),
                        &tail.partitions(),
                    )
                } else {
                    head.partitions()
                }
            }
            // C(r & s) = C(r + s) = C(r) ∧ C(s)
            Node::Conjunction(ref subs) | Node::Disjunction(ref subs) => {
                let mut partitions: Option<Vec<ByteSet>> = None;
                for sub in subs {
                    partitions = Some(match partitions {
                        None => sub.partitions(),
                        Some(acc) => {
                            partition_intersection(&acc, &sub.partitions())
                        }
                    });
                }
                partitions.unwrap_or_else(|| vec![ByteSet::empty()])
            }
            Node::CharacterClass { .. } | Node::Quantifier { .. } => {
                unreachable!("partitions of ephemeral {:?}", self.kind())
            }
        }
    }

    /// Returns whether the whole input is in the language of this
    /// expression, by folding the derivative over its bytes and testing the
    /// nullability of the residue.
    ///
    /// This is the reference matcher the automata are checked against. The
    /// expression must be group free.
    pub fn matches(&self, input: &[u8]) -> bool {
        let mut exp = self.clone();
        for &byte in input {
            exp = exp.derivative(Unit::Byte(byte)).normalised();
        }
        exp.is_nullable()
    }
}

/// Returns the result of matching `input` against `exp`. Equivalent to
/// [`Exp::matches`].
pub fn match_exp(exp: &Exp, input: &[u8]) -> bool {
    exp.matches(input)
}
