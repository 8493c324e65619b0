/*!
Post-parse tree walks.

The parser produces a tree that still contains the ephemeral kinds
(`CharacterClass`, `Quantifier`) and un-numbered groups. Before an
expression reaches a compiler, it passes through the rewrites below:

* [`flatten`] turns nested conjunctions and disjunctions into n-ary ones so
  later walks see whole alternative lists;
* [`strip_groups`] removes every group for the Brzozowski/DFA path;
* [`apply_groups`] adds the tracking groups the TNFA path needs (one
  passive group per disjunction alternative, one maximal group around each
  complement);
* [`number_groups`] assigns monotonic group numbers and records each
  group's mode and whether it captures;
* [`expand_character_classes`] lowers classes to byte-level disjunctions;
* [`expand_quantifiers`] unrolls counted repetitions under a budget.

The order matters: groups are applied and numbered before classes and
quantifiers expand, so the disjunctions created by expansion are not
mistaken for source-level alternatives and group numbering is independent
of repetition counts.
*/

use crate::{
    error::Error,
    exp::{self, Exp, Mode, Node},
};

/// The default limit on the number of subexpressions a counted repetition
/// may expand to. The budget divides multiplicatively through nested
/// quantifiers: `a{100}{20}` needs 100 × 20 ≥ budget and fails.
pub const QUANTIFIER_BUDGET: usize = 1000;

/// Flattens directly nested conjunctions and disjunctions into their
/// parents, so that `a|b|c` is one disjunction of three alternatives
/// rather than a skewed tree of binary ones.
pub fn flatten(exp: &Exp) -> Exp {
    match *exp.node() {
        Node::EmptySet
        | Node::EmptyString
        | Node::AnyByte
        | Node::Byte(_)
        | Node::ByteRange(..)
        | Node::CharacterClass { .. } => exp.clone(),
        Node::Group { num, ref sub, mode, capture } => {
            exp::group(num, flatten(sub), mode, capture)
        }
        Node::KleeneClosure(ref sub) => exp::kleene_closure(flatten(sub)),
        Node::Concatenation(ref head, ref tail) => {
            exp::concatenation(flatten(head), flatten(tail))
        }
        Node::Complement(ref sub) => exp::complement(flatten(sub)),
        Node::Conjunction(ref subs) => {
            let mut flat = Vec::with_capacity(subs.len());
            for sub in subs {
                let sub = flatten(sub);
                if sub.kind() == exp::Kind::Conjunction {
                    flat.extend(sub.subexpressions().iter().cloned());
                } else {
                    flat.push(sub);
                }
            }
            exp::conjunction(flat)
        }
        Node::Disjunction(ref subs) => {
            let mut flat = Vec::with_capacity(subs.len());
            for sub in subs {
                let sub = flatten(sub);
                if sub.kind() == exp::Kind::Disjunction {
                    flat.extend(sub.subexpressions().iter().cloned());
                } else {
                    flat.push(sub);
                }
            }
            exp::disjunction(flat)
        }
        Node::Quantifier { ref sub, min, max } => {
            exp::quantifier(flatten(sub), min, max)
        }
    }
}

/// Removes every group from the tree. The Brzozowski derivative does not
/// understand groups, so the DFA path runs on the stripped tree.
pub fn strip_groups(exp: &Exp) -> Exp {
    match *exp.node() {
        Node::EmptySet
        | Node::EmptyString
        | Node::AnyByte
        | Node::Byte(_)
        | Node::ByteRange(..)
        | Node::CharacterClass { .. } => exp.clone(),
        Node::Group { ref sub, .. } => strip_groups(sub),
        Node::KleeneClosure(ref sub) => exp::kleene_closure(strip_groups(sub)),
        Node::Concatenation(ref head, ref tail) => {
            exp::concatenation(strip_groups(head), strip_groups(tail))
        }
        Node::Complement(ref sub) => exp::complement(strip_groups(sub)),
        Node::Conjunction(ref subs) => {
            exp::conjunction(subs.iter().map(strip_groups).collect())
        }
        Node::Disjunction(ref subs) => {
            exp::disjunction(subs.iter().map(strip_groups).collect())
        }
        Node::Quantifier { ref sub, min, max } => {
            exp::quantifier(strip_groups(sub), min, max)
        }
    }
}

/// Adds the groups the TNFA path needs for sub-match resolution: each
/// disjunction alternative is wrapped in a passive non-capturing group (so
/// thread ordering can tell which alternative a thread took), and each
/// complement is wrapped in a maximal non-capturing group.
///
/// The any-character idiom — the exact disjunction `.` expands to — is
/// left alone: wrapping its alternatives in groups would block the
/// normaliser's `.* ≈ ¬∅` collapse.
pub fn apply_groups(exp: &Exp) -> Exp {
    match *exp.node() {
        Node::EmptySet
        | Node::EmptyString
        | Node::AnyByte
        | Node::Byte(_)
        | Node::ByteRange(..)
        | Node::CharacterClass { .. } => exp.clone(),
        Node::Group { num, ref sub, mode, capture } => {
            exp::group(num, apply_groups(sub), mode, capture)
        }
        Node::KleeneClosure(ref sub) => exp::kleene_closure(apply_groups(sub)),
        Node::Concatenation(ref head, ref tail) => {
            exp::concatenation(apply_groups(head), apply_groups(tail))
        }
        Node::Complement(ref sub) => exp::group(
            -1,
            exp::complement(apply_groups(sub)),
            Mode::Maximal,
            false,
        ),
        Node::Conjunction(ref subs) => {
            exp::conjunction(subs.iter().map(apply_groups).collect())
        }
        Node::Disjunction(ref subs) => {
            if *exp == exp::any_character() {
                return exp.clone();
            }
            exp::disjunction(
                subs.iter()
                    .map(|sub| {
                        exp::group(-1, apply_groups(sub), Mode::Passive, false)
                    })
                    .collect(),
            )
        }
        Node::Quantifier { ref sub, min, max } => {
            exp::quantifier(apply_groups(sub), min, max)
        }
    }
}

/// Assigns monotonic numbers to every group in pre-order, returning the
/// renumbered tree together with the mode of each group (indexed by group
/// number) and the numbers of the groups that capture, in order.
pub fn number_groups(exp: &Exp) -> (Exp, Vec<Mode>, Vec<i32>) {
    fn walk(exp: &Exp, modes: &mut Vec<Mode>, captures: &mut Vec<i32>) -> Exp {
        match *exp.node() {
            Node::EmptySet
            | Node::EmptyString
            | Node::AnyByte
            | Node::Byte(_)
            | Node::ByteRange(..)
            | Node::CharacterClass { .. } => exp.clone(),
            Node::Group { ref sub, mode, capture, .. } => {
                let num = modes.len() as i32;
                modes.push(mode);
                if capture {
                    captures.push(num);
                }
                let sub = walk(sub, modes, captures);
                exp::group(num, sub, mode, capture)
            }
            Node::KleeneClosure(ref sub) => {
                exp::kleene_closure(walk(sub, modes, captures))
            }
            Node::Concatenation(ref head, ref tail) => exp::concatenation(
                walk(head, modes, captures),
                walk(tail, modes, captures),
            ),
            Node::Complement(ref sub) => {
                exp::complement(walk(sub, modes, captures))
            }
            Node::Conjunction(ref subs) => exp::conjunction(
                subs.iter().map(|sub| walk(sub, modes, captures)).collect(),
            ),
            Node::Disjunction(ref subs) => exp::disjunction(
                subs.iter().map(|sub| walk(sub, modes, captures)).collect(),
            ),
            Node::Quantifier { ref sub, min, max } => {
                exp::quantifier(walk(sub, modes, captures), min, max)
            }
        }
    }
    let mut modes = Vec::new();
    let mut captures = Vec::new();
    let exp = walk(exp, &mut modes, &mut captures);
    (exp, modes, captures)
}

/// Lowers every character class to byte-level expressions: a disjunction
/// of the classed characters, and for a negated class the conjunction of
/// that disjunction's complement with the any-character idiom (so the
/// class still matches exactly one character).
pub fn expand_character_classes(exp: &Exp) -> Exp {
    match *exp.node() {
        Node::EmptySet
        | Node::EmptyString
        | Node::AnyByte
        | Node::Byte(_)
        | Node::ByteRange(..) => exp.clone(),
        Node::CharacterClass { ref runes, negated } => {
            let disjunction = exp::disjunction(
                runes.iter().map(|&rune| exp::character(rune)).collect(),
            );
            if negated {
                exp::conjunction(vec![
                    exp::complement(disjunction),
                    exp::any_character(),
                ])
            } else {
                disjunction
            }
        }
        Node::Group { num, ref sub, mode, capture } => {
            exp::group(num, expand_character_classes(sub), mode, capture)
        }
        Node::KleeneClosure(ref sub) => {
            exp::kleene_closure(expand_character_classes(sub))
        }
        Node::Concatenation(ref head, ref tail) => exp::concatenation(
            expand_character_classes(head),
            expand_character_classes(tail),
        ),
        Node::Complement(ref sub) => {
            exp::complement(expand_character_classes(sub))
        }
        Node::Conjunction(ref subs) => exp::conjunction(
            subs.iter().map(expand_character_classes).collect(),
        ),
        Node::Disjunction(ref subs) => exp::disjunction(
            subs.iter().map(expand_character_classes).collect(),
        ),
        Node::Quantifier { ref sub, min, max } => {
            exp::quantifier(expand_character_classes(sub), min, max)
        }
    }
}

/// Unrolls every counted repetition, top-down, within `budget`.
///
/// `sub{min,max}` becomes a `min`-fold concatenation followed by
/// `max − min` nested `(ε + sub·…)` levels; `sub{min,}` becomes the
/// `min`-fold concatenation followed by `sub∗`. Each quantifier divides
/// the budget by its repetition count before its subexpression is
/// expanded, so nesting multiplies up; when the count no longer fits the
/// remaining budget, the parse fails.
pub fn expand_quantifiers(exp: &Exp, budget: usize) -> Result<Exp, Error> {
    expand(exp, budget, budget)
}

fn expand(exp: &Exp, budget: usize, full: usize) -> Result<Exp, Error> {
    match *exp.node() {
        Node::EmptySet
        | Node::EmptyString
        | Node::AnyByte
        | Node::Byte(_)
        | Node::ByteRange(..)
        | Node::CharacterClass { .. } => Ok(exp.clone()),
        Node::Group { num, ref sub, mode, capture } => Ok(exp::group(
            num,
            expand(sub, budget, full)?,
            mode,
            capture,
        )),
        Node::KleeneClosure(ref sub) => {
            Ok(exp::kleene_closure(expand(sub, budget, full)?))
        }
        Node::Concatenation(ref head, ref tail) => Ok(exp::concatenation(
            expand(head, budget, full)?,
            expand(tail, budget, full)?,
        )),
        Node::Complement(ref sub) => {
            Ok(exp::complement(expand(sub, budget, full)?))
        }
        Node::Conjunction(ref subs) => Ok(exp::conjunction(
            subs.iter()
                .map(|sub| expand(sub, budget, full))
                .collect::<Result<_, _>>()?,
        )),
        Node::Disjunction(ref subs) => Ok(exp::disjunction(
            subs.iter()
                .map(|sub| expand(sub, budget, full))
                .collect::<Result<_, _>>()?,
        )),
        Node::Quantifier { ref sub, min, max } => {
            let count = max.unwrap_or(min).max(1);
            if count > budget {
                return Err(Error::expansion_budget(full));
            }
            let sub = expand(sub, budget / count, full)?;
            Ok(repeat(&sub, min, max))
        }
    }
}

/// Builds the unrolled form of `sub{min,max}` from an already-expanded
/// subexpression.
fn repeat(sub: &Exp, min: usize, max: Option<usize>) -> Exp {
    let mut parts: Vec<Exp> = (0..min).map(|_| sub.clone()).collect();
    match max {
        None => parts.push(exp::kleene_closure(sub.clone())),
        Some(max) => {
            let mut nested: Option<Exp> = None;
            for _ in min..max {
                nested = Some(match nested {
                    None => exp::disjunction(vec![
                        exp::empty_string(),
                        sub.clone(),
                    ]),
                    Some(inner) => exp::disjunction(vec![
                        exp::empty_string(),
                        exp::concatenation(sub.clone(), inner),
                    ]),
                });
            }
            if let Some(nested) = nested {
                parts.push(nested);
            }
        }
    }
    if parts.is_empty() {
        exp::empty_string()
    } else {
        exp::concatenation_list(parts)
    }
}
