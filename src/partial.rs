/*!
Antimirov partial derivatives extended with capture bindings.

Where the Brzozowski derivative merges every way of consuming a byte into a
single expression, the partial derivative keeps the alternatives apart: the
result is an *outer set* of cells, conceptually a disjunction of
conjunctions. Keeping alternatives apart is what makes sub-match tracking
possible, because each cell can carry the [`Bindings`] — the capture-offset
actions — that its particular way of consuming the byte implies.
*/

use crate::{
    exp::{self, Exp, Node},
    util::alphabet::Unit,
};

/// An action recorded against a group's offset pair during TNFA simulation.
///
/// `Cancel` forgets previously captured offsets (a Kleene iteration
/// restarting), `Epsilon` marks a group as having matched the empty string
/// at the current position, and `Append` extends a group by the byte being
/// consumed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BindingKind {
    Cancel,
    Epsilon,
    Append,
}

/// An ordered list of (group number, action) pairs. Application order
/// matters: a Kleene restart cancels a group before the same transition
/// re-establishes it.
pub type Bindings = Vec<(i32, BindingKind)>;

/// A disjunction of (inner expression, bindings) cells. The inner
/// expression of a cell is conceptually a conjunction; it is kept as a
/// plain expression and normalised when the compiler turns cells into
/// states.
pub type OuterSet = Vec<(Exp, Bindings)>;

/// Concatenates `y` onto the inner expression of every cell of `x`, and
/// prepends `initial` to every cell's bindings.
pub fn partial_concatenation(
    mut x: OuterSet,
    y: &Exp,
    initial: &Bindings,
) -> OuterSet {
    for (inner, bindings) in x.iter_mut() {
        *inner = exp::concatenation(inner.clone(), y.clone());
        bindings.splice(0..0, initial.iter().cloned());
    }
    x
}

/// Complements an outer set.
///
/// Each cell's inner expression is complemented and the cells are folded
/// together with [`partial_conjunction`], since the complement of a
/// disjunction is the conjunction of the complements. Bindings do not
/// survive complementation: sub-matches inside a complement are
/// meaningless.
///
/// The complement of the *empty* outer set (the partial derivative ∅) is
/// the single cell ¬∅.
pub fn partial_complement(x: OuterSet) -> OuterSet {
    let mut z: Option<OuterSet> = None;
    for (inner, _) in x {
        let singleton = vec![(exp::complement(inner), Bindings::new())];
        z = Some(match z {
            None => singleton,
            Some(acc) => partial_conjunction(acc, singleton),
        });
    }
    z.unwrap_or_else(|| {
        vec![(exp::complement(exp::empty_set()), Bindings::new())]
    })
}

/// Conjoins two outer sets: the Cartesian product of their cells, with the
/// inner expressions conjoined and the bindings concatenated.
pub fn partial_conjunction(x: OuterSet, y: OuterSet) -> OuterSet {
    let mut z = OuterSet::with_capacity(x.len() * y.len());
    for (xi, xb) in &x {
        for (yj, yb) in &y {
            let inner = exp::conjunction(vec![xi.clone(), yj.clone()]);
            let mut bindings = xb.clone();
            bindings.extend(yb.iter().cloned());
            z.push((inner, bindings));
        }
    }
    z
}

/// Disjoins two outer sets: list concatenation, preserving order.
pub fn partial_disjunction(mut x: OuterSet, mut y: OuterSet) -> OuterSet {
    x.append(&mut y);
    x
}

/// Returns `(num, Cancel)` for every group anywhere in `exp`.
///
/// This is the binding prefix of a Kleene iteration restart: offsets
/// captured by a previous iteration must be forgotten before the new
/// iteration records its own.
pub fn cancel_bindings(exp: &Exp) -> Bindings {
    fn walk(exp: &Exp, out: &mut Bindings) {
        match *exp.node() {
            Node::EmptySet
            | Node::EmptyString
            | Node::AnyByte
            | Node::Byte(_)
            | Node::ByteRange(..) => {}
            Node::Group { num, ref sub, .. } => {
                out.push((num, BindingKind::Cancel));
                walk(sub, out);
            }
            Node::KleeneClosure(ref sub) | Node::Complement(ref sub) => {
                walk(sub, out)
            }
            Node::Concatenation(ref head, ref tail) => {
                walk(head, out);
                walk(tail, out);
            }
            Node::Conjunction(ref subs) | Node::Disjunction(ref subs) => {
                for sub in subs {
                    walk(sub, out);
                }
            }
            Node::CharacterClass { .. } | Node::Quantifier { .. } => {
                unreachable!("cancel bindings of ephemeral {:?}", exp.kind())
            }
        }
    }
    let mut out = Bindings::new();
    walk(exp, &mut out);
    out
}

/// Returns `(num, Epsilon)` for every group along the ε-path of a nullable
/// expression: the groups that match the empty string when `exp` is
/// skipped without consuming input.
///
/// A Kleene closure contributes nothing (it matches ε through zero
/// iterations), and neither does a complement (no bindings escape one).
/// For a disjunction, the *first* nullable alternative in order is taken,
/// which keeps ε-paths deterministic.
pub fn epsilon_bindings(exp: &Exp) -> Bindings {
    fn walk(exp: &Exp, out: &mut Bindings) {
        match *exp.node() {
            Node::EmptySet
            | Node::EmptyString
            | Node::AnyByte
            | Node::Byte(_)
            | Node::ByteRange(..)
            | Node::KleeneClosure(_)
            | Node::Complement(_) => {}
            Node::Group { num, ref sub, .. } => {
                out.push((num, BindingKind::Epsilon));
                walk(sub, out);
            }
            Node::Concatenation(ref head, ref tail) => {
                walk(head, out);
                walk(tail, out);
            }
            Node::Conjunction(ref subs) => {
                for sub in subs {
                    walk(sub, out);
                }
            }
            Node::Disjunction(ref subs) => {
                if let Some(sub) =
                    subs.iter().find(|sub| sub.is_nullable())
                {
                    walk(sub, out);
                }
            }
            Node::CharacterClass { .. } | Node::Quantifier { .. } => {
                unreachable!("epsilon bindings of ephemeral {:?}", exp.kind())
            }
        }
    }
    let mut out = Bindings::new();
    walk(exp, &mut out);
    out
}

/// Returns the partial derivative of `exp` with respect to `unit`, as an
/// outer set of (inner expression, bindings) cells.
///
/// The disjunction of the inner expressions denotes the same language as
/// the Brzozowski derivative, but the cells are kept apart so each can
/// carry the binding actions of the captures it traverses.
pub fn partial(exp: &Exp, unit: Unit) -> OuterSet {
    match *exp.node() {
        Node::EmptySet | Node::EmptyString => OuterSet::new(),
        Node::AnyByte => vec![(exp::empty_string(), Bindings::new())],
        Node::Byte(byte) => {
            if unit.as_byte() == Some(byte) {
                vec![(exp::empty_string(), Bindings::new())]
            } else {
                OuterSet::new()
            }
        }
        Node::ByteRange(lo, hi) => match unit.as_byte() {
            Some(byte) if lo <= byte && byte <= hi => {
                vec![(exp::empty_string(), Bindings::new())]
            }
            _ => OuterSet::new(),
        },
        Node::KleeneClosure(ref sub) => {
            // ∂u(r∗) = ∂ur · r∗, with the restart cancelling whatever the
            // previous iteration captured inside r.
            let x = partial(sub, unit);
            let initial = cancel_bindings(sub);
            partial_concatenation(x, exp, &initial)
        }
        Node::Concatenation(ref head, ref tail) => {
            // ∂u(r · s) = ∂ur · s, plus ∂us when r can be skipped over ε,
            // in which case the skipped groups bind ε first.
            let x = partial_concatenation(
                partial(head, unit),
                tail,
                &Bindings::new(),
            );
            if head.is_nullable() {
                let initial = epsilon_bindings(head);
                let mut y = partial(tail, unit);
                for (_, bindings) in y.iter_mut() {
                    bindings.splice(0..0, initial.iter().cloned());
                }
                partial_disjunction(x, y)
            } else {
                x
            }
        }
        Node::Complement(ref sub) => partial_complement(partial(sub, unit)),
        Node::Conjunction(ref subs) => {
            let mut z: Option<OuterSet> = None;
            for sub in subs {
                let y = partial(sub, unit);
                z = Some(match z {
                    None => y,
                    Some(acc) => partial_conjunction(acc, y),
                });
            }
            z.unwrap_or_default()
        }
        Node::Disjunction(ref subs) => {
            let mut z = OuterSet::new();
            for sub in subs {
                z = partial_disjunction(z, partial(sub, unit));
            }
            z
        }
        Node::Group { num, ref sub, mode, capture } => {
            let mut x = partial(sub, unit);
            for (inner, bindings) in x.iter_mut() {
                *inner = exp::group(num, inner.clone(), mode, capture);
                bindings.push((num, BindingKind::Append));
            }
            x
        }
        Node::CharacterClass { .. } | Node::Quantifier { .. } => {
            unreachable!("partial derivative of ephemeral {:?}", exp.kind())
        }
    }
}
