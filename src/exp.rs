/*!
The expression tree: immutable, shared regular-expression values, the smart
constructors that build them and the normaliser that rewrites them to
canonical form.

Expressions are shared by value identity: two structurally equal expressions
are interchangeable everywhere, and the total order defined on them makes
them usable as `BTreeMap`/`BTreeSet` keys. That property is what makes
derivative equivalence computable: after normalisation, two expressions that
denote the same language compare equal and therefore map to the same
automaton state.
*/

use std::{cmp::Ordering, collections::BTreeSet, sync::Arc};

/// The kind of an expression.
///
/// The declaration order defines the primary key of the total order on
/// expressions, so reordering variants changes how commutative operator
/// sub-lists sort.
///
/// `CharacterClass` and `Quantifier` are ephemeral: the parser produces them
/// and the post-parse rewrites eliminate them, so the derivative operators
/// and the compilers never see them. `Group` is ephemeral on the DFA path
/// (stripped before compilation) but flows through the whole TNFA path.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Kind {
    EmptySet,
    EmptyString,
    Group,
    AnyByte,
    Byte,
    ByteRange,
    KleeneClosure,
    Concatenation,
    Complement,
    Conjunction,
    Disjunction,
    CharacterClass,
    Quantifier,
}

/// The sub-match disambiguation mode of a group.
///
/// When the TNFA matcher must choose between threads, a `Maximal` group
/// prefers the thread in which the group matched more (greedy), a `Minimal`
/// group the thread in which it matched less (lazy), and a `Passive` group
/// expresses no preference beyond having matched at all.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Mode {
    Minimal,
    Passive,
    Maximal,
}

/// The payload of an expression, one variant per `Kind`.
#[derive(Debug)]
pub(crate) enum Node {
    EmptySet,
    EmptyString,
    Group { num: i32, sub: Exp, mode: Mode, capture: bool },
    AnyByte,
    Byte(u8),
    ByteRange(u8, u8),
    KleeneClosure(Exp),
    Concatenation(Exp, Exp),
    Complement(Exp),
    Conjunction(Vec<Exp>),
    Disjunction(Vec<Exp>),
    CharacterClass { runes: BTreeSet<char>, negated: bool },
    Quantifier { sub: Exp, min: usize, max: Option<usize> },
}

struct Inner {
    node: Node,
    norm: bool,
}

/// A shared, immutable regular expression.
///
/// `Exp` is a cheaply clonable handle; all constructors produce a fresh
/// shared node and never mutate an existing one. The `norm` flag records
/// whether the node is already in canonical form, which makes
/// [`Exp::normalised`] memoising: normalising an already-normalised
/// expression is a clone of the handle.
#[derive(Clone)]
pub struct Exp(Arc<Inner>);

fn make(node: Node, norm: bool) -> Exp {
    Exp(Arc::new(Inner { node, norm }))
}

/// Returns the expression denoting the empty language ∅.
pub fn empty_set() -> Exp {
    make(Node::EmptySet, true)
}

/// Returns the expression denoting the language {""}.
pub fn empty_string() -> Exp {
    make(Node::EmptyString, true)
}

/// Returns the expression matching any single byte (the `\C` escape).
pub fn any_byte() -> Exp {
    make(Node::AnyByte, true)
}

/// Returns the expression matching exactly the byte given.
pub fn byte(byte: u8) -> Exp {
    make(Node::Byte(byte), true)
}

/// Returns the expression matching any byte in the inclusive range given.
pub fn byte_range(lo: u8, hi: u8) -> Exp {
    make(Node::ByteRange(lo, hi), true)
}

/// Returns the Kleene closure of the subexpression given.
pub fn kleene_closure(sub: Exp) -> Exp {
    make(Node::KleeneClosure(sub), false)
}

/// Returns the concatenation of the two subexpressions given.
///
/// Concatenation is represented as a binary head/tail pair; normalisation
/// right-associates nested pairs.
pub fn concatenation(head: Exp, tail: Exp) -> Exp {
    make(Node::Concatenation(head, tail), false)
}

/// Returns the right-associated concatenation of all subexpressions given.
pub fn concatenation_list(mut subs: Vec<Exp>) -> Exp {
    let mut exp = subs.pop().expect("concatenation of no subexpressions");
    while let Some(sub) = subs.pop() {
        exp = concatenation(sub, exp);
    }
    exp
}

/// Returns the complement of the subexpression given.
pub fn complement(sub: Exp) -> Exp {
    make(Node::Complement(sub), false)
}

/// Returns the conjunction (language intersection) of the subexpressions.
pub fn conjunction(subs: Vec<Exp>) -> Exp {
    make(Node::Conjunction(subs), false)
}

/// Returns the disjunction (language union) of the subexpressions.
pub fn disjunction(subs: Vec<Exp>) -> Exp {
    make(Node::Disjunction(subs), false)
}

/// Returns a sub-match marker around the subexpression given.
///
/// `num` is the group's index, or −1 before `number_groups` has run.
pub fn group(num: i32, sub: Exp, mode: Mode, capture: bool) -> Exp {
    make(Node::Group { num, sub, mode, capture }, false)
}

/// Returns an ephemeral character-class expression.
pub fn character_class(runes: BTreeSet<char>, negated: bool) -> Exp {
    make(Node::CharacterClass { runes, negated }, false)
}

/// Returns an ephemeral counted-repetition expression.
///
/// `max` of `None` means unbounded.
pub fn quantifier(sub: Exp, min: usize, max: Option<usize>) -> Exp {
    make(Node::Quantifier { sub, min, max }, false)
}

/// Returns the expression matching any single UTF-8 encoded character: the
/// disjunction of the four byte-level encoding shapes.
///
/// This is the expansion of `.` in the surface syntax. Several rewrites
/// recognise this exact shape structurally (for example, the normaliser
/// collapses its Kleene closure to ¬∅), so it must be built consistently.
pub fn any_character() -> Exp {
    let b1 = byte_range(0x00, 0x7F); // 0xxxxxxx
    let bx = byte_range(0x80, 0xBF); // 10xxxxxx
    let b2 = byte_range(0xC0, 0xDF); // 110xxxxx
    let b3 = byte_range(0xE0, 0xEF); // 1110xxxx
    let b4 = byte_range(0xF0, 0xF7); // 11110xxx
    disjunction(vec![
        b1,
        concatenation(b2, bx.clone()),
        concatenation_list(vec![b3, bx.clone(), bx.clone()]),
        concatenation_list(vec![b4, bx.clone(), bx.clone(), bx]),
    ])
}

/// Returns the expression matching the single character given, as the
/// concatenation of its UTF-8 encoding bytes.
pub fn character(character: char) -> Exp {
    let mut buf = [0u8; 4];
    let bytes = character.encode_utf8(&mut buf).as_bytes();
    concatenation_list(bytes.iter().map(|&b| byte(b)).collect())
}

impl Exp {
    /// Returns the kind of this expression.
    pub fn kind(&self) -> Kind {
        match self.0.node {
            Node::EmptySet => Kind::EmptySet,
            Node::EmptyString => Kind::EmptyString,
            Node::Group { .. } => Kind::Group,
            Node::AnyByte => Kind::AnyByte,
            Node::Byte(_) => Kind::Byte,
            Node::ByteRange(..) => Kind::ByteRange,
            Node::KleeneClosure(_) => Kind::KleeneClosure,
            Node::Concatenation(..) => Kind::Concatenation,
            Node::Complement(_) => Kind::Complement,
            Node::Conjunction(_) => Kind::Conjunction,
            Node::Disjunction(_) => Kind::Disjunction,
            Node::CharacterClass { .. } => Kind::CharacterClass,
            Node::Quantifier { .. } => Kind::Quantifier,
        }
    }

    /// Returns true if and only if this expression is known to be in
    /// canonical form.
    pub fn is_norm(&self) -> bool {
        self.0.norm
    }

    pub(crate) fn node(&self) -> &Node {
        &self.0.node
    }

    /// Returns the subexpression of a `KleeneClosure` or `Complement`.
    ///
    /// Calling an accessor for the wrong kind is a programmer error and
    /// panics.
    pub fn sub(&self) -> &Exp {
        match self.0.node {
            Node::KleeneClosure(ref sub) | Node::Complement(ref sub) => sub,
            _ => panic!("sub() on {:?} expression", self.kind()),
        }
    }

    /// Returns the head of a `Concatenation`.
    pub fn head(&self) -> &Exp {
        match self.0.node {
            Node::Concatenation(ref head, _) => head,
            _ => panic!("head() on {:?} expression", self.kind()),
        }
    }

    /// Returns the tail of a `Concatenation`. After normalisation, the tail
    /// is typically another `Concatenation`.
    pub fn tail(&self) -> &Exp {
        match self.0.node {
            Node::Concatenation(_, ref tail) => tail,
            _ => panic!("tail() on {:?} expression", self.kind()),
        }
    }

    /// Returns the subexpressions of a `Conjunction` or `Disjunction`.
    pub fn subexpressions(&self) -> &[Exp] {
        match self.0.node {
            Node::Conjunction(ref subs) | Node::Disjunction(ref subs) => subs,
            _ => panic!("subexpressions() on {:?} expression", self.kind()),
        }
    }

    /// Returns the byte of a `Byte` expression.
    pub fn byte(&self) -> u8 {
        match self.0.node {
            Node::Byte(byte) => byte,
            _ => panic!("byte() on {:?} expression", self.kind()),
        }
    }

    /// Returns the inclusive bounds of a `ByteRange` expression.
    pub fn byte_range(&self) -> (u8, u8) {
        match self.0.node {
            Node::ByteRange(lo, hi) => (lo, hi),
            _ => panic!("byte_range() on {:?} expression", self.kind()),
        }
    }

    /// Returns the number, subexpression, mode and capture flag of a
    /// `Group` expression.
    pub fn group(&self) -> (i32, &Exp, Mode, bool) {
        match self.0.node {
            Node::Group { num, ref sub, mode, capture } => {
                (num, sub, mode, capture)
            }
            _ => panic!("group() on {:?} expression", self.kind()),
        }
    }

    /// Returns the runes and negation flag of a `CharacterClass`.
    pub fn character_class(&self) -> (&BTreeSet<char>, bool) {
        match self.0.node {
            Node::CharacterClass { ref runes, negated } => (runes, negated),
            _ => panic!("character_class() on {:?} expression", self.kind()),
        }
    }

    /// Returns the subexpression and bounds of a `Quantifier`.
    pub fn quantifier(&self) -> (&Exp, usize, Option<usize>) {
        match self.0.node {
            Node::Quantifier { ref sub, min, max } => (sub, min, max),
            _ => panic!("quantifier() on {:?} expression", self.kind()),
        }
    }

    /// Returns the normalised form of this expression.
    ///
    /// Normalisation applies the algebraic rewrite rules bottom-up until a
    /// fixed point: Kleene collapses, concatenation right-association with
    /// ∅ absorption and ε identity, complement involution, and the
    /// flatten/sort/de-duplicate discipline of conjunction and disjunction
    /// with their absorbing and identity elements removed. The result is
    /// idempotent: normalising a normalised expression returns it
    /// unchanged.
    pub fn normalised(&self) -> Exp {
        if self.is_norm() {
            return self.clone();
        }
        match self.0.node {
            Node::EmptySet
            | Node::EmptyString
            | Node::AnyByte
            | Node::Byte(_)
            | Node::ByteRange(..) => self.clone(),

            Node::KleeneClosure(ref sub) => {
                let sub = sub.normalised();
                match sub.kind() {
                    // (r∗)∗ ≈ r∗
                    Kind::KleeneClosure => sub,
                    // ∅∗ ≈ ε and ε∗ ≈ ε
                    Kind::EmptySet | Kind::EmptyString => empty_string(),
                    // \C∗ ≈ ¬∅
                    Kind::AnyByte => make(Node::Complement(empty_set()), true),
                    _ => {
                        // .∗ ≈ ¬∅. Not strictly true of malformed UTF-8,
                        // but it is not the matcher's job to validate the
                        // input encoding.
                        if sub == any_character() {
                            make(Node::Complement(empty_set()), true)
                        } else {
                            make(Node::KleeneClosure(sub), true)
                        }
                    }
                }
            }

            Node::Concatenation(ref head, ref tail) => {
                // (r · s) · t ≈ r · (s · t)
                let mut head = head.normalised();
                let mut tail = tail.clone();
                while head.kind() == Kind::Concatenation {
                    let rotated = concatenation(head.tail().clone(), tail);
                    head = head.head().clone();
                    tail = rotated;
                }
                let tail = tail.normalised();
                // ∅ · r ≈ r · ∅ ≈ ∅
                if head.kind() == Kind::EmptySet {
                    return head;
                }
                if tail.kind() == Kind::EmptySet {
                    return tail;
                }
                // ε · r ≈ r and r · ε ≈ r
                if head.kind() == Kind::EmptyString {
                    return tail;
                }
                if tail.kind() == Kind::EmptyString {
                    return head;
                }
                make(Node::Concatenation(head, tail), true)
            }

            Node::Complement(ref sub) => {
                let sub = sub.normalised();
                // ¬(¬r) ≈ r
                if sub.kind() == Kind::Complement {
                    return sub.sub().clone();
                }
                make(Node::Complement(sub), true)
            }

            Node::Conjunction(ref subs) => {
                let mut flat = Vec::with_capacity(subs.len());
                for sub in subs {
                    let sub = sub.normalised();
                    // ∅ & r ≈ r & ∅ ≈ ∅
                    if sub.kind() == Kind::EmptySet {
                        return sub;
                    }
                    // (r & s) & t ≈ r & (s & t)
                    if sub.kind() == Kind::Conjunction {
                        flat.extend(sub.subexpressions().iter().cloned());
                    } else {
                        flat.push(sub);
                    }
                }
                // r & s ≈ s & r, then r & r ≈ r
                flat.sort();
                flat.dedup();
                // ¬∅ & r ≈ r, unless ¬∅ is the sole survivor
                if flat.len() > 1 {
                    flat.retain(|sub| !is_complement_of_empty_set(sub));
                }
                if flat.len() == 1 {
                    return flat.pop().unwrap();
                }
                make(Node::Conjunction(flat), true)
            }

            Node::Disjunction(ref subs) => {
                let mut flat = Vec::with_capacity(subs.len());
                for sub in subs {
                    let sub = sub.normalised();
                    // ¬∅ + r ≈ r + ¬∅ ≈ ¬∅
                    if is_complement_of_empty_set(&sub) {
                        return sub;
                    }
                    // (r + s) + t ≈ r + (s + t)
                    if sub.kind() == Kind::Disjunction {
                        flat.extend(sub.subexpressions().iter().cloned());
                    } else {
                        flat.push(sub);
                    }
                }
                // r + s ≈ s + r, then r + r ≈ r
                flat.sort();
                flat.dedup();
                // ∅ + r ≈ r, unless ∅ is the sole survivor
                if flat.len() > 1 {
                    flat.retain(|sub| sub.kind() != Kind::EmptySet);
                }
                if flat.len() == 1 {
                    return flat.pop().unwrap();
                }
                make(Node::Disjunction(flat), true)
            }

            Node::Group { num, ref sub, mode, capture } => {
                let sub = sub.normalised();
                match sub.kind() {
                    // A group around a constant collapses to the constant.
                    Kind::EmptySet | Kind::EmptyString => sub,
                    _ => make(Node::Group { num, sub, mode, capture }, true),
                }
            }

            Node::CharacterClass { .. } | Node::Quantifier { .. } => {
                unreachable!(
                    "normalising ephemeral {:?} expression",
                    self.kind()
                )
            }
        }
    }
}

fn is_complement_of_empty_set(exp: &Exp) -> bool {
    exp.kind() == Kind::Complement && exp.sub().kind() == Kind::EmptySet
}

impl Ord for Exp {
    fn cmp(&self, other: &Exp) -> Ordering {
        if Arc::ptr_eq(&self.0, &other.0) {
            return Ordering::Equal;
        }
        match self.kind().cmp(&other.kind()) {
            Ordering::Equal => {}
            unequal => return unequal,
        }
        match (&self.0.node, &other.0.node) {
            (Node::EmptySet, Node::EmptySet)
            | (Node::EmptyString, Node::EmptyString)
            | (Node::AnyByte, Node::AnyByte) => Ordering::Equal,
            (Node::Byte(x), Node::Byte(y)) => x.cmp(y),
            (Node::ByteRange(xlo, xhi), Node::ByteRange(ylo, yhi)) => {
                (xlo, xhi).cmp(&(ylo, yhi))
            }
            (
                Node::Group { num: xn, sub: xs, mode: xm, capture: xc },
                Node::Group { num: yn, sub: ys, mode: ym, capture: yc },
            ) => (xn, xs, xm, xc).cmp(&(yn, ys, ym, yc)),
            (Node::KleeneClosure(x), Node::KleeneClosure(y))
            | (Node::Complement(x), Node::Complement(y)) => x.cmp(y),
            (Node::Concatenation(xh, xt), Node::Concatenation(yh, yt)) => {
                (xh, xt).cmp(&(yh, yt))
            }
            (Node::Conjunction(xs), Node::Conjunction(ys))
            | (Node::Disjunction(xs), Node::Disjunction(ys)) => {
                xs.as_slice().cmp(ys.as_slice())
            }
            (
                Node::CharacterClass { runes: xr, negated: xn },
                Node::CharacterClass { runes: yr, negated: yn },
            ) => (xr, xn).cmp(&(yr, yn)),
            (
                Node::Quantifier { sub: xs, min: xmin, max: xmax },
                Node::Quantifier { sub: ys, min: ymin, max: ymax },
            ) => (xs, xmin, xmax).cmp(&(ys, ymin, ymax)),
            _ => unreachable!("kind mismatch after equal kind comparison"),
        }
    }
}

impl PartialOrd for Exp {
    fn partial_cmp(&self, other: &Exp) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Exp {
    fn eq(&self, other: &Exp) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Exp {}

impl core::fmt::Debug for Exp {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        self.0.node.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compare_leaves() {
        assert_eq!(empty_set(), empty_set());
        assert_eq!(empty_string(), empty_string());
        assert_eq!(any_byte(), any_byte());
        assert!(empty_set() < empty_string());
        assert!(empty_string() < any_byte());
    }

    #[test]
    fn compare_bytes() {
        assert_eq!(byte(b'a'), byte(b'a'));
        assert!(byte(b'a') < byte(b'b'));
        assert_eq!(byte_range(b'a', b'c'), byte_range(b'a', b'c'));
        assert!(byte_range(b'a', b'c') < byte_range(b'b', b'd'));
        assert!(byte(b'a') < byte_range(b'a', b'c'));
    }

    #[test]
    fn compare_inner_nodes() {
        assert_eq!(
            kleene_closure(byte(b'a')),
            kleene_closure(byte(b'a')),
        );
        assert!(kleene_closure(byte(b'a')) < kleene_closure(byte(b'b')));
        assert_eq!(
            concatenation(byte(b'a'), byte(b'b')),
            concatenation(byte(b'a'), byte(b'b')),
        );
        assert!(
            concatenation(byte(b'a'), byte(b'b'))
                < concatenation(byte(b'b'), byte(b'c'))
        );
        assert!(complement(byte(b'a')) < complement(byte(b'b')));
        assert!(
            conjunction(vec![byte(b'a'), byte(b'b')])
                < conjunction(vec![byte(b'a'), byte(b'c')])
        );
        assert!(
            disjunction(vec![byte(b'a')])
                < disjunction(vec![byte(b'a'), byte(b'b')])
        );
    }

    #[test]
    fn compare_ignores_norm_flag() {
        // A freshly built tree and its normalised twin are structurally
        // equal even though only the latter carries the norm bit.
        let raw = conjunction(vec![byte(b'a'), byte(b'b')]);
        let norm = raw.normalised();
        assert!(!raw.is_norm());
        assert!(norm.is_norm());
        assert_eq!(raw, norm);
        assert_eq!(
            conjunction(vec![byte(b'a')]).normalised(),
            byte(b'a'),
        );
    }

    #[test]
    fn normalised_leaves() {
        assert_eq!(empty_set().normalised(), empty_set());
        assert_eq!(empty_string().normalised(), empty_string());
        assert_eq!(any_byte().normalised(), any_byte());
        assert_eq!(byte(b'a').normalised(), byte(b'a'));
        assert_eq!(byte_range(b'a', b'c').normalised(), byte_range(b'a', b'c'));
    }

    #[test]
    fn normalised_kleene_closure() {
        assert_eq!(
            kleene_closure(kleene_closure(byte(b'a'))).normalised(),
            kleene_closure(byte(b'a')).normalised(),
        );
        assert_eq!(kleene_closure(empty_set()).normalised(), empty_string());
        assert_eq!(kleene_closure(empty_string()).normalised(), empty_string());
        assert_eq!(
            kleene_closure(any_byte()).normalised(),
            complement(empty_set()).normalised(),
        );
        assert_eq!(
            kleene_closure(any_character()).normalised(),
            complement(empty_set()).normalised(),
        );
    }

    #[test]
    fn normalised_concatenation() {
        assert_eq!(
            concatenation(concatenation(byte(b'a'), byte(b'b')), byte(b'c'))
                .normalised(),
            concatenation(byte(b'a'), concatenation(byte(b'b'), byte(b'c')))
                .normalised(),
        );
        assert_eq!(
            concatenation(empty_set(), byte(b'a')).normalised(),
            empty_set(),
        );
        assert_eq!(
            concatenation(byte(b'a'), empty_set()).normalised(),
            empty_set(),
        );
        assert_eq!(
            concatenation(empty_string(), byte(b'a')).normalised(),
            byte(b'a'),
        );
        assert_eq!(
            concatenation(byte(b'a'), empty_string()).normalised(),
            byte(b'a'),
        );
    }

    #[test]
    fn normalised_complement() {
        assert_eq!(
            complement(complement(byte(b'a'))).normalised(),
            byte(b'a'),
        );
    }

    #[test]
    fn normalised_conjunction() {
        assert_eq!(
            conjunction(vec![
                conjunction(vec![byte(b'a'), byte(b'b')]),
                byte(b'c'),
            ])
            .normalised(),
            conjunction(vec![byte(b'a'), byte(b'b'), byte(b'c')]).normalised(),
        );
        // Commutativity through sorting.
        assert_eq!(
            conjunction(vec![byte(b'b'), byte(b'a')]).normalised(),
            conjunction(vec![byte(b'a'), byte(b'b')]).normalised(),
        );
        // Idempotence of &.
        assert_eq!(
            conjunction(vec![byte(b'a'), byte(b'a')]).normalised(),
            byte(b'a'),
        );
        // ∅ absorbs.
        assert_eq!(
            conjunction(vec![byte(b'a'), empty_set()]).normalised(),
            empty_set(),
        );
        // ¬∅ is the identity.
        assert_eq!(
            conjunction(vec![byte(b'a'), complement(empty_set())])
                .normalised(),
            byte(b'a'),
        );
        // ...unless it is the sole survivor.
        assert_eq!(
            conjunction(vec![
                complement(empty_set()),
                complement(empty_set()),
            ])
            .normalised(),
            complement(empty_set()).normalised(),
        );
    }

    #[test]
    fn normalised_disjunction() {
        assert_eq!(
            disjunction(vec![
                disjunction(vec![byte(b'a'), byte(b'b')]),
                byte(b'c'),
            ])
            .normalised(),
            disjunction(vec![byte(b'a'), byte(b'b'), byte(b'c')]).normalised(),
        );
        assert_eq!(
            disjunction(vec![byte(b'b'), byte(b'a')]).normalised(),
            disjunction(vec![byte(b'a'), byte(b'b')]).normalised(),
        );
        assert_eq!(
            disjunction(vec![byte(b'a'), byte(b'a')]).normalised(),
            byte(b'a'),
        );
        // ¬∅ absorbs.
        assert_eq!(
            disjunction(vec![byte(b'a'), complement(empty_set())])
                .normalised(),
            complement(empty_set()).normalised(),
        );
        // ∅ is the identity.
        assert_eq!(
            disjunction(vec![byte(b'a'), empty_set()]).normalised(),
            byte(b'a'),
        );
        // ...unless it is the sole survivor.
        assert_eq!(
            disjunction(vec![empty_set(), empty_set()]).normalised(),
            empty_set(),
        );
    }

    #[test]
    fn normalised_group() {
        let exp = group(0, byte(b'a'), Mode::Passive, true);
        assert_eq!(exp.normalised(), exp.normalised().normalised());
        assert_eq!(
            group(0, empty_set(), Mode::Passive, true).normalised(),
            empty_set(),
        );
        assert_eq!(
            group(0, empty_string(), Mode::Passive, true).normalised(),
            empty_string(),
        );
        // A group around ∅ inside a larger expression disappears entirely.
        assert_eq!(
            concatenation(group(0, empty_set(), Mode::Passive, true), byte(b'a'))
                .normalised(),
            empty_set(),
        );
    }

    #[test]
    fn normalised_idempotent() {
        let exps = vec![
            kleene_closure(kleene_closure(byte(b'a'))),
            concatenation(
                concatenation(byte(b'a'), empty_string()),
                kleene_closure(any_byte()),
            ),
            conjunction(vec![
                disjunction(vec![byte(b'b'), byte(b'a'), empty_set()]),
                complement(complement(byte(b'c'))),
            ]),
        ];
        for exp in exps {
            let once = exp.normalised();
            let twice = once.normalised();
            assert_eq!(once, twice);
            assert!(once.is_norm());
        }
    }
}
