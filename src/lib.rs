/*!
An extended regular-expression engine built on derivatives.

Regular expressions here form an algebra: besides the Kleene constructs,
complement (`!`) and conjunction (`&`) are first-class operators, and the
matchers decide *exactly* the denoted language — a full match, with no
backtracking and no pathological inputs. Matching is driven by structural
derivatives of the expression itself:

* the [Brzozowski derivative](Exp::derivative) yields a classical DFA
  ([`compile_dfa`]), matched in linear time and constant space;
* [Antimirov partial derivatives](partial::partial) extended with capture
  bindings yield a tagged NFA ([`compile_tnfa`]) that reports sub-match
  offsets under per-group greedy/lazy/passive policies;
* an optional native back-end ([`native::NativeBackend`]) may lower the
  DFA to machine code behind the same acceptance contract.

```
use regex_algebra::{compile_dfa, compile_tnfa, parse, parse_with_groups};

// Conjunction and complement are ordinary operators: length-two strings
// that start with 'a' and end with 'b'...
let exp = parse("a.&.b")?;
let dfa = compile_dfa(&exp);
assert!(dfa.matches(b"ab"));
assert!(!dfa.matches(b"ba"));

// ...and everything except "a".
let not_a = compile_dfa(&parse("!a")?);
assert!(not_a.matches(b""));
assert!(!not_a.matches(b"a"));
assert!(not_a.matches(b"aa"));

// Sub-match offsets come from the tagged NFA.
let (exp, modes, captures) = parse_with_groups("(a*?)(a*)")?;
let tnfa = compile_tnfa(&exp, modes, captures);
assert_eq!(tnfa.matches(b"aaa"), Some(vec![0, 0, 0, 3]));
# Ok::<(), regex_algebra::Error>(())
```

Expressions are immutable values shared by structural identity, so equal
derivatives map to equal automaton states and compilation terminates (see
[`exp`]). The matchers are stateless per call: expressions and compiled
automata may be shared freely across threads for read-only use.

# References

* Janusz Brzozowski, *Derivatives of Regular Expressions*, JACM 11(4),
  1964.
* Scott Owens, John Reppy, Aaron Turon, *Regular-expression derivatives
  re-examined*, JFP 19(2), 2009.
* Valentin Antimirov, *Partial Derivatives of Regular Expressions and
  Finite Automaton Constructions*, TCS 155(2), 1996.
* Martin Sulzmann, Pippijn van Steenhoven, *A Flexible and Efficient ML
  Lexer Tool Based on Extended Regular Expression Submatching*, CC 2014.
* Ville Laurikari, *Efficient submatch addressing for regular
  expressions*, Master's thesis, 2001.
*/

#[macro_use]
mod macros;

mod derivative;
mod error;

pub mod dfa;
pub mod exp;
pub mod native;
pub mod parse;
pub mod partial;
pub mod rewrite;
pub mod tnfa;
pub mod util;

pub use crate::{
    derivative::match_exp,
    dfa::{compile_dfa, Dfa},
    error::Error,
    exp::{Exp, Kind, Mode},
    native::{
        compile_native, compile_native_with, Fun, NativeBackend, NativeMatch,
    },
    parse::{parse, parse_with_groups},
    rewrite::QUANTIFIER_BUDGET,
    tnfa::{compile_tnfa, Tnfa},
    util::alphabet::{ByteSet, Unit},
};

/// The identifier of an automaton state: a small index into the state
/// space discovered during compilation. State 0 is always the start state.
pub type StateID = usize;
