/*!
The native back-end interface.

A code generator that lowers a DFA to machine code lives outside this
crate; what lives here is the seam it plugs into and the contract it must
honour: the executable matcher returned by [`NativeBackend::compile`] must
be observationally equivalent to [`Dfa::matches`] on every input.

[`compile_native`] uses the reference backend, which "compiles" to the
interpreter itself (zero bytes of code), so the equivalence contract is
exercised even without a real code generator. Either way the resulting
[`Fun`] applies a first-byte peephole: when the start state's behaviour
pins down a single interesting byte, `memchr` skips or rejects without
stepping the automaton. The `.*`-padded patterns the grep driver builds
hit this path constantly.
*/

use crate::dfa::Dfa;

/// An executable full-match function produced by a back-end.
pub trait NativeMatch: Send + Sync {
    /// Returns whether the whole input matches. Must agree with
    /// [`Dfa::matches`] on the DFA this was compiled from.
    fn matches(&self, input: &[u8]) -> bool;

    /// Returns the size of the generated machine code in bytes.
    fn code_size(&self) -> usize;
}

/// A code generator that lowers a DFA to an executable matcher.
///
/// Implementations own whatever process-wide state their target needs
/// (a JIT context, one-time target initialisation) internally; nothing in
/// this crate holds global state on their behalf.
pub trait NativeBackend {
    fn compile(&self, dfa: &Dfa) -> Box<dyn NativeMatch>;
}

/// The reference backend: the "generated code" is the DFA interpreter.
#[derive(Clone, Copy, Debug, Default)]
pub struct InterpreterBackend;

struct Interpreted {
    dfa: Dfa,
}

impl NativeMatch for Interpreted {
    fn matches(&self, input: &[u8]) -> bool {
        self.dfa.matches(input)
    }

    fn code_size(&self) -> usize {
        0
    }
}

impl NativeBackend for InterpreterBackend {
    fn compile(&self, dfa: &Dfa) -> Box<dyn NativeMatch> {
        Box::new(Interpreted { dfa: dfa.clone() })
    }
}

/// The first-byte peephole, when the start state admits one.
#[derive(Clone, Copy, Debug)]
struct FirstByte {
    /// The only byte with a concrete edge out of the start state.
    byte: u8,
    /// Whether the start state's default edge loops back to itself (the
    /// `.*`-padded case, where memchr may skip the prefix) as opposed to
    /// going to the dead state (where anything but `byte` up front is an
    /// immediate reject).
    self_loop: bool,
}

/// A compiled matcher: the back-end's executable plus the peephole data.
pub struct Fun {
    imp: Box<dyn NativeMatch>,
    first_byte: Option<FirstByte>,
    start_accepting: bool,
}

impl Fun {
    /// Returns whether the whole input matches.
    pub fn matches(&self, input: &[u8]) -> bool {
        match self.first_byte {
            None => self.imp.matches(input),
            Some(FirstByte { byte, self_loop: true }) => {
                // Every byte before the first occurrence of `byte` keeps
                // the walk in the start state, so jump straight there.
                match memchr::memchr(byte, input) {
                    None => self.start_accepting,
                    Some(at) => self.imp.matches(&input[at..]),
                }
            }
            Some(FirstByte { byte, self_loop: false }) => {
                match input.first() {
                    None => self.start_accepting,
                    Some(&first) if first == byte => self.imp.matches(input),
                    Some(_) => false,
                }
            }
        }
    }

    /// Returns the size of the generated machine code in bytes. The
    /// reference backend reports zero.
    pub fn code_size(&self) -> usize {
        self.imp.code_size()
    }
}

impl core::fmt::Debug for Fun {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("Fun")
            .field("code_size", &self.imp.code_size())
            .field("first_byte", &self.first_byte)
            .finish()
    }
}

/// Compiles `dfa` with the reference backend.
pub fn compile_native(dfa: &Dfa) -> Fun {
    compile_native_with(dfa, &InterpreterBackend)
}

/// Compiles `dfa` with the backend given and attaches the first-byte
/// peephole. Compiling a DFA with no states is a programmer error.
pub fn compile_native_with(dfa: &Dfa, backend: &dyn NativeBackend) -> Fun {
    assert!(dfa.state_len() > 0, "cannot compile a DFA with no states");
    let imp = backend.compile(dfa);
    let fun = Fun {
        first_byte: first_byte(dfa),
        start_accepting: dfa.is_accepting(0),
        imp,
    };
    debug!(
        "compiled native matcher: {} bytes, peephole {:?}",
        fun.imp.code_size(),
        fun.first_byte,
    );
    fun
}

/// Analyses the start state for the peephole: it applies when exactly one
/// byte has a concrete edge out of state 0 and the default edge either
/// loops on state 0 or dies.
fn first_byte(dfa: &Dfa) -> Option<FirstByte> {
    let (bytes, default) = dfa.edges(0);
    let (byte, _) = match *bytes.as_slice() {
        [edge] => edge,
        _ => return None,
    };
    if default == 0 {
        Some(FirstByte { byte, self_loop: true })
    } else if Some(default) == dfa.error_state() {
        Some(FirstByte { byte, self_loop: false })
    } else {
        None
    }
}

const _: fn() = || {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Fun>();
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{compile_dfa, parse};

    fn fun(pattern: &str) -> (Dfa, Fun) {
        let dfa = compile_dfa(&parse(pattern).unwrap());
        let fun = compile_native(&dfa);
        (dfa, fun)
    }

    #[test]
    fn equivalent_to_the_dfa() {
        let patterns = ["abc", "a*b", ".*x.*", "!a", "a.&.b", "(a|b)c*"];
        let inputs: &[&[u8]] = &[
            b"",
            b"a",
            b"x",
            b"abc",
            b"abcd",
            b"zzzxzzz",
            b"ab",
            b"bccc",
            b"aaab",
        ];
        for pattern in patterns {
            let (dfa, fun) = fun(pattern);
            for input in inputs {
                assert_eq!(
                    fun.matches(input),
                    dfa.matches(input),
                    "native and DFA matchers disagree on {:?} / {:?}",
                    pattern,
                    input,
                );
            }
        }
    }

    #[test]
    fn peephole_reject_without_first_byte() {
        // "abc" pins the first byte: the start state's default edge dies.
        let (_, fun) = fun("abc");
        assert!(!fun.matches(b"xbc"));
        assert!(fun.matches(b"abc"));
        assert!(!fun.matches(b""));
    }

    #[test]
    fn peephole_skips_self_loop_prefix() {
        // The grep driver's padded form: the start state self-loops by
        // default and leaves only on 'x'.
        let (_, fun) = fun(".*x.*");
        assert!(fun.matches(b"aaaaaaaaxbbb"));
        assert!(!fun.matches(b"aaaaaaaab"));
        assert!(fun.matches(b"x"));
        assert!(!fun.matches(b""));
    }

    #[test]
    fn reference_backend_reports_zero_code() {
        let (_, fun) = fun("a");
        assert_eq!(fun.code_size(), 0);
    }
}
