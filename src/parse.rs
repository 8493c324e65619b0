/*!
The surface-syntax parser and the two parse entry points.

The grammar, lowest to highest precedence: disjunction `|`, conjunction
`&`, complement prefix `!`, concatenation by juxtaposition, postfix
quantifiers (`*`, `+`, `?`, `{m}`, `{m,}`, `{m,n}`, each optionally
followed by `?` for lazy mode) and atoms. A `!` absorbs the run of
juxtaposed atoms to its right but stops at the next `!`, so `!ab` is
`!(ab)` while `a!b!c` is `a·(!b)·(!c)`.

Matching is a full match over the whole input, so there are no anchors:
`^` and `$` are ordinary characters here (the grep driver gives them their
usual meaning textually, before the pattern reaches this parser).

[`parse`] produces the group-free expression the DFA path wants;
[`parse_with_groups`] keeps sub-match groups, numbers them and returns the
per-group modes and the capturing group numbers alongside the expression.
*/

use std::{collections::BTreeSet, iter::Peekable, str::CharIndices};

use crate::{
    error::Error,
    exp::{self, Exp, Mode},
    rewrite, QUANTIFIER_BUDGET,
};

/// Parses `pattern` for the DFA path: groups are stripped, character
/// classes and counted repetitions are expanded. The result contains only
/// the kinds the Brzozowski derivative understands.
pub fn parse(pattern: &str) -> Result<Exp, Error> {
    let exp = parse_pattern(pattern)?;
    let exp = rewrite::flatten(&exp);
    let exp = rewrite::strip_groups(&exp);
    let exp = rewrite::expand_character_classes(&exp);
    rewrite::expand_quantifiers(&exp, QUANTIFIER_BUDGET)
}

/// Parses `pattern` for the TNFA path: sub-match groups are kept and
/// supplemented (each disjunction alternative and each complement gets a
/// tracking group), then numbered. Returns the expression, the mode of
/// each group indexed by group number, and the numbers of the capturing
/// groups in order.
pub fn parse_with_groups(
    pattern: &str,
) -> Result<(Exp, Vec<Mode>, Vec<i32>), Error> {
    let exp = parse_pattern(pattern)?;
    let exp = rewrite::flatten(&exp);
    let exp = rewrite::apply_groups(&exp);
    let (exp, modes, captures) = rewrite::number_groups(&exp);
    let exp = rewrite::expand_character_classes(&exp);
    let exp = rewrite::expand_quantifiers(&exp, QUANTIFIER_BUDGET)?;
    Ok((exp, modes, captures))
}

/// Parses the raw tree, ephemeral kinds and all, without running any
/// rewrites. Exposed for the rewrite tests.
pub(crate) fn parse_pattern(pattern: &str) -> Result<Exp, Error> {
    if pattern.is_empty() {
        return Ok(exp::empty_string());
    }
    let mut parser = Parser::new(pattern);
    let exp = parser.parse_disjunction()?;
    match parser.peek() {
        None => Ok(exp),
        Some(_) => Err(parser.error("unbalanced ')'")),
    }
}

struct Parser<'p> {
    chars: Peekable<CharIndices<'p>>,
    pos: usize,
}

impl<'p> Parser<'p> {
    fn new(pattern: &'p str) -> Parser<'p> {
        Parser { chars: pattern.char_indices().peekable(), pos: 0 }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn bump(&mut self) -> Option<char> {
        let (pos, c) = self.chars.next()?;
        self.pos = pos + c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn error(&self, msg: &'static str) -> Error {
        Error::syntax(self.pos, msg)
    }

    fn parse_disjunction(&mut self) -> Result<Exp, Error> {
        let mut exp = self.parse_conjunction()?;
        while self.eat('|') {
            let rhs = self.parse_conjunction()?;
            exp = exp::disjunction(vec![exp, rhs]);
        }
        Ok(exp)
    }

    fn parse_conjunction(&mut self) -> Result<Exp, Error> {
        let mut exp = self.parse_sequence()?;
        while self.eat('&') {
            let rhs = self.parse_sequence()?;
            exp = exp::conjunction(vec![exp, rhs]);
        }
        Ok(exp)
    }

    /// One or more concatenands, folded left. A concatenand is either a
    /// run of juxtaposed quantified atoms or a `!`-term.
    fn parse_sequence(&mut self) -> Result<Exp, Error> {
        let mut exp: Option<Exp> = None;
        loop {
            let term = match self.peek() {
                None | Some('|') | Some('&') | Some(')') => break,
                Some('!') => {
                    self.bump();
                    exp::complement(self.parse_complement_operand()?)
                }
                Some(_) => self.parse_run()?,
            };
            exp = Some(match exp {
                None => term,
                Some(head) => exp::concatenation(head, term),
            });
        }
        exp.ok_or_else(|| self.error("missing expression"))
    }

    /// The operand of `!`: another `!`-term, or a maximal run of
    /// juxtaposed atoms (which stops at the next `!`).
    fn parse_complement_operand(&mut self) -> Result<Exp, Error> {
        if self.eat('!') {
            Ok(exp::complement(self.parse_complement_operand()?))
        } else {
            self.parse_run()
        }
    }

    /// A maximal run of quantified atoms, folded right.
    fn parse_run(&mut self) -> Result<Exp, Error> {
        let mut atoms = vec![self.parse_quantified()?];
        loop {
            match self.peek() {
                None
                | Some('|')
                | Some('&')
                | Some(')')
                | Some('!') => break,
                Some(_) => atoms.push(self.parse_quantified()?),
            }
        }
        Ok(exp::concatenation_list(atoms))
    }

    fn parse_quantified(&mut self) -> Result<Exp, Error> {
        let mut exp = self.parse_atom()?;
        loop {
            exp = match self.peek() {
                Some('*') => {
                    self.bump();
                    let mode = self.quantifier_mode();
                    mode_group(mode, exp::kleene_closure(exp))
                }
                Some('+') => {
                    self.bump();
                    let mode = self.quantifier_mode();
                    mode_group(
                        mode,
                        exp::concatenation(
                            exp.clone(),
                            exp::kleene_closure(exp),
                        ),
                    )
                }
                Some('?') => {
                    self.bump();
                    let mode = self.quantifier_mode();
                    mode_group(
                        mode,
                        exp::disjunction(vec![exp::empty_string(), exp]),
                    )
                }
                Some('{') => {
                    self.bump();
                    let (min, max) = self.parse_repetition_bounds()?;
                    let mode = self.quantifier_mode();
                    mode_group(mode, exp::quantifier(exp, min, max))
                }
                _ => break,
            };
        }
        Ok(exp)
    }

    /// A trailing `?` after a quantifier makes it lazy.
    fn quantifier_mode(&mut self) -> Mode {
        if self.eat('?') {
            Mode::Minimal
        } else {
            Mode::Maximal
        }
    }

    fn parse_repetition_bounds(
        &mut self,
    ) -> Result<(usize, Option<usize>), Error> {
        let min = self.parse_number()?;
        let max = if self.eat(',') {
            if self.peek() == Some('}') {
                None
            } else {
                Some(self.parse_number()?)
            }
        } else {
            Some(min)
        };
        if !self.eat('}') {
            return Err(self.error("expected '}' after repetition"));
        }
        if let Some(max) = max {
            if min > max {
                return Err(self.error("repetition range out of order"));
            }
        }
        Ok((min, max))
    }

    fn parse_number(&mut self) -> Result<usize, Error> {
        let mut value: usize = 0;
        let mut digits = 0;
        while let Some(c) = self.peek() {
            let digit = match c.to_digit(10) {
                None => break,
                Some(digit) => digit as usize,
            };
            self.bump();
            digits += 1;
            value = value
                .checked_mul(10)
                .and_then(|value| value.checked_add(digit))
                .ok_or_else(|| self.error("repetition count too large"))?;
        }
        if digits == 0 {
            return Err(self.error("expected repetition count"));
        }
        Ok(value)
    }

    fn parse_atom(&mut self) -> Result<Exp, Error> {
        let c = match self.bump() {
            None => return Err(self.error("missing expression")),
            Some(c) => c,
        };
        match c {
            '(' => {
                let capture = if self.peek() == Some('?') {
                    self.bump();
                    if !self.eat(':') {
                        return Err(self.error("expected ':' after '(?'"));
                    }
                    false
                } else {
                    true
                };
                let exp = self.parse_disjunction()?;
                if !self.eat(')') {
                    return Err(self.error("expected ')'"));
                }
                if capture {
                    Ok(exp::group(-1, exp, Mode::Passive, true))
                } else {
                    Ok(exp)
                }
            }
            '.' => Ok(exp::any_character()),
            '[' => self.parse_character_class(),
            '\\' => match self.bump() {
                None => Err(self.error("trailing backslash")),
                Some('C') => Ok(exp::any_byte()),
                Some(c) => match escaped_rune(c) {
                    Some(rune) => Ok(exp::character(rune)),
                    None => Err(self.error("unknown escape sequence")),
                },
            },
            '*' | '+' | '?' | '{' => {
                Err(self.error("quantifier without operand"))
            }
            c => Ok(exp::character(c)),
        }
    }

    fn parse_character_class(&mut self) -> Result<Exp, Error> {
        let negated = self.eat('^');
        let mut runes = BTreeSet::new();
        let mut first = true;
        loop {
            let c = match self.bump() {
                None => {
                    return Err(self.error("unterminated character class"))
                }
                Some(']') if !first => break,
                Some('\\') => match self.bump() {
                    None => {
                        return Err(
                            self.error("unterminated character class")
                        )
                    }
                    Some(c) => escaped_rune(c).ok_or_else(|| {
                        self.error("unknown escape sequence in class")
                    })?,
                },
                Some(c) => c,
            };
            first = false;
            // A '-' between two characters denotes an inclusive range; a
            // trailing '-' is a literal.
            if self.peek() == Some('-') {
                self.bump();
                match self.peek() {
                    None | Some(']') => {
                        runes.insert(c);
                        runes.insert('-');
                    }
                    Some(_) => {
                        let hi = match self.bump().unwrap() {
                            '\\' => match self.bump() {
                                None => {
                                    return Err(self.error(
                                        "unterminated character class",
                                    ))
                                }
                                Some(e) => {
                                    escaped_rune(e).ok_or_else(|| {
                                        self.error(
                                            "unknown escape sequence in class",
                                        )
                                    })?
                                }
                            },
                            hi => hi,
                        };
                        if hi < c {
                            return Err(self.error(
                                "character range out of order",
                            ));
                        }
                        for rune in c..=hi {
                            runes.insert(rune);
                        }
                    }
                }
            } else {
                runes.insert(c);
            }
        }
        if runes.is_empty() {
            return Err(self.error("empty character class"));
        }
        Ok(exp::character_class(runes, negated))
    }
}

/// Wraps a quantified repetition in the non-capturing group that carries
/// its greedy/lazy mode. Thread ordering is sensitive only to groups, so a
/// bare repetition would have no way to express a preference.
fn mode_group(mode: Mode, exp: Exp) -> Exp {
    exp::group(-1, exp, mode, false)
}

fn escaped_rune(c: char) -> Option<char> {
    match c {
        'f' => Some('\u{0C}'),
        'n' => Some('\n'),
        'r' => Some('\r'),
        't' => Some('\t'),
        c if !c.is_alphanumeric() => Some(c),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exp::Kind;

    fn raw(pattern: &str) -> Exp {
        parse_pattern(pattern).unwrap()
    }

    #[test]
    fn escape_sequences() {
        assert_eq!(raw("\\C"), exp::any_byte());
        assert_eq!(
            raw("\\f\\n\\r\\t"),
            exp::concatenation_list(vec![
                exp::byte(0x0C),
                exp::byte(b'\n'),
                exp::byte(b'\r'),
                exp::byte(b'\t'),
            ]),
        );
        assert_eq!(raw("\\*"), exp::byte(b'*'));
        assert!(parse_pattern("\\q").is_err());
        assert!(parse_pattern("\\").is_err());
    }

    #[test]
    fn any_character() {
        assert_eq!(raw("."), exp::any_character());
    }

    #[test]
    fn characters_encode_utf8() {
        assert_eq!(raw("a"), exp::byte(0x61));
        assert_eq!(
            raw("¬"),
            exp::concatenation(exp::byte(0xC2), exp::byte(0xAC)),
        );
        assert_eq!(
            raw("兔"),
            exp::concatenation_list(vec![
                exp::byte(0xE5),
                exp::byte(0x85),
                exp::byte(0x94),
            ]),
        );
        assert_eq!(
            raw("💩"),
            exp::concatenation_list(vec![
                exp::byte(0xF0),
                exp::byte(0x9F),
                exp::byte(0x92),
                exp::byte(0xA9),
            ]),
        );
    }

    #[test]
    fn character_classes() {
        let mut runes = BTreeSet::new();
        for rune in ['a', '¬', '兔', '💩'] {
            runes.insert(rune);
        }
        assert_eq!(
            raw("[a¬兔💩]"),
            exp::character_class(runes.clone(), false),
        );
        assert_eq!(raw("[^a¬兔💩]"), exp::character_class(runes, true));
        let mut digits = BTreeSet::new();
        for rune in '0'..='9' {
            digits.insert(rune);
        }
        assert_eq!(raw("[0-9]"), exp::character_class(digits, false));
        let mut dash = BTreeSet::new();
        dash.insert('a');
        dash.insert('-');
        assert_eq!(raw("[a-]"), exp::character_class(dash, false));
        assert!(parse_pattern("[]").is_err());
        assert!(parse_pattern("[a").is_err());
        assert!(parse_pattern("[z-a]").is_err());
    }

    #[test]
    fn quantifiers() {
        // Every quantifier is wrapped in a non-capturing group carrying
        // its mode; the repetition itself sits inside.
        let starred = raw("a*");
        let (num, sub, mode, capture) = starred.group();
        assert_eq!(num, -1);
        assert_eq!(mode, Mode::Maximal);
        assert!(!capture);
        assert_eq!(sub, &exp::kleene_closure(exp::byte(b'a')));

        let lazy = raw("a*?");
        let (_, _, mode, _) = lazy.group();
        assert_eq!(mode, Mode::Minimal);

        let plus = raw("a+");
        let (_, sub, _, _) = plus.group();
        assert_eq!(
            sub,
            &exp::concatenation(
                exp::byte(b'a'),
                exp::kleene_closure(exp::byte(b'a')),
            ),
        );

        let quest = raw("a?");
        let (_, sub, _, _) = quest.group();
        assert_eq!(
            sub,
            &exp::disjunction(vec![exp::empty_string(), exp::byte(b'a')]),
        );

        let counted = raw("a{2,5}");
        let (_, sub, _, _) = counted.group();
        assert_eq!(sub, &exp::quantifier(exp::byte(b'a'), 2, Some(5)));
        let exactly3 = raw("a{3}");
        let (_, sub, _, _) = exactly3.group();
        assert_eq!(sub, &exp::quantifier(exp::byte(b'a'), 3, Some(3)));
        let atleast3 = raw("a{3,}");
        let (_, sub, _, _) = atleast3.group();
        assert_eq!(sub, &exp::quantifier(exp::byte(b'a'), 3, None));

        assert!(parse_pattern("a{5,2}").is_err());
        assert!(parse_pattern("a{").is_err());
        assert!(parse_pattern("*a").is_err());
    }

    #[test]
    fn stacked_quantifiers() {
        // a** is the Kleene closure of a*'s wrapper group.
        let exp = raw("a**");
        let (_, sub, _, _) = exp.group();
        assert_eq!(sub.kind(), Kind::KleeneClosure);
        assert_eq!(sub.sub().kind(), Kind::Group);
    }

    #[test]
    fn concatenation_shapes() {
        assert_eq!(
            raw("ab"),
            exp::concatenation(exp::byte(b'a'), exp::byte(b'b')),
        );
        // A run folds right.
        assert_eq!(
            raw("abc"),
            exp::concatenation(
                exp::byte(b'a'),
                exp::concatenation(exp::byte(b'b'), exp::byte(b'c')),
            ),
        );
    }

    #[test]
    fn complement_precedence() {
        assert_eq!(raw("!a"), exp::complement(exp::byte(b'a')));
        assert_eq!(
            raw("!!a"),
            exp::complement(exp::complement(exp::byte(b'a'))),
        );
        // ! absorbs the whole run to its right...
        assert_eq!(
            raw("!ab"),
            exp::complement(exp::concatenation(
                exp::byte(b'a'),
                exp::byte(b'b'),
            )),
        );
        assert_eq!(
            raw("!(ab)"),
            exp::complement(exp::group(
                -1,
                exp::concatenation(exp::byte(b'a'), exp::byte(b'b')),
                Mode::Passive,
                true,
            )),
        );
        // ...but stops at the next !, and concatenands fold left.
        assert_eq!(
            raw("a!b"),
            exp::concatenation(
                exp::byte(b'a'),
                exp::complement(exp::byte(b'b')),
            ),
        );
        assert_eq!(
            raw("a!b!c"),
            exp::concatenation(
                exp::concatenation(
                    exp::byte(b'a'),
                    exp::complement(exp::byte(b'b')),
                ),
                exp::complement(exp::byte(b'c')),
            ),
        );
    }

    #[test]
    fn conjunction_disjunction_shapes() {
        assert_eq!(
            raw("a&b"),
            exp::conjunction(vec![exp::byte(b'a'), exp::byte(b'b')]),
        );
        assert_eq!(
            raw("a&b&c"),
            exp::conjunction(vec![
                exp::conjunction(vec![exp::byte(b'a'), exp::byte(b'b')]),
                exp::byte(b'c'),
            ]),
        );
        assert_eq!(
            raw("a|b"),
            exp::disjunction(vec![exp::byte(b'a'), exp::byte(b'b')]),
        );
        assert_eq!(
            raw("a|b|c"),
            exp::disjunction(vec![
                exp::disjunction(vec![exp::byte(b'a'), exp::byte(b'b')]),
                exp::byte(b'c'),
            ]),
        );
        // & binds tighter than |.
        assert_eq!(
            raw("a|b&c"),
            exp::disjunction(vec![
                exp::byte(b'a'),
                exp::conjunction(vec![exp::byte(b'b'), exp::byte(b'c')]),
            ]),
        );
    }

    #[test]
    fn groups() {
        assert_eq!(
            raw("(a)"),
            exp::group(-1, exp::byte(b'a'), Mode::Passive, true),
        );
        assert_eq!(raw("(?:a)"), exp::byte(b'a'));
        assert!(parse_pattern("(a").is_err());
        assert!(parse_pattern("a)").is_err());
        assert!(parse_pattern("(?a)").is_err());
    }

    #[test]
    fn empty_patterns() {
        assert_eq!(parse_pattern("").unwrap(), exp::empty_string());
        assert!(parse_pattern("a|").is_err());
        assert!(parse_pattern("|a").is_err());
        assert!(parse_pattern("a&").is_err());
        assert!(parse_pattern("()").is_err());
    }

    #[test]
    fn parse_strips_groups_for_the_dfa_path() {
        let exp = parse("(a*)(b)").unwrap();
        assert_eq!(
            exp,
            exp::concatenation(
                exp::kleene_closure(exp::byte(b'a')),
                exp::byte(b'b'),
            ),
        );
    }

    #[test]
    fn parse_with_groups_numbers_preorder() {
        // (a)(b): each capture is passive; each * wrapper would take its
        // own number. Here: group 0 and group 1 capture.
        let (_, modes, captures) = parse_with_groups("(a)(b)").unwrap();
        assert_eq!(modes, vec![Mode::Passive, Mode::Passive]);
        assert_eq!(captures, vec![0, 1]);

        // (a*?)(a*): captures 0 and 2; wrappers 1 (lazy) and 3 (greedy).
        let (_, modes, captures) = parse_with_groups("(a*?)(a*)").unwrap();
        assert_eq!(
            modes,
            vec![
                Mode::Passive,
                Mode::Minimal,
                Mode::Passive,
                Mode::Maximal,
            ],
        );
        assert_eq!(captures, vec![0, 2]);

        // Disjunction alternatives get passive tracking groups.
        let (_, modes, captures) = parse_with_groups("a|b").unwrap();
        assert_eq!(modes, vec![Mode::Passive, Mode::Passive]);
        assert!(captures.is_empty());
    }

    #[test]
    fn parse_expands_classes_like_the_source_tests() {
        let exp = parse("[a¬兔💩]").unwrap();
        assert_eq!(
            exp,
            exp::disjunction(vec![
                exp::byte(0x61),
                exp::concatenation(exp::byte(0xC2), exp::byte(0xAC)),
                exp::concatenation_list(vec![
                    exp::byte(0xE5),
                    exp::byte(0x85),
                    exp::byte(0x94),
                ]),
                exp::concatenation_list(vec![
                    exp::byte(0xF0),
                    exp::byte(0x9F),
                    exp::byte(0x92),
                    exp::byte(0xA9),
                ]),
            ]),
        );
        let exp = parse("[^a]").unwrap();
        assert_eq!(
            exp,
            exp::conjunction(vec![
                exp::complement(exp::disjunction(vec![exp::byte(b'a')])),
                exp::any_character(),
            ]),
        );
    }
}
