use std::{
    fs::File,
    io::{self, Read, Write},
    process,
};

use {
    bstr::ByteSlice,
    lexopt::{Arg, ValueExt},
    regex_algebra::{compile_dfa, compile_native, parse, Fun},
};

const USAGE: &str = "\
Usage: algrep [OPTION]... REGEXP [FILE]...

Options:

  -v       select non-matching lines
  -n       print line number with output lines
  -H       print the file name for each match
  -h       suppress the file name prefix on output
  -e EXPR  use EXPR as the regular expression

In the manner of find(1), REGEXP may comprise multiple subexpressions as
separate arguments:

  [-e] EXPR       regular expression
  ( EXPR )        grouping
  ! EXPR          complement
  -not EXPR
  EXPR & EXPR     conjunction
  EXPR -a EXPR
  EXPR -and EXPR
  EXPR | EXPR     disjunction
  EXPR -o EXPR
  EXPR -or EXPR

EXPR may begin with `^' in order to anchor it to the beginning of the
line and may end with `$' in order to anchor it to the end of the line.
";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum WithFilename {
    Always,
    Maybe,
    Never,
}

fn main() {
    env_logger::init();
    // As per GNU grep: 0 if selected lines are found, 1 if not, 2 on
    // error.
    match run(&mut lexopt::Parser::from_env()) {
        Ok(true) => process::exit(0),
        Ok(false) => process::exit(1),
        Err(err) => {
            eprintln!("algrep: {:#}", err);
            process::exit(2);
        }
    }
}

fn run(p: &mut lexopt::Parser) -> anyhow::Result<bool> {
    let mut invert = false;
    let mut line_number = false;
    let mut with_filename = WithFilename::Maybe;
    let mut args: Vec<String> = Vec::new();
    loop {
        match p.next()? {
            None => break,
            Some(Arg::Short('v')) => invert = true,
            Some(Arg::Short('n')) => line_number = true,
            Some(Arg::Short('H')) => with_filename = WithFilename::Always,
            Some(Arg::Short('h')) => with_filename = WithFilename::Never,
            Some(Arg::Short('e')) => {
                args.push("-e".to_string());
                args.push(p.value()?.string()?);
                drain_raw(p, &mut args)?;
            }
            Some(Arg::Value(value)) => {
                args.push(value.string()?);
                drain_raw(p, &mut args)?;
            }
            Some(_) => anyhow::bail!("{}", USAGE.trim_end()),
        }
    }
    if args.is_empty() {
        anyhow::bail!("{}", USAGE.trim_end());
    }

    let (pattern, files) = build_pattern(&args, invert)?;
    let exp = parse(&pattern)
        .map_err(|err| anyhow::anyhow!("parse error: {}", err))?;
    let dfa = compile_dfa(&exp);
    let fun = compile_native(&dfa);

    let files = if files.is_empty() {
        vec!["-".to_string()]
    } else {
        files
    };
    Ok(grep(&fun, &files, line_number, with_filename))
}

/// Everything from the first expression argument on is positional: take
/// the remaining arguments verbatim, so that `-not`, `-a` and friends are
/// not mistaken for options.
fn drain_raw(
    p: &mut lexopt::Parser,
    args: &mut Vec<String>,
) -> anyhow::Result<()> {
    while let Ok(value) = p.value() {
        args.push(value.string()?);
    }
    Ok(())
}

/// Builds the pattern string from the find(1)-style arguments and returns
/// it together with the remaining (file) arguments.
///
/// Each atomic expression is padded into a whole-line form: `.*` in front
/// unless it starts with `^`, and `.*` behind unless it ends with `$`,
/// which becomes the line terminator itself. `-v` complements the whole
/// pattern.
fn build_pattern(
    args: &[String],
    invert: bool,
) -> anyhow::Result<(String, Vec<String>)> {
    let mut pattern = String::new();
    let mut parens = 0i32;
    let mut complete = false;
    let mut escape = false;
    let mut i = 0;
    while i < args.len() {
        let arg = args[i].as_str();
        if !escape && arg == "-e" {
            if complete {
                pattern.push('|');
            }
            escape = true;
            complete = false;
        } else if !escape && arg == "(" {
            pattern.push('(');
            parens += 1;
        } else if !escape && arg == ")" {
            pattern.push(')');
            parens -= 1;
            if parens < 0 {
                anyhow::bail!("unmatched right parenthesis");
            }
        } else if !escape && (arg == "!" || arg == "-not") {
            pattern.push('!');
            complete = false;
        } else if !escape && (arg == "&" || arg == "-a" || arg == "-and") {
            pattern.push('&');
            complete = false;
        } else if !escape && (arg == "|" || arg == "-o" || arg == "-or") {
            pattern.push('|');
            complete = false;
        } else if escape || !complete {
            if !arg.is_empty() {
                let body = match arg.strip_prefix('^') {
                    Some(rest) => rest,
                    None => {
                        pattern.push_str(".*");
                        arg
                    }
                };
                match body.strip_suffix('$') {
                    Some(rest) => {
                        pattern.push_str(rest);
                        pattern.push('\n');
                    }
                    None => {
                        pattern.push_str(body);
                        pattern.push_str(".*");
                    }
                }
            }
            escape = false;
            complete = true;
        } else {
            break;
        }
        i += 1;
    }
    let files = args[i..].to_vec();

    if pattern.is_empty() {
        anyhow::bail!("regular expression not specified");
    }
    if parens > 0 {
        anyhow::bail!("unmatched left parenthesis");
    }
    if !complete {
        anyhow::bail!("incomplete arguments");
    }
    if invert {
        pattern = format!("!({})", pattern);
    }
    Ok((pattern, files))
}

fn grep(
    fun: &Fun,
    files: &[String],
    line_number: bool,
    with_filename: WithFilename,
) -> bool {
    let show_name = match with_filename {
        WithFilename::Always => true,
        WithFilename::Maybe => files.len() > 1,
        WithFilename::Never => false,
    };
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    let mut matched = false;
    for file in files {
        let is_stdin = file == "-";
        let display = if is_stdin { "(standard input)" } else { file };
        let data = match read_input(file, is_stdin) {
            Ok(data) => data,
            Err(err) => {
                eprintln!("algrep: {}: {}", display, err);
                continue;
            }
        };
        // Lines are matched with their terminator: a trailing-anchored
        // pattern ends in a literal newline, an unanchored one in `.*`.
        for (n, line) in data.lines_with_terminator().enumerate() {
            if !fun.matches(line) {
                continue;
            }
            matched = true;
            let written = (|| -> io::Result<()> {
                if show_name {
                    write!(out, "{}:", display)?;
                }
                if line_number {
                    write!(out, "{}:", n + 1)?;
                }
                out.write_all(line)
            })();
            if written.is_err() {
                process::exit(2);
            }
        }
    }
    if out.flush().is_err() {
        process::exit(2);
    }
    matched
}

fn read_input(path: &str, is_stdin: bool) -> io::Result<Vec<u8>> {
    let mut data = Vec::new();
    if is_stdin {
        io::stdin().lock().read_to_end(&mut data)?;
    } else {
        File::open(path)?.read_to_end(&mut data)?;
    }
    Ok(data)
}
