// Debug tracing, orthogonal to diagnostics. The level is set once by the
// driver (flag or MCCOMP_DEBUG) and trace calls are no-ops below their level.

use std::sync::atomic::{AtomicU8, Ordering};

use color_print::ceprintln;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Level {
    None = 0,
    User = 1,
    Parser = 2,
    Codegen = 3,
    Verbose = 4,
}

impl Level {
    pub fn from_name(name: &str) -> Option<Level> {
        match name {
            "user" => Some(Level::User),
            "parser" => Some(Level::Parser),
            "codegen" => Some(Level::Codegen),
            "verbose" => Some(Level::Verbose),
            _ => None,
        }
    }
}

static LEVEL: AtomicU8 = AtomicU8::new(0);

pub fn init(level: Level) {
    LEVEL.store(level as u8, Ordering::Relaxed);
}

pub fn level() -> Level {
    match LEVEL.load(Ordering::Relaxed) {
        1 => Level::User,
        2 => Level::Parser,
        3 => Level::Codegen,
        4 => Level::Verbose,
        _ => Level::None,
    }
}

pub fn user(msg: &str) {
    if level() >= Level::User {
        ceprintln!("<cyan,bold>[USER]</> {}", msg);
    }
}

pub fn parser(msg: &str) {
    if level() >= Level::Parser {
        ceprintln!("<green,bold>[PARSER]</> {}", msg);
    }
}

pub fn parser_at(msg: &str, line: u32, col: u32) {
    if level() >= Level::Parser {
        ceprintln!("<green,bold>[PARSER]</> {} (at {}:{})", msg, line, col);
    }
}

pub fn codegen(msg: &str) {
    if level() >= Level::Codegen {
        ceprintln!("<yellow,bold>[CODEGEN]</> {}", msg);
    }
}

pub fn verbose(msg: &str) {
    if level() >= Level::Verbose {
        ceprintln!("<magenta,bold>[VERBOSE]</> {}", msg);
    }
}
