use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser as ClapParser;
use color_print::ceprintln;

mod ast;
mod compile;
mod debug;
mod error;
mod ir;
mod ir_codegen;
mod lex;
mod lower;
mod parse;
mod source;
mod symtab;
mod token;
mod types;

use source::Source;

#[derive(ClapParser, Debug)]
#[command(
    name = "mccomp",
    about = "Mini-C batch compiler emitting textual LLVM IR",
    version
)]
struct Cli {
    /// Diagnostic verbosity: user, parser, codegen or verbose.
    #[arg(short = 'd', long = "debug", value_name = "level")]
    debug: Option<String>,

    /// Mini-C source file.
    input: Option<PathBuf>,
}

fn resolve_debug_level(flag: Option<&str>) -> debug::Level {
    // The environment variable overrides the default; the flag wins over
    // both.
    if let Some(name) = flag {
        match debug::Level::from_name(name) {
            Some(level) => return level,
            None => {
                ceprintln!(
                    "<yellow,bold>warning</>: unknown debug level '{}' (expected user, parser, codegen or verbose)",
                    name
                );
            }
        }
    }
    if let Ok(env) = std::env::var("MCCOMP_DEBUG") {
        if let Some(level) = debug::Level::from_name(&env) {
            return level;
        }
    }
    debug::Level::None
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    debug::init(resolve_debug_level(cli.debug.as_deref()));

    let input = match cli.input {
        Some(p) => p,
        None => {
            eprintln!("usage: mccomp [options] INPUT_FILE");
            eprintln!("options:");
            eprintln!("  -d, --debug <level>   set debug level (user, parser, codegen, verbose)");
            eprintln!("or set the MCCOMP_DEBUG environment variable");
            return ExitCode::from(1);
        }
    };

    let path = input.display().to_string();
    debug::user(&format!("opening file: {}", path));

    let src = match std::fs::read_to_string(&input) {
        Ok(s) => s,
        Err(e) => {
            ceprintln!("<red,bold>error</>: failed to read {}: {}", path, e);
            return ExitCode::from(1);
        }
    };

    let result = compile::compile(&src, &path);

    if !result.succeeded() {
        let source = Source::new(&src);
        result.log.dump(&source, &path);
        return ExitCode::from(1);
    }

    let text = ir_codegen::emit_module(&result.module);
    if let Err(e) = std::fs::write("output.ll", &text) {
        ceprintln!("<red,bold>error</>: failed to write output.ll: {}", e);
        return ExitCode::from(1);
    }

    ceprintln!("<green,bold>compilation successful</>");
    eprintln!("Output: output.ll");
    ExitCode::SUCCESS
}
