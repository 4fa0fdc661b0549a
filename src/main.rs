use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use colored::Colorize;

use prattle::vm::{VM, VmStatus};
use prattle::{bytecode, lexer, parser};

const MAX_FILE_SIZE: u64 = 200_000;

#[derive(Default)]
struct Options {
    dump_source: bool,
    dump_tokens: bool,
    dump_ast: bool,
    dump_bytecode: bool,
    input_path: Option<String>,
}

fn parse_args() -> Result<Options> {
    let mut options = Options::default();
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--dump-source" => options.dump_source = true,
            "--dump-tokens" => options.dump_tokens = true,
            "--dump-ast" => options.dump_ast = true,
            "--dump-bytecode" => options.dump_bytecode = true,
            _ => {
                if arg.starts_with('-') {
                    bail!("Unknown flag '{arg}'");
                }
                if options.input_path.is_some() {
                    bail!("Only one input file is supported");
                }
                options.input_path = Some(arg);
            }
        }
    }
    Ok(options)
}

fn slurp_file(path: &str) -> Result<String> {
    let file = Path::new(path);
    if !file.exists() {
        bail!("Input file '{path}' does not exist");
    }
    let size = fs::metadata(file)
        .with_context(|| format!("Inspecting {path}"))?
        .len();
    if size >= MAX_FILE_SIZE {
        bail!("Input file '{path}' is {size} bytes; the limit is {MAX_FILE_SIZE}");
    }
    fs::read_to_string(file).with_context(|| format!("Reading {path}"))
}

fn print_source_listing(source: &str) {
    for (index, line) in source.lines().enumerate() {
        println!("{:3}: {line}", index + 1);
    }
}

fn run_file(path: &str, options: &Options) -> Result<VmStatus> {
    let source = slurp_file(path)?;
    if options.dump_source {
        print_source_listing(&source);
    }

    let tokens = lexer::tokenize(&source).with_context(|| format!("Scanning {path}"))?;
    if options.dump_tokens {
        print!("{}", lexer::render_token_stream(&tokens));
    }

    let statements = parser::parse_tokens(tokens).with_context(|| format!("Parsing {path}"))?;
    if options.dump_ast {
        for statement in &statements {
            println!("{statement};");
        }
    }

    let chunk = bytecode::compile(&statements).with_context(|| format!("Compiling {path}"))?;
    if options.dump_bytecode {
        print!("{}", chunk.disassemble());
    }

    let mut vm = VM::new();
    let status = vm.run(&chunk).with_context(|| format!("Executing {path}"))?;
    for line in &vm.output {
        println!("{line}");
    }
    Ok(status)
}

fn run_prompt() {
    println!("prattle: no repl yet; pass a source file instead");
}

fn main() {
    let result = parse_args().and_then(|options| match options.input_path.clone() {
        Some(path) => run_file(&path, &options),
        None => {
            run_prompt();
            Ok(VmStatus::Ok)
        }
    });
    match result {
        Ok(VmStatus::Ok) => {}
        Ok(status) => {
            eprintln!("{} vm exited with status {status}", "error:".red());
            std::process::exit(1);
        }
        Err(error) => {
            eprintln!("{} {error:#}", "error:".red());
            std::process::exit(1);
        }
    }
}
