use pascalrs::compiler::Lexer;
use pascalrs::serde::{quads_to_json, symbols_to_json, target_to_json, tokens_to_json};
use pascalrs::{Compiler, QuadVm, codegen, optimize_program};
use serde_json::json;
use std::env;
use std::fs;
use std::process;

const VERSION: &str = "pascalc 0.3";

fn print_usage() {
    eprintln!("usage: pascalc --input <file> --target <target>");
    eprintln!("Available targets are:");
    eprintln!("  tokens       token stream as JSON");
    eprintln!("  quads        quadruples before and after optimization, as JSON");
    eprintln!("  symbols      symbol and constant tables as JSON");
    eprintln!("  target_code  pseudo-assembly for the optimized program, as JSON");
    eprintln!("  run          execute the optimized program");
}

#[derive(Default)]
struct Options {
    input: Option<String>,
    target: Option<String>,
    show_version: bool,
}

fn parse_args() -> Result<Options, String> {
    let args: Vec<String> = env::args().collect();
    let mut opts = Options::default();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--input" => {
                i += 1;
                if i >= args.len() {
                    return Err("'--input' needs an argument".to_string());
                }
                opts.input = Some(args[i].clone());
            }
            "--target" => {
                i += 1;
                if i >= args.len() {
                    return Err("'--target' needs an argument".to_string());
                }
                opts.target = Some(args[i].clone());
            }
            "-v" | "--version" => {
                opts.show_version = true;
            }
            other => {
                return Err(format!("unrecognized option '{}'", other));
            }
        }
        i += 1;
    }

    Ok(opts)
}

fn run(opts: &Options) -> Result<(), String> {
    let (Some(input), Some(target)) = (&opts.input, &opts.target) else {
        print_usage();
        return Err("missing --input or --target".to_string());
    };

    let source =
        fs::read_to_string(input).map_err(|e| format!("cannot open {}: {}", input, e))?;

    match target.as_str() {
        "tokens" => {
            let tokens = Lexer::new(&source)
                .tokenize()
                .map_err(|e| format!("{}:{}", input, e))?;
            print_json(&tokens_to_json(&tokens, &source));
        }
        "quads" => {
            let mut program = Compiler::compile_with_name(&source, input)?;
            let before = quads_to_json(&program.quads);
            optimize_program(&mut program);
            let after = quads_to_json(&program.quads);
            print_json(&json!({ "before": before, "after": after }));
        }
        "symbols" => {
            let program = Compiler::compile_with_name(&source, input)?;
            print_json(&symbols_to_json(&program.table));
        }
        "target_code" => {
            let mut program = Compiler::compile_with_name(&source, input)?;
            optimize_program(&mut program);
            let lines = codegen::generate_target(&program.quads, &program.table);
            print_json(&target_to_json(&lines));
        }
        "run" => {
            let mut program = Compiler::compile_with_name(&source, input)?;
            optimize_program(&mut program);
            let outcome = QuadVm::new()
                .run(&program)
                .map_err(|e| format!("{}: runtime error: {}", input, e))?;
            for line in outcome.output {
                println!("{}", line);
            }
        }
        other => {
            print_usage();
            return Err(format!("invalid target '{}'", other));
        }
    }

    Ok(())
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("pascalc: failed to serialize output: {}", e),
    }
}

fn main() {
    let opts = match parse_args() {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("pascalc: {}", e);
            print_usage();
            process::exit(1);
        }
    };

    if opts.show_version {
        println!("{}", VERSION);
        if opts.input.is_none() && opts.target.is_none() {
            return;
        }
    }

    if let Err(e) = run(&opts) {
        eprintln!("pascalc: {}", e);
        process::exit(1);
    }
}
