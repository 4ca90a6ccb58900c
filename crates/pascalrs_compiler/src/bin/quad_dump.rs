use pascalrs::{Compiler, optimize_program};
use std::env;
use std::fs;

fn main() {
    let args: Vec<String> = env::args().collect();

    let source = if args.len() > 1 {
        let filename = &args[1];
        match fs::read_to_string(filename) {
            Ok(content) => {
                println!("=== File: {} ===\n", filename);
                content
            }
            Err(e) => {
                eprintln!("Error reading file '{}': {}", filename, e);
                std::process::exit(1);
            }
        }
    } else {
        println!("Usage: quad_dump <source_file.pas>");
        std::process::exit(0);
    };

    let mut program = match Compiler::compile(&source) {
        Ok(program) => program,
        Err(e) => {
            eprintln!("Compilation error: {}", e);
            std::process::exit(1);
        }
    };

    println!("=== before optimization ===");
    dump(&program);

    optimize_program(&mut program);

    println!("=== after optimization ===");
    dump(&program);
}

fn dump(program: &pascalrs::Program) {
    for (i, quad) in program.quads.iter().enumerate() {
        println!("{:4}  {}", i, quad);
    }
    for proc in &program.procs {
        println!("--- {} ({}) ---", proc.name, proc.params.join(", "));
        for (i, quad) in proc.quads.iter().enumerate() {
            println!("{:4}  {}", i, quad);
        }
    }
    println!();
}
