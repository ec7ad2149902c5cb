//! MSL CLI - Command line interface for the MSL shader compiler

use std::fs;
use std::path::{Path, PathBuf};

use ariadne::{Color, Label, Report, ReportKind, Source};
use clap::{Parser, Subcommand, ValueEnum};

use msl_ast::{Ast, CompilerState, ShaderKind, Span};
use msl_checker::annotate;
use msl_codegen::{
    compile_to_vec, disassemble, CompileError, Metadata, DEFAULT_BYTECODE_CAPACITY,
    DEFAULT_METADATA_CAPACITY,
};
use msl_lexer::lex;
use msl_parser::parse;

#[derive(Parser)]
#[command(name = "msl")]
#[command(about = "MSL shading language compiler", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Vm,
    Vertex,
    Pixel,
}

impl From<KindArg> for ShaderKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Vm => ShaderKind::Vm,
            KindArg::Vertex => ShaderKind::Vertex,
            KindArg::Pixel => ShaderKind::Pixel,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print the token stream of a file
    Tokens {
        /// Input file
        file: PathBuf,
    },
    /// Parse a file and output the tree and declarations as JSON
    Parse {
        /// Input file
        file: PathBuf,
        /// Pretty print the output
        #[arg(short, long)]
        pretty: bool,
    },
    /// Resolve names and check types
    Check {
        /// Input file(s)
        files: Vec<PathBuf>,
    },
    /// Compile a file to bytecode (.msb) and metadata (.msm)
    Compile {
        /// Input file
        file: PathBuf,
        /// Target to generate
        #[arg(short, long, value_enum, default_value = "vm")]
        kind: KindArg,
        /// Output path without extension
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Bytecode buffer size in bytes
        #[arg(long, default_value_t = DEFAULT_BYTECODE_CAPACITY)]
        bytecode_capacity: usize,
        /// Metadata buffer size in bytes
        #[arg(long, default_value_t = DEFAULT_METADATA_CAPACITY)]
        metadata_capacity: usize,
    },
    /// Print a listing of a bytecode file
    Disasm {
        /// Bytecode file
        file: PathBuf,
    },
    /// Decode a metadata file as JSON
    Inspect {
        /// Metadata file
        file: PathBuf,
        /// Pretty print the output
        #[arg(short, long)]
        pretty: bool,
    },
    /// Interactive REPL
    Repl,
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Tokens { file } => cmd_tokens(&file),
        Commands::Parse { file, pretty } => cmd_parse(&file, pretty),
        Commands::Check { files } => cmd_check(&files),
        Commands::Compile {
            file,
            kind,
            output,
            bytecode_capacity,
            metadata_capacity,
        } => cmd_compile(
            &file,
            kind.into(),
            output,
            bytecode_capacity,
            metadata_capacity,
        ),
        Commands::Disasm { file } => cmd_disasm(&file),
        Commands::Inspect { file, pretty } => cmd_inspect(&file, pretty),
        Commands::Repl => cmd_repl(),
    }
}

fn read_source(file: &Path) -> String {
    match fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading {}: {}", file.display(), e);
            std::process::exit(1);
        }
    }
}

fn read_bytes(file: &Path) -> Vec<u8> {
    match fs::read(file) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Error reading {}: {}", file.display(), e);
            std::process::exit(1);
        }
    }
}

/// Everything short of code generation: lex, parse, index, annotate
fn check_source(source: &str) -> Result<(Ast, CompilerState), CompileError> {
    let tokens = lex(source)?;
    let (mut ast, mut state) = parse(&tokens)?;
    state.assign_indices();
    annotate(&mut ast, &state)?;
    Ok((ast, state))
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> String {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    match json {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            std::process::exit(1);
        }
    }
}

fn cmd_tokens(file: &Path) {
    let source = read_source(file);

    match lex(&source) {
        Ok(tokens) => {
            for token in tokens {
                println!(
                    "{:>4}:{:<4} {:<16} {}",
                    token.span.line(&source),
                    token.span.start,
                    token.kind.describe(),
                    token.attribute
                );
            }
        }
        Err(e) => {
            report_error(&source, file, &e.to_string(), Some(e.span()));
            std::process::exit(1);
        }
    }
}

fn cmd_parse(file: &Path, pretty: bool) {
    let source = read_source(file);

    let parsed = lex(&source)
        .map_err(CompileError::from)
        .and_then(|tokens| parse(&tokens).map_err(CompileError::from));

    match parsed {
        Ok((ast, state)) => {
            let value = serde_json::json!({ "ast": ast, "state": state });
            println!("{}", to_json(&value, pretty));
        }
        Err(e) => {
            report_compile_error(&source, file, &e);
            std::process::exit(1);
        }
    }
}

fn cmd_check(files: &[PathBuf]) {
    let mut all_ok = true;

    for file in files {
        let source = match fs::read_to_string(file) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Error reading {}: {}", file.display(), e);
                all_ok = false;
                continue;
            }
        };

        match check_source(&source) {
            Ok((ast, state)) => {
                println!(
                    "✓ {} - {} functions, {} inputs, {} outputs, {} bindings",
                    file.display(),
                    ast.functions().count(),
                    state.inputs.len(),
                    state.outputs.len(),
                    state.binding_count()
                );
            }
            Err(e) => {
                report_compile_error(&source, file, &e);
                all_ok = false;
            }
        }
    }

    if !all_ok {
        std::process::exit(1);
    }
}

fn cmd_compile(
    file: &Path,
    kind: ShaderKind,
    output: Option<PathBuf>,
    bytecode_capacity: usize,
    metadata_capacity: usize,
) {
    let source = read_source(file);

    let artifact = match compile_to_vec(&source, kind, bytecode_capacity, metadata_capacity) {
        Ok(a) => a,
        Err(e) => {
            report_compile_error(&source, file, &e);
            std::process::exit(1);
        }
    };

    let base = output.unwrap_or_else(|| file.to_path_buf());
    let bytecode_path = base.with_extension("msb");
    let metadata_path = base.with_extension("msm");

    for (path, bytes) in [
        (&bytecode_path, &artifact.bytecode),
        (&metadata_path, &artifact.metadata),
    ] {
        if let Err(e) = fs::write(path, bytes) {
            eprintln!("Error writing {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }

    println!(
        "Compiled {} for {} to {} ({} bytes) and {} ({} bytes)",
        file.display(),
        kind,
        bytecode_path.display(),
        artifact.bytecode.len(),
        metadata_path.display(),
        artifact.metadata.len()
    );
}

fn cmd_disasm(file: &Path) {
    let bytes = read_bytes(file);
    match disassemble(&bytes) {
        Ok(program) => print!("{}", program),
        Err(e) => {
            eprintln!("Error decoding {}: {}", file.display(), e);
            std::process::exit(1);
        }
    }
}

fn cmd_inspect(file: &Path, pretty: bool) {
    let bytes = read_bytes(file);
    match Metadata::decode(&bytes) {
        Ok(metadata) => println!("{}", to_json(&metadata, pretty)),
        Err(e) => {
            eprintln!("Error decoding {}: {}", file.display(), e);
            std::process::exit(1);
        }
    }
}

fn cmd_repl() {
    use rustyline::DefaultEditor;

    println!("MSL REPL v{}", env!("CARGO_PKG_VERSION"));
    println!("Type :help for help, :quit to exit");
    println!();

    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("Failed to create REPL: {}", e);
            std::process::exit(1);
        }
    };
    let mut loaded_source = String::new();
    let repl_file = Path::new("<repl>");

    loop {
        let line = match rl.readline("msl> ") {
            Ok(line) => line,
            Err(_) => break,
        };
        let _ = rl.add_history_entry(&line);
        let trimmed = line.trim();

        if trimmed.starts_with(':') {
            let (command, arg) = match trimmed.split_once(char::is_whitespace) {
                Some((command, arg)) => (command, arg.trim()),
                None => (trimmed, ""),
            };
            match command {
                ":quit" | ":q" => break,
                ":help" | ":h" => {
                    println!("Commands:");
                    println!("  :load <file>      - Load declarations from a file");
                    println!("  :tokens           - Show tokens of loaded code");
                    println!("  :ast              - Show parsed tree of loaded code");
                    println!("  :check            - Check loaded code");
                    println!("  :compile <kind>   - Compile loaded code (vm, vertex, pixel)");
                    println!("  :clear            - Clear loaded code");
                    println!("  :quit             - Exit REPL");
                    println!("Any other line is compiled as the body of `void main()`.");
                }
                ":load" => match fs::read_to_string(arg) {
                    Ok(s) => {
                        loaded_source = s;
                        println!("Loaded {}", arg);
                    }
                    Err(e) => eprintln!("Error: {}", e),
                },
                ":clear" => {
                    loaded_source.clear();
                    println!("Cleared");
                }
                ":tokens" | ":ast" | ":check" | ":compile" if loaded_source.is_empty() => {
                    println!("No code loaded. Use :load <file>");
                }
                ":tokens" => match lex(&loaded_source) {
                    Ok(tokens) => {
                        for token in tokens {
                            println!("  {:<16} {}", token.kind.describe(), token.attribute);
                        }
                    }
                    Err(e) => report_error(&loaded_source, repl_file, &e.to_string(), Some(e.span())),
                },
                ":ast" => match lex(&loaded_source)
                    .map_err(CompileError::from)
                    .and_then(|tokens| parse(&tokens).map_err(CompileError::from))
                {
                    Ok((ast, _)) => println!("{}", to_json(&ast, true)),
                    Err(e) => report_compile_error(&loaded_source, repl_file, &e),
                },
                ":check" => match check_source(&loaded_source) {
                    Ok((ast, state)) => {
                        println!("✓ Check passed");
                        println!(
                            "  {} functions, {} bindings",
                            ast.functions().count(),
                            state.binding_count()
                        );
                    }
                    Err(e) => report_compile_error(&loaded_source, repl_file, &e),
                },
                ":compile" => match KindArg::from_str(arg, true) {
                    Ok(kind) => repl_compile(&loaded_source, repl_file, kind.into()),
                    Err(_) => eprintln!("Unknown kind `{}`; expected vm, vertex or pixel", arg),
                },
                _ => println!("Unknown command. Type :help for help."),
            }
        } else if !trimmed.is_empty() {
            let wrapped = format!("{}\nvoid main() {{ {} }}", loaded_source, trimmed);
            repl_compile(&wrapped, repl_file, ShaderKind::Vm);
        }
    }

    println!("Goodbye!");
}

fn repl_compile(source: &str, file: &Path, kind: ShaderKind) {
    let artifact = match compile_to_vec(
        source,
        kind,
        DEFAULT_BYTECODE_CAPACITY,
        DEFAULT_METADATA_CAPACITY,
    ) {
        Ok(a) => a,
        Err(e) => {
            report_compile_error(source, file, &e);
            return;
        }
    };
    match disassemble(&artifact.bytecode) {
        Ok(program) => print!("{}", program),
        Err(e) => eprintln!("Error decoding output: {}", e),
    }
    println!(
        "; {} bytes of bytecode, {} bytes of metadata",
        artifact.bytecode.len(),
        artifact.metadata.len()
    );
}

fn report_compile_error(source: &str, file: &Path, error: &CompileError) {
    let message = format!("{} error: {}", error.stage(), error);
    report_error(source, file, &message, error.span());
}

fn report_error(source: &str, file: &Path, message: &str, span: Option<Span>) {
    let Some(span) = span else {
        eprintln!("{}: {}", file.display(), message);
        return;
    };

    let name = file.to_string_lossy().to_string();
    let end = span.end.max(span.start + 1).min(source.len().max(span.start));
    let printed = Report::build(ReportKind::Error, name.clone(), span.start)
        .with_message(message)
        .with_label(
            Label::new((name.clone(), span.start..end))
                .with_message(message)
                .with_color(Color::Red),
        )
        .finish()
        .eprint((name, Source::from(source)));

    if printed.is_err() {
        eprintln!("{}:{}: {}", file.display(), span.line(source), message);
    }
}
