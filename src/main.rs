use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use rox::ast_printer::AstPrinter;
use rox::parser::Parser;
use rox::scanner::Scanner;
use rox::session::{Outcome, Session, EXIT_STATIC_ERROR};

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print the token stream as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parses input from a file as a single expression and prints its AST
    Parse { filename: PathBuf },

    /// Evaluates input from a file as a single expression and prints the result
    Evaluate { filename: PathBuf },

    /// Runs input from a file as a Lox program
    Run { filename: PathBuf },

    /// Reads and runs Lox one line at a time
    Repl,
}

/// Reads the contents of a file into a Vec<u8>
fn read_file(filename: &Path) -> Result<Vec<u8>> {
    info!("Reading file: {:?}", filename);
    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    Ok(buf)
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            let module = record.module_path().unwrap_or("<unnamed>");
            let module = module.strip_prefix("rox::").unwrap_or(module);
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

fn report(outcome: &Outcome) {
    for diagnostic in outcome.diagnostics() {
        eprintln!("{}", diagnostic);
    }
}

fn tokenize(filename: &Path, json: bool) -> Result<i32> {
    let buf = read_file(filename)?;
    let mut tokens = Vec::new();
    let mut tokenized = true;

    for item in Scanner::new(&buf) {
        match item {
            Ok(token) => {
                if !json {
                    println!("{}", token);
                }
                tokens.push(token);
            }
            Err(e) => {
                tokenized = false;
                eprintln!("{}", e);
            }
        }
    }

    if json {
        let rendered =
            serde_json::to_string_pretty(&tokens).context("Failed to serialize tokens")?;
        println!("{}", rendered);
    }

    Ok(if tokenized { 0 } else { EXIT_STATIC_ERROR })
}

fn parse(filename: &Path) -> Result<i32> {
    let buf = read_file(filename)?;
    let (tokens, errors) = Scanner::new(&buf).scan_all();

    if !errors.is_empty() {
        report(&Outcome::StaticErrors(errors));
        return Ok(EXIT_STATIC_ERROR);
    }

    match Parser::new(tokens).parse_expression() {
        Ok(expr) => {
            let ast = AstPrinter::print(&expr);
            debug!("AST: {}", ast);
            println!("{}", ast);
            Ok(0)
        }
        Err(e) => {
            eprintln!("{}", e);
            Ok(EXIT_STATIC_ERROR)
        }
    }
}

fn evaluate(filename: &Path) -> Result<i32> {
    let buf = read_file(filename)?;
    let mut session = Session::new();

    match session.evaluate(&buf) {
        Ok(value) => {
            debug!("Evaluated to: {}", value);
            println!("{}", value);
            Ok(0)
        }
        Err(outcome) => {
            report(&outcome);
            Ok(outcome.exit_code())
        }
    }
}

fn run(filename: &Path) -> Result<i32> {
    let buf = read_file(filename)?;
    let mut session = Session::new();

    let outcome = session.run(&buf);
    report(&outcome);

    Ok(outcome.exit_code())
}

fn repl() -> Result<i32> {
    let mut session = Session::new();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        io::stdout().flush().context("Failed to flush prompt")?;

        let Some(line) = lines.next() else {
            println!();
            return Ok(0);
        };

        let line = line.context("Failed to read from stdin")?;

        // Errors are reported and the session carries on with the next line.
        report(&session.run(line.as_bytes()));
    }
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger()?;
    } else {
        Builder::new().filter_level(log::LevelFilter::Off).init();
    }

    info!("CLI arguments: {:?}", args);

    let code = match &args.commands {
        Commands::Tokenize { filename, json } => tokenize(filename, *json)?,
        Commands::Parse { filename } => parse(filename)?,
        Commands::Evaluate { filename } => evaluate(filename)?,
        Commands::Run { filename } => run(filename)?,
        Commands::Repl => repl()?,
    };

    if code != 0 {
        debug!("Exiting with code {}", code);
        process::exit(code);
    }

    Ok(())
}
