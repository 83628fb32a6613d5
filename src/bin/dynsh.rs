//! dynsh - dynamic value inspector
//!
//! Reads JSON documents and prints them back as dynamic values, or sorts
//! number arrays with the growable-array quicksort.

use std::error::Error;

use dyntype::builtins::{Arg, ArrayRef, Closure, ElemKind, Ret};
use dyntype::{DynContext, EngineConfig};
use regex::Regex;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const HELP: &str = "\
Enter a JSON document to inspect it as a dynamic value.

Commands:
  :sort <json number array>   sort numbers with the array quicksort
  :help                       show this help
  :quit                       exit";

enum Command {
    Sort(String),
    Help,
    Quit,
    Unknown(String),
}

struct Shell {
    ctx: DynContext,
    command: Regex,
}

impl Shell {
    fn new(ctx: DynContext) -> Result<Self, regex::Error> {
        Ok(Shell {
            ctx,
            command: Regex::new(r"^:(\w+)\s*(.*)$")?,
        })
    }

    fn parse_command(&self, line: &str) -> Option<Command> {
        let caps = self.command.captures(line)?;
        let arg = caps[2].trim().to_string();
        Some(match &caps[1] {
            "sort" => Command::Sort(arg),
            "help" => Command::Help,
            "quit" | "q" => Command::Quit,
            other => Command::Unknown(other.to_string()),
        })
    }

    /// Handle one input line, returning false when the shell should exit
    fn eval_line(&self, line: &str) -> bool {
        match self.parse_command(line) {
            Some(Command::Quit) => return false,
            Some(Command::Help) => println!("{HELP}"),
            Some(Command::Sort(arg)) => match self.sort(&arg) {
                Ok(sorted) => println!("{sorted}"),
                Err(e) => println!("Error: {e}"),
            },
            Some(Command::Unknown(name)) => println!("Unknown command :{name} (try :help)"),
            None => self.inspect(line),
        }
        true
    }

    fn inspect(&self, text: &str) {
        match self.ctx.parse_json(text) {
            Ok(v) => println!(
                "{} {}",
                self.ctx.typeof_name(&v),
                self.ctx.dump_value(&v)
            ),
            Err(e) => println!("Error: {e}"),
        }
    }

    fn sort(&self, text: &str) -> Result<String, Box<dyn Error>> {
        let values: Vec<f64> = serde_json::from_str(text)?;
        let arr = ArrayRef::from_vec(values);
        let ascending = Closure::new(0, ElemKind::F64, |_ctx: &DynContext, args: &[Arg<f64>]| {
            let pivot = args.get(1).and_then(Arg::as_elem).copied().unwrap_or(0.0);
            let elem = args.get(2).and_then(Arg::as_elem).copied().unwrap_or(0.0);
            Ok(Ret::F64(pivot - elem))
        });
        arr.sort(&self.ctx, &ascending)?;
        Ok(serde_json::to_string(&arr.to_vec())?)
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let config = match std::env::var("DYNSH_CONFIG") {
        Ok(path) => EngineConfig::from_json(&std::fs::read_to_string(path)?)?,
        Err(_) => EngineConfig::default(),
    };
    debug!(?config, "engine configuration");
    let shell = Shell::new(DynContext::with_config(config))?;

    if args.len() > 1 {
        // Inspect a file
        let source = std::fs::read_to_string(&args[1])?;
        shell.inspect(source.trim());
        return Ok(());
    }

    println!("dynsh - dynamic value inspector");
    println!("Type JSON to inspect, :help for commands, Ctrl+D to exit.\n");

    let mut rl = DefaultEditor::new()?;
    loop {
        match rl.readline("> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                rl.add_history_entry(line)?;
                if !shell.eval_line(line) {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => {
                println!();
                break;
            }
            Err(e) => {
                eprintln!("Error reading input: {e}");
                break;
            }
        }
    }
    Ok(())
}
