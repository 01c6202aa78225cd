use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io::Read;
use tracing_subscriber::EnvFilter;

use rz::shell::{Shell, ShellOptions};

#[derive(Parser)]
#[command(name = "rz")]
#[command(about = "An rc-flavored command shell")]
#[command(version)]
struct Cli {
    /// Execute the script from the command line argument
    #[arg(short = 'c')]
    script: Option<String>,

    /// Skip configuration files at startup
    #[arg(long = "norc")]
    norc: bool,

    /// Script file to execute
    #[arg()]
    script_file: Option<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut shell = Shell::new(ShellOptions::default());
    if !cli.norc {
        shell.load_config();
    }

    if let Some(script) = cli.script {
        std::process::exit(shell.exec(&script));
    }

    if let Some(file) = cli.script_file {
        match std::fs::read_to_string(&file) {
            Ok(source) => std::process::exit(shell.exec(&source)),
            Err(err) => {
                eprintln!("rz: cannot read {}: {}", file, err);
                std::process::exit(1);
            }
        }
    }

    // Piped input runs as a script; a terminal gets the editor loop.
    use std::io::IsTerminal;
    if !std::io::stdin().is_terminal() {
        let mut source = String::new();
        std::io::stdin().read_to_string(&mut source).unwrap_or_default();
        std::process::exit(shell.exec(&source));
    }

    std::process::exit(repl(&mut shell));
}

fn repl(shell: &mut Shell) -> i32 {
    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(err) => {
            eprintln!("rz: cannot open terminal: {}", err);
            return 1;
        }
    };

    loop {
        let prompt = shell.prompt();
        match editor.readline(&prompt) {
            Ok(line) => {
                let _ = editor.add_history_entry(line.as_str());
                shell.exec(&line);
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("rz: {}", err);
                break;
            }
        }
    }

    shell.env().status().parse().unwrap_or(0)
}
