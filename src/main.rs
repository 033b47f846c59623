//! speakpad main entry point
//!
//! Reads commands from stdin, one per line, and applies them to the snippet
//! list, the voice and device choices, or the speak action.

use log::{debug, error, info};
use speakpad::audio::CpalRegistry;
use speakpad::input::{parse_command, Command, HELP};
use speakpad::notify::TerminalNotifier;
use speakpad::speech::{create_backend, SpeakOutcome};
use speakpad::state::config::Config;
use speakpad::state::State;
use speakpad::{Result, SpeakpadError};
use std::io::{self, BufRead, Write};
use std::process;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let debug_mode = args.iter().any(|arg| arg == "--debug" || arg == "-d");

    // Initialize logger
    if debug_mode {
        // Debug mode: write to speakpad.log
        use std::fs::OpenOptions;
        match OpenOptions::new()
            .create(true)
            .append(true)
            .open("speakpad.log")
        {
            Ok(log_file) => {
                env_logger::Builder::new()
                    .filter_level(log::LevelFilter::Debug)
                    .target(env_logger::Target::Pipe(Box::new(log_file)))
                    .init();
            }
            Err(e) => {
                eprintln!("Warning: Failed to open speakpad.log for debug logging: {}", e);
                eprintln!("Continuing without file logging...");
                env_logger::Builder::new()
                    .filter_level(log::LevelFilter::Warn)
                    .init();
            }
        }

        info!(
            "speakpad version {} starting (debug mode, logging to speakpad.log)",
            speakpad::VERSION
        );
    } else {
        // Normal mode: errors only, unless RUST_LOG says otherwise
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Error)
            .parse_default_env()
            .init();
    }

    if let Err(e) = run() {
        error!("Fatal error: {}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    debug!("Initializing speakpad");

    let config = Config::load()?;
    info!("Configuration loaded from {:?}", config.path());

    let backend = create_backend(config.engine_kind()?, &config.backend_options())?;
    let mut state = State::new(
        config,
        backend,
        Box::new(CpalRegistry::new()),
        Box::new(TerminalNotifier::new()),
    )?;

    println!("{} {}", speakpad::APP_NAME, speakpad::VERSION);
    println!("Speech engine: {}", state.engine_name());
    println!("Voice: {}", state.voice().label());
    match state.device() {
        Some(device) => println!("Output: {}", device.name),
        None => println!("Output: none (use 'devices' and 'device <n>')"),
    }
    println!("Type 'help' for commands");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        io::stdout().flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        if command == Command::Quit {
            break;
        }
        if let Err(e) = dispatch(&mut state, command) {
            println!("{}", e);
        }
    }

    info!("speakpad exiting");
    Ok(())
}

fn dispatch(state: &mut State, command: Command) -> Result<()> {
    match command {
        Command::List => print_snippets(state),
        Command::Add(text) => {
            if !state.snippets.add(&text) {
                println!("Nothing to add");
            }
        }
        Command::Delete => match state.snippets.delete_current() {
            Some(removed) => println!("Deleted: {}", removed),
            None => println!("No snippet selected"),
        },
        Command::Select(row) => {
            if state.snippets.select(row) {
                println!("Text: {}", state.snippets.edit());
            } else {
                println!("No snippet number {}", row + 1);
            }
        }
        Command::Edit(text) => state.snippets.set_edit(&text),
        Command::Save => {
            if !state.snippets.save() {
                println!("Nothing to save");
            }
        }
        Command::Speak => report(state.speak()),
        Command::Say(text) => {
            state.snippets.set_edit(&text);
            report(state.speak());
        }
        Command::Voices => {
            let current = state.voice().id().to_string();
            println!(
                "      Default voice ('voice default'){}",
                if current.is_empty() { " *" } else { "" }
            );
            for (i, voice) in state.refresh_voices().iter().enumerate() {
                let marker = if voice.id == current { " *" } else { "" };
                println!("{:4}. {}{}", i + 1, voice.label(), marker);
            }
        }
        Command::Voice(index) => {
            let voice = state.choose_voice(index)?;
            println!("Voice: {}", voice.label());
        }
        Command::Devices => {
            let current = state.device().map(|d| d.name.clone());
            for (i, device) in state.refresh_devices()?.iter().enumerate() {
                let marker = if Some(&device.name) == current.as_ref() {
                    " *"
                } else {
                    ""
                };
                println!("{:4}. {}{}", i + 1, device, marker);
            }
        }
        Command::Device(index) => {
            state.choose_device(index)?;
            if let Some(device) = state.device() {
                println!("Output: {}", device.name);
            }
        }
        Command::Help => println!("{}", HELP),
        Command::Quit => {}
    }
    Ok(())
}

fn print_snippets(state: &State) {
    if state.snippets.is_empty() {
        println!("No snippets yet (use 'add <text>')");
        return;
    }
    for (i, text) in state.snippets.items().iter().enumerate() {
        let marker = if state.snippets.current() == Some(i) {
            ">"
        } else {
            " "
        };
        println!("{}{:3}. {}", marker, i + 1, text);
    }
}

fn report(outcome: SpeakOutcome) {
    match outcome {
        SpeakOutcome::Playing { duration, .. } => {
            println!("Speaking (~{:.1}s)", duration.as_secs_f32());
        }
        SpeakOutcome::Skipped => println!("Nothing to speak"),
        SpeakOutcome::Rejected => println!("{}", SpeakpadError::Busy),
        // Already shown to the user by the notifier
        SpeakOutcome::Failed(_) => {}
    }
}
