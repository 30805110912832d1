use std::path::PathBuf;
use std::process;

use clap::Parser;
use tatami_wm::command;
use tatami_wm::common::config::{self, Settings};
use tatami_wm::common::log;
use tatami_wm::ipc;
use tatami_wm::reactor::Reactor;
use tatami_wm::sys::window_server;

#[derive(Parser)]
#[command(name = "tatami", about = "A BSP/monocle tiling window manager")]
struct Cli {
    /// Send a command to the running daemon and print its reply.
    #[arg(short, long, value_name = "COMMAND")]
    message: Option<String>,

    /// Path to the config script (overrides the default).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Parse the config script and report diagnostics without starting.
    #[arg(long)]
    validate: bool,
}

fn main() {
    sigpipe::reset();
    let cli = Cli::parse();

    if let Some(message) = &cli.message {
        match ipc::send_command(message) {
            Ok(response) => {
                if !response.is_empty() {
                    println!("{response}");
                }
            }
            Err(err) => {
                eprintln!("tatami: {err}");
                process::exit(1);
            }
        }
        return;
    }

    log::init_logging();
    install_panic_hook();

    let config_path = cli.config.clone().unwrap_or_else(config::config_file);

    if cli.validate {
        let text = match std::fs::read_to_string(&config_path) {
            Ok(text) => text,
            Err(err) => {
                eprintln!("tatami: cannot read {}: {err}", config_path.display());
                process::exit(1);
            }
        };
        let (commands, diagnostics) = command::parse_script(&text);
        for (line, err) in &diagnostics {
            eprintln!("{}:{line}: {err}", config_path.display());
        }
        if diagnostics.is_empty() {
            println!("{} commands, no issues", commands.len());
            return;
        }
        process::exit(1);
    }

    let server = window_server::connect();
    let reactor = Reactor::new(
        server,
        Settings::default(),
        config_path.exists().then_some(config_path.clone()),
        config::layouts_dir(),
    );
    let (events, worker) = reactor.spawn();

    // No degraded mode: a dead control socket means a dead daemon.
    if let Err(err) = ipc::spawn_server(events.clone()) {
        eprintln!("tatami: {err}");
        process::exit(1);
    }

    if config_path.exists() {
        events.send(tatami_wm::reactor::Event::Command {
            command: tatami_wm::command::Command::Config(
                tatami_wm::command::ConfigCommand::Reload,
            ),
            reply: None,
        });
    }

    let events_for_signal = events.clone();
    if let Err(err) = ctrlc::set_handler(move || {
        events_for_signal.send(tatami_wm::reactor::Event::Command {
            command: tatami_wm::command::Command::Quit,
            reply: None,
        });
    }) {
        eprintln!("tatami: installing the signal handler failed: {err}");
    }

    if worker.join().is_err() {
        process::exit(1);
    }
}

fn install_panic_hook() {
    // Abort instead of unwinding into the other threads.
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        original_hook(info);
        std::process::abort();
    }));
}
