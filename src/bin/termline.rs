// src/bin/termline.rs

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use std::time::{Duration, Instant};
use termline::{
    cli::Cli,
    core::controller::InputController,
    core::registry::CommandRegistry,
    system::{
        collaborators::Collaborators,
        console::{self, ConsoleAudio, ConsolePresenter},
        services::{self, DemoHandler, HostQueue, HostRequest, LocalAuthorizer, StaticLookup},
        storage::{self, FileStorage},
    },
    t,
};
use tokio::io::{AsyncBufReadExt, BufReader};

/// How often the virtual clock catches up with the wall clock.
const TICK: Duration = Duration::from_millis(10);

const BUILTIN_REGISTRY: &str = include_str!("../../assets/commands.toml");

/// The main entry point of the `termline` binary.
/// It sets up logging, parses arguments, runs the interactive loop and
/// performs centralized error handling.
fn main() {
    env_logger::init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("\n{}: {:#}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    log::debug!("CLI args parsed: {:?}", cli);

    let registry = match cli.registry_path()? {
        Some(path) => CommandRegistry::load(&path)?,
        None => CommandRegistry::from_toml(BUILTIN_REGISTRY)
            .context("The built-in command registry is invalid")?,
    };

    let storage = if cli.no_history {
        FileStorage::in_memory(cli.access_level, cli.mode.clone())
    } else {
        let path = match cli.history_path()? {
            Some(path) => path,
            None => storage::default_history_path()?,
        };
        FileStorage::open(path, cli.access_level, cli.mode.clone())
    };

    let host = services::host_queue();
    let presenter = ConsolePresenter::new();
    let commands = registry
        .visible_names(cli.access_level)
        .into_iter()
        .map(str::to_string)
        .collect();
    let io = Collaborators {
        authorizer: Box::new(LocalAuthorizer::default()),
        lookup: Box::new(StaticLookup::demo(host.clone())),
        presenter: Box::new(presenter.clone()),
        audio: Box::new(ConsoleAudio::new(cli.bell)),
        storage: Box::new(storage),
        handler: Box::new(DemoHandler::new(
            Box::new(presenter.clone()),
            host.clone(),
            commands,
        )),
    };
    let controller = InputController::new(registry, io);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    runtime.block_on(interact(controller, presenter, host))
}

/// Feeds stdin lines to the controller and keeps its clock in step with real time.
async fn interact(
    mut controller: InputController,
    presenter: ConsolePresenter,
    host: HostQueue,
) -> Result<()> {
    println!(
        "{}",
        format!(t!("console.welcome"), version = env!("CARGO_PKG_VERSION")).dimmed()
    );
    presenter.draw_prompt();

    let started = Instant::now();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(TICK);

    loop {
        let mut redraw = false;
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => {
                    for key in console::line_to_keys(&line) {
                        controller.handle_key(key);
                    }
                    redraw = true;
                }
                None => break,
            },
            _ = ticker.tick() => {}
        }

        let was_playing = controller.is_playing_morse();
        let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        controller.advance_to(elapsed);
        // The decoded text was printed over the prompt.
        redraw |= was_playing && !controller.is_playing_morse();

        match drain_host_requests(&mut controller, &host) {
            Flow::Quit => break,
            Flow::Redraw => redraw = true,
            Flow::Idle => {}
        }
        if redraw {
            presenter.draw_prompt();
        }
    }

    println!("\n{}", t!("console.goodbye").dimmed());
    Ok(())
}

enum Flow {
    Idle,
    Redraw,
    Quit,
}

/// Applies what the collaborators asked of the controller since the last turn.
fn drain_host_requests(controller: &mut InputController, host: &HostQueue) -> Flow {
    let mut flow = Flow::Idle;
    loop {
        // The borrow must end before the controller runs: handlers push to the same queue.
        let next = host.borrow_mut().pop_front();
        let Some(request) = next else {
            return flow;
        };
        match request {
            HostRequest::PlayMorse(symbols) => {
                controller.play_morse(&symbols, false);
            }
            HostRequest::LookupReply { id, names } => {
                controller.on_lookup_result(id, &names);
                flow = Flow::Redraw;
            }
            HostRequest::Reset => {
                controller.reset();
                flow = Flow::Redraw;
            }
            HostRequest::Quit => return Flow::Quit,
        }
    }
}
