//! Terminal front end: command parsing, status rendering and the input loop

use anyhow::Result;
use std::fmt;
use std::sync::{Arc, Mutex};
use stepwise_core::{describe, Navigation, Placement, RecordingStage, Sequencer, Transition};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::highlight::IndicatorBoard;

/// A line of user input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Navigate(Navigation),
    Status,
    Help,
    Quit,
}

impl Command {
    pub fn parse(input: &str) -> Option<Self> {
        if let Ok(navigation) = input.parse::<Navigation>() {
            return Some(Command::Navigate(navigation));
        }
        match input.trim().to_lowercase().as_str() {
            "status" | "s" => Some(Command::Status),
            "help" | "h" | "?" => Some(Command::Help),
            "quit" | "q" | "exit" => Some(Command::Quit),
            _ => None,
        }
    }
}

pub const HELP: &str = "Commands: next (n), previous (p), restart (r), status (s), help (h), quit (q)";

/// Everything the console needs to drive one assembly session
pub struct Session {
    pub sequencer: Sequencer,
    pub stage: RecordingStage,
    pub board: Option<Arc<Mutex<IndicatorBoard>>>,
    pub step_texts: Vec<String>,
}

impl Session {
    pub fn navigate(&mut self, navigation: Navigation) -> Transition {
        let transition = self.sequencer.apply(navigation, &mut self.stage);
        info!(
            command = navigation.as_str(),
            from = transition.from,
            to = transition.to,
            "Navigation"
        );
        transition
    }

}

/// Instruction text followed by the part, label and indicator tables
impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let seq = &self.sequencer;
        let guide = describe(seq.current_step(), seq.last_step(), &self.step_texts);

        writeln!(f, "== Step {} / {} ==", seq.current_step(), seq.last_step())?;
        writeln!(f, "{}", guide.message)?;

        let mut buttons = Vec::new();
        if guide.show_previous {
            buttons.push("[previous]");
        }
        if guide.show_next {
            buttons.push("[next]");
        }
        if guide.show_restart {
            buttons.push("[restart]");
        }
        writeln!(f, "{}", buttons.join(" "))?;

        writeln!(f, "Parts:")?;
        for part in seq.parts() {
            let state = self.stage.node(part.node);
            let visible = state.is_some_and(|s| s.visible);
            let where_ = match state.map(|s| s.placement) {
                Some(Placement::Anchored(_)) => "anchor",
                Some(Placement::Local(pose)) if pose == part.original_pose => "final",
                Some(Placement::Local(_)) | None => "moved",
            };
            writeln!(
                f,
                "  {:<24} step {:>2}  {:<10} {:<8} {:<6} {}",
                part.name,
                part.step,
                part.material,
                if part.placed { "placed" } else { "pending" },
                where_,
                if visible { "shown" } else { "hidden" },
            )?;
        }

        let labels = self.stage.visible_labels();
        if !labels.is_empty() {
            writeln!(f, "Labels:")?;
            for (material, text) in labels {
                writeln!(f, "  {:<10} {}", material, text)?;
            }
        }

        if let Some(board) = &self.board {
            if let Ok(board) = board.lock() {
                let active = board.active_steps();
                if !active.is_empty() {
                    writeln!(f, "Highlighted steps: {:?}", active)?;
                }
            }
        }

        Ok(())
    }
}

/// Run a fixed list of commands, then print the final state
pub fn run_script(session: &mut Session, script: &str) -> Result<()> {
    for token in script.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        match Command::parse(token) {
            Some(Command::Navigate(navigation)) => {
                session.navigate(navigation);
            }
            Some(Command::Status) => print!("{}", session),
            Some(Command::Help) => println!("{}", HELP),
            Some(Command::Quit) => break,
            None => anyhow::bail!("Unknown command in script: {}", token),
        }
    }
    print!("{}", session);
    Ok(())
}

/// Read commands from stdin until `quit` or end of input
pub async fn run_interactive(session: &mut Session) -> Result<()> {
    println!("{}", HELP);
    print!("{}", session);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match Command::parse(&line) {
            Some(Command::Navigate(navigation)) => {
                session.navigate(navigation);
                print!("{}", session);
            }
            Some(Command::Status) => print!("{}", session),
            Some(Command::Help) => println!("{}", HELP),
            Some(Command::Quit) => break,
            None => {
                warn!(input = %line.trim(), "Unknown command");
                println!("{}", HELP);
            }
        }
    }

    Ok(())
}
