//! Interactive trip planning session

use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::debug;

use crate::trip::{TripOutcome, TripWorkflow};
use crate::weather::is_error_summary;

/// Render an outcome for the terminal: the question, or the reply plus a stop table
pub fn render_outcome(outcome: &TripOutcome) -> String {
    match outcome {
        TripOutcome::NeedInput { need } => format!("{}", need.yellow()),
        TripOutcome::Planned(plan) => {
            let mut out = String::new();
            out.push_str(&plan.reply);
            out.push_str("\n\n");
            out.push_str(&format!(
                "{}\n",
                format!("Stops ({} to {}):", plan.origin, plan.destination).bright_cyan()
            ));
            for (i, forecast) in plan.forecasts.iter().enumerate() {
                let summary = if is_error_summary(&forecast.summary) {
                    forecast.summary.red().to_string()
                } else {
                    forecast.summary.clone()
                };
                out.push_str(&format!(
                    "  {:>2}. {} ({:.4}, {:.4})\n      {}\n",
                    i + 1,
                    forecast.waypoint.name.bold(),
                    forecast.waypoint.lat,
                    forecast.waypoint.lon,
                    summary
                ));
            }
            out
        }
    }
}

/// Result of a slash command
#[derive(Debug, PartialEq, Eq)]
enum SlashResult {
    Continue,
    Quit,
}

/// REPL that plans one trip per line
///
/// Endpoints pinned with `/from` and `/to` are passed to every following run.
pub struct ChatSession {
    workflow: TripWorkflow,
    origin: Option<String>,
    destination: Option<String>,
}

impl ChatSession {
    pub fn new(workflow: TripWorkflow) -> Self {
        Self {
            workflow,
            origin: None,
            destination: None,
        }
    }

    /// Run the REPL main loop
    pub async fn run(&mut self) -> Result<()> {
        debug!("ChatSession::run: called");
        self.print_welcome();

        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

        loop {
            match rl.readline(&format!("{} ", ">".bright_green())) {
                Ok(line) => {
                    let input = line.trim();
                    if input.is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(input);

                    if input.starts_with('/') {
                        match self.handle_slash_command(input) {
                            SlashResult::Continue => continue,
                            SlashResult::Quit => break,
                        }
                    }

                    let outcome = self
                        .workflow
                        .run(input, self.origin.clone(), self.destination.clone())
                        .await;
                    println!("{}", render_outcome(&outcome));
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    break;
                }
                Err(err) => {
                    return Err(eyre::eyre!("Readline error: {}", err));
                }
            }
        }

        println!("Safe travels!");
        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", "Tripcast".bright_cyan().bold());
        println!("Describe a trip, e.g. \"from Chicago to Nashville\"");
        println!("Type {} for help, {} to quit", "/help".yellow(), "/quit".yellow());
        println!();
    }

    fn handle_slash_command(&mut self, input: &str) -> SlashResult {
        let (cmd, arg) = match input.split_once(char::is_whitespace) {
            Some((cmd, arg)) => (cmd, arg.trim()),
            None => (input, ""),
        };
        debug!(%cmd, %arg, "handle_slash_command: called");

        match cmd {
            "/help" | "/h" => {
                self.print_help();
                SlashResult::Continue
            }
            "/quit" | "/q" | "/exit" => SlashResult::Quit,
            "/from" => {
                self.origin = pin(arg, "origin", &self.origin);
                SlashResult::Continue
            }
            "/to" => {
                self.destination = pin(arg, "destination", &self.destination);
                SlashResult::Continue
            }
            "/reset" => {
                self.origin = None;
                self.destination = None;
                println!("{}", "Endpoints cleared.".dimmed());
                SlashResult::Continue
            }
            _ => {
                println!("{} Unknown command: {}", "?".yellow(), cmd);
                println!("Type {} for available commands", "/help".yellow());
                SlashResult::Continue
            }
        }
    }

    fn print_help(&self) {
        println!();
        println!("{}", "Available Commands:".bright_cyan());
        println!("  {:14} Show this help", "/help".yellow());
        println!("  {:14} Exit", "/quit".yellow());
        println!("  {:14} Pin the origin for following trips", "/from <place>".yellow());
        println!("  {:14} Pin the destination for following trips", "/to <place>".yellow());
        println!("  {:14} Clear pinned endpoints", "/reset".yellow());
        println!();
        match (&self.origin, &self.destination) {
            (None, None) => println!("{}", "No endpoints pinned.".dimmed()),
            (origin, destination) => println!(
                "Pinned: from {} to {}",
                origin.as_deref().unwrap_or("?"),
                destination.as_deref().unwrap_or("?")
            ),
        }
        println!();
    }
}

fn pin(arg: &str, what: &str, current: &Option<String>) -> Option<String> {
    if arg.is_empty() {
        match current {
            Some(place) => println!("Current {}: {}", what, place),
            None => println!("{}", format!("No {} pinned.", what).dimmed()),
        }
        return current.clone();
    }
    println!("{} {} set to {}", "✓".green(), what, arg);
    Some(arg.to_string())
}
