//! The `tandem <task>` driver.
//!
//! Wires the execution loop to the real collaborators: config, workspace
//! layout, state store, CLI invoker, audit log, and console output. All
//! loop-level failures are reported here and still exit 0; only startup
//! errors (missing task, bad config) propagate as process errors.

use crate::agent::CliInvoker;
use crate::config::Config;
use crate::context::Workspace;
use crate::error::{Result, TandemError};
use crate::events::{Event, EventAction, append_event};
use crate::exit_codes;
use crate::report::ReportArtifact;
use crate::state::StateStore;
use crate::task;
use crate::workflow::{self, AbortReason, Progress, RunOutcome};
use serde_json::json;
use std::cell::Cell;

/// Execute the run command.
pub fn execute(task_name: &str, restart: bool) -> Result<()> {
    task::validate_task_name(task_name)?;

    let root = std::env::current_dir().map_err(|e| {
        TandemError::UserError(format!("failed to get current working directory: {}", e))
    })?;
    let config = Config::load_or_default(&root)?;
    let ws = Workspace::resolve_from(&root, &config);

    let task_text = task::read_task(&ws, task_name)?;

    print_banner(task_name);

    // State is already durable after every persisted turn; an interrupt just
    // needs a clean exit and a pointer at how to resume.
    ctrlc::set_handler(|| {
        println!();
        println!("Interrupted. Saved state is preserved; rerun to resume.");
        std::process::exit(exit_codes::SUCCESS);
    })
    .map_err(|e| {
        TandemError::UserError(format!("failed to install interrupt handler: {}", e))
    })?;

    let store = StateStore::new(&ws.state_dir);
    let report = ReportArtifact::new(&ws);
    let plan = workflow::resolve_start(&store, &report, task_name, restart)?;

    if restart {
        println!("Forced restart: saved state discarded.");
    }
    match &plan.resumed_from {
        Some(point) => {
            println!("Found saved state (last activity {}).", point.timestamp);
            println!(
                "Resuming at iteration {}/{}.",
                plan.start_iteration + 1,
                workflow::MAX_ITERATIONS
            );
            log_event(
                &ws,
                Event::new(EventAction::Resumed, task_name)
                    .with_details(json!({ "iteration": plan.start_iteration })),
            );
        }
        None => {
            println!("Starting a fresh run.");
            log_event(
                &ws,
                Event::new(EventAction::Started, task_name)
                    .with_details(json!({ "restart": restart })),
            );
        }
    }
    if plan.removed_stale_report {
        println!("Removed stale execution report.");
    }

    let invoker = CliInvoker::from_config(&config.agent, &ws)?;
    let report_path = report.path().display().to_string();

    let last_iteration = Cell::new(plan.start_iteration);
    let outcome = workflow::run_task(
        &store,
        &invoker,
        task_name,
        &task_text,
        &report_path,
        plan,
        |progress| {
            report_progress(&ws, task_name, &last_iteration, progress);
        },
    )?;

    report_outcome(&ws, task_name, last_iteration.get(), &outcome);
    Ok(())
}

fn print_banner(task_name: &str) {
    println!("{}", "=".repeat(60));
    println!("tandem: executor/checker loop");
    println!("{}", "=".repeat(60));
    println!("Task: {}", task_name);
    println!("Max iterations: {}", workflow::MAX_ITERATIONS);
}

/// Print loop progress and mirror turn completions into the audit log.
fn report_progress(
    ws: &Workspace,
    task_name: &str,
    last_iteration: &Cell<u32>,
    progress: Progress<'_>,
) {
    match progress {
        Progress::IterationStarted { iteration } => {
            last_iteration.set(iteration);
            println!();
            println!("{}", "-".repeat(60));
            println!(
                "Iteration {}/{}",
                iteration + 1,
                workflow::MAX_ITERATIONS
            );
            println!("{}", "-".repeat(60));
        }
        Progress::ExecutorStarted { feedback, .. } => {
            if feedback {
                println!("Executor: applying checker feedback...");
            } else {
                println!("Executor: starting on the task...");
            }
        }
        Progress::ExecutorSkipped { .. } => {
            println!("Executor turn already persisted; going straight to the checker.");
        }
        Progress::ExecutorFinished { iteration, output } => {
            println!("{}", output);
            println!("Executor turn complete.");
            log_event(
                ws,
                Event::new(EventAction::ExecutorTurn, task_name)
                    .with_details(json!({ "iteration": iteration })),
            );
        }
        Progress::CheckerStarted { .. } => {
            println!("Checker: reviewing the result...");
        }
        Progress::CheckerFinished { iteration, output } => {
            println!("{}", output);
            println!("Checker turn complete.");
            log_event(
                ws,
                Event::new(EventAction::CheckerTurn, task_name)
                    .with_details(json!({ "iteration": iteration })),
            );
        }
    }
}

/// Print the terminal outcome and record it in the audit log.
fn report_outcome(ws: &Workspace, task_name: &str, iteration: u32, outcome: &RunOutcome) {
    println!();
    match outcome {
        RunOutcome::Succeeded => {
            println!("SUCCESS: the checker confirmed all acceptance criteria.");
            println!("Saved state cleared.");
            log_event(
                ws,
                Event::new(EventAction::Completed, task_name)
                    .with_details(json!({ "iteration": iteration })),
            );
        }
        RunOutcome::Exhausted { final_verdict } => {
            println!(
                "Iteration budget ({}) exhausted without acceptance.",
                workflow::MAX_ITERATIONS
            );
            if let Some(text) = final_verdict {
                println!("Final checker verdict:");
                println!("{}", text);
            }
            println!("Saved state kept; refine the task or split it, then rerun.");
            log_event(
                ws,
                Event::new(EventAction::Exhausted, task_name)
                    .with_details(json!({ "iteration": iteration })),
            );
        }
        RunOutcome::Aborted { reason } => {
            let detail = match reason {
                AbortReason::ExecutorFailed(msg) => {
                    println!("ERROR: executor invocation failed: {}", msg);
                    println!("Check that the agent CLI is installed and reachable.");
                    json!({ "iteration": iteration, "reason": "executor_failed" })
                }
                AbortReason::CheckerFailed(msg) => {
                    println!("ERROR: checker invocation failed: {}", msg);
                    println!("Check that the agent CLI is installed and reachable.");
                    json!({ "iteration": iteration, "reason": "checker_failed" })
                }
                AbortReason::AmbiguousVerdict(text) => {
                    println!("Unexpected checker response (no verdict marker):");
                    println!("{}", text);
                    println!("Inspect the response and rerun, or restart with --restart.");
                    json!({ "iteration": iteration, "reason": "ambiguous_verdict" })
                }
            };
            println!("Saved state kept; rerun to resume.");
            log_event(
                ws,
                Event::new(EventAction::Aborted, task_name).with_details(detail),
            );
        }
    }
}

/// Append an audit event, downgrading failures to a warning: the audit log
/// must never take down a run that is otherwise making progress.
fn log_event(ws: &Workspace, event: Event) {
    if let Err(e) = append_event(ws, &event) {
        eprintln!("Warning: failed to record audit event: {}", e);
    }
}
