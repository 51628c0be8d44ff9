//! The resumable execution loop.
//!
//! A run drives one task through up to [`MAX_ITERATIONS`] iterations. Each
//! iteration is an executor turn followed by a checker turn; the checker's
//! verdict decides whether the run succeeds, continues with feedback, or
//! stops. State is persisted immediately after every successful agent turn
//! and never mid-turn, so an interruption at any point resumes from the last
//! completed turn.
//!
//! Startup resolution and the loop itself are separated: [`resolve_start`]
//! performs the load/clear side effects and computes where to begin, and
//! [`run_task`] executes iterations from there. Both operate only through
//! the [`StateStore`] and [`AgentInvoker`] seams.

use crate::agent::{AgentInvoker, prompt};
use crate::error::Result;
use crate::report::ReportArtifact;
use crate::state::{RunStatus, StateStore};
use crate::verdict::{self, Verdict};
use chrono::{DateTime, Utc};

/// Fixed iteration budget per run.
pub const MAX_ITERATIONS: u32 = 10;

/// Where a resumed run left off, for operator display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumePoint {
    /// Iteration index recorded in the persisted state.
    pub iteration: u32,
    /// When that state was written.
    pub timestamp: DateTime<Utc>,
}

/// Startup decision: where the loop begins and what it carries forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartPlan {
    /// First iteration the loop will run.
    pub start_iteration: u32,

    /// Executor conversation handle carried from persisted state.
    pub executor_session: Option<String>,

    /// Checker output carried into the start iteration.
    pub checker_output: Option<String>,

    /// Saved `last_checker_output`, the fallback feedback seed.
    pub carried_feedback: Option<String>,

    /// The start iteration's executor turn already ran and was persisted;
    /// the loop goes straight to the checker for that iteration.
    pub executor_done: bool,

    /// Present when resuming from persisted state.
    pub resumed_from: Option<ResumePoint>,

    /// A stale completion report was deleted during startup.
    pub removed_stale_report: bool,
}

impl StartPlan {
    fn fresh(removed_stale_report: bool) -> Self {
        Self {
            start_iteration: 0,
            executor_session: None,
            checker_output: None,
            carried_feedback: None,
            executor_done: false,
            resumed_from: None,
            removed_stale_report,
        }
    }
}

/// Why a run stopped early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    /// The executor invocation failed.
    ExecutorFailed(String),
    /// The checker invocation failed.
    CheckerFailed(String),
    /// The checker's output matched neither verdict marker; carries the raw
    /// text for manual inspection.
    AmbiguousVerdict(String),
}

/// Terminal outcome of a run. Exactly one occurs per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The checker accepted; persisted state was cleared.
    Succeeded,
    /// The iteration budget ran out on a rejection; state retained.
    Exhausted {
        /// The final checker text, when one was produced this run.
        final_verdict: Option<String>,
    },
    /// The run stopped early; state retained as of the last persisted turn.
    Aborted { reason: AbortReason },
}

/// Progress notifications emitted while the loop runs.
///
/// Presentation is the caller's concern; the loop only reports what it is
/// doing and with which output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress<'a> {
    IterationStarted { iteration: u32 },
    ExecutorStarted { iteration: u32, feedback: bool },
    /// The start iteration's executor turn was already persisted; going
    /// straight to the checker.
    ExecutorSkipped { iteration: u32 },
    ExecutorFinished { iteration: u32, output: &'a str },
    CheckerStarted { iteration: u32 },
    CheckerFinished { iteration: u32, output: &'a str },
}

/// Execute the startup decision for a run.
///
/// With `force_restart` any existing state is discarded and a stale report
/// removed. Otherwise a persisted `InProgress` record determines the resume
/// point:
/// - checker output recorded → the next iteration, checker output cleared;
/// - executor turn only → the same iteration, executor turn skipped.
///
/// With no usable record the run starts fresh, also removing a stale report.
pub fn resolve_start(
    store: &StateStore,
    report: &ReportArtifact,
    task_name: &str,
    force_restart: bool,
) -> Result<StartPlan> {
    if force_restart {
        store.clear(task_name)?;
        let removed = report.remove_stale()?;
        return Ok(StartPlan::fresh(removed));
    }

    match store.load(task_name) {
        Some(state) if state.status == RunStatus::InProgress => {
            let resumed_from = Some(ResumePoint {
                iteration: state.iteration,
                timestamp: state.timestamp,
            });

            if state.checker_output.is_some() {
                // The checker already ran in the saved iteration; the next
                // iteration starts fresh and feeds back last_checker_output.
                Ok(StartPlan {
                    start_iteration: state.iteration + 1,
                    executor_session: state.executor_session,
                    checker_output: None,
                    carried_feedback: state.last_checker_output,
                    executor_done: false,
                    resumed_from,
                    removed_stale_report: false,
                })
            } else {
                // Only the executor turn was persisted; re-enter the same
                // iteration at the checker turn.
                Ok(StartPlan {
                    start_iteration: state.iteration,
                    executor_session: state.executor_session,
                    checker_output: state.checker_output,
                    carried_feedback: state.last_checker_output,
                    executor_done: true,
                    resumed_from,
                    removed_stale_report: false,
                })
            }
        }
        _ => {
            let removed = report.remove_stale()?;
            Ok(StartPlan::fresh(removed))
        }
    }
}

/// Run the execution loop for a task from a resolved start plan.
///
/// Returns the terminal outcome; `Err` is reserved for unexpected internal
/// failures (state persistence). Agent invocation failures and ambiguous
/// verdicts are outcomes, not errors.
pub fn run_task<I, F>(
    store: &StateStore,
    invoker: &I,
    task_name: &str,
    task_text: &str,
    report_path: &str,
    plan: StartPlan,
    mut progress: F,
) -> Result<RunOutcome>
where
    I: AgentInvoker,
    F: FnMut(Progress<'_>),
{
    let mut executor_session = plan.executor_session.clone();
    let mut checker_output = plan.checker_output.clone();
    let carried_feedback = plan.carried_feedback.clone();

    for iteration in plan.start_iteration..MAX_ITERATIONS {
        progress(Progress::IterationStarted { iteration });

        // =====================================================================
        // Executor turn
        // =====================================================================
        let executor_already_persisted = plan.executor_done && iteration == plan.start_iteration;
        if executor_already_persisted {
            progress(Progress::ExecutorSkipped { iteration });
        } else {
            let reply = if iteration == 0 {
                progress(Progress::ExecutorStarted {
                    iteration,
                    feedback: false,
                });
                match invoker.invoke(&prompt::initial_executor(task_text, report_path), None) {
                    Ok(reply) => {
                        executor_session = reply.session.clone();
                        reply
                    }
                    Err(e) => {
                        return Ok(RunOutcome::Aborted {
                            reason: AbortReason::ExecutorFailed(e.to_string()),
                        });
                    }
                }
            } else {
                let feedback_text = checker_output.clone().or_else(|| carried_feedback.clone());
                match feedback_text {
                    Some(feedback) => {
                        progress(Progress::ExecutorStarted {
                            iteration,
                            feedback: true,
                        });
                        // Continuation turns do not replace the stored handle.
                        match invoker
                            .invoke(&prompt::feedback(&feedback), executor_session.as_deref())
                        {
                            Ok(reply) => reply,
                            Err(e) => {
                                return Ok(RunOutcome::Aborted {
                                    reason: AbortReason::ExecutorFailed(e.to_string()),
                                });
                            }
                        }
                    }
                    None => {
                        // No feedback survived; start the conversation over.
                        progress(Progress::ExecutorStarted {
                            iteration,
                            feedback: false,
                        });
                        match invoker
                            .invoke(&prompt::initial_executor(task_text, report_path), None)
                        {
                            Ok(reply) => {
                                executor_session = reply.session.clone();
                                reply
                            }
                            Err(e) => {
                                return Ok(RunOutcome::Aborted {
                                    reason: AbortReason::ExecutorFailed(e.to_string()),
                                });
                            }
                        }
                    }
                }
            };

            progress(Progress::ExecutorFinished {
                iteration,
                output: &reply.text,
            });

            // Commit "executor ran" before the checker is invoked, so an
            // interruption here resumes at this iteration's checker turn.
            store.save(task_name, iteration, executor_session.as_deref(), None, None)?;
        }

        // =====================================================================
        // Checker turn
        // =====================================================================
        progress(Progress::CheckerStarted { iteration });
        let checker_reply = match invoker.invoke(&prompt::checker(task_text), None) {
            Ok(reply) => reply,
            Err(e) => {
                return Ok(RunOutcome::Aborted {
                    reason: AbortReason::CheckerFailed(e.to_string()),
                });
            }
        };
        progress(Progress::CheckerFinished {
            iteration,
            output: &checker_reply.text,
        });

        checker_output = Some(checker_reply.text);
        store.save(
            task_name,
            iteration,
            executor_session.as_deref(),
            checker_output.as_deref(),
            None,
        )?;

        // =====================================================================
        // Verdict
        // =====================================================================
        let verdict_text = checker_output.as_deref().unwrap_or_default();
        match verdict::classify(verdict_text) {
            Verdict::Accepted => {
                store.mark_completed(task_name)?;
                store.clear(task_name)?;
                return Ok(RunOutcome::Succeeded);
            }
            Verdict::Rejected => {
                if iteration == MAX_ITERATIONS - 1 {
                    return Ok(RunOutcome::Exhausted {
                        final_verdict: checker_output,
                    });
                }
                // Carry the rejection forward as the feedback seed for the
                // next iteration.
                store.save(
                    task_name,
                    iteration,
                    executor_session.as_deref(),
                    checker_output.as_deref(),
                    checker_output.as_deref(),
                )?;
            }
            Verdict::Ambiguous => {
                return Ok(RunOutcome::Aborted {
                    reason: AbortReason::AmbiguousVerdict(verdict_text.to_string()),
                });
            }
        }
    }

    // Start iteration at or past the budget: the run re-exhausts without
    // invoking any agent.
    Ok(RunOutcome::Exhausted {
        final_verdict: carried_feedback,
    })
}
