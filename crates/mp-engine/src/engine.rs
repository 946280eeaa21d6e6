//! Execution engine
//!
//! A small stack interpreter. The engine walks the document one command at a
//! time, keeps loops and block calls on the context's stack, hands physical
//! actions to the [`ActionExecutor`] and routes recoverable faults through the
//! run's error-reaction table.

use crate::collaborators::{
    ActionError, ActionExecutor, ElementLocator, LocateError, SearchOptions,
};
use crate::context::{ExecutionContext, Frame};
use crate::error::{EngineError, EngineResult, Fault};
use mp_config::{seconds, PlayerSettings};
use mp_core::{render_value, Click, CommandKind, DataSourceProvider, MouseButton, Reaction};
use mp_script::matching_end;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

/// Engine lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    Idle,
    Running,
    /// Ended by a `Stop` command or a stop request
    Stopped,
    /// Ended by a fatal error or an unhandled fault
    Errored,
    /// Ran off the end of the script
    Completed,
}

impl EngineState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EngineState::Stopped | EngineState::Errored | EngineState::Completed
        )
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EngineState::Idle => "idle",
            EngineState::Running => "running",
            EngineState::Stopped => "stopped",
            EngineState::Errored => "errored",
            EngineState::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// Outcome of a single [`Engine::step`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// A command ran; the engine is ready for the next step
    Executed { index: usize },
    /// A `Stop` command ended the run
    Stopped { index: usize },
    /// No command left under the pointer
    Finished,
}

/// Playback options
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineOptions {
    /// Pause after every executed command
    pub command_pause: Duration,
    /// Passed to the locator for every confirmed click
    pub search: SearchOptions,
    /// Confirm click elements before clicking
    pub confirm_element: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            command_pause: Duration::from_millis(500),
            search: SearchOptions::default(),
            confirm_element: true,
        }
    }
}

/// Where the pointer goes after a command
enum Flow {
    Next,
    Jump(usize),
    Stop,
}

/// Script execution engine
pub struct Engine {
    executor: Arc<dyn ActionExecutor>,
    locator: Arc<dyn ElementLocator>,
    source: Arc<dyn DataSourceProvider>,
    options: EngineOptions,
    state: EngineState,
    status_tx: watch::Sender<EngineState>,
    /// Fault that ended the last run, if any
    fault: Option<Fault>,
}

impl Engine {
    /// Create an idle engine with default options
    pub fn new(
        executor: Arc<dyn ActionExecutor>,
        locator: Arc<dyn ElementLocator>,
        source: Arc<dyn DataSourceProvider>,
    ) -> Self {
        let (status_tx, _) = watch::channel(EngineState::Idle);
        Self {
            executor,
            locator,
            source,
            options: EngineOptions::default(),
            state: EngineState::Idle,
            status_tx,
            fault: None,
        }
    }

    /// Set playback options; not allowed while a run is in progress
    pub fn configure(
        &mut self,
        command_pause: f64,
        search_attempts: u32,
        full_screen_search: bool,
        confirm_element: bool,
    ) -> EngineResult<()> {
        if self.state == EngineState::Running {
            return Err(EngineError::AlreadyRunning);
        }
        self.options.command_pause = seconds("command_pause", command_pause)?;
        self.options.search.attempts = search_attempts;
        self.options.search.full_screen = full_screen_search;
        self.options.confirm_element = confirm_element;
        Ok(())
    }

    /// Take every option from loaded player settings
    pub fn apply_settings(&mut self, settings: &PlayerSettings) -> EngineResult<()> {
        self.configure(
            settings.command_pause,
            settings.search_attempts,
            settings.full_screen_search,
            settings.confirm_element,
        )?;
        self.options.search.backoff = settings.search_backoff_duration()?;
        Ok(())
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn status(&self) -> EngineState {
        self.state
    }

    /// Watch state changes
    pub fn subscribe(&self) -> watch::Receiver<EngineState> {
        self.status_tx.subscribe()
    }

    /// Fault that ended the last run, if it ended on one
    pub fn fault(&self) -> Option<&Fault> {
        self.fault.as_ref()
    }

    fn set_state(&mut self, state: EngineState) {
        if self.state != state {
            debug!("Engine {} -> {}", self.state, state);
            self.state = state;
            self.status_tx.send_replace(state);
        }
    }

    /// Begin a run
    ///
    /// The pointer is kept when it sits on a command, so a run can start
    /// from the middle of a script; otherwise it goes back before the first
    /// command. Stack, cursors and reactions start fresh.
    pub fn start(&mut self, ctx: &mut ExecutionContext) -> EngineResult<()> {
        if self.state == EngineState::Running {
            return Err(EngineError::AlreadyRunning);
        }

        ctx.reset();
        if !matches!(ctx.pointer, Some(p) if p < ctx.document.len()) {
            ctx.pointer = None;
        }
        self.fault = None;

        info!(
            commands = ctx.document.len(),
            pointer = ?ctx.pointer,
            "Starting script"
        );
        self.set_state(EngineState::Running);
        Ok(())
    }

    /// Request the run to end; takes effect between steps
    pub fn stop(&mut self) -> EngineResult<()> {
        if self.state != EngineState::Running {
            return Err(EngineError::NotRunning);
        }
        info!("Script stopped by request");
        self.set_state(EngineState::Stopped);
        Ok(())
    }

    /// Back to idle after a finished run
    pub fn reset(&mut self) -> EngineResult<()> {
        if self.state == EngineState::Running {
            return Err(EngineError::AlreadyRunning);
        }
        self.set_state(EngineState::Idle);
        Ok(())
    }

    /// Execute the command under the pointer
    pub async fn step(&mut self, ctx: &mut ExecutionContext) -> EngineResult<Step> {
        if self.state != EngineState::Running {
            return Err(EngineError::NotRunning);
        }

        let index = ctx.pointer.unwrap_or(0);
        ctx.pointer = Some(index);

        let kind = match ctx.document.command_at(index) {
            Some((_, command)) => command.kind.clone(),
            None => {
                info!(pointer = index, "No more commands");
                self.set_state(EngineState::Completed);
                return Ok(Step::Finished);
            }
        };

        trace!(pointer = index, kind = kind.kind_id(), "Executing {}", kind);

        let flow = match self.execute(ctx, index, &kind).await {
            Ok(flow) => flow,
            Err(EngineError::Fault { index, fault }) => {
                match self.react(ctx, index, fault) {
                    Ok(flow) => flow,
                    Err(e) => return Err(self.fail(e)),
                }
            }
            Err(e) => return Err(self.fail(e)),
        };

        match flow {
            Flow::Next => ctx.pointer = Some(index + 1),
            Flow::Jump(target) => ctx.pointer = Some(target),
            Flow::Stop => {
                info!(pointer = index, "Stop command reached");
                self.set_state(EngineState::Stopped);
                return Ok(Step::Stopped { index });
            }
        }

        if !self.options.command_pause.is_zero() {
            tokio::time::sleep(self.options.command_pause).await;
        }
        Ok(Step::Executed { index })
    }

    /// Step until the run ends
    pub async fn run(&mut self, ctx: &mut ExecutionContext) -> EngineResult<EngineState> {
        self.start(ctx)?;
        while self.state == EngineState::Running {
            self.step(ctx).await?;
        }
        Ok(self.state)
    }

    fn fail(&mut self, err: EngineError) -> EngineError {
        warn!("Script failed: {}", err);
        if let EngineError::Fault { fault, .. } = &err {
            self.fault = Some(fault.clone());
        }
        self.set_state(EngineState::Errored);
        err
    }

    // --- Dispatch ---

    async fn execute(
        &self,
        ctx: &mut ExecutionContext,
        index: usize,
        kind: &CommandKind,
    ) -> EngineResult<Flow> {
        let fault = |fault: Fault| EngineError::Fault { index, fault };
        let action = |source: ActionError| EngineError::ActionFailed { index, source };

        match kind {
            CommandKind::ClickLeft(click) => {
                self.click(index, click, MouseButton::Left, 1).await?;
            }
            CommandKind::ClickRight(click) => {
                self.click(index, click, MouseButton::Right, 1).await?;
            }
            CommandKind::ClickDouble(click) => {
                self.click(index, click, MouseButton::Left, 2).await?;
            }
            CommandKind::KeyDown(key) => self.executor.key_down(*key).await.map_err(action)?,
            CommandKind::KeyUp(key) => self.executor.key_up(*key).await.map_err(action)?,
            CommandKind::WriteText(text) => {
                self.executor.write_text(text).await.map_err(action)?
            }
            CommandKind::Pause(secs) => {
                tokio::time::sleep(Duration::from_secs(*secs)).await;
            }
            CommandKind::Run(name) => return self.enter(ctx, index, name),
            CommandKind::ErrorReaction { error, reaction } => {
                debug!(error = %error, reaction = %reaction, "Error reaction changed");
                ctx.reactions.set(*error, reaction.clone());
            }
            CommandKind::WriteFieldValue(field) => {
                let values = self.values(field).map_err(fault)?;
                let value = ctx.cursor.peek(field, values).map_err(fault)?;
                let text = render_value(value);
                self.executor.write_text(&text).await.map_err(action)?;
            }
            CommandKind::NextElementField(field) => {
                let len = self.values(field).map_err(fault)?.len();
                let position = ctx.cursor.advance(field, len).map_err(fault)?;
                trace!(field = field.as_str(), position, "Field cursor advanced");
            }
            CommandKind::CycleOverField(field) => {
                let len = self.values(field).map_err(fault)?.len();
                if !ctx.cursor.has_more(field, len) {
                    return skip(ctx, index);
                }
                ctx.stack.push(Frame::LoopField {
                    ret: index,
                    field: field.clone(),
                });
            }
            CommandKind::Cycle(0) => return skip(ctx, index),
            CommandKind::Cycle(count) => ctx.stack.push(Frame::LoopCount {
                ret: index,
                remaining: *count,
            }),
            CommandKind::CycleEnd => return self.end_cycle(ctx, index),
            // Blocks only run when called
            CommandKind::Block(_) => return skip(ctx, index),
            CommandKind::BlockEnd => match ctx.stack.last() {
                Some(Frame::Call { ret }) => {
                    let ret = *ret;
                    ctx.stack.pop();
                    return Ok(Flow::Jump(ret + 1));
                }
                _ => return Err(EngineError::UnbalancedEnd { index }),
            },
            CommandKind::Label(_) => {}
            CommandKind::Stop => return Ok(Flow::Stop),
        }
        Ok(Flow::Next)
    }

    async fn click(
        &self,
        index: usize,
        click: &Click,
        button: MouseButton,
        clicks: u8,
    ) -> EngineResult<()> {
        let mut at = click.point();

        if let (Some(element), true) = (&click.element, self.options.confirm_element) {
            at = self
                .locator
                .confirm_or_locate(element, at, &self.options.search)
                .await
                .map_err(|e| {
                    let fault = match e {
                        LocateError::ElementNotFound(element) => Fault::ElementNotFound { element },
                        LocateError::TemplateNotFound(element) => {
                            Fault::TemplateNotFound { element }
                        }
                    };
                    EngineError::Fault { index, fault }
                })?;
        }

        self.executor
            .move_and_click(at, button, clicks)
            .await
            .map_err(|source| EngineError::ActionFailed { index, source })
    }

    fn values(&self, field: &str) -> Result<&[serde_json::Value], Fault> {
        self.source
            .values_for(field)
            .ok_or_else(|| Fault::UnknownField {
                field: field.to_string(),
            })
    }

    /// Call a block or a label
    ///
    /// Either way a call frame is pushed; a `BlockEnd` reached later returns
    /// to the command after `index`.
    fn enter(&self, ctx: &mut ExecutionContext, index: usize, name: &str) -> EngineResult<Flow> {
        let target = ctx
            .document
            .resolve_label(name)
            .ok_or_else(|| EngineError::UnknownTarget {
                index,
                name: name.to_string(),
            })?;

        ctx.stack.push(Frame::Call { ret: index });
        debug!(pointer = index, target = name, depth = ctx.stack.len(), "Calling");
        Ok(Flow::Jump(target + 1))
    }

    fn end_cycle(&self, ctx: &mut ExecutionContext, index: usize) -> EngineResult<Flow> {
        let again = match ctx.stack.last_mut() {
            Some(Frame::LoopCount { ret, remaining }) => {
                *remaining = remaining.saturating_sub(1);
                (*remaining > 0).then_some(*ret)
            }
            Some(Frame::LoopField { ret, field }) => {
                let len = self.source.values_for(field).map_or(0, <[_]>::len);
                ctx.cursor.has_more(field, len).then_some(*ret)
            }
            _ => return Err(EngineError::UnbalancedEnd { index }),
        };

        match again {
            Some(ret) => Ok(Flow::Jump(ret + 1)),
            None => {
                ctx.stack.pop();
                Ok(Flow::Next)
            }
        }
    }

    /// Apply the reaction configured for a fault
    fn react(&self, ctx: &mut ExecutionContext, index: usize, fault: Fault) -> EngineResult<Flow> {
        let reaction = ctx.reactions.get(fault.kind());
        debug!(pointer = index, kind = %fault.kind(), reaction = %reaction, "{}", fault);

        match reaction {
            Reaction::Stop => Err(EngineError::Fault { index, fault }),
            Reaction::Ignore => {
                warn!(pointer = index, "Ignoring: {}", fault);
                Ok(Flow::Next)
            }
            Reaction::GotoLabel(name) | Reaction::RunBlock(name) => self.enter(ctx, index, &name),
        }
    }
}

/// Jump past the end marker that closes the region opened at `index`
fn skip(ctx: &ExecutionContext, index: usize) -> EngineResult<Flow> {
    matching_end(&ctx.document, index)
        .map(|end| Flow::Jump(end + 1))
        .ok_or(EngineError::Unclosed { index })
}
