//! Engine runtime
//!
//! The [`Engine`] owns everything that outlives a single script: the
//! command/expression/alias registries, the alias, list, and timer stores,
//! the single active script, and the cooperative execution state machine.
//! The host calls [`Engine::execute_script`] from its main loop; each call
//! runs at most one statement.

use std::rc::Rc;
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;
use tracing::{debug, info};

use crate::argument::Argument;
use crate::error::{Result, ScriptError};
use crate::script::Script;
use crate::value::Value;

/// Serial returned by [`Engine::get_alias`] when nothing answers to the
/// name.
pub const ALIAS_NONE: u32 = u32::MAX;

/// Side-effecting statement handler. Returning false stalls the cursor so
/// the next tick re-invokes the command.
pub type CommandHandler = Rc<dyn Fn(&mut Engine, &str, &[Argument], bool, bool) -> Result<bool>>;

/// Condition handler; returns a comparable value.
pub type ExpressionHandler = Rc<dyn Fn(&mut Engine, &str, &[Argument], bool) -> Result<Value>>;

/// Dynamic alias resolver.
pub type AliasHandler = Rc<dyn Fn(&str) -> u32>;

/// Decides the fate of a timed-out statement: true steps past it, false
/// stops the script.
pub type TimeoutHandler = Rc<dyn Fn(&mut Engine) -> bool>;

/// Cooperative execution states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionState {
    Running,
    Paused,
    TimingOut,
}

#[derive(Debug, Clone, Copy)]
struct Timer {
    stamped: Instant,
    offset_ms: i64,
}

impl Timer {
    fn elapsed_ms(&self) -> i64 {
        self.stamped.elapsed().as_millis() as i64 + self.offset_ms
    }
}

/// The scripting runtime. Single-threaded by contract; at most one script
/// is active at any time.
pub struct Engine {
    commands: FxHashMap<String, CommandHandler>,
    expressions: FxHashMap<String, ExpressionHandler>,
    alias_handlers: FxHashMap<String, AliasHandler>,
    aliases: FxHashMap<String, u32>,
    lists: FxHashMap<String, Vec<Argument>>,
    timers: FxHashMap<String, Timer>,
    active: Option<Script>,
    state: ExecutionState,
    deadline: Instant,
    on_timeout: Option<TimeoutHandler>,
    // The active script is moved out of `active` for the duration of a
    // tick; these track requests made by handlers during that window.
    in_tick: bool,
    stop_requested: bool,
}

impl Engine {
    pub fn new() -> Self {
        Self {
            commands: FxHashMap::default(),
            expressions: FxHashMap::default(),
            alias_handlers: FxHashMap::default(),
            aliases: FxHashMap::default(),
            lists: FxHashMap::default(),
            timers: FxHashMap::default(),
            active: None,
            state: ExecutionState::Running,
            deadline: Instant::now(),
            on_timeout: None,
            in_tick: false,
            stop_requested: false,
        }
    }

    // ---- Registration ----------------------------------------------------

    /// Register a command handler. Re-registering a name overwrites the
    /// previous binding.
    pub fn register_command<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(&mut Engine, &str, &[Argument], bool, bool) -> Result<bool> + 'static,
    {
        self.commands.insert(name.into(), Rc::new(handler));
    }

    /// Register an expression handler. Re-registering a name overwrites the
    /// previous binding.
    pub fn register_expression<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(&mut Engine, &str, &[Argument], bool) -> Result<Value> + 'static,
    {
        self.expressions.insert(name.into(), Rc::new(handler));
    }

    /// Register a dynamic alias resolver; it shadows any static alias of
    /// the same name.
    pub fn register_alias_handler<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(&str) -> u32 + 'static,
    {
        self.alias_handlers.insert(name.into(), Rc::new(handler));
    }

    pub fn unregister_alias_handler(&mut self, name: &str) {
        self.alias_handlers.remove(name);
    }

    pub(crate) fn command_handler(&self, name: &str) -> Option<CommandHandler> {
        self.commands.get(name).cloned()
    }

    pub(crate) fn expression_handler(&self, name: &str) -> Option<ExpressionHandler> {
        self.expressions.get(name).cloned()
    }

    // ---- Aliases ---------------------------------------------------------

    /// Resolve an alias: dynamic handlers first, then the static map, then
    /// the [`ALIAS_NONE`] sentinel.
    pub fn get_alias(&self, name: &str) -> u32 {
        if let Some(handler) = self.alias_handlers.get(name) {
            return handler(name);
        }
        self.aliases.get(name).copied().unwrap_or(ALIAS_NONE)
    }

    /// Bind a static alias. Only serials live here.
    pub fn set_alias(&mut self, name: impl Into<String>, serial: u32) {
        self.aliases.insert(name.into(), serial);
    }

    pub fn unset_alias(&mut self, name: &str) {
        self.aliases.remove(name);
    }

    // ---- Lists -----------------------------------------------------------

    fn list_missing(name: &str) -> ScriptError {
        ScriptError::detached(format!("list '{name}' does not exist"))
    }

    /// Create an empty list; an existing list of the same name is kept.
    pub fn create_list(&mut self, name: impl Into<String>) {
        self.lists.entry(name.into()).or_default();
    }

    pub fn destroy_list(&mut self, name: &str) {
        self.lists.remove(name);
    }

    pub fn clear_list(&mut self, name: &str) -> Result<()> {
        self.lists
            .get_mut(name)
            .ok_or_else(|| Self::list_missing(name))?
            .clear();
        Ok(())
    }

    pub fn list_exists(&self, name: &str) -> bool {
        self.lists.contains_key(name)
    }

    pub fn list_length(&self, name: &str) -> Result<usize> {
        Ok(self.lists.get(name).ok_or_else(|| Self::list_missing(name))?.len())
    }

    pub fn list_contains(&self, name: &str, value: &Argument) -> Result<bool> {
        Ok(self
            .lists
            .get(name)
            .ok_or_else(|| Self::list_missing(name))?
            .contains(value))
    }

    /// Append or prepend a value. A unique push is a no-op when an equal
    /// lexeme is already present.
    pub fn push_list(&mut self, name: &str, value: Argument, front: bool, unique: bool) -> Result<()> {
        let list = self.lists.get_mut(name).ok_or_else(|| Self::list_missing(name))?;
        if unique && list.contains(&value) {
            return Ok(());
        }
        if front {
            list.insert(0, value);
        } else {
            list.push(value);
        }
        Ok(())
    }

    /// Remove every entry equal to `value`; true when anything was removed.
    pub fn pop_list_value(&mut self, name: &str, value: &Argument) -> Result<bool> {
        let list = self.lists.get_mut(name).ok_or_else(|| Self::list_missing(name))?;
        let before = list.len();
        list.retain(|entry| entry != value);
        Ok(list.len() != before)
    }

    /// Remove and return the front or back entry.
    pub fn pop_list(&mut self, name: &str, front: bool) -> Result<Option<Argument>> {
        let list = self.lists.get_mut(name).ok_or_else(|| Self::list_missing(name))?;
        if front && !list.is_empty() {
            Ok(Some(list.remove(0)))
        } else if front {
            Ok(None)
        } else {
            Ok(list.pop())
        }
    }

    pub fn list_value(&self, name: &str, index: usize) -> Result<Option<Argument>> {
        Ok(self
            .lists
            .get(name)
            .ok_or_else(|| Self::list_missing(name))?
            .get(index)
            .cloned())
    }

    /// Iteration lookup used by foreach: a missing list reads as empty.
    pub(crate) fn list_element(&self, name: &str, index: usize) -> Option<Argument> {
        self.lists.get(name).and_then(|list| list.get(index)).cloned()
    }

    // ---- Timers ----------------------------------------------------------

    /// Start (or restart) a timer at zero elapsed.
    pub fn create_timer(&mut self, name: impl Into<String>) {
        self.timers.insert(
            name.into(),
            Timer {
                stamped: Instant::now(),
                offset_ms: 0,
            },
        );
    }

    /// Milliseconds since the timer was stamped.
    pub fn get_timer(&self, name: &str) -> Result<i64> {
        self.timers
            .get(name)
            .map(Timer::elapsed_ms)
            .ok_or_else(|| ScriptError::detached(format!("timer '{name}' does not exist")))
    }

    /// Re-stamp so the timer reads `ms` elapsed right now. Negative values
    /// put the timer in the future. Always succeeds.
    pub fn set_timer(&mut self, name: impl Into<String>, ms: i64) {
        self.timers.insert(
            name.into(),
            Timer {
                stamped: Instant::now(),
                offset_ms: ms,
            },
        );
    }

    pub fn remove_timer(&mut self, name: &str) {
        self.timers.remove(name);
    }

    pub fn timer_exists(&self, name: &str) -> bool {
        self.timers.contains_key(name)
    }

    // ---- Execution state machine ----------------------------------------

    pub fn execution_state(&self) -> ExecutionState {
        self.state
    }

    /// Suspend execution for `ms`. Ignored unless currently running.
    pub fn pause(&mut self, ms: u64) {
        if self.state == ExecutionState::Running {
            debug!(ms, "pausing");
            self.state = ExecutionState::Paused;
            self.deadline = Instant::now() + Duration::from_millis(ms);
        }
    }

    /// Resume a paused engine early.
    pub fn unpause(&mut self) {
        if self.state == ExecutionState::Paused {
            self.state = ExecutionState::Running;
        }
    }

    /// Give the current statement `ms` to finish; when the deadline passes,
    /// `handler` decides whether to step past it or stop the script.
    /// Ignored unless currently running.
    pub fn timeout<F>(&mut self, ms: u64, handler: F)
    where
        F: Fn(&mut Engine) -> bool + 'static,
    {
        if self.state == ExecutionState::Running {
            debug!(ms, "arming timeout");
            self.state = ExecutionState::TimingOut;
            self.deadline = Instant::now() + Duration::from_millis(ms);
            self.on_timeout = Some(Rc::new(handler));
        }
    }

    /// Disarm a pending timeout. Idempotent; also invoked implicitly every
    /// time the cursor advances one statement.
    pub fn clear_timeout(&mut self) {
        if self.state == ExecutionState::TimingOut {
            self.state = ExecutionState::Running;
            self.on_timeout = None;
        }
    }

    fn reset_execution(&mut self) {
        self.state = ExecutionState::Running;
        self.on_timeout = None;
    }

    // ---- Driver ----------------------------------------------------------

    /// True while a script is installed, including the one currently inside
    /// a tick.
    pub fn has_active_script(&self) -> bool {
        self.active.is_some() || self.in_tick
    }

    /// Install `script` as the active script and run its first tick.
    /// Returns false (without touching the script) when one is already
    /// active.
    pub fn start_script(&mut self, script: Script) -> Result<bool> {
        if self.has_active_script() {
            return Ok(false);
        }
        info!("starting script");
        self.reset_execution();
        self.active = Some(script);
        self.execute_script()?;
        Ok(true)
    }

    /// Discard the active script and reset the execution state. Safe to
    /// call from inside a command handler.
    pub fn stop_script(&mut self) {
        if self.has_active_script() {
            info!("stopping script");
        }
        self.active = None;
        if self.in_tick {
            self.stop_requested = true;
        }
        self.reset_execution();
    }

    /// One tick: honor the pause/timeout state, then execute at most one
    /// statement. Returns true while a script is still active. Errors
    /// abort the script; aliases, lists, and timers survive.
    pub fn execute_script(&mut self) -> Result<bool> {
        if self.active.is_none() {
            return Ok(false);
        }

        let now = Instant::now();
        match self.state {
            ExecutionState::Running => {}
            ExecutionState::Paused => {
                if now < self.deadline {
                    return Ok(true);
                }
                debug!("pause elapsed");
                self.state = ExecutionState::Running;
            }
            ExecutionState::TimingOut => {
                // Before the deadline the statement keeps re-executing so a
                // stalled handler can retry; afterwards the callback picks
                // the outcome.
                if now >= self.deadline {
                    debug!("timeout elapsed");
                    match self.on_timeout.take() {
                        Some(handler) => {
                            if handler(&mut *self) {
                                if let Some(script) = self.active.as_mut() {
                                    script.advance_cursor();
                                }
                                self.state = ExecutionState::Running;
                            } else {
                                self.stop_script();
                                return Ok(false);
                            }
                        }
                        None => {
                            self.stop_script();
                            return Ok(false);
                        }
                    }
                    if self.active.is_none() {
                        return Ok(false);
                    }
                }
            }
        }

        let Some(mut script) = self.active.take() else {
            return Ok(false);
        };

        self.in_tick = true;
        let step = script.execute_next(self);
        self.in_tick = false;

        match step {
            Ok(alive) => {
                if self.stop_requested {
                    self.stop_requested = false;
                    return Ok(false);
                }
                if alive {
                    self.active = Some(script);
                    Ok(true)
                } else {
                    info!("script finished");
                    self.reset_execution();
                    Ok(false)
                }
            }
            Err(error) => {
                // The failing script is dropped; stores stay intact.
                self.stop_requested = false;
                self.reset_execution();
                Err(error)
            }
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("state", &self.state)
            .field("commands", &self.commands.len())
            .field("expressions", &self.expressions.len())
            .field("aliases", &self.aliases.len())
            .field("lists", &self.lists.len())
            .field("timers", &self.timers.len())
            .field("active", &self.active.is_some())
            .finish()
    }
}
