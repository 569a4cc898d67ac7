//! Hook registration inside Claude Code settings.
//!
//! The settings file stores hooks as
//! `hooks.<Event> = [{ "matcher": "", "hooks": [{ "type": "command", ... }] }]`.
//! This module owns exactly one class of entries in that structure: bindings
//! whose action runs the peon-ping hook script (or the scripts it replaced).
//! Everything else is carried through untouched and in its original order.

use crate::errors::{SettingsError, pointer_segment};
use crate::settings::{SettingsDocument, kind_of};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Lifecycle events Claude Code can run hooks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventName {
    SessionStart,
    UserPromptSubmit,
    Stop,
    Notification,
    PermissionRequest,
    PreToolUse,
    PostToolUse,
    SubagentStop,
    PreCompact,
    SessionEnd,
}

/// Events the installer registers its hook for.
///
/// Appending an event here is a compatible change: the next install adds it
/// and leaves the existing ones as they are.
pub const MANAGED_EVENTS: [EventName; 4] = [
    EventName::SessionStart,
    EventName::UserPromptSubmit,
    EventName::Stop,
    EventName::Notification,
];

/// Script names identifying the hook this tool installs and the ones it
/// supersedes (`notify.sh` is the hand-written predecessor).
pub const LEGACY_COMMAND_MATCHERS: [&str; 3] = ["notify.sh", "peon.sh", "peon.py"];

/// Script names that belong to peon-ping itself, removed on uninstall.
pub const OWN_COMMAND_MATCHERS: [&str; 2] = ["peon.sh", "peon.py"];

/// Timeout, in seconds, of the installed hook.
pub const DEFAULT_HOOK_TIMEOUT_SECS: u32 = 10;

impl EventName {
    pub const ALL: [EventName; 10] = [
        EventName::SessionStart,
        EventName::UserPromptSubmit,
        EventName::Stop,
        EventName::Notification,
        EventName::PermissionRequest,
        EventName::PreToolUse,
        EventName::PostToolUse,
        EventName::SubagentStop,
        EventName::PreCompact,
        EventName::SessionEnd,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventName::SessionStart => "SessionStart",
            EventName::UserPromptSubmit => "UserPromptSubmit",
            EventName::Stop => "Stop",
            EventName::Notification => "Notification",
            EventName::PermissionRequest => "PermissionRequest",
            EventName::PreToolUse => "PreToolUse",
            EventName::PostToolUse => "PostToolUse",
            EventName::SubagentStop => "SubagentStop",
            EventName::PreCompact => "PreCompact",
            EventName::SessionEnd => "SessionEnd",
        }
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventName::ALL
            .iter()
            .copied()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| format!("unknown hook event '{}'", s))
    }
}

/// A single hook command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookAction {
    #[serde(rename = "type")]
    pub kind: String,
    pub command: String,
    pub timeout: u32,
}

impl HookAction {
    pub fn command(command: impl Into<String>, timeout: u32) -> Self {
        Self {
            kind: "command".to_string(),
            command: command.into(),
            timeout,
        }
    }
}

/// A matcher plus the actions to run when it matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookBinding {
    pub matcher: String,
    pub hooks: Vec<HookAction>,
}

impl HookBinding {
    /// Catch-all binding running only `action`.
    pub fn canonical(action: HookAction) -> Self {
        Self {
            matcher: String::new(),
            hooks: vec![action],
        }
    }

    pub fn to_value(&self) -> Value {
        let mut hooks = Vec::with_capacity(self.hooks.len());
        for action in &self.hooks {
            let mut obj = Map::new();
            obj.insert("type".to_string(), Value::String(action.kind.clone()));
            obj.insert("command".to_string(), Value::String(action.command.clone()));
            obj.insert("timeout".to_string(), Value::from(action.timeout));
            hooks.push(Value::Object(obj));
        }
        let mut obj = Map::new();
        obj.insert("matcher".to_string(), Value::String(self.matcher.clone()));
        obj.insert("hooks".to_string(), Value::Array(hooks));
        Value::Object(obj)
    }
}

/// How a legacy matcher is compared against a hook command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// The command contains the matcher anywhere. Tolerates the script having
    /// been installed under a different home directory.
    #[default]
    Substring,
    /// Some whitespace-separated token of the command has a final path
    /// component equal to the matcher.
    FileName,
}

impl FromStr for MatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "substring" => Ok(MatchMode::Substring),
            "filename" | "file_name" => Ok(MatchMode::FileName),
            _ => Err(format!("unknown match mode '{}'", s)),
        }
    }
}

/// Set of command patterns recognising hook entries this tool manages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandMatchers {
    patterns: Vec<String>,
    mode: MatchMode,
}

impl CommandMatchers {
    pub fn new<I, S>(patterns: I, mode: MatchMode) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
            mode,
        }
    }

    /// Matchers for the current script and every script it supersedes.
    pub fn legacy(mode: MatchMode) -> Self {
        Self::new(LEGACY_COMMAND_MATCHERS, mode)
    }

    /// Matchers for peon-ping's own scripts only.
    pub fn own(mode: MatchMode) -> Self {
        Self::new(OWN_COMMAND_MATCHERS, mode)
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    pub fn matches(&self, command: &str) -> bool {
        self.patterns.iter().any(|p| match self.mode {
            MatchMode::Substring => command.contains(p.as_str()),
            MatchMode::FileName => command
                .split_whitespace()
                .map(|token| token.trim_matches(|c: char| c == '"' || c == '\''))
                .any(|token| file_name_of(token) == p.as_str()),
        })
    }
}

fn file_name_of(token: &str) -> &str {
    token.rsplit(['/', '\\']).next().unwrap_or(token)
}

/// Commands of every action in `binding`, validating the binding's shape.
///
/// A binding without a `hooks` key has no actions; an action without a
/// `command` contributes nothing.
fn binding_commands<'a>(binding: &'a Value, pointer: &str) -> Result<Vec<&'a str>, SettingsError> {
    let obj = binding.as_object().ok_or_else(|| {
        SettingsError::shape(pointer, format!("expected a hook binding object, found {}", kind_of(binding)))
    })?;

    let actions = match obj.get("hooks") {
        None => return Ok(Vec::new()),
        Some(Value::Array(actions)) => actions,
        Some(other) => {
            return Err(SettingsError::shape(
                format!("{}/hooks", pointer),
                format!("expected an array of hook actions, found {}", kind_of(other)),
            ));
        }
    };

    let mut commands = Vec::with_capacity(actions.len());
    for (idx, action) in actions.iter().enumerate() {
        let action_pointer = format!("{}/hooks/{}", pointer, idx);
        let action_obj = action.as_object().ok_or_else(|| {
            SettingsError::shape(
                &action_pointer,
                format!("expected a hook action object, found {}", kind_of(action)),
            )
        })?;
        match action_obj.get("command") {
            None => {}
            Some(Value::String(cmd)) => commands.push(cmd.as_str()),
            Some(other) => {
                return Err(SettingsError::shape(
                    format!("{}/command", action_pointer),
                    format!("expected a string, found {}", kind_of(other)),
                ));
            }
        }
    }
    Ok(commands)
}

fn event_pointer(event: &str) -> String {
    format!("/hooks/{}", pointer_segment(event))
}

fn bindings_of<'a>(value: &'a Value, pointer: &str) -> Result<&'a Vec<Value>, SettingsError> {
    value.as_array().ok_or_else(|| {
        SettingsError::shape(pointer, format!("expected an array of hook bindings, found {}", kind_of(value)))
    })
}

/// For each binding, whether any of its commands matches `matchers`.
fn matching_flags(bindings: &[Value], pointer: &str, matchers: &CommandMatchers) -> Result<Vec<bool>, SettingsError> {
    bindings
        .iter()
        .enumerate()
        .map(|(idx, binding)| {
            let commands = binding_commands(binding, &format!("{}/{}", pointer, idx))?;
            Ok(commands.iter().any(|cmd| matchers.matches(cmd)))
        })
        .collect()
}

fn retain_unflagged(bindings: &mut Vec<Value>, flags: Vec<bool>) {
    let mut flags = flags.into_iter();
    bindings.retain(|_| !flags.next().unwrap_or(false));
}

/// Register `action` exactly once on every event in `managed`.
///
/// Per event, bindings running a command recognised by `legacy` are dropped
/// and a catch-all binding for `action` is appended. Events outside
/// `managed` are neither read nor written. On error the input document is
/// consumed and nothing is returned, so callers never see a half-updated
/// document.
pub fn reconcile(
    mut doc: SettingsDocument,
    managed: &[EventName],
    action: &HookAction,
    legacy: &CommandMatchers,
) -> Result<SettingsDocument, SettingsError> {
    let canonical = HookBinding::canonical(action.clone()).to_value();
    let hooks = doc.hooks_mut()?;

    for event in managed {
        let name = event.as_str();
        let pointer = event_pointer(name);

        let slot = hooks
            .entry(name)
            .or_insert_with(|| Value::Array(Vec::new()));
        let flags = matching_flags(bindings_of(slot, &pointer)?, &pointer, legacy)?;
        let removed = flags.iter().filter(|stale| **stale).count();

        if let Some(bindings) = slot.as_array_mut() {
            retain_unflagged(bindings, flags);
            bindings.push(canonical.clone());
        }
        debug!("{}: replaced {} stale binding(s) with the canonical hook", name, removed);
    }

    Ok(doc)
}

/// Remove every binding running a command recognised by `matchers`, from
/// every event in the document.
///
/// Events emptied by the removal are dropped; events that were already empty
/// are left alone. Returns the updated document and the events that changed.
pub fn remove_bindings(
    mut doc: SettingsDocument,
    matchers: &CommandMatchers,
) -> Result<(SettingsDocument, Vec<String>), SettingsError> {
    let Some(existing) = doc.hooks()? else {
        return Ok((doc, Vec::new()));
    };

    let mut plan: Vec<(String, Vec<bool>)> = Vec::new();
    for (name, value) in existing {
        let pointer = event_pointer(name);
        let flags = matching_flags(bindings_of(value, &pointer)?, &pointer, matchers)?;
        if flags.iter().any(|f| *f) {
            plan.push((name.clone(), flags));
        }
    }

    let cleaned: Vec<String> = plan.iter().map(|(name, _)| name.clone()).collect();
    let hooks = doc.hooks_mut()?;
    for (name, flags) in plan {
        if let Some(bindings) = hooks.get_mut(&name).and_then(Value::as_array_mut) {
            retain_unflagged(bindings, flags);
        }
    }
    hooks.retain(|name, value| {
        !(cleaned.contains(name) && value.as_array().is_some_and(|b| b.is_empty()))
    });

    Ok((doc, cleaned))
}

/// Append a catch-all binding for `action` to each event in `events` that has
/// no binding recognised by `matchers` yet. Returns the events that gained a
/// binding.
pub fn register_missing(
    mut doc: SettingsDocument,
    events: &[EventName],
    action: &HookAction,
    matchers: &CommandMatchers,
) -> Result<(SettingsDocument, Vec<EventName>), SettingsError> {
    let binding = HookBinding::canonical(action.clone()).to_value();
    let hooks = doc.hooks_mut()?;
    let mut added = Vec::new();

    for event in events {
        let name = event.as_str();
        let pointer = event_pointer(name);
        let slot = hooks
            .entry(name)
            .or_insert_with(|| Value::Array(Vec::new()));
        let present = matching_flags(bindings_of(slot, &pointer)?, &pointer, matchers)?
            .into_iter()
            .any(|f| f);
        if !present && let Some(bindings) = slot.as_array_mut() {
            bindings.push(binding.clone());
            added.push(*event);
        }
    }

    Ok((doc, added))
}

/// Installation state of the peon-ping hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookStatus {
    /// Every managed event ends with the canonical binding and nothing stale remains.
    Installed,
    /// Some managed entries exist but are missing, duplicated or outdated.
    NeedsUpdate,
    /// No managed entries at all.
    NotInstalled,
}

impl fmt::Display for HookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookStatus::Installed => write!(f, "installed"),
            HookStatus::NeedsUpdate => write!(f, "needs update"),
            HookStatus::NotInstalled => write!(f, "not installed"),
        }
    }
}

/// Per-event view of the managed hook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventReport {
    pub event: EventName,
    /// Bindings exactly equal to the canonical one.
    pub canonical: usize,
    /// Whether the last binding is the canonical one.
    pub canonical_last: bool,
    /// Recognised bindings that are not canonical.
    pub stale: usize,
    /// Bindings this tool does not manage.
    pub other: usize,
}

impl EventReport {
    pub fn is_current(&self) -> bool {
        self.canonical == 1 && self.canonical_last && self.stale == 0
    }
}

/// Result of [`inspect`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HookReport {
    pub status: HookStatus,
    pub events: Vec<EventReport>,
}

/// Describe how the managed hook is registered, without changing anything.
pub fn inspect(
    doc: &SettingsDocument,
    managed: &[EventName],
    action: &HookAction,
    legacy: &CommandMatchers,
) -> Result<HookReport, SettingsError> {
    let canonical = HookBinding::canonical(action.clone()).to_value();
    let hooks = doc.hooks()?;
    let mut events = Vec::with_capacity(managed.len());

    for event in managed {
        let name = event.as_str();
        let pointer = event_pointer(name);
        let mut report = EventReport {
            event: *event,
            canonical: 0,
            canonical_last: false,
            stale: 0,
            other: 0,
        };

        if let Some(value) = hooks.and_then(|h| h.get(name)) {
            let bindings = bindings_of(value, &pointer)?;
            let flags = matching_flags(bindings, &pointer, legacy)?;
            for (binding, recognised) in bindings.iter().zip(flags) {
                if *binding == canonical {
                    report.canonical += 1;
                } else if recognised {
                    report.stale += 1;
                } else {
                    report.other += 1;
                }
            }
            report.canonical_last = bindings.last() == Some(&canonical);
        }
        events.push(report);
    }

    let status = if events.iter().all(EventReport::is_current) {
        HookStatus::Installed
    } else if events.iter().all(|e| e.canonical == 0 && e.stale == 0) {
        HookStatus::NotInstalled
    } else {
        HookStatus::NeedsUpdate
    };

    Ok(HookReport { status, events })
}
