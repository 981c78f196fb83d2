//! Console variables.
//!
//! Provides:
//! - Typed console variables (cvars) with defaults and flags
//! - `set`, `toggle`, `reset`, `cvarlist` and bare-name queries
//! - Command history
//!
//! Gameplay code never reads cvars directly; it takes a per-frame snapshot.

use std::collections::BTreeMap;

use anyhow::{bail, Context};

/// Console variable value.
#[derive(Debug, Clone, PartialEq)]
pub enum CvarValue {
    Int(i64),
    Float(f64),
    String(String),
    Bool(bool),
}

impl CvarValue {
    pub fn as_bool(&self) -> bool {
        match self {
            CvarValue::Bool(v) => *v,
            CvarValue::Int(v) => *v != 0,
            CvarValue::Float(v) => *v != 0.0,
            CvarValue::String(s) => !s.is_empty() && s != "0" && !s.eq_ignore_ascii_case("false"),
        }
    }

    /// Parses user input into a value of the same kind as `self`.
    fn parse_like(&self, input: &str) -> anyhow::Result<CvarValue> {
        Ok(match self {
            CvarValue::Int(_) => CvarValue::Int(input.parse().context("expected an integer")?),
            CvarValue::Float(_) => CvarValue::Float(input.parse().context("expected a number")?),
            CvarValue::Bool(_) => match input {
                "1" | "true" | "on" => CvarValue::Bool(true),
                "0" | "false" | "off" => CvarValue::Bool(false),
                other => bail!("expected a boolean, got '{other}'"),
            },
            CvarValue::String(_) => CvarValue::String(input.trim_matches('"').to_string()),
        })
    }
}

impl std::fmt::Display for CvarValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CvarValue::Int(v) => write!(f, "{}", v),
            CvarValue::Float(v) => write!(f, "{}", v),
            CvarValue::String(v) => write!(f, "\"{}\"", v),
            CvarValue::Bool(v) => write!(f, "{}", v),
        }
    }
}

bitflags::bitflags! {
    /// Cvar flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CvarFlags: u32 {
        const NONE = 0;
        const ARCHIVE = 1 << 0;   // Saved with user settings
        const DEBUG = 1 << 1;     // Diagnostic overlay toggles
        const READ_ONLY = 1 << 2; // Not settable from the console
    }
}

/// Console variable metadata.
#[derive(Debug, Clone)]
pub struct Cvar {
    pub value: CvarValue,
    pub default: CvarValue,
    pub description: String,
    pub flags: CvarFlags,
}

/// The console.
#[derive(Debug, Default)]
pub struct Console {
    cvars: BTreeMap<String, Cvar>,
    history: Vec<String>,
}

const MAX_HISTORY: usize = 100;

impl Console {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a console variable. Re-registering keeps the current value.
    pub fn register_cvar(&mut self, name: &str, default: CvarValue, description: &str, flags: CvarFlags) {
        self.cvars.entry(name.to_string()).or_insert(Cvar {
            value: default.clone(),
            default,
            description: description.to_string(),
            flags,
        });
    }

    /// Executes a console line and returns the lines to print.
    pub fn exec(&mut self, line: &str) -> anyhow::Result<Vec<String>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with("//") {
            return Ok(Vec::new());
        }

        self.history.push(line.to_string());
        if self.history.len() > MAX_HISTORY {
            self.history.remove(0);
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            ["cvarlist"] => Ok(self
                .cvars
                .iter()
                .map(|(name, cvar)| {
                    format!("  {} = {} (default: {}) - {}", name, cvar.value, cvar.default, cvar.description)
                })
                .collect()),
            ["set", name, value @ ..] if !value.is_empty() => {
                self.set_from_str(name, &value.join(" "))?;
                Ok(vec![format!("{} = {}", name, self.cvars[*name].value)])
            }
            ["toggle", name] => {
                let cvar = self.writable(name)?;
                let CvarValue::Bool(on) = cvar.value else {
                    bail!("{name} is not a boolean");
                };
                cvar.value = CvarValue::Bool(!on);
                Ok(vec![format!("{} = {}", name, cvar.value)])
            }
            ["reset", name] => {
                let cvar = self.writable(name)?;
                cvar.value = cvar.default.clone();
                Ok(vec![format!("{} = {}", name, cvar.value)])
            }
            [name] if self.cvars.contains_key(*name) => {
                let cvar = &self.cvars[*name];
                Ok(vec![format!("{} = {} (default: {})", name, cvar.value, cvar.default)])
            }
            [name, value @ ..] if self.cvars.contains_key(*name) => {
                self.set_from_str(name, &value.join(" "))?;
                Ok(vec![format!("{} = {}", name, self.cvars[*name].value)])
            }
            [name, ..] => Ok(vec![format!("Unknown command: {}", name)]),
            [] => Ok(Vec::new()),
        }
    }

    fn set_from_str(&mut self, name: &str, input: &str) -> anyhow::Result<()> {
        let cvar = self.writable(name)?;
        cvar.value = cvar.default.parse_like(input).with_context(|| format!("set {name}"))?;
        Ok(())
    }

    /// Gets a cvar value.
    pub fn get_cvar(&self, name: &str) -> Option<&CvarValue> {
        self.cvars.get(name).map(|c| &c.value)
    }

    /// Boolean view of a cvar; unknown names read as `false`.
    pub fn get_bool(&self, name: &str) -> bool {
        self.get_cvar(name).is_some_and(CvarValue::as_bool)
    }

    /// Sets a cvar value programmatically.
    pub fn set_cvar(&mut self, name: &str, value: CvarValue) -> anyhow::Result<()> {
        self.writable(name)?.value = value;
        Ok(())
    }

    /// Looks up a cvar that may be changed.
    fn writable(&mut self, name: &str) -> anyhow::Result<&mut Cvar> {
        let cvar = self.cvars.get_mut(name).with_context(|| format!("unknown cvar: {name}"))?;
        if cvar.flags.contains(CvarFlags::READ_ONLY) {
            bail!("{name} is read-only");
        }
        Ok(cvar)
    }

    /// Gets command history.
    pub fn history(&self) -> &[String] {
        &self.history
    }
}
