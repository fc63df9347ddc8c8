use std::collections::HashMap;

/// How a parameter's value is located relative to its keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    /// Capture the whitespace-delimited token immediately before the keyword.
    Before,
    /// Capture the whitespace-delimited token immediately after the keyword.
    After,
    /// Presence-only; no value is captured.
    Flag,
}

impl ParameterKind {
    pub fn as_str(&self) -> &str {
        match self {
            ParameterKind::Before => "before",
            ParameterKind::After => "after",
            ParameterKind::Flag => "flag",
        }
    }
}

impl std::fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One argument a command accepts.
#[derive(Debug, Clone)]
pub struct Parameter {
    /// The token searched for in the message text.
    pub keyword: String,
    pub description: String,
    pub kind: ParameterKind,
}

impl Parameter {
    pub fn new(keyword: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            keyword: keyword.into(),
            description: String::new(),
            kind,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// A named capability a plugin advertises.
///
/// Immutable once returned by the plugin at load time. The keyword is unique
/// within a plugin but not across plugins; routing resolves collisions by
/// load order.
#[derive(Debug, Clone)]
pub struct Command {
    pub keyword: String,
    pub description: String,
    pub params: Vec<Parameter>,
}

impl Command {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            description: String::new(),
            params: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_param(mut self, param: Parameter) -> Self {
        self.params.push(param);
        self
    }
}

/// Extracted value for one parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    /// Token captured for a before/after parameter.
    Text(String),
    /// Presence of a flag parameter.
    Flag(bool),
}

impl ArgValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ArgValue::Text(text) => Some(text),
            ArgValue::Flag(_) => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            ArgValue::Flag(set) => Some(*set),
            ArgValue::Text(_) => None,
        }
    }
}

/// Argument map keyed by parameter keyword. Contains exactly one entry per
/// parameter the matched command declares.
pub type Arguments = HashMap<String, ArgValue>;

/// A routed command, ready for its owning plugin.
///
/// Created by the router after a successful match and parse, consumed exactly
/// once by the target plugin over its private channel.
#[derive(Debug, Clone)]
pub struct ParsedCommand {
    /// Channel the originating message came from; replies go back here.
    pub channel: String,
    /// Keyword of the matched command.
    pub command: String,
    pub arguments: Arguments,
}
