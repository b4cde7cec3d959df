use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{ActionError, ActionResult};
use crate::rename::{BlockEntityRename, RegistryRename};
use crate::swap::BlockSwap;

/// Which kind of change an [`Action`] describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ActionKind {
    RenameBlock,
    RenameItem,
    RenameBlockEntity,
    SwapBlock,
}

impl ActionKind {
    pub const ALL: [ActionKind; 4] = [
        Self::RenameBlock,
        Self::RenameItem,
        Self::RenameBlockEntity,
        Self::SwapBlock,
    ];

    /// Leading token of the action's text line.
    pub fn name(self) -> &'static str {
        match self {
            Self::RenameBlock => "RenameBlock",
            Self::RenameItem => "RenameItem",
            Self::RenameBlockEntity => "RenameBlockEntity",
            Self::SwapBlock => "SwapBlock",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One line of a conversion script.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "action")]
pub enum Action {
    RenameBlock(RegistryRename),
    RenameItem(RegistryRename),
    RenameBlockEntity(BlockEntityRename),
    SwapBlock(BlockSwap),
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::RenameBlock(_) => ActionKind::RenameBlock,
            Self::RenameItem(_) => ActionKind::RenameItem,
            Self::RenameBlockEntity(_) => ActionKind::RenameBlockEntity,
            Self::SwapBlock(_) => ActionKind::SwapBlock,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Text after the action name, hint included.
    pub fn body(&self) -> String {
        match self {
            Self::RenameBlock(rename) | Self::RenameItem(rename) => rename.to_string(),
            Self::RenameBlockEntity(rename) => rename.to_string(),
            Self::SwapBlock(swap) => swap.to_string(),
        }
    }

    /// Full line: action name, a space, then the body.
    pub fn render(&self) -> String {
        format!("{} {}", self.name(), self.body())
    }

    /// Parse a full line. Leading and trailing whitespace is ignored.
    pub fn parse(line: &str) -> ActionResult<Self> {
        let line = line.trim();
        let (name, body) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let kind = ActionKind::from_name(name)
            .ok_or_else(|| ActionError::UnknownAction(name.to_string()))?;
        Self::parse_body(kind, body)
    }

    pub fn parse_body(kind: ActionKind, body: &str) -> ActionResult<Self> {
        Ok(match kind {
            ActionKind::RenameBlock => Self::RenameBlock(RegistryRename::parse(body)?),
            ActionKind::RenameItem => Self::RenameItem(RegistryRename::parse(body)?),
            ActionKind::RenameBlockEntity => {
                Self::RenameBlockEntity(BlockEntityRename::parse(body)?)
            }
            ActionKind::SwapBlock => Self::SwapBlock(BlockSwap::parse(body)?),
        })
    }

    /// Ordering key within one kind of action. Registry renames sort by old
    /// name; the rest by their text without the hint. Always computed from the
    /// current field values.
    pub fn sort_key(&self) -> String {
        match self {
            Self::RenameBlock(rename) | Self::RenameItem(rename) => rename.old_name.to_string(),
            Self::RenameBlockEntity(rename) => rename.to_string(),
            Self::SwapBlock(swap) => swap.body(),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name(), self.body())
    }
}

impl FromStr for Action {
    type Err = ActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Sort by [`Action::sort_key`], keeping the relative order of equal keys.
pub fn sort_actions(actions: &mut [Action]) {
    actions.sort_by_cached_key(Action::sort_key);
}

/// A line of a script that failed to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineError {
    /// 1-based line number.
    pub line: usize,
    pub error: ActionError,
}

/// Result of reading a whole script: every action that parsed plus every
/// line that did not.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Script {
    pub actions: Vec<Action>,
    pub errors: Vec<LineError>,
}

impl Script {
    /// Parse one action per line. Blank lines and `#` comments (including
    /// commented-out actions) are skipped; malformed lines are collected in
    /// [`errors`](Self::errors) without stopping the scan.
    pub fn parse(text: &str) -> Self {
        let mut script = Self::default();
        for (idx, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match Action::parse(line) {
                Ok(action) => script.actions.push(action),
                Err(error) => script.errors.push(LineError {
                    line: idx + 1,
                    error,
                }),
            }
        }
        script
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn count(&self, kind: ActionKind) -> usize {
        self.actions.iter().filter(|a| a.kind() == kind).count()
    }
}
