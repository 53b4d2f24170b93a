//! Keyboard shortcuts for the collage canvas.
//!
//! Shortcuts act on the selected overlay: delete, duplicate and arrow-key
//! nudges do nothing while the selection is empty. Undo and redo always
//! apply.

use std::collections::HashMap;

use collage_document::Direction;

use crate::CoreResult;
use crate::command::Command;
use crate::config::Config;
use crate::store::DocumentStore;

/// Keyboard modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool, // Cmd on macOS, Win on Windows
}

impl Modifiers {
    /// No modifiers pressed.
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        alt: false,
        shift: false,
        meta: false,
    };

    /// Ctrl modifier.
    pub const CTRL: Modifiers = Modifiers {
        ctrl: true,
        ..Modifiers::NONE
    };

    /// Meta (Cmd/Win) modifier.
    pub const META: Modifiers = Modifiers {
        meta: true,
        ..Modifiers::NONE
    };

    /// Ctrl+Shift.
    pub const CTRL_SHIFT: Modifiers = Modifiers {
        ctrl: true,
        shift: true,
        ..Modifiers::NONE
    };

    /// Meta+Shift.
    pub const META_SHIFT: Modifiers = Modifiers {
        meta: true,
        shift: true,
        ..Modifiers::NONE
    };

    /// Returns true if no modifiers are pressed.
    pub fn is_empty(&self) -> bool {
        !self.ctrl && !self.alt && !self.shift && !self.meta
    }

    /// Parses modifiers from a string like "ctrl+shift".
    pub fn parse(s: &str) -> Self {
        let mut mods = Modifiers::NONE;
        for part in s.split('+').map(|p| p.trim().to_lowercase()) {
            match part.as_str() {
                "ctrl" | "control" => mods.ctrl = true,
                "alt" | "option" => mods.alt = true,
                "shift" => mods.shift = true,
                "meta" | "cmd" | "win" | "super" => mods.meta = true,
                _ => {}
            }
        }
        mods
    }
}

impl std::fmt::Display for Modifiers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("Ctrl");
        }
        if self.alt {
            parts.push("Alt");
        }
        if self.shift {
            parts.push("Shift");
        }
        if self.meta {
            #[cfg(target_os = "macos")]
            parts.push("Cmd");
            #[cfg(not(target_os = "macos"))]
            parts.push("Win");
        }
        write!(f, "{}", parts.join("+"))
    }
}

/// A key code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// A printable key, stored lowercase
    Char(char),
    Backspace,
    Delete,
    Escape,
    Up,
    Down,
    Left,
    Right,
}

impl Key {
    /// Parses a key from a string.
    pub fn parse(s: &str) -> Option<Self> {
        let lower = s.trim().to_lowercase();
        match lower.as_str() {
            "backspace" | "bs" => Some(Key::Backspace),
            "delete" | "del" => Some(Key::Delete),
            "escape" | "esc" => Some(Key::Escape),
            "up" | "arrowup" => Some(Key::Up),
            "down" | "arrowdown" => Some(Key::Down),
            "left" | "arrowleft" => Some(Key::Left),
            "right" | "arrowright" => Some(Key::Right),
            _ => {
                let mut chars = lower.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(Key::Char(c)),
                    _ => None,
                }
            }
        }
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Key::Char(c) => write!(f, "{}", c.to_uppercase()),
            Key::Backspace => write!(f, "Backspace"),
            Key::Delete => write!(f, "Delete"),
            Key::Escape => write!(f, "Escape"),
            Key::Up => write!(f, "Up"),
            Key::Down => write!(f, "Down"),
            Key::Left => write!(f, "Left"),
            Key::Right => write!(f, "Right"),
        }
    }
}

/// A key press event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyPress {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyPress {
    /// Creates a new key press.
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        let key = match key {
            Key::Char(c) => Key::Char(c.to_ascii_lowercase()),
            other => other,
        };
        Self { key, modifiers }
    }

    /// Parses a key binding string like "ctrl+shift+z".
    pub fn parse(s: &str) -> Option<Self> {
        let (mods, key) = match s.rsplit_once('+') {
            Some((mods, key)) => (Modifiers::parse(mods), key),
            None => (Modifiers::NONE, s),
        };
        Some(Self::new(Key::parse(key)?, mods))
    }
}

impl std::fmt::Display for KeyPress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.modifiers.is_empty() {
            write!(f, "{}", self.key)
        } else {
            write!(f, "{}+{}", self.modifiers, self.key)
        }
    }
}

/// A key binding maps a key press to a command.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyBinding {
    pub key: KeyPress,
    pub command: Command,
}

/// Keyboard mapping configuration.
pub struct Keymap {
    bindings: HashMap<KeyPress, Command>,
}

impl Keymap {
    /// Creates a keymap with default bindings and the default nudge step.
    pub fn new() -> Self {
        let mut keymap = Self {
            bindings: HashMap::new(),
        };
        keymap.add_default_bindings(Config::default().editor.nudge_step_px);
        keymap
    }

    /// Creates a keymap from configuration.
    ///
    /// User bindings replace defaults for the same key.
    pub fn from_config(config: &Config) -> Self {
        let mut keymap = Self {
            bindings: HashMap::new(),
        };
        keymap.add_default_bindings(config.editor.nudge_step_px);

        for (key_str, cmd_str) in &config.keyboard.bindings {
            let key = KeyPress::parse(key_str);
            let cmd = Self::parse_command(cmd_str, config.editor.nudge_step_px);
            match (key, cmd) {
                (Some(key), Some(cmd)) => {
                    keymap.bindings.insert(key, cmd);
                }
                _ => tracing::warn!("Ignoring key binding {} = {}", key_str, cmd_str),
            }
        }

        keymap
    }

    fn add_default_bindings(&mut self, step: f64) {
        use Command::*;

        let nudge = |direction| Nudge {
            direction,
            step: Some(step),
        };

        let bindings = [
            (KeyPress::new(Key::Delete, Modifiers::NONE), DeleteSelected),
            (KeyPress::new(Key::Backspace, Modifiers::NONE), DeleteSelected),
            (KeyPress::new(Key::Char('d'), Modifiers::CTRL), DuplicateSelected),
            (KeyPress::new(Key::Char('d'), Modifiers::META), DuplicateSelected),
            (KeyPress::new(Key::Char('z'), Modifiers::CTRL), Undo),
            (KeyPress::new(Key::Char('z'), Modifiers::META), Undo),
            (KeyPress::new(Key::Char('z'), Modifiers::CTRL_SHIFT), Redo),
            (KeyPress::new(Key::Char('z'), Modifiers::META_SHIFT), Redo),
            (KeyPress::new(Key::Char('y'), Modifiers::CTRL), Redo),
            (KeyPress::new(Key::Escape, Modifiers::NONE), ClearSelection),
            (KeyPress::new(Key::Left, Modifiers::NONE), nudge(Direction::Left)),
            (KeyPress::new(Key::Right, Modifiers::NONE), nudge(Direction::Right)),
            (KeyPress::new(Key::Up, Modifiers::NONE), nudge(Direction::Up)),
            (KeyPress::new(Key::Down, Modifiers::NONE), nudge(Direction::Down)),
        ];

        self.bindings.extend(bindings);
    }

    /// Parses a command name used in config files.
    fn parse_command(s: &str, step: f64) -> Option<Command> {
        let nudge = |direction| Command::Nudge {
            direction,
            step: Some(step),
        };
        match s {
            "undo" => Some(Command::Undo),
            "redo" => Some(Command::Redo),
            "reset" => Some(Command::Reset),
            "delete_selected" => Some(Command::DeleteSelected),
            "duplicate_selected" => Some(Command::DuplicateSelected),
            "clear_selection" => Some(Command::ClearSelection),
            "nudge_left" => Some(nudge(Direction::Left)),
            "nudge_right" => Some(nudge(Direction::Right)),
            "nudge_up" => Some(nudge(Direction::Up)),
            "nudge_down" => Some(nudge(Direction::Down)),
            _ => None,
        }
    }

    /// Returns the command bound to a key press.
    pub fn lookup(&self, key: &KeyPress) -> Option<&Command> {
        self.bindings.get(key)
    }

    /// Runs the command bound to `key` against the store.
    ///
    /// Returns false when nothing is bound, when the command needs a
    /// selection and there is none, or when the command changed nothing.
    pub fn handle(&self, key: KeyPress, store: &mut DocumentStore) -> CoreResult<bool> {
        let Some(command) = self.lookup(&key) else {
            return Ok(false);
        };
        if command.needs_selection() && store.selection().is_empty() {
            tracing::trace!("{} ignored, nothing selected", key);
            return Ok(false);
        }
        command.apply(store)
    }

    /// Returns all bindings, sorted by key label.
    pub fn bindings(&self) -> Vec<KeyBinding> {
        let mut bindings: Vec<_> = self
            .bindings
            .iter()
            .map(|(key, command)| KeyBinding {
                key: *key,
                command: command.clone(),
            })
            .collect();
        bindings.sort_by_key(|b| b.key.to_string());
        bindings
    }

    /// Adds or replaces a binding.
    pub fn add_binding(&mut self, binding: KeyBinding) {
        self.bindings.insert(binding.key, binding.command);
    }
}

impl Default for Keymap {
    fn default() -> Self {
        Self::new()
    }
}
