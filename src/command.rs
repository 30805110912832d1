//! The text command grammar.
//!
//! Commands arrive as `<noun> <flag> <args…>` lines from the config script
//! or the control socket and are decoded here, once, into a tagged enum the
//! reactor matches exhaustively. Anything unknown is a typed error rendered
//! as a diagnostic; one bad line never aborts the rest of the input.

use std::str::FromStr;

use thiserror::Error;
use strum_macros::{Display, EnumString};

use crate::common::config::{Modifiers, SpaceMode, SplitPreference};
use crate::common::util::{is_blank_or_comment, parse_command};
use crate::model::window::WindowId;
use crate::rules;
use crate::sys::window_server::DisplayId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Cardinal {
    North,
    East,
    South,
    West,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
pub enum CycleDirection {
    Prev,
    Next,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Adjustment {
    Increase,
    Decrease,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum PaddingSide {
    Left,
    Right,
    Top,
    Bottom,
    All,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum GapAxis {
    Vertical,
    Horizontal,
    All,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum SpawnPosition {
    Left,
    Right,
}

#[derive(Clone, Debug, PartialEq)]
pub enum FocusTarget {
    Direction(Cardinal),
    Cycle(CycleDirection),
    /// The window below the cursor.
    Cursor,
    Id(WindowId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwapTarget {
    Direction(Cardinal),
    Cycle(CycleDirection),
    Marked,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZoomKind {
    Fullscreen,
    Parent,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum NodeTypeArg {
    Bsp,
    Monocle,
    Toggle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpaceTarget {
    Previous,
    Index(u32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayTarget {
    Cycle(CycleDirection),
    Id(DisplayId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkTarget {
    Focused,
    Direction { direction: Cardinal, wrap: bool },
}

#[derive(Clone, Debug, PartialEq)]
pub enum WindowCommand {
    Focus(FocusTarget),
    /// Cycle focus within the focused node's monocle sub-list.
    FocusMonocle(CycleDirection),
    Swap(SwapTarget),
    Zoom(ZoomKind),
    ToggleFloat,
    ResizeToContainer,
    ToggleSplitMode,
    SetNodeType(NodeTypeArg),
    AdjustRatio {
        delta: f64,
        direction: Option<Cardinal>,
    },
    MoveToSpace(SpaceTarget),
    MoveToDisplay(DisplayTarget),
    Detach(Cardinal),
    DetachMarked,
    MoveFloating {
        dx: f64,
        dy: f64,
    },
    Mark(MarkTarget),
}

#[derive(Clone, Debug, PartialEq)]
pub enum SpaceCommand {
    SetMode(SpaceMode),
    Refresh,
    Padding(Adjustment, PaddingSide),
    Gap(Adjustment, GapAxis),
    Name(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum DisplayCommand {
    Focus(DisplayTarget),
    SetSplitPreference(SplitPreference),
}

#[derive(Clone, Debug, PartialEq)]
pub enum TreeCommand {
    PseudoCreate,
    PseudoDestroy,
    Rotate(i64),
    Save(String),
    Restore(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToggleKind {
    FocusFollowsMouse,
    MouseFollowsFocus,
    LockToContainer,
    FloatNonResizable,
    CenterOnFloat,
    MouseDrag,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ConfigCommand {
    Reload,
    OptimalRatio(f64),
    SplitRatio(f64),
    Spawn(SpawnPosition),
    Tiling(SpaceMode),
    Padding {
        top: f64,
        bottom: f64,
        left: f64,
        right: f64,
    },
    Gap {
        vertical: f64,
        horizontal: f64,
    },
    SetToggle {
        toggle: ToggleKind,
        on: bool,
    },
    DragModifier(Modifiers),
    /// Default tiling mode for every space of one display.
    DisplayMode {
        display: DisplayId,
        mode: SpaceMode,
    },
    /// Per-space overrides, keyed by display and the platform space id.
    SpaceDefaults {
        display: DisplayId,
        space: u64,
        mode: Option<SpaceMode>,
        layout: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryCommand {
    TilingMode,
    SplitMode,
    SplitRatio,
    SpawnPosition,
    Toggle(ToggleKind),
    SpaceId,
    SpaceName,
    SpaceMode,
    PreviousSpaceId,
    FocusedWindowId,
    FocusedWindowName,
    FocusedWindowFloat,
    MarkedWindowId,
    MarkedWindowName,
    WindowList,
    WindowInDirection(Cardinal),
    Tree,
    Scratchpad,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScratchpadCommand {
    Add,
    Remove,
    Show(u32),
    Hide(u32),
    Toggle(u32),
    List,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Quit,
    Config(ConfigCommand),
    Window(WindowCommand),
    Space(SpaceCommand),
    Display(DisplayCommand),
    Tree(TreeCommand),
    Query(QueryCommand),
    /// Raw rule text, validated at parse time and compiled by the reactor.
    Rule(String),
    Scratchpad(ScratchpadCommand),
}

impl Command {
    pub fn is_query(&self) -> bool { matches!(self, Command::Query(_)) }
}

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}'")]
    UnknownNoun(String),
    #[error("'{noun}': unknown argument '{arg}'")]
    UnknownArgument { noun: &'static str, arg: String },
    #[error("'{0}': missing argument")]
    MissingArgument(&'static str),
    #[error("'{noun}': invalid value '{value}'")]
    InvalidValue { noun: &'static str, value: String },
    #[error("rule: {0}")]
    Rule(#[from] rules::RuleError),
}

fn arg<'a>(tokens: &'a [String], index: usize, noun: &'static str) -> Result<&'a str, CommandError> {
    tokens.get(index).map(|s| s.as_str()).ok_or(CommandError::MissingArgument(noun))
}

fn parse_enum<T: FromStr>(value: &str, noun: &'static str) -> Result<T, CommandError> {
    value.parse().map_err(|_| CommandError::InvalidValue {
        noun,
        value: value.to_string(),
    })
}

fn parse_f64(value: &str, noun: &'static str) -> Result<f64, CommandError> {
    value.parse().map_err(|_| CommandError::InvalidValue {
        noun,
        value: value.to_string(),
    })
}

fn parse_u32(value: &str, noun: &'static str) -> Result<u32, CommandError> {
    value.parse().map_err(|_| CommandError::InvalidValue {
        noun,
        value: value.to_string(),
    })
}

fn parse_on_off(value: &str, noun: &'static str) -> Result<bool, CommandError> {
    match value {
        "on" => Ok(true),
        "off" => Ok(false),
        other => Err(CommandError::InvalidValue {
            noun,
            value: other.to_string(),
        }),
    }
}

/// Decodes one already-tokenized command line.
pub fn parse(tokens: &[String]) -> Result<Command, CommandError> {
    let noun = tokens.first().ok_or(CommandError::Empty)?;
    match noun.as_str() {
        "quit" => Ok(Command::Quit),
        "window" => parse_window(tokens),
        "space" => parse_space(tokens),
        "display" => parse_display(tokens),
        "tree" => parse_tree(tokens),
        "config" => parse_config(tokens),
        "query" => parse_query(tokens),
        "rule" => {
            let text = tokens[1..].join(" ");
            rules::parse_rule(&text)?;
            Ok(Command::Rule(text))
        }
        "scratchpad" => parse_scratchpad(tokens),
        other => Err(CommandError::UnknownNoun(other.to_string())),
    }
}

/// Decodes one raw command line.
///
/// Rule declarations keep their raw text (their quoting matters to the rule
/// parser); everything else goes through the tokenizer.
pub fn parse_line(line: &str) -> Result<Command, CommandError> {
    let trimmed = line.trim();
    if let Some(rest) = trimmed.strip_prefix("rule ") {
        rules::parse_rule(rest)?;
        return Ok(Command::Rule(rest.to_string()));
    }
    parse(&parse_command(trimmed))
}

/// Decodes a whole config script. Bad lines are collected as diagnostics and
/// do not stop the remaining lines from parsing.
pub fn parse_script(text: &str) -> (Vec<Command>, Vec<(usize, CommandError)>) {
    let mut commands = Vec::new();
    let mut diagnostics = Vec::new();
    for (index, line) in text.lines().enumerate() {
        if is_blank_or_comment(line) {
            continue;
        }
        match parse_line(line) {
            Ok(command) => commands.push(command),
            Err(err) => diagnostics.push((index + 1, err)),
        }
    }
    (commands, diagnostics)
}

fn parse_window(tokens: &[String]) -> Result<Command, CommandError> {
    const NOUN: &str = "window";
    let flag = arg(tokens, 1, NOUN)?;
    let command = match flag {
        "-f" => {
            let target = arg(tokens, 2, NOUN)?;
            let target = if let Ok(direction) = target.parse::<Cardinal>() {
                FocusTarget::Direction(direction)
            } else if let Ok(cycle) = target.parse::<CycleDirection>() {
                FocusTarget::Cycle(cycle)
            } else if target == "curr" {
                FocusTarget::Cursor
            } else {
                let raw = parse_u32(target, NOUN)?;
                let id = WindowId::new(raw).ok_or(CommandError::InvalidValue {
                    noun: NOUN,
                    value: target.to_string(),
                })?;
                FocusTarget::Id(id)
            };
            WindowCommand::Focus(target)
        }
        "-fm" => WindowCommand::FocusMonocle(parse_enum(arg(tokens, 2, NOUN)?, NOUN)?),
        "-s" => {
            let target = arg(tokens, 2, NOUN)?;
            let target = if let Ok(direction) = target.parse::<Cardinal>() {
                SwapTarget::Direction(direction)
            } else if let Ok(cycle) = target.parse::<CycleDirection>() {
                SwapTarget::Cycle(cycle)
            } else if target == "mark" {
                SwapTarget::Marked
            } else {
                return Err(CommandError::InvalidValue {
                    noun: NOUN,
                    value: target.to_string(),
                });
            };
            WindowCommand::Swap(target)
        }
        "-z" => match arg(tokens, 2, NOUN)? {
            "fullscreen" => WindowCommand::Zoom(ZoomKind::Fullscreen),
            "parent" => WindowCommand::Zoom(ZoomKind::Parent),
            other => {
                return Err(CommandError::InvalidValue {
                    noun: NOUN,
                    value: other.to_string(),
                });
            }
        },
        "-t" => match arg(tokens, 2, NOUN)? {
            "focused" => WindowCommand::ToggleFloat,
            other => {
                return Err(CommandError::InvalidValue {
                    noun: NOUN,
                    value: other.to_string(),
                });
            }
        },
        "-r" => match arg(tokens, 2, NOUN)? {
            "focused" => WindowCommand::ResizeToContainer,
            other => {
                return Err(CommandError::InvalidValue {
                    noun: NOUN,
                    value: other.to_string(),
                });
            }
        },
        "-c" => match arg(tokens, 2, NOUN)? {
            "split-mode" => match arg(tokens, 3, NOUN)? {
                "toggle" => WindowCommand::ToggleSplitMode,
                other => {
                    return Err(CommandError::InvalidValue {
                        noun: NOUN,
                        value: other.to_string(),
                    });
                }
            },
            "type" => WindowCommand::SetNodeType(parse_enum(arg(tokens, 3, NOUN)?, NOUN)?),
            verb @ ("reduce" | "expand") => {
                let delta = parse_f64(arg(tokens, 3, NOUN)?, NOUN)?;
                let delta = if verb == "reduce" { -delta } else { delta };
                let direction = match tokens.get(4) {
                    Some(token) => Some(parse_enum(token, NOUN)?),
                    None => None,
                };
                WindowCommand::AdjustRatio { delta, direction }
            }
            other => {
                return Err(CommandError::UnknownArgument {
                    noun: NOUN,
                    arg: other.to_string(),
                });
            }
        },
        "-m" => match arg(tokens, 2, NOUN)? {
            "space" => {
                let target = arg(tokens, 3, NOUN)?;
                let target = if target == "previous" {
                    SpaceTarget::Previous
                } else {
                    SpaceTarget::Index(parse_u32(target, NOUN)?)
                };
                WindowCommand::MoveToSpace(target)
            }
            "display" => {
                let target = arg(tokens, 3, NOUN)?;
                let target = match target.parse::<CycleDirection>() {
                    Ok(cycle) => DisplayTarget::Cycle(cycle),
                    Err(_) => DisplayTarget::Id(parse_u32(target, NOUN)?),
                };
                WindowCommand::MoveToDisplay(target)
            }
            "mark" => WindowCommand::DetachMarked,
            other => match other.parse::<Cardinal>() {
                Ok(direction) => WindowCommand::Detach(direction),
                Err(_) => {
                    let dx = parse_f64(other, NOUN)?;
                    let dy = parse_f64(arg(tokens, 3, NOUN)?, NOUN)?;
                    WindowCommand::MoveFloating { dx, dy }
                }
            },
        },
        "-mk" => match arg(tokens, 2, NOUN)? {
            "focused" => WindowCommand::Mark(MarkTarget::Focused),
            other => {
                let direction = parse_enum(other, NOUN)?;
                let wrap = tokens.get(3).map(|t| t == "wrap").unwrap_or(false);
                WindowCommand::Mark(MarkTarget::Direction { direction, wrap })
            }
        },
        other => {
            return Err(CommandError::UnknownArgument {
                noun: NOUN,
                arg: other.to_string(),
            });
        }
    };
    Ok(Command::Window(command))
}

fn parse_space(tokens: &[String]) -> Result<Command, CommandError> {
    const NOUN: &str = "space";
    let flag = arg(tokens, 1, NOUN)?;
    let command = match flag {
        "-t" => SpaceCommand::SetMode(parse_enum(arg(tokens, 2, NOUN)?, NOUN)?),
        "-r" => match arg(tokens, 2, NOUN)? {
            "focused" => SpaceCommand::Refresh,
            other => {
                return Err(CommandError::InvalidValue {
                    noun: NOUN,
                    value: other.to_string(),
                });
            }
        },
        "-p" => SpaceCommand::Padding(
            parse_enum(arg(tokens, 2, NOUN)?, NOUN)?,
            parse_enum(arg(tokens, 3, NOUN)?, NOUN)?,
        ),
        "-g" => SpaceCommand::Gap(
            parse_enum(arg(tokens, 2, NOUN)?, NOUN)?,
            parse_enum(arg(tokens, 3, NOUN)?, NOUN)?,
        ),
        "-n" => SpaceCommand::Name(arg(tokens, 2, NOUN)?.to_string()),
        other => {
            return Err(CommandError::UnknownArgument {
                noun: NOUN,
                arg: other.to_string(),
            });
        }
    };
    Ok(Command::Space(command))
}

fn parse_display(tokens: &[String]) -> Result<Command, CommandError> {
    const NOUN: &str = "display";
    let flag = arg(tokens, 1, NOUN)?;
    let command = match flag {
        "-f" => {
            let target = arg(tokens, 2, NOUN)?;
            let target = match target.parse::<CycleDirection>() {
                Ok(cycle) => DisplayTarget::Cycle(cycle),
                Err(_) => DisplayTarget::Id(parse_u32(target, NOUN)?),
            };
            DisplayCommand::Focus(target)
        }
        "-c" => DisplayCommand::SetSplitPreference(parse_enum(arg(tokens, 2, NOUN)?, NOUN)?),
        other => {
            return Err(CommandError::UnknownArgument {
                noun: NOUN,
                arg: other.to_string(),
            });
        }
    };
    Ok(Command::Display(command))
}

fn parse_tree(tokens: &[String]) -> Result<Command, CommandError> {
    const NOUN: &str = "tree";
    let flag = arg(tokens, 1, NOUN)?;
    let command = match flag {
        "-pseudo" => match arg(tokens, 2, NOUN)? {
            "create" => TreeCommand::PseudoCreate,
            "destroy" => TreeCommand::PseudoDestroy,
            other => {
                return Err(CommandError::InvalidValue {
                    noun: NOUN,
                    value: other.to_string(),
                });
            }
        },
        "rotate" => match arg(tokens, 2, NOUN)? {
            "90" => TreeCommand::Rotate(90),
            "180" => TreeCommand::Rotate(180),
            "270" => TreeCommand::Rotate(270),
            other => {
                return Err(CommandError::InvalidValue {
                    noun: NOUN,
                    value: other.to_string(),
                });
            }
        },
        "save" => TreeCommand::Save(arg(tokens, 2, NOUN)?.to_string()),
        "restore" => TreeCommand::Restore(arg(tokens, 2, NOUN)?.to_string()),
        other => {
            return Err(CommandError::UnknownArgument {
                noun: NOUN,
                arg: other.to_string(),
            });
        }
    };
    Ok(Command::Tree(command))
}

fn toggle_kind(name: &str) -> Option<ToggleKind> {
    match name {
        "focus-follows-mouse" => Some(ToggleKind::FocusFollowsMouse),
        "mouse-follows-focus" => Some(ToggleKind::MouseFollowsFocus),
        "lock-to-container" => Some(ToggleKind::LockToContainer),
        "float-non-resizable" => Some(ToggleKind::FloatNonResizable),
        "center-on-float" => Some(ToggleKind::CenterOnFloat),
        "mouse-drag" => Some(ToggleKind::MouseDrag),
        _ => None,
    }
}

fn parse_config(tokens: &[String]) -> Result<Command, CommandError> {
    const NOUN: &str = "config";
    let flag = arg(tokens, 1, NOUN)?;
    let command = match flag {
        "reload" => ConfigCommand::Reload,
        "optimal-ratio" => ConfigCommand::OptimalRatio(parse_f64(arg(tokens, 2, NOUN)?, NOUN)?),
        "split-ratio" => ConfigCommand::SplitRatio(parse_f64(arg(tokens, 2, NOUN)?, NOUN)?),
        "spawn" => ConfigCommand::Spawn(parse_enum(arg(tokens, 2, NOUN)?, NOUN)?),
        "tiling" => ConfigCommand::Tiling(parse_enum(arg(tokens, 2, NOUN)?, NOUN)?),
        "padding" => ConfigCommand::Padding {
            top: parse_f64(arg(tokens, 2, NOUN)?, NOUN)?,
            bottom: parse_f64(arg(tokens, 3, NOUN)?, NOUN)?,
            left: parse_f64(arg(tokens, 4, NOUN)?, NOUN)?,
            right: parse_f64(arg(tokens, 5, NOUN)?, NOUN)?,
        },
        "gap" => ConfigCommand::Gap {
            vertical: parse_f64(arg(tokens, 2, NOUN)?, NOUN)?,
            horizontal: parse_f64(arg(tokens, 3, NOUN)?, NOUN)?,
        },
        "display" => {
            let display = parse_u32(arg(tokens, 2, NOUN)?, NOUN)?;
            match arg(tokens, 3, NOUN)? {
                "tiling" => ConfigCommand::DisplayMode {
                    display,
                    mode: parse_enum(arg(tokens, 4, NOUN)?, NOUN)?,
                },
                other => {
                    return Err(CommandError::UnknownArgument {
                        noun: NOUN,
                        arg: other.to_string(),
                    });
                }
            }
        }
        "space" => {
            let display = parse_u32(arg(tokens, 2, NOUN)?, NOUN)?;
            let space = parse_u32(arg(tokens, 3, NOUN)?, NOUN)? as u64;
            match arg(tokens, 4, NOUN)? {
                "tiling" => ConfigCommand::SpaceDefaults {
                    display,
                    space,
                    mode: Some(parse_enum(arg(tokens, 5, NOUN)?, NOUN)?),
                    layout: None,
                },
                "layout" => ConfigCommand::SpaceDefaults {
                    display,
                    space,
                    mode: None,
                    layout: Some(arg(tokens, 5, NOUN)?.to_string()),
                },
                other => {
                    return Err(CommandError::UnknownArgument {
                        noun: NOUN,
                        arg: other.to_string(),
                    });
                }
            }
        }
        "mouse-drag" if tokens.get(2).map(|t| t.as_str()) == Some("modifier") => {
            let spec = arg(tokens, 3, NOUN)?;
            let modifiers = Modifiers::from_spec(spec).ok_or(CommandError::InvalidValue {
                noun: NOUN,
                value: spec.to_string(),
            })?;
            ConfigCommand::DragModifier(modifiers)
        }
        name => match toggle_kind(name) {
            Some(toggle) => ConfigCommand::SetToggle {
                toggle,
                on: parse_on_off(arg(tokens, 2, NOUN)?, NOUN)?,
            },
            None => {
                return Err(CommandError::UnknownArgument {
                    noun: NOUN,
                    arg: name.to_string(),
                });
            }
        },
    };
    Ok(Command::Config(command))
}

fn parse_query(tokens: &[String]) -> Result<Command, CommandError> {
    const NOUN: &str = "query";
    let category = arg(tokens, 1, NOUN)?;
    let command = match category {
        "tiling" => match arg(tokens, 2, NOUN)? {
            "mode" => QueryCommand::TilingMode,
            "split-mode" => QueryCommand::SplitMode,
            "split-ratio" => QueryCommand::SplitRatio,
            "spawn-position" => QueryCommand::SpawnPosition,
            other => {
                return Err(CommandError::UnknownArgument {
                    noun: NOUN,
                    arg: other.to_string(),
                });
            }
        },
        "settings" => {
            let name = arg(tokens, 2, NOUN)?;
            match toggle_kind(name) {
                Some(toggle) => QueryCommand::Toggle(toggle),
                None => {
                    return Err(CommandError::UnknownArgument {
                        noun: NOUN,
                        arg: name.to_string(),
                    });
                }
            }
        }
        "space" => match arg(tokens, 2, NOUN)? {
            "id" => QueryCommand::SpaceId,
            "name" => QueryCommand::SpaceName,
            "mode" => QueryCommand::SpaceMode,
            "previous" => QueryCommand::PreviousSpaceId,
            other => {
                return Err(CommandError::UnknownArgument {
                    noun: NOUN,
                    arg: other.to_string(),
                });
            }
        },
        "window" => match arg(tokens, 2, NOUN)? {
            "focused" => match arg(tokens, 3, NOUN)? {
                "id" => QueryCommand::FocusedWindowId,
                "name" => QueryCommand::FocusedWindowName,
                "float" => QueryCommand::FocusedWindowFloat,
                other => {
                    return Err(CommandError::UnknownArgument {
                        noun: NOUN,
                        arg: other.to_string(),
                    });
                }
            },
            "marked" => match arg(tokens, 3, NOUN)? {
                "id" => QueryCommand::MarkedWindowId,
                "name" => QueryCommand::MarkedWindowName,
                other => {
                    return Err(CommandError::UnknownArgument {
                        noun: NOUN,
                        arg: other.to_string(),
                    });
                }
            },
            "list" => QueryCommand::WindowList,
            "dir" => QueryCommand::WindowInDirection(parse_enum(arg(tokens, 3, NOUN)?, NOUN)?),
            other => {
                return Err(CommandError::UnknownArgument {
                    noun: NOUN,
                    arg: other.to_string(),
                });
            }
        },
        "tree" => QueryCommand::Tree,
        "scratchpad" => QueryCommand::Scratchpad,
        other => {
            return Err(CommandError::UnknownArgument {
                noun: NOUN,
                arg: other.to_string(),
            });
        }
    };
    Ok(Command::Query(command))
}

fn parse_scratchpad(tokens: &[String]) -> Result<Command, CommandError> {
    const NOUN: &str = "scratchpad";
    let verb = arg(tokens, 1, NOUN)?;
    let command = match verb {
        "add" => ScratchpadCommand::Add,
        "remove" => ScratchpadCommand::Remove,
        "list" => ScratchpadCommand::List,
        "show" => ScratchpadCommand::Show(parse_u32(arg(tokens, 2, NOUN)?, NOUN)?),
        "hide" => ScratchpadCommand::Hide(parse_u32(arg(tokens, 2, NOUN)?, NOUN)?),
        "toggle" => ScratchpadCommand::Toggle(parse_u32(arg(tokens, 2, NOUN)?, NOUN)?),
        other => {
            return Err(CommandError::UnknownArgument {
                noun: NOUN,
                arg: other.to_string(),
            });
        }
    };
    Ok(Command::Scratchpad(command))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn parse_str(line: &str) -> Result<Command, CommandError> { parse_line(line) }

    #[test]
    fn window_focus_variants() {
        assert_eq!(
            parse_str("window -f north").unwrap(),
            Command::Window(WindowCommand::Focus(FocusTarget::Direction(Cardinal::North)))
        );
        assert_eq!(
            parse_str("window -f prev").unwrap(),
            Command::Window(WindowCommand::Focus(FocusTarget::Cycle(CycleDirection::Prev)))
        );
        assert_eq!(
            parse_str("window -f curr").unwrap(),
            Command::Window(WindowCommand::Focus(FocusTarget::Cursor))
        );
        assert_eq!(
            parse_str("window -f 42").unwrap(),
            Command::Window(WindowCommand::Focus(FocusTarget::Id(WindowId::new(42).unwrap())))
        );
    }

    #[test]
    fn window_container_commands() {
        assert_eq!(
            parse_str("window -c split-mode toggle").unwrap(),
            Command::Window(WindowCommand::ToggleSplitMode)
        );
        assert_eq!(
            parse_str("window -c type monocle").unwrap(),
            Command::Window(WindowCommand::SetNodeType(NodeTypeArg::Monocle))
        );
        assert_eq!(
            parse_str("window -c reduce 0.05 west").unwrap(),
            Command::Window(WindowCommand::AdjustRatio {
                delta: -0.05,
                direction: Some(Cardinal::West),
            })
        );
        assert_eq!(
            parse_str("window -c expand 0.1").unwrap(),
            Command::Window(WindowCommand::AdjustRatio {
                delta: 0.1,
                direction: None,
            })
        );
    }

    #[test]
    fn window_move_variants() {
        assert_eq!(
            parse_str("window -m space 3").unwrap(),
            Command::Window(WindowCommand::MoveToSpace(SpaceTarget::Index(3)))
        );
        assert_eq!(
            parse_str("window -m space previous").unwrap(),
            Command::Window(WindowCommand::MoveToSpace(SpaceTarget::Previous))
        );
        assert_eq!(
            parse_str("window -m display next").unwrap(),
            Command::Window(WindowCommand::MoveToDisplay(DisplayTarget::Cycle(
                CycleDirection::Next
            )))
        );
        assert_eq!(
            parse_str("window -m west").unwrap(),
            Command::Window(WindowCommand::Detach(Cardinal::West))
        );
        assert_eq!(
            parse_str("window -m 30 -20").unwrap(),
            Command::Window(WindowCommand::MoveFloating { dx: 30.0, dy: -20.0 })
        );
    }

    #[test]
    fn mark_with_wrap() {
        assert_eq!(
            parse_str("window -mk focused").unwrap(),
            Command::Window(WindowCommand::Mark(MarkTarget::Focused))
        );
        assert_eq!(
            parse_str("window -mk east wrap").unwrap(),
            Command::Window(WindowCommand::Mark(MarkTarget::Direction {
                direction: Cardinal::East,
                wrap: true,
            }))
        );
    }

    #[test]
    fn space_and_display_commands() {
        assert_eq!(
            parse_str("space -t bsp").unwrap(),
            Command::Space(SpaceCommand::SetMode(SpaceMode::Bsp))
        );
        assert_eq!(
            parse_str("space -p increase all").unwrap(),
            Command::Space(SpaceCommand::Padding(Adjustment::Increase, PaddingSide::All))
        );
        assert_eq!(
            parse_str("space -g decrease vertical").unwrap(),
            Command::Space(SpaceCommand::Gap(Adjustment::Decrease, GapAxis::Vertical))
        );
        assert_eq!(
            parse_str("display -c optimal").unwrap(),
            Command::Display(DisplayCommand::SetSplitPreference(SplitPreference::Optimal))
        );
    }

    #[test]
    fn tree_commands() {
        assert_eq!(
            parse_str("tree rotate 90").unwrap(),
            Command::Tree(TreeCommand::Rotate(90))
        );
        assert!(parse_str("tree rotate 45").is_err());
        assert_eq!(
            parse_str("tree save main").unwrap(),
            Command::Tree(TreeCommand::Save("main".into()))
        );
        assert_eq!(
            parse_str("tree -pseudo create").unwrap(),
            Command::Tree(TreeCommand::PseudoCreate)
        );
    }

    #[test]
    fn config_commands() {
        assert_eq!(
            parse_str("config padding 30 10 10 10").unwrap(),
            Command::Config(ConfigCommand::Padding {
                top: 30.0,
                bottom: 10.0,
                left: 10.0,
                right: 10.0,
            })
        );
        assert_eq!(
            parse_str("config lock-to-container off").unwrap(),
            Command::Config(ConfigCommand::SetToggle {
                toggle: ToggleKind::LockToContainer,
                on: false,
            })
        );
        assert_eq!(
            parse_str("config mouse-drag on").unwrap(),
            Command::Config(ConfigCommand::SetToggle {
                toggle: ToggleKind::MouseDrag,
                on: true,
            })
        );
        assert_eq!(
            parse_str("config mouse-drag modifier cmd+shift").unwrap(),
            Command::Config(ConfigCommand::DragModifier(Modifiers::COMMAND | Modifiers::SHIFT))
        );
    }

    #[test]
    fn per_display_and_per_space_config() {
        assert_eq!(
            parse_str("config display 2 tiling monocle").unwrap(),
            Command::Config(ConfigCommand::DisplayMode {
                display: 2,
                mode: SpaceMode::Monocle,
            })
        );
        assert_eq!(
            parse_str("config space 1 3 tiling float").unwrap(),
            Command::Config(ConfigCommand::SpaceDefaults {
                display: 1,
                space: 3,
                mode: Some(SpaceMode::Float),
                layout: None,
            })
        );
        assert_eq!(
            parse_str("config space 1 3 layout dev").unwrap(),
            Command::Config(ConfigCommand::SpaceDefaults {
                display: 1,
                space: 3,
                mode: None,
                layout: Some("dev".into()),
            })
        );
    }

    #[test]
    fn query_commands() {
        assert_eq!(
            parse_str("query window focused id").unwrap(),
            Command::Query(QueryCommand::FocusedWindowId)
        );
        assert_eq!(
            parse_str("query window dir east").unwrap(),
            Command::Query(QueryCommand::WindowInDirection(Cardinal::East))
        );
        assert_eq!(parse_str("query tree").unwrap(), Command::Query(QueryCommand::Tree));
        assert!(parse_str("query window focused split").is_err());
    }

    #[test]
    fn rules_are_validated_at_the_boundary() {
        assert!(parse_str(r#"rule owner="iTerm2" properties={float="true"}"#).is_ok());
        assert!(matches!(
            parse_str(r#"rule properties={float="true"}"#),
            Err(CommandError::Rule(_))
        ));
    }

    #[test]
    fn diagnostics_do_not_stop_the_script() {
        let script = "# comment\n\
                      config padding 10 10 10 10\n\
                      bogus nonsense\n\
                      space -t monocle\n";
        let (commands, diagnostics) = parse_script(script);
        assert_eq!(commands.len(), 2);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].0, 3);
        assert!(matches!(diagnostics[0].1, CommandError::UnknownNoun(_)));
    }

    #[test]
    fn unknown_tokens_are_typed_errors() {
        assert_eq!(parse_str(""), Err(CommandError::Empty));
        assert!(matches!(parse_str("windwo -f north"), Err(CommandError::UnknownNoun(_))));
        assert!(matches!(
            parse_str("window -x north"),
            Err(CommandError::UnknownArgument { .. })
        ));
        assert!(matches!(parse_str("window -f"), Err(CommandError::MissingArgument(_))));
    }
}
