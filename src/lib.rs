//! tatami: a BSP/monocle tiling window manager core.
//!
//! The platform's accessibility layer is abstracted behind
//! [`sys::window_server::WindowServer`]. Everything above it is platform
//! independent: the node tree, container geometry, the event reactor, drag
//! gestures, and the command interpreter.

pub mod command;
pub mod common;
pub mod ipc;
pub mod layout;
pub mod model;
pub mod reactor;
pub mod rules;
pub mod sys;
