use std::sync::Arc;

use pretty_assertions::assert_eq;
use test_log::test;

use super::*;
use crate::command::{
    Cardinal, Command, ConfigCommand, FocusTarget, QueryCommand, SpaceCommand, SwapTarget,
    TreeCommand, WindowCommand,
};
use crate::common::config::{SpaceMode, Toggles};
use crate::sys::window_server::{SimulatedWindowServer, SpaceId};

struct Harness {
    server: Arc<SimulatedWindowServer>,
    reactor: Reactor,
    _layouts: tempfile::TempDir,
}

impl Harness {
    fn new() -> Harness {
        Self::with_settings(Settings::default())
    }

    fn with_settings(settings: Settings) -> Harness {
        let server = Arc::new(SimulatedWindowServer::new());
        server.add_app(100, "Terminal");
        let layouts = tempfile::tempdir().unwrap();
        let reactor = Reactor::new(
            server.clone(),
            settings,
            None,
            layouts.path().to_path_buf(),
        );
        Harness {
            server,
            reactor,
            _layouts: layouts,
        }
    }

    fn open_window(&mut self, pid: Pid, title: &str) -> WindowId {
        let id = self
            .server
            .add_window(pid, title, Rect::new(100.0, 100.0, 600.0, 400.0), SpaceId(1));
        let info = self.server.window_info(id).unwrap();
        self.reactor.handle_event(Event::WindowCreated(info));
        id
    }

    fn focus(&mut self, id: WindowId) {
        self.server.focus_window(id);
        self.reactor.handle_event(Event::WindowFocused(id));
    }

    fn command(&mut self, command: Command) {
        self.reactor.handle_event(Event::Command { command, reply: None });
    }

    fn query(&mut self, query: QueryCommand) -> String {
        let (tx, rx) = crossbeam_channel::bounded(1);
        self.reactor.handle_event(Event::Command {
            command: Command::Query(query),
            reply: Some(tx),
        });
        rx.try_recv().expect("query must answer synchronously")
    }

    fn active_key(&self) -> SpaceKey {
        SpaceKey {
            display: 1,
            space: self.server.active_space(1).unwrap(),
        }
    }

    fn tree_leaf_frames(&self) -> Vec<(Option<WindowId>, Rect)> {
        let key = self.active_key();
        let tree = self.reactor.spaces[&key].tree.as_ref().expect("tree exists");
        tree.leaves()
            .into_iter()
            .map(|leaf| {
                let node = tree.node(leaf).unwrap();
                (node.window, node.container)
            })
            .collect()
    }
}

#[test]
fn scenario_three_windows_fill_the_display() {
    let mut h = Harness::new();
    let w1 = h.open_window(100, "one");
    let w2 = h.open_window(100, "two");
    let w3 = h.open_window(100, "three");

    // First split is vertical (1920/1080 is wider than the optimal ratio),
    // the second splits the left column horizontally. In-order leaves are
    // therefore w1-over-w3 in the left column, then w2.
    let frames = h.tree_leaf_frames();
    assert_eq!(frames.len(), 3);
    assert_eq!(frames[0].0, Some(w1));
    assert_eq!(frames[1].0, Some(w3));
    assert_eq!(frames[2].0, Some(w2));
    assert_eq!(frames[0].1.size.width + frames[2].1.size.width, 1920.0);
    assert_eq!(frames[0].1.size.height + frames[1].1.size.height, 1080.0);
    assert_eq!(frames[2].1.size.height, 1080.0);

    // The computed containers were applied to the server.
    for (window, container) in frames {
        let frame = h.server.window_frame(window.unwrap()).unwrap();
        assert_eq!(frame, container);
    }
}

#[test]
fn focus_follows_mouse_when_enabled() {
    let mut settings = Settings::default();
    settings.set_toggle(Toggles::FOCUS_FOLLOWS_MOUSE, true);
    let mut h = Harness::with_settings(settings);
    let w1 = h.open_window(100, "one");
    let w2 = h.open_window(100, "two");
    h.focus(w1);

    let over_w2 = h.server.window_frame(w2).unwrap().center();
    h.reactor.handle_event(Event::MouseMoved(over_w2));
    assert_eq!(h.server.focused_window(), Some(w2));

    // Moving within the already-focused window changes nothing.
    h.reactor.handle_event(Event::MouseMoved(over_w2));
    assert_eq!(h.server.focused_window(), Some(w2));
}

#[test]
fn removing_the_last_window_destroys_and_recreates_the_tree() {
    let mut h = Harness::new();
    let w1 = h.open_window(100, "one");

    h.server.remove_window(w1);
    h.reactor.handle_event(Event::WindowDestroyed(w1));
    let key = h.active_key();
    assert!(h.reactor.spaces[&key].tree.is_none());
    assert!(h.reactor.spaces[&key].initialized);

    let w2 = h.open_window(100, "two");
    let tree = h.reactor.spaces[&key].tree.as_ref().expect("tree rebuilt");
    assert_eq!(tree.windows(), vec![w2]);
    assert_eq!(h.server.window_frame(w2).unwrap(), Rect::new(0.0, 0.0, 1920.0, 1080.0));
}

#[test]
fn destroying_a_window_promotes_its_sibling() {
    let mut h = Harness::new();
    let w1 = h.open_window(100, "one");
    let w2 = h.open_window(100, "two");

    h.server.remove_window(w2);
    h.reactor.handle_event(Event::WindowDestroyed(w2));

    assert_eq!(h.server.window_frame(w1).unwrap(), Rect::new(0.0, 0.0, 1920.0, 1080.0));
    let frames = h.tree_leaf_frames();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].0, Some(w1));
}

#[test]
fn minimized_windows_leave_the_tree_but_not_the_registry() {
    let mut h = Harness::new();
    let w1 = h.open_window(100, "one");
    let w2 = h.open_window(100, "two");

    h.server.set_window_minimized(w2, true);
    h.reactor.handle_event(Event::WindowMinimized(w2));

    let frames = h.tree_leaf_frames();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].0, Some(w1));
    assert!(h.reactor.registry.window(w2).unwrap().is_minimized());

    h.server.set_window_minimized(w2, false);
    h.reactor.handle_event(Event::WindowDeminimized(w2));
    assert_eq!(h.tree_leaf_frames().len(), 2);
}

#[test]
fn deminimize_on_an_inactive_space_is_deferred() {
    let mut h = Harness::new();
    let _w1 = h.open_window(100, "one");
    let w2 = h.open_window(100, "two");

    h.server.set_window_minimized(w2, true);
    h.reactor.handle_event(Event::WindowMinimized(w2));

    // The window reappears on a space that is not active yet.
    h.server.set_window_space(w2, SpaceId(2));
    h.server.set_window_minimized(w2, false);
    h.reactor.handle_event(Event::WindowDeminimized(w2));

    assert_eq!(h.tree_leaf_frames().len(), 1);
}

#[test]
fn rebalance_adopts_windows_whose_creation_was_never_delivered() {
    let mut h = Harness::new();
    let _w1 = h.open_window(100, "one");

    // The server knows this window but the notification was dropped.
    let lost = h
        .server
        .add_window(100, "lost", Rect::new(0.0, 0.0, 500.0, 400.0), SpaceId(1));

    h.reactor.handle_event(Event::SpaceChanged);

    let key = h.active_key();
    let tree = h.reactor.spaces[&key].tree.as_ref().unwrap();
    assert!(tree.contains_window(lost));
    assert!(h.reactor.registry.window(lost).is_some());
}

#[test]
fn rebalance_drops_windows_that_silently_disappeared() {
    let mut h = Harness::new();
    let _w1 = h.open_window(100, "one");
    let w2 = h.open_window(100, "two");

    h.server.remove_window(w2);
    h.reactor.registry.remove_window(h.server.as_ref(), w2);
    h.reactor.handle_event(Event::SpaceChanged);

    let frames = h.tree_leaf_frames();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].1, Rect::new(0.0, 0.0, 1920.0, 1080.0));
}

#[test]
fn rebalance_is_idempotent() {
    let mut h = Harness::new();
    let _w1 = h.open_window(100, "one");
    let _w2 = h.open_window(100, "two");

    h.reactor.handle_event(Event::SpaceChanged);
    let first = h.tree_leaf_frames();
    h.reactor.handle_event(Event::SpaceChanged);
    h.reactor.handle_event(Event::SpaceChanged);
    assert_eq!(first, h.tree_leaf_frames());
}

#[test]
fn lock_to_container_undoes_manual_moves() {
    let mut h = Harness::new();
    let w1 = h.open_window(100, "one");
    let _w2 = h.open_window(100, "two");

    let container = h.server.window_frame(w1).unwrap();

    // An intrinsic move (ours) must not bounce.
    h.reactor.handle_event(Event::WindowMoved {
        id: w1,
        position: container.origin,
    });
    h.server.clear_frame_history();

    // A manual move snaps back.
    h.reactor.handle_event(Event::WindowMoved {
        id: w1,
        position: crate::sys::geometry::Point::new(50.0, 50.0),
    });
    let history = h.server.frame_history();
    assert!(!history.is_empty());
    assert_eq!(history.last().unwrap().1, container);
}

#[test]
fn window_registration_failure_discards_the_window() {
    let mut h = Harness::new();
    let _w1 = h.open_window(100, "one");
    let doomed = h
        .server
        .add_window(100, "doomed", Rect::new(0.0, 0.0, 500.0, 400.0), SpaceId(1));
    h.server.fail_window_registration(doomed);

    let info = h.server.window_info(doomed).unwrap();
    h.reactor.handle_event(Event::WindowCreated(info));

    assert!(h.reactor.registry.window(doomed).is_none());
    assert_eq!(h.tree_leaf_frames().len(), 1);
}

#[test]
fn slow_applications_are_retried_then_discarded() {
    let mut h = Harness::new();

    h.server.add_app(200, "Sluggish");
    h.server.fail_app_registrations(200, 1);
    h.reactor.handle_event(Event::ApplicationLaunched {
        pid: 200,
        name: "Sluggish".into(),
    });
    assert!(h.reactor.registry.has_application(200));

    h.server.add_app(300, "Dead");
    h.server.fail_app_registrations(300, 10);
    h.reactor.handle_event(Event::ApplicationLaunched {
        pid: 300,
        name: "Dead".into(),
    });
    assert!(!h.reactor.registry.has_application(300));
}

#[test]
fn terminating_an_application_unwinds_all_its_windows() {
    let mut h = Harness::new();
    let _w1 = h.open_window(100, "one");
    h.server.add_app(200, "Editor");
    let e1 = h.open_window(200, "buffer");

    h.server.remove_window(e1);
    h.reactor.handle_event(Event::ApplicationTerminated(200));

    assert!(!h.reactor.registry.has_application(200));
    let frames = h.tree_leaf_frames();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].1, Rect::new(0.0, 0.0, 1920.0, 1080.0));
}

#[test]
fn pending_windows_are_tiled_once_their_id_arrives() {
    let mut h = Harness::new();
    let _w1 = h.open_window(100, "one");

    let promised = h.server.add_unidentified_window(100, "restored");
    h.reactor.handle_event(Event::WindowCreated(
        crate::sys::window_server::WindowServerInfo {
            id: None,
            pid: 100,
            title: Some("restored".into()),
            frame: Rect::default(),
            role: crate::model::window::WindowRole::Standard,
            movable: true,
            resizable: true,
            minimized: false,
        },
    ));
    assert_eq!(h.reactor.registry.pending_count(), 1);
    assert_eq!(h.tree_leaf_frames().len(), 1);

    h.server.identify_pending(Rect::new(0.0, 0.0, 500.0, 400.0), SpaceId(1));
    h.reactor.handle_event(Event::SpaceChanged);

    assert_eq!(h.reactor.registry.pending_count(), 0);
    let key = h.active_key();
    assert!(h.reactor.spaces[&key].tree.as_ref().unwrap().contains_window(promised));
}

#[test]
fn focus_moves_directionally() {
    let mut h = Harness::new();
    let w1 = h.open_window(100, "one");
    let w2 = h.open_window(100, "two");
    h.focus(w1);

    h.command(Command::Window(WindowCommand::Focus(FocusTarget::Direction(Cardinal::East))));
    assert_eq!(h.server.focused_window(), Some(w2));

    h.reactor.handle_event(Event::WindowFocused(w2));
    h.command(Command::Window(WindowCommand::Focus(FocusTarget::Direction(Cardinal::West))));
    assert_eq!(h.server.focused_window(), Some(w1));
}

#[test]
fn swap_exchanges_tree_positions() {
    let mut h = Harness::new();
    let w1 = h.open_window(100, "one");
    let w2 = h.open_window(100, "two");
    h.focus(w1);

    let before_w1 = h.server.window_frame(w1).unwrap();
    let before_w2 = h.server.window_frame(w2).unwrap();

    h.command(Command::Window(WindowCommand::Swap(SwapTarget::Direction(Cardinal::East))));

    assert_eq!(h.server.window_frame(w1).unwrap(), before_w2);
    assert_eq!(h.server.window_frame(w2).unwrap(), before_w1);
}

#[test]
fn marked_window_swap_clears_the_mark() {
    let mut h = Harness::new();
    let w1 = h.open_window(100, "one");
    let w2 = h.open_window(100, "two");
    h.focus(w2);
    h.command(Command::Window(WindowCommand::Mark(crate::command::MarkTarget::Focused)));
    assert_eq!(h.reactor.marked, Some(w2));

    h.focus(w1);
    h.command(Command::Window(WindowCommand::Swap(SwapTarget::Marked)));
    assert_eq!(h.reactor.marked, None);

    // Destroying a marked window also clears the mark.
    h.command(Command::Window(WindowCommand::Mark(crate::command::MarkTarget::Focused)));
    assert_eq!(h.reactor.marked, Some(w1));
    h.server.remove_window(w1);
    h.reactor.handle_event(Event::WindowDestroyed(w1));
    assert_eq!(h.reactor.marked, None);
}

#[test]
fn float_toggle_releases_the_tree_slot() {
    let mut h = Harness::new();
    let w1 = h.open_window(100, "one");
    let w2 = h.open_window(100, "two");
    h.focus(w2);

    h.command(Command::Window(WindowCommand::ToggleFloat));

    assert!(h.reactor.registry.window(w2).unwrap().is_floating());
    let frames = h.tree_leaf_frames();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].0, Some(w1));

    h.command(Command::Window(WindowCommand::ToggleFloat));
    assert_eq!(h.tree_leaf_frames().len(), 2);
}

#[test]
fn monocle_mode_stacks_all_windows_at_full_size() {
    let mut h = Harness::new();
    let w1 = h.open_window(100, "one");
    let w2 = h.open_window(100, "two");

    h.command(Command::Space(SpaceCommand::SetMode(SpaceMode::Monocle)));

    let key = h.active_key();
    let tree = h.reactor.spaces[&key].tree.as_ref().unwrap();
    assert_eq!(tree.windows(), vec![w1, w2]);
    let full = Rect::new(0.0, 0.0, 1920.0, 1080.0);
    assert_eq!(h.server.window_frame(w1).unwrap(), full);
    assert_eq!(h.server.window_frame(w2).unwrap(), full);
}

#[test]
fn mode_reset_is_rejected_mid_transition() {
    let mut h = Harness::new();
    let _w1 = h.open_window(100, "one");

    h.server.set_transition_in_progress(true);
    h.command(Command::Space(SpaceCommand::SetMode(SpaceMode::Monocle)));

    let key = h.active_key();
    assert_eq!(h.reactor.spaces[&key].mode(), SpaceMode::Bsp);

    h.server.set_transition_in_progress(false);
    h.command(Command::Space(SpaceCommand::SetMode(SpaceMode::Monocle)));
    assert_eq!(h.reactor.spaces[&key].mode(), SpaceMode::Monocle);
}

#[test]
fn rotate_command_relayouts_and_applies() {
    let mut h = Harness::new();
    let w1 = h.open_window(100, "one");
    let w2 = h.open_window(100, "two");

    // Vertical split, side by side.
    assert_eq!(h.server.window_frame(w1).unwrap().size.width, 960.0);

    h.command(Command::Tree(TreeCommand::Rotate(90)));

    // Stacked now, and the children swapped.
    let top = Rect::new(0.0, 0.0, 1920.0, 540.0);
    let bottom = Rect::new(0.0, 540.0, 1920.0, 540.0);
    assert_eq!(h.server.window_frame(w2).unwrap(), top);
    assert_eq!(h.server.window_frame(w1).unwrap(), bottom);
}

#[test]
fn save_and_restore_round_trip_the_shape() {
    let mut h = Harness::new();
    let _w1 = h.open_window(100, "one");
    let _w2 = h.open_window(100, "two");
    let _w3 = h.open_window(100, "three");

    h.command(Command::Tree(TreeCommand::Save("main".into())));
    let before = h.tree_leaf_frames();

    h.command(Command::Tree(TreeCommand::Restore("main".into())));
    let after = h.tree_leaf_frames();

    assert_eq!(before, after);
}

#[test]
fn adjust_ratio_command_rejects_out_of_range() {
    let mut h = Harness::new();
    let w1 = h.open_window(100, "one");
    let _w2 = h.open_window(100, "two");
    h.focus(w1);

    h.command(Command::Window(WindowCommand::AdjustRatio {
        delta: 0.2,
        direction: None,
    }));
    assert_eq!(h.server.window_frame(w1).unwrap().size.width, 0.7 * 1920.0);

    // A delta that would leave (0, 1) is ignored outright.
    h.command(Command::Window(WindowCommand::AdjustRatio {
        delta: 0.5,
        direction: None,
    }));
    assert_eq!(h.server.window_frame(w1).unwrap().size.width, 0.7 * 1920.0);
}

#[test]
fn drag_move_swaps_windows_on_release() {
    let mut h = Harness::new();
    let w1 = h.open_window(100, "one");
    let w2 = h.open_window(100, "two");
    h.focus(w1);

    let w1_frame = h.server.window_frame(w1).unwrap();
    let w2_frame = h.server.window_frame(w2).unwrap();

    h.reactor.handle_event(Event::MouseDown {
        button: MouseButton::Left,
        location: w1_frame.center(),
        modifiers: Modifiers::ALT,
    });
    h.reactor.handle_event(Event::MouseDragged {
        button: MouseButton::Left,
        location: w2_frame.center(),
    });
    h.reactor.handle_event(Event::MouseUp {
        button: MouseButton::Left,
        location: w2_frame.center(),
    });

    assert_eq!(h.server.window_frame(w1).unwrap(), w2_frame);
    assert_eq!(h.server.window_frame(w2).unwrap(), w1_frame);
    assert_eq!(h.reactor.drag.move_gesture, super::drag::MoveGesture::Idle);
}

#[test]
fn drag_without_modifiers_never_arms() {
    let mut h = Harness::new();
    let w1 = h.open_window(100, "one");
    let _w2 = h.open_window(100, "two");
    h.focus(w1);

    let frame = h.server.window_frame(w1).unwrap();
    h.reactor.handle_event(Event::MouseDown {
        button: MouseButton::Left,
        location: frame.center(),
        modifiers: Modifiers::empty(),
    });
    assert_eq!(h.reactor.drag.move_gesture, super::drag::MoveGesture::Idle);
}

#[test]
fn drag_released_without_target_is_a_clean_noop() {
    let mut h = Harness::new();
    let w1 = h.open_window(100, "one");
    let _w2 = h.open_window(100, "two");
    h.focus(w1);

    let frame = h.server.window_frame(w1).unwrap();
    h.reactor.handle_event(Event::MouseDown {
        button: MouseButton::Left,
        location: frame.center(),
        modifiers: Modifiers::ALT,
    });
    h.reactor.handle_event(Event::MouseUp {
        button: MouseButton::Left,
        location: frame.center(),
    });

    assert_eq!(h.reactor.drag.move_gesture, super::drag::MoveGesture::Idle);
    assert_eq!(h.server.window_frame(w1).unwrap(), frame);
    assert!(h.server.border(crate::sys::window_server::BorderKind::Marked).is_none());
}

#[test]
fn drag_resize_adjusts_the_governing_split() {
    let mut h = Harness::new();
    let w1 = h.open_window(100, "one");
    let _w2 = h.open_window(100, "two");
    h.focus(w1);

    let frame = h.server.window_frame(w1).unwrap();
    h.reactor.handle_event(Event::MouseDown {
        button: MouseButton::Right,
        location: frame.center(),
        modifiers: Modifiers::ALT,
    });
    h.reactor.handle_event(Event::MouseDragged {
        button: MouseButton::Right,
        location: crate::sys::geometry::Point::new(600.0, 540.0),
    });
    h.reactor.handle_event(Event::MouseUp {
        button: MouseButton::Right,
        location: crate::sys::geometry::Point::new(600.0, 540.0),
    });

    let resized = h.server.window_frame(w1).unwrap();
    assert_eq!(resized.size.width, 600.0);
    assert_eq!(h.reactor.drag.resize_gesture, super::drag::ResizeGesture::Idle);
}

#[test]
fn queries_answer_on_the_reply_channel() {
    let mut h = Harness::new();
    let w1 = h.open_window(100, "one");
    h.focus(w1);

    assert_eq!(h.query(QueryCommand::FocusedWindowId), w1.to_string());
    assert_eq!(h.query(QueryCommand::FocusedWindowName), "one");
    assert_eq!(h.query(QueryCommand::TilingMode), "bsp");
    assert_eq!(h.query(QueryCommand::MarkedWindowId), "-1");

    let list = h.query(QueryCommand::WindowList);
    let parsed: serde_json::Value = serde_json::from_str(&list).unwrap();
    assert_eq!(parsed.as_array().unwrap().len(), 1);

    let tree = h.query(QueryCommand::Tree);
    assert!(tree.contains(&w1.to_string()));
}

#[test]
fn config_commands_mutate_settings() {
    let mut h = Harness::new();

    h.command(Command::Config(ConfigCommand::SplitRatio(0.3)));
    assert_eq!(h.reactor.settings.split_ratio, 0.3);

    // Out-of-range values are ignored, matching the node ratio policy.
    h.command(Command::Config(ConfigCommand::SplitRatio(1.7)));
    assert_eq!(h.reactor.settings.split_ratio, 0.3);

    h.command(Command::Config(ConfigCommand::Padding {
        top: 20.0,
        bottom: 10.0,
        left: 5.0,
        right: 5.0,
    }));
    assert_eq!(h.reactor.settings.default_offset.padding_top, 20.0);

    h.command(Command::Config(ConfigCommand::SetToggle {
        toggle: crate::command::ToggleKind::LockToContainer,
        on: false,
    }));
    assert!(!h.reactor.settings.has(Toggles::LOCK_TO_CONTAINER));
}

#[test]
fn rules_float_matching_windows() {
    let mut h = Harness::new();
    h.command(Command::Rule(r#"owner="Terminal" name="popup" properties={float="true"}"#.into()));

    let _w1 = h.open_window(100, "main");
    let popup = h.open_window(100, "popup");

    assert!(h.reactor.registry.window(popup).unwrap().is_floating());
    assert_eq!(h.tree_leaf_frames().len(), 1);
}

#[test]
fn scratchpad_round_trip() {
    let mut h = Harness::new();
    let w1 = h.open_window(100, "one");
    let _w2 = h.open_window(100, "two");
    h.focus(w1);

    h.command(Command::Scratchpad(crate::command::ScratchpadCommand::Add));
    assert!(h.reactor.scratchpad.contains(w1));
    assert_eq!(h.tree_leaf_frames().len(), 1);

    h.command(Command::Scratchpad(crate::command::ScratchpadCommand::Hide(0)));
    assert!(h.reactor.scratchpad.is_hidden(0));
    assert!(h.server.window_frame(w1).unwrap().origin.x >= 1920.0);

    h.command(Command::Scratchpad(crate::command::ScratchpadCommand::Toggle(0)));
    assert!(!h.reactor.scratchpad.is_hidden(0));
    let frame = h.server.window_frame(w1).unwrap();
    assert!(frame.origin.x < 1920.0);

    h.command(Command::Scratchpad(crate::command::ScratchpadCommand::Remove));
    assert!(!h.reactor.scratchpad.contains(w1));
    assert_eq!(h.tree_leaf_frames().len(), 2);
}

#[test]
fn zoom_fullscreen_covers_the_root_container() {
    let mut h = Harness::new();
    let w1 = h.open_window(100, "one");
    let _w2 = h.open_window(100, "two");
    h.focus(w1);

    h.command(Command::Window(WindowCommand::Zoom(crate::command::ZoomKind::Fullscreen)));
    assert_eq!(h.server.window_frame(w1).unwrap(), Rect::new(0.0, 0.0, 1920.0, 1080.0));

    // Toggling again restores the leaf container.
    h.command(Command::Window(WindowCommand::Zoom(crate::command::ZoomKind::Fullscreen)));
    assert_eq!(h.server.window_frame(w1).unwrap().size.width, 960.0);
}

#[test]
fn pseudo_node_reserves_and_releases_a_slot() {
    let mut h = Harness::new();
    let w1 = h.open_window(100, "one");
    h.focus(w1);

    h.command(Command::Tree(TreeCommand::PseudoCreate));
    {
        let key = h.active_key();
        let tree = h.reactor.spaces[&key].tree.as_ref().unwrap();
        assert_eq!(tree.leaves().len(), 2);
        assert!(tree.first_pseudo_leaf().is_some());
    }

    // The next window fills the placeholder instead of splitting again.
    let w2 = h.open_window(100, "two");
    {
        let key = h.active_key();
        let tree = h.reactor.spaces[&key].tree.as_ref().unwrap();
        assert_eq!(tree.leaves().len(), 2);
        assert!(tree.first_pseudo_leaf().is_none());
        assert!(tree.contains_window(w2));
    }

    // And a pseudo slot can be collapsed away again.
    h.command(Command::Tree(TreeCommand::PseudoCreate));
    h.command(Command::Tree(TreeCommand::PseudoDestroy));
    let key = h.active_key();
    let tree = h.reactor.spaces[&key].tree.as_ref().unwrap();
    assert_eq!(tree.leaves().len(), 2);
}

#[test]
fn per_space_mode_override_applies_on_first_visit() {
    let mut h = Harness::new();
    h.command(Command::Config(ConfigCommand::SpaceDefaults {
        display: 1,
        space: 2,
        mode: Some(SpaceMode::Monocle),
        layout: None,
    }));
    let _w1 = h.open_window(100, "one");

    h.server.set_active_space(1, SpaceId(2));
    let w2 = h
        .server
        .add_window(100, "two", Rect::new(0.0, 0.0, 500.0, 400.0), SpaceId(2));
    h.reactor.handle_event(Event::SpaceChanged);

    let key = SpaceKey {
        display: 1,
        space: SpaceId(2),
    };
    assert_eq!(h.reactor.spaces[&key].mode(), SpaceMode::Monocle);
    let tree = h.reactor.spaces[&key].tree.as_ref().unwrap();
    assert_eq!(tree.windows(), vec![w2]);
    assert_eq!(h.server.window_frame(w2).unwrap(), Rect::new(0.0, 0.0, 1920.0, 1080.0));
}

#[test]
fn bootstrap_discovers_preexisting_windows() {
    let server = Arc::new(SimulatedWindowServer::new());
    server.add_app(100, "Terminal");
    let w1 = server.add_window(100, "one", Rect::new(0.0, 0.0, 500.0, 400.0), SpaceId(1));
    let w2 = server.add_window(100, "two", Rect::new(0.0, 0.0, 500.0, 400.0), SpaceId(1));

    let layouts = tempfile::tempdir().unwrap();
    let mut reactor = Reactor::new(
        server.clone(),
        Settings::default(),
        None,
        layouts.path().to_path_buf(),
    );
    reactor.bootstrap();

    let key = SpaceKey {
        display: 1,
        space: SpaceId(1),
    };
    let tree = reactor.spaces[&key].tree.as_ref().unwrap();
    assert!(tree.contains_window(w1));
    assert!(tree.contains_window(w2));
}
