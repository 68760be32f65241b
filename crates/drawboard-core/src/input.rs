//! Inbound events, keyboard shortcuts and host listener subscriptions.

use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    /// Ctrl on most platforms, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Pointer event in scene coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down { position: Point },
    Move { position: Point },
    Up { position: Point },
    /// Press and release without a drag.
    Tap { position: Point },
}

/// A key press.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyEvent {
    /// Key name as reported by the host (`"z"`, `"Delete"`, ...).
    pub key: String,
    pub modifiers: Modifiers,
    /// Focus is inside a text input; shortcuts do not apply.
    #[serde(default)]
    pub in_text_input: bool,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>, modifiers: Modifiers) -> Self {
        Self {
            key: key.into(),
            modifiers,
            in_text_input: false,
        }
    }

    /// Key with the command modifier held.
    pub fn command(key: impl Into<String>) -> Self {
        Self::new(
            key,
            Modifiers {
                ctrl: true,
                ..Modifiers::default()
            },
        )
    }

    pub fn in_text_input(mut self) -> Self {
        self.in_text_input = true;
        self
    }
}

/// Editing actions reachable from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EditorCommand {
    Delete,
    Copy,
    Paste,
    /// Duplicate a single node, or copy and paste a multi-selection.
    Duplicate,
    Undo,
    Redo,
}

/// A keyboard shortcut definition.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: &'static str,
    /// Ctrl (or Cmd) required.
    pub ctrl: bool,
    pub shift: bool,
    pub command: EditorCommand,
    pub description: &'static str,
}

impl Shortcut {
    pub const fn new(
        key: &'static str,
        ctrl: bool,
        shift: bool,
        command: EditorCommand,
        description: &'static str,
    ) -> Self {
        Self {
            key,
            ctrl,
            shift,
            command,
            description,
        }
    }

    /// Format the shortcut for display (e.g., "Ctrl+Shift+Z").
    pub fn format(&self) -> String {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("Ctrl");
        }
        if self.shift {
            parts.push("Shift");
        }
        parts.push(self.key);
        parts.join("+")
    }

    pub fn matches(&self, event: &KeyEvent) -> bool {
        event.key.eq_ignore_ascii_case(self.key)
            && event.modifiers.command() == self.ctrl
            && event.modifiers.shift == self.shift
    }
}

/// Registry of all keyboard shortcuts.
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    /// Get all registered shortcuts.
    pub fn all() -> Vec<Shortcut> {
        vec![
            Shortcut::new("Delete", false, false, EditorCommand::Delete, "Delete selected nodes"),
            Shortcut::new(
                "Backspace",
                false,
                false,
                EditorCommand::Delete,
                "Delete selected nodes",
            ),
            Shortcut::new("C", true, false, EditorCommand::Copy, "Copy nodes"),
            Shortcut::new("V", true, false, EditorCommand::Paste, "Paste nodes"),
            Shortcut::new("D", true, false, EditorCommand::Duplicate, "Duplicate selection"),
            Shortcut::new("Z", true, false, EditorCommand::Undo, "Undo"),
            Shortcut::new("Z", true, true, EditorCommand::Redo, "Redo"),
            Shortcut::new("Y", true, false, EditorCommand::Redo, "Redo"),
        ]
    }

    /// Command bound to a key press. Nothing fires inside text inputs.
    pub fn resolve(event: &KeyEvent) -> Option<EditorCommand> {
        if event.in_text_input {
            return None;
        }
        Self::all()
            .into_iter()
            .find(|shortcut| shortcut.matches(event))
            .map(|shortcut| shortcut.command)
    }
}

/// Host listener channels the engine subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputChannel {
    Keyboard,
    Paste,
    DragOver,
    Drop,
}

impl InputChannel {
    pub const ALL: [InputChannel; 4] = [
        InputChannel::Keyboard,
        InputChannel::Paste,
        InputChannel::DragOver,
        InputChannel::Drop,
    ];
}

pub type ListenerId = u64;

/// The environment that delivers raw input (a browser window, a test harness).
pub trait InputHost {
    fn listen(&mut self, channel: InputChannel) -> ListenerId;
    fn unlisten(&mut self, id: ListenerId);
}

/// A registered listener, removed from the host when dropped.
pub struct Subscription {
    host: Weak<RefCell<dyn InputHost>>,
    channel: InputChannel,
    id: ListenerId,
}

impl Subscription {
    pub fn channel(&self) -> InputChannel {
        self.channel
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("channel", &self.channel)
            .field("id", &self.id)
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(host) = self.host.upgrade() else {
            return;
        };
        match host.try_borrow_mut() {
            Ok(mut host) => host.unlisten(self.id),
            Err(_) => {
                log::warn!("Input host busy, leaking {:?} listener {}", self.channel, self.id)
            }
        };
    }
}

/// All listeners held by one engine.
#[derive(Debug, Default)]
pub struct InputSubscriptions {
    subscriptions: Vec<Subscription>,
}

impl InputSubscriptions {
    /// Register one listener per channel on `host`.
    pub fn acquire(host: &Rc<RefCell<dyn InputHost>>) -> Self {
        let weak = Rc::downgrade(host);
        let subscriptions = InputChannel::ALL
            .into_iter()
            .map(|channel| Subscription {
                host: weak.clone(),
                channel,
                id: host.borrow_mut().listen(channel),
            })
            .collect();
        Self { subscriptions }
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    pub fn channels(&self) -> Vec<InputChannel> {
        self.subscriptions.iter().map(Subscription::channel).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct TestHost {
        next: ListenerId,
        active: Vec<(ListenerId, InputChannel)>,
    }

    impl InputHost for TestHost {
        fn listen(&mut self, channel: InputChannel) -> ListenerId {
            self.next += 1;
            self.active.push((self.next, channel));
            self.next
        }

        fn unlisten(&mut self, id: ListenerId) {
            self.active.retain(|(active, _)| *active != id);
        }
    }

    #[test]
    fn test_shortcut_resolution() {
        assert_eq!(ShortcutRegistry::resolve(&KeyEvent::command("z")), Some(EditorCommand::Undo));
        assert_eq!(ShortcutRegistry::resolve(&KeyEvent::command("y")), Some(EditorCommand::Redo));
        let redo = KeyEvent::new(
            "Z",
            Modifiers {
                meta: true,
                shift: true,
                ..Modifiers::default()
            },
        );
        assert_eq!(ShortcutRegistry::resolve(&redo), Some(EditorCommand::Redo));
        assert_eq!(
            ShortcutRegistry::resolve(&KeyEvent::new("Backspace", Modifiers::default())),
            Some(EditorCommand::Delete)
        );
        assert_eq!(ShortcutRegistry::resolve(&KeyEvent::new("z", Modifiers::default())), None);
    }

    #[test]
    fn test_shortcuts_suppressed_in_text_input() {
        assert_eq!(ShortcutRegistry::resolve(&KeyEvent::command("c").in_text_input()), None);
        let delete = KeyEvent::new("Delete", Modifiers::default()).in_text_input();
        assert_eq!(ShortcutRegistry::resolve(&delete), None);
    }

    #[test]
    fn test_format() {
        let redo = ShortcutRegistry::all()
            .into_iter()
            .find(|s| s.command == EditorCommand::Redo && s.shift)
            .unwrap();
        assert_eq!(redo.format(), "Ctrl+Shift+Z");
    }

    #[test]
    fn test_subscriptions_release_on_drop() {
        let host = Rc::new(RefCell::new(TestHost::default()));
        let dyn_host: Rc<RefCell<dyn InputHost>> = host.clone();
        let subscriptions = InputSubscriptions::acquire(&dyn_host);
        assert_eq!(subscriptions.len(), 4);
        assert_eq!(host.borrow().active.len(), 4);
        assert_eq!(subscriptions.channels(), InputChannel::ALL.to_vec());

        drop(subscriptions);
        assert!(host.borrow().active.is_empty());
    }

    #[test]
    fn test_subscription_outliving_host() {
        let dyn_host: Rc<RefCell<dyn InputHost>> = Rc::new(RefCell::new(TestHost::default()));
        let subscriptions = InputSubscriptions::acquire(&dyn_host);
        drop(dyn_host);
        drop(subscriptions);
    }
}
