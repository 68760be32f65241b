//! DrawBoard Core Library
//!
//! Document and editing engine for a vector drawing board: the scene tree,
//! tool modes, drawing sessions, frame containment, clipboard and history.
//! Rendering, hit testing and UI widgets belong to the host.

pub mod clipboard;
pub mod config;
pub mod containment;
pub mod drawing;
pub mod engine;
pub mod error;
pub mod history;
pub mod input;
pub mod layers;
pub mod nodes;
pub mod observer;
pub mod record;
pub mod scene;
pub mod selection;
pub mod tools;

pub use clipboard::{ClipboardEntry, ClipboardPayload, ClipboardService};
pub use config::EngineConfig;
pub use containment::{ContainmentEngine, Reparent};
pub use drawing::{DrawingSession, SessionOutcome};
pub use engine::{Engine, PendingImageId};
pub use error::{ConfigError, ImageError, RecordError};
pub use history::{HistoryEntry, HistoryManager, HistoryState};
pub use input::{
    EditorCommand, InputChannel, InputHost, InputSubscriptions, KeyEvent, Modifiers, PointerEvent,
    Shortcut, ShortcutRegistry,
};
pub use layers::{LayerEntry, ReorderPosition};
pub use nodes::{Node, NodeId, NodeKind, NodeStyle, NodeType, SerializableColor};
pub use observer::{EngineEvent, EngineObserver, NoopObserver, RecordingObserver};
pub use scene::{NodeProperty, SceneChange, SceneTree};
pub use selection::Selection;
pub use tools::{Cursor, ModeConfig, ToolManager, ToolMode};
