pub mod autosave;
pub mod commands;
pub mod engine;
pub mod input;
pub mod palette;
pub mod session;
pub mod shortcuts;
pub mod storage;
pub mod tools;

pub use autosave::{AutoSave, SyncStatus};
pub use commands::CommandStack;
pub use engine::{CanvasEngine, EditorConfig, FrameReport, RestoreGuard, SceneMutation};
pub use input::{InputEvent, Modifiers};
pub use palette::{CommandPalette, MatchNavigator, PaletteCommand};
pub use session::{ProjectSession, SessionError};
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use storage::{AuthState, RemoteFile, RemoteStore, StoreError};
