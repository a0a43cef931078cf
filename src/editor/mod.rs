pub mod autosave;
pub mod drag;
pub mod history;
pub mod nudge;
pub mod session;
pub mod store;

pub use session::Editor;
