pub mod config;
pub mod editor;
pub mod error;
pub mod ops;
pub mod sync;
pub mod types;
