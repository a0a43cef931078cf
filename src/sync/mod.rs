pub mod echo;
pub mod playback;
pub mod ruler;
