pub mod clip_ops;
pub mod migrations;
pub mod time_math;
