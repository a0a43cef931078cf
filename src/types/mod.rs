pub mod asset;
pub mod clip;
pub mod coerce;
pub mod project;
pub mod timeline;
pub mod track;
