pub mod error;
pub mod keys;
pub mod keyseq;
pub mod logger;
pub mod platform;
pub mod probe;
pub mod runner;
pub mod script;
pub mod settings;
pub mod sleep;
pub mod source;
pub mod status;
pub mod target;
pub mod types;
