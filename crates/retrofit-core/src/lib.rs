pub mod classifier;
pub mod config;
pub mod debug;
pub mod error;
pub mod imports;
pub mod installer;
pub mod io;
pub mod paths;
pub mod project;
pub mod runner;
pub mod scaffold;
pub mod supervisor;

pub use error::{Result, RetrofitError};
