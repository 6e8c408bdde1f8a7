pub mod divergences;
pub mod errors;
pub mod localities;
pub mod options;
pub mod processes;
pub mod stats;
