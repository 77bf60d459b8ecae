mod client;
mod prompt;
mod retry;
mod run;

pub use run::run;
