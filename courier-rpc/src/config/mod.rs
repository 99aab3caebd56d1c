mod agent;
pub use agent::{Agent, Issuer};

mod app;
pub use app::App;

mod config;
pub use config::Config;

mod parser;
pub use parser::Parser;
