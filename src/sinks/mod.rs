// Built-in sink implementations

mod console;
mod daily;
mod json_file;
mod rotating;

pub use console::{ConsoleSink, ConsoleStyle};
pub use daily::DailyFileSink;
pub use json_file::JsonFileSink;
pub use rotating::RotatingFileSink;
