mod command;
mod runner;
mod util;

pub use command::Command;
pub use runner::{OutputMode, run, run_to, run_with_format};
pub use util::{parse_order_arg, parse_project_arg, parse_sort_arg};
