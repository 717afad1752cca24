//! Terminal front end

mod shell;

pub use shell::{format_report, Shell};
