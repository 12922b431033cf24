mod chart;
mod format;
mod input;
mod interactive;
mod state;
mod steps;

pub use chart::render_balance_chart;
pub use format::{format_amount, format_currency};
pub use input::{Control, Entry, InputError, parse_entry};
pub use interactive::run_interactive;
pub use state::{DepletionView, SessionState};
pub use steps::{Answer, Form, Request, StepError, StepKind, StepSequence};
