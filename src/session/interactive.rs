use std::io::{self, BufRead, Write};

use log::{debug, info};
use thiserror::Error;

use crate::core::{
    DepletionLimits, EngineError, run_depletion_with_limits, run_fixed_accumulation,
    run_variable_accumulation, solve_sustainable_withdrawal,
};

use super::chart::render_balance_chart;
use super::format::format_currency;
use super::input::{Control, Entry, parse_control, parse_entry};
use super::state::{DepletionView, SessionState};
use super::steps::{Form, Request, StepSequence};

const NEED_ACCUMULATION: &str = "Please run a growth simulation first (Option 1 or 2)";
const NEED_DEPLETION: &str = "Please run a depletion simulation first (Option 3 or 4)";

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Flow {
    Continue,
    Exit,
}

enum FormOutcome {
    Completed(Request),
    Cancelled,
    Exit,
}

/// Menu-driven session over any line source and sink. Returns the session
/// state as it was when the user exited (or input ran out).
pub fn run_interactive<R: BufRead, W: Write>(
    input: R,
    output: W,
    limits: DepletionLimits,
) -> io::Result<SessionState> {
    let mut session = Session {
        input,
        output,
        state: SessionState::default(),
        limits,
    };
    session.run()?;
    Ok(session.state)
}

struct Session<R, W> {
    input: R,
    output: W,
    state: SessionState,
    limits: DepletionLimits,
}

impl<R: BufRead, W: Write> Session<R, W> {
    fn run(&mut self) -> io::Result<()> {
        self.print_header()?;
        loop {
            self.print_menu()?;
            let Some(choice) = self.read_line("Enter your choice")? else {
                return self.print_exit();
            };

            let flow = match choice.trim().to_lowercase().as_str() {
                "e" => Flow::Exit,
                "c" => {
                    self.clear()?;
                    Flow::Continue
                }
                "b" => {
                    writeln!(self.output, "Already at main menu\n")?;
                    Flow::Continue
                }
                "1" => self.run_form(Form::FixedGrowth)?,
                "2" => self.run_form(Form::VariableGrowth)?,
                "3" | "4" if self.state.retirement_balance().is_none() => {
                    self.print_warning(NEED_ACCUMULATION)?;
                    Flow::Continue
                }
                "3" => self.run_form(Form::Depletion)?,
                "4" => self.run_form(Form::OptimalWithdrawal)?,
                "5" => self.visualize()?,
                _ => {
                    self.print_warning("Invalid choice. Please select a valid option.")?;
                    Flow::Continue
                }
            };

            if flow == Flow::Exit {
                return self.print_exit();
            }
        }
    }

    fn run_form(&mut self, form: Form) -> io::Result<Flow> {
        match self.collect(form)? {
            FormOutcome::Completed(request) => {
                match self.execute(request) {
                    Ok(()) => {}
                    Err(ExecuteError::Io(err)) => return Err(err),
                    Err(err) => self.print_warning(&err.to_string())?,
                }
                Ok(Flow::Continue)
            }
            FormOutcome::Cancelled => Ok(Flow::Continue),
            FormOutcome::Exit => Ok(Flow::Exit),
        }
    }

    fn collect(&mut self, form: Form) -> io::Result<FormOutcome> {
        writeln!(self.output, "\n=== {} ===\n", form.title())?;
        self.print_navigation_help()?;

        let mut sequence = StepSequence::new(form);
        while let Some(step) = sequence.current().cloned() {
            let Some(line) = self.read_line(&step.prompt)? else {
                return Ok(FormOutcome::Exit);
            };
            match parse_entry(&line, step.kind) {
                Err(err) => writeln!(self.output, "! {err}")?,
                Ok(Entry::Control(Control::Exit)) => return Ok(FormOutcome::Exit),
                Ok(Entry::Control(Control::Clear)) => {
                    self.clear()?;
                    return Ok(FormOutcome::Cancelled);
                }
                Ok(Entry::Control(Control::Back)) => return Ok(FormOutcome::Cancelled),
                Ok(Entry::Control(Control::Previous)) => {
                    if !sequence.previous() {
                        writeln!(self.output, "Already at first step\n")?;
                    }
                }
                Ok(Entry::Value(answer)) => match sequence.submit(answer) {
                    Ok(Some(request)) => {
                        debug!("completed form {form:?}");
                        return Ok(FormOutcome::Completed(request));
                    }
                    Ok(None) => {}
                    Err(err) => writeln!(self.output, "! {err}")?,
                },
            }
        }
        Ok(FormOutcome::Cancelled)
    }

    fn execute(&mut self, request: Request) -> Result<(), ExecuteError> {
        match request {
            Request::FixedGrowth {
                principal,
                rate,
                years,
                contribution,
            } => {
                let result = run_fixed_accumulation(principal, rate, years, contribution)?;
                let balance = result.final_balance;
                self.state.record_accumulation(result);
                self.print_result("Accumulated Balance", &format_currency(balance))?;
            }
            Request::VariableGrowth {
                principal,
                rates,
                contribution,
            } => {
                let result = run_variable_accumulation(principal, &rates, contribution)?;
                let balance = result.final_balance;
                self.state.record_accumulation(result);
                self.print_result("Accumulated Balance", &format_currency(balance))?;
            }
            Request::Depletion { rate, withdrawal } => {
                let balance = self.retirement_balance()?;
                let result = run_depletion_with_limits(balance, withdrawal, rate, None, self.limits)?;
                let years = result.years;
                self.state.record_depletion(DepletionView::Custom, result);
                self.print_result("Years Until Depletion", &format!("{years} years"))?;
            }
            Request::OptimalWithdrawal { rate, years } => {
                let balance = self.retirement_balance()?;
                let optimal = solve_sustainable_withdrawal(balance, rate, years)?;
                self.print_result("Optimal Annual Withdrawal", &format_currency(optimal))?;
                let result =
                    run_depletion_with_limits(balance, optimal, rate, Some(years), self.limits)?;
                self.state.record_depletion(DepletionView::Optimal, result);
            }
        }
        Ok(())
    }

    fn retirement_balance(&self) -> Result<f64, ExecuteError> {
        self.state
            .retirement_balance()
            .ok_or(ExecuteError::Missing(NEED_ACCUMULATION))
    }

    fn visualize(&mut self) -> io::Result<Flow> {
        let views = self.state.available_views();
        match views.as_slice() {
            [] => {
                self.print_warning(NEED_DEPLETION)?;
                Ok(Flow::Continue)
            }
            [view] => {
                self.print_chart(*view)?;
                Ok(Flow::Continue)
            }
            _ => self.choose_view(&views),
        }
    }

    fn choose_view(&mut self, views: &[DepletionView]) -> io::Result<Flow> {
        loop {
            writeln!(self.output, "\n=== Choose Visualization ===\n")?;
            self.print_navigation_help()?;
            for (i, view) in views.iter().enumerate() {
                writeln!(self.output, "  {}  {}", i + 1, view.title())?;
            }
            writeln!(self.output, "\n  B  Back to Main Menu")?;
            writeln!(self.output, "  E  Exit")?;
            writeln!(self.output, "  C  Clear All Data\n")?;

            let Some(choice) = self.read_line("Enter choice")? else {
                return Ok(Flow::Exit);
            };
            match parse_control(&choice) {
                Some(Control::Exit) => return Ok(Flow::Exit),
                Some(Control::Clear) => {
                    self.clear()?;
                    return Ok(Flow::Continue);
                }
                Some(Control::Back) => return Ok(Flow::Continue),
                Some(Control::Previous) => {
                    writeln!(
                        self.output,
                        "Already at first step (use B to go back to main menu)\n"
                    )?;
                }
                None => {
                    let picked = choice
                        .trim()
                        .parse::<usize>()
                        .ok()
                        .and_then(|n| n.checked_sub(1))
                        .and_then(|i| views.get(i));
                    match picked {
                        Some(&view) => {
                            self.print_chart(view)?;
                            return Ok(Flow::Continue);
                        }
                        None => self.print_warning("Invalid option. Please try again.")?,
                    }
                }
            }
        }
    }

    fn print_chart(&mut self, view: DepletionView) -> io::Result<()> {
        let depletion = self.state.depletion(view).unwrap_or_default();
        let chart = render_balance_chart(self.state.accumulation(), depletion);
        writeln!(self.output, "\n=== {} ===", view.title())?;
        write!(self.output, "{chart}")
    }

    fn clear(&mut self) -> io::Result<()> {
        info!("session data cleared");
        self.state.clear();
        writeln!(self.output, "\n-- Data Reset --")?;
        writeln!(self.output, "All data has been cleared.\nStarting fresh...\n")
    }

    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "> {prompt}: ")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.output)?;
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn print_header(&mut self) -> io::Result<()> {
        writeln!(self.output, "\nRetirePlan Pro")?;
        writeln!(self.output, "Your Personal Retirement Planning Assistant\n")
    }

    fn print_menu(&mut self) -> io::Result<()> {
        writeln!(self.output, "--- Main Menu ---")?;
        writeln!(self.output, "  1  Fixed Growth Investment")?;
        writeln!(self.output, "  2  Variable Growth Investment")?;
        writeln!(self.output, "  3  Years Until Depletion")?;
        writeln!(self.output, "  4  Optimal Withdrawal Amount")?;
        writeln!(self.output, "  5  Visualize Balance Timeline")?;
        writeln!(self.output)?;
        writeln!(self.output, "  E  Exit")?;
        writeln!(self.output, "  C  Clear All Data\n")
    }

    fn print_navigation_help(&mut self) -> io::Result<()> {
        writeln!(
            self.output,
            "Navigation: P=Previous | B=Back to Menu | C=Clear | E=Exit\n"
        )
    }

    fn print_result(&mut self, label: &str, value: &str) -> io::Result<()> {
        writeln!(self.output, "\n[Result] {label}\n  {value}\n")
    }

    fn print_warning(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.output, "\n[Warning] {message}\n")
    }

    fn print_exit(&mut self) -> io::Result<()> {
        writeln!(self.output, "\nThank you for using RetirePlan Pro!")?;
        writeln!(self.output, "Plan wisely, retire comfortably.\n")
    }
}

#[derive(Error, Debug)]
enum ExecuteError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("{0}")]
    Missing(&'static str),
    #[error(transparent)]
    Io(#[from] io::Error),
}
