use std::fmt::Write as _;
use std::io;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use crate::core::{
    AccumulationResult, DEFAULT_MAX_DEPLETION_YEARS, DepletionLimits, DepletionResult,
    WithdrawalSolution, run_depletion_with_limits, run_fixed_accumulation,
    run_variable_accumulation, solve_withdrawal_plan,
};
use crate::session::{format_currency, render_balance_chart, run_interactive};

mod http;

pub use http::run_http_server;

const MAX_AMOUNT: f64 = 1e12;
const MAX_YEARS: u32 = 1_000_000;

#[derive(Parser, Debug)]
#[command(
    name = "retireplan",
    about = "Retirement planner: savings growth, drawdown and sustainable withdrawal"
)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        env = "RETIREPLAN_MAX_DEPLETION_YEARS",
        default_value_t = DEFAULT_MAX_DEPLETION_YEARS,
        help = "Give up on run-to-depletion after this many years"
    )]
    pub max_depletion_years: u32,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Menu-driven session (the default when no command is given)
    Interactive,
    /// Grow a principal at a constant annual rate
    Fixed(FixedArgs),
    /// Grow a principal with one rate per year
    Variable(VariableArgs),
    /// Withdraw a constant amount until the balance runs out, or for a set number of years
    Deplete(DepleteArgs),
    /// Find the largest constant withdrawal that lasts a given number of years
    Solve(SolveArgs),
    /// Accumulate, then solve and simulate retirement from the resulting balance
    Plan(PlanArgs),
    /// Serve the JSON API
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

#[derive(Args, Debug, Clone)]
pub struct FixedArgs {
    #[arg(long)]
    pub principal: f64,
    #[arg(
        long,
        allow_negative_numbers = true,
        help = "Annual growth rate as a fraction, e.g. 0.05 for 5%"
    )]
    pub rate: f64,
    #[arg(long)]
    pub years: u32,
    #[arg(long, default_value_t = 0.0)]
    pub contribution: f64,
    #[arg(long, help = "Print the result as JSON")]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct VariableArgs {
    #[arg(long)]
    pub principal: f64,
    #[arg(
        long,
        value_delimiter = ',',
        allow_negative_numbers = true,
        help = "Comma-separated yearly growth rates, e.g. 0.05,-0.1,0.07"
    )]
    pub rates: Vec<f64>,
    #[arg(long, default_value_t = 0.0)]
    pub contribution: f64,
    #[arg(long, help = "Print the result as JSON")]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct DepleteArgs {
    #[arg(long)]
    pub principal: f64,
    #[arg(long)]
    pub withdrawal: f64,
    #[arg(long, allow_negative_numbers = true)]
    pub rate: f64,
    #[arg(long, help = "Simulate exactly this many years instead of running to depletion")]
    pub years: Option<u32>,
    #[arg(long, help = "Print the result as JSON")]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SolveArgs {
    #[arg(long)]
    pub principal: f64,
    #[arg(long, allow_negative_numbers = true)]
    pub rate: f64,
    #[arg(long)]
    pub years: u32,
    #[arg(long, help = "Print the result as JSON")]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct PlanArgs {
    #[arg(long)]
    pub principal: f64,
    #[arg(long, allow_negative_numbers = true, help = "Pre-retirement growth rate")]
    pub rate: f64,
    #[arg(long, help = "Years until retirement")]
    pub years: u32,
    #[arg(long, default_value_t = 0.0)]
    pub contribution: f64,
    #[arg(long, allow_negative_numbers = true, help = "Post-retirement growth rate")]
    pub retirement_rate: f64,
    #[arg(long, help = "Expected retirement duration in years")]
    pub retirement_years: u32,
    #[arg(long, help = "Also run a custom withdrawal until depletion")]
    pub withdrawal: Option<f64>,
    #[arg(long, help = "Print the result as JSON")]
    pub json: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanReport {
    pub accumulation: AccumulationResult,
    pub retirement_balance: f64,
    pub sustainable: WithdrawalSolution,
    pub sustainable_depletion: DepletionResult,
    pub custom_depletion: Option<DepletionResult>,
    pub chart: String,
}

pub async fn run(cli: Cli) -> Result<(), String> {
    let limits = build_limits(cli.max_depletion_years)?;
    match cli.command.unwrap_or(Command::Interactive) {
        Command::Interactive => {
            let stdin = io::stdin();
            run_interactive(stdin.lock(), io::stdout(), limits)
                .map(|_| ())
                .map_err(|e| format!("I/O error: {e}"))
        }
        Command::Fixed(args) => emit(args.json, &fixed_report(&args)?, render_accumulation),
        Command::Variable(args) => {
            emit(args.json, &variable_report(&args)?, render_accumulation)
        }
        Command::Deplete(args) => {
            emit(args.json, &deplete_report(&args, limits)?, render_depletion)
        }
        Command::Solve(args) => emit(args.json, &solve_report(&args)?, render_solution),
        Command::Plan(args) => emit(args.json, &plan_report(&args, limits)?, render_plan),
        Command::Serve { port } => run_http_server(port, limits)
            .await
            .map_err(|e| format!("Server error: {e}")),
    }
}

fn build_limits(max_depletion_years: u32) -> Result<DepletionLimits, String> {
    if max_depletion_years == 0 {
        return Err("--max-depletion-years must be > 0".to_string());
    }
    if max_depletion_years > MAX_YEARS {
        return Err(format!("--max-depletion-years must be <= {MAX_YEARS}"));
    }
    Ok(DepletionLimits {
        max_years: max_depletion_years,
    })
}

fn check_amount(flag: &str, value: f64) -> Result<(), String> {
    if !value.is_finite() || value < 0.0 {
        return Err(format!("{flag} must be >= 0"));
    }
    if value > MAX_AMOUNT {
        return Err(format!("{flag} must be <= 1e12"));
    }
    Ok(())
}

fn check_rate(flag: &str, value: f64) -> Result<(), String> {
    if !value.is_finite() || value < -1.0 {
        return Err(format!("{flag} must be a finite fraction >= -1"));
    }
    Ok(())
}

fn check_years(flag: &str, value: u32, min: u32) -> Result<(), String> {
    if value < min {
        return Err(format!("{flag} must be >= {min}"));
    }
    if value > MAX_YEARS {
        return Err(format!("{flag} must be <= {MAX_YEARS}"));
    }
    Ok(())
}

fn fixed_report(args: &FixedArgs) -> Result<AccumulationResult, String> {
    check_amount("--principal", args.principal)?;
    check_rate("--rate", args.rate)?;
    check_years("--years", args.years, 0)?;
    check_amount("--contribution", args.contribution)?;

    run_fixed_accumulation(args.principal, args.rate, args.years, args.contribution)
        .map_err(|e| e.to_string())
}

fn variable_report(args: &VariableArgs) -> Result<AccumulationResult, String> {
    check_amount("--principal", args.principal)?;
    if args.rates.len() > MAX_YEARS as usize {
        return Err(format!("--rates must have at most {MAX_YEARS} entries"));
    }
    for &rate in &args.rates {
        check_rate("--rates", rate)?;
    }
    check_amount("--contribution", args.contribution)?;

    run_variable_accumulation(args.principal, &args.rates, args.contribution)
        .map_err(|e| e.to_string())
}

fn deplete_report(args: &DepleteArgs, limits: DepletionLimits) -> Result<DepletionResult, String> {
    check_amount("--principal", args.principal)?;
    check_amount("--withdrawal", args.withdrawal)?;
    check_rate("--rate", args.rate)?;
    if let Some(years) = args.years {
        check_years("--years", years, 0)?;
    }

    run_depletion_with_limits(args.principal, args.withdrawal, args.rate, args.years, limits)
        .map_err(|e| e.to_string())
}

fn solve_report(args: &SolveArgs) -> Result<WithdrawalSolution, String> {
    check_amount("--principal", args.principal)?;
    check_rate("--rate", args.rate)?;
    check_years("--years", args.years, 1)?;

    solve_withdrawal_plan(args.principal, args.rate, args.years).map_err(|e| e.to_string())
}

fn plan_report(args: &PlanArgs, limits: DepletionLimits) -> Result<PlanReport, String> {
    check_amount("--principal", args.principal)?;
    check_rate("--rate", args.rate)?;
    check_years("--years", args.years, 0)?;
    check_amount("--contribution", args.contribution)?;
    check_rate("--retirement-rate", args.retirement_rate)?;
    check_years("--retirement-years", args.retirement_years, 1)?;
    if let Some(withdrawal) = args.withdrawal {
        check_amount("--withdrawal", withdrawal)?;
    }

    let accumulation =
        run_fixed_accumulation(args.principal, args.rate, args.years, args.contribution)
            .map_err(|e| e.to_string())?;
    let retirement_balance = accumulation.final_balance;

    let sustainable =
        solve_withdrawal_plan(retirement_balance, args.retirement_rate, args.retirement_years)
            .map_err(|e| e.to_string())?;
    let sustainable_depletion = run_depletion_with_limits(
        retirement_balance,
        sustainable.sustainable_withdrawal,
        args.retirement_rate,
        Some(args.retirement_years),
        limits,
    )
    .map_err(|e| e.to_string())?;

    let custom_depletion = args
        .withdrawal
        .map(|withdrawal| {
            run_depletion_with_limits(
                retirement_balance,
                withdrawal,
                args.retirement_rate,
                None,
                limits,
            )
        })
        .transpose()
        .map_err(|e| e.to_string())?;

    let chart = render_balance_chart(&accumulation.trajectory, &sustainable_depletion.trajectory);
    Ok(PlanReport {
        accumulation,
        retirement_balance,
        sustainable,
        sustainable_depletion,
        custom_depletion,
        chart,
    })
}

fn emit<T: Serialize>(json: bool, report: &T, render: fn(&T) -> String) -> Result<(), String> {
    if json {
        let body = serde_json::to_string_pretty(report)
            .map_err(|e| format!("Failed to serialize result: {e}"))?;
        println!("{body}");
    } else {
        print!("{}", render(report));
    }
    Ok(())
}

fn push_yearly_balances(out: &mut String, trajectory: &[f64]) {
    for (i, balance) in trajectory.iter().enumerate() {
        let _ = writeln!(out, "Year {:>3}  {}", i + 1, format_currency(*balance));
    }
}

fn render_accumulation(result: &AccumulationResult) -> String {
    let mut out = String::new();
    push_yearly_balances(&mut out, &result.trajectory);
    let _ = writeln!(
        out,
        "Accumulated Balance: {}",
        format_currency(result.final_balance)
    );
    out
}

fn render_depletion(result: &DepletionResult) -> String {
    let mut out = String::new();
    push_yearly_balances(&mut out, &result.trajectory);
    let _ = writeln!(out, "Years simulated: {}", result.years);
    if let Some(ending) = result.ending_balance() {
        let _ = writeln!(out, "Ending balance: {}", format_currency(ending));
    }
    out
}

fn render_solution(solution: &WithdrawalSolution) -> String {
    format!(
        "Optimal Annual Withdrawal: {}\nEnding balance at that withdrawal: {}\n",
        format_currency(solution.sustainable_withdrawal),
        format_currency(solution.ending_balance)
    )
}

fn render_plan(report: &PlanReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Balance at retirement: {}",
        format_currency(report.retirement_balance)
    );
    let _ = writeln!(
        out,
        "Optimal Annual Withdrawal: {} for {} years",
        format_currency(report.sustainable.sustainable_withdrawal),
        report.sustainable_depletion.years
    );
    if let Some(custom) = &report.custom_depletion {
        let _ = writeln!(out, "Custom withdrawal lasts {} years", custom.years);
    }
    out.push_str(&report.chart);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("retireplan").chain(args.iter().copied()))
            .expect("valid command line")
    }

    fn sample_plan() -> PlanArgs {
        PlanArgs {
            principal: 1_000.0,
            rate: 0.05,
            years: 3,
            contribution: 100.0,
            retirement_rate: 0.0,
            retirement_years: 4,
            withdrawal: None,
            json: false,
        }
    }

    #[test]
    fn cli_defaults_to_interactive_with_default_cap() {
        let cli = parse(&[]);
        assert!(cli.command.is_none());
        assert_eq!(cli.max_depletion_years, DEFAULT_MAX_DEPLETION_YEARS);
    }

    #[test]
    fn cli_parses_negative_rates_and_rate_lists() {
        let cli = parse(&[
            "variable",
            "--principal",
            "1000",
            "--rates",
            "0.1,-0.2,0",
            "--contribution",
            "50",
        ]);
        let Some(Command::Variable(args)) = cli.command else {
            panic!("expected variable command");
        };
        assert_eq!(args.rates, vec![0.1, -0.2, 0.0]);

        let cli = parse(&["deplete", "--principal", "100", "--withdrawal", "10", "--rate", "-0.02"]);
        let Some(Command::Deplete(args)) = cli.command else {
            panic!("expected deplete command");
        };
        assert_approx(args.rate, -0.02);
        assert_eq!(args.years, None);
    }

    #[test]
    fn cli_accepts_global_cap_after_subcommand() {
        let cli = parse(&["serve", "--port", "9000", "--max-depletion-years", "50"]);
        assert_eq!(cli.max_depletion_years, 50);
        assert!(matches!(cli.command, Some(Command::Serve { port: 9000 })));
    }

    #[test]
    fn build_limits_rejects_zero_and_unbounded_caps() {
        let err = build_limits(0).expect_err("zero cap");
        assert!(err.contains("--max-depletion-years"));

        let err = build_limits(u32::MAX).expect_err("cap above the year limit");
        assert_eq!(err, "--max-depletion-years must be <= 1000000");
        assert_eq!(build_limits(MAX_YEARS), Ok(DepletionLimits { max_years: MAX_YEARS }));
    }

    #[test]
    fn fixed_report_refuses_overflowing_balance() {
        let args = FixedArgs {
            principal: 1_000.0,
            rate: 0.5,
            years: 2_000,
            contribution: 0.0,
            json: false,
        };
        let err = fixed_report(&args).expect_err("overflows f64");
        assert!(err.contains("no longer a finite number"), "{err}");
    }

    #[test]
    fn fixed_report_matches_engine() {
        let args = FixedArgs {
            principal: 1_000.0,
            rate: 0.05,
            years: 3,
            contribution: 100.0,
            json: false,
        };
        let report = fixed_report(&args).expect("valid args");
        assert_approx(report.final_balance, 1_472.875);
        assert!(render_accumulation(&report).contains("Accumulated Balance: J$1,472.88"));
    }

    #[test]
    fn reports_reject_out_of_range_arguments() {
        let args = FixedArgs {
            principal: 2e12,
            rate: 0.05,
            years: 3,
            contribution: 0.0,
            json: false,
        };
        assert!(fixed_report(&args).expect_err("too large").contains("--principal"));

        let args = VariableArgs {
            principal: 100.0,
            rates: vec![0.05, -1.5],
            contribution: 0.0,
            json: false,
        };
        assert!(variable_report(&args).expect_err("bad rate").contains("--rates"));

        let args = SolveArgs {
            principal: 100.0,
            rate: 0.05,
            years: 0,
            json: false,
        };
        assert!(solve_report(&args).expect_err("no horizon").contains("--years must be >= 1"));
    }

    #[test]
    fn deplete_report_surfaces_iteration_cap() {
        let args = DepleteArgs {
            principal: 10_000.0,
            withdrawal: 1.0,
            rate: 0.05,
            years: None,
            json: false,
        };
        let err = deplete_report(&args, DepletionLimits { max_years: 30 }).expect_err("no depletion");
        assert!(err.contains("30 years"));
    }

    #[test]
    fn plan_report_chains_accumulation_into_retirement() {
        let mut args = sample_plan();
        args.withdrawal = Some(1_000.0);
        let report = plan_report(&args, DepletionLimits::default()).expect("valid plan");

        assert_approx(report.retirement_balance, 1_472.875);
        assert_approx(report.sustainable.sustainable_withdrawal, 1_472.875 / 4.0);
        assert_eq!(report.sustainable_depletion.trajectory.len(), 4);
        assert_eq!(report.custom_depletion.as_ref().map(|d| d.years), Some(2));
        assert_eq!(report.chart.lines().filter(|l| l.starts_with("Year")).count(), 7);
        assert!(render_plan(&report).contains("Custom withdrawal lasts 2 years"));
    }

    #[test]
    fn plan_report_serializes_camel_case_fields() {
        let report = plan_report(&sample_plan(), DepletionLimits::default()).expect("valid plan");
        let json = serde_json::to_value(&report).expect("serializable");
        assert!(json.get("retirementBalance").is_some());
        assert!(json["sustainable"].get("sustainableWithdrawal").is_some());
        assert!(json["sustainableDepletion"].get("trajectory").is_some());
        assert!(json["accumulation"].get("finalBalance").is_some());
        assert!(json["customDepletion"].is_null());
    }
}
