//! Property Forecast CLI
//!
//! Reads a JSON scenario file, runs one engine computation and prints a
//! summary table. `--csv` also writes the detailed rows to a file.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use property_forecast::analysis::{self, PrepaymentScenario};
use property_forecast::forecast::{ForecastAssumptions, ForecastConfig, ForecastMode, PropertyFinancials};
use property_forecast::metrics::evaluate;
use property_forecast::mortgage::{generate, AmortizationSchedule, MortgageTerms};
use property_forecast::scenario::{compare_frequencies, ScenarioRunner};

/// Mortgage amortization and rental property forecasting
#[derive(Parser)]
#[command(name = "propcast")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Amortization schedule for a mortgage (input: mortgage terms)
    Schedule(IoArgs),

    /// Apply a prepayment scenario (input: {"terms", "scenario"})
    Prepay(IoArgs),

    /// Compare the current mortgage with a refinance (input: refinance request)
    Refinance(IoArgs),

    /// Forecast a rental property and its returns (input: forecast request)
    Forecast(IoArgs),

    /// Schedule one mortgage under every payment frequency (input: mortgage terms)
    Frequencies(IoArgs),
}

#[derive(clap::Args)]
struct IoArgs {
    /// JSON input file
    input: PathBuf,

    /// Write detailed rows to this CSV file
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Number of rows to print
    #[arg(long, default_value_t = 12)]
    rows: usize,
}

#[derive(Deserialize)]
struct PrepayRequest {
    terms: MortgageTerms,
    scenario: PrepaymentScenario,
}

#[derive(Deserialize)]
struct RefinanceRequest {
    current_terms: MortgageTerms,
    current_remaining_balance: f64,
    new_terms: MortgageTerms,
    #[serde(default)]
    refinancing_cost: f64,
}

#[derive(Deserialize)]
struct ForecastRequest {
    property: PropertyFinancials,
    /// One or more assumption sets; each is forecast independently
    #[serde(default = "default_scenarios")]
    scenarios: Vec<ForecastAssumptions>,
    start_year: i32,
    #[serde(default)]
    years: Option<u32>,
    #[serde(default)]
    mode: ForecastMode,
    /// Decimal discount rate for NPV
    #[serde(default = "default_discount_rate")]
    discount_rate: f64,
}

fn default_scenarios() -> Vec<ForecastAssumptions> {
    vec![ForecastAssumptions::default()]
}

fn default_discount_rate() -> f64 {
    0.08
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file)).with_context(|| format!("failed to parse {}", path.display()))
}

fn write_csv<T: Serialize>(path: &Path, rows: impl IntoIterator<Item = T>) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("failed to create {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    println!("\nOutput written to {}", path.display());
    Ok(())
}

fn print_schedule(schedule: &AmortizationSchedule, rows: usize) {
    println!(
        "{:>5} {:>12} {:>12} {:>12} {:>12} {:>10} {:>14}",
        "Pmt", "Date", "Payment", "Principal", "Interest", "Extra", "Balance"
    );
    println!("{}", "-".repeat(85));
    for record in schedule.records.iter().take(rows) {
        println!(
            "{:>5} {:>12} {:>12.2} {:>12.2} {:>12.2} {:>10.2} {:>14.2}",
            record.payment_number,
            record.date,
            record.total_payment,
            record.principal_portion,
            record.interest_portion,
            record.extra_principal,
            record.remaining_balance,
        );
    }
    if schedule.len() > rows {
        println!("  ... {} more payments", schedule.len() - rows);
    }

    println!("\nSchedule Summary:");
    println!("  Payments:       {}", schedule.len());
    println!("  Payment:        ${:.2} {}", schedule.payment, schedule.frequency);
    println!("  Total interest: ${:.2}", schedule.total_interest());
    println!("  Total paid:     ${:.2}", schedule.total_paid());
    println!("  Final balance:  ${:.2}", schedule.final_balance());
    match schedule.payoff_date() {
        Some(date) => println!("  Paid off:       {}", date),
        None => println!("  Paid off:       no (renewal required)"),
    }
}

fn run_schedule(args: IoArgs) -> Result<()> {
    let terms: MortgageTerms = read_json(&args.input)?;
    let schedule = generate(&terms)?;
    print_schedule(&schedule, args.rows);

    println!("\nDebt service by year:");
    for year in schedule.yearly_totals() {
        println!(
            "  {} {:>3} payments  principal ${:>12.2}  interest ${:>10.2}  balance ${:>12.2}",
            year.year, year.payments, year.principal, year.interest, year.ending_balance
        );
    }

    if let Some(path) = &args.csv {
        write_csv(path, &schedule.records)?;
    }
    Ok(())
}

fn run_prepay(args: IoArgs) -> Result<()> {
    let request: PrepayRequest = read_json(&args.input)?;
    let result = analysis::apply(&request.terms, &request.scenario)?;
    print_schedule(&result.schedule, args.rows);

    println!("\nPrepayment Result:");
    println!("  Extra principal:     ${:.2}", result.extra_principal);
    println!("  Interest saved:      ${:.2}", result.interest_saved);
    println!("  Payments eliminated: {}", result.payments_eliminated);
    println!("  Payoff accelerated:  {}", result.payoff_accelerated);

    if let Some(path) = &args.csv {
        write_csv(path, &result.schedule.records)?;
    }
    Ok(())
}

fn run_refinance(args: IoArgs) -> Result<()> {
    let request: RefinanceRequest = read_json(&args.input)?;
    let comparison = analysis::analyze(
        &request.current_terms,
        request.current_remaining_balance,
        &request.new_terms,
        request.refinancing_cost,
    )?;

    println!("{:<22} {:>16} {:>16}", "", "Current", "Refinance");
    println!("{}", "-".repeat(56));
    println!(
        "{:<22} {:>16.2} {:>16.2}",
        "Monthly payment", comparison.current_monthly_payment, comparison.new_monthly_payment
    );
    println!(
        "{:<22} {:>16.2} {:>16.2}",
        "Total payments", comparison.current_total_payments, comparison.new_total_payments
    );
    println!(
        "{:<22} {:>16.2} {:>16.2}",
        "Total interest", comparison.current_total_interest, comparison.new_total_interest
    );
    println!(
        "{:<22} {:>16} {:>16}",
        "Payments",
        comparison.current_schedule.len(),
        comparison.new_schedule.len()
    );

    println!("\nRefinance Summary:");
    println!("  Monthly savings:  ${:.2}", comparison.monthly_savings);
    println!("  Interest savings: ${:.2}", comparison.interest_savings);
    println!("  Cost:             ${:.2}", comparison.refinancing_cost);
    println!("  Net savings:      ${:.2}", comparison.net_savings);
    match comparison.break_even_months {
        Some(months) => println!("  Break-even:       {} months", months),
        None => println!("  Break-even:       never"),
    }
    println!("  Worthwhile:       {}", comparison.is_worthwhile());

    if let Some(path) = &args.csv {
        write_csv(path, &comparison.new_schedule.records)?;
    }
    Ok(())
}

fn run_forecast(args: IoArgs) -> Result<()> {
    let request: ForecastRequest = read_json(&args.input)?;
    let mut config = ForecastConfig::new(request.start_year).with_mode(request.mode);
    if let Some(years) = request.years {
        config = config.with_years(years);
    }

    let runner = ScenarioRunner::new(config);
    let results = runner.run_scenarios(&request.property, &request.scenarios);

    for (index, result) in results.into_iter().enumerate() {
        let forecast = result.with_context(|| format!("scenario {} failed", index + 1))?;
        println!("Scenario {} ({:?}, {} years from {}):", index + 1, forecast.mode, forecast.horizon(), forecast.start_year);

        match forecast.mode {
            ForecastMode::CashFlow => {
                println!(
                    "{:>5} {:>14} {:>14} {:>14} {:>14} {:>14} {:>14}",
                    "Year", "Rent", "Expenses", "NOI", "DebtService", "NetCF", "Balance"
                );
                println!("{}", "-".repeat(95));
                for year in forecast.cash_flow_years() {
                    println!(
                        "{:>5} {:>14.2} {:>14.2} {:>14.2} {:>14.2} {:>14.2} {:>14.2}",
                        year.calendar_year,
                        year.rental_income,
                        year.operating_expenses,
                        year.net_operating_income,
                        year.debt_service(),
                        year.net_cash_flow,
                        year.mortgage_balance,
                    );
                }

                let metrics = evaluate(&forecast, request.discount_rate)?;
                println!("\nReturn Metrics:");
                match metrics.irr {
                    Some(irr) => println!("  IRR:              {:.3}%", irr),
                    None => println!("  IRR:              undefined"),
                }
                println!("  NPV @ {:.2}%:      ${:.2}", request.discount_rate * 100.0, metrics.npv);
                println!("  Avg cash flow:    ${:.2}", metrics.average_annual_cash_flow);
                println!("  Operating margin: {:.4}", metrics.operating_margin);
                println!("  DSCR:             {:.4}", metrics.debt_service_coverage_ratio);
                println!("  Cash-on-cash:     {:.3}%", metrics.cash_on_cash_return);
                println!("  Going-in cap:     {:.3}%", metrics.going_in_cap_rate);

                if let Some(path) = &args.csv {
                    write_csv(&scenario_path(path, index), forecast.cash_flow_years())?;
                }
            }
            ForecastMode::Equity => {
                println!(
                    "{:>5} {:>14} {:>14} {:>14} {:>14} {:>14} {:>9}",
                    "Year", "Value", "Balance", "Equity", "Appreciation", "Paydown", "Growth%"
                );
                println!("{}", "-".repeat(90));
                for year in forecast.equity_years() {
                    println!(
                        "{:>5} {:>14.2} {:>14.2} {:>14.2} {:>14.2} {:>14.2} {:>9.2}",
                        year.calendar_year,
                        year.property_value,
                        year.mortgage_balance,
                        year.equity,
                        year.equity_from_appreciation,
                        year.equity_from_paydown,
                        year.equity_growth_rate,
                    );
                }

                if let Some(path) = &args.csv {
                    write_csv(&scenario_path(path, index), forecast.equity_years())?;
                }
            }
        }
        println!();
    }
    Ok(())
}

/// `out.csv` for the first scenario, `out_2.csv` and so on for the rest
fn scenario_path(path: &Path, index: usize) -> PathBuf {
    if index == 0 {
        return path.to_path_buf();
    }
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("forecast");
    path.with_file_name(format!("{}_{}.csv", stem, index + 1))
}

fn run_frequencies(args: IoArgs) -> Result<()> {
    let terms: MortgageTerms = read_json(&args.input)?;
    let rows = compare_frequencies(&terms)?;

    println!(
        "{:<24} {:>10} {:>12} {:>6} {:>14} {:>12}",
        "Frequency", "Payment", "Monthly", "Count", "Interest", "Payoff"
    );
    println!("{}", "-".repeat(83));
    for row in &rows {
        let payoff = row
            .payoff_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<24} {:>10.2} {:>12.2} {:>6} {:>14.2} {:>12}",
            row.frequency.as_str(),
            row.payment,
            row.monthly_equivalent,
            row.payments,
            row.total_interest,
            payoff,
        );
    }

    if let Some(path) = &args.csv {
        write_csv(path, &rows)?;
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Schedule(args) => run_schedule(args),
        Commands::Prepay(args) => run_prepay(args),
        Commands::Refinance(args) => run_refinance(args),
        Commands::Forecast(args) => run_forecast(args),
        Commands::Frequencies(args) => run_frequencies(args),
    }
}
