//! The command line interface for the planner.
use crate::input::load_model;
use crate::input::plan::Plan;
use crate::log;
use crate::model::Model;
use crate::output::{
    write_budget_output, write_mix_advice, write_region_advice, write_selection, write_stock_table,
    write_summary, write_timeline_advice,
};
use crate::planning::{
    run_budget_schedule, run_config_selection, run_geography_advice, run_timeline_advice,
    run_typology_mix_advice,
};
use crate::settings::Settings;
use crate::stock::StockSummary;
use crate::summary::BudgetSummary;
use ::log::info;
use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub mod example;
use example::{ExampleSubcommands, load_default_model};
pub mod settings;
use settings::SettingsSubcommands;

/// The command line interface for the planner.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// The available commands.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Options shared by commands which load market data
#[derive(Args, Default)]
pub struct DataOpts {
    /// Directory containing market data. Defaults to the bundled data set.
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,
}

/// The available commands.
#[derive(Subcommand)]
enum Commands {
    /// Schedule the purchases described by a plan file.
    Run {
        /// Path to the plan file.
        plan_file: PathBuf,
        /// Data options
        #[command(flatten)]
        opts: DataOpts,
    },
    /// Schedule a plan, then advise on its typology mix, timeline and geography.
    Advise {
        /// Path to the plan file.
        plan_file: PathBuf,
        /// Data options
        #[command(flatten)]
        opts: DataOpts,
    },
    /// Select a predefined configuration which fits the plan's budget.
    Select {
        /// Path to the plan file.
        plan_file: PathBuf,
        /// Data options
        #[command(flatten)]
        opts: DataOpts,
    },
    /// Validate a market data directory.
    Validate {
        /// Data options
        #[command(flatten)]
        opts: DataOpts,
    },
    /// Manage the bundled data sets.
    Example {
        /// The available subcommands for managing bundled data sets.
        #[command(subcommand)]
        subcommand: ExampleSubcommands,
    },
    /// Manage settings file.
    Settings {
        /// The subcommands for managing the settings file.
        #[command(subcommand)]
        subcommand: SettingsSubcommands,
    },
}

impl Commands {
    /// Execute the supplied CLI command
    fn execute(self) -> Result<()> {
        match self {
            Self::Run { plan_file, opts } => handle_run_command(&plan_file, &opts, None),
            Self::Advise { plan_file, opts } => handle_advise_command(&plan_file, &opts, None),
            Self::Select { plan_file, opts } => handle_select_command(&plan_file, &opts, None),
            Self::Validate { opts } => handle_validate_command(&opts, None),
            Self::Example { subcommand } => subcommand.execute(),
            Self::Settings { subcommand } => subcommand.execute(),
        }
    }
}

/// Parse CLI arguments and start the planner
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        // Output program help
        let help_str = Cli::command().render_long_help().to_string();
        println!("{help_str}");
        return Ok(());
    };

    command.execute()
}

/// Load program settings (if not provided) and initialise the logger
fn init_logging(settings: Option<Settings>) -> Result<()> {
    if log::is_logger_initialised() {
        return Ok(());
    }

    let settings = if let Some(settings) = settings {
        settings
    } else {
        Settings::load().context("Failed to load settings.")?
    };

    log::init(Some(&settings.log_level)).context("Failed to initialise logging.")
}

/// Load the model from the given data directory, or from the bundled data set.
///
/// The bundled data set is extracted to a temporary directory, which is returned so that it
/// outlives the model.
fn load_model_for(opts: &DataOpts) -> Result<(Option<TempDir>, Model)> {
    let (temp_dir, model) = if let Some(data_dir) = opts.data_dir.as_deref() {
        let model = load_model(data_dir).context("Failed to load market data.")?;
        (None, model)
    } else {
        let (temp_dir, model) =
            load_default_model().context("Failed to load bundled market data.")?;
        (Some(temp_dir), model)
    };
    info!(
        "Loaded market data from {} for {}",
        model.data_path.display(),
        model.horizon()
    );

    Ok((temp_dir, model))
}

/// Schedule a plan and write the strategy table and summary to `out`
pub fn run_plan<W: Write>(out: &mut W, model: &Model, plan: &Plan) -> Result<()> {
    let request = plan.request();
    let output = run_budget_schedule(model, &request);
    write_budget_output(out, &output)?;
    if output.is_filled() {
        writeln!(out)?;
        write_summary(out, &BudgetSummary::new(&output, &model.horizon()))?;
        writeln!(out, "\nCredits delivered into stock:")?;
        write_stock_table(out, &StockSummary::new(&output.strategies))?;
    }

    Ok(())
}

/// Schedule a plan and write advice on how to make it cheaper to `out`
pub fn advise_plan<W: Write>(out: &mut W, model: &Model, plan: &Plan) -> Result<()> {
    let request = plan.request();
    let output = run_budget_schedule(model, &request);
    let summary = BudgetSummary::new(&output, &model.horizon());
    writeln!(
        out,
        "Current cost (medium, financed): {:.2}",
        output.adjusted_medium_cost()
    )?;

    write_mix_advice(out, &run_typology_mix_advice(model, &request, &output))?;
    write_timeline_advice(out, &run_timeline_advice(model, &request, &output))?;
    if output.is_filled() {
        write_region_advice(out, run_geography_advice(&request.regions, &summary))?;
    }

    Ok(())
}

/// Run configuration selection for a plan and write the outcome to `out`
pub fn select_for_plan<W: Write>(out: &mut W, model: &Model, plan: &Plan) -> Result<()> {
    let request = plan.selection_request()?;
    let selection = run_config_selection(model, &request);
    write_selection(out, &selection)
}

/// Handle the `run` command.
pub fn handle_run_command(
    plan_file: &Path,
    opts: &DataOpts,
    settings: Option<Settings>,
) -> Result<()> {
    init_logging(settings)?;
    let plan = Plan::from_path(plan_file).context("Failed to load plan.")?;
    let (_data_dir, model) = load_model_for(opts)?;
    run_plan(&mut io::stdout().lock(), &model, &plan)?;
    info!("Planning complete!");

    Ok(())
}

/// Handle the `advise` command.
pub fn handle_advise_command(
    plan_file: &Path,
    opts: &DataOpts,
    settings: Option<Settings>,
) -> Result<()> {
    init_logging(settings)?;
    let plan = Plan::from_path(plan_file).context("Failed to load plan.")?;
    let (_data_dir, model) = load_model_for(opts)?;
    advise_plan(&mut io::stdout().lock(), &model, &plan)
}

/// Handle the `select` command.
pub fn handle_select_command(
    plan_file: &Path,
    opts: &DataOpts,
    settings: Option<Settings>,
) -> Result<()> {
    init_logging(settings)?;
    let plan = Plan::from_path(plan_file).context("Failed to load plan.")?;
    let (_data_dir, model) = load_model_for(opts)?;
    select_for_plan(&mut io::stdout().lock(), &model, &plan)
}

/// Handle the `validate` command.
pub fn handle_validate_command(opts: &DataOpts, settings: Option<Settings>) -> Result<()> {
    init_logging(settings)?;
    load_model_for(opts).context("Failed to validate market data.")?;
    info!("Market data validation successful!");

    Ok(())
}
