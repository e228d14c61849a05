//! Integration tests for the `run`, `advise` and `select` commands.
use offset_planner::cli::example::load_default_model;
use offset_planner::cli::{
    DataOpts, advise_plan, handle_advise_command, handle_run_command, handle_select_command,
    run_plan, select_for_plan,
};
use offset_planner::input::plan::{PLAN_FILE_NAME, Plan};
use offset_planner::settings::Settings;
use std::path::PathBuf;

/// Get the path to the flat-market data set.
fn get_data_dir() -> PathBuf {
    PathBuf::from("tests/data/flat")
}

fn flat_opts() -> DataOpts {
    DataOpts {
        data_dir: Some(get_data_dir()),
    }
}

fn render<F>(f: F) -> String
where
    F: FnOnce(&mut Vec<u8>) -> anyhow::Result<()>,
{
    let mut buf = Vec::new();
    f(&mut buf).unwrap();
    String::from_utf8(buf).unwrap()
}

/// An integration test for the command handlers.
///
/// The logger is only initialised by the first handler, so the handlers can be run in sequence.
#[test]
fn test_handle_commands() {
    unsafe { std::env::set_var("OFFSET_PLANNER_LOG_LEVEL", "off") };

    let plan_file = get_data_dir().join(PLAN_FILE_NAME);
    handle_run_command(&plan_file, &flat_opts(), Some(Settings::default())).unwrap();
    handle_advise_command(&plan_file, &flat_opts(), Some(Settings::default())).unwrap();
    handle_select_command(&plan_file, &flat_opts(), Some(Settings::default())).unwrap();

    let err = handle_run_command(
        &get_data_dir().join("missing.toml"),
        &flat_opts(),
        Some(Settings::default()),
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "Failed to load plan.");
}

/// Run the bundled plan against the bundled market data
#[test]
fn test_bundled_plan() {
    let (_data_dir, model) = load_default_model().unwrap();
    let plan = Plan::from_path(&PathBuf::from("data/default").join(PLAN_FILE_NAME)).unwrap();

    let report = render(|out| run_plan(out, &model, &plan));
    assert!(report.starts_with("All credits were bought."));
    assert!(report.contains("Horizon: 26 years"));
    assert!(report.contains("Credits delivered into stock:"));

    let advice = render(|out| advise_plan(out, &model, &plan));
    assert!(advice.starts_with("Current cost (medium, financed):"));
    assert!(advice.contains("Typology mix:"));
    assert!(advice.contains("Timeline:"));
    assert!(advice.contains("Geography:"));

    let selection = render(|out| select_for_plan(out, &model, &plan));
    assert!(
        selection.starts_with("Selected configuration")
            || selection == "No configuration fits the budget.\n"
    );
}
