use human_panic::{metadata, setup_panic};
use log::error;
use offset_planner::cli::run_cli;
use offset_planner::log::is_logger_initialised;

fn main() {
    setup_panic!(metadata!().support("Please open an issue describing how the crash happened."));

    if let Err(err) = run_cli() {
        if is_logger_initialised() {
            error!("{err:?}");
        } else {
            eprintln!("Error: {err:?}");
        }

        // Terminate program, signalling an error
        std::process::exit(1);
    }
}
