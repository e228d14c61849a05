//! Code related to the bundled data sets and the CLI commands for interacting with them.
use super::{DataOpts, handle_run_command};
use crate::input::load_model;
use crate::input::plan::PLAN_FILE_NAME;
use crate::model::Model;
use crate::settings::Settings;
use anyhow::{Context, Result, bail, ensure};
use clap::Subcommand;
use include_dir::{Dir, DirEntry, include_dir};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// The directory containing the bundled data sets.
const DATA_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/data");

/// The data set used when no data directory is given
pub const DEFAULT_DATA_SET: &str = "default";

/// The available subcommands for managing bundled data sets.
#[derive(Subcommand)]
pub enum ExampleSubcommands {
    /// List available data sets.
    List,
    /// Provide information about the specified data set.
    Info {
        /// The name of the data set.
        name: String,
    },
    /// Extract a data set to a new directory.
    Extract {
        /// The name of the data set to extract.
        name: String,
        /// The destination folder for the data set.
        new_path: Option<PathBuf>,
    },
    /// Run the example plan of a data set.
    Run {
        /// The name of the data set to run.
        name: String,
    },
}

impl ExampleSubcommands {
    /// Execute the supplied example subcommand
    pub fn execute(self) -> Result<()> {
        match self {
            Self::List => handle_example_list_command(),
            Self::Info { name } => handle_example_info_command(&name)?,
            Self::Extract {
                name,
                new_path: dest,
            } => handle_example_extract_command(&name, dest.as_deref())?,
            Self::Run { name } => handle_example_run_command(&name, None)?,
        }

        Ok(())
    }
}

/// Names of the bundled data sets
pub fn example_names() -> impl Iterator<Item = &'static str> {
    DATA_DIR
        .dirs()
        .filter_map(|dir| dir.path().file_name())
        .filter_map(|name| name.to_str())
}

/// Handle the `example list` command.
fn handle_example_list_command() {
    for name in example_names() {
        println!("{name}");
    }
}

/// Handle the `example info` command.
fn handle_example_info_command(name: &str) -> Result<()> {
    let path: PathBuf = [name, "README.txt"].iter().collect();
    let readme = DATA_DIR
        .get_file(path)
        .context("Data set not found.")?
        .contents_utf8()
        .context("README.txt is not UTF-8 encoded")?;

    println!("{readme}");

    Ok(())
}

/// Handle the `example extract` command
fn handle_example_extract_command(name: &str, dest: Option<&Path>) -> Result<()> {
    let dest = dest.unwrap_or(Path::new(name));
    extract_example(name, dest)
}

/// Extract the specified data set to a new directory
pub fn extract_example(name: &str, new_path: &Path) -> Result<()> {
    // Find the subdirectory in DATA_DIR whose name matches `name`.
    let sub_dir = DATA_DIR.get_dir(name).context("Data set not found.")?;

    ensure!(
        !new_path.exists(),
        "Destination directory {} already exists",
        new_path.display()
    );

    // Copy the contents of the subdirectory to the destination
    fs::create_dir(new_path)?;
    for entry in sub_dir.entries() {
        match entry {
            DirEntry::Dir(_) => bail!("Subdirectories in data sets are not supported"),
            DirEntry::File(f) => {
                let file_name = f
                    .path()
                    .file_name()
                    .context("Bundled file has no name")?;
                fs::write(new_path.join(file_name), f.contents())?;
            }
        }
    }

    Ok(())
}

/// Load the default bundled data set via a temporary directory.
///
/// The model's data path lies inside the returned directory, which is deleted when dropped.
pub fn load_default_model() -> Result<(TempDir, Model)> {
    let temp_dir = TempDir::new().context("Failed to create temporary directory.")?;
    let data_path = temp_dir.path().join(DEFAULT_DATA_SET);
    extract_example(DEFAULT_DATA_SET, &data_path)?;
    let model = load_model(&data_path)?;

    Ok((temp_dir, model))
}

/// Handle the `example run` command.
pub fn handle_example_run_command(name: &str, settings: Option<Settings>) -> Result<()> {
    let temp_dir = TempDir::new().context("Failed to create temporary directory.")?;
    let data_path = temp_dir.path().join(name);
    extract_example(name, &data_path)?;

    let opts = DataOpts {
        data_dir: Some(data_path.clone()),
    };
    handle_run_command(&data_path.join(PLAN_FILE_NAME), &opts, settings)
}
