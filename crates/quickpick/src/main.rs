use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use quickpick::app::session::QuickOpen;
use quickpick::infra::config::Config;
use quickpick::infra::host::{Platform, ScriptHost};
use quickpick::ui::app::{PickerMode, UiApp};
use quickpick::ui::components::menu::MenuState;

/// Pick a file, bookmark, buffer line, or colorscheme and print the editor actions it triggers.
#[derive(Parser)]
#[command(author, version, long_about = None)]
struct Cli {
    /// Pick a line of FILE instead of listing files
    #[arg(long, value_name = "FILE", conflicts_with = "colors")]
    lines: Option<PathBuf>,
    /// Pick one of the given colorschemes
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    colors: Vec<String>,
    /// Directory to start in
    #[arg(long, value_name = "DIR")]
    cwd: Option<PathBuf>,
    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> Result<()> {
    quickpick::init();
    let cli = Cli::parse();

    if let Some(dir) = &cli.cwd {
        env::set_current_dir(dir)
            .with_context(|| format!("failed to change directory to {}", dir.display()))?;
    }

    let config = Config::load()?;
    if cli.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let cwd = env::current_dir().context("unable to determine working directory")?;
    let mut host = ScriptHost::new(cwd);
    let mode = if let Some(path) = &cli.lines {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        host = host.with_buffer_lines(text.lines().map(str::to_owned).collect());
        PickerMode::BufferLines
    } else if !cli.colors.is_empty() {
        host = host.with_colorschemes(cli.colors.clone());
        PickerMode::Colorschemes
    } else {
        PickerMode::Files
    };

    let platform = Platform::detect()?;
    let quick_open = QuickOpen::new(MenuState::default(), host, platform, config);
    let mut app = UiApp::new(quick_open, mode);
    app.run()?;

    for action in app.take_actions() {
        println!("{action}");
    }
    Ok(())
}
