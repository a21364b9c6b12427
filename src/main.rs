use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use clap::Parser;
use tracing::Level;

use typeblock::components::ComponentDatabase;
use typeblock::scenario::Scenario;
use typeblock::{EditorConfig, EditorSession, Workspace};

#[derive(Parser, Debug)]
#[command(author, version, about = "Replay a quick-entry editing scenario and print the program graph as JSON", long_about = None)]
struct Cli {
    /// Scenario JSON file
    #[arg(value_name = "SCENARIO")]
    scenario: Utf8PathBuf,

    /// Editor configuration JSON file
    #[arg(long, value_name = "FILE")]
    config: Option<Utf8PathBuf>,

    /// Component type database JSON file (defaults to the built-in set)
    #[arg(long, value_name = "FILE")]
    components: Option<Utf8PathBuf>,

    /// Log level for diagnostics on stderr
    #[arg(long, default_value = "warn")]
    log_level: Level,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => EditorConfig::from_json_file(path)?,
        None => EditorConfig::default(),
    };
    let component_db = match &cli.components {
        Some(path) => {
            let text = std::fs::read_to_string(path).with_context(|| format!("Read {}", path))?;
            ComponentDatabase::from_json(&text).with_context(|| format!("Parse components {}", path))?
        }
        None => ComponentDatabase::builtin().clone(),
    };

    let scenario = Scenario::from_json_file(&cli.scenario)?;
    let mut session = EditorSession::with_workspace(Workspace::new(component_db), config);
    let report = scenario
        .run(&mut session)
        .with_context(|| format!("Run scenario {}", cli.scenario))?;

    let json = serde_json::to_string_pretty(&report)?;
    println!("{}", json);
    Ok(())
}
