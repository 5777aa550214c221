//! lumidb e2e - golden-file test harness for the lumidb CLI
//!
//! Runs txtar test archives against the database binary and reports which
//! ones produce their expected output.

use clap::Parser;
use lumidb_e2e::commands::RunArgs;
use lumidb_e2e::common::config::Config;
use lumidb_e2e::common::logging;
use lumidb_e2e::testing::{run_suite, Harness, Registry};
use lumidb_e2e::Result;

#[derive(Parser)]
#[command(name = "lumidb-e2e", about = "Golden-file e2e tests for lumidb")]
#[command(version, long_about = None)]
struct Cli {
    #[command(flatten)]
    args: RunArgs,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    match run(cli.args).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

/// Run the selected suite, returning whether every unit passed
async fn run(args: RunArgs) -> Result<bool> {
    let mut config = Config::load(args.config.as_deref())?;
    args.apply(&mut config);

    logging::init_cli(config.logging.style, args.verbose);

    let registry = if config.suite.data_dir.is_dir() {
        Registry::discover(&config.suite.data_dir)?
    } else {
        tracing::warn!(
            "data dir {} not found, only archive paths can be selected",
            config.suite.data_dir.display()
        );
        Registry::new()
    };
    let harness = Harness::from_config(&config);
    let options = args.run_options(&config);

    let summary = run_suite(&harness, &registry, &args.selectors(), &options).await;

    if args.json {
        println!("{}", summary.to_json()?);
    } else {
        summary.print();
    }

    Ok(summary.all_passed())
}
