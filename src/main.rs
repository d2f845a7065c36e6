use clap::Parser;
use colored::*;
use shadowtidy::cli::{Cli, run_cli};
use shadowtidy::safety::prompt_confirm;
use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let result = run_cli(&cli, |root| {
        println!("{}", format!("Target folder: {}", root.display()).cyan());
        prompt_confirm(
            "Proceed to organize this folder?",
            &mut io::stdin().lock(),
            &mut io::stdout(),
        )
    });

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "✗".red(), e.to_string().yellow());
            ExitCode::FAILURE
        }
    }
}
