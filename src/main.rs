use clap::{CommandFactory, Parser};
use clap_complete::generate;
use miette::Result;

use launchlab::cli::{Cli, Commands};

fn main() -> Result<()> {
    // Install miette's fancy error handler for readable diagnostics
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Fire(args) => launchlab::cli::commands::fire::run(args),
        Commands::Analyze(args) => launchlab::cli::commands::analyze::run(args),
        Commands::Chart(args) => launchlab::cli::commands::chart::run(args),
        Commands::Doe(cmd) => launchlab::cli::commands::doe::run(cmd),
        Commands::Completions(args) => {
            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "launchlab", &mut std::io::stdout());
            Ok(())
        }
    }
}
