use anyhow::Result;
use ghtrack::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    ghtrack::logging::init(cli.common.verbose);
    cli.execute()
}
