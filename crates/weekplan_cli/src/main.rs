use clap::Parser;

fn main() {
    let cli = weekplan_cli::Cli::parse();
    if let Err(err) = weekplan_cli::run(cli) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
