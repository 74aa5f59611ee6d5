fn main() {
    if let Err(error) = gleaner_cli::run() {
        // Tracing is initialized inside run() after argument parsing.
        tracing::error!("{error:#}");
        std::process::exit(1);
    }
}
