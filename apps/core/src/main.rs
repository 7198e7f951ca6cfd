fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = match tailpick_core::runtime::parse_cli_args(&args) {
        Ok(options) => options,
        Err(error) if !error.use_stderr() => {
            // --help / --version
            let _ = error.print();
            return;
        }
        Err(error) => {
            eprintln!("[tailpick] {error}");
            std::process::exit(2);
        }
    };

    if let Err(error) = tailpick_core::logging::init() {
        eprintln!("[tailpick] logging disabled: {error}");
    }

    if let Err(error) = tailpick_core::runtime::run_with_options(options) {
        tracing::error!(%error, "runtime failed");
        eprintln!("[tailpick] runtime failed: {error}");
        std::process::exit(1);
    }
}
