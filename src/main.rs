fn main() {
    if let Err(err) = well_dashboard::app::run() {
        eprintln!("dashboard client failed: {err}");
        std::process::exit(1);
    }
}
