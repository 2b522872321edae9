fn main() {
    if let Err(err) = well_dashboard::app::run_mock_api() {
        eprintln!("mock api startup failed: {err}");
        std::process::exit(1);
    }
}
