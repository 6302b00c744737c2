fn main() {
    if let Err(err) = csv_schema_audit::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
