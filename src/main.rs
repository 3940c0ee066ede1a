fn main() {
    if let Err(err) = attendance_audit::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
