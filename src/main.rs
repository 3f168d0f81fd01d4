fn main() {
    if let Err(e) = medtriage_lib::run() {
        eprintln!("medtriage: {e}");
        std::process::exit(1);
    }
}
