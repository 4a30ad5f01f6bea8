fn main() {
    if let Err(err) = map_labels::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
