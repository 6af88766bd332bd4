fn main() {
    if let Err(err) = part_splitter::run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
