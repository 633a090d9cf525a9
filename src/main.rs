fn main() {
    if let Err(err) = smart_ingest::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
