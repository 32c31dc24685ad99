fn main() {
    env_logger::init();
    if let Err(err) = algoviz::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
