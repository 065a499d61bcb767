fn main() {
    if let Err(err) = meshview::app::run() {
        log::error!("{}", err);
        std::process::exit(1);
    }
}
