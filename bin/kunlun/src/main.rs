use kunlun_cmd::initialize_tracing_log;

fn main() {
    initialize_tracing_log();
    if let Err(err) = kunlun_cmd::run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}
