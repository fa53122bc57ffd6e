use tavern::{App, AppSettings};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = AppSettings::from_args(std::env::args().skip(1));
    log::info!("Starting demo '{}'", settings.initial_demo.name());

    if let Err(e) = App::new().with_settings(settings).run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}
