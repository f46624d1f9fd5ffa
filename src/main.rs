//! Binary entry point: resolve configuration, start file logging, open the
//! database and hand control to the terminal UI.
use ticket_desk::{init_logging, run_app, App, Config, Desk};

fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_logging(&config.log_path)?;
    tracing::info!(db = %config.db_path.display(), "starting ticket desk");

    let desk = Desk::open(&config)?;
    let mut app = App::new(desk)?;
    run_app(&mut app)
}
