//! Binary entry point: read the config, start file logging, open the store
//! and drive the Ratatui event loop until the user exits.
use lease_navigator::config::CONFIG_FILE_NAME;
use lease_navigator::logging::init_logging;
use lease_navigator::reminder::SmtpMailer;
use lease_navigator::{data_dir, load_portfolio, open_store, run_app, App, AppConfig};

fn main() -> anyhow::Result<()> {
    let data_dir = data_dir()?;
    let config = AppConfig::load(&data_dir.join(CONFIG_FILE_NAME))?;
    init_logging(&data_dir.join("logs"), &config.logging.level)?;

    let db_path = config.database_path(&data_dir);
    let conn = open_store(&db_path)?;
    let buildings = load_portfolio(&conn)?;
    tracing::info!(
        path = %db_path.display(),
        buildings = buildings.len(),
        "loaded portfolio"
    );

    let transport = Box::new(SmtpMailer::new(config.mail.clone()));
    let mut app = App::new(conn, buildings, &config, transport);
    let result = run_app(&mut app);
    if let Err(err) = &result {
        tracing::error!(error = %format!("{err:#}"), "terminal session failed");
    }
    result
}
