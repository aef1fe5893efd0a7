use dashboard::app;
use dashboard::config::Config;
use dashboard::data::DashboardData;

/// Main entry point for the dashboard web server
///
/// Reads settings from the environment (see [`Config::from_env`]), fills the
/// dashboard with demo content for today and serves it until interrupted.
///
/// # Returns
/// * `Result<(), Box<dyn std::error::Error>>` - Success or error object
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env();
    let data = DashboardData::sample(chrono::Local::now().date_naive());

    log::info!(
        "Starting dashboard with {} records and {} charts",
        data.records.len(),
        data.charts.len()
    );
    app::run(config, data).await
}
