use {
    sizeroller::{global, LogConfig},
    tracing_subscriber::util::SubscriberInitExt,
};

/// Reads the logging section of a service config. A bad value or an
/// unwritable directory degrades to console-only logging instead of
/// stopping the service.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config: LogConfig = toml::from_str(
        r#"
path = "./logs/service/app.log"
max_bytes = 10485760
backup_count = 10
"#,
    )?;

    let output = global::init(&config);
    tracing_subscriber::fmt()
        .with_writer(output.clone())
        .with_ansi(false)
        .finish()
        .try_init()?;

    if let Some(err) = output.fallback_error() {
        tracing::warn!(error = %err, "file logging disabled");
    }
    tracing::info!("Standardized logging configured");

    global::shutdown()?;
    Ok(())
}
