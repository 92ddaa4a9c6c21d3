use tracing_subscriber::EnvFilter;

/// Initialize console logging plus an optional daily-rotating log file.
pub fn init_logging() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,settler=debug"));

    // File logging only when a directory is configured (prefer
    // SETTLER_LOG_DIR, fallback to LOG_DIR).
    let log_dir = std::env::var("SETTLER_LOG_DIR")
        .or_else(|_| std::env::var("LOG_DIR"))
        .ok();

    // Important: `tracing_appender::rolling::daily` will panic if it can't
    // create the initial log file, so writability must be preflighted.
    let file_layer = log_dir.as_deref().and_then(|dir| {
        if std::fs::create_dir_all(dir).is_err() {
            eprintln!("Warning: Could not create log directory {dir}, file logging disabled");
            return None;
        }
        let test_path = std::path::Path::new(dir).join(".settler_write_test");
        match std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&test_path)
        {
            Ok(_) => {
                let _ = std::fs::remove_file(&test_path);

                let file_appender = tracing_appender::rolling::daily(dir, "settler.log");
                let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

                // Keep the guard alive for the life of the process
                Box::leak(Box::new(guard));

                Some(
                    tracing_subscriber::fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false)
                        .with_target(true),
                )
            }
            Err(e) => {
                eprintln!(
                    "Warning: Could not write to log directory {dir} ({e}), file logging disabled"
                );
                None
            }
        }
    });

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();
}
