use std::path::PathBuf;

/// Initialize logging. Returns the guard that flushes the non-blocking writer.
pub fn init_log(log: Option<PathBuf>) -> tracing_appender::non_blocking::WorkerGuard {
    let subscriber_builder = tracing_subscriber::fmt::Subscriber::builder()
        .with_ansi(false)
        .with_file(true)
        .with_line_number(true)
        .with_thread_names(true);
    let (non_blocking, guard) = if let Some(log) = log {
        // output to file, daily rotate, non-blocking
        if !log.is_dir() {
            panic!("log path is not a directory");
        }
        let file_appender = tracing_appender::rolling::daily(log, "course_server.log");
        tracing_appender::non_blocking(file_appender)
    } else {
        // output to stdout
        tracing_appender::non_blocking(std::io::stdout())
    };
    // tests may install the subscriber more than once
    let _ = tracing::subscriber::set_global_default(
        subscriber_builder.with_writer(non_blocking).finish(),
    );
    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_logging_uses_the_given_directory() {
        let dir = std::env::temp_dir().join("course_server_log_test");
        std::fs::create_dir_all(&dir).unwrap();
        let _guard = init_log(Some(dir));
    }

    #[test]
    #[should_panic(expected = "log path is not a directory")]
    fn missing_log_directory_is_rejected() {
        let _guard = init_log(Some(PathBuf::from("/no/such/log/directory")));
    }
}
