use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Initialisiere JSON Logging auf stdout.
///
/// Im Lambda-Modus wird synchron geschrieben, damit beim Einfrieren der
/// Execution Environment keine Zeilen im Puffer hängen bleiben. Für die
/// lokalen Modi läuft stdout über den non-blocking Writer; der zurückgegebene
/// Guard muss bis zum Prozessende gehalten werden.
pub fn init_logging(non_blocking: bool) -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let (writer, guard) = if non_blocking {
        let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());
        (BoxMakeWriter::new(writer), Some(guard))
    } else {
        (BoxMakeWriter::new(std::io::stdout), None)
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .json()
                .with_current_span(true)
                .with_span_list(false),
        )
        .init();

    tracing::info!(non_blocking, "Logging initialized");

    guard
}
