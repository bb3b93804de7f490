use chrono::{Local, NaiveDate};
use std::fmt;
use std::path::Path;
use tracing::{Event, Level, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Day-file line layout: `message (timestamp)`, with the level in front
/// of anything that is not INFO.
struct DayFileFormat;

impl<S, N> FormatEvent<S, N> for DayFileFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let level = *event.metadata().level();
        if level != Level::INFO {
            write!(writer, "{} ", level)?;
        }
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer, " ({})", Local::now().format("%Y-%m-%d %H:%M:%S%.6f"))
    }
}

/// Appender for `<log_dir>/<day>.txt`.
///
/// The file is picked once from the local calendar date the run started on
/// (`Rotation::DAILY` would roll on the UTC date), so a match that runs past
/// midnight stays in the file it started in.
fn day_file(log_dir: &Path, day: NaiveDate) -> Result<RollingFileAppender, String> {
    std::fs::create_dir_all(log_dir).map_err(|e| e.to_string())?;
    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(day.format("%Y-%m-%d").to_string())
        .filename_suffix("txt")
        .build(log_dir)
        .map_err(|e| e.to_string())
}

/// Console logging plus one `<YYYY-MM-DD>.txt` file per local day in `log_dir`.
///
/// Keep the returned guard alive until exit so buffered lines are flushed.
/// If the directory is unusable, only console logging is set up.
pub fn init(log_dir: &Path) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let appender = day_file(log_dir, Local::now().date_naive());

    let (file_layer, guard, file_error) = match appender {
        Ok(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .event_format(DayFileFormat);
            (Some(layer), Some(guard), None)
        }
        Err(e) => (None, None, Some(e)),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(file_layer)
        .init();

    if let Some(e) = file_error {
        tracing::warn!(
            "Could not use log directory {} ({}), file logging disabled",
            log_dir.display(),
            e
        );
    }

    guard
}
