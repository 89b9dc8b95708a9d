use log::{LevelFilter, Log, Metadata, Record};

pub struct StudioLogger;

impl Log for StudioLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let location = match (record.file(), record.line()) {
                (Some(file), Some(line)) => format!("{}:{}", file, line),
                (Some(file), None) => file.to_string(),
                (None, _) => String::from("unknown location"),
            };

            println!(
                "[{level}][{target}][{location}] {message}",
                level = record.level(),
                target = record.target(),
                location = location,
                message = record.args()
            );
        }
    }

    fn flush(&self) {}
}

pub fn init(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    static LOGGER: StudioLogger = StudioLogger;
    log::set_logger(&LOGGER).map(|()| log::set_max_level(level))
}
