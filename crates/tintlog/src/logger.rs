//! The logger facade.
//!
//! A [`Logger`] owns one pipeline: level gate, renderer, console sink,
//! buffer, handlers and transports. [`Logger::scope`] returns a handle to the
//! same pipeline with a longer prefix.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tintlog_buffer::{BufferStats, ExportError, ExportFormat, ExportOptions, LogBuffer, LogFilter, export_with};
use tintlog_console::{
    ConsoleSink, Environment, OutputMode, OutputTarget, Preset, ProcessEnvironment, RenderSettings, Rendered,
    Renderer, StderrConsole, StyleConfig, Theme, detect,
};
use tintlog_core::{GroupInfo, Level, LogRecord, SerializerRegistry, SourceLocation, Value, log_handler};
use tintlog_transport::{TransportError, TransportManager};

use crate::config::LoggerConfig;

/// What a handler sees besides the record itself.
#[derive(Debug, Clone, Copy)]
pub struct HandlerContext<'a> {
    /// The line that was sent to the console.
    pub rendered: &'a Rendered,
    pub target: OutputTarget,
}

/// Callback invoked for every emitted record.
pub type Handler = Arc<dyn Fn(&LogRecord, &HandlerContext<'_>) + Send + Sync>;

/// Token returned by [`Logger::add_handler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

struct State {
    level: Level,
    mode: OutputMode,
    target: OutputTarget,
    settings: RenderSettings,
    buffering: bool,
}

struct Shared {
    state: RwLock<State>,
    renderer: Renderer,
    buffer: Mutex<LogBuffer>,
    groups: Mutex<Vec<Option<String>>>,
    handlers: RwLock<Vec<(HandlerId, Handler)>>,
    next_handler: AtomicU64,
    transports: TransportManager,
    registry: Arc<SerializerRegistry>,
    export_defaults: ExportOptions,
    console: Arc<dyn ConsoleSink>,
    env: Arc<dyn Environment>,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Builder for a [`Logger`] with non-default collaborators.
pub struct LoggerBuilder {
    config: LoggerConfig,
    console: Option<Arc<dyn ConsoleSink>>,
    env: Option<Arc<dyn Environment>>,
    registry: Option<Arc<SerializerRegistry>>,
}

impl LoggerBuilder {
    #[must_use]
    pub fn new(config: LoggerConfig) -> Self {
        Self {
            config,
            console: None,
            env: None,
            registry: None,
        }
    }

    /// Where rendered lines go. Defaults to stderr.
    #[must_use]
    pub fn console(mut self, console: Arc<dyn ConsoleSink>) -> Self {
        self.console = Some(console);
        self
    }

    /// Environment used for output detection. Defaults to the process.
    #[must_use]
    pub fn environment(mut self, env: Arc<dyn Environment>) -> Self {
        self.env = Some(env);
        self
    }

    /// Serializer registry for exports and transports.
    #[must_use]
    pub fn registry(mut self, registry: SerializerRegistry) -> Self {
        self.registry = Some(Arc::new(registry));
        self
    }

    #[must_use]
    pub fn build(self) -> Logger {
        let config = self.config;
        let env = self.env.unwrap_or_else(|| Arc::new(ProcessEnvironment));
        let console = self.console.unwrap_or_else(|| Arc::new(StderrConsole::new()));
        let registry = self.registry.unwrap_or_else(|| Arc::new(SerializerRegistry::new()));
        let serializer = config.serializer_options();

        let state = State {
            level: config.level,
            mode: config.mode,
            target: OutputTarget::resolve(config.mode, env.as_ref()),
            settings: config.render_settings(),
            buffering: config.buffer,
        };
        let shared = Shared {
            state: RwLock::new(state),
            renderer: Renderer::new(),
            buffer: Mutex::new(LogBuffer::new(config.buffer_size)),
            groups: Mutex::new(Vec::new()),
            handlers: RwLock::new(Vec::new()),
            next_handler: AtomicU64::new(1),
            transports: TransportManager::with_registry(Arc::clone(&registry), serializer.clone()),
            registry,
            export_defaults: ExportOptions::default().serializer(serializer),
            console,
            env,
        };
        Logger {
            shared: Arc::new(shared),
            prefix: None,
        }
    }
}

/// Handle to a logging pipeline. Clones share everything.
#[derive(Clone)]
pub struct Logger {
    shared: Arc<Shared>,
    prefix: Option<String>,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(LoggerConfig::default())
    }
}

impl Logger {
    /// A logger writing to stderr with detection against the process.
    #[must_use]
    pub fn new(config: LoggerConfig) -> Self {
        LoggerBuilder::new(config).build()
    }

    #[must_use]
    pub fn builder(config: LoggerConfig) -> LoggerBuilder {
        LoggerBuilder::new(config)
    }

    // ------------------------------------------------------------------
    // Emission
    // ------------------------------------------------------------------

    pub fn debug(&self, message: impl Into<String>) -> Option<Arc<LogRecord>> {
        self.log(Level::Debug, message, Vec::new())
    }

    pub fn info(&self, message: impl Into<String>) -> Option<Arc<LogRecord>> {
        self.log(Level::Info, message, Vec::new())
    }

    pub fn warn(&self, message: impl Into<String>) -> Option<Arc<LogRecord>> {
        self.log(Level::Warn, message, Vec::new())
    }

    pub fn error(&self, message: impl Into<String>) -> Option<Arc<LogRecord>> {
        self.log(Level::Error, message, Vec::new())
    }

    pub fn critical(&self, message: impl Into<String>) -> Option<Arc<LogRecord>> {
        self.log(Level::Critical, message, Vec::new())
    }

    /// Emit a record with arguments. Returns the record, or `None` if the
    /// level gate dropped it.
    pub fn log(&self, level: Level, message: impl Into<String>, args: Vec<Value>) -> Option<Arc<LogRecord>> {
        self.emit(level, message.into(), args, None)
    }

    /// Like [`Logger::log`] with an explicit call site.
    pub fn log_at(
        &self,
        level: Level,
        message: impl Into<String>,
        args: Vec<Value>,
        location: SourceLocation,
    ) -> Option<Arc<LogRecord>> {
        self.emit(level, message.into(), args, Some(location))
    }

    /// Whether a record at `level` would be emitted.
    #[must_use]
    pub fn enabled(&self, level: Level) -> bool {
        level >= read(&self.shared.state).level
    }

    fn emit(
        &self,
        level: Level,
        message: String,
        args: Vec<Value>,
        location: Option<SourceLocation>,
    ) -> Option<Arc<LogRecord>> {
        let (settings, target, buffering) = {
            let state = read(&self.shared.state);
            if level < state.level {
                return None;
            }
            (state.settings.clone(), state.target, state.buffering)
        };

        let mut record = LogRecord::new(level, message).with_args(args);
        if let Some(prefix) = &self.prefix {
            record = record.with_prefix(prefix.clone());
        }
        if let Some(location) = location {
            record = record.with_location(location);
        }
        if let Some(group) = self.current_group() {
            record = record.with_group(group);
        }
        let record = Arc::new(record);

        let rendered = self.shared.renderer.render(&record, &settings, target);
        self.shared.console.emit(level, &rendered);

        if buffering {
            lock(&self.shared.buffer).push(Arc::clone(&record));
        }

        self.notify_handlers(&record, &HandlerContext {
            rendered: &rendered,
            target,
        });
        self.shared.transports.write(&record);
        Some(record)
    }

    fn notify_handlers(&self, record: &LogRecord, ctx: &HandlerContext<'_>) {
        let handlers: Vec<(HandlerId, Handler)> = read(&self.shared.handlers).clone();
        for (id, handler) in handlers {
            if catch_unwind(AssertUnwindSafe(|| handler(record, ctx))).is_err() {
                log_handler!("handler {} panicked on {}; skipped", id.0, record.id);
            }
        }
    }

    // ------------------------------------------------------------------
    // Prefixes and groups
    // ------------------------------------------------------------------

    /// A child logger whose prefix is this one's joined with `prefix` by `:`.
    #[must_use]
    pub fn scope(&self, prefix: &str) -> Self {
        let prefix = match &self.prefix {
            Some(parent) => format!("{parent}:{prefix}"),
            None => prefix.to_string(),
        };
        Self {
            shared: Arc::clone(&self.shared),
            prefix: Some(prefix),
        }
    }

    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Open a group. Records emitted until [`Logger::group_end`] are nested
    /// one level deeper.
    pub fn group(&self, name: Option<&str>) {
        lock(&self.shared.groups).push(name.map(str::to_string));
    }

    /// Close the innermost group. Returns `false` if none was open.
    pub fn group_end(&self) -> bool {
        lock(&self.shared.groups).pop().is_some()
    }

    #[must_use]
    pub fn group_depth(&self) -> usize {
        lock(&self.shared.groups).len()
    }

    fn current_group(&self) -> Option<GroupInfo> {
        let groups = lock(&self.shared.groups);
        let name = groups.last()?.clone();
        Some(GroupInfo {
            depth: groups.len(),
            name,
        })
    }

    // ------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------

    #[must_use]
    pub fn level(&self) -> Level {
        read(&self.shared.state).level
    }

    pub fn set_level(&self, level: Level) {
        write(&self.shared.state).level = level;
    }

    /// Switch theme. Unknown names use `default`.
    pub fn set_theme(&self, name: &str) {
        write(&self.shared.state).settings.theme = Theme::by_name(name);
        self.shared.renderer.invalidate();
    }

    pub fn set_style(&self, style: StyleConfig) {
        write(&self.shared.state).settings.style = style;
        self.shared.renderer.invalidate();
    }

    pub fn set_preset(&self, preset: Option<Preset>) {
        write(&self.shared.state).settings.preset = preset;
        self.shared.renderer.invalidate();
    }

    /// Change the output mode and re-run detection.
    pub fn set_output_mode(&self, mode: OutputMode) {
        let target = OutputTarget::resolve(mode, self.shared.env.as_ref());
        {
            let mut state = write(&self.shared.state);
            state.mode = mode;
            state.target = target;
        }
        self.shared.renderer.invalidate();
    }

    #[must_use]
    pub fn output_mode(&self) -> OutputMode {
        read(&self.shared.state).mode
    }

    #[must_use]
    pub fn output_target(&self) -> OutputTarget {
        read(&self.shared.state).target
    }

    /// What auto-detection would pick right now.
    #[must_use]
    pub fn detected_target(&self) -> OutputTarget {
        detect(self.shared.env.as_ref())
    }

    #[must_use]
    pub fn settings(&self) -> RenderSettings {
        read(&self.shared.state).settings.clone()
    }

    #[must_use]
    pub fn renderer(&self) -> &Renderer {
        &self.shared.renderer
    }

    // ------------------------------------------------------------------
    // Handlers
    // ------------------------------------------------------------------

    /// Register a callback run after each record is rendered and buffered.
    pub fn add_handler<F>(&self, handler: F) -> HandlerId
    where
        F: Fn(&LogRecord, &HandlerContext<'_>) + Send + Sync + 'static,
    {
        let id = HandlerId(self.shared.next_handler.fetch_add(1, Ordering::Relaxed));
        write(&self.shared.handlers).push((id, Arc::new(handler)));
        id
    }

    pub fn remove_handler(&self, id: HandlerId) -> bool {
        let mut handlers = write(&self.shared.handlers);
        let before = handlers.len();
        handlers.retain(|(h, _)| *h != id);
        handlers.len() != before
    }

    #[must_use]
    pub fn handler_count(&self) -> usize {
        read(&self.shared.handlers).len()
    }

    // ------------------------------------------------------------------
    // Buffer
    // ------------------------------------------------------------------

    /// Direct access to the buffer. Do not log while holding the guard.
    pub fn buffer(&self) -> MutexGuard<'_, LogBuffer> {
        lock(&self.shared.buffer)
    }

    pub fn set_buffering(&self, enabled: bool) {
        write(&self.shared.state).buffering = enabled;
    }

    #[must_use]
    pub fn records(&self) -> Vec<Arc<LogRecord>> {
        self.buffer().records()
    }

    #[must_use]
    pub fn query(&self, filter: &LogFilter) -> Vec<Arc<LogRecord>> {
        self.buffer().query(filter)
    }

    #[must_use]
    pub fn stats(&self) -> BufferStats {
        self.buffer().stats()
    }

    pub fn clear_buffer(&self) {
        self.buffer().clear();
    }

    /// Resize the buffer; returns the applied (clamped) capacity.
    pub fn set_buffer_size(&self, size: usize) -> usize {
        self.buffer().set_capacity(size)
    }

    /// Export the buffered records matching `filter`. Styled output uses the
    /// current theme unless `options` names one.
    pub fn export(
        &self,
        filter: &LogFilter,
        format: ExportFormat,
        options: Option<&ExportOptions>,
    ) -> Result<String, ExportError> {
        let records = self.query(filter);
        let mut options = options.unwrap_or(&self.shared.export_defaults).clone();
        if options.theme.is_none() {
            options.theme = Some(read(&self.shared.state).settings.theme.clone());
        }
        export_with(&records, format, &options, &self.shared.registry)
    }

    // ------------------------------------------------------------------
    // Transports
    // ------------------------------------------------------------------

    #[must_use]
    pub fn transports(&self) -> &TransportManager {
        &self.shared.transports
    }

    /// Flush every transport.
    pub async fn flush(&self) -> Vec<(String, TransportError)> {
        self.shared.transports.flush_all().await
    }

    /// Flush, close and unregister every transport.
    pub async fn close(&self) -> Vec<(String, TransportError)> {
        self.shared.transports.close_all().await
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = read(&self.shared.state);
        f.debug_struct("Logger")
            .field("prefix", &self.prefix)
            .field("level", &state.level)
            .field("target", &state.target)
            .field("theme", &state.settings.theme.name)
            .field("preset", &state.settings.preset)
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────
// Process-wide Logger
// ─────────────────────────────────────────────────────────

static LOGGER: OnceLock<Logger> = OnceLock::new();

/// The process-wide logger, built from the environment on first use.
#[must_use]
pub fn logger() -> &'static Logger {
    LOGGER.get_or_init(|| Logger::new(LoggerConfig::from_env()))
}

/// Initialize the process-wide logger with specific settings.
/// Must be called before [`logger`]; returns error if already initialized.
pub fn init_logger(config: LoggerConfig) -> Result<&'static Logger, &'static str> {
    LOGGER
        .set(Logger::new(config))
        .map_err(|_| "Logger already initialized")?;
    Ok(logger())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tintlog_console::testing::TestConsole;
    use tintlog_console::{Part, StaticEnvironment};

    fn plain_logger(config: LoggerConfig) -> (Logger, TestConsole) {
        let console = TestConsole::new();
        let logger = Logger::builder(config.mode(OutputMode::Plain).timestamps(false))
            .console(Arc::new(console.clone()))
            .environment(Arc::new(StaticEnvironment::new()))
            .build();
        (logger, console)
    }

    #[test]
    fn test_level_gate() {
        let (logger, console) = plain_logger(LoggerConfig::new().level(Level::Warn));
        assert!(logger.info("hidden").is_none());
        assert!(logger.warn("shown").is_some());
        assert_eq!(console.output().len(), 1);
        assert_eq!(logger.records().len(), 1);

        logger.set_level(Level::Debug);
        assert!(logger.debug("now visible").is_some());
    }

    #[test]
    fn test_scope_joins_prefixes() {
        let (logger, console) = plain_logger(LoggerConfig::new());
        let db = logger.scope("db");
        let pool = db.scope("pool");
        let record = pool.info("exhausted").unwrap();
        assert_eq!(record.prefix.as_deref(), Some("db:pool"));
        assert!(console.contains("db:pool"));
        // Scopes share one buffer.
        assert_eq!(logger.records().len(), 1);
    }

    #[test]
    fn test_groups_nest_records() {
        let (logger, _console) = plain_logger(LoggerConfig::new());
        logger.group(Some("startup"));
        logger.group(None);
        let inner = logger.info("inner").unwrap();
        assert_eq!(inner.group.as_ref().map(|g| g.depth), Some(2));
        assert!(logger.group_end());
        let outer = logger.info("outer").unwrap();
        assert_eq!(
            outer.group,
            Some(GroupInfo {
                depth: 1,
                name: Some("startup".into())
            })
        );
        assert!(logger.group_end());
        assert!(!logger.group_end());
        assert!(logger.info("top").unwrap().group.is_none());
    }

    #[test]
    fn test_handler_panic_isolated() {
        let (logger, console) = plain_logger(LoggerConfig::new());
        let seen = Arc::new(AtomicUsize::new(0));
        logger.add_handler(|_, _| panic!("handler bug"));
        let counter = Arc::clone(&seen);
        let id = logger.add_handler(move |record, ctx| {
            assert_eq!(ctx.target, OutputTarget::Plain);
            assert!(!record.message.is_empty());
            counter.fetch_add(1, Ordering::SeqCst);
        });

        logger.error("first");
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(console.output().len(), 1);
        assert_eq!(logger.records().len(), 1);

        assert!(logger.remove_handler(id));
        assert!(!logger.remove_handler(id));
        logger.error("second");
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_set_theme_invalidates_cache() {
        let (logger, _console) = plain_logger(LoggerConfig::new());
        logger.info("a");
        logger.info("b");
        assert!(logger.renderer().cache_stats().hits >= 1);
        logger.set_theme("dracula");
        assert_eq!(logger.renderer().cache_stats().size, 0);
        assert_eq!(logger.settings().theme.name, "dracula");
    }

    #[test]
    fn test_set_style_applies_to_next_emit() {
        let (logger, console) = plain_logger(LoggerConfig::new());
        logger.info("before");
        logger.set_style(
            StyleConfig::default()
                .show(Part::Timestamp, false)
                .show(Part::Level, false),
        );
        logger.info("after");
        assert_eq!(console.output(), vec!["INFO  before", "after"]);
    }

    #[test]
    fn test_set_output_mode_redetects() {
        let console = TestConsole::new();
        let logger = Logger::builder(LoggerConfig::new().mode(OutputMode::Plain))
            .console(Arc::new(console))
            .environment(Arc::new(StaticEnvironment::truecolor_terminal()))
            .build();
        assert_eq!(logger.output_target(), OutputTarget::Plain);
        logger.set_output_mode(OutputMode::Auto);
        assert!(logger.output_target().is_ansi());
        assert_eq!(logger.output_target(), logger.detected_target());
    }

    #[test]
    fn test_buffering_disabled() {
        let (logger, console) = plain_logger(LoggerConfig::new().buffer(false));
        logger.info("not kept");
        assert!(logger.records().is_empty());
        assert_eq!(console.output().len(), 1);
    }

    #[test]
    fn test_export_uses_buffer() {
        let (logger, _console) = plain_logger(LoggerConfig::new());
        logger.info("one");
        logger.error("two");
        let json = logger
            .export(&LogFilter::new().errors_only(), ExportFormat::Json, None)
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 1);
        assert_eq!(parsed[0]["message"], "two");
    }

    #[test]
    fn test_export_styles_with_current_theme() {
        let (logger, _console) = plain_logger(LoggerConfig::new());
        logger.info("themed");
        logger.set_theme("dracula");
        let html = logger.export(&LogFilter::new(), ExportFormat::Html, None).unwrap();
        assert!(html.contains("#8be9fd"));
        let explicit = ExportOptions::new().theme(Theme::default());
        let html = logger
            .export(&LogFilter::new(), ExportFormat::Html, Some(&explicit))
            .unwrap();
        assert!(!html.contains("#8be9fd"));
    }

    #[test]
    fn test_set_buffer_size_clamps() {
        let (logger, _console) = plain_logger(LoggerConfig::new().buffer_size(3));
        for level in [Level::Info, Level::Warn, Level::Error, Level::Critical] {
            logger.log(level, "x", Vec::new());
        }
        let stats = logger.stats();
        assert_eq!(stats.size, 3);
        assert_eq!(stats.counts_by_level.get(Level::Info), 0);
        assert_eq!(logger.set_buffer_size(0), 1);
        assert_eq!(logger.records().len(), 1);
        assert_eq!(logger.records()[0].level, Level::Critical);
    }
}
