//! Engine and sessions
//!
//! An [`Engine`] owns the keyspace, the command registry, the replication
//! stream and the configuration. Clients talk to it through a [`Session`],
//! which remembers the selected database and runs one command at a time.
//!
//! ## Lifecycle
//!
//! 1. Open the engine (`open`, `open_with_config`, `ephemeral`)
//! 2. Load modules with [`Engine::load_module`]
//! 3. Replay the append-only log with [`Engine::load_append_only`], once
//!    every module its commands may need is loaded
//! 4. Serve sessions
//!
//! Top-level commands are serialized by the engine. A module handler runs
//! with no lock held, so its nested `Call`s dispatch like any other command.

use std::path::Path;
use std::sync::Arc;

use ember_core::resp::parse_frame;
use ember_core::{Context, Error, Frame, ModuleString, OnLoadFn, Result};
use ember_storage::{Clock, Keyspace, SystemClock};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::capabilities::get_api;
use crate::config::{EngineConfig, CONFIG_FILE_NAME};
use crate::dispatch;
use crate::invocation::{HostFrame, InvocationReport, LoadFrame};
use crate::propagate::Propagated;
use crate::registry::{CommandRegistry, ModuleInfo};
use crate::replication::{read_log, AppendOnlyLog, ReplicationStream};

/// State shared by the engine, its sessions and running invocations.
pub(crate) struct Shared {
    pub keyspace: Mutex<Keyspace>,
    pub registry: RwLock<CommandRegistry>,
    pub replication: Mutex<ReplicationStream>,
    pub last_report: Mutex<Option<InvocationReport>>,
    /// Held by a session for the whole of one top-level command
    pub exec_lock: Mutex<()>,
    pub config: EngineConfig,
}

impl Shared {
    /// Hand one top-level command's effects to the replication stream.
    ///
    /// Keys that expired while the command ran are propagated first, as
    /// `DEL`s, so replicas never depend on their own clocks.
    fn propagate(&self, batch: Vec<Propagated>) {
        let expired = self.keyspace.lock().drain_expired();
        if expired.is_empty() && batch.is_empty() {
            return;
        }
        let mut entries: Vec<Propagated> = expired
            .into_iter()
            .map(|key| Propagated::new(key.db, vec![b"DEL".to_vec(), key.key]))
            .collect();
        entries.extend(batch);
        self.replication.lock().append(entries);
    }
}

/// The host engine.
///
/// Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct Engine {
    shared: Arc<Shared>,
}

impl Engine {
    /// Open an engine configured by `ember.toml` in `dir`.
    ///
    /// Writes a default config file if none exists. A relative
    /// `appendonly` path is resolved against `dir`.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let config_path = dir.join(CONFIG_FILE_NAME);
        EngineConfig::write_default_if_missing(&config_path)?;
        let config = EngineConfig::from_file(&config_path)?;
        Self::build(Some(dir), config, Arc::new(SystemClock))
    }

    /// Open an engine in `dir` with an explicit configuration.
    ///
    /// The configuration is written to `ember.toml` so a later
    /// [`Engine::open`] picks up the same settings.
    pub fn open_with_config<P: AsRef<Path>>(dir: P, config: EngineConfig) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        config.validate()?;
        config.write_to_file(&dir.join(CONFIG_FILE_NAME))?;
        Self::build(Some(dir), config, Arc::new(SystemClock))
    }

    /// An in-memory engine with the default configuration and no
    /// append-only log.
    pub fn ephemeral() -> Result<Self> {
        Self::with_clock(EngineConfig::default(), Arc::new(SystemClock))
    }

    /// An engine driven by the given clock. `appendonly` is used as given.
    pub fn with_clock(config: EngineConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        Self::build(None, config, clock)
    }

    fn build(dir: Option<&Path>, config: EngineConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        let log = match &config.appendonly {
            Some(path) => {
                let path = match dir {
                    Some(dir) if path.is_relative() => dir.join(path),
                    _ => path.clone(),
                };
                Some(AppendOnlyLog::open(&path, config.fsync_policy()?)?)
            }
            None => None,
        };
        let shared = Shared {
            keyspace: Mutex::new(Keyspace::new(config.databases, clock)),
            registry: RwLock::new(CommandRegistry::new()),
            replication: Mutex::new(ReplicationStream::new(config.backlog_capacity, log)),
            last_report: Mutex::new(None),
            exec_lock: Mutex::new(()),
            config,
        };
        debug!(target: "ember::config", databases = shared.config.databases, "engine opened");
        Ok(Engine {
            shared: Arc::new(shared),
        })
    }

    /// Load a module by running its entry point.
    ///
    /// Commands the entry point creates are staged and registered only if
    /// it returns `Status::Ok` after declaring itself with
    /// `SetModuleAttribs`. A failed load leaves no trace. It reports the
    /// first load-time call the host rejected, or `ModuleLoadFailed` when
    /// the entry point failed on its own.
    pub fn load_module(&self, on_load: OnLoadFn, args: &[&str]) -> Result<()> {
        let _serial = self.shared.exec_lock.lock();
        let args: Vec<ModuleString> = args.iter().map(|arg| ModuleString::from(*arg)).collect();
        let frame = LoadFrame {
            attribs: None,
            staged: Vec::new(),
            failure: None,
            shared: self.shared.clone(),
        };
        let mut ctx = Context::new(get_api, Box::new(HostFrame::Load(frame)));

        let status = on_load(&mut ctx, &args);

        let frame = match ctx.into_host_state().downcast::<HostFrame>().map(|frame| *frame) {
            Ok(HostFrame::Load(frame)) => frame,
            _ => unreachable!("module context lost its load frame"),
        };
        if !status.is_ok() {
            warn!(
                target: "ember::module",
                module = frame.attribs.as_ref().map(|a| a.name.as_str()),
                "module entry point failed"
            );
            return Err(frame.failure.unwrap_or_else(|| Error::ModuleLoadFailed {
                reason: "entry point returned an error".to_string(),
            }));
        }
        let attribs = frame.attribs.ok_or_else(|| Error::ModuleLoadFailed {
            reason: "module never declared its name".to_string(),
        })?;
        self.shared.registry.write().commit_module(attribs, frame.staged)
    }

    /// Every loaded module, in load order
    pub fn modules(&self) -> Vec<ModuleInfo> {
        self.shared.registry.read().modules().to_vec()
    }

    /// Open a client session on database 0
    pub fn session(&self) -> Session {
        Session {
            shared: self.shared.clone(),
            db: 0,
        }
    }

    /// Replay the append-only log into the keyspace.
    ///
    /// Replayed commands are not propagated again. Returns the number of
    /// commands replayed.
    pub fn load_append_only(&self) -> Result<usize> {
        let Some(path) = self.shared.replication.lock().log_path() else {
            return Ok(0);
        };
        let commands = read_log(&path)?;
        let _serial = self.shared.exec_lock.lock();
        let mut db = 0;
        let mut replayed = 0;
        for argv in commands {
            let name = &argv[0];
            if name.eq_ignore_ascii_case(b"MULTI") || name.eq_ignore_ascii_case(b"EXEC") {
                continue;
            }
            let executed = dispatch::execute(&self.shared, &mut db, argv);
            if executed.reply.first() == Some(&b'-') {
                let reply = String::from_utf8_lossy(&executed.reply);
                warn!(
                    target: "ember::propagate",
                    reply = %reply.trim_end(),
                    "append-only log entry failed on replay"
                );
            }
            replayed += 1;
        }
        self.shared.keyspace.lock().drain_expired();
        info!(target: "ember::propagate", path = %path.display(), replayed, "append-only log replayed");
        Ok(replayed)
    }

    /// Entries most recently sent to replicas, oldest first
    pub fn replication_backlog(&self) -> Vec<Vec<Vec<u8>>> {
        self.shared.replication.lock().backlog()
    }

    /// Total entries ever propagated
    pub fn replication_offset(&self) -> u64 {
        self.shared.replication.lock().offset()
    }

    /// Remove every key whose deadline passed and propagate the removals.
    /// Returns the number of keys removed.
    pub fn active_expire_cycle(&self) -> usize {
        let _serial = self.shared.exec_lock.lock();
        let removed = self.shared.keyspace.lock().active_expire_cycle();
        self.shared.propagate(Vec::new());
        removed
    }

    /// Report of the most recent module invocation
    pub fn last_invocation_report(&self) -> Option<InvocationReport> {
        self.shared.last_report.lock().clone()
    }

    /// The configuration the engine runs with
    pub fn config(&self) -> &EngineConfig {
        &self.shared.config
    }
}

/// A client connection's view of the engine.
pub struct Session {
    shared: Arc<Shared>,
    db: usize,
}

impl Session {
    /// Run one command and decode its reply.
    pub fn execute<A: AsRef<[u8]>>(&mut self, argv: &[A]) -> Frame {
        let raw = self.execute_raw(argv);
        match parse_frame(&raw) {
            Ok((frame, _)) => frame,
            Err(e) => Frame::Error(format!("ERR malformed reply: {}", e)),
        }
    }

    /// Run one command and return its encoded reply.
    pub fn execute_raw<A: AsRef<[u8]>>(&mut self, argv: &[A]) -> Vec<u8> {
        let argv: Vec<Vec<u8>> = argv.iter().map(|arg| arg.as_ref().to_vec()).collect();
        let _serial = self.shared.exec_lock.lock();
        let executed = dispatch::execute(&self.shared, &mut self.db, argv);
        self.shared.propagate(executed.propagation);
        executed.reply
    }

    /// Currently selected database
    pub fn db(&self) -> usize {
        self.db
    }
}
