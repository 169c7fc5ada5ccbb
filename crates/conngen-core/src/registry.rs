// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Provider registry.

Lets several description engines and several engine object types coexist in
one process:

- **Libraries** are named factories turning a textual description (or a file)
  into a [`ProviderHandle`]. Either entry point may be absent.
- **Adapters** are `(is_recognized, adapt)` pairs probed in registration
  order; the first adapter recognizing a candidate object wraps it into a
  [`ConnectionGenerator`].

Parsers and adapters run inside the provider critical section but outside the
registry's own lock, so they may query the registry themselves.

A process-wide instance is managed by [`install`], [`global`],
[`global_or_init`] and [`teardown`].
*/

use std::any::Any;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ConnGenError, ConnGenResult};
use crate::generator::ConnectionGenerator;
use crate::handle::ProviderHandle;
use crate::lock;
use crate::provider::ConnectionSet;

/// Text entry point of a library
pub type ParseTextFn = Arc<dyn Fn(&str) -> ConnGenResult<ProviderHandle> + Send + Sync>;

/// File entry point of a library
pub type ParseFileFn = Arc<dyn Fn(&Path) -> ConnGenResult<ProviderHandle> + Send + Sync>;

/// How `parse_file` treats a library that registered no file parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileParseMode {
    /// Read the file and hand its contents to the text parser
    #[default]
    ReadContents,
    /// Hand the path itself to the text parser
    PassPath,
    /// Fail with `Unsupported`
    Reject,
}

impl FileParseMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileParseMode::ReadContents => "read_contents",
            FileParseMode::PassPath => "pass_path",
            FileParseMode::Reject => "reject",
        }
    }
}

impl FromStr for FileParseMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "read_contents" => Ok(FileParseMode::ReadContents),
            "pass_path" => Ok(FileParseMode::PassPath),
            "reject" => Ok(FileParseMode::Reject),
            other => Err(format!(
                "unknown file mode '{}' (expected read_contents, pass_path or reject)",
                other
            )),
        }
    }
}

impl fmt::Display for FileParseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named provider with optional text and file entry points
#[derive(Clone)]
pub struct ProviderLibrary {
    name: String,
    parse_text: Option<ParseTextFn>,
    parse_file: Option<ParseFileFn>,
}

impl ProviderLibrary {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parse_text: None,
            parse_file: None,
        }
    }

    pub fn with_text_parser<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> ConnGenResult<ProviderHandle> + Send + Sync + 'static,
    {
        self.parse_text = Some(Arc::new(f));
        self
    }

    pub fn with_file_parser<F>(mut self, f: F) -> Self
    where
        F: Fn(&Path) -> ConnGenResult<ProviderHandle> + Send + Sync + 'static,
    {
        self.parse_file = Some(Arc::new(f));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_text_parser(&self) -> bool {
        self.parse_text.is_some()
    }

    pub fn has_file_parser(&self) -> bool {
        self.parse_file.is_some()
    }
}

impl fmt::Debug for ProviderLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderLibrary")
            .field("name", &self.name)
            .field("text", &self.parse_text.is_some())
            .field("file", &self.parse_file.is_some())
            .finish()
    }
}

/// Type probe for engine-native objects
pub trait GeneratorAdapter: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    fn is_recognized(&self, candidate: &dyn Any) -> bool;

    /// Wrap a recognized candidate; only called after `is_recognized` accepted it
    fn adapt(&self, candidate: &dyn Any) -> ConnGenResult<ConnectionGenerator>;
}

type ProbeFn = Box<dyn Fn(&dyn Any) -> bool + Send + Sync>;
type AdaptFn = Box<dyn Fn(&dyn Any) -> ConnGenResult<ConnectionGenerator> + Send + Sync>;

/// Adapter built from a pair of closures
pub struct FnAdapter {
    name: String,
    probe: ProbeFn,
    adapt: AdaptFn,
}

impl FnAdapter {
    pub fn new<P, A>(name: impl Into<String>, probe: P, adapt: A) -> Self
    where
        P: Fn(&dyn Any) -> bool + Send + Sync + 'static,
        A: Fn(&dyn Any) -> ConnGenResult<ConnectionGenerator> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            probe: Box::new(probe),
            adapt: Box::new(adapt),
        }
    }
}

impl GeneratorAdapter for FnAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_recognized(&self, candidate: &dyn Any) -> bool {
        (self.probe)(candidate)
    }

    fn adapt(&self, candidate: &dyn Any) -> ConnGenResult<ConnectionGenerator> {
        (self.adapt)(candidate)
    }
}

/// Recognizes handles and shared sets produced by any registered library
pub struct HandleAdapter;

impl GeneratorAdapter for HandleAdapter {
    fn name(&self) -> &str {
        "handle"
    }

    fn is_recognized(&self, candidate: &dyn Any) -> bool {
        candidate.is::<ProviderHandle>() || candidate.is::<Arc<dyn ConnectionSet>>()
    }

    fn adapt(&self, candidate: &dyn Any) -> ConnGenResult<ConnectionGenerator> {
        if let Some(handle) = candidate.downcast_ref::<ProviderHandle>() {
            return Ok(ConnectionGenerator::new(handle.clone()));
        }
        if let Some(set) = candidate.downcast_ref::<Arc<dyn ConnectionSet>>() {
            return Ok(ConnectionGenerator::from_set(Arc::clone(set)));
        }
        Err(ConnGenError::Unsupported(
            "handle adapter cannot wrap this object".to_string(),
        ))
    }
}

struct RegistryState {
    libraries: Vec<ProviderLibrary>,
    adapters: Vec<Arc<dyn GeneratorAdapter>>,
    default_library: Option<String>,
    file_mode: FileParseMode,
}

/// Libraries and type adapters known to the process
pub struct GeneratorRegistry {
    state: RwLock<RegistryState>,
}

impl GeneratorRegistry {
    /// Registry with the built-in [`HandleAdapter`] and no libraries
    pub fn new() -> Self {
        Self {
            state: RwLock::new(RegistryState {
                libraries: Vec::new(),
                adapters: vec![Arc::new(HandleAdapter)],
                default_library: None,
                file_mode: FileParseMode::default(),
            }),
        }
    }

    /// Register a library, replacing any library with the same name
    pub fn register_library(&self, library: ProviderLibrary) {
        let mut state = self.state.write();
        let text = library.has_text_parser();
        let file = library.has_file_parser();
        if let Some(existing) = state
            .libraries
            .iter_mut()
            .find(|l| l.name == library.name)
        {
            info!("Replacing connectivity library '{}'", library.name);
            *existing = library;
        } else {
            info!(
                "Registered connectivity library '{}' (text: {}, file: {})",
                library.name, text, file
            );
            state.libraries.push(library);
        }
    }

    /// Append a type adapter; adapters are probed in registration order
    pub fn register_adapter(&self, adapter: Arc<dyn GeneratorAdapter>) {
        info!("Registered generator adapter '{}'", adapter.name());
        self.state.write().adapters.push(adapter);
    }

    /// Register a `(is_recognized, adapt)` closure pair
    pub fn register_type<P, A>(&self, name: impl Into<String>, probe: P, adapt: A)
    where
        P: Fn(&dyn Any) -> bool + Send + Sync + 'static,
        A: Fn(&dyn Any) -> ConnGenResult<ConnectionGenerator> + Send + Sync + 'static,
    {
        self.register_adapter(Arc::new(FnAdapter::new(name, probe, adapt)));
    }

    /// Library used when callers pass no name; `None` selects the first registered
    pub fn set_default_library(&self, name: Option<String>) {
        self.state.write().default_library = name;
    }

    pub fn default_library(&self) -> Option<String> {
        self.state.read().default_library.clone()
    }

    pub fn set_file_mode(&self, mode: FileParseMode) {
        self.state.write().file_mode = mode;
    }

    pub fn file_mode(&self) -> FileParseMode {
        self.state.read().file_mode
    }

    pub fn library_names(&self) -> Vec<String> {
        self.state
            .read()
            .libraries
            .iter()
            .map(|l| l.name.clone())
            .collect()
    }

    pub fn adapter_names(&self) -> Vec<String> {
        self.state
            .read()
            .adapters
            .iter()
            .map(|a| a.name().to_string())
            .collect()
    }

    /// Build an engine object from a textual description
    pub fn parse_text(&self, library: Option<&str>, text: &str) -> ConnGenResult<ProviderHandle> {
        let lib = self.resolve(library)?;
        let parser = lib.parse_text.ok_or_else(|| {
            ConnGenError::Unsupported(format!("library '{}' cannot parse text", lib.name))
        })?;
        debug!("Parsing text description with library '{}'", lib.name);
        let _guard = lock::acquire();
        parser(text)
    }

    /// Build an engine object from a description file
    ///
    /// Libraries without a file parser are handled according to [`FileParseMode`].
    pub fn parse_file(&self, library: Option<&str>, path: &Path) -> ConnGenResult<ProviderHandle> {
        let lib = self.resolve(library)?;
        if let Some(parser) = lib.parse_file {
            debug!("Parsing {} with library '{}'", path.display(), lib.name);
            let _guard = lock::acquire();
            return parser(path);
        }

        let mode = self.file_mode();
        let text_parser = match (mode, lib.parse_text) {
            (FileParseMode::Reject, _) | (_, None) => {
                return Err(ConnGenError::Unsupported(format!(
                    "library '{}' cannot parse files",
                    lib.name
                )))
            }
            (_, Some(parser)) => parser,
        };
        let text = match mode {
            FileParseMode::PassPath => path
                .to_str()
                .ok_or_else(|| {
                    ConnGenError::Unsupported(format!(
                        "path {} is not valid UTF-8 and cannot be passed to library '{}'",
                        path.display(),
                        lib.name
                    ))
                })?
                .to_string(),
            _ => std::fs::read_to_string(path)?,
        };
        debug!(
            "Parsing {} as text with library '{}' ({})",
            path.display(),
            lib.name,
            mode
        );
        let _guard = lock::acquire();
        text_parser(&text)
    }

    /// True if some registered adapter understands `candidate`
    pub fn is_recognized(&self, candidate: &dyn Any) -> bool {
        let adapters = self.adapters();
        let _guard = lock::acquire();
        adapters.iter().any(|a| a.is_recognized(candidate))
    }

    /// Wrap `candidate` with the first adapter recognizing it
    ///
    /// Returns `Ok(None)` when no adapter recognizes the object.
    pub fn unpack(&self, candidate: &dyn Any) -> ConnGenResult<Option<ConnectionGenerator>> {
        let adapters = self.adapters();
        let _guard = lock::acquire();
        for adapter in &adapters {
            if adapter.is_recognized(candidate) {
                debug!("Unpacking object with adapter '{}'", adapter.name());
                return adapter.adapt(candidate).map(Some);
            }
        }
        Ok(None)
    }

    /// Drop every library and adapter registration
    pub fn clear(&self) {
        let (libraries, adapters) = {
            let mut state = self.state.write();
            (
                std::mem::take(&mut state.libraries),
                std::mem::take(&mut state.adapters),
            )
        };
        let _guard = lock::acquire();
        drop(libraries);
        drop(adapters);
    }

    fn adapters(&self) -> Vec<Arc<dyn GeneratorAdapter>> {
        self.state.read().adapters.clone()
    }

    fn resolve(&self, name: Option<&str>) -> ConnGenResult<ProviderLibrary> {
        let state = self.state.read();
        if state.libraries.is_empty() {
            return Err(ConnGenError::ProviderUnavailable(
                "no connectivity library registered".to_string(),
            ));
        }
        let wanted = name.map(str::to_string).or_else(|| state.default_library.clone());
        match wanted {
            Some(wanted) => state
                .libraries
                .iter()
                .find(|l| l.name == wanted)
                .cloned()
                .ok_or(ConnGenError::UnknownLibrary(wanted)),
            None => Ok(state.libraries[0].clone()),
        }
    }
}

impl Default for GeneratorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("GeneratorRegistry")
            .field("libraries", &state.libraries)
            .field("adapters", &state.adapters.len())
            .field("default_library", &state.default_library)
            .field("file_mode", &state.file_mode)
            .finish()
    }
}

/// Process-wide registry, set up once by the host
static GLOBAL: Lazy<Mutex<Option<Arc<GeneratorRegistry>>>> = Lazy::new(|| Mutex::new(None));

/// Install `registry` as the process-wide instance, replacing any previous one
pub fn install(registry: GeneratorRegistry) -> Arc<GeneratorRegistry> {
    let registry = Arc::new(registry);
    let _guard = lock::acquire();
    let previous = GLOBAL.lock().replace(Arc::clone(&registry));
    if previous.is_some() {
        info!("Replaced process-wide generator registry");
    } else {
        info!("Installed process-wide generator registry");
    }
    registry
}

/// The process-wide registry
///
/// # Errors
/// `ProviderUnavailable` until [`install`] or [`global_or_init`] succeeded.
pub fn global() -> ConnGenResult<Arc<GeneratorRegistry>> {
    GLOBAL.lock().clone().ok_or_else(|| {
        ConnGenError::ProviderUnavailable("generator registry not initialized".to_string())
    })
}

/// The process-wide registry, running `loader` once if none is installed
///
/// The loader runs inside the provider critical section. A failing loader
/// leaves nothing installed, so a later call may retry.
pub fn global_or_init<F>(loader: F) -> ConnGenResult<Arc<GeneratorRegistry>>
where
    F: FnOnce() -> ConnGenResult<GeneratorRegistry>,
{
    let _guard = lock::acquire();
    if let Some(existing) = GLOBAL.lock().clone() {
        return Ok(existing);
    }
    match loader() {
        Ok(registry) => {
            let registry = Arc::new(registry);
            *GLOBAL.lock() = Some(Arc::clone(&registry));
            info!("Initialized process-wide generator registry");
            Ok(registry)
        }
        Err(e) => {
            warn!("Generator registry initialization failed: {}", e);
            Err(match e {
                ConnGenError::ProviderUnavailable(_) => e,
                other => ConnGenError::ProviderUnavailable(other.to_string()),
            })
        }
    }
}

/// Release the process-wide registry; returns `false` if none was installed
pub fn teardown() -> bool {
    let _guard = lock::acquire();
    let Some(registry) = GLOBAL.lock().take() else {
        return false;
    };
    registry.clear();
    info!("Generator registry torn down");
    true
}
