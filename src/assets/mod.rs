pub mod obj;

use obj::{ObjError, ObjModel};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// Where a model came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadSource {
    /// Bundled model read at startup.
    DefaultAsset(PathBuf),
    /// File the user picked in the dialog.
    File(PathBuf),
}

impl LoadSource {
    pub fn path(&self) -> &Path {
        match self {
            LoadSource::DefaultAsset(path) | LoadSource::File(path) => path,
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, LoadSource::DefaultAsset(_))
    }

    pub fn display_name(&self) -> String {
        self.path()
            .file_name()
            .and_then(|value| value.to_str())
            .unwrap_or("model")
            .to_string()
    }
}

impl fmt::Display for LoadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path().display())
    }
}

/// A parsed model ready to be installed into the scene.
#[derive(Debug, Clone)]
pub struct DecodedModel {
    pub name: String,
    pub source: LoadSource,
    /// Hex SHA-256 of the raw file bytes.
    pub digest: String,
    pub model: ObjModel,
}

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to read model at {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: ObjError,
    },
    #[error("a model load is already in progress: {pending}")]
    Busy { pending: String },
    #[error("failed to start model loader thread: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("model loader thread stopped without a result")]
    WorkerLost,
}

/// Text decoding used for model files: ISO-8859-1, one byte per code point.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&byte| byte as char).collect()
}

pub fn load_model_bytes(bytes: &[u8], source: LoadSource) -> Result<DecodedModel, AssetError> {
    let text = decode_latin1(bytes);
    let model = obj::parse(&text).map_err(|source_err| AssetError::Parse {
        path: source.to_string(),
        source: source_err,
    })?;
    let digest = Sha256::digest(bytes)
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect::<String>();
    Ok(DecodedModel {
        name: source.display_name(),
        source,
        digest,
        model,
    })
}

pub fn load_model(source: &LoadSource) -> Result<DecodedModel, AssetError> {
    let path = source.path();
    let bytes = std::fs::read(path).map_err(|err| AssetError::Read {
        path: path.display().to_string(),
        source: err,
    })?;
    load_model_bytes(&bytes, source.clone())
}

/// Relative paths that do not exist under the working directory are looked up
/// next to the crate manifest, where the bundled models live.
pub fn resolve_asset_path(path: &Path) -> PathBuf {
    if path.is_absolute() || path.exists() {
        return path.to_path_buf();
    }
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(path)
}

#[derive(Debug)]
pub struct LoadOutcome {
    pub source: LoadSource,
    pub result: Result<DecodedModel, AssetError>,
}

struct PendingLoad {
    source: LoadSource,
    receiver: mpsc::Receiver<Result<DecodedModel, AssetError>>,
}

/// Reads and decodes models off the main thread, one at a time.
#[derive(Default)]
pub struct ModelLoader {
    pending: Option<PendingLoad>,
}

impl ModelLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending_source(&self) -> Option<&LoadSource> {
        self.pending.as_ref().map(|pending| &pending.source)
    }

    /// Starts a background load. Refuses while another load is still running.
    pub fn request(&mut self, source: LoadSource) -> Result<(), AssetError> {
        if let Some(pending) = &self.pending {
            return Err(AssetError::Busy {
                pending: pending.source.to_string(),
            });
        }

        let (tx, rx) = mpsc::channel();
        let worker_source = source.clone();
        thread::Builder::new()
            .name("model-loader".to_string())
            .spawn(move || {
                let result = load_model(&worker_source);
                let _ = tx.send(result);
            })
            .map_err(AssetError::Spawn)?;

        log::info!("Loading model: {}", source);
        self.pending = Some(PendingLoad {
            source,
            receiver: rx,
        });
        Ok(())
    }

    /// Non-blocking; returns the finished load, if any.
    pub fn poll(&mut self) -> Option<LoadOutcome> {
        let pending = self.pending.as_ref()?;
        let result = match pending.receiver.try_recv() {
            Ok(result) => result,
            Err(mpsc::TryRecvError::Empty) => return None,
            Err(mpsc::TryRecvError::Disconnected) => Err(AssetError::WorkerLost),
        };
        self.finish(result)
    }

    /// Blocks up to `timeout` for the pending load.
    pub fn wait(&mut self, timeout: Duration) -> Option<LoadOutcome> {
        let pending = self.pending.as_ref()?;
        let result = match pending.receiver.recv_timeout(timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => return None,
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(AssetError::WorkerLost),
        };
        self.finish(result)
    }

    fn finish(&mut self, result: Result<DecodedModel, AssetError>) -> Option<LoadOutcome> {
        let pending = self.pending.take()?;
        Some(LoadOutcome {
            source: pending.source,
            result,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE: &str = "o tri\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";

    #[test]
    fn latin1_maps_every_byte_to_the_same_code_point() {
        let text = decode_latin1(&[b'o', b' ', 0xe9, 0xff]);
        assert_eq!(text, "o \u{e9}\u{ff}");
        assert_eq!(text.chars().count(), 4);
    }

    #[test]
    fn high_bytes_in_names_do_not_break_parsing() {
        let mut bytes = b"o caf".to_vec();
        bytes.push(0xe9);
        bytes.extend_from_slice(b"\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n");
        let decoded =
            load_model_bytes(&bytes, LoadSource::File(PathBuf::from("cafe.obj"))).unwrap();
        assert_eq!(decoded.model.meshes[0].name, "caf\u{e9}");
    }

    #[test]
    fn decoded_model_carries_name_and_digest() {
        let decoded = load_model_bytes(
            TRIANGLE.as_bytes(),
            LoadSource::File(PathBuf::from("/tmp/models/bunny.obj")),
        )
        .unwrap();
        assert_eq!(decoded.name, "bunny.obj");
        assert_eq!(decoded.digest.len(), 64);
        assert!(decoded.digest.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(decoded.model.triangle_count(), 1);
    }

    #[test]
    fn parse_errors_name_the_source() {
        let err = load_model_bytes(b"v 0 0\n", LoadSource::File(PathBuf::from("bad.obj")))
            .unwrap_err();
        match err {
            AssetError::Parse { path, .. } => assert_eq!(path, "bad.obj"),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = LoadSource::File(dir.path().join("missing.obj"));
        assert!(matches!(load_model(&source), Err(AssetError::Read { .. })));
    }

    #[test]
    fn loader_rejects_a_second_request_while_busy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tri.obj");
        std::fs::write(&path, TRIANGLE).unwrap();

        let mut loader = ModelLoader::new();
        loader.request(LoadSource::File(path.clone())).unwrap();
        assert!(loader.is_busy());
        let second = loader.request(LoadSource::File(dir.path().join("other.obj")));
        assert!(matches!(second, Err(AssetError::Busy { .. })));
        assert_eq!(loader.pending_source(), Some(&LoadSource::File(path.clone())));

        let outcome = loader.wait(Duration::from_secs(10)).expect("load finished");
        assert_eq!(outcome.source, LoadSource::File(path));
        assert!(outcome.result.is_ok());
        assert!(!loader.is_busy());

        loader
            .request(LoadSource::File(dir.path().join("other.obj")))
            .unwrap();
        let outcome = loader.wait(Duration::from_secs(10)).expect("load finished");
        assert!(matches!(outcome.result, Err(AssetError::Read { .. })));
    }

    #[test]
    fn poll_without_pending_load_is_none() {
        let mut loader = ModelLoader::new();
        assert!(loader.poll().is_none());
        assert!(loader.wait(Duration::from_millis(1)).is_none());
    }

    #[test]
    fn bundled_default_models_load() {
        for path in crate::config::ViewerConfig::default().default_models {
            let source = LoadSource::DefaultAsset(resolve_asset_path(&path));
            let decoded = load_model(&source).unwrap_or_else(|err| panic!("{err}"));
            assert!(decoded.model.triangle_count() >= 4, "{}", decoded.name);
            assert!(decoded.model.bounds().is_some());
        }
    }

    #[test]
    fn bundled_relative_paths_resolve_under_the_manifest() {
        let resolved = resolve_asset_path(Path::new("models/does-not-exist.obj"));
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("models/does-not-exist.obj"));
    }
}
