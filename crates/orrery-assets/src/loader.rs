//! Worker-pool asset loader with main-thread completions.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use orrery_geometry::Typeface;

use crate::error::AssetError;
use crate::source::{AssetSource, Fetcher};
use crate::texture::{CubeTextureData, TextureData, decode_cube, decode_texture};

pub type RequestId = u64;

/// How long [`AssetLoader::shutdown`] waits for a worker that is mid-load
/// before detaching it.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(200);

/// What a request produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Texture,
    CubeTexture,
    Font,
}

/// A load to perform on a worker thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetRequest {
    Texture(AssetSource),
    /// Six faces in `+X, -X, +Y, -Y, +Z, -Z` order.
    CubeTexture(Vec<AssetSource>),
    Font(AssetSource),
}

impl AssetRequest {
    pub fn texture(reference: &str, root: &Path) -> Self {
        Self::Texture(AssetSource::resolve(reference, root))
    }

    pub fn cube<S: AsRef<str>>(faces: &[S], root: &Path) -> Self {
        Self::CubeTexture(
            faces
                .iter()
                .map(|f| AssetSource::resolve(f.as_ref(), root))
                .collect(),
        )
    }

    pub fn font(reference: &str, root: &Path) -> Self {
        Self::Font(AssetSource::resolve(reference, root))
    }

    pub fn kind(&self) -> AssetKind {
        match self {
            Self::Texture(_) => AssetKind::Texture,
            Self::CubeTexture(_) => AssetKind::CubeTexture,
            Self::Font(_) => AssetKind::Font,
        }
    }

    fn display_name(&self) -> String {
        match self {
            Self::Texture(source) | Self::Font(source) => source.display_name(),
            Self::CubeTexture(faces) => faces
                .first()
                .map(|f| format!("{} (+{} faces)", f.display_name(), faces.len() - 1))
                .unwrap_or_else(|| "empty cube".to_string()),
        }
    }

    /// Performs the blocking read and decode.
    fn execute(&self, fetcher: &Fetcher) -> Result<Asset, AssetError> {
        match self {
            Self::Texture(source) => {
                let bytes = fetcher.read_bytes(source)?;
                decode_texture(&source.display_name(), &bytes).map(Asset::Texture)
            }
            Self::CubeTexture(sources) => {
                if sources.len() != 6 {
                    return Err(AssetError::CubeFaceCount(sources.len()));
                }
                let faces = sources
                    .iter()
                    .map(|source| {
                        let bytes = fetcher.read_bytes(source)?;
                        decode_texture(&source.display_name(), &bytes)
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                decode_cube(faces).map(Asset::CubeTexture)
            }
            Self::Font(source) => {
                let bytes = fetcher.read_bytes(source)?;
                Typeface::from_slice(&bytes)
                    .map(|typeface| Asset::Font(Arc::new(typeface)))
                    .map_err(|err| AssetError::Font {
                        name: source.display_name(),
                        source: err,
                    })
            }
        }
    }
}

/// A loaded asset.
#[derive(Debug, Clone)]
pub enum Asset {
    Texture(TextureData),
    CubeTexture(CubeTextureData),
    Font(Arc<Typeface>),
}

impl Asset {
    pub fn kind(&self) -> AssetKind {
        match self {
            Self::Texture(_) => AssetKind::Texture,
            Self::CubeTexture(_) => AssetKind::CubeTexture,
            Self::Font(_) => AssetKind::Font,
        }
    }
}

struct LoadTask {
    id: RequestId,
    request: AssetRequest,
}

struct LoadResult {
    id: RequestId,
    name: String,
    asset: Result<Asset, AssetError>,
}

type Completion<C> = Box<dyn FnOnce(Asset, &mut C)>;

/// Loads assets on a small thread pool and hands them back on the main thread.
///
/// Completions receive `&mut C`, the caller's scene context, when
/// [`poll`](Self::poll) runs them. A failed load logs a warning and its
/// completion is dropped without running.
pub struct AssetLoader<C> {
    root: PathBuf,
    task_sender: Option<crossbeam_channel::Sender<LoadTask>>,
    result_receiver: crossbeam_channel::Receiver<LoadResult>,
    worker_handles: Vec<JoinHandle<()>>,
    cancelled: Arc<AtomicBool>,
    pending: HashMap<RequestId, Completion<C>>,
    next_id: RequestId,
}

impl<C> AssetLoader<C> {
    /// Spawns `worker_count` loader threads (at least one). Relative
    /// references resolve under `root`.
    pub fn new(root: impl Into<PathBuf>, worker_count: usize) -> Self {
        Self::with_fetcher(root, worker_count, Fetcher::default())
    }

    /// Like [`new`](Self::new), reading through `fetcher`.
    pub fn with_fetcher(root: impl Into<PathBuf>, worker_count: usize, fetcher: Fetcher) -> Self {
        let (task_tx, task_rx) = crossbeam_channel::unbounded::<LoadTask>();
        let (result_tx, result_rx) = crossbeam_channel::unbounded();
        let cancelled = Arc::new(AtomicBool::new(false));

        let worker_count = worker_count.max(1);
        let mut handles = Vec::with_capacity(worker_count);
        for _ in 0..worker_count {
            let rx = task_rx.clone();
            let tx = result_tx.clone();
            let cancelled = Arc::clone(&cancelled);
            let fetcher = fetcher.clone();
            handles.push(std::thread::spawn(move || {
                while let Ok(task) = rx.recv() {
                    // Queued work is abandoned once the loader shuts down.
                    if cancelled.load(Ordering::Acquire) {
                        break;
                    }
                    let _ = tx.send(LoadResult {
                        id: task.id,
                        name: task.request.display_name(),
                        asset: task.request.execute(&fetcher),
                    });
                }
            }));
        }

        Self {
            root: root.into(),
            task_sender: Some(task_tx),
            result_receiver: result_rx,
            worker_handles: handles,
            cancelled,
            pending: HashMap::new(),
            next_id: 0,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Queues `request`; `on_complete` runs during a later [`poll`](Self::poll).
    ///
    /// Returns `None` once the loader has been shut down.
    pub fn load(
        &mut self,
        request: AssetRequest,
        on_complete: impl FnOnce(Asset, &mut C) + 'static,
    ) -> Option<RequestId> {
        let sender = self.task_sender.as_ref()?;
        let id = self.next_id;
        self.next_id += 1;
        sender.send(LoadTask { id, request }).ok()?;
        self.pending.insert(id, Box::new(on_complete));
        Some(id)
    }

    pub fn load_texture(
        &mut self,
        reference: &str,
        on_loaded: impl FnOnce(TextureData, &mut C) + 'static,
    ) -> Option<RequestId> {
        let request = AssetRequest::texture(reference, &self.root);
        self.load(request, move |asset, ctx| {
            if let Asset::Texture(texture) = asset {
                on_loaded(texture, ctx);
            }
        })
    }

    pub fn load_cube_texture<S: AsRef<str>>(
        &mut self,
        faces: &[S],
        on_loaded: impl FnOnce(CubeTextureData, &mut C) + 'static,
    ) -> Option<RequestId> {
        let request = AssetRequest::cube(faces, &self.root);
        self.load(request, move |asset, ctx| {
            if let Asset::CubeTexture(cube) = asset {
                on_loaded(cube, ctx);
            }
        })
    }

    pub fn load_font(
        &mut self,
        reference: &str,
        on_loaded: impl FnOnce(Arc<Typeface>, &mut C) + 'static,
    ) -> Option<RequestId> {
        let request = AssetRequest::font(reference, &self.root);
        self.load(request, move |asset, ctx| {
            if let Asset::Font(font) = asset {
                on_loaded(font, ctx);
            }
        })
    }

    /// Runs completions for every finished load. Called once per frame on the
    /// main thread. Returns the number of completions that ran.
    pub fn poll(&mut self, ctx: &mut C) -> usize {
        let mut completed = 0;
        while let Ok(result) = self.result_receiver.try_recv() {
            let Some(on_complete) = self.pending.remove(&result.id) else {
                continue;
            };
            match result.asset {
                Ok(asset) => {
                    tracing::debug!(name = %result.name, kind = ?asset.kind(), "asset loaded");
                    on_complete(asset, ctx);
                    completed += 1;
                }
                Err(err) => tracing::warn!(name = %result.name, "asset load failed: {err}"),
            }
        }
        completed
    }

    /// Loads queued or in flight.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Stops the workers. Queued loads are skipped, and a worker still
    /// blocked on a read after a short grace period is detached; the fetch
    /// timeouts end it later. Pending completions are dropped.
    pub fn shutdown(&mut self) {
        self.cancelled.store(true, Ordering::Release);
        self.task_sender.take();

        let deadline = Instant::now() + SHUTDOWN_GRACE;
        for handle in self.worker_handles.drain(..) {
            while !handle.is_finished() && Instant::now() < deadline {
                std::thread::sleep(Duration::from_millis(2));
            }
            if handle.is_finished() {
                let _ = handle.join();
            } else {
                tracing::debug!("detaching asset worker blocked on a load");
            }
        }
        self.pending.clear();
    }
}

impl<C> Drop for AssetLoader<C> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;
    use crate::source::tests::stalled_server;
    use crate::texture::tests::png_bytes;

    #[derive(Default)]
    struct Sink {
        textures: Vec<(u32, u32)>,
        cubes: Vec<u32>,
        fonts: Vec<usize>,
    }

    /// Polls until nothing is pending or a few seconds pass.
    fn poll_all(loader: &mut AssetLoader<Sink>, sink: &mut Sink) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while loader.pending_count() > 0 && Instant::now() < deadline {
            loader.poll(sink);
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_request_kinds() {
        let root = Path::new("assets");
        assert_eq!(AssetRequest::texture("a.png", root).kind(), AssetKind::Texture);
        assert_eq!(
            AssetRequest::cube(&["a.jpg"; 6], root).kind(),
            AssetKind::CubeTexture
        );
        assert_eq!(AssetRequest::font("f.json", root).kind(), AssetKind::Font);
    }

    #[test]
    fn test_texture_completion_runs_on_poll() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tile.png"), png_bytes(4, 2, [9, 9, 9, 255])).unwrap();

        let mut loader = AssetLoader::new(dir.path(), 2);
        let mut sink = Sink::default();
        loader
            .load_texture("tile.png", |texture, sink: &mut Sink| {
                sink.textures.push((texture.width, texture.height));
            })
            .unwrap();
        assert_eq!(loader.pending_count(), 1);
        assert!(sink.textures.is_empty());

        poll_all(&mut loader, &mut sink);
        assert_eq!(sink.textures, vec![(4, 2)]);
        assert_eq!(loader.pending_count(), 0);
    }

    #[test]
    fn test_failed_load_drops_completion() {
        let dir = tempfile::tempdir().unwrap();
        let mut loader = AssetLoader::new(dir.path(), 1);
        let mut sink = Sink::default();
        loader
            .load_texture("missing.png", |texture, sink: &mut Sink| {
                sink.textures.push((texture.width, texture.height));
            })
            .unwrap();

        poll_all(&mut loader, &mut sink);
        assert!(sink.textures.is_empty());
        assert_eq!(loader.pending_count(), 0);
    }

    #[test]
    fn test_cube_texture() {
        let dir = tempfile::tempdir().unwrap();
        let names = ["px.png", "nx.png", "py.png", "ny.png", "pz.png", "nz.png"];
        for name in names {
            std::fs::write(dir.path().join(name), png_bytes(8, 8, [0, 0, 255, 255])).unwrap();
        }

        let mut loader = AssetLoader::new(dir.path(), 2);
        let mut sink = Sink::default();
        loader
            .load_cube_texture(&names, |cube, sink: &mut Sink| sink.cubes.push(cube.size))
            .unwrap();
        poll_all(&mut loader, &mut sink);
        assert_eq!(sink.cubes, vec![8]);
    }

    #[test]
    fn test_font_load() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("font.json"),
            r#"{"resolution": 1000, "glyphs": {"a": {"ha": 500, "o": "m 0 0 l 0 500 l 500 500 z"}}}"#,
        )
        .unwrap();

        let mut loader = AssetLoader::new(dir.path(), 1);
        let mut sink = Sink::default();
        loader
            .load_font("font.json", |font, sink: &mut Sink| {
                sink.fonts.push(font.glyph_count())
            })
            .unwrap();
        poll_all(&mut loader, &mut sink);
        assert_eq!(sink.fonts, vec![1]);
    }

    #[test]
    fn test_shutdown_rejects_new_loads() {
        let dir = tempfile::tempdir().unwrap();
        let mut loader: AssetLoader<Sink> = AssetLoader::new(dir.path(), 1);
        loader.shutdown();
        assert!(loader.load_texture("a.png", |_, _| {}).is_none());
        assert_eq!(loader.pending_count(), 0);
    }

    #[test]
    fn test_shutdown_does_not_wait_for_stalled_fetch() {
        let url = stalled_server();
        let mut loader: AssetLoader<Sink> = AssetLoader::new(Path::new("assets"), 1);
        loader
            .load_font(&url, |font, sink: &mut Sink| sink.fonts.push(font.glyph_count()))
            .unwrap();
        loader
            .load_texture("queued.png", |texture, sink: &mut Sink| {
                sink.textures.push((texture.width, texture.height))
            })
            .unwrap();
        // Let the worker pick up the fetch and block on it.
        std::thread::sleep(Duration::from_millis(100));

        let started = Instant::now();
        loader.shutdown();
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(loader.pending_count(), 0);
    }

    #[test]
    fn test_drop_after_queueing_returns_promptly() {
        let url = stalled_server();
        let started = Instant::now();
        {
            let mut loader: AssetLoader<Sink> = AssetLoader::new(Path::new("assets"), 2);
            for _ in 0..4 {
                loader.load_font(&url, |_, _| {}).unwrap();
            }
        }
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
