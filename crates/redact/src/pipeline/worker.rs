//! Detection across an asynchronous boundary.
//!
//! A [`DetectionClient`] owns one background worker task. Each request gets a
//! correlation id and a slot in the pending table; the worker answers with a
//! [`DetectionResponse`] carrying the same id. Responses whose id is no longer
//! pending (disposed, cancelled, already answered) are dropped.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
};

use image::RgbaImage;
use redact_common::Polygon;
use tokio::{
    sync::{
        mpsc::{error::SendError, unbounded_channel, UnboundedReceiver, UnboundedSender},
        oneshot,
    },
    task::JoinHandle,
};
use tracing::{debug, error, info, warn};

use crate::{
    algorithms::{compute_scale, downscale, EdgeDetector, EdgeDetectorConfig},
    error::{RedactError, Result},
    pipeline::{finalize_polygons, PipelineSettings, DETECTION_UNAVAILABLE},
    traits::Detector,
    types::{DetectOptions, DetectedRegions},
};

/// Builds the detector inside a fresh worker; called again after a backend crash
pub type DetectorFactory = Arc<dyn Fn() -> Result<Box<dyn Detector>> + Send + Sync>;

type Reply = oneshot::Sender<Result<Vec<Polygon>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Image whose ownership moves to the worker.
///
/// Counted as outstanding from creation until it is closed or dropped, on
/// every path: answered, failed, skipped or discarded with the queue.
#[derive(Debug)]
pub struct TransferBitmap {
    image: RgbaImage,
    outstanding: Arc<AtomicUsize>,
}

impl TransferBitmap {
    fn new(image: RgbaImage, outstanding: Arc<AtomicUsize>) -> Self {
        outstanding.fetch_add(1, Ordering::AcqRel);
        Self { image, outstanding }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Release the pixel buffer
    pub fn close(self) {}
}

impl Drop for TransferBitmap {
    fn drop(&mut self) {
        self.outstanding.fetch_sub(1, Ordering::AcqRel);
    }
}

#[derive(Debug)]
pub enum WorkerMessage {
    Detect {
        id: u64,
        bitmap: TransferBitmap,
        options: DetectOptions,
    },
    Exit,
}

/// Worker answer for request `id`
#[derive(Debug)]
pub struct DetectionResponse {
    pub id: u64,
    pub result: Result<Vec<Polygon>>,
}

/// Correlation table of requests still waiting for an answer
#[derive(Clone, Default)]
pub struct PendingRequests {
    inner: Arc<Mutex<HashMap<u64, Reply>>>,
}

impl PendingRequests {
    fn insert(&self, id: u64, reply: Reply) {
        lock(&self.inner).insert(id, reply);
    }

    /// Insert only when nothing else is waiting
    fn insert_if_idle(&self, id: u64, reply: Reply) -> bool {
        let mut map = lock(&self.inner);
        if !map.is_empty() {
            return false;
        }
        map.insert(id, reply);
        true
    }

    fn remove(&self, id: u64) -> Option<Reply> {
        lock(&self.inner).remove(&id)
    }

    pub fn contains(&self, id: u64) -> bool {
        lock(&self.inner).contains_key(&id)
    }

    pub fn len(&self) -> usize {
        lock(&self.inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `response` to its waiter. Returns false for unmatched ids.
    pub fn resolve(&self, response: DetectionResponse) -> bool {
        match self.remove(response.id) {
            Some(reply) => {
                // The caller may have stopped listening; nothing to do then.
                let _ = reply.send(response.result);
                true
            }
            None => {
                warn!(id = response.id, "ignoring stale detection response");
                false
            }
        }
    }

    /// Fail the listed requests that are still waiting, returning how many there were
    pub fn reject(&self, ids: &[u64], error: impl Fn() -> RedactError) -> usize {
        let drained: Vec<Reply> = {
            let mut map = lock(&self.inner);
            ids.iter().filter_map(|id| map.remove(id)).collect()
        };
        let count = drained.len();
        for reply in drained {
            let _ = reply.send(Err(error()));
        }
        count
    }

    /// Fail every waiting request, returning how many there were
    pub fn reject_all(&self, error: impl Fn() -> RedactError) -> usize {
        let drained: Vec<Reply> = lock(&self.inner).drain().map(|(_, reply)| reply).collect();
        let count = drained.len();
        for reply in drained {
            let _ = reply.send(Err(error()));
        }
        count
    }
}

/// Removes the request's slot if the caller stops waiting early
struct PendingGuard<'a> {
    pending: &'a PendingRequests,
    id: u64,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.pending.remove(self.id);
    }
}

struct WorkerHandle {
    tx: UnboundedSender<WorkerMessage>,
    task: JoinHandle<()>,
}

impl WorkerHandle {
    fn spawn(factory: DetectorFactory, pending: PendingRequests) -> Self {
        let (tx, rx) = unbounded_channel::<WorkerMessage>();
        let task = tokio::spawn(worker_loop(rx, factory, pending));
        Self { tx, task }
    }

    fn is_alive(&self) -> bool {
        !self.tx.is_closed() && !self.task.is_finished()
    }
}

/// Close the queue and collect the ids of requests still sitting in it.
///
/// After this returns, sends to this worker fail, so every request it will
/// never answer is in the returned list.
fn close_queue(rx: &mut UnboundedReceiver<WorkerMessage>) -> Vec<u64> {
    rx.close();
    let mut ids = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        if let WorkerMessage::Detect { id, .. } = msg {
            ids.push(id);
        }
    }
    ids
}

async fn worker_loop(
    mut rx: UnboundedReceiver<WorkerMessage>,
    factory: DetectorFactory,
    pending: PendingRequests,
) {
    // Backend construction may block (model loading) or panic.
    let built = tokio::task::spawn_blocking(move || factory())
        .await
        .unwrap_or_else(|join_error| Err(RedactError::Backend(join_error.to_string())));
    let detector: Arc<dyn Detector> = match built {
        Ok(detector) => Arc::from(detector),
        Err(err) => {
            let queued = close_queue(&mut rx);
            let rejected = pending.reject(&queued, || RedactError::Backend(err.to_string()));
            warn!(error = %err, rejected, "detection backend failed to start");
            return;
        }
    };
    debug!(detector = detector.name(), "detection worker started");

    while let Some(msg) = rx.recv().await {
        let (id, bitmap, options) = match msg {
            WorkerMessage::Exit => break,
            WorkerMessage::Detect { id, bitmap, options } => (id, bitmap, options),
        };

        if !pending.contains(id) {
            debug!(id, "request withdrawn before it started");
            bitmap.close();
            continue;
        }

        let detector = detector.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            let result = detector.detect(bitmap.image(), &options);
            bitmap.close();
            result
        })
        .await;

        match outcome {
            Ok(result) => {
                pending.resolve(DetectionResponse { id, result });
            }
            Err(join_error) => {
                let mut owned = close_queue(&mut rx);
                owned.push(id);
                let rejected = pending.reject(&owned, || {
                    RedactError::Backend("detection backend crashed".to_string())
                });
                error!(id, rejected, error = %join_error, "detection backend crashed");
                break;
            }
        }
    }

    debug!("detection worker stopped");
}

/// Request/response front end for a detector running on a background task
pub struct DetectionClient {
    factory: DetectorFactory,
    worker: Mutex<Option<WorkerHandle>>,
    pending: PendingRequests,
    next_id: AtomicU64,
    outstanding: Arc<AtomicUsize>,
    generation: AtomicUsize,
    disposed: AtomicBool,
}

impl DetectionClient {
    /// Start a worker that builds its detector with `factory`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn<F>(factory: F) -> Self
    where
        F: Fn() -> Result<Box<dyn Detector>> + Send + Sync + 'static,
    {
        let factory: DetectorFactory = Arc::new(factory);
        let pending = PendingRequests::default();
        let handle = WorkerHandle::spawn(factory.clone(), pending.clone());
        Self {
            factory,
            worker: Mutex::new(Some(handle)),
            pending,
            next_id: AtomicU64::new(1),
            outstanding: Arc::new(AtomicUsize::new(0)),
            generation: AtomicUsize::new(1),
            disposed: AtomicBool::new(false),
        }
    }

    /// Client backed by the edge detector
    pub fn edge(config: EdgeDetectorConfig) -> Self {
        Self::spawn(move || Ok(Box::new(EdgeDetector::new(config.clone())) as Box<dyn Detector>))
    }

    /// Detect text polygons in `image`, in the coordinate space of `image`
    pub async fn detect(&self, image: RgbaImage, options: DetectOptions) -> Result<Vec<Polygon>> {
        self.submit(image, options, false).await
    }

    /// Like [`detect`](Self::detect), but fails with [`RedactError::Busy`]
    /// instead of queueing behind a request that is still pending
    pub async fn detect_exclusive(
        &self,
        image: RgbaImage,
        options: DetectOptions,
    ) -> Result<Vec<Polygon>> {
        self.submit(image, options, true).await
    }

    async fn submit(
        &self,
        image: RgbaImage,
        options: DetectOptions,
        exclusive: bool,
    ) -> Result<Vec<Polygon>> {
        if self.is_disposed() {
            return Err(RedactError::Disposed);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (reply, response) = oneshot::channel();
        if exclusive {
            if !self.pending.insert_if_idle(id, reply) {
                return Err(RedactError::Busy);
            }
        } else {
            self.pending.insert(id, reply);
        }
        let _guard = PendingGuard {
            pending: &self.pending,
            id,
        };

        let bitmap = TransferBitmap::new(image, self.outstanding.clone());
        self.send_to_worker(WorkerMessage::Detect { id, bitmap, options })?;
        debug!(id, "detection request sent");

        response.await.unwrap_or_else(|_| Err(RedactError::Disposed))
    }

    fn send_to_worker(&self, message: WorkerMessage) -> Result<()> {
        match self.ensure_worker()?.send(message) {
            Ok(()) => Ok(()),
            // The worker shut its queue between the liveness check and the send.
            Err(SendError(message)) => self
                .ensure_worker()?
                .send(message)
                .map_err(|_| RedactError::Backend("detection worker unavailable".to_string())),
        }
    }

    /// Live worker sender, respawning the worker if it has exited
    fn ensure_worker(&self) -> Result<UnboundedSender<WorkerMessage>> {
        let mut slot = lock(&self.worker);
        if self.is_disposed() {
            return Err(RedactError::Disposed);
        }
        if let Some(handle) = slot.as_ref() {
            if handle.is_alive() {
                return Ok(handle.tx.clone());
            }
        }

        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        info!(generation, "respawning detection worker");
        let handle = WorkerHandle::spawn(self.factory.clone(), self.pending.clone());
        let tx = handle.tx.clone();
        *slot = Some(handle);
        Ok(tx)
    }

    /// Requests still waiting for an answer
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Bitmaps handed to the worker and not yet released
    pub fn outstanding_bitmaps(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }

    /// How many workers have been started, including the first
    pub fn worker_generation(&self) -> usize {
        self.generation.load(Ordering::Acquire)
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Stop the worker and reject every pending request with [`RedactError::Disposed`].
    ///
    /// A detection already running finishes in the background; its answer is discarded.
    pub fn dispose(&self) {
        let handle = {
            let mut slot = lock(&self.worker);
            if self.disposed.swap(true, Ordering::AcqRel) {
                return;
            }
            slot.take()
        };
        if let Some(handle) = handle {
            let _ = handle.tx.send(WorkerMessage::Exit);
        }
        let rejected = self.pending.reject_all(|| RedactError::Disposed);
        info!(rejected, "detection client disposed");
    }
}

impl Drop for DetectionClient {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// [`RegionPipeline`](super::RegionPipeline) counterpart whose detector runs on a worker
pub struct AsyncRegionPipeline {
    client: DetectionClient,
    settings: PipelineSettings,
}

impl AsyncRegionPipeline {
    pub fn new(client: DetectionClient, settings: PipelineSettings) -> Self {
        Self { client, settings }
    }

    /// Edge detector on a worker with default settings
    pub fn edge(settings: PipelineSettings) -> Self {
        Self::new(DetectionClient::edge(EdgeDetectorConfig::default()), settings)
    }

    pub fn client(&self) -> &DetectionClient {
        &self.client
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Detect regions in `image`.
    ///
    /// Only [`RedactError::Busy`] and [`RedactError::Disposed`] are returned as
    /// errors; backend failures degrade to an empty result with an advisory.
    pub async fn process(&self, image: &RgbaImage) -> Result<DetectedRegions> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Ok(DetectedRegions::degraded(width, height, "Image has no pixels"));
        }

        let scale = compute_scale(width, height, self.settings.detect.target_long_edge);
        let working = downscale(image, scale);

        let polygons = match self.client.detect_exclusive(working, self.settings.detect).await {
            Ok(polygons) => polygons,
            Err(err @ (RedactError::Busy | RedactError::Disposed)) => return Err(err),
            Err(err) => {
                warn!(error = %err, "detection failed");
                return Ok(DetectedRegions::degraded(width, height, DETECTION_UNAVAILABLE));
            }
        };

        let regions = finalize_polygons(polygons, scale, width, height, &self.settings);
        info!(regions = regions.len(), scale, "detection complete");
        Ok(DetectedRegions {
            regions,
            image_width: width,
            image_height: height,
            scale,
            advisory: None,
        })
    }

    /// Dispose the underlying client
    pub fn dispose(&self) {
        self.client.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        algorithms::detection::tests::text_like_image,
        geometry::rect_to_polygon,
        pipeline::{tests::FixedDetector, RegionPipeline},
    };
    use redact_common::Rect;
    use std::time::Duration;

    struct SlowDetector(Duration);

    impl Detector for SlowDetector {
        fn detect(&self, _image: &RgbaImage, _options: &DetectOptions) -> Result<Vec<Polygon>> {
            std::thread::sleep(self.0);
            Ok(vec![rect_to_polygon(&Rect::new(1.0, 1.0, 4.0, 4.0))])
        }

        fn name(&self) -> &'static str {
            "slow"
        }
    }

    struct PanickingDetector;

    impl Detector for PanickingDetector {
        fn detect(&self, _image: &RgbaImage, _options: &DetectOptions) -> Result<Vec<Polygon>> {
            panic!("backend exploded");
        }

        fn name(&self) -> &'static str {
            "panicking"
        }
    }

    fn fixed_client() -> DetectionClient {
        DetectionClient::spawn(|| {
            let polygon = rect_to_polygon(&Rect::new(2.0, 3.0, 10.0, 5.0));
            Ok(Box::new(FixedDetector::new(vec![polygon])) as Box<dyn Detector>)
        })
    }

    fn slow_client(millis: u64) -> Arc<DetectionClient> {
        Arc::new(DetectionClient::spawn(move || {
            Ok(Box::new(SlowDetector(Duration::from_millis(millis))) as Box<dyn Detector>)
        }))
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    #[tokio::test]
    async fn test_detect_round_trip() {
        let client = fixed_client();
        let polygons = client
            .detect(RgbaImage::new(20, 20), DetectOptions::default())
            .await
            .unwrap();
        assert_eq!(polygons, vec![vec![2.0, 3.0, 12.0, 3.0, 12.0, 8.0, 2.0, 8.0]]);
        assert_eq!(client.pending_count(), 0);
        assert_eq!(client.outstanding_bitmaps(), 0);
    }

    #[tokio::test]
    async fn test_repeated_runs_release_every_bitmap() {
        let client = fixed_client();
        for _ in 0..10 {
            client
                .detect(RgbaImage::new(64, 48), DetectOptions::default())
                .await
                .unwrap();
        }
        assert_eq!(client.outstanding_bitmaps(), 0);
        assert_eq!(client.pending_count(), 0);
        assert_eq!(client.worker_generation(), 1);
    }

    #[tokio::test]
    async fn test_dispose_rejects_pending_requests() {
        let client = slow_client(100);
        let first = tokio::spawn({
            let client = client.clone();
            async move { client.detect(RgbaImage::new(8, 8), DetectOptions::default()).await }
        });
        let second = tokio::spawn({
            let client = client.clone();
            async move { client.detect(RgbaImage::new(8, 8), DetectOptions::default()).await }
        });
        wait_until(|| client.pending_count() == 2).await;

        client.dispose();
        assert!(matches!(first.await.unwrap(), Err(RedactError::Disposed)));
        assert!(matches!(second.await.unwrap(), Err(RedactError::Disposed)));
        assert_eq!(client.pending_count(), 0);

        let after = client.detect(RgbaImage::new(8, 8), DetectOptions::default()).await;
        assert!(matches!(after, Err(RedactError::Disposed)));

        // The running detection finishes, the queued one is skipped; both release.
        wait_until(|| client.outstanding_bitmaps() == 0).await;
    }

    #[tokio::test]
    async fn test_exclusive_detect_reports_busy() {
        let client = slow_client(100);
        let running = tokio::spawn({
            let client = client.clone();
            async move { client.detect(RgbaImage::new(8, 8), DetectOptions::default()).await }
        });
        wait_until(|| client.pending_count() == 1).await;

        let busy = client
            .detect_exclusive(RgbaImage::new(8, 8), DetectOptions::default())
            .await;
        assert!(matches!(busy, Err(RedactError::Busy)));

        assert!(running.await.unwrap().is_ok());
        let idle = client
            .detect_exclusive(RgbaImage::new(8, 8), DetectOptions::default())
            .await;
        assert!(idle.is_ok());
    }

    #[tokio::test]
    async fn test_cancelled_request_frees_its_slot() {
        let client = slow_client(80);
        let cancelled = tokio::time::timeout(
            Duration::from_millis(10),
            client.detect(RgbaImage::new(8, 8), DetectOptions::default()),
        )
        .await;
        assert!(cancelled.is_err());
        assert_eq!(client.pending_count(), 0);
        wait_until(|| client.outstanding_bitmaps() == 0).await;
    }

    #[tokio::test]
    async fn test_backend_crash_fails_request_and_respawns() {
        let starts = Arc::new(AtomicUsize::new(0));
        let client = DetectionClient::spawn({
            let starts = starts.clone();
            move || {
                if starts.fetch_add(1, Ordering::SeqCst) == 0 {
                    Ok(Box::new(PanickingDetector) as Box<dyn Detector>)
                } else {
                    Ok(Box::new(FixedDetector::new(Vec::new())) as Box<dyn Detector>)
                }
            }
        });

        let crashed = client.detect(RgbaImage::new(8, 8), DetectOptions::default()).await;
        assert!(matches!(crashed, Err(RedactError::Backend(_))));
        assert_eq!(client.outstanding_bitmaps(), 0);

        wait_until(|| lock(&client.worker).as_ref().is_some_and(|h| !h.is_alive())).await;
        let recovered = client.detect(RgbaImage::new(8, 8), DetectOptions::default()).await;
        assert_eq!(recovered.unwrap(), Vec::<Polygon>::new());
        assert_eq!(client.worker_generation(), 2);
        assert_eq!(starts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_factory_failure_is_retried_on_next_request() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let client = DetectionClient::spawn({
            let attempts = attempts.clone();
            move || {
                if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(RedactError::Backend("model fetch failed".into()))
                } else {
                    Ok(Box::new(FixedDetector::new(Vec::new())) as Box<dyn Detector>)
                }
            }
        });
        wait_until(|| lock(&client.worker).as_ref().is_some_and(|h| !h.is_alive())).await;

        let result = client.detect(RgbaImage::new(4, 4), DetectOptions::default()).await;
        assert!(result.is_ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_crash_rejects_only_requests_the_worker_held() {
        let pending = PendingRequests::default();
        let outstanding = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = unbounded_channel();

        let mut waiting = Vec::new();
        for id in 1..=3 {
            let (reply, response) = oneshot::channel();
            pending.insert(id, reply);
            waiting.push(response);
        }
        // 1 crashes the backend, 2 is queued behind it, 3 belongs to another worker.
        for id in [1, 2] {
            let bitmap = TransferBitmap::new(RgbaImage::new(4, 4), outstanding.clone());
            tx.send(WorkerMessage::Detect { id, bitmap, options: DetectOptions::default() })
                .unwrap();
        }

        let factory: DetectorFactory = Arc::new(|| Ok(Box::new(PanickingDetector) as Box<dyn Detector>));
        worker_loop(rx, factory, pending.clone()).await;

        let mut waiting = waiting.into_iter();
        for _ in [1, 2] {
            let result = waiting.next().unwrap().await.unwrap();
            assert!(matches!(result, Err(RedactError::Backend(_))));
        }
        assert_eq!(pending.len(), 1);
        assert!(pending.contains(3));
        assert!(tx.is_closed());
        assert_eq!(outstanding.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_start_leaves_other_requests_pending() {
        let pending = PendingRequests::default();
        let (queued_reply, queued) = oneshot::channel();
        let (other_reply, _other) = oneshot::channel();
        pending.insert(1, queued_reply);
        pending.insert(2, other_reply);

        let (tx, rx) = unbounded_channel();
        let bitmap = TransferBitmap::new(RgbaImage::new(4, 4), Arc::new(AtomicUsize::new(0)));
        tx.send(WorkerMessage::Detect { id: 1, bitmap, options: DetectOptions::default() })
            .unwrap();

        let factory: DetectorFactory = Arc::new(|| Err::<Box<dyn Detector>, _>(RedactError::Backend("no model".into())));
        worker_loop(rx, factory, pending.clone()).await;

        assert!(matches!(queued.await.unwrap(), Err(RedactError::Backend(_))));
        assert!(pending.contains(2));
    }

    #[test]
    fn test_unmatched_response_is_ignored() {
        let pending = PendingRequests::default();
        let (reply, mut response) = oneshot::channel();
        pending.insert(7, reply);

        assert!(!pending.resolve(DetectionResponse { id: 99, result: Ok(Vec::new()) }));
        assert_eq!(pending.len(), 1);

        assert!(pending.resolve(DetectionResponse { id: 7, result: Ok(vec![vec![0.0; 8]]) }));
        assert_eq!(response.try_recv().unwrap().unwrap().len(), 1);

        // A duplicate answer for the same id finds nobody waiting.
        assert!(!pending.resolve(DetectionResponse { id: 7, result: Ok(Vec::new()) }));
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn test_async_pipeline_matches_sync_pipeline() {
        let image = text_like_image(320, 200, &[(20, 30, 12), (20, 130, 8)]);
        let settings = PipelineSettings::default();

        let sync = RegionPipeline::builder().with_settings(settings).build().process(&image);
        let pipeline = AsyncRegionPipeline::edge(settings);
        let result = pipeline.process(&image).await.unwrap();

        assert_eq!(result, sync);
        assert_eq!(pipeline.client().outstanding_bitmaps(), 0);

        pipeline.dispose();
        assert!(matches!(pipeline.process(&image).await, Err(RedactError::Disposed)));
    }
}
