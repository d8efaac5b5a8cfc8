use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::runtime::Handle;
use tokio::sync::{watch, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};

use crate::{
    browser::{BrowserTransport, DriverFactory},
    jsonrpc::JsonRpcTransport,
    transport::Transport,
    ClientOptions, Result, SourceLanguage, TargetLanguage, Translation, TranslationRequest,
    TranslatorError,
};

/// Default number of translations run concurrently by background tasks.
pub const DEFAULT_MAX_WORKERS: usize = 16;

#[derive(Clone)]
/// Translation client: validation, retry with backoff, and background dispatch.
///
/// Clones share the worker pool, the transport, and the shutdown state.
pub struct Translator {
    transport: Arc<dyn Transport>,
    options: ClientOptions,
    workers: Arc<Semaphore>,
    max_workers: usize,
    shutdown: Arc<watch::Sender<bool>>,
    runtime: Option<Handle>,
}

impl fmt::Debug for Translator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Translator")
            .field("options", &self.options)
            .field("max_workers", &self.max_workers)
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

impl Translator {
    /// Creates a translator over any transport.
    pub fn new(transport: impl Transport + 'static, options: ClientOptions) -> Self {
        Self::from_transport(Arc::new(transport), options)
    }

    pub fn from_transport(transport: Arc<dyn Transport>, options: ClientOptions) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            transport,
            options,
            workers: Arc::new(Semaphore::new(DEFAULT_MAX_WORKERS)),
            max_workers: DEFAULT_MAX_WORKERS,
            shutdown: Arc::new(shutdown),
            runtime: None,
        }
    }

    /// Creates a translator that talks to the public JSON-RPC endpoint.
    pub fn json_rpc(options: ClientOptions) -> Self {
        Self::new(JsonRpcTransport::default(), options)
    }

    /// Creates a translator that drives the web UI with browsers from `factory`.
    pub fn browser(factory: impl DriverFactory + 'static, options: ClientOptions) -> Self {
        Self::new(BrowserTransport::new(factory), options)
    }

    /// Creates a JSON-RPC translator configured from the environment.
    ///
    /// Reads `DEEPL_JSONRPC_URL` for the endpoint (optional) and the variables
    /// documented on [`ClientOptions::from_env`].
    pub fn from_env() -> Result<Self> {
        let options = ClientOptions::from_env()?;
        let transport = match std::env::var("DEEPL_JSONRPC_URL") {
            Ok(url) if !url.trim().is_empty() => JsonRpcTransport::new(url.trim()),
            _ => JsonRpcTransport::default(),
        };
        Ok(Self::new(transport, options))
    }

    /// Limits how many background translations run at the same time.
    ///
    /// Call before cloning the translator; clones share the limit.
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        let max_workers = max_workers.max(1);
        self.workers = Arc::new(Semaphore::new(max_workers));
        self.max_workers = max_workers;
        self
    }

    /// Runtime used for background tasks and [`Translator::translate_blocking`].
    ///
    /// Without it, background tasks go to the runtime of the calling task.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn is_shut_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Translates `text`, retrying according to the configured repetitions.
    pub async fn translate(
        &self,
        text: impl Into<String>,
        source: SourceLanguage,
        target: TargetLanguage,
    ) -> Result<Translation> {
        self.translate_request(&TranslationRequest::new(text, source, target))
            .await
    }

    /// Runs validation, then dispatches until success, a terminal failure,
    /// exhausted repetitions, or shutdown.
    ///
    /// When repetitions run out, the last failure is returned as is.
    pub async fn translate_request(&self, request: &TranslationRequest) -> Result<Translation> {
        request.validate()?;

        let mut shutdown = self.shutdown.subscribe();
        if *shutdown.borrow() {
            return Err(TranslatorError::Shutdown);
        }

        let mut attempt = 0u32;
        loop {
            let outcome = tokio::select! {
                biased;
                _ = shutdown.wait_for(|closed| *closed) => return Err(TranslatorError::Shutdown),
                outcome = self.dispatch_once(request) => outcome,
            };

            let err = match outcome {
                Ok(translation) if self.options.post_processing() => {
                    return Ok(translation.post_processed())
                }
                Ok(translation) => return Ok(translation),
                Err(err) => err,
            };

            if !err.is_retryable() || !self.options.repetitions().allows(attempt) {
                #[cfg(feature = "tracing")]
                tracing::debug!("translation failed after {} attempts: {}", attempt + 1, err);
                return Err(err);
            }

            let delay = self.options.repetitions_delay(attempt);

            #[cfg(feature = "tracing")]
            tracing::debug!(
                "retrying translation after {} ms ({:?}): {}",
                delay.as_millis(),
                err.kind(),
                err
            );

            tokio::select! {
                biased;
                _ = shutdown.wait_for(|closed| *closed) => return Err(TranslatorError::Shutdown),
                _ = sleep(delay) => {}
            }
            attempt = attempt.saturating_add(1);
        }
    }

    async fn dispatch_once(&self, request: &TranslationRequest) -> Result<Translation> {
        let budget = self.options.timeout();
        match timeout(budget, self.transport.dispatch(request, budget)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(TranslatorError::Timeout(budget)),
        }
    }

    /// Blocking form of [`Translator::translate`] for non-async callers.
    ///
    /// Requires a multi-threaded runtime set with [`Translator::with_runtime`].
    /// Called from inside an async context it returns
    /// [`TranslatorError::Runtime`] instead of blocking a worker thread.
    pub fn translate_blocking(
        &self,
        text: impl Into<String>,
        source: SourceLanguage,
        target: TargetLanguage,
    ) -> Result<Translation> {
        if Handle::try_current().is_ok() {
            return Err(TranslatorError::Runtime(
                "translate_blocking called from within an async runtime; use translate".to_owned(),
            ));
        }
        let runtime = self.runtime.clone().ok_or_else(|| {
            TranslatorError::Runtime(
                "translate_blocking requires a runtime set with with_runtime".to_owned(),
            )
        })?;
        let request = TranslationRequest::new(text, source, target);
        runtime.block_on(self.translate_request(&request))
    }

    /// Spawns the translation on a worker and returns a handle to its result.
    ///
    /// Validation failures and shutdown are reported here, before anything is
    /// spawned. Dropping the handle detaches the task; use
    /// [`TranslationHandle::abort`] to stop it.
    pub fn translate_async(
        &self,
        text: impl Into<String>,
        source: SourceLanguage,
        target: TargetLanguage,
    ) -> Result<TranslationHandle> {
        self.spawn_request(TranslationRequest::new(text, source, target))
    }

    pub fn spawn_request(&self, request: TranslationRequest) -> Result<TranslationHandle> {
        if self.is_shut_down() {
            return Err(TranslatorError::Shutdown);
        }
        request.validate()?;
        let runtime = self.runtime_handle()?;

        let translator = self.clone();
        let task = runtime.spawn(async move {
            let _permit = translator.acquire_worker().await?;
            translator.translate_request(&request).await
        });

        Ok(TranslationHandle { task })
    }

    /// Spawns the translation and passes its outcome to `on_result`.
    ///
    /// `on_result` runs exactly once when this returns `Ok`, and never when it
    /// returns `Err`.
    pub fn translate_with_callback<F>(
        &self,
        text: impl Into<String>,
        source: SourceLanguage,
        target: TargetLanguage,
        on_result: F,
    ) -> Result<()>
    where
        F: FnOnce(Result<Translation>) + Send + 'static,
    {
        let handle = self.translate_async(text, source, target)?;
        self.runtime_handle()?.spawn(async move {
            on_result(handle.await);
        });
        Ok(())
    }

    /// Stops all work and releases transport resources.
    ///
    /// Pending attempts and backoff sleeps end with
    /// [`TranslatorError::Shutdown`]; later submissions are rejected.
    /// Calling it again has no effect.
    pub async fn shutdown(&self) {
        if self.shutdown.send_replace(true) {
            return;
        }
        self.workers.close();

        #[cfg(feature = "tracing")]
        tracing::debug!("translator shut down, releasing transport");

        self.transport.shutdown().await;
    }

    async fn acquire_worker(&self) -> Result<OwnedSemaphorePermit> {
        Arc::clone(&self.workers)
            .acquire_owned()
            .await
            .map_err(|_| TranslatorError::Shutdown)
    }

    fn runtime_handle(&self) -> Result<Handle> {
        match &self.runtime {
            Some(runtime) => Ok(runtime.clone()),
            None => Handle::try_current().map_err(|_| {
                TranslatorError::Runtime(
                    "no tokio runtime available; call from a runtime or use with_runtime"
                        .to_owned(),
                )
            }),
        }
    }
}

/// Result of [`Translator::translate_async`].
///
/// Resolves to the translation or the failure; an aborted or panicked task
/// resolves to [`TranslatorError::Cancelled`].
#[derive(Debug)]
pub struct TranslationHandle {
    task: JoinHandle<Result<Translation>>,
}

impl TranslationHandle {
    /// Cancels the task. No further attempt or backoff starts afterwards.
    pub fn abort(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Future for TranslationHandle {
    type Output = Result<Translation>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.task).poll(cx).map(|joined| match joined {
            Ok(outcome) => outcome,
            Err(err) if err.is_cancelled() => {
                Err(TranslatorError::Cancelled("task aborted".to_owned()))
            }
            Err(err) => Err(TranslatorError::Cancelled(format!("task panicked: {err}"))),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::time::Duration;

    struct Echo;

    #[async_trait]
    impl Transport for Echo {
        async fn dispatch(
            &self,
            request: &TranslationRequest,
            _timeout: Duration,
        ) -> Result<Translation> {
            Ok(Translation::from_text(format!("  {}\n\n!", request.text)))
        }
    }

    #[tokio::test]
    async fn success_is_post_processed_when_enabled() {
        let translator = Translator::new(Echo, ClientOptions::default());
        let translation = translator
            .translate("Hallo   Welt", SourceLanguage::German, TargetLanguage::EnglishAmerican)
            .await
            .unwrap();
        assert_eq!(translation.text, "Hallo Welt !");
    }

    #[tokio::test]
    async fn blocking_call_inside_runtime_is_refused() {
        let translator = Translator::new(Echo, ClientOptions::default());
        let err = translator
            .translate_blocking("Hi", SourceLanguage::English, TargetLanguage::German)
            .unwrap_err();
        assert!(matches!(err, TranslatorError::Runtime(_)));
    }

    #[test]
    fn spawning_without_runtime_is_refused() {
        let translator = Translator::new(Echo, ClientOptions::default());
        let err = translator
            .translate_async("Hi", SourceLanguage::English, TargetLanguage::German)
            .unwrap_err();
        assert!(matches!(err, TranslatorError::Runtime(_)));
    }

    #[test]
    fn max_workers_has_floor_of_one() {
        let translator = Translator::new(Echo, ClientOptions::default()).with_max_workers(0);
        assert!(format!("{translator:?}").contains("max_workers: 1"));
    }
}
