//! Translation by driving the translator web UI in a headless browser.
//!
//! The browser engine is supplied by the caller through [`DriverFactory`];
//! this module only pools drivers and implements the navigate-then-poll
//! extraction.

use std::fmt;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use std::time::Duration;

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use tokio::time::{sleep, Instant};

use crate::{transport::Transport, Result, Translation, TranslationRequest, TranslatorError};

/// Page that hosts the translator UI.
pub const DEFAULT_TRANSLATOR_URL: &str = "https://www.deepl.com/translator";
/// Class of the element holding the translated text.
pub const RESULT_ELEMENT_CLASS: &str = "lmt__translations_as_text__text_btn";
/// Attribute read from the result element.
pub const RESULT_ATTRIBUTE: &str = "textContent";

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

// Text travels in the URL fragment, where `/` separates language codes from text.
const FRAGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'\\')
    .add(b'`');

/// A single browser instance.
///
/// A driver is used by one attempt at a time and never shared between two
/// in-flight attempts.
#[async_trait]
pub trait BrowserDriver: Send {
    /// Loads `url` and waits for the page load itself.
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// Reads `attribute` of the first element with class `class_name`.
    ///
    /// Returns `Ok(None)` while the element or attribute is absent.
    async fn element_attribute(
        &mut self,
        class_name: &str,
        attribute: &str,
    ) -> Result<Option<String>>;

    /// HTTP status code of the current page.
    async fn status_code(&mut self) -> Result<u16>;

    /// Terminates the browser instance.
    async fn quit(&mut self) -> Result<()>;
}

/// Creates browser instances on demand.
#[async_trait]
pub trait DriverFactory: Send + Sync {
    /// Launches a driver whose page and connect timeouts use `timeout`.
    async fn launch(&self, timeout: Duration) -> Result<Box<dyn BrowserDriver>>;
}

#[derive(Default)]
struct DriverPool {
    idle: Mutex<Vec<Box<dyn BrowserDriver>>>,
    closed: AtomicBool,
}

impl DriverPool {
    fn take_idle(&self) -> Option<Box<dyn BrowserDriver>> {
        self.idle.lock().ok().and_then(|mut idle| idle.pop())
    }

    fn check_in(&self, driver: Box<dyn BrowserDriver>) {
        if self.closed.load(Ordering::SeqCst) {
            spawn_quit(driver);
            return;
        }
        match self.idle.lock() {
            Ok(mut idle) => idle.push(driver),
            Err(_) => spawn_quit(driver),
        }
    }

    fn drain(&self) -> Vec<Box<dyn BrowserDriver>> {
        self.idle
            .lock()
            .map(|mut idle| std::mem::take(&mut *idle))
            .unwrap_or_default()
    }

    fn idle_count(&self) -> usize {
        self.idle.lock().map(|idle| idle.len()).unwrap_or(0)
    }
}

async fn quit_driver(mut driver: Box<dyn BrowserDriver>) {
    if let Err(_err) = driver.quit().await {
        #[cfg(feature = "tracing")]
        tracing::warn!("failed to quit browser driver: {}", _err);
    }
}

/// Quits a driver from a synchronous context, if a runtime is available.
fn spawn_quit(driver: Box<dyn BrowserDriver>) {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(quit_driver(driver));
        }
        Err(_) => {
            #[cfg(feature = "tracing")]
            tracing::warn!("no tokio runtime to quit browser driver; the browser is left running");
            drop(driver);
        }
    }
}

/// A driver checked out of the pool for one attempt.
///
/// Dropped without [`PooledDriver::release`] (cancelled attempt), the driver
/// is quit rather than returned, since its page state is unknown.
struct PooledDriver {
    driver: Option<Box<dyn BrowserDriver>>,
    pool: Arc<DriverPool>,
}

impl PooledDriver {
    fn driver(&mut self) -> Result<&mut (dyn BrowserDriver + 'static)> {
        match self.driver.as_deref_mut() {
            Some(driver) => Ok(driver),
            None => Err(TranslatorError::Browser("driver already released".to_owned())),
        }
    }

    fn release(mut self) {
        if let Some(driver) = self.driver.take() {
            self.pool.check_in(driver);
        }
    }

    async fn discard(mut self) {
        if let Some(driver) = self.driver.take() {
            quit_driver(driver).await;
        }
    }
}

impl Drop for PooledDriver {
    fn drop(&mut self) {
        if let Some(driver) = self.driver.take() {
            spawn_quit(driver);
        }
    }
}

/// Transport that loads the translator page and reads the rendered result.
pub struct BrowserTransport {
    factory: Arc<dyn DriverFactory>,
    pool: Arc<DriverPool>,
    base_url: String,
    poll_interval: Duration,
}

impl fmt::Debug for BrowserTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrowserTransport")
            .field("base_url", &self.base_url)
            .field("poll_interval", &self.poll_interval)
            .field("idle_drivers", &self.pool.idle_count())
            .finish()
    }
}

impl BrowserTransport {
    pub fn new(factory: impl DriverFactory + 'static) -> Self {
        Self::from_factory(Arc::new(factory))
    }

    pub fn from_factory(factory: Arc<dyn DriverFactory>) -> Self {
        Self {
            factory,
            pool: Arc::new(DriverPool::default()),
            base_url: DEFAULT_TRANSLATOR_URL.to_owned(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Interval between two reads of the result element.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Number of drivers currently waiting in the pool.
    pub fn idle_drivers(&self) -> usize {
        self.pool.idle_count()
    }

    /// Builds `{base}#{source}/{target}/{escaped text}`.
    pub fn translator_url(&self, request: &TranslationRequest) -> String {
        format!(
            "{}#{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            request.source.code(),
            request.target.rpc_code().to_ascii_lowercase(),
            utf8_percent_encode(&request.text, FRAGMENT)
        )
    }

    async fn check_out(&self, timeout: Duration) -> Result<PooledDriver> {
        if self.pool.closed.load(Ordering::SeqCst) {
            return Err(TranslatorError::Shutdown);
        }

        let driver = match self.pool.take_idle() {
            Some(driver) => driver,
            None => {
                #[cfg(feature = "tracing")]
                tracing::debug!("launching browser driver");
                self.factory.launch(timeout).await?
            }
        };

        Ok(PooledDriver {
            driver: Some(driver),
            pool: Arc::clone(&self.pool),
        })
    }

    /// Navigates, then polls the result element until it holds text or
    /// `deadline` passes.
    async fn extract(
        &self,
        driver: &mut dyn BrowserDriver,
        url: &str,
        deadline: Instant,
        timeout: Duration,
    ) -> Result<String> {
        driver.navigate(url).await?;

        loop {
            let text = driver
                .element_attribute(RESULT_ELEMENT_CLASS, RESULT_ATTRIBUTE)
                .await?;
            if let Some(text) = text.filter(|text| !text.trim().is_empty()) {
                return Ok(text);
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(TranslatorError::Timeout(timeout));
            }
            sleep(self.poll_interval.min(deadline - now)).await;
        }
    }
}

#[async_trait]
impl Transport for BrowserTransport {
    async fn dispatch(
        &self,
        request: &TranslationRequest,
        timeout: Duration,
    ) -> Result<Translation> {
        let deadline = Instant::now() + timeout;
        let mut checked_out = self.check_out(timeout).await?;
        let url = self.translator_url(request);

        let extracted = self
            .extract(checked_out.driver()?, &url, deadline, timeout)
            .await;
        let text = match extracted {
            Ok(text) => text,
            Err(err) => {
                checked_out.discard().await;
                return Err(err);
            }
        };

        let status = match checked_out.driver()?.status_code().await {
            Ok(status) => status,
            Err(err) => {
                checked_out.discard().await;
                return Err(err);
            }
        };
        checked_out.release();

        if status != 200 {
            return Err(TranslatorError::Status {
                status,
                body: String::new(),
            });
        }

        Ok(Translation::from_text(text))
    }

    async fn shutdown(&self) {
        self.pool.closed.store(true, Ordering::SeqCst);
        let drivers = self.pool.drain();

        #[cfg(feature = "tracing")]
        tracing::debug!("quitting {} pooled browser drivers", drivers.len());

        for driver in drivers {
            quit_driver(driver).await;
        }
    }
}
