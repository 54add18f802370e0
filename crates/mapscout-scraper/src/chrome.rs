//! Chromium adapter for [`PageDriver`] and [`DetailView`].

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::{Headers, SetExtraHttpHeadersParams};
use chromiumoxide::cdp::browser_protocol::page::NavigateParams;
use chromiumoxide::error::CdpError;
use chromiumoxide::{Browser, BrowserConfig, Element, Page};
use futures::StreamExt;
use mapscout_core::AppConfig;
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::driver::{DetailView, DriverError, PageDriver, Probe, WaitPolicy};
use crate::error::ScraperError;
use crate::scripts;
use crate::wait::{poll_until, WaitCondition};

const POLL_INTERVAL: Duration = Duration::from_millis(200);

impl From<CdpError> for DriverError {
    fn from(e: CdpError) -> Self {
        Self::Protocol(e.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub headless: bool,
    pub executable: Option<PathBuf>,
    pub language: String,
    pub window: (u32, u32),
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: true,
            executable: None,
            language: "en".to_string(),
            window: (1920, 1080),
        }
    }
}

impl BrowserOptions {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            headless: config.browser_headless,
            executable: config.browser_executable.clone(),
            language: config.language.clone(),
            ..Self::default()
        }
    }
}

/// A running browser process and its CDP event loop.
pub struct ChromeSession {
    browser: Arc<Browser>,
    handler: JoinHandle<()>,
    language: String,
}

impl ChromeSession {
    /// Starts a browser.
    ///
    /// # Errors
    ///
    /// [`ScraperError::Launch`] if the configuration is rejected or the
    /// process cannot be started.
    pub async fn launch(options: &BrowserOptions) -> Result<Self, ScraperError> {
        let (width, height) = options.window;
        let mut builder = BrowserConfig::builder()
            .window_size(width, height)
            .arg(format!("--lang={}", options.language))
            .no_sandbox()
            .arg("--disable-setuid-sandbox");
        if !options.headless {
            builder = builder.with_head();
        }
        if let Some(executable) = &options.executable {
            builder = builder.chrome_executable(executable);
        }
        let config = builder.build().map_err(ScraperError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| ScraperError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::warn!(error = %e, "browser event loop error");
                }
            }
        });

        tracing::info!(headless = options.headless, "browser launched");
        Ok(Self {
            browser: Arc::new(browser),
            handler,
            language: options.language.clone(),
        })
    }

    /// Opens a blank tab. Each concurrent collection needs its own.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Driver`] if the tab cannot be created.
    pub async fn new_page(&self) -> Result<ChromePage, ScraperError> {
        Ok(open_tab(&self.browser, &self.language).await?)
    }

    /// Closes the browser. Pages still alive at this point are abandoned.
    pub async fn shutdown(self) {
        match Arc::try_unwrap(self.browser) {
            Ok(mut browser) => {
                if let Err(e) = browser.close().await {
                    tracing::warn!(error = %e, "browser close failed");
                }
                if let Err(e) = browser.wait().await {
                    tracing::warn!(error = %e, "browser did not exit cleanly");
                }
            }
            Err(_) => tracing::warn!("pages still open at shutdown; dropping browser"),
        }
        self.handler.abort();
    }
}

async fn open_tab(browser: &Arc<Browser>, language: &str) -> Result<ChromePage, DriverError> {
    let page = browser.new_page("about:blank").await?;
    let headers = Headers::new(json!({ "Accept-Language": language }));
    page.execute(SetExtraHttpHeadersParams::new(headers)).await?;
    Ok(ChromePage {
        page,
        browser: Arc::clone(browser),
        language: language.to_owned(),
    })
}

/// One browser tab.
pub struct ChromePage {
    page: Page,
    browser: Arc<Browser>,
    language: String,
}

impl ChromePage {
    /// Closes the tab.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Protocol`] if the browser rejects the request.
    pub async fn close(self) -> Result<(), DriverError> {
        self.page.close().await?;
        Ok(())
    }

    async fn wait_ready(&self, url: &str, timeout: Duration) -> Result<(), DriverError> {
        let page = &self.page;
        poll_until(
            WaitCondition::new(timeout, POLL_INTERVAL),
            &CancellationToken::new(),
            || async move {
                match page.evaluate(scripts::DOM_READY).await {
                    Ok(result) => result.value().and_then(Value::as_bool).filter(|ready| *ready),
                    Err(_) => None,
                }
            },
        )
        .await
        .map(|_| ())
        .map_err(|_| DriverError::timeout(format!("document at {url}"), timeout))
    }
}

#[async_trait]
impl PageDriver for ChromePage {
    type Element = Element;
    type Context = ChromePage;

    async fn navigate(&self, url: &str, wait: WaitPolicy, timeout: Duration) -> Result<(), DriverError> {
        let navigation_failed = |reason: String| DriverError::Navigation {
            url: url.to_owned(),
            reason,
        };
        match wait {
            WaitPolicy::Load => {
                tokio::time::timeout(timeout, self.page.goto(url))
                    .await
                    .map_err(|_| DriverError::timeout(url, timeout))?
                    .map_err(|e| navigation_failed(e.to_string()))?;
            }
            WaitPolicy::DomContentLoaded => {
                let started = tokio::time::Instant::now();
                let response = tokio::time::timeout(timeout, self.page.execute(NavigateParams::new(url)))
                    .await
                    .map_err(|_| DriverError::timeout(url, timeout))?
                    .map_err(|e| navigation_failed(e.to_string()))?;
                if let Some(error) = response.result.error_text.clone() {
                    return Err(navigation_failed(error));
                }
                self.wait_ready(url, timeout.saturating_sub(started.elapsed()))
                    .await?;
            }
        }
        Ok(())
    }

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<Element, DriverError> {
        let page = &self.page;
        poll_until(
            WaitCondition::new(timeout, POLL_INTERVAL),
            &CancellationToken::new(),
            || async move { page.find_element(selector).await.ok() },
        )
        .await
        .map_err(|_| DriverError::timeout(selector, timeout))
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<Element>, DriverError> {
        Ok(self.page.find_elements(selector).await?)
    }

    async fn evaluate(&self, script: &str) -> Result<Value, DriverError> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| DriverError::Script(e.to_string()))?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    async fn evaluate_on(&self, element: &Element, function: &str) -> Result<Value, DriverError> {
        let returns = element
            .call_js_fn(function, false)
            .await
            .map_err(|e| DriverError::Script(e.to_string()))?;
        Ok(returns.result.value.unwrap_or(Value::Null))
    }

    async fn click(&self, element: &Element) -> Result<(), DriverError> {
        element.click().await?;
        Ok(())
    }

    async fn scroll_into_view(&self, element: &Element) -> Result<(), DriverError> {
        self.evaluate_on(element, scripts::SCROLL_INTO_VIEW_FN).await?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        Ok(self.page.url().await?.unwrap_or_default())
    }

    async fn open_context(&self) -> Result<ChromePage, DriverError> {
        open_tab(&self.browser, &self.language).await
    }

    async fn close_context(&self, context: ChromePage) -> Result<(), DriverError> {
        context.close().await
    }
}

#[async_trait]
impl DetailView for ChromePage {
    async fn lookup(&self, probe: &Probe) -> Result<Option<String>, DriverError> {
        Ok(match self.evaluate(&scripts::probe(probe)).await? {
            Value::Null => None,
            Value::String(text) => Some(text),
            other => Some(other.to_string()),
        })
    }
}
