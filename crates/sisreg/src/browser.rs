//! Headless Chromium backend.
//!
//! [`BrowserConfig`] is always available so callers can build a
//! [`crate::ScraperConfig`] without the `browser` feature. With the feature
//! enabled, [`ChromiumLauncher`] starts one Chromium process per scrape over
//! the Chrome `DevTools` Protocol and hands out [`ChromiumSession`]s that
//! implement [`crate::FormSurface`] by evaluating the scripts in
//! [`crate::script`] and dispatching CDP input events.

/// Browser configuration
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// User agent string
    pub user_agent: Option<String>,
    /// Sandbox mode (off by default, the service runs in containers)
    pub sandbox: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1280,
            viewport_height: 900,
            chromium_path: None,
            user_agent: None,
            sandbox: false,
        }
    }
}

impl BrowserConfig {
    /// Set viewport dimensions
    #[must_use]
    pub const fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Set user agent
    #[must_use]
    pub fn with_user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Enable or disable the Chromium sandbox
    #[must_use]
    pub const fn with_sandbox(mut self, sandbox: bool) -> Self {
        self.sandbox = sandbox;
        self
    }
}

// ============================================================================
// Real CDP Implementation (when `browser` feature is enabled)
// ============================================================================

#[cfg(feature = "browser")]
#[allow(clippy::missing_errors_doc, clippy::significant_drop_tightening)]
mod cdp {
    use std::time::Duration;

    use async_trait::async_trait;
    use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
    use chromiumoxide::cdp::browser_protocol::input::{
        DispatchKeyEventParams, DispatchKeyEventType, InsertTextParams,
    };
    use chromiumoxide::page::Page as CdpPage;
    use futures::StreamExt;
    use serde::de::DeserializeOwned;
    use tokio::task::JoinHandle;

    use super::BrowserConfig;
    use crate::locator::Selector;
    use crate::record::RawTable;
    use crate::result::{ScrapeError, ScrapeResult};
    use crate::script;
    use crate::surface::{FieldState, FormSurface, LoadSnapshot, SessionLauncher};

    /// Launches a fresh Chromium process per session
    #[derive(Debug, Clone)]
    pub struct ChromiumLauncher {
        browser: BrowserConfig,
        frame_hint: String,
        request_timeout: Duration,
    }

    impl ChromiumLauncher {
        /// Create a launcher
        #[must_use]
        pub fn new(
            browser: BrowserConfig,
            frame_hint: impl Into<String>,
            request_timeout: Duration,
        ) -> Self {
            Self {
                browser,
                frame_hint: frame_hint.into(),
                request_timeout,
            }
        }

        fn cdp_config(&self) -> ScrapeResult<CdpConfig> {
            let config = &self.browser;
            let mut builder = CdpConfig::builder()
                .request_timeout(self.request_timeout)
                .window_size(config.viewport_width, config.viewport_height);

            if !config.headless {
                builder = builder.with_head();
            }

            if !config.sandbox {
                builder = builder.no_sandbox();
            }

            if let Some(ref path) = config.chromium_path {
                builder = builder.chrome_executable(path);
            }

            if let Some(ref ua) = config.user_agent {
                builder = builder.arg(format!("--user-agent={ua}"));
            }

            builder
                .build()
                .map_err(|message| ScrapeError::BrowserLaunch { message })
        }
    }

    #[async_trait]
    impl SessionLauncher for ChromiumLauncher {
        type Session = ChromiumSession;

        async fn launch(&self) -> ScrapeResult<ChromiumSession> {
            let (browser, mut handler) = CdpBrowser::launch(self.cdp_config()?)
                .await
                .map_err(|e| ScrapeError::BrowserLaunch {
                    message: e.to_string(),
                })?;

            let handle = tokio::spawn(async move {
                while let Some(h) = handler.next().await {
                    if h.is_err() {
                        break;
                    }
                }
            });

            let page = match browser.new_page("about:blank").await {
                Ok(page) => page,
                Err(e) => {
                    handle.abort();
                    return Err(ScrapeError::BrowserLaunch {
                        message: e.to_string(),
                    });
                }
            };

            tracing::debug!(headless = self.browser.headless, "browser session started");
            Ok(ChromiumSession {
                browser,
                page,
                handle,
                frame_hint: self.frame_hint.clone(),
            })
        }
    }

    /// One browser process plus the page that drives the form
    #[derive(Debug)]
    pub struct ChromiumSession {
        browser: CdpBrowser,
        page: CdpPage,
        handle: JoinHandle<()>,
        frame_hint: String,
    }

    impl ChromiumSession {
        async fn eval<T: DeserializeOwned>(&self, expr: String) -> ScrapeResult<T> {
            let result = self
                .page
                .evaluate(expr)
                .await
                .map_err(|e| ScrapeError::script(e.to_string()))?;
            Ok(result.into_value()?)
        }

        async fn key(
            &self,
            kind: DispatchKeyEventType,
            key: &str,
            code: &str,
            vk: i64,
        ) -> ScrapeResult<()> {
            let params = DispatchKeyEventParams::builder()
                .r#type(kind)
                .key(key.to_string())
                .code(code.to_string())
                .windows_virtual_key_code(vk)
                .build()
                .map_err(ScrapeError::input)?;
            self.page
                .execute(params)
                .await
                .map_err(|e| ScrapeError::input(e.to_string()))?;
            Ok(())
        }

        async fn press(&self, key: &str, code: &str, vk: i64) -> ScrapeResult<()> {
            self.key(DispatchKeyEventType::KeyDown, key, code, vk).await?;
            self.key(DispatchKeyEventType::KeyUp, key, code, vk).await
        }
    }

    #[async_trait]
    impl FormSurface for ChromiumSession {
        async fn navigate(&mut self, url: &str) -> ScrapeResult<()> {
            self.page
                .goto(url)
                .await
                .map_err(|e| ScrapeError::Navigation {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;
            Ok(())
        }

        async fn load_snapshot(&self) -> ScrapeResult<LoadSnapshot> {
            self.eval(script::load_snapshot()).await
        }

        async fn is_visible(&self, selector: &Selector) -> ScrapeResult<bool> {
            self.eval(script::is_visible(&self.frame_hint, selector)).await
        }

        async fn click(&self, selector: &Selector) -> ScrapeResult<bool> {
            self.eval(script::click(&self.frame_hint, selector)).await
        }

        async fn mark_field(&self, selector: &Selector) -> ScrapeResult<bool> {
            self.eval(script::mark_field(&self.frame_hint, selector)).await
        }

        async fn strip_locks(&self) -> ScrapeResult<()> {
            let found: bool = self.eval(script::strip_locks(&self.frame_hint)).await?;
            if found {
                Ok(())
            } else {
                Err(ScrapeError::script("code field is gone"))
            }
        }

        async fn field_state(&self) -> ScrapeResult<FieldState> {
            self.eval(script::field_state(&self.frame_hint)).await
        }

        async fn fill_field(&self, value: &str) -> ScrapeResult<()> {
            let _: bool = self.eval(script::focus_and_select(&self.frame_hint)).await?;
            self.page
                .execute(InsertTextParams::new(value))
                .await
                .map_err(|e| ScrapeError::input(e.to_string()))?;
            Ok(())
        }

        async fn click_field(&self) -> ScrapeResult<()> {
            let _: bool = self.eval(script::click_field(&self.frame_hint)).await?;
            Ok(())
        }

        async fn clear_field_by_keyboard(&self) -> ScrapeResult<()> {
            let _: bool = self.eval(script::focus_and_select(&self.frame_hint)).await?;
            self.press("Delete", "Delete", 46).await
        }

        async fn type_char(&self, ch: char) -> ScrapeResult<()> {
            let params = DispatchKeyEventParams::builder()
                .r#type(DispatchKeyEventType::Char)
                .text(ch.to_string())
                .build()
                .map_err(ScrapeError::input)?;
            self.page
                .execute(params)
                .await
                .map_err(|e| ScrapeError::input(e.to_string()))?;
            Ok(())
        }

        async fn force_value(&self, value: &str) -> ScrapeResult<()> {
            let _: bool = self.eval(script::force_value(&self.frame_hint, value)).await?;
            Ok(())
        }

        async fn field_value(&self) -> ScrapeResult<String> {
            self.eval(script::field_value(&self.frame_hint)).await
        }

        async fn page_text(&self) -> ScrapeResult<String> {
            self.eval(script::page_text(&self.frame_hint)).await
        }

        async fn capture_table(&self) -> ScrapeResult<RawTable> {
            self.eval(script::capture_table(&self.frame_hint)).await
        }

        async fn close(&mut self) -> ScrapeResult<()> {
            let closed = self.browser.close().await;
            let reaped = if closed.is_ok() {
                self.browser.wait().await.map(|_| ())
            } else {
                Ok(())
            };
            self.handle.abort();
            closed.map_err(|e| ScrapeError::BrowserLaunch {
                message: e.to_string(),
            })?;
            reaped.map_err(|e| ScrapeError::BrowserLaunch {
                message: format!("browser process not reaped: {e}"),
            })
        }
    }
}

#[cfg(feature = "browser")]
pub use cdp::{ChromiumLauncher, ChromiumSession};
