//! Chrome DevTools Protocol surface built on chromiumoxide.
//!
//! Works against an Electron host started with `--remote-debugging-port`
//! (attach) or a browser launched at the web-preview URL (launch).

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::{CaptureScreenshotFormat, Viewport};
use chromiumoxide::element::Element;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::backend::{Connector, UiSurface};
use super::types::{
    BoundingBox, ElementId, Locator, ShotRegion, SurfaceError, SurfaceResult, ViewportSize,
};

/// Where a CDP connection comes from
#[derive(Debug, Clone, PartialEq)]
pub enum CdpTarget {
    /// Connect to a running host, e.g. `http://127.0.0.1:9222`
    Attach { debug_url: String },

    /// Launch a browser and open `url`
    Launch {
        url: String,
        executable: Option<PathBuf>,
        headless: bool,
    },
}

impl CdpTarget {
    /// Debug endpoint for a host listening on `port` locally
    pub fn local(port: u16) -> Self {
        CdpTarget::Attach {
            debug_url: format!("http://127.0.0.1:{}", port),
        }
    }
}

/// Opens `CdpSurface`s
#[derive(Debug, Clone)]
pub struct CdpConnector {
    target: CdpTarget,
    window: ViewportSize,
}

impl CdpConnector {
    pub fn new(target: CdpTarget) -> Self {
        Self {
            target,
            window: ViewportSize::default(),
        }
    }

    /// Initial window size for launched browsers
    pub fn window(mut self, size: ViewportSize) -> Self {
        self.window = size;
        self
    }

    async fn attach(&self, debug_url: &str) -> SurfaceResult<CdpSurface> {
        let (browser, handler) = Browser::connect(debug_url.to_string())
            .await
            .map_err(|e| SurfaceError::Connect(format!("{}: {}", debug_url, e)))?;
        let handler = spawn_handler(handler);

        let pages = browser.pages().await.map_err(connect_err)?;
        let page = match pages.into_iter().next() {
            Some(page) => page,
            None => {
                debug!("host has no pages, opening one");
                browser.new_page("about:blank").await.map_err(connect_err)?
            }
        };

        info!("Attached to {}", debug_url);
        Ok(CdpSurface::new(browser, page, handler, false))
    }

    async fn launch(
        &self,
        url: &str,
        executable: Option<&PathBuf>,
        headless: bool,
    ) -> SurfaceResult<CdpSurface> {
        let (width, height) = self.window.dimensions();
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-setuid-sandbox")
            .window_size(width, height);
        if !headless {
            builder = builder.with_head();
        }
        if let Some(path) = executable {
            builder = builder.chrome_executable(path);
        }
        let config = builder
            .build()
            .map_err(|e| SurfaceError::Connect(format!("browser config: {}", e)))?;

        let (browser, handler) = Browser::launch(config).await.map_err(connect_err)?;
        let handler = spawn_handler(handler);

        let page = browser.new_page(url).await.map_err(|e| {
            SurfaceError::Connect(format!("could not open {}: {}", url, e))
        })?;
        if let Err(e) = page.wait_for_navigation().await {
            warn!("navigation to {} did not settle: {}", url, e);
        }

        info!("Launched browser at {}", url);
        Ok(CdpSurface::new(browser, page, handler, true))
    }
}

#[async_trait]
impl Connector for CdpConnector {
    async fn connect(&self) -> SurfaceResult<Box<dyn UiSurface>> {
        let surface = match &self.target {
            CdpTarget::Attach { debug_url } => self.attach(debug_url).await?,
            CdpTarget::Launch {
                url,
                executable,
                headless,
            } => self.launch(url, executable.as_ref(), *headless).await?,
        };
        Ok(Box::new(surface))
    }

    fn describe(&self) -> String {
        match &self.target {
            CdpTarget::Attach { debug_url } => format!("attach {}", debug_url),
            CdpTarget::Launch { url, .. } => format!("launch {}", url),
        }
    }
}

fn spawn_handler(mut handler: chromiumoxide::Handler) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if event.is_err() {
                debug!("CDP handler event loop ended");
                break;
            }
        }
    })
}

fn connect_err(e: chromiumoxide::error::CdpError) -> SurfaceError {
    SurfaceError::Connect(e.to_string())
}

fn action_err(e: chromiumoxide::error::CdpError) -> SurfaceError {
    SurfaceError::Action(e.to_string())
}

/// A live page driven over CDP
pub struct CdpSurface {
    browser: Option<Browser>,
    page: Page,
    handler: Option<JoinHandle<()>>,
    elements: HashMap<usize, Element>,
    next_id: usize,
    /// Launched browsers are closed on disconnect; attached hosts are left running
    owns_browser: bool,
}

impl CdpSurface {
    fn new(browser: Browser, page: Page, handler: JoinHandle<()>, owns_browser: bool) -> Self {
        Self {
            browser: Some(browser),
            page,
            handler: Some(handler),
            elements: HashMap::new(),
            next_id: 0,
            owns_browser,
        }
    }

    fn element(&self, id: ElementId) -> SurfaceResult<&Element> {
        self.elements.get(&id.0).ok_or(SurfaceError::StaleElement(id))
    }

    fn remember(&mut self, element: Element) -> ElementId {
        let id = self.next_id;
        self.next_id += 1;
        self.elements.insert(id, element);
        ElementId(id)
    }

    /// Run a function with `this` bound to the element and return its JSON result
    async fn call(&self, id: ElementId, function: String) -> SurfaceResult<serde_json::Value> {
        let element = self.element(id)?;
        let ret = element.call_js_fn(function, false).await.map_err(action_err)?;
        Ok(ret.result.value.unwrap_or(serde_json::Value::Null))
    }

    async fn text_content(element: &Element) -> SurfaceResult<String> {
        let ret = element
            .call_js_fn("function() { return this.textContent || ''; }", false)
            .await
            .map_err(|e| SurfaceError::Query {
                selector: "textContent".into(),
                message: e.to_string(),
            })?;
        Ok(ret
            .result
            .value
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default())
    }
}

#[async_trait]
impl UiSurface for CdpSurface {
    async fn set_viewport(&mut self, size: ViewportSize) -> SurfaceResult<()> {
        let (width, height) = size.dimensions();
        self.page
            .execute(SetDeviceMetricsOverrideParams::new(
                width as i64,
                height as i64,
                1.0,
                false,
            ))
            .await
            .map_err(action_err)?;
        debug!("viewport set to {}", size);
        Ok(())
    }

    async fn query(&mut self, locator: &Locator) -> SurfaceResult<Option<ElementId>> {
        let candidates = self
            .page
            .find_elements(locator.selector.clone())
            .await
            .map_err(|e| SurfaceError::Query {
                selector: locator.selector.clone(),
                message: e.to_string(),
            })?;

        let mut matching = Vec::new();
        for element in candidates {
            let keep = match &locator.text {
                Some(filter) => filter.matches(&Self::text_content(&element).await?),
                None => true,
            };
            if keep {
                matching.push(element);
                if matching.len() > locator.index {
                    break;
                }
            }
        }

        Ok(matching
            .into_iter()
            .nth(locator.index)
            .map(|element| self.remember(element)))
    }

    async fn click(&mut self, element: ElementId) -> SurfaceResult<()> {
        self.element(element)?.click().await.map_err(action_err)?;
        Ok(())
    }

    async fn select_option(&mut self, element: ElementId, value: &str) -> SurfaceResult<bool> {
        let literal = serde_json::to_string(value)
            .map_err(|e| SurfaceError::Action(e.to_string()))?;
        let function = format!(
            "function() {{
                const value = {literal};
                const options = Array.from(this.options || []);
                if (!options.some(o => o.value === value)) return false;
                this.value = value;
                this.dispatchEvent(new Event('input', {{ bubbles: true }}));
                this.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }}"
        );
        let selected = self.call(element, function).await?;
        Ok(selected.as_bool().unwrap_or(false))
    }

    async fn type_text(&mut self, element: ElementId, text: &str) -> SurfaceResult<()> {
        let el = self.element(element)?;
        el.focus().await.map_err(action_err)?;
        el.type_str(text).await.map_err(action_err)?;
        Ok(())
    }

    async fn fill(&mut self, element: ElementId, text: &str) -> SurfaceResult<()> {
        let literal = serde_json::to_string(text)
            .map_err(|e| SurfaceError::Action(e.to_string()))?;
        let function = format!(
            "function() {{
                this.value = {literal};
                this.dispatchEvent(new Event('input', {{ bubbles: true }}));
            }}"
        );
        self.call(element, function).await?;
        Ok(())
    }

    async fn press_key(&mut self, element: Option<ElementId>, key: &str) -> SurfaceResult<()> {
        match element {
            Some(id) => {
                self.element(id)?.press_key(key).await.map_err(action_err)?;
            }
            None => {
                let body = self.page.find_element("body").await.map_err(action_err)?;
                body.press_key(key).await.map_err(action_err)?;
            }
        }
        Ok(())
    }

    async fn bounding_box(&mut self, element: ElementId) -> SurfaceResult<Option<BoundingBox>> {
        match self.element(element)?.bounding_box().await {
            Ok(b) => Ok(Some(BoundingBox {
                x: b.x,
                y: b.y,
                width: b.width,
                height: b.height,
            })),
            Err(e) => {
                debug!("no box model for {:?}: {}", element, e);
                Ok(None)
            }
        }
    }

    async fn screenshot(&mut self, region: ShotRegion) -> SurfaceResult<Vec<u8>> {
        let builder = ScreenshotParams::builder().format(CaptureScreenshotFormat::Png);
        let params = match region {
            ShotRegion::Viewport => builder.build(),
            ShotRegion::FullPage => builder.full_page(true).build(),
            ShotRegion::Clip(clip) => builder
                .clip(Viewport {
                    x: clip.x,
                    y: clip.y,
                    width: clip.width,
                    height: clip.height,
                    scale: 1.0,
                })
                .capture_beyond_viewport(true)
                .build(),
        };
        self.page
            .screenshot(params)
            .await
            .map_err(|e| SurfaceError::Capture(e.to_string()))
    }

    async fn disconnect(&mut self) -> SurfaceResult<()> {
        self.elements.clear();
        if let Some(mut browser) = self.browser.take() {
            if self.owns_browser {
                if let Err(e) = browser.close().await {
                    warn!("browser did not close cleanly: {}", e);
                }
            }
            drop(browser);
        }
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
        Ok(())
    }

    fn source_type(&self) -> &str {
        "cdp"
    }
}

impl Drop for CdpSurface {
    fn drop(&mut self) {
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
    }
}
