//! Scripted in-memory UI surface.
//!
//! A `MockApp` is a flat list of rectangles grouped into named screens.
//! Clicking an element or pressing a key may move the app to another
//! screen; screenshots are rendered through `MockFramebuffer`. Every call
//! is recorded in a shared `MockJournal` so callers can inspect ordering.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

use super::backend::{Connector, UiSurface};
use super::framebuffer::MockFramebuffer;
use super::types::{
    BoundingBox, ElementId, Locator, ShotRegion, SurfaceError, SurfaceResult, ViewportSize,
};

const BACKGROUND: [u8; 3] = [248, 248, 250];
const OUTLINE: [u8; 3] = [60, 60, 70];
const TEXT: [u8; 3] = [20, 20, 30];

/// One rectangle of the scripted UI
#[derive(Debug, Clone)]
pub struct MockElement {
    /// CSS selectors this element answers to, compared literally
    pub selectors: Vec<String>,
    pub text: String,
    pub bbox: BoundingBox,
    /// Screens on which the element is present (empty = every screen)
    pub screens: Vec<String>,
    /// Option values when the element is a `<select>`
    pub options: Vec<String>,
    /// Screen to switch to when clicked
    pub goes_to: Option<String>,
    pub color: [u8; 3],
}

impl MockElement {
    pub fn new(selectors: &[&str], text: impl Into<String>, rect: (f64, f64, f64, f64)) -> Self {
        Self {
            selectors: selectors.iter().map(|s| s.to_string()).collect(),
            text: text.into(),
            bbox: BoundingBox {
                x: rect.0,
                y: rect.1,
                width: rect.2,
                height: rect.3,
            },
            screens: Vec::new(),
            options: Vec::new(),
            goes_to: None,
            color: [255, 255, 255],
        }
    }

    pub fn on(mut self, screens: &[&str]) -> Self {
        self.screens = screens.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn options(mut self, values: &[&str]) -> Self {
        self.options = values.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn goes_to(mut self, screen: impl Into<String>) -> Self {
        self.goes_to = Some(screen.into());
        self
    }

    pub fn color(mut self, color: [u8; 3]) -> Self {
        self.color = color;
        self
    }

    fn visible_on(&self, screen: &str) -> bool {
        self.screens.is_empty() || self.screens.iter().any(|s| s == screen)
    }

    fn answers(&self, selector: &str) -> bool {
        self.selectors.iter().any(|s| s == selector)
    }

    fn label(&self) -> String {
        if self.text.is_empty() {
            self.selectors.first().cloned().unwrap_or_default()
        } else {
            self.text.clone()
        }
    }
}

/// A scripted application: elements, a start screen and key transitions
#[derive(Debug, Clone)]
pub struct MockApp {
    pub start: String,
    pub elements: Vec<MockElement>,
    /// (from screen, key, to screen)
    pub keys: Vec<(String, String, String)>,
    /// Selectors whose elements reject every action
    pub failing: Vec<String>,
}

impl MockApp {
    pub fn new(start: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            elements: Vec::new(),
            keys: Vec::new(),
            failing: Vec::new(),
        }
    }

    pub fn element(mut self, element: MockElement) -> Self {
        self.elements.push(element);
        self
    }

    pub fn on_key(mut self, from: &str, key: &str, to: &str) -> Self {
        self.keys.push((from.to_string(), key.to_string(), to.to_string()));
        self
    }

    /// Make actions on elements answering `selector` fail
    pub fn fail_on(mut self, selector: &str) -> Self {
        self.failing.push(selector.to_string());
        self
    }

    /// Drop every element answering `selector`
    pub fn without(mut self, selector: &str) -> Self {
        self.elements.retain(|e| !e.answers(selector));
        self
    }

    /// Remove one option value from every select answering `selector`
    pub fn without_option(mut self, selector: &str, value: &str) -> Self {
        for element in self.elements.iter_mut().filter(|e| e.answers(selector)) {
            element.options.retain(|o| o != value);
        }
        self
    }
}

/// Something the mock surface was asked to do
#[derive(Debug, Clone, PartialEq)]
pub enum MockEvent {
    Viewport(u32, u32),
    Click(String),
    Select(String),
    Type(String),
    Fill(String),
    Press(String),
    Screenshot { width: u32, height: u32 },
    Disconnect,
}

/// Shared, cloneable record of mock surface calls
#[derive(Debug, Clone, Default)]
pub struct MockJournal(Arc<Mutex<Vec<MockEvent>>>);

impl MockJournal {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, event: MockEvent) {
        let mut events = self.0.lock().unwrap_or_else(|e| e.into_inner());
        events.push(event);
    }

    pub fn events(&self) -> Vec<MockEvent> {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn count(&self, pred: impl Fn(&MockEvent) -> bool) -> usize {
        self.events().iter().filter(|e| pred(e)).count()
    }
}

/// In-memory `UiSurface` driven by a `MockApp`
pub struct MockSurface {
    app: MockApp,
    screen: String,
    viewport: (u32, u32),
    values: HashMap<usize, String>,
    journal: MockJournal,
    disconnected: bool,
}

impl MockSurface {
    pub fn new(app: MockApp, journal: MockJournal) -> Self {
        let screen = app.start.clone();
        Self {
            app,
            screen,
            viewport: ViewportSize::default().dimensions(),
            values: HashMap::new(),
            journal,
            disconnected: false,
        }
    }

    /// Name of the screen currently shown
    pub fn screen(&self) -> &str {
        &self.screen
    }

    /// Current value of an input or select
    pub fn value(&self, element: ElementId) -> Option<&str> {
        self.values.get(&element.0).map(String::as_str)
    }

    fn ensure_connected(&self) -> SurfaceResult<()> {
        if self.disconnected {
            return Err(SurfaceError::Connect("surface is disconnected".into()));
        }
        Ok(())
    }

    fn live(&self, element: ElementId) -> SurfaceResult<&MockElement> {
        self.ensure_connected()?;
        self.app
            .elements
            .get(element.0)
            .filter(|e| e.visible_on(&self.screen))
            .ok_or(SurfaceError::StaleElement(element))
    }

    fn actionable(&self, element: ElementId) -> SurfaceResult<&MockElement> {
        let el = self.live(element)?;
        if el.selectors.iter().any(|s| self.app.failing.contains(s)) {
            return Err(SurfaceError::Action(format!("'{}' rejected the action", el.label())));
        }
        Ok(el)
    }

    fn visible(&self) -> impl Iterator<Item = (usize, &MockElement)> {
        self.app
            .elements
            .iter()
            .enumerate()
            .filter(move |(_, e)| e.visible_on(&self.screen))
    }

    fn page_height(&self) -> u32 {
        let bottom = self
            .visible()
            .map(|(_, e)| (e.bbox.y + e.bbox.height).ceil().max(0.0) as u32)
            .max()
            .unwrap_or(0);
        bottom.max(self.viewport.1)
    }

    fn render(&self, height: u32) -> MockFramebuffer {
        let mut fb = MockFramebuffer::with_color(self.viewport.0, height, BACKGROUND);
        for (idx, el) in self.visible() {
            let x = el.bbox.x.max(0.0) as u32;
            let y = el.bbox.y.max(0.0) as u32;
            let w = el.bbox.width.max(0.0) as u32;
            let h = el.bbox.height.max(0.0) as u32;
            fb.draw_rect(x, y, w, h, el.color);
            fb.draw_outline(x, y, w, h, OUTLINE);
            if h >= 12 {
                fb.draw_text(x + 6, y + 4, &el.text, TEXT, el.color);
            }
            if let Some(value) = self.values.get(&idx) {
                if h >= 24 {
                    fb.draw_text(x + 6, y + 16, value, TEXT, el.color);
                }
            }
        }
        fb
    }
}

#[async_trait]
impl UiSurface for MockSurface {
    async fn set_viewport(&mut self, size: ViewportSize) -> SurfaceResult<()> {
        self.ensure_connected()?;
        self.viewport = size.dimensions();
        self.journal.record(MockEvent::Viewport(self.viewport.0, self.viewport.1));
        Ok(())
    }

    async fn query(&mut self, locator: &Locator) -> SurfaceResult<Option<ElementId>> {
        self.ensure_connected()?;
        let found = self
            .visible()
            .filter(|(_, e)| e.answers(&locator.selector))
            .filter(|(_, e)| locator.text.as_ref().is_none_or(|t| t.matches(&e.text)))
            .nth(locator.index)
            .map(|(idx, _)| ElementId(idx));
        Ok(found)
    }

    async fn click(&mut self, element: ElementId) -> SurfaceResult<()> {
        let el = self.actionable(element)?;
        let label = el.label();
        let next = el.goes_to.clone();
        self.journal.record(MockEvent::Click(label));
        if let Some(screen) = next {
            debug!("mock: {} -> {}", self.screen, screen);
            self.screen = screen;
        }
        Ok(())
    }

    async fn select_option(&mut self, element: ElementId, value: &str) -> SurfaceResult<bool> {
        let el = self.actionable(element)?;
        if !el.options.iter().any(|o| o == value) {
            return Ok(false);
        }
        self.values.insert(element.0, value.to_string());
        self.journal.record(MockEvent::Select(value.to_string()));
        Ok(true)
    }

    async fn type_text(&mut self, element: ElementId, text: &str) -> SurfaceResult<()> {
        self.actionable(element)?;
        self.values.entry(element.0).or_default().push_str(text);
        self.journal.record(MockEvent::Type(text.to_string()));
        Ok(())
    }

    async fn fill(&mut self, element: ElementId, text: &str) -> SurfaceResult<()> {
        self.actionable(element)?;
        self.values.insert(element.0, text.to_string());
        self.journal.record(MockEvent::Fill(text.to_string()));
        Ok(())
    }

    async fn press_key(&mut self, element: Option<ElementId>, key: &str) -> SurfaceResult<()> {
        match element {
            Some(id) => {
                self.actionable(id)?;
            }
            None => self.ensure_connected()?,
        }
        self.journal.record(MockEvent::Press(key.to_string()));
        let next = self
            .app
            .keys
            .iter()
            .find(|(from, k, _)| *from == self.screen && k == key)
            .map(|(_, _, to)| to.clone());
        if let Some(screen) = next {
            self.screen = screen;
        }
        Ok(())
    }

    async fn bounding_box(&mut self, element: ElementId) -> SurfaceResult<Option<BoundingBox>> {
        let el = self.live(element)?;
        if el.bbox.width <= 0.0 || el.bbox.height <= 0.0 {
            return Ok(None);
        }
        Ok(Some(el.bbox))
    }

    async fn screenshot(&mut self, region: ShotRegion) -> SurfaceResult<Vec<u8>> {
        self.ensure_connected()?;
        let fb = match region {
            ShotRegion::Viewport => self.render(self.viewport.1),
            ShotRegion::FullPage => self.render(self.page_height()),
            ShotRegion::Clip(clip) => {
                let page = self.render(self.page_height());
                page.crop(&clip)?
            }
        };
        self.journal.record(MockEvent::Screenshot {
            width: fb.width(),
            height: fb.height(),
        });
        fb.to_png()
    }

    async fn disconnect(&mut self) -> SurfaceResult<()> {
        self.journal.record(MockEvent::Disconnect);
        self.disconnected = true;
        Ok(())
    }

    fn source_type(&self) -> &str {
        "mock"
    }
}

/// Hands out `MockSurface`s that share one journal
#[derive(Debug, Clone)]
pub struct MockConnector {
    app: MockApp,
    journal: MockJournal,
    refuse: bool,
}

impl MockConnector {
    pub fn new(app: MockApp) -> Self {
        Self {
            app,
            journal: MockJournal::new(),
            refuse: false,
        }
    }

    /// A connector whose every connection attempt fails
    pub fn refusing(app: MockApp) -> Self {
        Self {
            refuse: true,
            ..Self::new(app)
        }
    }

    pub fn journal(&self) -> MockJournal {
        self.journal.clone()
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self) -> SurfaceResult<Box<dyn UiSurface>> {
        if self.refuse {
            return Err(SurfaceError::Connect("mock connection refused".into()));
        }
        Ok(Box::new(MockSurface::new(self.app.clone(), self.journal.clone())))
    }

    fn describe(&self) -> String {
        format!("mock app ({} elements)", self.app.elements.len())
    }
}

/// Screens on which the main window is drawn underneath
const MAIN: &[&str] = &[
    "main",
    "settings",
    "settings-general",
    "settings-advanced",
    "add-server",
    "profiles",
    "profile-new",
];
const SETTINGS: &[&str] = &["settings", "settings-general", "settings-advanced"];
const PROFILES: &[&str] = &["profiles", "profile-new"];

const PRIMARY: [u8; 3] = [87, 13, 248];
const NEUTRAL: [u8; 3] = [229, 231, 235];
const PANEL: [u8; 3] = [255, 255, 255];

/// A stand-in for the configuration manager the built-in itineraries tour:
/// landing page, main window, settings tabs, add-server and profile dialogs.
pub fn demo_app() -> MockApp {
    let mut app = MockApp::new("landing")
        .element(
            MockElement::new(&[".min-h-screen", "body"], "", (0.0, 0.0, 1920.0, 1080.0))
                .color(BACKGROUND),
        )
        // landing
        .element(
            MockElement::new(&["h1"], "My MCP Manager", (760.0, 380.0, 400.0, 60.0))
                .on(&["landing"])
                .color(BACKGROUND),
        )
        .element(
            MockElement::new(
                &["button", "button.btn-primary"],
                "Get Started",
                (860.0, 600.0, 200.0, 56.0),
            )
            .on(&["landing"])
            .goes_to("main")
            .color(PRIMARY),
        )
        // main window
        .element(
            MockElement::new(&[".navbar"], "MCP Config Manager", (0.0, 0.0, 1920.0, 64.0))
                .on(MAIN)
                .color(NEUTRAL),
        )
        .element(
            MockElement::new(
                &["button", "button.btn-ghost.profiles"],
                "Profiles",
                (1560.0, 12.0, 120.0, 40.0),
            )
            .on(MAIN)
            .goes_to("profiles"),
        )
        .element(
            MockElement::new(&["button"], "Settings", (1700.0, 12.0, 140.0, 40.0))
                .on(MAIN)
                .goes_to("settings"),
        )
        .element(
            MockElement::new(
                &["select", "select.select-bordered"],
                "Select client",
                (40.0, 90.0, 320.0, 44.0),
            )
            .on(MAIN)
            .options(&["claude-desktop", "claude-code", "kiro", "cursor", "windsurf"]),
        )
        .element(
            MockElement::new(&[".btn-group"], "", (400.0, 90.0, 300.0, 44.0))
                .on(MAIN)
                .color(NEUTRAL),
        );

    for (i, scope) in ["User", "Project", "System"].iter().enumerate() {
        let x = 400.0 + 100.0 * i as f64;
        app = app.element(
            MockElement::new(
                &["button", "button.btn-sm"],
                *scope,
                (x, 90.0, 100.0, 44.0)).on(MAIN,
            ),
        );
    }

    app = app
        .element(
            MockElement::new(
                &["button", "button.btn-primary"],
                "Add Server",
                (1700.0, 90.0, 180.0, 44.0),
            )
            .on(MAIN)
            .goes_to("add-server")
            .color(PRIMARY),
        )
        .element(
            MockElement::new(&["table"], "", (40.0, 160.0, 1840.0, 600.0))
                .on(MAIN)
                .color(PANEL),
        )
        .element(
            MockElement::new(
                &["tbody tr:first-child", "tbody tr"],
                "github  npx @modelcontextprotocol/server-github",
                (40.0, 200.0, 1840.0, 56.0),
            )
            .on(MAIN),
        )
        .element(
            MockElement::new(
                &["tbody tr:first-child td:last-child"],
                "Copy Edit Delete",
                (1640.0, 200.0, 240.0, 56.0),
            )
            .on(MAIN),
        )
        .element(
            MockElement::new(
                &["tbody tr"],
                "filesystem  npx @modelcontextprotocol/server-filesystem",
                (40.0, 256.0, 1840.0, 56.0),
            )
            .on(MAIN),
        )
        .element(
            MockElement::new(
                &["button", "button.btn-success"],
                "Save Configuration",
                (1660.0, 790.0, 220.0, 44.0),
            )
            .on(MAIN)
            .color([34, 197, 94]),
        )
        .element(
            MockElement::new(
                &[".text-xs.text-gray-500"],
                "~/Library/Application Support/Claude/claude_desktop_config.json",
                (40.0, 1040.0, 900.0, 20.0),
            )
            .on(MAIN)
            .color(BACKGROUND),
        );

    // add-server dialog
    app = app
        .element(
            MockElement::new(&[".modal-box"], "Add Server", (460.0, 140.0, 1000.0, 800.0))
                .on(&["add-server"])
                .color(PANEL),
        )
        .element(
            MockElement::new(
                &[
                    "input[placeholder*=\"name\"]",
                    "input[placeholder*=\"name\" i]",
                    "input[placeholder*=\"Server name\"]",
                    "input",
                ],
                "Server name",
                (500.0, 200.0, 920.0, 44.0),
            )
            .on(&["add-server"]),
        )
        .element(
            MockElement::new(
                &[
                    "input[placeholder*=\"command\"]",
                    "input[placeholder*=\"command\" i]",
                    "input[placeholder*=\"Command\"]",
                    "input",
                ],
                "Command",
                (500.0, 260.0, 920.0, 44.0),
            )
            .on(&["add-server"]),
        )
        .element(
            MockElement::new(
                &[".form-control"],
                "Server Type  Local  Remote",
                (500.0, 320.0, 920.0, 70.0),
            )
            .on(&["add-server"]),
        )
        .element(
            MockElement::new(
                &[".form-control"],
                "Arguments",
                (500.0, 410.0, 920.0, 150.0),
            )
            .on(&["add-server"]),
        )
        .element(
            MockElement::new(
                &["button", "button.btn-sm.btn-primary"],
                "Add Argument",
                (1270.0, 420.0, 140.0, 32.0),
            )
            .on(&["add-server"])
            .color(PRIMARY),
        )
        .element(
            MockElement::new(
                &[
                    "input[placeholder*=\"argument\"]",
                    "input[placeholder*=\"argument\" i]",
                    "input[placeholder*=\"Argument\"]",
                    "input",
                ],
                "Argument",
                (520.0, 470.0, 740.0, 40.0),
            )
            .on(&["add-server"]),
        )
        .element(
            MockElement::new(
                &[".form-control"],
                "Environment Variables",
                (500.0, 580.0, 920.0, 240.0),
            )
            .on(&["add-server"]),
        )
        .element(
            MockElement::new(&["button"], "Add Variable", (1270.0, 590.0, 140.0, 32.0))
                .on(&["add-server"])
                .color(PRIMARY),
        );

    for row in 0..2 {
        let y = 640.0 + 50.0 * row as f64;
        app = app
            .element(
                MockElement::new(
                    &["input[placeholder*=\"Key\"]", "input"],
                    "Key",
                    (520.0, y, 360.0, 40.0),
                )
                .on(&["add-server"]),
            )
            .element(
                MockElement::new(
                    &["input[placeholder*=\"Value\"]", "input"],
                    "Value",
                    (900.0, y, 500.0, 40.0),
                )
                .on(&["add-server"]),
            );
    }

    app = app
        .element(
            MockElement::new(&["textarea"], "JSON format", (520.0, 740.0, 880.0, 70.0))
                .on(&["add-server"]),
        )
        .element(
            MockElement::new(
                &["button", "button.btn-ghost"],
                "Cancel",
                (1200.0, 870.0, 100.0, 40.0),
            )
            .on(&["add-server"])
            .goes_to("main"),
        )
        .element(
            MockElement::new(
                &["button", "button.btn-primary"],
                "Save Server",
                (1320.0, 870.0, 120.0, 40.0),
            )
            .on(&["add-server"])
            .goes_to("main")
            .color(PRIMARY),
        );

    // settings dialog
    app = app
        .element(
            MockElement::new(&[".modal-box"], "Settings", (360.0, 160.0, 1200.0, 760.0))
                .on(SETTINGS)
                .color(PANEL),
        )
        .element(
            MockElement::new(&["a.tab"], "Clients", (400.0, 200.0, 150.0, 40.0))
                .on(SETTINGS)
                .goes_to("settings"),
        )
        .element(
            MockElement::new(&["a.tab"], "General", (560.0, 200.0, 150.0, 40.0))
                .on(SETTINGS)
                .goes_to("settings-general"),
        )
        .element(
            MockElement::new(&["a.tab"], "Advanced", (720.0, 200.0, 150.0, 40.0))
                .on(SETTINGS)
                .goes_to("settings-advanced"),
        )
        .element(
            MockElement::new(
                &[".space-y-2"],
                "Detected clients",
                (400.0, 260.0, 1120.0, 360.0),
            )
            .on(&["settings"]),
        )
        .element(
            MockElement::new(&[".card"], "Custom Clients", (400.0, 640.0, 1120.0, 200.0))
                .on(&["settings"]),
        )
        .element(
            MockElement::new(
                &[".form-control"],
                "Theme  light  dark  system",
                (400.0, 260.0, 560.0, 80.0),
            )
            .on(&["settings-general"]),
        )
        .element(
            MockElement::new(
                &[".space-y-4"],
                "Developer options",
                (400.0, 260.0, 1120.0, 300.0),
            )
            .on(&["settings-advanced"]),
        )
        .element(
            MockElement::new(
                &["button", "button.btn-ghost"],
                "Close",
                (1420.0, 860.0, 100.0, 40.0),
            )
            .on(SETTINGS)
            .goes_to("main"),
        );

    // profiles dialog
    app = app
        .element(
            MockElement::new(&[".modal-box"], "Profiles", (560.0, 200.0, 800.0, 600.0))
                .on(PROFILES)
                .color(PANEL),
        )
        .element(
            MockElement::new(
                &[".dropdown-content"],
                "Development  Production",
                (1500.0, 60.0, 240.0, 200.0),
            )
            .on(&["profiles"]),
        )
        .element(
            MockElement::new(&["button"], "New Profile", (600.0, 720.0, 160.0, 40.0))
                .on(&["profiles"])
                .goes_to("profile-new")
                .color(PRIMARY),
        )
        .element(
            MockElement::new(
                &[
                    "input[placeholder*=\"Profile name\"]",
                    "input[placeholder*=\"Name\"]",
                    "input",
                ],
                "Profile name",
                (600.0, 280.0, 720.0, 44.0),
            )
            .on(&["profile-new"]),
        )
        .element(
            MockElement::new(
                &["textarea[placeholder*=\"Description\"]", "textarea"],
                "Description",
                (600.0, 340.0, 720.0, 120.0),
            )
            .on(&["profile-new"]),
        );

    for screen in [
        "settings",
        "settings-general",
        "settings-advanced",
        "add-server",
        "profiles",
        "profile-new",
    ] {
        app = app.on_key(screen, "Escape", "main");
    }
    app
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::ClipRect;
    use pretty_assertions::assert_eq;

    fn surface() -> (MockSurface, MockJournal) {
        let journal = MockJournal::new();
        (MockSurface::new(demo_app(), journal.clone()), journal)
    }

    #[tokio::test]
    async fn test_query_respects_screen() {
        let (mut s, _) = surface();
        let get_started = Locator::css("button").containing("Get Started");
        let settings = Locator::css("button").containing("Settings");

        assert!(s.query(&get_started).await.unwrap().is_some());
        assert!(s.query(&settings).await.unwrap().is_none());

        let id = s.query(&get_started).await.unwrap().unwrap();
        s.click(id).await.unwrap();
        assert_eq!(s.screen(), "main");
        assert!(s.query(&get_started).await.unwrap().is_none());
        assert!(s.query(&settings).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_exact_text_and_nth() {
        let (mut s, _) = surface();
        s.screen = "main".into();
        let project = s
            .query(&Locator::css("button.btn-sm").exact("Project"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(s.app.elements[project.0].text, "Project");

        s.screen = "add-server".into();
        let second_key = s
            .query(&Locator::css("input[placeholder*=\"Key\"]").nth(1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(s.app.elements[second_key.0].bbox.y, 690.0);
    }

    #[tokio::test]
    async fn test_select_missing_option() {
        let journal = MockJournal::new();
        let app = demo_app().without_option("select", "kiro");
        let mut s = MockSurface::new(app, journal.clone());
        s.screen = "main".into();

        let select = s.query(&Locator::css("select")).await.unwrap().unwrap();
        assert!(!s.select_option(select, "kiro").await.unwrap());
        assert!(s.select_option(select, "claude-desktop").await.unwrap());
        assert_eq!(s.value(select), Some("claude-desktop"));
        assert_eq!(journal.events(), vec![MockEvent::Select("claude-desktop".into())]);
    }

    #[tokio::test]
    async fn test_escape_closes_dialog() {
        let (mut s, _) = surface();
        s.screen = "settings-general".into();
        s.press_key(None, "Escape").await.unwrap();
        assert_eq!(s.screen(), "main");

        // no transition registered for main
        s.press_key(None, "Escape").await.unwrap();
        assert_eq!(s.screen(), "main");
    }

    #[tokio::test]
    async fn test_stale_handle_after_screen_change() {
        let (mut s, _) = surface();
        let id = s
            .query(&Locator::css("button").containing("Get Started"))
            .await
            .unwrap()
            .unwrap();
        s.click(id).await.unwrap();
        assert!(matches!(s.click(id).await, Err(SurfaceError::StaleElement(_))));
    }

    #[tokio::test]
    async fn test_screenshot_regions() {
        let (mut s, journal) = surface();
        s.set_viewport(ViewportSize::Laptop).await.unwrap();

        let png = s.screenshot(ShotRegion::Viewport).await.unwrap();
        let fb = MockFramebuffer::from_png_bytes(&png).unwrap();
        assert_eq!((fb.width(), fb.height()), (1440, 900));

        let png = s.screenshot(ShotRegion::FullPage).await.unwrap();
        let fb = MockFramebuffer::from_png_bytes(&png).unwrap();
        assert_eq!((fb.width(), fb.height()), (1440, 1080));

        let clip = ClipRect::new(840.0, 580.0, 240.0, 96.0);
        let png = s.screenshot(ShotRegion::Clip(clip)).await.unwrap();
        let fb = MockFramebuffer::from_png_bytes(&png).unwrap();
        assert_eq!((fb.width(), fb.height()), (240, 96));
        // button fill sits inside the padding
        assert_eq!(fb.get_pixel(120, 90), BACKGROUND);
        assert_eq!(fb.get_pixel(30, 45), PRIMARY);

        assert_eq!(
            journal.count(|e| matches!(e, MockEvent::Screenshot { .. })),
            3
        );
    }

    #[tokio::test]
    async fn test_failing_selector() {
        let app = demo_app().fail_on("button.btn-primary");
        let mut s = MockSurface::new(app, MockJournal::new());
        let id = s
            .query(&Locator::css("button.btn-primary"))
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(s.click(id).await, Err(SurfaceError::Action(_))));
    }

    #[tokio::test]
    async fn test_disconnect_blocks_further_calls() {
        let (mut s, journal) = surface();
        s.disconnect().await.unwrap();
        assert!(s.query(&Locator::css("body")).await.is_err());
        assert_eq!(journal.events(), vec![MockEvent::Disconnect]);
    }

    #[tokio::test]
    async fn test_refusing_connector() {
        let connector = MockConnector::refusing(demo_app());
        assert!(connector.connect().await.is_err());

        let connector = MockConnector::new(demo_app());
        let surface = connector.connect().await.unwrap();
        assert_eq!(surface.source_type(), "mock");
    }
}
