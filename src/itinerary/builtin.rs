//! Built-in itineraries for the configuration manager's documentation.
//!
//! - `web-docs`: marketing shots of the web preview (1440x900, `docs/`)
//! - `docs`: the same tour against the Electron build
//! - `userguide`: settings, server and profile dialogs at 1920x1080
//! - `userguide-complete`: numbered, cropped user guide set with a README index
//! - `userguide-remaining`: settings tabs, filled dialogs, scopes and toolbars
//!   the numbered set leaves out, with a per-category summary

use super::types::{
    Action, CaptureMode, CaptureStep, ConnectMode, HostSpec, IndexSection, IndexSpec, Itinerary,
    ItineraryError, ItineraryResult, ReadyMarker, Target,
};
use crate::surface::{Locator, Padding, ViewportSize};

/// Names accepted by [`builtin`], in listing order
pub const BUILTIN_NAMES: &[&str] = &[
    "web-docs",
    "docs",
    "userguide",
    "userguide-complete",
    "userguide-remaining",
];

/// Look up a built-in itinerary by name
pub fn builtin(name: &str) -> ItineraryResult<Itinerary> {
    match name {
        "web-docs" => Ok(marketing(false)),
        "docs" => Ok(marketing(true)),
        "userguide" => Ok(userguide()),
        "userguide-complete" => Ok(userguide_complete()),
        "userguide-remaining" => Ok(userguide_remaining()),
        other => Err(ItineraryError::UnknownBuiltin(other.to_string())),
    }
}

/// Every built-in itinerary, in listing order
pub fn all() -> Vec<Itinerary> {
    vec![
        marketing(false),
        marketing(true),
        userguide(),
        userguide_complete(),
        userguide_remaining(),
    ]
}

fn electron_host() -> HostSpec {
    HostSpec {
        program: "npx".into(),
        args: vec!["electron".into(), "dist/main/main.js".into()],
        cwd: None,
        kill_pattern: Some("Electron.*mcp-config-manager".into()),
    }
}

fn css(selector: &str) -> Locator {
    Locator::css(selector)
}

fn button(text: &str) -> Locator {
    Locator::css("button").containing(text)
}

fn tab(text: &str) -> Locator {
    Locator::css("a.tab").containing(text)
}

fn select(value: &str) -> Action {
    Action::Select {
        value: value.into(),
    }
}

fn typing(text: &str) -> Action {
    Action::Type { text: text.into() }
}

fn fill(text: &str) -> Action {
    Action::Fill { text: text.into() }
}

fn escape() -> CaptureStep {
    CaptureStep::new("Close dialog")
        .action(Action::Press {
            key: "Escape".into(),
        })
        .settle(1000)
}

fn crop(top: f64, right: f64, bottom: f64, left: f64, max_height: Option<f64>) -> CaptureMode {
    CaptureMode::Element {
        padding: Padding {
            top,
            right,
            bottom,
            left,
        },
        max_height,
        max_width: None,
        span_viewport: false,
    }
}

/// Height-capped element crop. Negative padding insets the crop.
fn crop_capped(padding: Padding, max_width: Option<f64>, max_height: f64) -> CaptureMode {
    CaptureMode::Element {
        padding,
        max_height: Some(max_height),
        max_width,
        span_viewport: false,
    }
}

fn sections(list: &[(&str, &str)]) -> Vec<IndexSection> {
    list.iter()
        .map(|(prefix, heading)| IndexSection {
            prefix: prefix.to_string(),
            heading: heading.to_string(),
        })
        .collect()
}

/// Marketing tour. The Electron flavour spawns the host, waits longer and
/// only shoots the landing page when it is actually shown.
fn marketing(electron: bool) -> Itinerary {
    let (select_settle, modal_settle) = if electron { (2000, 1500) } else { (1500, 1000) };
    let (name_input, command_input, arg_input) = if electron {
        (
            r#"input[placeholder*="Server name"]"#,
            r#"input[placeholder*="Command"]"#,
            r#"input[placeholder*="Argument"]"#,
        )
    } else {
        (
            r#"input[placeholder*="name"]"#,
            r#"input[placeholder*="command"]"#,
            r#"input[placeholder*="argument"]"#,
        )
    };
    let (modal_file, full_file) = if electron {
        ("screenshot-add-server-modal.png", "screenshot-full-page.png")
    } else {
        ("screenshot-add-server.png", "screenshot-full-screen.png")
    };

    let mut landing = CaptureStep::new("Landing page").capture(
        CaptureMode::Viewport,
        "screenshot-landing.png",
        "Landing page",
    );
    if electron {
        landing = landing.id("landing").target(button("Get Started"));
    }

    let steps = vec![
        landing,
        CaptureStep::new("Get Started")
            .target(button("Get Started"))
            .action(Action::Click)
            .settle(2000),
        CaptureStep::new("Main interface")
            .target(css("select"))
            .action(Action::WaitFor { timeout_ms: 5000 })
            .capture(
                CaptureMode::Viewport,
                "screenshot-main-interface.png",
                "Main interface",
            ),
        CaptureStep::new("Claude Desktop view")
            .id("claude-desktop")
            .target(css("select"))
            .action(select("claude-desktop"))
            .settle(select_settle)
            .capture(
                CaptureMode::Viewport,
                "screenshot-claude-desktop.png",
                "Claude Desktop selected",
            ),
        CaptureStep::new("Open Add Server")
            .id("add-server")
            .target(css("button.btn-primary"))
            .action(Action::Click)
            .settle(modal_settle),
        CaptureStep::new("Server name")
            .target(css(name_input))
            .action(typing("GitHub MCP Server"))
            .after("add-server"),
        CaptureStep::new("Server command")
            .target(css(command_input))
            .action(typing("npx @modelcontextprotocol/server-github"))
            .after("add-server"),
        CaptureStep::new("Add argument")
            .id("add-argument")
            .target(css("button.btn-sm.btn-primary"))
            .action(Action::Click)
            .settle(500)
            .after("add-server"),
        CaptureStep::new("Argument value")
            .target(css(arg_input))
            .action(typing("--token YOUR_GITHUB_TOKEN"))
            .after("add-argument"),
        CaptureStep::new("Add Server modal")
            .capture(CaptureMode::Viewport, modal_file, "Add Server modal")
            .after("add-server"),
        CaptureStep::new("Cancel Add Server")
            .target(css("button.btn-ghost"))
            .action(Action::Click)
            .settle(500)
            .after("add-server"),
        CaptureStep::new("Settings - Client Management")
            .id("settings")
            .target(button("Settings"))
            .action(Action::Click)
            .settle(1500)
            .capture(
                CaptureMode::Viewport,
                "screenshot-settings-clients.png",
                "Settings - Client Management",
            ),
        CaptureStep::new("Settings - General")
            .target(tab("General"))
            .action(Action::Click)
            .settle(1000)
            .capture(
                CaptureMode::Viewport,
                "screenshot-settings-general.png",
                "Settings - General",
            )
            .after("settings"),
        CaptureStep::new("Settings - Advanced")
            .target(tab("Advanced"))
            .action(Action::Click)
            .settle(1000)
            .capture(
                CaptureMode::Viewport,
                "screenshot-settings-advanced.png",
                "Settings - Advanced",
            )
            .after("settings"),
        CaptureStep::new("Close Settings")
            .target(css("button.btn-ghost"))
            .action(Action::Click)
            .settle(500)
            .after("settings"),
        CaptureStep::new("Select Kiro")
            .id("kiro")
            .target(css("select"))
            .action(select("kiro"))
            .settle(select_settle),
        CaptureStep::new("Project scope")
            .target(css("button.btn-sm").exact("Project"))
            .action(Action::Click)
            .settle(1500)
            .capture(
                CaptureMode::Viewport,
                "screenshot-project-scope.png",
                "Project scope view",
            )
            .after("kiro"),
        CaptureStep::new("Full page").capture(CaptureMode::FullPage, full_file, "Full page view"),
        CaptureStep::new("Clean interface")
            .target(css("select"))
            .action(select("claude-desktop"))
            .settle(1500)
            .capture(
                CaptureMode::Viewport,
                "app-interface-clean.png",
                "Clean interface",
            ),
    ];

    let (name, description, mode, host, ready) = if electron {
        (
            "docs",
            "Marketing screenshots of the Electron app",
            ConnectMode::Spawn,
            Some(electron_host()),
            ReadyMarker {
                selector: ".min-h-screen".into(),
                timeout_ms: 10_000,
                settle_ms: 2000,
            },
        )
    } else {
        (
            "web-docs",
            "Marketing screenshots of the web preview",
            ConnectMode::Web,
            None,
            ReadyMarker {
                selector: ".min-h-screen".into(),
                timeout_ms: 5000,
                settle_ms: 0,
            },
        )
    };

    Itinerary {
        name: name.into(),
        description: description.into(),
        viewport: Some(ViewportSize::Laptop),
        mode,
        host,
        output_dir: Some("docs".into()),
        ready,
        steps,
        index: None,
    }
}

fn userguide_ready() -> ReadyMarker {
    ReadyMarker {
        selector: ".min-h-screen".into(),
        timeout_ms: 10_000,
        settle_ms: 2000,
    }
}

fn userguide() -> Itinerary {
    let dialog = CaptureMode::region(200.0, 100.0, 1520.0, 800.0);

    let steps = vec![
        CaptureStep::new("Get Started")
            .target(button("Get Started"))
            .action(Action::Click)
            .settle(2000),
        CaptureStep::new("Select Claude Desktop")
            .target(css("select"))
            .wait(5000)
            .action(select("claude-desktop"))
            .settle(2000),
        // settings
        CaptureStep::new("Settings - Client Management")
            .id("settings")
            .target(button("Settings"))
            .action(Action::Click)
            .settle(2000)
            .capture(
                dialog.clone(),
                "settings-client-management.png",
                "Settings - Client Management",
            ),
        CaptureStep::new("Settings - General")
            .target(tab("General"))
            .action(Action::Click)
            .settle(1500)
            .capture(dialog.clone(), "settings-general.png", "Settings - General")
            .after("settings"),
        CaptureStep::new("Settings - Advanced")
            .target(tab("Advanced"))
            .action(Action::Click)
            .settle(1500)
            .capture(dialog.clone(), "settings-advanced.png", "Settings - Advanced")
            .after("settings"),
        escape().after("settings"),
        // server with environment variables
        CaptureStep::new("Open Add Server")
            .id("add-server")
            .target(button("Add Server"))
            .action(Action::Click)
            .settle(1500),
        CaptureStep::new("Server name")
            .target(css(r#"input[placeholder*="Server name"]"#))
            .action(fill("GitHub MCP Server"))
            .after("add-server"),
        CaptureStep::new("Server command")
            .target(css(r#"input[placeholder*="Command"]"#))
            .action(fill("npx"))
            .after("add-server"),
        CaptureStep::new("Add argument")
            .id("add-argument")
            .target(button("Add Argument"))
            .action(Action::Click)
            .settle(500)
            .after("add-server"),
        CaptureStep::new("Argument value")
            .target(css(r#"input[placeholder*="Argument"]"#))
            .action(fill("@modelcontextprotocol/server-github"))
            .after("add-argument"),
        CaptureStep::new("Add first variable")
            .id("add-variable")
            .target(button("Add Variable"))
            .action(Action::Click)
            .settle(500)
            .after("add-server"),
        CaptureStep::new("First variable key")
            .target(css(r#"input[placeholder*="Key"]"#))
            .action(fill("GITHUB_TOKEN"))
            .after("add-variable"),
        CaptureStep::new("First variable value")
            .target(css(r#"input[placeholder*="Value"]"#))
            .action(fill("ghp_xxxxxxxxxxxxxxxxxxxx"))
            .after("add-variable"),
        CaptureStep::new("Add second variable")
            .id("add-variable-2")
            .target(button("Add Variable"))
            .action(Action::Click)
            .settle(500)
            .after("add-server"),
        CaptureStep::new("Second variable key")
            .target(css(r#"input[placeholder*="Key"]"#).nth(1))
            .action(fill("GITHUB_ORG"))
            .after("add-variable-2"),
        CaptureStep::new("Second variable value")
            .target(css(r#"input[placeholder*="Value"]"#).nth(1))
            .action(fill("my-organization"))
            .after("add-variable-2"),
        CaptureStep::new("Server environment variables")
            .action(Action::Pause)
            .settle(1000)
            .capture(
                dialog.clone(),
                "server-environment-variables.png",
                "Server configuration with environment variables",
            )
            .after("add-server"),
        escape().after("add-server"),
        // profiles
        CaptureStep::new("Open Profiles")
            .id("profiles")
            .target(button("Profiles"))
            .action(Action::Click)
            .settle(1500),
        CaptureStep::new("Create profile")
            .id("create-profile")
            .target(Target::FirstOf(vec![
                button("Create Profile"),
                button("New Profile"),
                button("Add Profile"),
            ]))
            .action(Action::Click)
            .settle(1500)
            .after("profiles"),
        CaptureStep::new("Profile name")
            .target(Target::FirstOf(vec![
                css(r#"input[placeholder*="Profile name"]"#),
                css(r#"input[placeholder*="Name"]"#),
            ]))
            .action(fill("Development Environment"))
            .after("create-profile"),
        CaptureStep::new("Profile description")
            .target(Target::FirstOf(vec![
                css(r#"input[placeholder*="Description"]"#),
                css(r#"textarea[placeholder*="Description"]"#),
            ]))
            .action(fill(
                "Profile for development with GitHub, filesystem, and database access",
            ))
            .after("create-profile"),
        CaptureStep::new("Profile creation")
            .action(Action::Pause)
            .settle(1000)
            .capture(dialog.clone(), "profile-creation.png", "Profile creation form")
            .after("create-profile"),
        escape().after("create-profile"),
        CaptureStep::new("Profiles view")
            .capture(dialog, "profiles-view.png", "Profiles view")
            .after("profiles")
            .unless("create-profile"),
        escape().after("profiles"),
        // full screen
        CaptureStep::new("Main interface").capture(
            CaptureMode::Viewport,
            "main-interface-fullscreen.png",
            "Main interface in full screen",
        ),
        CaptureStep::new("Kiro interface")
            .target(css("select"))
            .action(select("kiro"))
            .settle(2000)
            .capture(
                CaptureMode::Viewport,
                "kiro-interface-fullscreen.png",
                "Kiro selected, full screen",
            ),
    ];

    Itinerary {
        name: "userguide".into(),
        description: "User guide screenshots of the Electron app".into(),
        viewport: Some(ViewportSize::FullHd),
        mode: ConnectMode::Spawn,
        host: Some(electron_host()),
        output_dir: Some("docs/userguide".into()),
        ready: userguide_ready(),
        steps,
        index: None,
    }
}

fn userguide_complete() -> Itinerary {
    let env_json = concat!(
        "{\n",
        "  \"GITHUB_TOKEN\": \"ghp_xxxxxxxxxxxx\",\n",
        "  \"GITHUB_ORG\": \"my-organization\",\n",
        "  \"DEBUG\": \"true\"\n",
        "}"
    );

    let steps = vec![
        // 00 landing
        CaptureStep::new("Landing page")
            .id("landing")
            .target(button("Get Started"))
            .capture(CaptureMode::Viewport, "00-landing-page.png", "Full landing page"),
        CaptureStep::new("Get Started button")
            .target(css("button"))
            .capture(
                CaptureMode::element(20.0),
                "00-landing-get-started-button.png",
                "Get Started button focus",
            )
            .after("landing"),
        CaptureStep::new("Get Started")
            .target(button("Get Started"))
            .action(Action::Click)
            .settle(2000)
            .after("landing"),
        // 01 main interface
        CaptureStep::new("Main interface").capture(
            CaptureMode::Viewport,
            "01-main-interface-full.png",
            "Complete main interface",
        ),
        CaptureStep::new("Client dropdown")
            .target(css("select"))
            .capture(
                CaptureMode::element(20.0),
                "01-main-client-dropdown.png",
                "Client selection dropdown",
            ),
        CaptureStep::new("Scope buttons")
            .target(css(".btn-group"))
            .capture(
                CaptureMode::element(10.0),
                "01-main-scope-buttons.png",
                "Scope selection buttons (User/Project/System)",
            ),
        CaptureStep::new("Select Claude Desktop")
            .target(css("select"))
            .action(select("claude-desktop"))
            .settle(2000),
        // 02 server list
        CaptureStep::new("Server list").capture(
            CaptureMode::region(0.0, 150.0, 1920.0, 700.0),
            "02-server-list-full.png",
            "Full server list table",
        ),
        CaptureStep::new("Server row")
            .target(css("tbody tr:first-child"))
            .capture(
                crop(0.0, 0.0, 10.0, 0.0, None),
                "02-server-row-detail.png",
                "Single server row with all details",
            ),
        // 03 add server
        CaptureStep::new("Open Add Server")
            .id("add-server")
            .target(button("Add Server"))
            .action(Action::Click)
            .settle(1500),
        CaptureStep::new("Add Server modal")
            .target(css(".modal-box"))
            .capture(
                CaptureMode::element(0.0),
                "03-add-server-modal-full.png",
                "Complete Add Server modal",
            )
            .after("add-server"),
        CaptureStep::new("Server name")
            .target(css(r#"input[placeholder*="Server name"]"#))
            .action(fill("GitHub MCP Server"))
            .after("add-server"),
        CaptureStep::new("Server command")
            .target(css(r#"input[placeholder*="Command"]"#))
            .action(fill("npx"))
            .after("add-server"),
        CaptureStep::new("Server name field")
            .target(css(r#"input[placeholder*="Server name"]"#))
            .capture(
                CaptureMode::element(20.0),
                "03-add-server-name-field.png",
                "Server name input field",
            )
            .after("add-server"),
        CaptureStep::new("Server type")
            .target(css(".form-control").containing("Server Type"))
            .capture(
                crop(0.0, 0.0, 20.0, 0.0, None),
                "03-add-server-type-selector.png",
                "Local/Remote server type selector",
            )
            .after("add-server"),
        CaptureStep::new("Add argument")
            .id("add-argument")
            .target(button("Add Argument"))
            .action(Action::Click)
            .settle(500)
            .after("add-server"),
        CaptureStep::new("Argument value")
            .target(css(r#"input[placeholder*="Argument"]"#))
            .action(fill("@modelcontextprotocol/server-github"))
            .after("add-argument"),
        CaptureStep::new("Arguments section")
            .target(css(".form-control").containing("Arguments"))
            .capture(
                crop(10.0, 0.0, 10.0, 0.0, Some(200.0)),
                "03-add-server-arguments.png",
                "Arguments configuration section",
            )
            .after("add-server"),
        CaptureStep::new("Environment JSON")
            .target(Target::FirstOf(vec![
                css("textarea"),
                css(r#"input[placeholder*="JSON format"]"#),
            ]))
            .action(fill(env_json))
            .settle(500)
            .after("add-server"),
        CaptureStep::new("Environment section")
            .target(css(".form-control").containing("Environment Variables"))
            .capture(
                crop(10.0, 0.0, 40.0, 0.0, Some(300.0)),
                "03-add-server-environment-vars.png",
                "Environment variables (JSON format)",
            )
            .after("add-server"),
        escape().after("add-server"),
        // 04 settings
        CaptureStep::new("Open Settings")
            .id("settings")
            .target(button("Settings"))
            .action(Action::Click)
            .settle(2000),
        CaptureStep::new("Settings modal")
            .target(css(".modal-box"))
            .capture(
                CaptureMode::element(0.0),
                "04-settings-modal-full.png",
                "Complete Settings modal",
            )
            .after("settings"),
        CaptureStep::new("Clients list")
            .target(css(".space-y-2"))
            .capture(
                crop(20.0, 20.0, 20.0, 20.0, Some(600.0)),
                "04-settings-clients-list.png",
                "Detected clients list",
            )
            .after("settings"),
        CaptureStep::new("Custom clients")
            .target(css(".card").containing("Custom Clients"))
            .capture(
                crop(0.0, 0.0, 0.0, 0.0, Some(400.0)),
                "04-settings-custom-clients.png",
                "Custom clients configuration",
            )
            .after("settings"),
        CaptureStep::new("General tab")
            .target(tab("General"))
            .action(Action::Click)
            .settle(1500)
            .capture(
                CaptureMode::region(300.0, 200.0, 1320.0, 600.0),
                "04-settings-general-full.png",
                "General settings tab",
            )
            .after("settings"),
        CaptureStep::new("Theme selector")
            .target(css(".form-control").containing("Theme"))
            .capture(
                CaptureMode::element(10.0),
                "04-settings-theme-selector.png",
                "Theme selection dropdown",
            )
            .after("settings"),
        CaptureStep::new("Advanced tab")
            .target(tab("Advanced"))
            .action(Action::Click)
            .settle(1500)
            .capture(
                CaptureMode::region(300.0, 200.0, 1320.0, 600.0),
                "04-settings-advanced-full.png",
                "Advanced settings tab",
            )
            .after("settings"),
        CaptureStep::new("Developer options")
            .target(css(".space-y-4"))
            .capture(
                crop(20.0, 20.0, 20.0, 20.0, Some(400.0)),
                "04-settings-developer-options.png",
                "Developer options toggles",
            )
            .after("settings"),
        escape().after("settings"),
        // 05 profiles
        CaptureStep::new("Profiles button")
            .target(button("Profiles"))
            .capture(
                CaptureMode::element(10.0),
                "05-profiles-button.png",
                "Profiles button in navbar",
            ),
        CaptureStep::new("Open Profiles")
            .id("profiles")
            .target(button("Profiles"))
            .action(Action::Click)
            .settle(1500),
        CaptureStep::new("Profiles modal")
            .target(css(".modal-box"))
            .capture(
                CaptureMode::element(0.0),
                "05-profiles-modal-full.png",
                "Profiles management modal",
            )
            .after("profiles"),
        CaptureStep::new("Profiles dropdown")
            .target(css(".dropdown-content"))
            .capture(
                CaptureMode::element(10.0),
                "05-profiles-dropdown.png",
                "Profiles quick selection dropdown",
            )
            .after("profiles"),
        escape().after("profiles"),
        // 06 scopes
        CaptureStep::new("Project scope")
            .target(css("button.btn-sm").exact("Project"))
            .action(Action::Click)
            .settle(1500),
        CaptureStep::new("Project scope view").capture(
            CaptureMode::region(0.0, 100.0, 1920.0, 800.0),
            "06-project-scope-view.png",
            "Project scope interface",
        ),
        CaptureStep::new("Status bar")
            .target(css(".text-xs.text-gray-500"))
            .capture(
                CaptureMode::Element {
                    padding: Padding {
                        top: 10.0,
                        right: 0.0,
                        bottom: 10.0,
                        left: 0.0,
                    },
                    max_height: None,
                    max_width: None,
                    span_viewport: true,
                },
                "06-status-bar-config-path.png",
                "Status bar showing active config file",
            ),
        // 07-08 actions
        CaptureStep::new("User scope")
            .target(css("button.btn-sm").exact("User"))
            .action(Action::Click)
            .settle(1500),
        CaptureStep::new("Server action buttons")
            .target(css("tbody tr:first-child td:last-child"))
            .capture(
                crop(10.0, 20.0, 10.0, 20.0, None),
                "07-server-action-buttons.png",
                "Copy, Edit, Delete buttons for servers",
            ),
        CaptureStep::new("Save button")
            .target(button("Save"))
            .capture(
                CaptureMode::element(10.0),
                "08-save-button.png",
                "Save configuration button",
            ),
    ];

    let sections = sections(&[
        ("00", "Landing Page"),
        ("01", "Main Interface"),
        ("02", "Server Management"),
        ("03", "Add/Edit Server Modal"),
        ("04", "Settings Modal"),
        ("05", "Profile Management"),
        ("06", "Scope Management"),
        ("07", "Actions"),
        ("08", "Actions"),
    ]);

    Itinerary {
        name: "userguide-complete".into(),
        description: "Numbered user guide set with focused crops and an index".into(),
        viewport: Some(ViewportSize::FullHd),
        mode: ConnectMode::Spawn,
        host: Some(electron_host()),
        output_dir: Some("docs/userguide".into()),
        ready: userguide_ready(),
        steps,
        index: Some(IndexSpec {
            file: "README.md".into(),
            title: "User Guide Screenshots".into(),
            sections,
        }),
    }
}

/// Shots the numbered set misses. Writes into the same directory, so its
/// summary goes to its own file instead of the README.
fn userguide_remaining() -> Itinerary {
    let env_json = concat!(
        "{\n",
        "  \"GITHUB_TOKEN\": \"ghp_xxxxxxxxxxxx\",\n",
        "  \"GITHUB_ORG\": \"my-organization\",\n",
        "  \"DEBUG\": \"true\",\n",
        "  \"API_URL\": \"https://api.github.com\"\n",
        "}"
    );
    // inner area of a dialog, below its title and tabs
    let focused = crop_capped(
        Padding {
            top: -100.0,
            right: -20.0,
            bottom: -50.0,
            left: -20.0,
        },
        None,
        400.0,
    );
    let modal = || Target::Element(css(".modal-box"));
    let page = CaptureMode::region(0.0, 40.0, 1920.0, 900.0);

    let steps = vec![
        CaptureStep::new("Get Started")
            .target(button("Get Started"))
            .action(Action::Click)
            .settle(2000),
        CaptureStep::new("Select Claude Desktop")
            .target(css("select"))
            .action(select("claude-desktop"))
            .settle(2000),
        // 04 settings, one full and one focused shot per tab
        CaptureStep::new("Open Settings")
            .id("settings")
            .target(button("Settings"))
            .action(Action::Click)
            .settle(2000),
        CaptureStep::new("Client Management tab")
            .target(modal())
            .capture(
                CaptureMode::element(0.0),
                "04-settings-client-management-full.png",
                "Settings - Client Management tab (full)",
            )
            .after("settings"),
        CaptureStep::new("Clients list")
            .target(modal())
            .capture(
                focused.clone(),
                "04-settings-clients-focused.png",
                "Settings - Clients list (focused)",
            )
            .after("settings"),
        CaptureStep::new("General tab")
            .target(tab("General"))
            .action(Action::Click)
            .settle(1500)
            .after("settings"),
        CaptureStep::new("General settings")
            .target(modal())
            .capture(
                CaptureMode::element(0.0),
                "04-settings-general-tab.png",
                "Settings - General tab",
            )
            .after("settings"),
        CaptureStep::new("General preferences")
            .target(modal())
            .capture(
                focused.clone(),
                "04-settings-general-focused.png",
                "Settings - General preferences (focused)",
            )
            .after("settings"),
        CaptureStep::new("Advanced tab")
            .target(tab("Advanced"))
            .action(Action::Click)
            .settle(1500)
            .after("settings"),
        CaptureStep::new("Advanced settings")
            .target(modal())
            .capture(
                CaptureMode::element(0.0),
                "04-settings-advanced-tab.png",
                "Settings - Advanced tab",
            )
            .after("settings"),
        CaptureStep::new("Developer options")
            .target(modal())
            .capture(
                focused,
                "04-settings-advanced-focused.png",
                "Settings - Developer options (focused)",
            )
            .after("settings"),
        escape().after("settings"),
        // 03 add server with data
        CaptureStep::new("Open Add Server")
            .id("add-server")
            .target(button("Add Server"))
            .action(Action::Click)
            .settle(1500),
        CaptureStep::new("Server name")
            .target(css(r#"input[placeholder*="name" i]"#))
            .action(fill("GitHub MCP Server"))
            .after("add-server"),
        CaptureStep::new("Server command")
            .target(css(r#"input[placeholder*="command" i]"#))
            .action(fill("npx"))
            .after("add-server"),
        CaptureStep::new("Add argument")
            .id("add-argument")
            .target(button("Add Argument"))
            .action(Action::Click)
            .settle(500)
            .after("add-server"),
        CaptureStep::new("Argument value")
            .target(css(r#"input[placeholder*="argument" i]"#))
            .action(fill("@modelcontextprotocol/server-github"))
            .after("add-argument"),
        CaptureStep::new("Environment JSON")
            .target(Target::FirstOf(vec![
                css("textarea"),
                css(r#"input[placeholder*="JSON format" i]"#),
            ]))
            .action(fill(env_json))
            .settle(500)
            .capture(
                crop_capped(
                    Padding {
                        top: 100.0,
                        right: 50.0,
                        bottom: 50.0,
                        left: 50.0,
                    },
                    Some(800.0),
                    400.0,
                ),
                "03-environment-variables-json.png",
                "Environment Variables JSON input (focused)",
            )
            .after("add-server"),
        CaptureStep::new("Add Server complete")
            .target(modal())
            .capture(
                CaptureMode::element(0.0),
                "03-add-server-complete.png",
                "Add Server modal (complete with data)",
            )
            .after("add-server"),
        escape().after("add-server"),
        // 05 profiles: modal, else dropdown, else the area around the button
        CaptureStep::new("Open Profiles")
            .id("profiles")
            .target(button("Profiles"))
            .action(Action::Click)
            .settle(1500),
        CaptureStep::new("Profiles modal")
            .id("profiles-modal")
            .target(modal())
            .capture(
                CaptureMode::element(0.0),
                "05-profiles-modal.png",
                "Profiles modal",
            )
            .after("profiles"),
        CaptureStep::new("Profiles dropdown")
            .target(css(".dropdown-content"))
            .capture(
                CaptureMode::element(20.0),
                "05-profiles-dropdown.png",
                "Profiles dropdown menu",
            )
            .after("profiles")
            .unless("profiles-modal"),
        CaptureStep::new("Profiles panel shown")
            .id("profiles-panel")
            .target(Target::FirstOf(vec![css(".modal-box"), css(".dropdown-content")]))
            .after("profiles"),
        CaptureStep::new("Profiles area")
            .target(button("Profiles"))
            .capture(
                // 400x300 from 50px above and left of the button
                crop_capped(
                    Padding {
                        top: 50.0,
                        right: 400.0,
                        bottom: 300.0,
                        left: 50.0,
                    },
                    Some(400.0),
                    300.0,
                ),
                "05-profiles-area.png",
                "Profiles area",
            )
            .after("profiles")
            .unless("profiles-panel"),
        CaptureStep::new("Close Profiles")
            .action(Action::Press {
                key: "Escape".into(),
            })
            .settle(500)
            .after("profiles"),
        // 06 scopes
        CaptureStep::new("Project scope")
            .target(css("button.btn-sm").exact("Project"))
            .action(Action::Click)
            .settle(1500)
            .capture(page.clone(), "06-project-scope.png", "Project scope view"),
        CaptureStep::new("System scope")
            .target(css("button.btn-sm").exact("System"))
            .action(Action::Click)
            .settle(1500)
            .capture(page, "06-system-scope.png", "System scope view"),
        // 07 details
        CaptureStep::new("User scope")
            .target(css("button.btn-sm").exact("User"))
            .action(Action::Click)
            .settle(1500),
        CaptureStep::new("Top toolbar").capture(
            CaptureMode::region(0.0, 0.0, 1920.0, 100.0),
            "07-top-toolbar.png",
            "Top toolbar",
        ),
        CaptureStep::new("Status bar").capture(
            CaptureMode::region(0.0, 1000.0, 1920.0, 80.0),
            "07-status-bar.png",
            "Status bar",
        ),
    ];

    Itinerary {
        name: "userguide-remaining".into(),
        description: "Settings tabs, filled dialogs, scopes and toolbars".into(),
        viewport: Some(ViewportSize::FullHd),
        mode: ConnectMode::Spawn,
        host: Some(electron_host()),
        output_dir: Some("docs/userguide".into()),
        ready: userguide_ready(),
        steps,
        index: Some(IndexSpec {
            file: "CATEGORIES.md".into(),
            title: "Screenshots by Category".into(),
            sections: sections(&[
                ("00", "Landing"),
                ("01", "Main Interface"),
                ("02", "Server List"),
                ("03", "Add Server"),
                ("04", "Settings"),
                ("05", "Profiles"),
                ("06", "Scopes"),
                ("07", "UI Details"),
            ]),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_every_builtin_validates() {
        for name in BUILTIN_NAMES {
            let it = builtin(name).unwrap();
            assert_eq!(it.name, *name);
            it.validate().unwrap_or_else(|e| panic!("{}: {}", name, e));
        }
        assert_eq!(all().len(), BUILTIN_NAMES.len());
    }

    #[test]
    fn test_unknown_builtin() {
        assert!(matches!(
            builtin("screenshots-v2"),
            Err(ItineraryError::UnknownBuiltin(_))
        ));
    }

    #[test]
    fn test_flavours_differ_in_file_names() {
        let web = builtin("web-docs").unwrap();
        let electron = builtin("docs").unwrap();
        assert!(web.capture_files().contains(&"screenshot-add-server.png"));
        assert!(electron.capture_files().contains(&"screenshot-add-server-modal.png"));
        assert_eq!(web.mode, ConnectMode::Web);
        assert_eq!(electron.mode, ConnectMode::Spawn);
        assert_eq!(web.capture_files().len(), 10);
        assert_eq!(electron.capture_files().len(), 10);
    }

    #[test]
    fn test_complete_guide_covers_index() {
        let it = builtin("userguide-complete").unwrap();
        let files = it.capture_files();
        assert_eq!(files.len(), 26);
        let index = it.index.as_ref().unwrap();
        for file in files {
            let prefix = &file[..2];
            assert!(
                index.sections.iter().any(|s| s.prefix == prefix),
                "no section for {}",
                file
            );
        }
    }

    #[test]
    fn test_remaining_guide_layout() {
        let it = builtin("userguide-remaining").unwrap();
        assert_eq!(it.capture_files().len(), 15);
        assert_eq!(it.viewport, Some(ViewportSize::FullHd));

        // writes next to the numbered set without replacing its README
        let index = it.index.as_ref().unwrap();
        assert_eq!(index.file, "CATEGORIES.md");
        assert_eq!(it.output_dir, builtin("userguide-complete").unwrap().output_dir);

        let area = it.steps.iter().find(|s| s.label == "Profiles area").unwrap();
        assert_eq!(area.unless.as_deref(), Some("profiles-panel"));
    }

    #[test]
    fn test_builtins_round_trip_through_json() {
        for it in all() {
            let json = serde_json::to_string_pretty(&it).unwrap();
            let back: Itinerary = serde_json::from_str(&json).unwrap();
            assert_eq!(back, it);
        }
    }
}
