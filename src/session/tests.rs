//! Session manager tests
//!
//! Lifecycle, extraction and coordinate interactions against the mock launcher.

use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::cdp::{MockBrowserLauncher, MockCdpClient, ScreenshotFormat};
use crate::config::Config;
use crate::Error;

const TIMEOUT: Duration = Duration::from_secs(5);

fn setup_with(config: Config) -> (SessionManagerImpl, Arc<MockBrowserLauncher>, Arc<MockCdpClient>) {
    let launcher = Arc::new(MockBrowserLauncher::new());
    let client = launcher.client();
    let manager = SessionManagerImpl::new(config, launcher.clone());
    (manager, launcher, client)
}

fn setup() -> (SessionManagerImpl, Arc<MockBrowserLauncher>, Arc<MockCdpClient>) {
    setup_with(Config::default())
}

fn rect(x: f64, y: f64, width: f64, height: f64) -> Value {
    json!({ "x": x, "y": y, "width": width, "height": height })
}

fn page_of(nodes: Value) -> Value {
    json!({
        "viewport": { "width": 1920, "height": 1080, "scrollX": 0, "scrollY": 0 },
        "nodes": nodes
    })
}

fn form_page() -> Value {
    page_of(json!([
        { "tag": "input", "rect": rect(100.0, 100.0, 200.0, 30.0), "type": "text", "name": "q" },
        { "tag": "button", "rect": rect(320.0, 100.0, 80.0, 30.0), "deepText": "Search" }
    ]))
}

fn mouse_points(client: &MockCdpClient) -> Vec<(f64, f64)> {
    client
        .calls_to("Input.dispatchMouseEvent")
        .iter()
        .map(|p| (p["x"].as_f64().unwrap(), p["y"].as_f64().unwrap()))
        .collect()
}

fn key_events(client: &MockCdpClient) -> Vec<(String, String)> {
    client
        .calls_to("Input.dispatchKeyEvent")
        .iter()
        .map(|p| {
            (
                p["type"].as_str().unwrap().to_string(),
                p["key"].as_str().unwrap().to_string(),
            )
        })
        .collect()
}

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test]
async fn test_fresh_manager_resolves_nothing() {
    let (manager, launcher, _client) = setup();

    assert!(!manager.is_active());
    assert!(manager.context().is_none());
    assert!(manager.get_element(5).is_none());
    assert!(manager.get_element(0).is_none());
    assert_eq!(launcher.launch_count(), 0);
}

#[tokio::test]
async fn test_operations_require_active_session() {
    let (manager, _launcher, _client) = setup();

    assert!(matches!(manager.extract(100, TIMEOUT).await, Err(Error::SessionNotActive)));
    assert!(matches!(manager.click(0, TIMEOUT).await, Err(Error::SessionNotActive)));
    assert!(matches!(manager.page_info(TIMEOUT).await, Err(Error::SessionNotActive)));
    assert!(matches!(
        manager.screenshot(ScreenshotOptions::default(), TIMEOUT).await,
        Err(Error::SessionNotActive)
    ));
}

#[tokio::test]
async fn test_ensure_active_is_idempotent() {
    let (manager, launcher, _client) = setup();

    manager.ensure_active().await.unwrap();
    let first = manager.context().unwrap().id();
    manager.ensure_active().await.unwrap();
    manager.start().await.unwrap();

    assert!(manager.is_active());
    assert_eq!(launcher.launch_count(), 1);
    assert_eq!(manager.context().unwrap().id(), first);
}

#[tokio::test]
async fn test_start_configures_and_verifies() {
    let (manager, launcher, client) = setup();
    manager.start().await.unwrap();

    let options = launcher.last_options().unwrap();
    assert!(options.headless);
    assert_eq!(options.window_width, 1920);
    assert!(options
        .args
        .contains(&"--disable-blink-features=AutomationControlled".to_string()));
    assert_eq!(launcher.last_browser().unwrap().targets_created(), 1);

    let metrics = client.calls_to("Emulation.setDeviceMetricsOverride");
    assert_eq!(metrics.len(), 1);
    assert_eq!(metrics[0]["width"], 1920);
    assert_eq!(metrics[0]["height"], 1080);

    assert_eq!(client.calls_to("Network.setUserAgentOverride").len(), 1);
    assert_eq!(client.calls_to("Page.addScriptToEvaluateOnNewDocument").len(), 1);

    // Verification: blank navigation then a title read
    assert_eq!(client.calls_to("Page.navigate")[0]["url"], "about:blank");
    assert!(client.evaluated_scripts().iter().any(|s| s == "document.title"));
}

#[tokio::test]
async fn test_start_without_stealth() {
    let (manager, launcher, client) = setup_with(Config {
        stealth_enabled: false,
        ..Default::default()
    });
    manager.start().await.unwrap();

    assert!(launcher.last_options().unwrap().args.is_empty());
    assert!(client.calls_to("Network.setUserAgentOverride").is_empty());
    assert!(client.calls_to("Page.addScriptToEvaluateOnNewDocument").is_empty());
}

#[tokio::test]
async fn test_launch_failure_leaves_nothing_behind() {
    let (manager, launcher, _client) = setup();
    launcher.set_failure(Some("chrome not found"));

    let err = manager.ensure_active().await.unwrap_err();
    assert!(matches!(err, Error::SessionStart(_)));
    assert!(err.to_string().contains("chrome not found"));
    assert!(!manager.is_active());

    // A later attempt may succeed
    launcher.set_failure(None);
    manager.ensure_active().await.unwrap();
    assert!(manager.is_active());
}

#[tokio::test]
async fn test_setup_failure_rolls_back() {
    let (manager, launcher, client) = setup();
    client.fail_on("Emulation.setDeviceMetricsOverride", "Target closed");

    let err = manager.start().await.unwrap_err();
    assert!(matches!(err, Error::SessionStart(_)));
    assert!(!manager.is_active());
    assert!(launcher.last_browser().unwrap().is_closed());
}

#[tokio::test]
async fn test_verification_failure_rolls_back() {
    let (manager, launcher, client) = setup();
    client.fail_on("Page.navigate", "net::ERR_ABORTED");

    let err = manager.start().await.unwrap_err();
    assert!(matches!(err, Error::SessionStart(_)));
    assert!(!manager.is_active());
    assert!(launcher.last_browser().unwrap().is_closed());
}

#[tokio::test]
async fn test_start_timeout_during_launch() {
    let (manager, launcher, _client) = setup_with(Config {
        start_timeout_ms: 50,
        ..Default::default()
    });
    launcher.set_delay(Some(Duration::from_millis(500)));

    let err = manager.start().await.unwrap_err();
    assert!(err.is_timeout());
    assert!(!manager.is_active());
}

#[tokio::test]
async fn test_start_within_caller_deadline() {
    let (manager, launcher, _client) = setup();
    launcher.set_delay(Some(Duration::from_millis(500)));

    // Well inside the configured 30s start timeout
    let err = manager
        .ensure_active_within(Duration::from_millis(50))
        .await
        .unwrap_err();
    assert!(err.is_timeout());
    assert!(!manager.is_active());

    launcher.set_delay(None);
    manager.start_within(TIMEOUT).await.unwrap();
    manager.ensure_active_within(Duration::from_millis(1)).await.unwrap();
    assert!(manager.is_active());
}

#[tokio::test]
async fn test_start_timeout_during_setup_closes_browser() {
    let (manager, launcher, client) = setup_with(Config {
        start_timeout_ms: 100,
        ..Default::default()
    });
    client.set_latency(Some(Duration::from_millis(300)));

    let err = manager.start().await.unwrap_err();
    assert!(err.is_timeout());
    assert!(!manager.is_active());
    assert!(launcher.last_browser().unwrap().is_closed());
}

#[tokio::test]
async fn test_stop_tears_down_and_is_idempotent() {
    let (manager, launcher, client) = setup();
    manager.stop().await.unwrap();

    manager.start().await.unwrap();
    client.set_page_snapshot(form_page());
    manager.extract(1000, TIMEOUT).await.unwrap();
    assert!(manager.get_element(0).is_some());
    let ctx = manager.context().unwrap();

    manager.stop().await.unwrap();
    assert!(!manager.is_active());
    assert!(ctx.is_cancelled());
    assert!(launcher.last_browser().unwrap().is_closed());
    assert!(manager.get_element(0).is_none());

    manager.stop().await.unwrap();
    assert!(matches!(manager.extract(100, TIMEOUT).await, Err(Error::SessionNotActive)));
}

// ============================================================================
// Extraction and interactions
// ============================================================================

#[tokio::test]
async fn test_extract_then_click_center() {
    let (manager, _launcher, client) = setup();
    manager.start().await.unwrap();
    client.set_page_snapshot(form_page());

    let extraction = manager.extract(10_000, TIMEOUT).await.unwrap();
    assert_eq!(
        extraction.text,
        "<input id=0>type='text' name='q'</input>\n<button id=1>Search</button>"
    );
    assert!(!extraction.truncated);

    client.clear_calls();
    let address = manager.click(1, TIMEOUT).await.unwrap();
    assert_eq!(address.center.x, 360.0);
    assert_eq!(address.center.y, 115.0);

    assert_eq!(mouse_points(&client), vec![(360.0, 115.0), (360.0, 115.0)]);
    let presses = client.calls_to("Input.dispatchMouseEvent");
    assert_eq!(presses[0]["type"], "mousePressed");
    assert_eq!(presses[1]["type"], "mouseReleased");
    assert!(client
        .evaluated_scripts()
        .iter()
        .any(|s| s.contains("removeAttribute('target')")));
}

#[tokio::test]
async fn test_click_unknown_index_is_stale() {
    let (manager, _launcher, client) = setup();
    manager.start().await.unwrap();
    client.set_page_snapshot(form_page());
    manager.extract(10_000, TIMEOUT).await.unwrap();

    let err = manager.click(7, TIMEOUT).await.unwrap_err();
    assert!(matches!(err, Error::StaleElement { index: 7 }));
    assert!(err.is_stale());
    assert!(err.to_string().contains("7"));
    assert!(mouse_points(&client).is_empty());
}

#[tokio::test]
async fn test_reextraction_makes_old_indices_stale() {
    let (manager, _launcher, client) = setup();
    manager.start().await.unwrap();

    client.set_page_snapshot(page_of(json!([
        { "tag": "button", "rect": rect(0.0, 0.0, 10.0, 10.0), "deepText": "A" },
        { "tag": "button", "rect": rect(0.0, 20.0, 10.0, 10.0), "deepText": "B" },
        { "tag": "button", "rect": rect(0.0, 40.0, 10.0, 10.0), "deepText": "C" }
    ])));
    manager.extract(1000, TIMEOUT).await.unwrap();
    assert!(manager.get_element(2).is_some());

    client.set_page_snapshot(page_of(json!([
        { "tag": "button", "rect": rect(0.0, 0.0, 10.0, 10.0), "deepText": "A" }
    ])));
    manager.extract(1000, TIMEOUT).await.unwrap();

    assert!(manager.get_element(2).is_none());
    assert!(matches!(
        manager.click(2, TIMEOUT).await,
        Err(Error::StaleElement { index: 2 })
    ));
}

#[tokio::test]
async fn test_link_target_cleanup_failure_is_ignored() {
    let (manager, _launcher, client) = setup();
    manager.start().await.unwrap();
    client.set_page_snapshot(form_page());
    manager.extract(1000, TIMEOUT).await.unwrap();

    client.fail_on("removeAttribute('target')", "Execution context was destroyed");
    manager.click(0, TIMEOUT).await.unwrap();
    assert_eq!(mouse_points(&client).len(), 2);
}

#[tokio::test]
async fn test_click_failure_propagates() {
    let (manager, _launcher, client) = setup();
    manager.start().await.unwrap();
    client.set_page_snapshot(form_page());
    manager.extract(1000, TIMEOUT).await.unwrap();

    client.fail_on("Input.dispatchMouseEvent", "Target closed");
    let err = manager.click(0, TIMEOUT).await.unwrap_err();
    assert!(matches!(err, Error::Cdp(_)));
}

#[tokio::test]
async fn test_type_with_clear_and_submit() {
    let (manager, _launcher, client) = setup();
    manager.start().await.unwrap();
    client.set_page_snapshot(form_page());
    manager.extract(1000, TIMEOUT).await.unwrap();
    client.clear_calls();

    let options = TypeOptions {
        clear: true,
        submit: true,
    };
    manager.type_text(0, "rust async", options, TIMEOUT).await.unwrap();

    // Focus click on the input's center
    assert_eq!(mouse_points(&client), vec![(200.0, 115.0), (200.0, 115.0)]);

    let select_all = &client.calls_to("Input.dispatchKeyEvent")[0];
    assert_eq!(select_all["commands"], json!(["selectAll"]));
    assert_eq!(select_all["modifiers"], 2);

    assert_eq!(
        key_events(&client),
        vec![
            ("rawKeyDown".to_string(), "a".to_string()),
            ("keyUp".to_string(), "a".to_string()),
            ("rawKeyDown".to_string(), "Backspace".to_string()),
            ("keyUp".to_string(), "Backspace".to_string()),
            ("keyDown".to_string(), "Enter".to_string()),
            ("keyUp".to_string(), "Enter".to_string()),
        ]
    );

    let inserted = client.calls_to("Input.insertText");
    assert_eq!(inserted.len(), 1);
    assert_eq!(inserted[0]["text"], "rust async");

    let methods: Vec<String> = client.calls().into_iter().map(|c| c.method).collect();
    let insert_at = methods.iter().position(|m| m == "Input.insertText").unwrap();
    let backspace_at = 3 + methods.iter().position(|m| m == "Input.dispatchKeyEvent").unwrap();
    assert!(backspace_at < insert_at);
}

#[tokio::test]
async fn test_type_plain_does_not_clear_or_submit() {
    let (manager, _launcher, client) = setup();
    manager.start().await.unwrap();
    client.set_page_snapshot(form_page());
    manager.extract(1000, TIMEOUT).await.unwrap();
    client.clear_calls();

    let plain = TypeOptions {
        clear: false,
        submit: false,
    };
    manager.type_text(0, "hello", plain, TIMEOUT).await.unwrap();
    assert!(key_events(&client).is_empty());
    assert_eq!(client.calls_to("Input.insertText")[0]["text"], "hello");
}

#[tokio::test]
async fn test_type_defaults_replace_content() {
    assert_eq!(
        TypeOptions::default(),
        TypeOptions {
            clear: true,
            submit: false
        }
    );

    let (manager, _launcher, client) = setup();
    manager.start().await.unwrap();
    client.set_page_snapshot(form_page());
    manager.extract(1000, TIMEOUT).await.unwrap();
    client.clear_calls();

    manager.type_text(0, "fresh", TypeOptions::default(), TIMEOUT).await.unwrap();
    assert_eq!(
        key_events(&client),
        vec![
            ("rawKeyDown".to_string(), "a".to_string()),
            ("keyUp".to_string(), "a".to_string()),
            ("rawKeyDown".to_string(), "Backspace".to_string()),
            ("keyUp".to_string(), "Backspace".to_string()),
        ]
    );
    assert_eq!(client.calls_to("Input.insertText")[0]["text"], "fresh");
}

#[tokio::test]
async fn test_type_with_keystroke_delay() {
    let (manager, _launcher, client) = setup_with(Config {
        typing_delay_ms: Some((0, 1)),
        ..Default::default()
    });
    manager.start().await.unwrap();
    client.set_page_snapshot(form_page());
    manager.extract(1000, TIMEOUT).await.unwrap();
    client.clear_calls();

    let plain = TypeOptions {
        clear: false,
        submit: false,
    };
    manager.type_text(0, "ab", plain, TIMEOUT).await.unwrap();

    assert!(client.calls_to("Input.insertText").is_empty());
    assert_eq!(
        key_events(&client),
        vec![
            ("keyDown".to_string(), "a".to_string()),
            ("keyUp".to_string(), "a".to_string()),
            ("keyDown".to_string(), "b".to_string()),
            ("keyUp".to_string(), "b".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_type_with_inverted_delay_bounds() {
    let (manager, _launcher, client) = setup_with(Config {
        typing_delay_ms: Some((5, 1)),
        ..Default::default()
    });
    manager.ensure_active().await.unwrap();
    client.set_page_snapshot(page_of(json!([
        { "tag": "input", "rect": rect(0.0, 0.0, 200.0, 30.0), "type": "text" }
    ])));
    manager.extract(1000, TIMEOUT).await.unwrap();
    client.clear_calls();

    let plain = TypeOptions {
        clear: false,
        submit: false,
    };
    manager.type_text(0, "ab", plain, TIMEOUT).await.unwrap();

    let typed: Vec<String> = key_events(&client)
        .into_iter()
        .filter(|(kind, _)| kind == "keyDown")
        .map(|(_, key)| key)
        .collect();
    assert_eq!(typed, vec!["a".to_string(), "b".to_string()]);
}

#[tokio::test]
async fn test_type_unknown_index_is_stale() {
    let (manager, _launcher, client) = setup();
    manager.start().await.unwrap();

    let err = manager
        .type_text(0, "secret", TypeOptions::default(), TIMEOUT)
        .await
        .unwrap_err();
    assert!(err.is_stale());
    assert!(client.calls_to("Input.insertText").is_empty());
}

// ============================================================================
// Deadlines and cancellation
// ============================================================================

#[tokio::test]
async fn test_extract_timeout_keeps_previous_table() {
    let (manager, _launcher, client) = setup();
    manager.start().await.unwrap();
    client.set_page_snapshot(form_page());
    manager.extract(1000, TIMEOUT).await.unwrap();

    client.set_latency(Some(Duration::from_millis(500)));
    let err = manager
        .extract(1000, Duration::from_millis(20))
        .await
        .unwrap_err();
    assert!(err.is_timeout());
    assert!(!err.is_stale());

    // The session survives and the previous table is intact
    assert!(manager.is_active());
    assert!(manager.get_element(1).is_some());
}

#[tokio::test]
async fn test_extract_script_failure() {
    let (manager, _launcher, client) = setup();
    manager.start().await.unwrap();
    client.set_page_snapshot(form_page());
    manager.extract(1000, TIMEOUT).await.unwrap();

    client.fail_on(crate::extract::SNAPSHOT_MARKER, "Blocked a frame with origin");
    let err = manager.extract(1000, TIMEOUT).await.unwrap_err();
    assert!(matches!(err, Error::ScriptExecutionFailed(_)));
    assert_eq!(manager.table().len(), 2);
}

#[tokio::test]
async fn test_stop_cancels_in_flight_operation() {
    let (manager, _launcher, client) = setup();
    let manager = Arc::new(manager);
    manager.start().await.unwrap();
    client.set_latency(Some(Duration::from_secs(5)));

    let worker = {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move { manager.extract(1000, Duration::from_secs(10)).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    manager.stop().await.unwrap();

    let err = worker.await.unwrap().unwrap_err();
    assert!(matches!(err, Error::Cancelled(_)));
}

#[tokio::test]
async fn test_concurrent_clicks_share_the_table() {
    let (manager, _launcher, client) = setup();
    let manager = Arc::new(manager);
    manager.start().await.unwrap();
    client.set_page_snapshot(form_page());
    manager.extract(1000, TIMEOUT).await.unwrap();
    client.clear_calls();

    let clicks: Vec<_> = (0..8)
        .map(|i| {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.click(i % 2, TIMEOUT).await })
        })
        .collect();
    for click in clicks {
        click.await.unwrap().unwrap();
    }
    assert_eq!(mouse_points(&client).len(), 16);
}

// ============================================================================
// Page utilities
// ============================================================================

#[tokio::test]
async fn test_navigate_starts_session_and_reports_page() {
    let (manager, launcher, client) = setup();
    client.set_title("Example Domain");

    let info = manager.navigate("https://example.com", TIMEOUT).await.unwrap();
    assert!(manager.is_active());
    assert_eq!(launcher.launch_count(), 1);
    assert_eq!(info.url, "https://example.com/");
    assert_eq!(info.title, "Example Domain");

    let page = manager.page_info(TIMEOUT).await.unwrap();
    assert_eq!(page, info);
}

#[tokio::test]
async fn test_navigate_rejects_bad_urls_before_launch() {
    let (manager, launcher, _client) = setup();

    let err = manager.navigate("example.com", TIMEOUT).await.unwrap_err();
    assert!(matches!(err, Error::NavigationFailed(_)));
    let err = manager.navigate("javascript:alert(1)", TIMEOUT).await.unwrap_err();
    assert!(matches!(err, Error::NavigationFailed(_)));
    assert_eq!(launcher.launch_count(), 0);
}

#[tokio::test]
async fn test_navigate_does_not_touch_the_table() {
    let (manager, _launcher, client) = setup();
    manager.start().await.unwrap();
    client.set_page_snapshot(form_page());
    manager.extract(1000, TIMEOUT).await.unwrap();

    manager.navigate("https://example.org/next", TIMEOUT).await.unwrap();
    assert_eq!(manager.table().len(), 2);
}

#[tokio::test]
async fn test_go_back_at_oldest_entry_fails() {
    let (manager, _launcher, client) = setup();
    manager.start().await.unwrap();

    let err = manager.go_back(TIMEOUT).await.unwrap_err();
    assert!(matches!(err, Error::NavigationFailed(_)));
    assert_eq!(client.calls_to("Page.getNavigationHistory").len(), 1);
    assert!(client.calls_to("Page.navigateToHistoryEntry").is_empty());
}

#[tokio::test]
async fn test_go_back_targets_previous_entry() {
    let (manager, _launcher, client) = setup();
    manager.start().await.unwrap();
    client.respond_to_method(
        "Page.getNavigationHistory",
        json!({
            "currentIndex": 2,
            "entries": [
                { "id": 4, "url": "about:blank", "title": "" },
                { "id": 9, "url": "https://a.test/", "title": "A" },
                { "id": 12, "url": "https://b.test/", "title": "B" }
            ]
        }),
    );

    manager.go_back(TIMEOUT).await.unwrap();
    let jumps = client.calls_to("Page.navigateToHistoryEntry");
    assert_eq!(jumps.len(), 1);
    assert_eq!(jumps[0]["entryId"], 9);
}

#[tokio::test]
async fn test_wait_for_conditions() {
    let (manager, _launcher, client) = setup();
    manager.start().await.unwrap();

    assert!(manager.wait_for(WaitCondition::PageLoad, TIMEOUT).await.unwrap());

    client.respond_to("#results", json!(true));
    assert!(manager
        .wait_for(WaitCondition::ElementVisible("#results".into()), TIMEOUT)
        .await
        .unwrap());

    // Unanswered checks read as "not visible"
    assert!(manager
        .wait_for(WaitCondition::ElementHidden("#spinner".into()), TIMEOUT)
        .await
        .unwrap());
    let met = manager
        .wait_for(
            WaitCondition::ElementVisible("#never".into()),
            Duration::from_millis(250),
        )
        .await
        .unwrap();
    assert!(!met);
}

#[tokio::test]
async fn test_wait_for_check_error_propagates() {
    let (manager, _launcher, client) = setup();
    manager.start().await.unwrap();
    client.fail_on("querySelector", "SyntaxError: not a valid selector");

    let err = manager
        .wait_for(WaitCondition::ElementVisible("##".into()), TIMEOUT)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ScriptExecutionFailed(_)));
}

#[tokio::test]
async fn test_extract_text_single_and_multiple() {
    let (manager, _launcher, client) = setup();
    manager.start().await.unwrap();
    client.respond_to("getBoundingClientRect", json!(true));
    client.respond_to(".map(el =>", json!(["First item", "Second item"]));

    let texts = manager.extract_text("li", true, TIMEOUT).await.unwrap();
    assert_eq!(texts, vec!["First item".to_string(), "Second item".to_string()]);

    client.respond_to(".map(el =>", json!(["Headline"]));
    let texts = manager.extract_text("h1", false, TIMEOUT).await.unwrap();
    assert_eq!(texts, vec!["Headline".to_string()]);

    let scripts = client.evaluated_scripts();
    assert!(scripts.iter().any(|s| s.contains(r#"document.querySelectorAll("li")"#)));
    assert!(scripts.iter().any(|s| s.contains(r#"[document.querySelector("h1")]"#)));
}

#[tokio::test]
async fn test_extract_text_waits_for_visibility() {
    let (manager, _launcher, client) = setup();
    manager.start().await.unwrap();
    client.respond_to(".map(el =>", json!(["never read"]));

    // The visibility check evaluates to null, so the element never shows up
    let err = manager
        .extract_text("#late", false, Duration::from_millis(250))
        .await
        .unwrap_err();
    assert!(err.is_timeout());
    assert!(!client.evaluated_scripts().iter().any(|s| s.contains(".map(el =>")));
}

#[tokio::test]
async fn test_extract_text_requires_active_session() {
    let (manager, _launcher, _client) = setup();
    let err = manager.extract_text("p", true, TIMEOUT).await.unwrap_err();
    assert!(matches!(err, Error::SessionNotActive));
}

#[tokio::test]
async fn test_screenshot() {
    let (manager, _launcher, client) = setup();
    manager.start().await.unwrap();

    let shot = manager
        .screenshot(ScreenshotOptions::default(), TIMEOUT)
        .await
        .unwrap();
    assert_eq!(&shot.bytes[..4], b"\x89PNG");
    assert_eq!(shot.format, ScreenshotFormat::Png);

    let full = ScreenshotOptions {
        format: ScreenshotFormat::Jpeg(80),
        full_page: true,
    };
    let shot = manager.screenshot(full, TIMEOUT).await.unwrap();
    assert_eq!(shot.format, ScreenshotFormat::Jpeg(80));
    assert_eq!(client.calls_to("Page.captureScreenshot").len(), 2);
}

#[tokio::test]
async fn test_save_screenshot_writes_file() {
    let dir = tempfile::tempdir().unwrap();
    let (manager, _launcher, _client) = setup_with(Config {
        screenshot_dir: Some(dir.path().join("shots").to_string_lossy().into_owned()),
        ..Default::default()
    });
    manager.start().await.unwrap();

    let path = manager
        .save_screenshot(ScreenshotOptions::default(), TIMEOUT)
        .await
        .unwrap();
    assert!(path.starts_with(dir.path().join("shots")));
    assert_eq!(path.extension().unwrap(), "png");
    let written = std::fs::read(&path).unwrap();
    assert_eq!(&written[..4], b"\x89PNG");
}
