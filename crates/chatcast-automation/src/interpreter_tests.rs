use std::sync::Arc;

use super::*;
use chatcast_protocols::DEFAULT_MAX_ATTEMPTS;
use crate::snapshot::{FrameAction, SnapshotFrame};
use tokio::time::Instant;

const PAGE: &str = r#"
<form>
  <textarea id="prompt-textarea" placeholder="Ask"></textarea>
  <button id="send" data-testid="send-button" disabled>Send</button>
</form>
"#;

fn frame() -> SnapshotFrame {
    SnapshotFrame::from_html("https://chatgpt.com/", PAGE)
}

#[tokio::test]
async fn test_empty_steps_succeed() {
    let f = frame();
    assert!(execute_steps(&f, &[], "q").await);
    assert!(f.journal().is_empty());
}

#[tokio::test]
async fn test_typical_search_flow() {
    let f = SnapshotFrame::from_html(
        "https://chatgpt.com/",
        r#"<textarea id="prompt-textarea"></textarea><button id="send">Send</button>"#,
    );
    let steps = vec![
        Step::new(StepAction::Focus).with_selector("#prompt-textarea"),
        Step::new(StepAction::SetValue).with_selector("#prompt-textarea"),
        Step::new(StepAction::Click).with_selector("#send"),
    ];
    assert!(execute_steps(&f, &steps, "hello").await);
    let journal = f.journal();
    assert!(matches!(journal.first(), Some(FrameAction::Focus { target }) if target == "textarea#prompt-textarea"));
    assert!(journal
        .iter()
        .any(|a| matches!(a, FrameAction::SetValue { value, .. } if value == "hello")));
    assert!(matches!(journal.last(), Some(FrameAction::Click { target }) if target == "button#send"));
}

#[tokio::test]
async fn test_custom_set_value_overrides_payload() {
    let f = frame();
    let steps = vec![Step::new(StepAction::SetValue)
        .with_selector("textarea")
        .with_custom_value("fixed")];
    assert!(execute_steps(&f, &steps, "payload").await);
    assert!(f
        .journal()
        .iter()
        .any(|a| matches!(a, FrameAction::SetValue { value, .. } if value == "fixed")));
}

#[tokio::test]
async fn test_failing_step_halts_sequence() {
    let f = frame();
    let steps = vec![
        Step::new(StepAction::Focus).with_selector("textarea"),
        Step::new(StepAction::Click).with_selector("button["),
        Step::new(StepAction::Focus).with_selector("#send"),
    ];
    assert!(!execute_steps(&f, &steps, "q").await);
    assert_eq!(f.journal().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_missing_element_waits_then_skips() {
    let f = frame();
    let steps = vec![
        Step::new(StepAction::Click)
            .with_selector("#nope")
            .with_retry(4, 250),
        Step::new(StepAction::Focus).with_selector("textarea"),
    ];
    let start = Instant::now();
    assert!(execute_steps(&f, &steps, "q").await);
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(1000), "{:?}", elapsed);
    assert!(elapsed < Duration::from_millis(1100), "{:?}", elapsed);
    assert_eq!(f.journal().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_default_polling_policy() {
    let f = frame();
    let steps = vec![Step::new(StepAction::Focus).with_selector("#nope")];
    let start = Instant::now();
    assert!(execute_steps(&f, &steps, "q").await);
    let expected = Duration::from_millis(u64::from(DEFAULT_MAX_ATTEMPTS) * 300);
    let elapsed = start.elapsed();
    assert!(elapsed >= expected, "{:?}", elapsed);
    assert!(elapsed < expected + Duration::from_millis(100), "{:?}", elapsed);
}

#[tokio::test(start_paused = true)]
async fn test_waits_for_late_element() {
    let f = Arc::new(SnapshotFrame::from_html("https://a.test/", "<main></main>"));
    let page = f.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(700)).await;
        page.mutate(|doc| {
            let main = doc.first_by_tag("main").unwrap();
            let input = doc.create_element("textarea");
            doc.append_child(main, input);
        });
    });

    let steps = vec![Step::new(StepAction::Focus).with_selector("textarea")];
    assert!(execute_steps(f.as_ref(), &steps, "q").await);
    assert_eq!(f.journal().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_click_waits_for_enabled() {
    let f = Arc::new(frame());
    let page = f.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        page.mutate(|doc| {
            let button = doc.first_by_tag("button").unwrap();
            doc.remove_attr(button, "disabled");
        });
    });

    let steps = vec![Step::new(StepAction::Click)
        .with_selector("[data-testid=send-button]")
        .retrying_on_disabled()
        .with_retry(10, 100)];
    let start = Instant::now();
    assert!(execute_steps(f.as_ref(), &steps, "q").await);
    assert!(start.elapsed() >= Duration::from_millis(500));
    assert!(matches!(f.journal().last(), Some(FrameAction::Click { .. })));
}

#[tokio::test(start_paused = true)]
async fn test_wait_step_sleeps() {
    let f = frame();
    let start = Instant::now();
    assert!(execute_steps(&f, &[Step::new(StepAction::Wait).with_duration(1500)], "q").await);
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(1500));
    assert!(elapsed < Duration::from_millis(1550));
}

#[tokio::test]
async fn test_send_keys_keyup_only_for_chords() {
    let f = frame();
    let steps = vec![
        Step::new(StepAction::SendKeys).with_selector("textarea").with_keys("Enter"),
        Step::new(StepAction::SendKeys).with_selector("textarea").with_keys("Ctrl+Enter"),
    ];
    assert!(execute_steps(&f, &steps, "q").await);
    let names: Vec<String> = f
        .journal()
        .iter()
        .filter_map(|a| match a {
            FrameAction::Dispatch { event: SyntheticEvent::Key { name, stroke }, .. } => {
                Some(format!("{}:{}:{}", name, stroke.key, stroke.key_code))
            }
            _ => None,
        })
        .collect();
    assert_eq!(names, vec!["keydown:Enter:13", "keydown:Enter:13", "keyup:Enter:13"]);
}

#[tokio::test]
async fn test_trigger_events_special_input_carries_value() {
    let f = frame();
    let steps = vec![
        Step::new(StepAction::SetValue).with_selector("textarea"),
        Step::new(StepAction::TriggerEvents)
            .with_selector("textarea")
            .with_input_type(InputType::Special)
            .with_events(&["input", "blur"]),
    ];
    assert!(execute_steps(&f, &steps, "hello").await);
    let journal = f.journal();
    let tail = &journal[journal.len() - 2..];
    assert!(matches!(
        &tail[0],
        FrameAction::Dispatch { event: SyntheticEvent::Input { data, .. }, .. } if data == "hello"
    ));
    assert!(matches!(
        &tail[1],
        FrameAction::Dispatch { event: SyntheticEvent::Event { name }, .. } if name == "blur"
    ));
}

#[tokio::test]
async fn test_paste_falls_back_to_active_element() {
    let f = frame();
    let steps = vec![
        Step::new(StepAction::Focus).with_selector("textarea"),
        Step::new(StepAction::Paste),
    ];
    assert!(execute_steps(&f, &steps, "pasted").await);
    assert!(matches!(
        f.journal().last(),
        Some(FrameAction::Dispatch { target, event: SyntheticEvent::PasteText { text } })
            if target == "textarea#prompt-textarea" && text == "pasted"
    ));
}

#[tokio::test]
async fn test_custom_is_noop() {
    let f = frame();
    assert!(execute_steps(&f, &[Step::new(StepAction::Custom)], "q").await);
    assert!(f.journal().is_empty());
}

#[tokio::test]
async fn test_selector_list_uses_first_present_alternative() {
    let f = frame();
    let steps = vec![Step::new(StepAction::Focus).with_selector(vec!["#missing", "textarea"])];
    assert!(execute_steps(&f, &steps, "q").await);
    assert_eq!(f.journal().len(), 1);
}

#[tokio::test]
async fn test_wait_for_counts_attempts() {
    let mut calls = 0;
    let found = wait_for(
        || {
            calls += 1;
            let hit = calls == 3;
            async move { Ok::<_, DriverError>(hit) }
        },
        5,
        Duration::from_millis(1),
    )
    .await
    .unwrap();
    assert!(found);
    assert_eq!(calls, 3);
}
