use super::*;

async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

async fn advance(ms: u64) {
    tokio::time::advance(Duration::from_millis(ms)).await;
    settle().await;
}

fn is_visible(channel: &FeedbackChannel) -> bool {
    channel.current().is_some_and(|notification| notification.visible)
}

#[tokio::test(start_paused = true)]
async fn notify_shows_the_message_until_ttl_elapses() {
    let mut channel = FeedbackChannel::new(Duration::from_millis(6000));

    let shown = channel.notify("Invalid password", Severity::Error);

    assert!(shown.visible);
    assert_eq!(channel.current(), Some(shown.clone()));

    advance(5990).await;
    assert!(is_visible(&channel));

    advance(10).await;
    let hidden = channel.current().expect("notification kept after dismiss");
    assert!(!hidden.visible);
    assert_eq!(hidden.message, "Invalid password");
    assert_eq!(hidden.severity, Severity::Error);
}

#[tokio::test(start_paused = true)]
async fn repeated_dismiss_is_a_no_op() {
    let mut channel = FeedbackChannel::new(Duration::from_millis(6000));
    let mut rx = channel.subscribe();
    channel.notify("Login successful! Redirecting...", Severity::Success);
    let _ = rx.borrow_and_update();

    assert!(channel.dismiss());
    assert!(rx.has_changed().expect("sender alive"));
    let _ = rx.borrow_and_update();

    assert!(!channel.dismiss());
    assert!(!channel.dismiss());
    assert!(!rx.has_changed().expect("sender alive"));

    advance(7000).await;
    assert!(!rx.has_changed().expect("sender alive"));
}

#[tokio::test]
async fn dismiss_without_notification_does_nothing() {
    let mut channel = FeedbackChannel::new(Duration::from_millis(6000));
    assert!(!channel.dismiss());
    assert_eq!(channel.current(), None);
}

#[tokio::test(start_paused = true)]
async fn new_notification_replaces_old_and_restarts_timer() {
    let mut channel = FeedbackChannel::new(Duration::from_millis(6000));
    let first = channel.notify("first", Severity::Error);

    advance(4000).await;
    let second = channel.notify("second", Severity::Success);
    assert_ne!(first.id, second.id);
    assert_eq!(channel.current().expect("current").message, "second");

    // the first notification's deadline passes without touching the second
    advance(2500).await;
    assert!(is_visible(&channel));

    advance(3500).await;
    assert!(!is_visible(&channel));
}

#[tokio::test(start_paused = true)]
async fn notify_after_dismiss_shows_again() {
    let mut channel = FeedbackChannel::new(Duration::from_millis(6000));
    channel.notify("first", Severity::Error);
    channel.dismiss();

    channel.notify("first", Severity::Error);
    assert!(is_visible(&channel));
}

#[tokio::test(start_paused = true)]
async fn dropping_the_channel_cancels_auto_dismiss() {
    let mut channel = FeedbackChannel::new(Duration::from_millis(6000));
    let rx = channel.subscribe();
    channel.notify("bye", Severity::Success);

    drop(channel);
    advance(7000).await;

    let last = rx.borrow().clone().expect("last value kept");
    assert!(last.visible);
}
