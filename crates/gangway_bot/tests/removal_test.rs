mod common;

use common::*;
use gangway_beta::BetaTester;
use gangway_bot::COMPLETION_EMOJI;
use gangway_core::keys;
use gangway_discord::MemberLeft;

fn seed_removal_scene(h: &Harness) {
    // Two apps share a beta group; a third lives in its own.
    h.store.seed_app(
        "recA1",
        "Snail Mail",
        Some("chan-approval"),
        &[],
        Some("key-1"),
        Some("group-1"),
    );
    h.store
        .seed_app("recA2", "Snail Maps", None, &[], Some("key-1"), Some("group-1"));
    h.store
        .seed_app("recA3", "Slug Chat", None, &[], Some("key-2"), Some("group-2"));
    h.store.seed_config(GUILD, keys::REMOVAL_EMOJIS, r#"["🗑️"]"#);
    h.store.seed_config(GUILD, keys::APPROVAL_EMOJIS, r#"["👍"]"#);
    h.store
        .seed_config(GUILD, keys::TESTER_EXIT_NOTIFICATION_CHANNEL, "chan-exit");
}

#[tokio::test]
async fn removal_retires_only_shared_group_requests() {
    let h = harness();
    seed_removal_scene(&h);

    h.store
        .seed_tester("recT1", "snail", "42", Some("snail@example.com"));
    h.store.seed_approved_request("recR1", "recT1", "42", "recA1", GUILD);
    h.store.seed_approved_request("recR2", "recT1", "42", "recA2", GUILD);
    // Same tester, different group, not yet approved: untouched by removal.
    h.store.seed_pending_request("recR3", "recT1", "42", "recA3", GUILD);
    // A different tester in the shared group: also untouched.
    h.store
        .seed_tester("recT2", "slug", "43", Some("slug@example.com"));
    h.store.seed_approved_request("recR4", "recT2", "43", "recA1", GUILD);

    h.beta.seed_remote(BetaTester::new(
        "bt1",
        "snail@example.com",
        vec!["group-1".to_string()],
    ));
    h.store.add_leave_message("42", "msg-leave");
    h.gateway.register_bot_message("msg-leave", "chan-exit");

    let remove = reaction("chan-exit", "msg-leave", "🗑️", "99");
    h.dispatcher.handle_reaction(&remove).await.unwrap();

    assert_eq!(
        h.beta.removed(),
        vec![("group-1".to_string(), "bt1".to_string())]
    );
    assert!(*h.store.request("recR1").removed());
    assert!(*h.store.request("recR2").removed());
    assert!(!*h.store.request("recR3").removed());
    assert!(!*h.store.request("recR4").removed());
    assert!(h
        .gateway
        .reactions_on("msg-leave")
        .contains(&COMPLETION_EMOJI.to_string()));
}

#[tokio::test]
async fn ambiguous_remote_testers_abort_removal() {
    let h = harness();
    seed_removal_scene(&h);

    h.store
        .seed_tester("recT1", "snail", "42", Some("snail@example.com"));
    h.store.seed_approved_request("recR1", "recT1", "42", "recA1", GUILD);
    h.beta.seed_remote(BetaTester::new(
        "bt1",
        "snail@example.com",
        vec!["group-1".to_string()],
    ));
    h.beta.seed_remote(BetaTester::new(
        "bt2",
        "snail@example.com",
        vec!["group-1".to_string()],
    ));
    h.store.add_leave_message("42", "msg-leave");
    h.gateway.register_bot_message("msg-leave", "chan-exit");

    let remove = reaction("chan-exit", "msg-leave", "🗑️", "99");
    h.dispatcher.handle_reaction(&remove).await.unwrap();

    assert!(h.beta.removed().is_empty());
    assert!(!*h.store.request("recR1").removed());
    let replies = h.gateway.posted_in("chan-exit");
    assert!(replies.last().unwrap().text.contains("aborting removal"));
}

#[tokio::test]
async fn member_departure_posts_exit_notification() {
    let h = harness();
    seed_removal_scene(&h);
    h.store
        .seed_tester("recT1", "snail", "42", Some("snail@example.com"));
    h.store.seed_approved_request("recR1", "recT1", "42", "recA1", GUILD);

    // The departing member renamed themselves since the tester record was
    // last written; the event's username wins.
    let left = MemberLeft::new(GUILD.to_string(), "42".to_string(), "escargot".to_string());
    h.dispatcher.handle_member_left(&left).await.unwrap();

    let posts = h.gateway.posted_in("chan-exit");
    assert_eq!(posts.len(), 1);
    assert!(posts[0].text.contains("**escargot**"));
    assert!(posts[0].text.contains("Snail Mail"));
    assert!(posts[0].text.contains("has left"));

    // The leave message is linked back onto the tester for later removal.
    let tester = h.store.tester("42").unwrap();
    assert_eq!(tester.leave_message_ids(), &vec![posts[0].id.clone()]);
}

#[tokio::test]
async fn departure_of_an_inactive_member_is_silent() {
    let h = harness();
    seed_removal_scene(&h);
    h.store
        .seed_tester("recT1", "snail", "42", Some("snail@example.com"));

    let left = MemberLeft::new(GUILD.to_string(), "42".to_string(), "snail".to_string());
    h.dispatcher.handle_member_left(&left).await.unwrap();

    assert!(h.gateway.posted_in("chan-exit").is_empty());
}
