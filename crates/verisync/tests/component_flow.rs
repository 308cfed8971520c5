use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use serde_json::{Map, Value, json};
use verisync::{
    Callbacks, RequiredField, VerificationRequest, VerificationState, Verisync, VerisyncError,
    trigger::{
        PressHandler, Pressable, bind_close_trigger, bind_start_trigger, handle_shared_navigation,
    },
};

/// Host button that records the injected handler.
#[derive(Default)]
struct HostButton {
    handler: Option<PressHandler>,
}

impl Pressable for HostButton {
    fn on_press(&mut self, handler: PressHandler) {
        self.handler = Some(handler);
    }
}

impl HostButton {
    fn press(&mut self) -> verisync::Result<()> {
        (self.handler.as_mut().unwrap())()
    }
}

fn request() -> VerificationRequest {
    VerificationRequest::new()
        .client_id("client-123")
        .flow_id("flow-456")
        .redirect_url("myapp://verification/done")
        .email("user@example.com")
        .build()
}

#[test]
fn full_session_through_bound_controls() {
    let events = Rc::new(RefCell::new(Vec::new()));
    let callbacks = Callbacks::new()
        .on_completed({
            let events = events.clone();
            move || events.borrow_mut().push("completed")
        })
        .on_close({
            let events = events.clone();
            move || events.borrow_mut().push("closed")
        });
    let verisync = Rc::new(RefCell::new(Verisync::new(request(), callbacks)));

    let mut trigger = HostButton::default();
    let mut close = HostButton::default();
    bind_start_trigger(&verisync, &mut trigger);
    bind_close_trigger(&verisync, &mut close);

    // first session: user backs out
    trigger.press().unwrap();
    assert!(verisync.borrow().is_visible());
    close.press().unwrap();
    assert_eq!(verisync.borrow().state(), &VerificationState::Hidden);

    // second session: the service redirects back
    trigger.press().unwrap();
    let loaded = verisync.borrow().verification_url().unwrap().clone();
    assert_eq!(loaded.host_str(), Some("app.verisync.co"));
    assert!(!handle_shared_navigation(&verisync, loaded.as_str()).unwrap());
    assert!(
        handle_shared_navigation(&verisync, "myapp://verification/done?verisync-redirect")
            .unwrap()
    );
    assert!(!verisync.borrow().is_visible());

    assert_eq!(*events.borrow(), ["closed", "completed"]);
}

#[test]
fn back_gesture_dismisses_without_callbacks() {
    let fired = Rc::new(Cell::new(0));
    let callbacks = Callbacks::new()
        .on_completed({
            let fired = fired.clone();
            move || fired.set(fired.get() + 1)
        })
        .on_close({
            let fired = fired.clone();
            move || fired.set(fired.get() + 1)
        });
    let mut verisync = Verisync::new(request(), callbacks);
    verisync.start().unwrap();
    assert!(verisync.dismiss());
    assert!(!verisync.is_visible());
    assert_eq!(fired.get(), 0);
}

#[test]
fn every_missing_field_is_reported() {
    let request = VerificationRequest::new()
        .client_id("")
        .flow_id("")
        .redirect_url("")
        .build();
    let mut verisync = Verisync::new(request, Callbacks::new());
    match verisync.start() {
        Err(VerisyncError::Config(err)) => assert_eq!(
            err.missing(),
            &[
                RequiredField::ClientId,
                RequiredField::FlowId,
                RequiredField::RedirectUrl
            ]
        ),
        other => panic!("expected config error, got {other:?}"),
    }
    assert!(!verisync.is_visible());
}

#[test]
fn metadata_survives_encoding_for_varied_mappings() {
    let cases = [
        json!({}),
        json!({"x": 1}),
        json!({"name": "Zoë Ångström", "emoji": "✅"}),
        json!({"query": "a=b&c=d?e#f", "path": "/x/y z"}),
        json!({"nested": {"list": [1, "two", null, false], "empty": {}}}),
    ];
    for metadata in cases {
        let request = request().with_metadata(&metadata).unwrap();
        let mut verisync = Verisync::new(request, Callbacks::new());
        let url = verisync.start().unwrap();
        let raw = url
            .query_pairs()
            .find(|(key, _)| key == "metadata")
            .map(|(_, value)| value.into_owned())
            .unwrap();
        let decoded: Map<String, Value> = serde_json::from_str(&raw).unwrap();
        assert_eq!(Value::Object(decoded), metadata);
    }
}

#[test]
fn email_and_redirect_are_encoded() {
    let mut verisync = Verisync::new(request(), Callbacks::new());
    let url = verisync.start().unwrap();
    assert_eq!(
        url.query(),
        Some(
            "client_id=client-123&flow_id=flow-456&redirect_url=myapp%3A%2F%2Fverification%2Fdone%3Fverisync-redirect&email=user%40example.com&metadata=%7B%7D"
        )
    );
}
