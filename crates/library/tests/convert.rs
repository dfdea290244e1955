mod common;

use binran_library::ConvertEvent;
use binran_library::error::ErrorKind;
use binran_storage::backend::MockBackend;
use common::{engineering_tools, fixture};
use futures::StreamExt;

#[tokio::test]
async fn test_convert_events() {
    let backend = MockBackend::with_files([("handbook_letters.txt", "--- PAGE 1 ---\n\n")]);
    let fx = fixture(engineering_tools(), backend);
    let keys = ["engineering", "letters", "astrology", "science"].map(String::from);
    let events: Vec<_> = fx.library.convert(keys).collect().await;

    assert_eq!(events.len(), 6);
    assert!(matches!(events.first(), Some(Ok(ConvertEvent::Started(4)))));
    assert!(matches!(events.last(), Some(Ok(ConvertEvent::Complete))));

    let mut converted = Vec::new();
    let mut skipped = Vec::new();
    let mut failed = Vec::new();
    for event in &events[1..5] {
        match event {
            Ok(ConvertEvent::Converted { key, chars }) => {
                assert!(*chars > 0);
                converted.push(key.as_str());
            },
            Ok(ConvertEvent::Skipped(key)) => skipped.push(key.as_str()),
            Ok(other) => panic!("unexpected event: {other:?}"),
            Err(err) => failed.push((**err).clone()),
        }
    }
    converted.sort_unstable();
    assert_eq!(converted, ["engineering", "science"]);
    assert_eq!(skipped, ["letters"]);
    assert_eq!(failed, [ErrorKind::UnknownKey("astrology".to_string())]);

    assert!(fx.library.store().has("engineering").await.unwrap());
    assert_eq!(fx.backend.writes(), 2);
}

#[tokio::test]
async fn test_convert_twice_skips_everything() {
    let fx = fixture(engineering_tools(), MockBackend::default());
    let keys: Vec<String> = fx.library.catalog().keys().map(String::from).collect();
    let first: Vec<_> = fx.library.convert(keys.clone()).collect().await;
    assert!(first.iter().all(Result::is_ok));

    let second: Vec<_> = fx.library.convert(keys).collect().await;
    let skipped = second.iter().filter(|event| matches!(event, Ok(ConvertEvent::Skipped(_)))).count();
    assert_eq!(skipped, 3);
    assert_eq!(fx.tools.page_counts(), 3);
}

#[tokio::test]
async fn test_convert_nothing() {
    let fx = fixture(engineering_tools(), MockBackend::default());
    let events: Vec<_> = fx.library.convert(Vec::new()).collect().await;
    assert!(matches!(events.as_slice(), [Ok(ConvertEvent::Started(0)), Ok(ConvertEvent::Complete)]));
}

#[tokio::test]
async fn test_convert_fails_when_nothing_is_stored() {
    let backend = MockBackend::default();
    backend.fail_writes(true);
    let fx = fixture(engineering_tools(), backend);
    let events: Vec<_> = fx.library.convert(["science".to_string()]).collect().await;

    assert_eq!(events.len(), 3);
    let err = events[1].as_ref().unwrap_err();
    assert_eq!(**err, ErrorKind::Unavailable("science".to_string()));
    assert!(!fx.library.store().has("science").await.unwrap());

    // The text is cached; once the store accepts writes, converting again
    // persists it without a second extraction.
    fx.backend.fail_writes(false);
    let events: Vec<_> = fx.library.convert(["science".to_string()]).collect().await;
    assert!(matches!(&events[1], Ok(ConvertEvent::Converted { key, .. }) if key == "science"));
    assert!(fx.library.store().has("science").await.unwrap());
    assert_eq!(fx.tools.page_counts(), 1);
}
