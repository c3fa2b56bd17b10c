//! Slot Tracker Tests
//!
//! Tests for:
//! - Request diffing: unchanged, issued, cleared, failed
//! - Generation checks on completions
//! - Option merging at issue time
//! - Cancellation and draining

mod common;

use std::sync::Arc;

use common::{ScriptedFetcher, settings};
use tessera::{
    AttributeSchema, CompletionOutcome, Constant, LoadError, MapSlot, NoElements, OptionFragment,
    OptionSet, SlotError, SlotRequest, SlotState, SlotTracker, SourceResolutionError,
    SourceResolver, TextureLoader, TextureOption, Value,
};
use tokio::runtime::Handle;

fn tracker(cancel_superseded: bool) -> (SlotTracker, Arc<ScriptedFetcher>) {
    let schema = Arc::new(AttributeSchema::phong().unwrap());
    let resolver = SourceResolver::new(&settings(), Arc::new(NoElements), schema.clone()).unwrap();
    let fetcher = ScriptedFetcher::new();
    let loader = TextureLoader::new(fetcher.clone(), None);
    let tracker = SlotTracker::new(
        resolver,
        loader,
        OptionSet::from_schema(&schema),
        Handle::current(),
        cancel_superseded,
    );
    (tracker, fetcher)
}

fn no_globals() -> OptionFragment {
    OptionFragment::new()
}

// ============================================================================
// Request Diffing
// ============================================================================

#[tokio::test]
async fn first_request_issues_generation_one() {
    let (mut tracker, fetcher) = tracker(true);

    let request = tracker.request(MapSlot::Map, Some("a.png"), &no_globals());
    assert_eq!(request, SlotRequest::Issued { generation: 1 });
    assert_eq!(tracker.state(MapSlot::Map), SlotState::Loading);
    assert_eq!(tracker.slot(MapSlot::Map).unwrap().requested(), Some("a.png"));
    assert_eq!(tracker.in_flight(), 1);
    assert_eq!(fetcher.calls(), vec!["a.png".to_string()]);
}

#[tokio::test]
async fn same_source_is_unchanged() {
    let (mut tracker, _fetcher) = tracker(true);

    tracker.request(MapSlot::Map, Some("a.png"), &no_globals());
    let globals = no_globals().with(TextureOption::WrapS, Value::Constant(Constant::RepeatWrapping));
    assert_eq!(
        tracker.request(MapSlot::Map, Some("a.png"), &globals),
        SlotRequest::Unchanged
    );
    assert_eq!(tracker.loads_issued(), 1);
    assert_eq!(tracker.generation(MapSlot::Map), 1);
}

#[tokio::test]
async fn absent_source_on_unknown_slot_creates_nothing() {
    let (mut tracker, _fetcher) = tracker(true);

    assert_eq!(
        tracker.request(MapSlot::EnvMap, None, &no_globals()),
        SlotRequest::Unchanged
    );
    assert!(tracker.slot(MapSlot::EnvMap).is_none());
    assert_eq!(tracker.generation(MapSlot::EnvMap), 0);
}

#[tokio::test]
async fn absent_source_clears_a_known_slot() {
    let (mut tracker, _fetcher) = tracker(true);

    tracker.request(MapSlot::Map, Some("a.png"), &no_globals());
    assert_eq!(tracker.request(MapSlot::Map, None, &no_globals()), SlotRequest::Cleared);
    assert_eq!(tracker.state(MapSlot::Map), SlotState::Unloaded);
    assert_eq!(tracker.generation(MapSlot::Map), 2);
    assert_eq!(tracker.in_flight(), 0);
}

#[tokio::test]
async fn resolution_failure_consumes_a_generation() {
    let (mut tracker, _fetcher) = tracker(true);

    let request = tracker.request(MapSlot::AlphaMap, Some("#nowhere"), &no_globals());
    assert_eq!(
        request,
        SlotRequest::Failed {
            generation: 1,
            error: SlotError::Resolution(SourceResolutionError::NoMatch("#nowhere".into())),
        }
    );
    assert_eq!(tracker.state(MapSlot::AlphaMap), SlotState::Failed);
    assert_eq!(tracker.loads_issued(), 0);

    let request = tracker.request(MapSlot::AlphaMap, Some("http://"), &no_globals());
    assert!(matches!(
        request,
        SlotRequest::Failed {
            generation: 2,
            error: SlotError::Resolution(SourceResolutionError::MalformedAddress { .. }),
        }
    ));
}

#[tokio::test]
async fn empty_source_fails_instead_of_clearing() {
    let (mut tracker, fetcher) = tracker(true);

    tracker.request(MapSlot::Map, Some("a.png"), &no_globals());
    fetcher.release("a.png");
    let completion = tracker.next_completion().await.unwrap();
    tracker.complete(completion);

    assert_eq!(
        tracker.request(MapSlot::Map, Some(""), &no_globals()),
        SlotRequest::Failed {
            generation: 2,
            error: SlotError::Resolution(SourceResolutionError::Empty),
        }
    );
    assert_eq!(tracker.state(MapSlot::Map), SlotState::Failed);
    assert_eq!(tracker.slot(MapSlot::Map).unwrap().applied().unwrap().name, "a.png");
}

// ============================================================================
// Completions
// ============================================================================

#[tokio::test]
async fn current_completion_is_applied() {
    let (mut tracker, fetcher) = tracker(true);

    tracker.request(MapSlot::Map, Some("a.png"), &no_globals());
    fetcher.release("a.png");
    let completion = tracker.next_completion().await.unwrap();
    assert_eq!(completion.generation, 1);
    assert_eq!(completion.source, "a.png");

    match tracker.complete(completion) {
        CompletionOutcome::Applied { slot, texture, .. } => {
            assert_eq!(slot, MapSlot::Map);
            assert_eq!(texture.name, "a.png");
        }
        other => panic!("expected Applied, got {other:?}"),
    }
    assert_eq!(tracker.state(MapSlot::Map), SlotState::Loaded);
    assert_eq!(tracker.slot(MapSlot::Map).unwrap().applied().unwrap().name, "a.png");
}

#[tokio::test]
async fn stale_completion_is_discarded_in_either_order() {
    for newest_first in [false, true] {
        let (mut tracker, fetcher) = tracker(false);

        tracker.request(MapSlot::Map, Some("a.png"), &no_globals());
        tracker.request(MapSlot::Map, Some("b.png"), &no_globals());

        let order = if newest_first {
            ["b.png", "a.png"]
        } else {
            ["a.png", "b.png"]
        };
        for name in order {
            fetcher.release(name);
            let completion = tracker.next_completion().await.unwrap();
            let outcome = tracker.complete(completion);
            match name {
                "a.png" => assert!(matches!(outcome, CompletionOutcome::Stale { generation: 1, .. })),
                _ => assert!(matches!(outcome, CompletionOutcome::Applied { generation: 2, .. })),
            }
        }

        assert_eq!(tracker.state(MapSlot::Map), SlotState::Loaded);
        assert_eq!(tracker.slot(MapSlot::Map).unwrap().applied().unwrap().name, "b.png");
    }
}

#[tokio::test]
async fn failed_completion_keeps_applied_texture() {
    let (mut tracker, fetcher) = tracker(true);

    tracker.request(MapSlot::Map, Some("a.png"), &no_globals());
    fetcher.release("a.png");
    let completion = tracker.next_completion().await.unwrap();
    tracker.complete(completion);

    tracker.request(MapSlot::Map, Some("b.png"), &no_globals());
    fetcher.fail("b.png", LoadError::Http {
        url: "https://assets.test/textures/b.png".into(),
        status: 404,
    });
    let completion = tracker.next_completion().await.unwrap();
    assert!(matches!(
        tracker.complete(completion),
        CompletionOutcome::Failed {
            error: SlotError::Load(LoadError::Http { status: 404, .. }),
            ..
        }
    ));
    assert_eq!(tracker.state(MapSlot::Map), SlotState::Failed);
    assert_eq!(tracker.slot(MapSlot::Map).unwrap().applied().unwrap().name, "a.png");
}

// ============================================================================
// Options
// ============================================================================

#[tokio::test]
async fn globals_are_captured_at_issue_time() {
    let (mut tracker, fetcher) = tracker(true);
    let globals = no_globals()
        .with(TextureOption::MagFilter, Value::Constant(Constant::NearestFilter))
        .with(TextureOption::GenerateMipmaps, Value::Bool(false));

    tracker.request(MapSlot::SpecularMap, Some("spec.png"), &globals);
    fetcher.release("spec.png");
    let completion = tracker.next_completion().await.unwrap();
    let CompletionOutcome::Applied { texture, .. } = tracker.complete(completion) else {
        panic!("expected Applied");
    };

    assert_eq!(texture.options.mag_filter, Constant::NearestFilter);
    assert!(!texture.options.generate_mipmaps);
    assert_eq!(texture.options.min_filter, Constant::LinearMipMapLinearFilter);
}

// ============================================================================
// Cancellation & Draining
// ============================================================================

#[tokio::test]
async fn superseded_task_is_aborted() {
    let (mut tracker, fetcher) = tracker(true);

    tracker.request(MapSlot::Map, Some("a.png"), &no_globals());
    tracker.request(MapSlot::Map, Some("b.png"), &no_globals());

    fetcher.release("b.png");
    let completion = tracker.next_completion().await.unwrap();
    assert_eq!(completion.generation, 2);
    tracker.complete(completion);

    assert!(tracker.next_completion().await.is_none());
    assert_eq!(tracker.pending_tasks(), 0);
    assert!(!fetcher.release("a.png"));
}

#[tokio::test]
async fn next_completion_is_none_when_idle() {
    let (tracker, _fetcher) = tracker(true);
    assert!(tracker.next_completion().await.is_none());
    assert!(tracker.try_next_completion().is_none());
}

#[tokio::test]
async fn clear_forgets_every_slot() {
    let (mut tracker, _fetcher) = tracker(true);

    tracker.request(MapSlot::Map, Some("a.png"), &no_globals());
    tracker.request(MapSlot::LightMap, Some("light.png"), &no_globals());
    tracker.clear();

    assert!(tracker.slot(MapSlot::Map).is_none());
    assert!(tracker.slot(MapSlot::LightMap).is_none());
    assert!(tracker.next_completion().await.is_none());
}
