// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! End-to-end tests of the publisher loop against the mock backend

use ippusb_dnssd::{
    NameState, PublishStatus, Publisher, PublisherConfig, ServiceDescriptor, ServiceSet,
    TxtRecord,
};
use ippusb_dnssd_mock::{Attempt, MemoryNameStore, MockBackend};
use std::time::Duration;
use tokio::time::Instant;

const RETRY: Duration = Duration::from_secs(1);

fn ipp_services() -> ServiceSet {
    let mut txt = TxtRecord::new();
    txt.add("txtvers", "1");
    txt.add_pdl("pdl", "application/pdf,image/urf,image/pwg-raster");

    [ServiceDescriptor::new("_ipp._tcp", 60000)
        .with_sub_type("_print")
        .with_txt(txt)]
    .into_iter()
    .collect()
}

fn publisher(
    backend: &MockBackend,
    store: &MemoryNameStore,
    state: NameState,
) -> Publisher<MockBackend> {
    Publisher::new(backend.clone(), state, Box::new(store.clone()), ipp_services())
}

/// Let the publisher loop run for a while on the paused clock
async fn settle() {
    tokio::time::sleep(RETRY * 10).await;
}

#[test_log::test(tokio::test(start_paused = true))]
async fn test_first_run_saves_usb_name() {
    let backend = MockBackend::new();
    backend.script(Attempt::Report(vec![PublishStatus::Success]));
    let store = MemoryNameStore::new();

    let mut publisher = publisher(&backend, &store, NameState::new("Printer"));
    publisher.publish().unwrap();

    store.wait_for_saves(1).await;
    assert_eq!(
        store.current(),
        Some(NameState {
            dnssd_name: "Printer".to_string(),
            dnssd_override: "Printer (USB)".to_string(),
        })
    );
    assert_eq!(backend.instances(), ["Printer (USB)"]);
    assert_eq!(backend.services(), [ipp_services()]);

    publisher.unpublish().await;
}

#[test_log::test(tokio::test(start_paused = true))]
async fn test_collision_then_success() {
    let backend = MockBackend::new();
    backend.script(Attempt::Report(vec![PublishStatus::Collision]));
    backend.script(Attempt::Report(vec![PublishStatus::Success]));
    let store = MemoryNameStore::new();

    let mut publisher = publisher(&backend, &store, NameState::new("Printer"));
    publisher.publish().unwrap();

    store.wait_for_saves(1).await;
    settle().await;

    assert_eq!(backend.instances(), ["Printer (USB)", "Printer (USB 1)"]);
    assert_eq!(store.current().unwrap().dnssd_override, "Printer (USB 1)");
    assert_eq!(store.save_count(), 1);
    // The colliding registration was halted before the retry
    assert_eq!(backend.halt_count(), 1);

    publisher.unpublish().await;
    assert_eq!(backend.halt_count(), 2);
}

#[test_log::test(tokio::test(start_paused = true))]
async fn test_saved_name_reused_without_save() {
    let backend = MockBackend::new();
    backend.script(Attempt::Report(vec![PublishStatus::Success]));

    let state = NameState {
        dnssd_name: "Printer".to_string(),
        dnssd_override: "Printer (USB)".to_string(),
    };
    let store = MemoryNameStore::with_state(state.clone());

    let mut publisher = publisher(&backend, &store, state);
    publisher.publish().unwrap();
    settle().await;

    assert_eq!(backend.instances(), ["Printer (USB)"]);
    assert_eq!(store.save_count(), 0);

    publisher.unpublish().await;
}

#[test_log::test(tokio::test(start_paused = true))]
async fn test_repeated_collisions_increase_suffix() {
    let backend = MockBackend::new();
    for _ in 0..3 {
        backend.script(Attempt::Report(vec![PublishStatus::Collision]));
    }
    backend.script(Attempt::Report(vec![PublishStatus::Success]));
    let store = MemoryNameStore::new();

    let mut publisher = publisher(&backend, &store, NameState::new("Printer"));
    publisher.publish().unwrap();

    store.wait_for_saves(1).await;
    assert_eq!(
        backend.instances(),
        [
            "Printer (USB)",
            "Printer (USB 1)",
            "Printer (USB 2)",
            "Printer (USB 3)",
        ]
    );
    assert_eq!(store.current().unwrap().dnssd_override, "Printer (USB 3)");

    publisher.unpublish().await;
}

#[test_log::test(tokio::test(start_paused = true))]
async fn test_failures_retry_with_same_name() {
    let backend = MockBackend::new();
    backend.script(Attempt::Report(vec![PublishStatus::Failure]));
    backend.script(Attempt::Report(vec![PublishStatus::Failure]));
    backend.script(Attempt::Report(vec![PublishStatus::Success]));
    let store = MemoryNameStore::new();

    let mut publisher = publisher(&backend, &store, NameState::new("Printer"));
    publisher.publish().unwrap();

    store.wait_for_saves(1).await;
    assert_eq!(backend.instances(), ["Printer (USB)"; 3]);
    assert_eq!(store.current().unwrap().dnssd_override, "Printer (USB)");

    publisher.unpublish().await;
}

#[test_log::test(tokio::test(start_paused = true))]
async fn test_collision_after_success_renames() {
    let backend = MockBackend::new();
    let store = MemoryNameStore::new();

    let mut publisher = publisher(&backend, &store, NameState::new("Printer"));
    publisher.publish().unwrap();

    backend.wait_for_starts(1).await;
    assert!(backend.send(PublishStatus::Success));
    store.wait_for_saves(1).await;

    // Someone else grabbed our name later on
    assert!(backend.send(PublishStatus::Collision));
    backend.wait_for_starts(2).await;
    assert!(backend.send(PublishStatus::Success));
    store.wait_for_saves(2).await;

    let overrides: Vec<_> = store
        .history()
        .into_iter()
        .map(|state| state.dnssd_override)
        .collect();
    assert_eq!(overrides, ["Printer (USB)", "Printer (USB 1)"]);

    publisher.unpublish().await;
}

#[test_log::test(tokio::test(start_paused = true))]
async fn test_retry_waits_for_interval() {
    let backend = MockBackend::new();
    backend.script(Attempt::Report(vec![PublishStatus::Failure]));
    let store = MemoryNameStore::new();

    let interval = Duration::from_secs(5);
    let mut publisher = publisher(&backend, &store, NameState::new("Printer"))
        .with_config(PublisherConfig {
            retry_interval: interval,
        });
    publisher.publish().unwrap();

    backend.wait_for_halts(1).await;
    let failed_at = Instant::now();
    backend.wait_for_starts(2).await;
    assert!(failed_at.elapsed() >= interval);

    publisher.unpublish().await;
}

#[test_log::test(tokio::test(start_paused = true))]
async fn test_unpublish_while_retry_pending() {
    let backend = MockBackend::new();
    backend.script(Attempt::Report(vec![PublishStatus::Failure]));
    let store = MemoryNameStore::new();

    let mut publisher = publisher(&backend, &store, NameState::new("Printer"));
    publisher.publish().unwrap();

    // Failure handled, retry timer armed
    backend.wait_for_halts(1).await;
    assert_eq!(backend.start_count(), 1);

    let started = Instant::now();
    publisher.unpublish().await;
    assert!(started.elapsed() < RETRY);

    settle().await;
    assert_eq!(backend.start_count(), 1);
    assert_eq!(store.save_count(), 0);
}

#[test_log::test(tokio::test(start_paused = true))]
async fn test_unpublish_halts_live_registration() {
    let backend = MockBackend::new();
    let store = MemoryNameStore::new();

    let mut publisher = publisher(&backend, &store, NameState::new("Printer"));
    publisher.publish().unwrap();
    backend.wait_for_starts(1).await;
    assert!(publisher.is_running());

    publisher.unpublish().await;
    assert_eq!(backend.halt_count(), 1);
    assert!(!backend.send(PublishStatus::Success));
}

#[test_log::test(tokio::test(start_paused = true))]
async fn test_start_error_is_retried() {
    let backend = MockBackend::new();
    backend.script(Attempt::StartError("daemon not running".to_string()));
    backend.script(Attempt::StartError("daemon not running".to_string()));
    backend.script(Attempt::Report(vec![PublishStatus::Success]));
    let store = MemoryNameStore::new();

    let mut publisher = publisher(&backend, &store, NameState::new("Printer"));
    publisher.publish().unwrap();

    store.wait_for_saves(1).await;
    assert_eq!(backend.start_count(), 3);
    assert_eq!(store.current().unwrap().dnssd_override, "Printer (USB)");

    publisher.unpublish().await;
}

#[test_log::test(tokio::test(start_paused = true))]
async fn test_unknown_status_ignored() {
    let backend = MockBackend::new();
    backend.script(Attempt::Report(vec![
        PublishStatus::Unknown,
        PublishStatus::Success,
    ]));
    let store = MemoryNameStore::new();

    let mut publisher = publisher(&backend, &store, NameState::new("Printer"));
    publisher.publish().unwrap();

    store.wait_for_saves(1).await;
    settle().await;
    assert_eq!(backend.start_count(), 1);
    assert_eq!(backend.halt_count(), 0);

    publisher.unpublish().await;
}

#[test_log::test(tokio::test(start_paused = true))]
async fn test_save_failure_keeps_loop_running() {
    let backend = MockBackend::new();
    backend.script(Attempt::Report(vec![PublishStatus::Success]));
    let store = MemoryNameStore::new();
    store.fail_saves(true);

    let mut publisher = publisher(&backend, &store, NameState::new("Printer"));
    publisher.publish().unwrap();

    store.wait_for_saves(1).await;
    assert_eq!(store.current(), None);

    assert!(backend.send(PublishStatus::Failure));
    backend.wait_for_starts(2).await;
    assert!(publisher.is_running());

    publisher.unpublish().await;
}

#[test_log::test(tokio::test(start_paused = true))]
async fn test_panic_in_loop_is_contained() {
    let backend = MockBackend::new();
    backend.script(Attempt::Panic);
    let store = MemoryNameStore::new();

    let mut publisher = publisher(&backend, &store, NameState::new("Printer"));
    publisher.publish().unwrap();

    settle().await;
    assert_eq!(backend.start_count(), 1);
    assert!(!publisher.is_running());

    // Still safe to tear down
    publisher.unpublish().await;
}

#[test_log::test(tokio::test(start_paused = true))]
async fn test_long_name_with_collisions_stays_within_limit() {
    let backend = MockBackend::new();
    for _ in 0..12 {
        backend.script(Attempt::Report(vec![PublishStatus::Collision]));
    }
    backend.script(Attempt::Report(vec![PublishStatus::Success]));
    let store = MemoryNameStore::new();

    let name = "Very Long Multifunction Printer Model Name With Many Words In It";
    let mut publisher = publisher(&backend, &store, NameState::new(name));
    publisher.publish().unwrap();

    store.wait_for_saves(1).await;
    let instances = backend.instances();
    assert_eq!(instances.len(), 13);
    assert!(instances.iter().all(|n| n.len() <= 63));
    assert!(instances[12].ends_with(" (USB 12)"));

    publisher.unpublish().await;
}

#[test_log::test(tokio::test(start_paused = true))]
async fn test_status_queued_on_replaced_registration_is_dropped() {
    let backend = MockBackend::new();
    // The Success behind the Collision belongs to the halted registration
    backend.script(Attempt::Report(vec![
        PublishStatus::Collision,
        PublishStatus::Success,
    ]));
    backend.script(Attempt::Report(vec![PublishStatus::Success]));
    let store = MemoryNameStore::new();

    let mut publisher = publisher(&backend, &store, NameState::new("Printer"));
    publisher.publish().unwrap();

    store.wait_for_saves(1).await;
    settle().await;

    let overrides: Vec<_> = store
        .history()
        .into_iter()
        .map(|state| state.dnssd_override)
        .collect();
    assert_eq!(overrides, ["Printer (USB 1)"]);
    assert_eq!(backend.instances(), ["Printer (USB)", "Printer (USB 1)"]);

    publisher.unpublish().await;
}

#[test_log::test(tokio::test(start_paused = true))]
async fn test_failed_save_is_retried_on_next_success() {
    let backend = MockBackend::new();
    let store = MemoryNameStore::new();
    store.fail_saves(true);

    let mut publisher = publisher(&backend, &store, NameState::new("Printer"));
    publisher.publish().unwrap();

    backend.wait_for_starts(1).await;
    assert!(backend.send(PublishStatus::Success));
    store.wait_for_saves(1).await;
    assert_eq!(store.current(), None);

    // Republished under the same name once the store works again
    store.fail_saves(false);
    assert!(backend.send(PublishStatus::Failure));
    backend.wait_for_starts(2).await;
    assert!(backend.send(PublishStatus::Success));
    store.wait_for_saves(2).await;

    assert_eq!(backend.instances(), ["Printer (USB)"; 2]);
    assert_eq!(store.current().unwrap().dnssd_override, "Printer (USB)");

    publisher.unpublish().await;
}
