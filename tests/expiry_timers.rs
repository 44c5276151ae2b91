//! Eager reclamation and concurrent access.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};

use keygate::keys::{CredentialService, KeyDuration, ManualClock, SystemClock, TokenGenerator};

fn start() -> DateTime<Utc> {
    "2024-01-01T00:00:00Z".parse().unwrap()
}

fn service() -> (CredentialService, ManualClock) {
    let clock = ManualClock::new(start());
    let svc = CredentialService::with_clock(TokenGenerator::default(), Arc::new(clock.clone()));
    (svc, clock)
}

/// Lets spawned timer tasks run after the paused clock moves.
async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

/// Moves the injected clock and tokio's paused clock together.
async fn advance_both(clock: &ManualClock, secs: u64) {
    clock.advance(Duration::seconds(secs as i64));
    tokio::time::advance(StdDuration::from_secs(secs)).await;
    settle().await;
}

#[tokio::test(start_paused = true)]
async fn test_timer_reclaims_unvalidated_key() {
    let (svc, clock) = service();
    let issued = svc.issue(KeyDuration::OneHour, None).unwrap();
    assert_eq!(svc.pending_timers(), 1);

    advance_both(&clock, 3599).await;
    assert_eq!(svc.active_keys(), 1, "not yet due");

    advance_both(&clock, 2).await;
    assert_eq!(svc.active_keys(), 0);
    assert_eq!(svc.pending_timers(), 0);
    assert_eq!(svc.metrics().evictions("timer"), 1);

    // The record is gone, so this is an unknown key rather than a lazy eviction.
    assert!(!svc.validate(&issued.token).valid);
    assert_eq!(svc.metrics().evictions("lazy"), 0);
    assert_eq!(svc.metrics().validations("unknown"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_timers_fire_in_expiry_order() {
    let (svc, clock) = service();
    let short = svc.issue(KeyDuration::OneHour, None).unwrap();
    let long = svc.issue(KeyDuration::OneDay, None).unwrap();

    advance_both(&clock, 2 * 3600).await;
    assert_eq!(svc.active_keys(), 1);
    assert!(!svc.validate(&short.token).valid);
    assert!(svc.validate(&long.token).valid);

    advance_both(&clock, 24 * 3600).await;
    assert_eq!(svc.active_keys(), 0);
    assert_eq!(svc.metrics().evictions("timer"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_timer_defers_to_injected_clock() {
    let (svc, clock) = service();
    let issued = svc.issue(KeyDuration::OneHour, None).unwrap();

    // Tokio time runs past the deadline while the injected clock lags by 30 minutes.
    clock.advance(Duration::minutes(30));
    tokio::time::advance(StdDuration::from_secs(3601)).await;
    settle().await;

    let v = svc.validate(&issued.token);
    assert!(v.valid, "key must stay live while the clock says time remains");
    assert_eq!(v.remaining_time, Some(1800));
    assert_eq!(svc.pending_timers(), 1, "timer re-armed for the remainder");
    assert_eq!(svc.metrics().evictions("timer"), 0);

    // Once the clock catches up, the re-armed timer reclaims the key.
    advance_both(&clock, 1801).await;
    assert_eq!(svc.active_keys(), 0);
    assert_eq!(svc.pending_timers(), 0);
    assert_eq!(svc.metrics().evictions("timer"), 1);
    assert_eq!(svc.metrics().evictions("lazy"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_revoked_key_timer_never_fires() {
    let (svc, clock) = service();
    let issued = svc.issue(KeyDuration::OneHour, None).unwrap();
    assert!(svc.revoke(&issued.token));
    assert_eq!(svc.pending_timers(), 0);

    advance_both(&clock, 7200).await;
    assert_eq!(svc.metrics().evictions("timer"), 0);
    assert_eq!(svc.metrics().evictions("revoke"), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_issue_and_validate() {
    let svc = CredentialService::with_clock(TokenGenerator::default(), Arc::new(SystemClock));

    let mut handles = Vec::new();
    for i in 0..16 {
        let svc = svc.clone();
        handles.push(tokio::spawn(async move {
            let mut tokens = Vec::new();
            for _ in 0..25 {
                let issued = svc
                    .issue(KeyDuration::OneHour, Some(format!("worker-{}", i)))
                    .unwrap();
                assert!(svc.validate(&issued.token).valid);
                tokens.push(issued.token);
            }
            tokens
        }));
    }

    let mut tokens = Vec::new();
    for h in handles {
        tokens.extend(h.await.unwrap());
    }
    assert_eq!(svc.active_keys(), 400);
    assert_eq!(svc.pending_timers(), 400);

    let mut handles = Vec::new();
    for chunk in tokens.chunks(50) {
        let svc = svc.clone();
        let chunk = chunk.to_vec();
        handles.push(tokio::spawn(async move {
            for t in &chunk {
                assert!(svc.revoke(t));
            }
        }));
    }
    for h in handles {
        h.await.unwrap();
    }
    assert_eq!(svc.active_keys(), 0);
    assert_eq!(svc.pending_timers(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_removals_evict_exactly_once() {
    let (svc, clock) = service();
    let issued = svc.issue(KeyDuration::OneHour, None).unwrap();
    clock.advance(Duration::hours(1));

    let mut handles = Vec::new();
    for i in 0..32 {
        let svc = svc.clone();
        let token = issued.token.clone();
        handles.push(tokio::spawn(async move {
            if i % 2 == 0 {
                assert!(!svc.validate(&token).valid);
            } else {
                svc.revoke(&token);
            }
        }));
    }
    for h in handles {
        h.await.unwrap();
    }

    let m = svc.metrics();
    assert_eq!(m.evictions("lazy") + m.evictions("revoke"), 1);
    assert_eq!(svc.active_keys(), 0);
    assert_eq!(svc.pending_timers(), 0);
}
