use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use rand::seq::SliceRandom;
use tokio_test::{assert_err, assert_ok};
use uuid::Uuid;

use caballus::api::OfferAPI;
use caballus::auth::User;
use caballus::db::{MemoryStore, Store};
use caballus::engine::EngineOptions;
use caballus::entities::{Offer, OfferStatus, RideStatus};
use caballus::error::ErrorKind;
use caballus::test_support::{engine, engine_with_options, seed_ride, RecordingNotifier};

fn notifier() -> Arc<RecordingNotifier> {
    Arc::new(RecordingNotifier::new())
}

#[tokio::test]
async fn accepting_one_offer_rejects_the_other() {
    let store = MemoryStore::new();
    let passenger = User::new(Uuid::new_v4());
    let (d1, d2) = (Uuid::new_v4(), Uuid::new_v4());
    let (ride, offers) = seed_ride(&store, passenger.id, &[d1, d2]).await;
    let engine = engine(&store, notifier());

    let acceptance = assert_ok!(engine.accept_offer(passenger.clone(), offers[0].id).await);

    assert_eq!(acceptance.ride_id, ride.id);
    assert_eq!(acceptance.driver_id, d1);
    assert_eq!(acceptance.rejected_driver_ids, vec![d2]);

    let stored = store.ride(ride.id).await.unwrap();
    assert_eq!(stored.driver_id, Some(d1));
    assert_eq!(stored.status, RideStatus::Accepted);
    assert_eq!(stored.fare, offers[0].fare);
    assert_eq!(store.offer(offers[0].id).await.unwrap().status, OfferStatus::Accepted);
    assert_eq!(store.offer(offers[1].id).await.unwrap().status, OfferStatus::Rejected);

    let err = assert_err!(engine.accept_offer(passenger, offers[1].id).await);
    assert!(err.is(ErrorKind::AlreadyResolved));
    assert_eq!(store.ride(ride.id).await.unwrap().driver_id, Some(d1));
}

#[tokio::test]
async fn retrying_a_successful_acceptance_is_already_resolved() {
    let store = MemoryStore::new();
    let passenger = User::new(Uuid::new_v4());
    let (ride, offers) = seed_ride(&store, passenger.id, &[Uuid::new_v4(), Uuid::new_v4()]).await;
    let engine = engine(&store, notifier());

    let first = assert_ok!(engine.accept_offer(passenger.clone(), offers[0].id).await);
    let rejected_at = store.offer(offers[1].id).await.unwrap().resolved_at;

    let err = assert_err!(engine.accept_offer(passenger.clone(), offers[0].id).await);
    assert!(err.is(ErrorKind::AlreadyResolved));

    let stored = store.ride(ride.id).await.unwrap();
    assert_eq!(stored.driver_id, Some(first.driver_id));
    assert_eq!(store.offer(offers[1].id).await.unwrap().resolved_at, rejected_at);
}

#[tokio::test]
async fn unknown_offer_is_not_found() {
    let store = MemoryStore::new();
    let passenger = User::new(Uuid::new_v4());
    let (ride, offers) = seed_ride(&store, passenger.id, &[Uuid::new_v4()]).await;
    let engine = engine(&store, notifier());

    let err = assert_err!(engine.accept_offer(passenger, Uuid::new_v4()).await);

    assert!(err.is(ErrorKind::NotFound));
    assert_eq!(store.ride(ride.id).await.unwrap().status, RideStatus::Requested);
    assert_eq!(store.offer(offers[0].id).await.unwrap().status, OfferStatus::Pending);
}

#[tokio::test]
async fn only_the_ride_owner_may_accept() {
    let store = MemoryStore::new();
    let owner = User::new(Uuid::new_v4());
    let intruder = User::new(Uuid::new_v4());
    let (ride, offers) = seed_ride(&store, owner.id, &[Uuid::new_v4(), Uuid::new_v4()]).await;
    let engine = engine(&store, notifier());

    let err = assert_err!(engine.accept_offer(intruder, offers[0].id).await);

    assert!(err.is(ErrorKind::Forbidden));
    let stored = store.ride(ride.id).await.unwrap();
    assert_eq!(stored.driver_id, None);
    assert_eq!(stored.status, RideStatus::Requested);
    for offer in offers.iter() {
        assert_eq!(store.offer(offer.id).await.unwrap().status, OfferStatus::Pending);
    }
}

#[tokio::test]
async fn driver_cannot_accept_their_own_offer() {
    let store = MemoryStore::new();
    let passenger = User::new(Uuid::new_v4());
    let driver = User::new(Uuid::new_v4());
    let (ride, offers) = seed_ride(&store, passenger.id, &[driver.id, Uuid::new_v4()]).await;
    let engine = engine(&store, notifier());

    let err = assert_err!(engine.accept_offer(driver, offers[0].id).await);

    assert!(err.is(ErrorKind::Forbidden));
    assert_eq!(store.ride(ride.id).await.unwrap().driver_id, None);
    assert_eq!(store.offer(offers[0].id).await.unwrap().status, OfferStatus::Pending);
}

#[tokio::test]
async fn storage_failure_leaves_everything_pending() {
    let store = MemoryStore::new();
    let passenger = User::new(Uuid::new_v4());
    let drivers = [Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
    let (ride, offers) = seed_ride(&store, passenger.id, &drivers).await;
    let engine = engine(&store, notifier());

    store.fail_ride_updates(true);
    let err = assert_err!(engine.accept_offer(passenger.clone(), offers[1].id).await);

    assert!(err.is(ErrorKind::StorageFailure));
    assert_eq!(store.ride(ride.id).await.unwrap().driver_id, None);
    for offer in offers.iter() {
        assert_eq!(store.offer(offer.id).await.unwrap().status, OfferStatus::Pending);
    }

    store.fail_ride_updates(false);
    let acceptance = assert_ok!(engine.accept_offer(passenger, offers[1].id).await);
    assert_eq!(acceptance.driver_id, drivers[1]);
}

#[tokio::test]
async fn every_other_driver_is_rejected_exactly_once() {
    let store = MemoryStore::new();
    let passenger = User::new(Uuid::new_v4());
    let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let (_, offers) = seed_ride(&store, passenger.id, &[a, b, c]).await;
    let engine = engine(&store, notifier());

    let acceptance = assert_ok!(engine.accept_offer(passenger, offers[1].id).await);

    let rejected: HashSet<Uuid> = acceptance.rejected_driver_ids.iter().copied().collect();
    assert_eq!(rejected, HashSet::from([a, c]));
    assert_eq!(acceptance.rejected_driver_ids.len(), 2);
    assert_eq!(store.offer(offers[0].id).await.unwrap().status, OfferStatus::Rejected);
    assert_eq!(store.offer(offers[2].id).await.unwrap().status, OfferStatus::Rejected);
}

#[tokio::test]
async fn winner_holding_a_second_offer_is_not_told_they_lost() {
    let store = MemoryStore::new();
    let passenger = User::new(Uuid::new_v4());
    let (winner, loser) = (Uuid::new_v4(), Uuid::new_v4());
    let (ride, offers) = seed_ride(&store, passenger.id, &[winner, loser]).await;
    let second = Offer::new(ride.id, winner, Some(15.0));
    store.insert_offer(second.clone()).await;
    let engine = engine(&store, notifier());

    let acceptance = assert_ok!(engine.accept_offer(passenger, offers[0].id).await);

    assert_eq!(acceptance.rejected_driver_ids, vec![loser]);
    assert_eq!(store.offer(second.id).await.unwrap().status, OfferStatus::Rejected);
}

#[tokio::test]
async fn expired_offer_is_already_resolved() {
    let store = MemoryStore::new();
    let passenger = User::new(Uuid::new_v4());
    let (ride, offers) = seed_ride(&store, passenger.id, &[Uuid::new_v4()]).await;
    let stale = Offer::new(ride.id, Uuid::new_v4(), None)
        .expiring_at(Utc::now() - ChronoDuration::minutes(1));
    store.insert_offer(stale.clone()).await;
    let engine = engine(&store, notifier());

    let err = assert_err!(engine.accept_offer(passenger.clone(), stale.id).await);
    assert!(err.is(ErrorKind::AlreadyResolved));
    assert_eq!(store.ride(ride.id).await.unwrap().driver_id, None);

    assert_ok!(engine.accept_offer(passenger, offers[0].id).await);
}

#[tokio::test]
async fn cancelled_ride_conflicts() {
    let store = MemoryStore::new();
    let passenger = User::new(Uuid::new_v4());
    let (mut ride, offers) = seed_ride(&store, passenger.id, &[Uuid::new_v4()]).await;
    ride.cancel().unwrap();
    store.insert_ride(ride.clone()).await;
    let engine = engine(&store, notifier());

    let err = assert_err!(engine.accept_offer(passenger, offers[0].id).await);

    assert!(err.is(ErrorKind::Conflict));
    assert_eq!(store.offer(offers[0].id).await.unwrap().status, OfferStatus::Pending);
    assert_eq!(store.ride(ride.id).await.unwrap().status, RideStatus::Cancelled);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_acceptances_have_one_winner() {
    let store = MemoryStore::new();
    let passenger = User::new(Uuid::new_v4());
    let drivers: Vec<Uuid> = (0..8).map(|_| Uuid::new_v4()).collect();
    let (ride, mut offers) = seed_ride(&store, passenger.id, &drivers).await;
    let engine = Arc::new(engine(&store, notifier()));

    offers.shuffle(&mut rand::thread_rng());

    let handles: Vec<_> = offers
        .iter()
        .map(|offer| {
            let engine = engine.clone();
            let passenger = passenger.clone();
            let offer_id = offer.id;
            tokio::spawn(async move { engine.accept_offer(passenger, offer_id).await })
        })
        .collect();

    let mut winners = vec![];
    for handle in handles {
        match handle.await.unwrap() {
            Ok(acceptance) => winners.push(acceptance),
            Err(err) => assert!(
                err.is(ErrorKind::AlreadyResolved) || err.is(ErrorKind::Conflict),
                "unexpected error {:?}",
                err
            ),
        }
    }

    assert_eq!(winners.len(), 1);
    let winner = &winners[0];
    assert_eq!(winner.rejected_driver_ids.len(), drivers.len() - 1);
    assert_eq!(store.ride(ride.id).await.unwrap().driver_id, Some(winner.driver_id));

    let mut accepted = 0;
    for offer in offers.iter() {
        match store.offer(offer.id).await.unwrap().status {
            OfferStatus::Accepted => accepted += 1,
            status => assert_eq!(status, OfferStatus::Rejected),
        }
    }
    assert_eq!(accepted, 1);
}

#[tokio::test]
async fn stalled_transaction_times_out_without_effect() {
    let store = MemoryStore::new();
    let passenger = User::new(Uuid::new_v4());
    let (ride, offers) = seed_ride(&store, passenger.id, &[Uuid::new_v4()]).await;
    let engine = engine_with_options(
        &store,
        notifier(),
        EngineOptions {
            transaction_timeout: Duration::from_millis(50),
            ..EngineOptions::default()
        },
    );

    let held = store.begin().await.unwrap();
    let err = assert_err!(engine.accept_offer(passenger.clone(), offers[0].id).await);
    drop(held);

    assert!(err.is(ErrorKind::Timeout));
    assert_eq!(store.ride(ride.id).await.unwrap().driver_id, None);
    assert_eq!(store.offer(offers[0].id).await.unwrap().status, OfferStatus::Pending);

    assert_ok!(engine.accept_offer(passenger, offers[0].id).await);
}
