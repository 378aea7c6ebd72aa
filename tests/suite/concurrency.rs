//! Racing guarded transitions: exactly one caller may win.

use std::sync::Barrier;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use sandpool_db::Db;
use sandpool_types::{AccountStatus, LeaseStatus};

use crate::common::{TestDb, backends, reopen, seed_accounts, seed_leases};

const RACERS: usize = 8;

fn race_for_account(dbs: &[Db]) -> usize {
    let winners = AtomicUsize::new(0);
    let barrier = Barrier::new(dbs.len());
    thread::scope(|scope| {
        for db in dbs {
            let winners = &winners;
            let barrier = &barrier;
            scope.spawn(move || {
                barrier.wait();
                match db
                    .accounts()
                    .transition_status("1", AccountStatus::Ready, AccountStatus::Leased)
                {
                    Ok(_) => {
                        winners.fetch_add(1, Ordering::SeqCst);
                    }
                    Err(err) => assert!(err.is_status_transition(), "unexpected error: {err}"),
                }
            });
        }
    });
    winners.into_inner()
}

#[test]
fn one_thread_wins_the_account() {
    for TestDb { name, db, .. } in &backends() {
        seed_accounts(db, &[("1", AccountStatus::Ready)]);
        let racers: Vec<Db> = (0..RACERS).map(|_| db.clone()).collect();
        assert_eq!(race_for_account(&racers), 1, "{name}");
        assert_eq!(
            db.accounts().get("1").unwrap().unwrap().account_status,
            AccountStatus::Leased,
            "{name}"
        );
    }
}

#[test]
fn one_connection_wins_across_sqlite_handles() {
    let fixture = TestDb::sqlite();
    seed_accounts(&fixture.db, &[("1", AccountStatus::Ready)]);
    let path = fixture.path().expect("sqlite fixture has a path");

    // Separate connections on one file stand in for separate processes.
    let racers: Vec<Db> = (0..RACERS).map(|_| reopen(&path)).collect();
    assert_eq!(race_for_account(&racers), 1);
    assert_eq!(
        fixture.db.accounts().get("1").unwrap().unwrap().account_status,
        AccountStatus::Leased
    );
}

#[test]
fn racing_lease_locks_apply_once() {
    for TestDb { name, db, .. } in &backends() {
        seed_leases(db, &[("111", "222", LeaseStatus::Active)]);
        let winners = AtomicUsize::new(0);
        thread::scope(|scope| {
            for target in [LeaseStatus::ResetLock, LeaseStatus::FinanceLock]
                .into_iter()
                .cycle()
                .take(RACERS)
            {
                let winners = &winners;
                scope.spawn(move || {
                    if db
                        .leases()
                        .transition_status("111", "222", LeaseStatus::Active, target)
                        .is_ok()
                    {
                        winners.fetch_add(1, Ordering::SeqCst);
                    }
                });
            }
        });
        assert_eq!(winners.into_inner(), 1, "{name}");
        let lease = db.leases().get("111", "222").unwrap().unwrap();
        assert_ne!(lease.lease_status, LeaseStatus::Active, "{name}");
    }
}

#[test]
fn unconditioned_puts_are_last_writer_wins() {
    for TestDb { name, db, .. } in &backends() {
        thread::scope(|scope| {
            for i in 0..RACERS {
                scope.spawn(move || {
                    let status = if i % 2 == 0 {
                        AccountStatus::Ready
                    } else {
                        AccountStatus::NotReady
                    };
                    seed_accounts(db, &[("shared", status)]);
                });
            }
        });
        assert_eq!(db.accounts().list().unwrap().len(), 1, "{name}");
    }
}
