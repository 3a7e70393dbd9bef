//! Claim and step semantics against a real Postgres.
//!
//! Runs only when `DATABASE_URL` points at a database the migrations can be
//! applied to; otherwise each test returns early.

use std::env;

use serde_json::json;
use uuid::Uuid;

use interview_backend::database::pool::{create_pool, run_migrations};
use interview_backend::database::{PgStore, Store};
use interview_backend::models::attempt::{AttemptRecord, Completion, StageKind};
use interview_backend::models::candidate::{Candidate, NewCandidate, Role, Step};

async fn pg_store() -> Option<PgStore> {
    dotenvy::dotenv().ok();
    let Ok(url) = env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping Postgres store test");
        return None;
    };
    let pool = create_pool(&url).await.expect("pool");
    run_migrations(&pool).await.expect("migrations");
    Some(PgStore::new(pool))
}

async fn candidate_at(store: &PgStore, step: Step) -> Candidate {
    let mut candidate = Candidate::provision(NewCandidate {
        name: "Meera".into(),
        email: format!("meera+{}@example.com", Uuid::new_v4()),
        password_hash: "hash".into(),
        role: Role::Candidate,
    });
    candidate.current_step = step;
    store.insert_candidate(candidate).await.expect("insert candidate")
}

fn completion(score: i32) -> Completion {
    Completion {
        response: json!({"score": score}),
        score,
        feedback: None,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_starts_leave_one_open_attempt() {
    let Some(store) = pg_store().await else { return };
    let candidate = candidate_at(&store, Step::Video).await;

    let starts: Vec<_> = (0..8)
        .map(|_| {
            let store = store.clone();
            let attempt = AttemptRecord::open(candidate.id, StageKind::Video, json!({"question": "q"}));
            tokio::spawn(async move { store.insert_open_attempt(attempt).await })
        })
        .collect();

    let mut ids = Vec::new();
    for handle in starts {
        ids.push(handle.await.unwrap().expect("insert open attempt").id);
    }
    ids.dedup();
    assert_eq!(ids.len(), 1, "every start must see the same attempt");

    let open: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM attempts WHERE candidate_id = $1 AND stage = 'video' AND completed = FALSE",
    )
    .bind(candidate.id)
    .fetch_one(store.pool())
    .await
    .unwrap();
    assert_eq!(open, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_completions_have_one_winner() {
    let Some(store) = pg_store().await else { return };
    let candidate = candidate_at(&store, Step::Mcq).await;
    let attempt = store
        .insert_open_attempt(AttemptRecord::open(candidate.id, StageKind::Mcq, json!({"questions": []})))
        .await
        .unwrap();

    let (attempt_id, candidate_id) = (attempt.id, candidate.id);
    let claims: Vec<_> = (0..12)
        .map(|score| {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .complete_attempt(attempt_id, candidate_id, StageKind::Mcq, completion(score))
                    .await
            })
        })
        .collect();

    let mut winners = Vec::new();
    for handle in claims {
        if let Some(done) = handle.await.unwrap().expect("complete attempt") {
            winners.push(done);
        }
    }
    assert_eq!(winners.len(), 1);
    let winner = &winners[0];
    assert_eq!(winner.current_step, Step::Video);

    let stored = store.find_attempt(attempt.id).await.unwrap().unwrap();
    assert!(stored.completed);
    assert_eq!(stored.score, winner.attempt.score);
    let stored = store.find_candidate(candidate.id).await.unwrap().unwrap();
    assert_eq!(stored.mcq_score, winner.attempt.score);
    assert_eq!(stored.current_step, Step::Video);
}

#[tokio::test]
async fn late_earlier_completion_keeps_step() {
    let Some(store) = pg_store().await else { return };
    let candidate = candidate_at(&store, Step::Coding).await;
    let mcq = store
        .insert_open_attempt(AttemptRecord::open(candidate.id, StageKind::Mcq, json!({})))
        .await
        .unwrap();
    let coding = store
        .insert_open_attempt(AttemptRecord::open(candidate.id, StageKind::Coding, json!({})))
        .await
        .unwrap();

    let done = store
        .complete_attempt(coding.id, candidate.id, StageKind::Coding, completion(70))
        .await
        .unwrap()
        .expect("coding claim");
    assert_eq!(done.current_step, Step::Completed);

    let done = store
        .complete_attempt(mcq.id, candidate.id, StageKind::Mcq, completion(5))
        .await
        .unwrap()
        .expect("mcq claim");
    assert_eq!(done.current_step, Step::Completed);

    let stored = store.find_candidate(candidate.id).await.unwrap().unwrap();
    assert_eq!(stored.current_step, Step::Completed);
    assert_eq!((stored.mcq_score, stored.coding_score), (Some(5), Some(70)));
}
