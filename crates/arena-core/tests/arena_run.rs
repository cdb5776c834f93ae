//! End-to-end orchestrator runs against scripted capabilities.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use arena_core::fakes::{FailingGenerator, ScriptedChallenger, ScriptedGenerator};
use arena_core::store::{ArenaStore, MemoryArenaStore, StoreResult};
use arena_core::{
    ArenaConfig, ArenaRun, CancelSignal, CandidateGenerator, Corpus, FailureCause, FailureKind,
    LocalSandbox, Orchestrator, RunId, RunStatus, RunStatusView, SandboxConfig,
};

fn corpus(valid: &[&str], invalid: &[&str]) -> Corpus {
    Corpus::new(valid.iter().copied(), invalid.iter().copied()).unwrap()
}

fn config(max_rounds: u32) -> ArenaConfig {
    ArenaConfig {
        max_rounds,
        ..ArenaConfig::default()
    }
}

fn orchestrator(
    max_rounds: u32,
    challenger: Arc<ScriptedChallenger>,
    store: Arc<dyn ArenaStore>,
    generators: Vec<Arc<dyn CandidateGenerator>>,
) -> Orchestrator {
    let sandbox = Arc::new(LocalSandbox::new(SandboxConfig::default()).unwrap());
    let mut orch = Orchestrator::new(config(max_rounds), challenger, sandbox, store).unwrap();
    for g in generators {
        orch = orch.with_generator(g);
    }
    orch
}

/// Store wrapper that records the status of every snapshot written.
struct RecordingStore {
    inner: MemoryArenaStore,
    writes: Mutex<Vec<RunStatus>>,
}

impl RecordingStore {
    fn new() -> Self {
        Self {
            inner: MemoryArenaStore::new(),
            writes: Mutex::new(Vec::new()),
        }
    }

    fn writes(&self) -> Vec<RunStatus> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArenaStore for RecordingStore {
    async fn create(&self, problem: &str, max_rounds: u32) -> StoreResult<RunId> {
        self.inner.create(problem, max_rounds).await
    }

    async fn get(&self, run_id: &RunId) -> StoreResult<Arc<ArenaRun>> {
        self.inner.get(run_id).await
    }

    async fn put(&self, run: ArenaRun) -> StoreResult<()> {
        let status = run.status;
        self.inner.put(run).await?;
        self.writes.lock().unwrap().push(status);
        Ok(())
    }

    async fn list(&self) -> StoreResult<Vec<RunId>> {
        self.inner.list().await
    }
}

#[tokio::test]
async fn test_run_refines_until_perfect_score() {
    let challenger = Arc::new(ScriptedChallenger::new(vec![
        corpus(&["a"], &["b"]),
        corpus(&["a"], &["b", "aa"]),
    ]));
    let g0 = Arc::new(ScriptedGenerator::new("short", ["a.", "a"]));
    let g1 = Arc::new(ScriptedGenerator::new("long", ["[ab]", "a+"]));
    let store = Arc::new(RecordingStore::new());
    let orch = orchestrator(
        4,
        challenger.clone(),
        store.clone(),
        vec![g0.clone(), g1.clone()],
    );

    let run_id = orch.create_run("exactly one letter a").await.unwrap();
    let run = orch.run(&run_id, CancelSignal::never()).await.unwrap();

    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.rounds().len(), 2);
    assert!(run.draft.is_none());

    // Round 0: both score 50, shorter pattern wins the tie.
    let r0 = &run.rounds()[0];
    assert_eq!(r0.best_outcome().unwrap().candidate.pattern(), "a.");
    assert_eq!(r0.best_score(), Some(50));

    // Round 1: "a" is exact, "a+" lets "aa" through.
    let r1 = &run.rounds()[1];
    assert_eq!(r1.best_outcome().unwrap().candidate.pattern(), "a");
    assert_eq!(r1.outcomes[1].result.false_positives, vec!["aa"]);

    let report = run.report.as_ref().unwrap();
    assert_eq!(report.final_regex, "a");
    assert_eq!(report.score, 100);
    assert_eq!(report.round, 1);
    assert_eq!(report.final_test_suite, corpus(&["a"], &["b", "aa"]));

    assert_eq!(
        store.writes(),
        vec![
            RunStatus::GeneratingCorpus,
            RunStatus::GeneratingCandidates,
            RunStatus::Evaluating,
            RunStatus::Challenging,
            RunStatus::GeneratingCandidates,
            RunStatus::Evaluating,
            RunStatus::Finalizing,
            RunStatus::Completed,
        ]
    );
}

#[tokio::test]
async fn test_capabilities_receive_round_context() {
    let challenger = Arc::new(ScriptedChallenger::new(vec![
        corpus(&["1"], &["x"]),
        corpus(&["1", "22"], &["x"]),
    ]));
    let gen = Arc::new(ScriptedGenerator::new("digits", [".", "[0-9]+"]));
    let store = Arc::new(MemoryArenaStore::new());
    let orch = orchestrator(3, challenger.clone(), store, vec![gen.clone()]);

    let run_id = orch.create_run("digits").await.unwrap();
    orch.run(&run_id, CancelSignal::never()).await.unwrap();

    let challenges = challenger.calls();
    assert_eq!(challenges.len(), 2);
    assert!(challenges[0].corpus.is_empty());
    assert!(challenges[0].round_results.is_empty());
    assert_eq!(challenges[1].round_results.len(), 1);
    assert_eq!(challenges[1].corpus, corpus(&["1"], &["x"]));

    let requests = gen.calls();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].prior_feedback.is_none());
    let feedback = requests[1].prior_feedback.as_ref().unwrap();
    assert_eq!(feedback["round"], 0);
    assert_eq!(requests[1].corpus, corpus(&["1", "22"], &["x"]));
}

#[tokio::test]
async fn test_corpus_never_shrinks_and_stays_disjoint() {
    let challenger = Arc::new(ScriptedChallenger::new(vec![
        corpus(&["a"], &["b"]),
        corpus(&["a", "aa"], &["b"]),
        corpus(&["a", "aa"], &["b", "ab"]),
    ]));
    let gen = Arc::new(ScriptedGenerator::new("loose", ["."]));
    let store = Arc::new(MemoryArenaStore::new());
    let orch = orchestrator(3, challenger, store, vec![gen]);

    let run_id = orch.create_run("a's").await.unwrap();
    let run = orch.run(&run_id, CancelSignal::never()).await.unwrap();

    assert_eq!(run.status, RunStatus::Completed);
    let rounds = run.rounds();
    assert_eq!(rounds.len(), 3);
    for (i, round) in rounds.iter().enumerate() {
        assert_eq!(round.number as usize, i);
        assert!(round.corpus.overlap().is_empty());
        assert_eq!(round.corpus_digest, round.corpus.digest().unwrap());
        if i > 0 {
            assert!(round.corpus.len() >= rounds[i - 1].corpus.len());
        }
    }
}

#[tokio::test]
async fn test_best_is_chosen_across_all_rounds() {
    let challenger = Arc::new(ScriptedChallenger::new(vec![
        corpus(&["a"], &["b"]),
        corpus(&["a", "aa"], &["b", "ab"]),
    ]));
    let gen = Arc::new(ScriptedGenerator::new("g", ["[ab]", "a+b"]));
    let store = Arc::new(MemoryArenaStore::new());
    let orch = orchestrator(2, challenger, store, vec![gen]);

    let run_id = orch.create_run("a's").await.unwrap();
    let run = orch.run(&run_id, CancelSignal::never()).await.unwrap();

    assert_eq!(run.status, RunStatus::Completed);
    // round 0: "[ab]" 1/2 = 50; round 1: "a+b" 1/4 = 25
    let report = run.report.as_ref().unwrap();
    assert_eq!(report.final_regex, "[ab]");
    assert_eq!(report.score, 50);
    assert_eq!(report.round, 0);
    assert_eq!(report.rounds_played, 2);
}

#[tokio::test]
async fn test_all_generators_failing_fails_the_run() {
    let challenger = Arc::new(ScriptedChallenger::new(vec![corpus(&["a"], &["b"])]));
    let store = Arc::new(MemoryArenaStore::new());
    let orch = orchestrator(
        3,
        challenger,
        store.clone(),
        vec![
            Arc::new(FailingGenerator::new("one")),
            Arc::new(FailingGenerator::new("two")),
        ],
    );

    let run_id = orch.create_run("anything").await.unwrap();
    let run = orch.run(&run_id, CancelSignal::never()).await.unwrap();

    assert_eq!(run.status, RunStatus::Failed);
    let failure = run.failure.as_ref().unwrap();
    assert_eq!(failure.cause, FailureCause::GenerationExhausted);
    assert_eq!(failure.during, RunStatus::GeneratingCandidates);
    assert!(run.rounds().is_empty());

    let stored = store.get(&run_id).await.unwrap();
    let view = RunStatusView::from_run(&stored).unwrap();
    assert_eq!(view.status, RunStatus::Failed);
    assert!(!view.is_generating);
    assert!(!view.show_results);
    assert_eq!(view.rounds.len(), 1);
    assert!(view.rounds[0]
        .candidates
        .iter()
        .all(|c| c.status == arena_core::CandidateStatus::Failed));
}

#[tokio::test]
async fn test_partial_generator_failure_does_not_block_round() {
    let challenger = Arc::new(ScriptedChallenger::new(vec![corpus(&["a"], &["b"])]));
    let store = Arc::new(MemoryArenaStore::new());
    let orch = orchestrator(
        1,
        challenger,
        store,
        vec![
            Arc::new(FailingGenerator::new("broken")),
            Arc::new(ScriptedGenerator::new("ok", ["a"])),
        ],
    );

    let run_id = orch.create_run("single a").await.unwrap();
    let run = orch.run(&run_id, CancelSignal::never()).await.unwrap();

    assert_eq!(run.status, RunStatus::Completed);
    let round = &run.rounds()[0];
    assert_eq!(round.outcomes.len(), 1);
    assert_eq!(round.generation_failures.len(), 1);
    assert_eq!(round.generation_failures[0].generator.name, "broken");
}

#[tokio::test]
async fn test_shrinking_corpus_fails_and_keeps_history() {
    let challenger = Arc::new(ScriptedChallenger::new(vec![
        corpus(&["a", "aa"], &["b"]),
        corpus(&["a"], &["b"]),
    ]));
    let store = Arc::new(MemoryArenaStore::new());
    let orch = orchestrator(
        3,
        challenger,
        store,
        vec![Arc::new(ScriptedGenerator::new("g", ["a"]))],
    );

    let run_id = orch.create_run("a's").await.unwrap();
    let run = orch.run(&run_id, CancelSignal::never()).await.unwrap();

    assert_eq!(run.status, RunStatus::Failed);
    let failure = run.failure.as_ref().unwrap();
    assert_eq!(failure.cause, FailureCause::Corpus);
    assert_eq!(failure.during, RunStatus::Challenging);
    assert_eq!(run.rounds().len(), 1);
    assert!(run.report.is_none());
}

#[tokio::test]
async fn test_baseline_challenge_failure_fails_the_run() {
    let challenger = Arc::new(ScriptedChallenger::new(vec![corpus(&["a"], &["b"])]).fail_on(0));
    let store = Arc::new(MemoryArenaStore::new());
    let orch = orchestrator(
        3,
        challenger,
        store,
        vec![Arc::new(ScriptedGenerator::new("g", ["a"]))],
    );

    let run_id = orch.create_run("a").await.unwrap();
    let run = orch.run(&run_id, CancelSignal::never()).await.unwrap();

    assert_eq!(run.status, RunStatus::Failed);
    let failure = run.failure.as_ref().unwrap();
    assert_eq!(failure.cause, FailureCause::Corpus);
    assert_eq!(failure.during, RunStatus::GeneratingCorpus);
}

#[tokio::test]
async fn test_unresponsive_challenger_times_out() {
    let challenger = Arc::new(
        ScriptedChallenger::new(vec![corpus(&["a"], &["b"])])
            .with_delay(std::time::Duration::from_secs(30)),
    );
    let sandbox = Arc::new(LocalSandbox::new(SandboxConfig::default()).unwrap());
    let cfg = ArenaConfig {
        challenger_timeout_ms: 50,
        ..ArenaConfig::default()
    };
    let orch = Orchestrator::new(cfg, challenger, sandbox, Arc::new(MemoryArenaStore::new()))
        .unwrap()
        .with_generator(Arc::new(ScriptedGenerator::new("g", ["a"])));

    let run_id = orch.create_run("a").await.unwrap();
    let run = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        orch.run(&run_id, CancelSignal::never()),
    )
    .await
    .expect("challenger timeout should end the run")
    .unwrap();

    assert_eq!(run.status, RunStatus::Failed);
    let failure = run.failure.as_ref().unwrap();
    assert_eq!(failure.cause, FailureCause::Corpus);
    assert_eq!(failure.during, RunStatus::GeneratingCorpus);
    assert!(failure.message.contains("50ms"));
    assert!(run.rounds().is_empty());
}

#[tokio::test]
async fn test_no_usable_candidate_fails_the_run() {
    let challenger = Arc::new(ScriptedChallenger::new(vec![corpus(&["a"], &["b"])]));
    let store = Arc::new(MemoryArenaStore::new());
    let orch = orchestrator(
        1,
        challenger,
        store,
        vec![Arc::new(ScriptedGenerator::new("bad", ["(unclosed"]))],
    );

    let run_id = orch.create_run("a").await.unwrap();
    let run = orch.run(&run_id, CancelSignal::never()).await.unwrap();

    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(
        run.failure.as_ref().unwrap().cause,
        FailureCause::NoUsableCandidate
    );
    let outcome = &run.rounds()[0].outcomes[0];
    assert_eq!(outcome.result.failure_kind, FailureKind::CompileError);
    assert_eq!(outcome.result.score, 0);
}

#[tokio::test]
async fn test_run_cannot_be_driven_twice() {
    let challenger = Arc::new(ScriptedChallenger::new(vec![corpus(&["a"], &["b"])]));
    let store = Arc::new(MemoryArenaStore::new());
    let orch = orchestrator(
        1,
        challenger,
        store,
        vec![Arc::new(ScriptedGenerator::new("g", ["a"]))],
    );

    let run_id = orch.create_run("a").await.unwrap();
    orch.run(&run_id, CancelSignal::never()).await.unwrap();
    assert!(orch.run(&run_id, CancelSignal::never()).await.is_err());
}

#[tokio::test]
async fn test_concurrent_runs_are_independent() {
    let store: Arc<dyn ArenaStore> = Arc::new(MemoryArenaStore::new());
    let orch_a = Arc::new(orchestrator(
        1,
        Arc::new(ScriptedChallenger::new(vec![corpus(&["a"], &["b"])])),
        store.clone(),
        vec![Arc::new(ScriptedGenerator::new("g", ["a"]))],
    ));
    let orch_b = Arc::new(orchestrator(
        1,
        Arc::new(ScriptedChallenger::new(vec![corpus(&["x"], &["y"])])),
        store.clone(),
        vec![Arc::new(FailingGenerator::new("g"))],
    ));

    let id_a = orch_a.create_run("a").await.unwrap();
    let id_b = orch_b.create_run("x").await.unwrap();
    let (a, b) = tokio::join!(
        orch_a.start(id_a.clone()).wait(),
        orch_b.start(id_b.clone()).wait()
    );

    assert_eq!(a.unwrap().status, RunStatus::Completed);
    assert_eq!(b.unwrap().status, RunStatus::Failed);
    assert_eq!(store.list().await.unwrap().len(), 2);
}
