//! A full game driven through the public API with a scripted oracle.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use haigui::prelude::*;
use haigui::puzzle::parse_document;
use haigui::session;
use tokio::sync::Notify;

const CHOKE: &str = "### 汤面\nA man dies.\n### 汤底\nHe choked.";

/// Replies in order; optionally blocks each reply until notified.
struct ScriptedOracle {
    replies: Mutex<VecDeque<String>>,
    calls: AtomicUsize,
    hold: Option<Arc<Notify>>,
}

impl ScriptedOracle {
    fn new(replies: &[&str], hold: Option<Arc<Notify>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            calls: AtomicUsize::new(0),
            hold,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Oracle for ScriptedOracle {
    fn send<'a>(&'a self, _prompt: &'a OraclePrompt) -> OracleFuture<'a> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(hold) = &self.hold {
                hold.notified().await;
            }
            let next = self.replies.lock().unwrap().pop_front();
            next.ok_or_else(|| OracleError::Transport("no scripted reply left".into()))
        })
    }
}

fn puzzle_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("choke.md"), CHOKE).unwrap();
    dir
}

#[tokio::test]
async fn question_then_correct_resolution() {
    let parsed = parse_document(CHOKE).unwrap();
    assert_eq!(parsed.scenario, "A man dies.");
    assert_eq!(parsed.resolution, "He choked.");

    let dir = puzzle_dir();
    let store = Arc::new(MemoryStore::new());
    let oracle = ScriptedOracle::new(&["分析...{不是}", "...{完全正确}"], None);
    let game = Game::new(oracle.clone(), store.clone(), DirLibrary::new(dir.path()));
    game.start(Some("choke.md")).await.unwrap();

    let answered = game.submit("他是被杀的吗").await.unwrap();
    assert_eq!(answered.answer(), &Answer::Label(Label::No));
    assert_eq!(game.snapshot().clues, vec![Clue::new("他是被杀的吗", Label::No)]);

    let judged = game.submit("汤底：他吃东西的时候噎死了").await.unwrap();
    assert_eq!(judged.answer(), &Answer::Label(Label::FullyCorrect));
    assert_eq!(judged.disclosure(), Some("He choked."));
    assert_eq!(game.snapshot().clues.len(), 1);
    assert_eq!(oracle.calls(), 2);

    let saved = session::load(store.as_ref()).unwrap();
    assert_eq!(saved, game.snapshot());
}

#[tokio::test]
async fn submission_while_awaiting_oracle_is_rejected() {
    let dir = puzzle_dir();
    let hold = Arc::new(Notify::new());
    let oracle = ScriptedOracle::new(&["{是}"], Some(hold.clone()));
    let game = Arc::new(Game::new(
        oracle.clone(),
        MemoryStore::new(),
        DirLibrary::new(dir.path()),
    ));
    game.start(Some("choke.md")).await.unwrap();

    let in_flight = tokio::spawn({
        let game = game.clone();
        async move { game.submit("他是自杀的吗").await }
    });
    while oracle.calls() == 0 {
        tokio::task::yield_now().await;
    }

    let rejected = game.submit("他是被杀的吗").await;
    assert!(matches!(rejected, Err(GameError::Busy)));
    assert_eq!(oracle.calls(), 1);

    hold.notify_one();
    in_flight.await.unwrap().unwrap();
    assert_eq!(game.snapshot().clues.len(), 1);
    assert_eq!(game.state(), ControllerState::Idle);
}

#[tokio::test]
async fn saved_game_survives_restart_through_file_store() {
    let dir = puzzle_dir();
    let state = tempfile::tempdir().unwrap();
    let state_path = state.path().join("state.json");

    let first = Game::new(
        ScriptedOracle::new(&["嗯……我不确定"], None),
        FileStore::new(&state_path),
        DirLibrary::new(dir.path()),
    );
    first.start(Some("choke.md")).await.unwrap();
    first.submit("他在吃饭吗").await.unwrap();
    first.set_transcript("<div>他在吃饭吗 - 嗯……我不确定</div>");

    let second = Game::new(
        ScriptedOracle::new(&[], None),
        FileStore::new(&state_path),
        DirLibrary::new(dir.path()),
    );
    assert_eq!(second.start(None).await.unwrap(), Start::Restored);
    let restored = second.snapshot();
    assert_eq!(restored, first.snapshot());
    assert_eq!(
        restored.clues[0].answer,
        Answer::Unclassified("嗯……我不确定".into())
    );
}
