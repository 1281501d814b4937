use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future;
use velostore::{from_fn, CancelId, Effect, Reducer, SharedScheduler, Store, TestScheduler};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Animation;

#[derive(Debug, Clone, PartialEq)]
enum Action {
    Note(&'static str),
    Animate,
    Finish,
    Done,
    AnimateThenStop,
    PingWhileWaiting,
    Stop,
    Sequence,
    Race,
    Kick,
    Slow,
}

fn later(clock: &SharedScheduler, ms: u64, note: &'static str) -> Effect<Action> {
    let clock = Arc::clone(clock);
    Effect::future(async move {
        clock.sleep(Duration::from_millis(ms)).await;
        Action::Note(note)
    })
}

fn timeline(
) -> impl Reducer<State = Vec<&'static str>, Action = Action, Environment = SharedScheduler> {
    from_fn(|log: &mut Vec<&'static str>, action: Action, clock: &SharedScheduler| match action {
        Action::Note(note) => {
            log.push(note);
            Effect::none()
        }
        Action::Animate => {
            log.push("animate");
            Effect::future(future::pending()).cancellable(Animation)
        }
        Action::Finish => {
            Effect::concatenate([Effect::cancel(Animation), Effect::send(Action::Done)])
        }
        // Completion starts the idle animation again.
        Action::Done => {
            log.push("done");
            Effect::future(future::pending()).cancellable(Animation)
        }
        Action::AnimateThenStop => {
            Effect::concatenate([Effect::send(Action::Animate), Effect::cancel(Animation)])
        }
        Action::PingWhileWaiting => Effect::merge([
            Effect::send(Action::Note("ping")),
            Effect::future(future::pending()),
        ])
        .cancellable(Animation),
        Action::Stop => Effect::cancel(Animation),
        Action::Sequence => Effect::concatenate([
            later(clock, 10, "first"),
            Effect::send(Action::Note("second")),
        ]),
        Action::Race => Effect::merge([later(clock, 30, "slow"), later(clock, 10, "fast")]),
        Action::Kick | Action::Slow => Effect::none(),
    })
}

#[tokio::test]
async fn sends_inside_a_cancellable_merge_are_reduced_before_send_returns() {
    let clock = TestScheduler::new();
    let store = Store::new(Vec::new(), timeline(), clock.shared());

    store.send(Action::PingWhileWaiting);

    assert_eq!(store.state(), vec!["ping"]);
    assert_eq!(store.pending_actions(), 0);
    assert!(store.cancellations().is_registered(&CancelId::new(Animation)));

    store.send(Action::Stop);
    store.wait_for_effects().await;
    assert!(store.cancellations().is_empty());
}

#[tokio::test]
async fn concatenate_reduces_async_output_before_the_next_member() {
    let clock = TestScheduler::new();
    let store = Store::new(Vec::new(), timeline(), clock.shared());

    store.send(Action::Sequence);
    assert!(store.state().is_empty());

    clock.advance(Duration::from_millis(10)).await;
    store.wait_for_effects().await;

    assert_eq!(store.state(), vec!["first", "second"]);
}

#[tokio::test]
async fn cancel_then_send_runs_in_declared_order() {
    let clock = TestScheduler::new();
    let store = Store::new(Vec::new(), timeline(), clock.shared());
    store.send(Action::Animate);

    store.send(Action::Finish);

    assert_eq!(store.state(), vec!["animate", "done"]);
    assert!(store.cancellations().is_registered(&CancelId::new(Animation)));
    assert_eq!(store.cancellations().len(), 1);

    store.send(Action::Stop);
    store.wait_for_effects().await;
}

#[tokio::test]
async fn send_then_cancel_runs_in_declared_order() {
    let clock = TestScheduler::new();
    let store = Store::new(Vec::new(), timeline(), clock.shared());

    store.send(Action::AnimateThenStop);

    assert_eq!(store.state(), vec!["animate"]);
    assert!(!store.cancellations().is_registered(&CancelId::new(Animation)));
    store.wait_for_effects().await;
    assert_eq!(store.effects_in_flight(), 0);
}

#[tokio::test]
async fn merge_forwards_each_child_as_it_finishes() {
    let clock = TestScheduler::new();
    let store = Store::new(Vec::new(), timeline(), clock.shared());

    store.send(Action::Race);
    clock.advance(Duration::from_millis(10)).await;
    assert_eq!(store.state(), vec!["fast"]);
    assert_eq!(store.effects_in_flight(), 1);

    clock.advance(Duration::from_millis(20)).await;
    store.wait_for_effects().await;
    assert_eq!(store.state(), vec!["fast", "slow"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn send_waits_for_a_drain_running_on_another_thread() {
    let started = Arc::new(AtomicBool::new(false));
    let reducer = from_fn(
        |log: &mut Vec<&'static str>, action: Action, started: &Arc<AtomicBool>| match action {
            Action::Kick => Effect::future(async { Action::Slow }),
            Action::Slow => {
                started.store(true, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(200));
                log.push("slow");
                Effect::none()
            }
            Action::Note(note) => {
                log.push(note);
                Effect::none()
            }
            _ => Effect::none(),
        },
    );
    let store = Store::new(Vec::new(), reducer, Arc::clone(&started));

    store.send(Action::Kick);
    while !started.load(Ordering::SeqCst) {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    let sender = store.clone();
    let (pending, log) = tokio::task::spawn_blocking(move || {
        sender.send(Action::Note("inc"));
        (sender.pending_actions(), sender.state())
    })
    .await
    .unwrap();

    assert_eq!(pending, 0);
    assert_eq!(log, vec!["slow", "inc"]);
    store.wait_for_effects().await;
}
