//! End-to-end runs of a media player machine through the public API.

use machina::builder::ConfigIssue;
use machina::runtime::{Diagnostic, DiagnosticKind, RecordingSink};
use machina::{
    states, Behavior, Description, DispatchError, Hooks, MessageDescriptor, MessageRegistry,
    Observer, StateMachineBuilder, Subscription,
};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Clone, PartialEq, Debug)]
enum Player {
    Idle,
    Playing { time: u32 },
    Paused { time: u32 },
}

#[derive(Default)]
struct HookCounts {
    enter: AtomicUsize,
    update: AtomicUsize,
    exit: AtomicUsize,
}

impl HookCounts {
    fn snapshot(&self) -> (usize, usize, usize) {
        (
            self.enter.load(Ordering::SeqCst),
            self.update.load(Ordering::SeqCst),
            self.exit.load(Ordering::SeqCst),
        )
    }
}

fn player(counts: &Arc<HookCounts>) -> Description<Player, (), u32> {
    let counts = Arc::clone(counts);
    StateMachineBuilder::new()
        .states(states!(Player {
            "idle" => Player::Idle,
            "playing" => Player::Playing { .. },
            "paused" => Player::Paused { .. },
        }))
        .with_initial_state(|_: ()| Player::Idle)
        .messages(
            MessageRegistry::new()
                .declare("play")
                .declare("pause")
                .declare("stop")
                .declare("seek"),
        )
        .behaviors([
            (
                "idle",
                Behavior::<Player, u32>::new().on("play", |_, _, _| Player::Playing { time: 0 }),
            ),
            (
                "playing",
                Behavior::new()
                    .on_enter(move |_, _: &Player| {
                        counts.enter.fetch_add(1, Ordering::SeqCst);
                        let update = Arc::clone(&counts);
                        let exit = Arc::clone(&counts);
                        Hooks::new()
                            .on_update(move |_: &Player, _: &Player| {
                                update.update.fetch_add(1, Ordering::SeqCst);
                            })
                            .on_exit(move |_: &Player| {
                                exit.exit.fetch_add(1, Ordering::SeqCst);
                            })
                    })
                    .on("play", |_, _, _| Player::Playing { time: 0 })
                    .on("seek", |_, _, time| Player::Playing { time })
                    .on("pause", |_, current, _| match current {
                        Player::Playing { time } => Player::Paused { time: *time },
                        other => other.clone(),
                    })
                    .on("stop", |_, _, _| Player::Idle),
            ),
            (
                "paused",
                Behavior::new()
                    .on("play", |_, _, _| Player::Playing { time: 0 })
                    .on("stop", |_, _, _| Player::Idle),
            ),
        ])
        .unwrap()
}

#[test]
fn play_seek_pause_play_restarts_from_zero() {
    let player = player(&Arc::default()).instantiate(()).unwrap();

    player.send("play", 0).unwrap();
    player.send("seek", 1).unwrap();
    player.send("seek", 2).unwrap();
    player.send("pause", 0).unwrap();
    assert_eq!(player.value(), Player::Paused { time: 2 });

    player.send("play", 0).unwrap();
    assert_eq!(player.value(), Player::Playing { time: 0 });
}

#[test]
fn hook_counts_follow_entry_identity() {
    let counts = Arc::new(HookCounts::default());
    let player = player(&counts).instantiate(()).unwrap();
    assert_eq!(counts.snapshot(), (0, 0, 0));

    player.send("play", 0).unwrap();
    assert_eq!(counts.snapshot(), (1, 0, 0));

    player.send("play", 0).unwrap();
    assert_eq!(counts.snapshot(), (1, 1, 0));

    player.send("pause", 0).unwrap();
    assert_eq!(counts.snapshot(), (1, 1, 1));
}

#[test]
fn senders_are_the_named_accessors() {
    let player = player(&Arc::default()).instantiate(()).unwrap();
    let play = player.sender("play").unwrap();
    let seek = player.sender("seek").unwrap();

    play.send(0).unwrap();
    seek.send(42).unwrap();

    assert_eq!(player.value(), Player::Playing { time: 42 });
    assert_eq!(player.state(), Some("playing"));
}

#[test]
fn unhandled_message_is_reported_not_raised() {
    let counts = Arc::new(HookCounts::default());
    let sink = Arc::new(RecordingSink::new());
    let player = player(&counts)
        .with_diagnostics(sink.clone())
        .instantiate(())
        .unwrap();

    assert_eq!(player.send("seek", 9), Ok(()));

    assert_eq!(player.value(), Player::Idle);
    assert_eq!(counts.snapshot(), (0, 0, 0));
    assert_eq!(
        sink.unhandled(),
        vec![("idle".to_string(), "seek".to_string())]
    );
    assert!(sink.faults().is_empty());
}

#[test]
fn message_from_another_description_is_rejected() {
    let sink = Arc::new(RecordingSink::new());
    let player = player(&Arc::default())
        .with_diagnostics(sink.clone())
        .instantiate(())
        .unwrap();
    let stray = MessageDescriptor::create();

    let error = player.dispatch(stray.stamp(0)).unwrap_err();

    assert_eq!(error, DispatchError::UnknownMessage { id: stray.id() });
    assert_eq!(player.value(), Player::Idle);
    assert_eq!(sink.faults(), vec![error.to_string()]);
}

#[test]
fn diagnostics_serialize_with_kind_tag() {
    let sink = Arc::new(RecordingSink::new());
    let player = player(&Arc::default())
        .with_diagnostics(sink.clone())
        .instantiate(())
        .unwrap();
    player.send("pause", 0).unwrap();

    let record = sink.records().remove(0);
    let json = serde_json::to_value(&record).unwrap();

    assert_eq!(json["kind"], "unhandled");
    assert_eq!(json["state"], "idle");
    assert_eq!(json["message"], "pause");
    assert_eq!(json["instance"], player.id().to_string());

    let back: Diagnostic = serde_json::from_value(json).unwrap();
    assert_eq!(back.kind, record.kind);
    assert!(matches!(back.kind, DiagnosticKind::Unhandled { .. }));
}

#[test]
fn partial_behavior_table_is_a_configuration_error() {
    let result = StateMachineBuilder::new()
        .states(states!(Player {
            "idle" => Player::Idle,
            "playing" => Player::Playing { .. },
            "paused" => Player::Paused { .. },
        }))
        .with_initial_state(|_: ()| Player::Idle)
        .messages(MessageRegistry::new().declare("play"))
        .behaviors([
            ("idle", Behavior::<Player, ()>::new()),
            ("playing", Behavior::new()),
        ]);

    let error = result.unwrap_err();
    assert_eq!(
        error.issues(),
        &[ConfigIssue::MissingBehavior {
            state: "paused".to_string()
        }]
    );
    assert!(error.to_string().contains("paused"));
}

type Timeline = Rc<RefCell<Vec<Player>>>;

fn timeline(observer: Observer<Player>) -> (Timeline, Subscription<Player>) {
    let seen = Timeline::default();
    let sink = Rc::clone(&seen);
    let subscription = observer.subscribe(move |value: &Player| sink.borrow_mut().push(value.clone()));
    (seen, subscription)
}

#[test]
fn observable_instances_broadcast_independently() {
    let description = player(&Arc::default()).observable(timeline);
    let first = description.instantiate(()).unwrap();
    let second = description.instantiate(()).unwrap();

    first.send("play", 0).unwrap();
    first.send("seek", 3).unwrap();
    second.send("play", 0).unwrap();

    let (first_seen, _) = first.as_observable();
    let (second_seen, _) = second.as_observable();
    assert_eq!(
        *first_seen.borrow(),
        vec![
            Player::Idle,
            Player::Playing { time: 0 },
            Player::Playing { time: 3 },
        ]
    );
    assert_eq!(
        *second_seen.borrow(),
        vec![Player::Idle, Player::Playing { time: 0 }]
    );
}

#[test]
fn dropping_subscription_stops_delivery() {
    let machine = player(&Arc::default())
        .observable(timeline)
        .instantiate(())
        .unwrap();
    let (player, (seen, subscription)) = machine.into_parts();

    player.send("play", 0).unwrap();
    subscription.unsubscribe();
    player.send("pause", 0).unwrap();

    assert_eq!(
        *seen.borrow(),
        vec![Player::Idle, Player::Playing { time: 0 }]
    );
    assert_eq!(player.value(), Player::Paused { time: 0 });
}

#[test]
fn observer_sends_run_after_the_commit_that_triggered_them() {
    let description = player(&Arc::default()).observable(|observer: Observer<Player>| observer);
    let machine = description.instantiate(()).unwrap();
    let weak = machine.downgrade();
    let subscription = machine.as_observable().subscribe(move |value: &Player| {
        if let Player::Playing { time: 0 } = value {
            weak.send("seek", 10).unwrap();
        }
    });

    machine.send("play", 0).unwrap();

    assert_eq!(machine.value(), Player::Playing { time: 10 });
    drop(subscription);
}
