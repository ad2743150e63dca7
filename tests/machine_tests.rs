//! End-to-end machine behavior: nesting, regions, fork/join, callbacks,
//! re-entrancy and serialization.

use mindtree::{event_enum, state_enum, Event, Machine, State, TransitionBuilder};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

state_enum! {
    enum Media {
        Idle,
        Running,
        Audio,
        Video,
        AudioPlaying,
        AudioMuted,
        VideoPlaying,
    }
}

event_enum! {
    enum Control {
        Start,
        Stop,
        MuteAudio,
    }
}

state_enum! {
    enum Phase {
        Solid,
        Soft,
        Hard,
        Liquid,
    }
}

event_enum! {
    enum Change {
        Melted,
        Hardened,
        Frozen,
        Stepped,
    }
}

type Observed = Arc<Mutex<Vec<(String, String, String)>>>;

/// Idle forks into a concurrent Running state; muting audio moves only the
/// audio region, and a join on (AudioMuted, VideoPlaying) leads back out.
fn media_machine(observed: Observed, effects: Arc<AtomicUsize>) -> Machine<Media, Control> {
    Machine::create(
        |b| {
            b.initial(Media::Idle)
                .observe(move |from: &Media, event: &Control, to: &Media| {
                    observed.lock().unwrap().push((
                        from.name().to_string(),
                        event.name().to_string(),
                        to.name().to_string(),
                    ));
                })
                .state(Media::Idle, |s| {
                    let effects = effects.clone();
                    s.transition(
                        TransitionBuilder::new()
                            .on(Control::Start)
                            .fork([Media::Audio, Media::Video])
                            .effect(move |_e| {
                                let effects = effects.clone();
                                Box::pin(async move {
                                    effects.fetch_add(1, Ordering::SeqCst);
                                })
                            }),
                    );
                })
                .state(Media::Running, |s| {
                    s.concurrent(Media::Audio, |a| {
                        a.nested(Media::AudioPlaying, |p| {
                            p.on(Control::MuteAudio, Media::AudioMuted);
                        });
                        a.nested(Media::AudioMuted, |m| {
                            m.on_join(Control::Stop, Media::Idle);
                        });
                    });
                    s.concurrent(Media::Video, |v| {
                        v.nested(Media::VideoPlaying, |p| {
                            p.on_join(Control::Stop, Media::Idle);
                        });
                    });
                })
        },
        false,
    )
    .unwrap()
}

fn observed() -> Observed {
    Arc::new(Mutex::new(Vec::new()))
}

#[tokio::test]
async fn ancestor_fallback_exits_leaf_first() {
    let log: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

    let solid_exit = log.clone();
    let soft_exit = log.clone();
    let liquid_enter = log.clone();
    let machine = Machine::create(
        |b| {
            b.initial(Phase::Soft)
                .state(Phase::Solid, |s| {
                    s.on(Change::Melted, Phase::Liquid);
                    let solid_exit = solid_exit.clone();
                    s.on_exit(move |to: &Phase, _e: &Change| {
                        let log = solid_exit.clone();
                        let to = to.name().to_string();
                        Box::pin(async move {
                            log.lock().unwrap().push(format!("exit:Solid->{to}"));
                        })
                    });
                    let soft_exit = soft_exit.clone();
                    s.nested(Phase::Soft, |soft| {
                        soft.on(Change::Hardened, Phase::Hard);
                        soft.on_exit(move |to: &Phase, _e: &Change| {
                            let log = soft_exit.clone();
                            let to = to.name().to_string();
                            Box::pin(async move {
                                log.lock().unwrap().push(format!("exit:Soft->{to}"));
                            })
                        });
                    });
                    s.nested(Phase::Hard, |_| {});
                })
                .state(Phase::Liquid, |l| {
                    let liquid_enter = liquid_enter.clone();
                    l.on_enter(move |from: &Phase, _e: &Change| {
                        let log = liquid_enter.clone();
                        let from = from.name().to_string();
                        Box::pin(async move {
                            log.lock().unwrap().push(format!("enter:Liquid<-{from}"));
                        })
                    });
                })
        },
        false,
    )
    .unwrap();

    assert!(machine.is_in(&Phase::Soft));
    assert!(machine.is_in(&Phase::Solid));

    // Soft has no Melted transition of its own; the parent's fires.
    machine.apply(Change::Melted).await.unwrap();

    assert!(machine.is_in(&Phase::Liquid));
    assert!(!machine.is_in(&Phase::Solid));
    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "exit:Soft->Liquid".to_string(),
            "exit:Solid->Liquid".to_string(),
            "enter:Liquid<-Solid".to_string(),
        ]
    );
}

#[tokio::test]
async fn fork_enters_every_region_with_one_effect() {
    let seen = observed();
    let effects = Arc::new(AtomicUsize::new(0));
    let machine = media_machine(seen.clone(), effects.clone());

    let mind = machine.apply(Control::Start).await.unwrap();

    assert_eq!(mind.paths().len(), 2);
    assert!(machine.is_in(&Media::Running));
    assert!(machine.is_in(&Media::AudioPlaying));
    assert!(machine.is_in(&Media::VideoPlaying));
    assert_eq!(effects.load(Ordering::SeqCst), 1);

    let notifications = seen.lock().unwrap().clone();
    assert_eq!(
        notifications,
        vec![
            (
                "Idle".to_string(),
                "Start".to_string(),
                "Audio".to_string()
            ),
            (
                "Idle".to_string(),
                "Start".to_string(),
                "Video".to_string()
            ),
        ]
    );
}

#[tokio::test]
async fn events_touch_only_their_region() {
    let machine = media_machine(observed(), Arc::new(AtomicUsize::new(0)));
    machine.apply(Control::Start).await.unwrap();

    let mind = machine.apply(Control::MuteAudio).await.unwrap();

    assert_eq!(mind.paths().len(), 2);
    assert!(machine.is_in(&Media::AudioMuted));
    assert!(!machine.is_in(&Media::AudioPlaying));
    // The video region never saw the event.
    assert!(machine.is_in(&Media::VideoPlaying));
}

#[tokio::test]
async fn join_waits_for_every_region() {
    let machine = media_machine(observed(), Arc::new(AtomicUsize::new(0)));
    machine.apply(Control::Start).await.unwrap();

    // Audio still sits on AudioPlaying, so the join is not ready yet.
    let before = machine.state_of_mind();
    let after = machine.apply(Control::Stop).await.unwrap();
    assert_eq!(before, after);
    assert!(machine.is_in(&Media::Running));

    machine.apply(Control::MuteAudio).await.unwrap();
    let mind = machine.apply(Control::Stop).await.unwrap();

    assert_eq!(mind.paths().len(), 1);
    assert!(machine.is_in(&Media::Idle));
    assert!(!machine.is_in(&Media::Running));
}

#[tokio::test]
async fn exit_and_enter_callbacks_pair_up() {
    let log: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

    let solid_log = log.clone();
    let liquid_log = log.clone();
    let machine = Machine::create(
        |b| {
            b.initial(Phase::Solid)
                .state(Phase::Solid, |s| {
                    s.on(Change::Melted, Phase::Liquid);
                    let enter = solid_log.clone();
                    s.on_enter(move |_from: &Phase, _e: &Change| {
                        let log = enter.clone();
                        Box::pin(async move {
                            log.lock().unwrap().push("enter:Solid".to_string());
                        })
                    });
                    let exit = solid_log.clone();
                    s.on_exit(move |_to: &Phase, _e: &Change| {
                        let log = exit.clone();
                        Box::pin(async move {
                            log.lock().unwrap().push("exit:Solid".to_string());
                        })
                    });
                })
                .state(Phase::Liquid, |l| {
                    l.on(Change::Frozen, Phase::Solid);
                    let enter = liquid_log.clone();
                    l.on_enter(move |_from: &Phase, _e: &Change| {
                        let log = enter.clone();
                        Box::pin(async move {
                            log.lock().unwrap().push("enter:Liquid".to_string());
                        })
                    });
                    let exit = liquid_log.clone();
                    l.on_exit(move |_to: &Phase, _e: &Change| {
                        let log = exit.clone();
                        Box::pin(async move {
                            log.lock().unwrap().push("exit:Liquid".to_string());
                        })
                    });
                })
        },
        false,
    )
    .unwrap();

    machine.apply(Change::Melted).await.unwrap();
    machine.apply(Change::Frozen).await.unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "exit:Solid".to_string(),
            "enter:Liquid".to_string(),
            "exit:Liquid".to_string(),
            "enter:Solid".to_string(),
        ]
    );
}

#[tokio::test]
async fn reentrant_submissions_run_after_the_current_transition() {
    let cell: Arc<OnceLock<Machine<Phase, Change>>> = Arc::new(OnceLock::new());

    let effect_cell = cell.clone();
    let machine = Machine::create(
        |b| {
            b.initial(Phase::Solid)
                .state(Phase::Solid, |s| {
                    let effect_cell = effect_cell.clone();
                    s.transition(
                        TransitionBuilder::new()
                            .on(Change::Melted)
                            .to(Phase::Liquid)
                            .effect(move |_e| {
                                let cell = effect_cell.clone();
                                Box::pin(async move {
                                    // Fire-and-forget: awaiting the handle
                                    // here would wait on our own event.
                                    if let Some(machine) = cell.get() {
                                        drop(machine.apply(Change::Frozen));
                                    }
                                })
                            }),
                    );
                })
                .state(Phase::Liquid, |l| {
                    l.on(Change::Frozen, Phase::Solid);
                })
        },
        false,
    )
    .unwrap();
    let _ = cell.set(machine.clone());

    let mut updates = machine.subscribe();
    let mind = machine.apply(Change::Melted).await.unwrap();

    // The outer event resolves before the re-entrant one runs.
    assert!(mind.contains(&Phase::Liquid));

    let first = updates.recv().await.unwrap();
    assert!(first.contains(&Phase::Liquid));
    let second = updates.recv().await.unwrap();
    assert!(second.contains(&Phase::Solid));
    assert!(machine.is_in(&Phase::Solid));
}

#[tokio::test]
async fn concurrent_submissions_serialize_in_order() {
    let machine = Machine::create(
        |b| {
            b.initial(Phase::Solid)
                .state(Phase::Solid, |s| {
                    s.on(Change::Stepped, Phase::Liquid);
                })
                .state(Phase::Liquid, |s| {
                    s.on(Change::Stepped, Phase::Hard);
                })
                .state(Phase::Hard, |s| {
                    s.on(Change::Stepped, Phase::Solid);
                })
        },
        false,
    )
    .unwrap();

    let tasks: Vec<_> = (0..3)
        .map(|_| {
            let machine = machine.clone();
            tokio::spawn(async move {
                machine.apply(Change::Stepped).await.unwrap();
                machine.apply(Change::Stepped).await.unwrap();
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    // Six steps around a three-state cycle land back at the start, and
    // every step was dispatched exactly once.
    assert!(machine.is_in(&Phase::Solid));
    assert_eq!(machine.history().len(), 6);
}

#[tokio::test]
async fn subscribers_see_every_configuration() {
    let machine = media_machine(observed(), Arc::new(AtomicUsize::new(0)));
    let mut updates = machine.subscribe();

    machine.apply(Control::Start).await.unwrap();
    machine.apply(Control::MuteAudio).await.unwrap();

    let first = updates.recv().await.unwrap();
    assert!(first.contains(&Media::AudioPlaying));
    let second = updates.recv().await.unwrap();
    assert!(second.contains(&Media::AudioMuted));
}
