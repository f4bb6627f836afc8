use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fanvisor::{
    Dispatcher, DispatcherConfig, Event, EventKind, RuntimeError, Subscribe, SubmitError, Task,
    TaskContext, TaskError, BoxTaskFuture,
};
use rand::Rng;
use tokio::time;

/// Tracks how many tasks run at once.
#[derive(Default)]
struct Gauge {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl Gauge {
    fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn never_exceeds_ceiling() {
    let d = Dispatcher::new(DispatcherConfig::with_limit(3)).unwrap();
    let gauge = Arc::new(Gauge::default());

    let handles: Vec<_> = (0..20)
        .map(|i| {
            let gauge = Arc::clone(&gauge);
            let latency = rand::rng().random_range(5..30);
            d.submit(move |_ctx| async move {
                gauge.enter();
                time::sleep(Duration::from_millis(latency)).await;
                gauge.exit();
                Ok::<_, TaskError>(i)
            })
            .unwrap()
        })
        .collect();

    for (i, h) in handles.into_iter().enumerate() {
        assert_eq!(h.await, Ok(i));
    }
    d.close().await;

    let peak = gauge.peak.load(Ordering::SeqCst);
    assert!(peak <= 3, "peak concurrency {peak} exceeded ceiling");
    assert_eq!(d.available_permits(), 3);
    assert_eq!(d.in_flight(), 0);
}

#[tokio::test(flavor = "current_thread")]
async fn starts_in_submission_order() {
    let d = Dispatcher::new(DispatcherConfig::with_limit(3)).unwrap();
    let started = Arc::new(Mutex::new(Vec::new()));

    let handles: Vec<_> = (0..20u64)
        .map(|i| {
            let started = Arc::clone(&started);
            d.submit(move |ctx: TaskContext| async move {
                started.lock().unwrap().push(i);
                assert_eq!(ctx.ordinal(), i);
                time::sleep(Duration::from_millis(20 - i)).await;
                Ok::<_, TaskError>(())
            })
            .unwrap()
        })
        .collect();

    for h in handles {
        h.await.unwrap();
    }
    assert_eq!(*started.lock().unwrap(), (0..20).collect::<Vec<u64>>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn many_concurrent_submitters_share_one_ceiling() {
    const SUBMITTERS: usize = 8;
    const PER_SUBMITTER: usize = 2_000;

    let d = Dispatcher::new(DispatcherConfig::with_limit(3)).unwrap();
    let gauge = Arc::new(Gauge::default());
    let out_of_order = Arc::new(AtomicUsize::new(0));

    let submitters: Vec<_> = (0..SUBMITTERS)
        .map(|_| {
            let d = d.clone();
            let gauge = Arc::clone(&gauge);
            let out_of_order = Arc::clone(&out_of_order);
            tokio::spawn(async move {
                (0..PER_SUBMITTER)
                    .map(|_| {
                        let gauge = Arc::clone(&gauge);
                        let out_of_order = Arc::clone(&out_of_order);
                        d.submit(move |ctx: TaskContext| async move {
                            gauge.enter();
                            if ctx.seq() != ctx.ordinal() {
                                out_of_order.fetch_add(1, Ordering::SeqCst);
                            }
                            tokio::task::yield_now().await;
                            gauge.exit();
                            Ok::<_, TaskError>(())
                        })
                        .unwrap()
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut handles = Vec::with_capacity(SUBMITTERS * PER_SUBMITTER);
    for s in submitters {
        handles.extend(s.await.unwrap());
    }
    time::timeout(Duration::from_secs(30), d.close()).await.unwrap();

    assert_eq!(d.queued(), 0);
    assert_eq!(d.in_flight(), 0);
    assert_eq!(d.available_permits(), 3);
    for h in handles {
        assert_eq!(h.await, Ok(()));
    }
    assert_eq!(out_of_order.load(Ordering::SeqCst), 0);
    let peak = gauge.peak.load(Ordering::SeqCst);
    assert!(peak <= 3, "peak concurrency {peak} exceeded ceiling");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn failures_and_panics_keep_the_queue_moving() {
    let d = Dispatcher::new(DispatcherConfig::with_limit(2)).unwrap();

    let handles: Vec<_> = (0..12u32)
        .map(|i| {
            d.submit(move |_ctx| async move {
                match i % 3 {
                    0 => Err(TaskError::fail(format!("item {i} rejected"))),
                    1 => {
                        if i > 0 {
                            panic!("item {i} exploded");
                        }
                        Ok(i)
                    }
                    _ => Ok(i),
                }
            })
            .unwrap()
        })
        .collect();

    let mut ok = 0;
    let mut failed = 0;
    let mut panicked = 0;
    for h in handles {
        match h.await {
            Ok(_) => ok += 1,
            Err(TaskError::Fail { .. }) => failed += 1,
            Err(TaskError::Panicked { info }) => {
                assert!(info.contains("exploded"));
                panicked += 1;
            }
            Err(other) => panic!("unexpected error {other:?}"),
        }
    }
    assert_eq!((ok, failed, panicked), (4, 4, 4));

    time::timeout(Duration::from_secs(1), d.close()).await.unwrap();
    assert_eq!(d.available_permits(), 2);
}

#[tokio::test]
async fn close_waits_for_queued_work() {
    let d = Dispatcher::new(DispatcherConfig::with_limit(1)).unwrap();
    let done = Arc::new(AtomicUsize::new(0));

    for _ in 0..5 {
        let done = Arc::clone(&done);
        let _ = d
            .submit(move |_ctx| async move {
                time::sleep(Duration::from_millis(5)).await;
                done.fetch_add(1, Ordering::SeqCst);
                Ok::<_, TaskError>(())
            })
            .unwrap();
    }

    d.close().await;
    assert_eq!(done.load(Ordering::SeqCst), 5);
    assert_eq!(d.queued(), 0);
    assert_eq!(
        d.submit(|_ctx| async { Ok::<_, TaskError>(()) }).err(),
        Some(SubmitError::Closed)
    );
}

#[tokio::test]
async fn close_with_no_tasks_returns_promptly() {
    let d = Dispatcher::new(DispatcherConfig::with_limit(4)).unwrap();
    time::timeout(Duration::from_millis(100), d.close())
        .await
        .expect("close on an idle dispatcher must not hang");
}

#[tokio::test(start_paused = true)]
async fn grace_expiry_reports_stuck_and_cancels_queue() {
    let d = Dispatcher::new(DispatcherConfig::with_limit(1)).unwrap();

    let stuck = d
        .submit_named("stuck", |ctx: TaskContext| async move {
            ctx.cancelled().await;
            Err::<(), _>(TaskError::Canceled)
        })
        .unwrap();
    let queued = d
        .submit_named("never-started", |_ctx| async { Ok::<_, TaskError>(()) })
        .unwrap();

    let err = d
        .close_with_grace(Duration::from_millis(200))
        .await
        .unwrap_err();
    match err {
        RuntimeError::GraceExceeded { grace, stuck } => {
            assert_eq!(grace, Duration::from_millis(200));
            assert_eq!(stuck, vec!["stuck".to_string()]);
        }
        other => panic!("unexpected error {other:?}"),
    }

    assert_eq!(stuck.await, Err(TaskError::Canceled));
    assert_eq!(queued.await, Err(TaskError::Canceled));
}

#[tokio::test]
async fn shutdown_within_grace_is_ok() {
    let d = Dispatcher::new(DispatcherConfig {
        grace: Duration::from_secs(5),
        ..DispatcherConfig::with_limit(2)
    })
    .unwrap();
    let h = d.submit(|_ctx| async { Ok::<_, TaskError>("done") }).unwrap();
    d.shutdown().await.unwrap();
    assert_eq!(h.await, Ok("done"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn map_ordered_keeps_input_order() {
    let d = Dispatcher::new(DispatcherConfig::with_limit(3)).unwrap();
    let gauge = Arc::new(Gauge::default());
    let g = Arc::clone(&gauge);

    let results = d
        .map_ordered(1..=50u64, move |id| {
            let g = Arc::clone(&g);
            async move {
                g.enter();
                time::sleep(Duration::from_millis(50 - id)).await;
                g.exit();
                if id == 13 {
                    Err(TaskError::fail("unlucky"))
                } else {
                    Ok(format!("product-{id}"))
                }
            }
        })
        .await
        .unwrap();

    assert_eq!(results.len(), 50);
    for (id, res) in (1..=50u64).zip(&results) {
        if id == 13 {
            assert_eq!(res, &Err(TaskError::fail("unlucky")));
        } else {
            assert_eq!(res, &Ok(format!("product-{id}")));
        }
    }
    assert!(gauge.peak.load(Ordering::SeqCst) <= 3);
}

#[test]
fn sync_callers_can_submit_and_block() {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap();
    let d = rt.block_on(async { Dispatcher::new(DispatcherConfig::with_limit(2)) }).unwrap();

    let h = d.submit(|_ctx| async { Ok::<_, TaskError>(21 * 2) }).unwrap();
    assert_eq!(h.wait_blocking(), Ok(42));
    rt.block_on(d.close());
}

struct Double(u32);

impl Task for Double {
    type Output = u32;

    fn name(&self) -> &str {
        "double"
    }

    fn spawn(self, _ctx: TaskContext) -> BoxTaskFuture<u32> {
        Box::pin(async move { Ok(self.0 * 2) })
    }
}

#[tokio::test]
async fn custom_task_types_are_accepted() {
    let d = Dispatcher::new(DispatcherConfig::with_limit(1)).unwrap();
    let h = d.submit_task(Double(4)).unwrap();
    assert_eq!(h.name(), "double");
    assert_eq!(h.await, Ok(8));
}

#[derive(Default)]
struct Recorder(Mutex<Vec<(EventKind, Option<String>)>>);

#[async_trait::async_trait]
impl Subscribe for Recorder {
    async fn on_event(&self, ev: &Event) {
        self.0
            .lock()
            .unwrap()
            .push((ev.kind, ev.task.as_deref().map(str::to_string)));
    }
}

#[tokio::test]
async fn subscribers_see_task_lifecycle() {
    let rec = Arc::new(Recorder::default());
    let d = Dispatcher::builder(DispatcherConfig::with_limit(1))
        .with_subscribers(vec![rec.clone()])
        .build()
        .unwrap();

    let ok = d.submit_named("ok", |_ctx| async { Ok::<_, TaskError>(()) }).unwrap();
    let bad = d
        .submit_named("bad", |_ctx| async { Err::<(), _>(TaskError::fail("nope")) })
        .unwrap();
    ok.await.unwrap();
    bad.await.unwrap_err();
    d.close().await;

    // Subscriber delivery is asynchronous.
    time::sleep(Duration::from_millis(50)).await;
    let seen = rec.0.lock().unwrap().clone();
    let of = |name: &str| -> Vec<EventKind> {
        seen.iter()
            .filter(|(_, task)| task.as_deref() == Some(name))
            .map(|(kind, _)| *kind)
            .collect()
    };
    assert_eq!(
        of("ok"),
        vec![EventKind::TaskQueued, EventKind::TaskStarting, EventKind::TaskStopped]
    );
    assert_eq!(
        of("bad"),
        vec![EventKind::TaskQueued, EventKind::TaskStarting, EventKind::TaskFailed]
    );
    assert!(seen.iter().any(|(kind, _)| *kind == EventKind::CloseRequested));
}
