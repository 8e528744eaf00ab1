use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use ticketvisor::{
    CallbackConfig, CallbackError, CallbackEvent, CallbackMessage, CallbackTarget, Controller,
    ControllerConfig, ControllerError, Event, EventKind, Level, LogRecord, LogSink, Logged,
    Params, RuntimeError, SinkInit, Subscribe, TaskError, TaskFn, TaskRef, TicketService,
    TicketState, WorkerContext,
};

/// Polls `check` until it holds or five seconds pass.
async fn eventually<F, Fut>(what: &str, mut check: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !check().await {
        assert!(tokio::time::Instant::now() < deadline, "timed out waiting for: {what}");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

fn params(pairs: &[(&str, serde_json::Value)]) -> Params {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// Runs `steps` iterations (reporting progress) or, with `hold`, loops until cancelled.
fn stepper() -> TaskRef {
    TaskFn::arc("step", |ctx: &WorkerContext, p: &Params| {
        let hold = p.get("hold").and_then(|v| v.as_bool()).unwrap_or(false);
        let steps = p.get("steps").and_then(|v| v.as_i64()).unwrap_or(1);
        let mut i = 0;
        while hold || i < steps {
            ctx.checkpoint()?;
            i += 1;
            ctx.report_progress(i);
            std::thread::sleep(Duration::from_millis(2));
        }
        Ok(())
    })
}

fn hold() -> Params {
    params(&[("hold", serde_json::json!(true))])
}

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<Event>>,
}

impl Recorder {
    fn started(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.kind == EventKind::WorkerStarted)
            .filter_map(|e| e.ticket.as_deref().map(str::to_string))
            .collect()
    }

    fn count(&self, kind: EventKind) -> usize {
        self.events.lock().unwrap().iter().filter(|e| e.kind == kind).count()
    }
}

#[async_trait]
impl Subscribe for Recorder {
    async fn on_event(&self, event: &Event) {
        self.events.lock().unwrap().push(event.clone());
    }
    fn name(&self) -> &'static str {
        "recorder"
    }
}

fn build(cfg: ControllerConfig, task: TaskRef) -> (Arc<Controller>, Arc<Recorder>) {
    let rec = Arc::new(Recorder::default());
    let ctrl = Controller::builder(cfg, task)
        .with_subscribers(vec![rec.clone() as Arc<dyn Subscribe>])
        .build()
        .unwrap();
    (ctrl, rec)
}

async fn wait_gone(ctrl: &Controller, ticket: &str) {
    eventually("ticket gone", || async {
        ctrl.status(ticket).await.state == TicketState::Unknown
    })
    .await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrency_cap_is_never_exceeded() {
    let running = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let done = Arc::new(AtomicUsize::new(0));

    let (r, pk, d) = (running.clone(), peak.clone(), done.clone());
    let task: TaskRef = TaskFn::arc("busy", move |_ctx: &WorkerContext, _p: &Params| {
        let now = r.fetch_add(1, Ordering::SeqCst) + 1;
        pk.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(15));
        r.fetch_sub(1, Ordering::SeqCst);
        d.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    let (ctrl, _) = build(ControllerConfig::new("cap", 3), task);
    for _ in 0..12 {
        ctrl.submit(Params::new(), 0).await.unwrap();
        assert!(ctrl.active_count().await <= 3);
    }

    eventually("all tickets done", || async { done.load(Ordering::SeqCst) == 12 }).await;
    eventually("slots released", || async { ctrl.active_count().await == 0 }).await;
    assert!(peak.load(Ordering::SeqCst) <= 3);
    assert_eq!(ctrl.queued_count().await, 0);
    ctrl.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_submitters_respect_the_cap() {
    let running = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let done = Arc::new(AtomicUsize::new(0));

    let (r, pk, d) = (running.clone(), peak.clone(), done.clone());
    let task: TaskRef = TaskFn::arc("busy", move |_ctx: &WorkerContext, _p: &Params| {
        let now = r.fetch_add(1, Ordering::SeqCst) + 1;
        pk.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(5));
        r.fetch_sub(1, Ordering::SeqCst);
        d.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    let (ctrl, _) = build(ControllerConfig::new("swarm", 3), task);
    let submitters: Vec<_> = (0..4)
        .map(|n| {
            let ctrl = Arc::clone(&ctrl);
            tokio::spawn(async move {
                for _ in 0..6 {
                    ctrl.submit(Params::new(), n).await.unwrap();
                    assert!(ctrl.active_count().await <= 3);
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();
    for s in submitters {
        s.await.unwrap();
    }

    eventually("all tickets done", || async { done.load(Ordering::SeqCst) == 24 }).await;
    eventually("slots released", || async { ctrl.active_count().await == 0 }).await;
    assert!(peak.load(Ordering::SeqCst) <= 3);
    ctrl.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn higher_priority_is_admitted_first_and_ties_keep_order() {
    let (ctrl, rec) = build(ControllerConfig::new("prio", 2), stepper());

    let h1 = ctrl.submit(hold(), 0).await.unwrap().ticket_id;
    let h2 = ctrl.submit(hold(), 0).await.unwrap().ticket_id;
    eventually("both slots busy", || async { ctrl.active_count().await == 2 }).await;

    let a = ctrl.submit(Params::new(), 0).await.unwrap().ticket_id;
    let b = ctrl.submit(Params::new(), 5).await.unwrap().ticket_id;
    let c = ctrl.submit(Params::new(), 0).await.unwrap().ticket_id;
    assert_eq!(ctrl.status(b.as_str()).await.state, TicketState::Queued);
    assert_eq!(ctrl.queued_count().await, 3);

    assert!(ctrl.cancel(h1.as_str()).await.accepted);
    assert!(ctrl.cancel(h2.as_str()).await.accepted);
    for t in [&a, &b, &c] {
        wait_gone(&ctrl, t.as_str()).await;
    }
    ctrl.shutdown().await.unwrap();

    let started = rec.started();
    let expected: Vec<String> = [&h1, &h2, &b, &a, &c].iter().map(|t| t.to_string()).collect();
    assert_eq!(started, expected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn progress_is_monotonic_and_cleared_after_exit() {
    let task: TaskRef = TaskFn::arc("ramp", |ctx: &WorkerContext, _p: &Params| {
        for i in 0.. {
            ctx.checkpoint()?;
            // Out-of-order values must not make status go backwards.
            ctx.report_progress(if i % 3 == 0 { i / 2 } else { i });
            std::thread::sleep(Duration::from_millis(1));
        }
        Ok(())
    });
    let (ctrl, _) = build(ControllerConfig::new("ramp", 1), task);
    let id = ctrl.submit(Params::new(), 0).await.unwrap().ticket_id;

    let mut last = 0;
    let mut samples = 0;
    while samples < 50 {
        let st = ctrl.status(id.as_str()).await;
        if st.state == TicketState::Active {
            assert!(st.progress >= last, "progress went from {last} to {}", st.progress);
            last = st.progress;
            samples += 1;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    assert!(last > 0);

    let snap = ctrl.snapshot().await;
    assert_eq!(snap.len(), 1);
    assert_eq!(snap[0].ticket_id, id);
    assert_eq!(snap[0].worker, "ramp-1");
    assert!(snap[0].progress >= last);

    assert!(ctrl.cancel(id.as_str()).await.accepted);
    wait_gone(&ctrl, id.as_str()).await;
    let st = ctrl.status(id.as_str()).await;
    assert_eq!(st.progress, 0);
    ctrl.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancellation_frees_the_slot_for_queued_work() {
    let (ctrl, rec) = build(ControllerConfig::new("cancel", 1), stepper());

    let a = ctrl.submit(hold(), 0).await.unwrap().ticket_id;
    let b = ctrl
        .submit(params(&[("steps", serde_json::json!(3))]), 0)
        .await
        .unwrap()
        .ticket_id;
    eventually("a active", || async {
        ctrl.status(a.as_str()).await.state == TicketState::Active
    })
    .await;

    // Queued tickets cannot be cancelled.
    assert!(!ctrl.cancel(b.as_str()).await.accepted);
    assert_eq!(ctrl.status(b.as_str()).await.state, TicketState::Queued);

    assert!(ctrl.cancel(a.as_str()).await.accepted);
    wait_gone(&ctrl, a.as_str()).await;
    wait_gone(&ctrl, b.as_str()).await;
    ctrl.shutdown().await.unwrap();

    assert_eq!(rec.started(), vec![a.to_string(), b.to_string()]);
    assert_eq!(rec.count(EventKind::CancelRequested), 1);
    assert_eq!(rec.count(EventKind::WorkerExited), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unknown_tickets() {
    let (ctrl, _) = build(ControllerConfig::new("unknown", 1), stepper());

    let st = ctrl.status("never-submitted").await;
    assert_eq!(st.state, TicketState::Unknown);
    assert_eq!(st.progress, 0);
    assert!(!ctrl.cancel("never-submitted").await.accepted);
    ctrl.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn full_queue_rejects_submissions() {
    let cfg = ControllerConfig {
        queue_capacity: 1,
        ..ControllerConfig::new("bounded", 1)
    };
    let (ctrl, rec) = build(cfg, stepper());

    let a = ctrl.submit(hold(), 0).await.unwrap().ticket_id;
    eventually("a admitted", || async { ctrl.active_count().await == 1 }).await;

    ctrl.submit(Params::new(), 0).await.unwrap();
    let err = ctrl.submit(Params::new(), 9).await.unwrap_err();
    assert_eq!(err, ControllerError::AdmissionRejected { capacity: 1 });

    ctrl.cancel(a.as_str()).await;
    ctrl.shutdown().await.unwrap();
    assert_eq!(rec.count(EventKind::TicketRejected), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failing_and_panicking_tasks_release_their_slot() {
    let task: TaskRef = TaskFn::arc("flaky", |ctx: &WorkerContext, p: &Params| {
        match p.get("mode").and_then(|v| v.as_str()) {
            Some("fail") => Err(TaskError::fail("bad input")),
            Some("panic") => panic!("task blew up"),
            _ => {
                ctx.report_progress(1);
                Ok(())
            }
        }
    });
    let (ctrl, rec) = build(ControllerConfig::new("flaky", 1), task);

    let f = ctrl
        .submit(params(&[("mode", serde_json::json!("fail"))]), 0)
        .await
        .unwrap()
        .ticket_id;
    let p = ctrl
        .submit(params(&[("mode", serde_json::json!("panic"))]), 0)
        .await
        .unwrap()
        .ticket_id;
    let ok = ctrl.submit(Params::new(), 0).await.unwrap().ticket_id;

    for t in [&f, &p, &ok] {
        wait_gone(&ctrl, t.as_str()).await;
    }
    ctrl.shutdown().await.unwrap();
    assert_eq!(rec.count(EventKind::WorkerExited), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn shutdown_discards_queue_and_closes() {
    let (ctrl, rec) = build(ControllerConfig::new("stop", 1), stepper());

    let a = ctrl.submit(hold(), 0).await.unwrap().ticket_id;
    let b = ctrl.submit(hold(), 0).await.unwrap().ticket_id;
    eventually("a active", || async {
        ctrl.status(a.as_str()).await.state == TicketState::Active
    })
    .await;

    ctrl.shutdown().await.unwrap();

    assert_eq!(ctrl.status(a.as_str()).await.state, TicketState::Unknown);
    assert_eq!(ctrl.status(b.as_str()).await.state, TicketState::Unknown);
    assert_eq!(
        ctrl.submit(Params::new(), 0).await.unwrap_err(),
        ControllerError::Closed
    );
    assert_eq!(rec.count(EventKind::QueueDiscarded), 1);
    assert_eq!(rec.count(EventKind::AllStoppedWithin), 1);

    // Second call is a no-op.
    ctrl.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn shutdown_reports_workers_that_ignore_cancellation() {
    let task: TaskRef = TaskFn::arc("stubborn", |ctx: &WorkerContext, _p: &Params| {
        std::thread::sleep(Duration::from_millis(300));
        ctx.info("finished late");
        Ok(())
    });
    let cfg = ControllerConfig {
        grace: Duration::from_millis(30),
        ..ControllerConfig::new("stubborn", 1)
    };
    let target = Arc::new(MemoryTarget::default());
    let sink = Arc::new(MemorySink::default());
    let ctrl = Controller::builder(cfg, task)
        .with_callback_target(target.clone())
        .with_log_sink(sink.clone(), Arc::new(SinkInit::new()))
        .build()
        .unwrap();
    let id = ctrl.submit(Params::new(), 0).await.unwrap().ticket_id;
    eventually("active", || async { ctrl.active_count().await == 1 }).await;

    match ctrl.shutdown().await {
        Err(RuntimeError::GraceExceeded { stuck, .. }) => assert_eq!(stuck, vec![id.to_string()]),
        other => panic!("expected GraceExceeded, got {other:?}"),
    }
    wait_gone(&ctrl, id.as_str()).await;

    // The late exit is still reported once the worker returns.
    eventually("ended callback", || async {
        target.events().contains(&CallbackEvent::Ended)
    })
    .await;
    eventually("late log", || async {
        sink.records
            .lock()
            .unwrap()
            .iter()
            .any(|r| r.message == "finished late")
    })
    .await;
}

#[derive(Default)]
struct MemoryTarget {
    delay: Duration,
    got: Mutex<Vec<CallbackMessage>>,
}

impl MemoryTarget {
    fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    fn events(&self) -> Vec<CallbackEvent> {
        self.got.lock().unwrap().iter().map(|m| m.event).collect()
    }
}

#[async_trait]
impl CallbackTarget for MemoryTarget {
    async fn deliver(&self, msg: &CallbackMessage) -> Result<(), CallbackError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.got.lock().unwrap().push(msg.clone());
        Ok(())
    }
    fn endpoint(&self) -> &str {
        "mem://test"
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn start_and_end_callbacks_are_sent() {
    let target = Arc::new(MemoryTarget::default());
    let ctrl = Controller::builder(ControllerConfig::new("cb", 1), stepper())
        .with_callback_target(target.clone())
        .build()
        .unwrap();

    let id = ctrl.submit(Params::new(), 0).await.unwrap().ticket_id;
    eventually("two callbacks", || async { target.got.lock().unwrap().len() == 2 }).await;

    let got = target.got.lock().unwrap().clone();
    assert!(got.iter().all(|m| m.ticket_id == id.as_str()));
    assert!(got.iter().any(|m| m.event == CallbackEvent::Started));
    assert!(got.iter().any(|m| m.event == CallbackEvent::Ended));
    ctrl.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn shutdown_waits_for_pending_callbacks() {
    let target = Arc::new(MemoryTarget::slow(Duration::from_millis(100)));
    let ctrl = Controller::builder(ControllerConfig::new("slow-cb", 1), stepper())
        .with_callback_target(target.clone())
        .build()
        .unwrap();

    let id = ctrl.submit(hold(), 0).await.unwrap().ticket_id;
    eventually("active", || async {
        ctrl.status(id.as_str()).await.state == TicketState::Active
    })
    .await;
    ctrl.shutdown().await.unwrap();

    let mut events = target.events();
    events.sort_by_key(|e| *e == CallbackEvent::Ended);
    assert_eq!(events, vec![CallbackEvent::Started, CallbackEvent::Ended]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn http_callbacks_are_posted() {
    let mut server = mockito::Server::new_async().await;
    let started = server
        .mock("POST", "/hook")
        .match_body(mockito::Matcher::PartialJson(serde_json::json!({"event": "started"})))
        .with_status(200)
        .create_async()
        .await;
    let ended = server
        .mock("POST", "/hook")
        .match_body(mockito::Matcher::PartialJson(serde_json::json!({"event": "ended"})))
        .with_status(200)
        .create_async()
        .await;

    let cfg = ControllerConfig {
        callback: CallbackConfig::to_url(format!("{}/hook", server.url())),
        ..ControllerConfig::new("http", 1)
    };
    let ctrl = Controller::builder(cfg, stepper()).build().unwrap();
    ctrl.submit(Params::new(), 0).await.unwrap();

    eventually("both posts", || async { started.matched_async().await && ended.matched_async().await }).await;
    ctrl.shutdown().await.unwrap();
}

#[derive(Default)]
struct MemorySink {
    inits: AtomicUsize,
    records: Mutex<Vec<LogRecord>>,
}

#[async_trait]
impl LogSink for MemorySink {
    fn init(&self) {
        self.inits.fetch_add(1, Ordering::SeqCst);
    }
    async fn write(&self, record: &LogRecord) {
        self.records.lock().unwrap().push(record.clone());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn worker_logs_reach_the_sink_and_init_runs_once() {
    let sink = Arc::new(MemorySink::default());
    let init = Arc::new(SinkInit::new());
    let task: TaskRef = TaskFn::arc("chatty", |ctx: &WorkerContext, _p: &Params| {
        ctx.warn("warming up");
        loop {
            ctx.checkpoint()?;
            std::thread::sleep(Duration::from_millis(2));
        }
    });

    let first = Controller::builder(ControllerConfig::new("one", 1), task.clone())
        .with_log_sink(sink.clone(), init.clone())
        .build()
        .unwrap();
    let second = Controller::builder(ControllerConfig::new("two", 1), task)
        .with_log_sink(sink.clone(), init.clone())
        .build()
        .unwrap();
    assert_eq!(sink.inits.load(Ordering::SeqCst), 1);

    let id = first.submit(Params::new(), 0).await.unwrap().ticket_id;
    eventually("active", || async {
        first.status(id.as_str()).await.state == TicketState::Active
    })
    .await;
    first.cancel(id.as_str()).await;
    first.shutdown().await.unwrap();
    second.shutdown().await.unwrap();

    let records = sink.records.lock().unwrap();
    assert!(records.iter().all(|r| &*r.worker == "chatty-1"));
    assert!(
        records
            .iter()
            .any(|r| r.level == Level::Warning && r.message == "warming up")
    );
    assert!(
        records
            .iter()
            .any(|r| r.level == Level::Critical && r.message == "Task chatty-1 aborted by signal.")
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn logged_service_wraps_the_controller() {
    let ctrl = Controller::builder(ControllerConfig::new("svc", 1), stepper())
        .build()
        .unwrap();
    let svc = Logged::new("svc", Arc::clone(&ctrl));

    let reply = svc.submit(Params::new(), 1).await.unwrap();
    assert_eq!(reply.sequence, 0);
    wait_gone(&ctrl, reply.ticket_id.as_str()).await;
    assert_eq!(svc.status(reply.ticket_id.as_str()).await.state, TicketState::Unknown);
    assert!(!svc.cancel(reply.ticket_id.as_str()).await.accepted);
    ctrl.shutdown().await.unwrap();
}

#[tokio::test]
async fn invalid_config_is_rejected() {
    let mut cfg = ControllerConfig::new("bad", 1);
    cfg.callback.attempts = 0;
    let err = Controller::builder(cfg, stepper()).build().unwrap_err();
    assert!(matches!(err, ControllerError::InvalidConfig { .. }));
}
