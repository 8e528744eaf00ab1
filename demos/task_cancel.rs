//! # Example: task_cancel
//!
//! Starts a ticket that would run forever, cancels it, and shows that the
//! freed slot is immediately reused by the next queued ticket.
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► submit "forever" ticket  → active
//!   ├─► submit "short" ticket    → queued (one slot)
//!   ├─► cancel(short)            → accepted = false (queued tickets are not cancellable)
//!   ├─► cancel(forever)          → accepted = true
//!   │     ├─► worker hits checkpoint() → TaskError::Aborted
//!   │     ├─► "Task spin-1 aborted by signal." logged at critical level
//!   │     └─► supervising routine frees the slot
//!   └─► short ticket becomes active and completes
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=info cargo run --example task_cancel
//! ```

use std::time::Duration;

use ticketvisor::{Controller, ControllerConfig, Params, TaskFn, TaskRef, TicketState, TracingSink};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let spin: TaskRef = TaskFn::arc("spin", |ctx, params| {
        let limit = params.get("limit").and_then(|v| v.as_i64());
        let mut tick = 0;
        loop {
            ctx.checkpoint()?;
            tick += 1;
            ctx.report_progress(tick);
            if limit.is_some_and(|l| tick >= l) {
                return Ok(());
            }
            std::thread::sleep(Duration::from_millis(20));
        }
    });

    // TracingSink::with_fmt installs the fmt subscriber on first use.
    let ctrl = Controller::builder(ControllerConfig::new("cancel-demo", 1), spin)
        .with_log_sink(
            std::sync::Arc::new(TracingSink::with_fmt()),
            std::sync::Arc::new(ticketvisor::SinkInit::new()),
        )
        .build()?;

    let forever = ctrl.submit(Params::new(), 0).await?.ticket_id;
    let mut params = Params::new();
    params.insert("limit".into(), 25.into());
    let short = ctrl.submit(params, 0).await?.ticket_id;

    tokio::time::sleep(Duration::from_millis(300)).await;
    println!("forever: {:?}", ctrl.status(forever.as_str()).await);
    println!("short:   {:?}", ctrl.status(short.as_str()).await);

    println!("cancel(short)   -> {:?}", ctrl.cancel(short.as_str()).await);
    println!("cancel(forever) -> {:?}", ctrl.cancel(forever.as_str()).await);

    while ctrl.status(short.as_str()).await.state != TicketState::Unknown {
        println!("short:   {:?}", ctrl.status(short.as_str()).await);
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    ctrl.shutdown().await?;
    Ok(())
}
