//! # Example: basic_controller
//!
//! Submits a handful of tickets with different priorities to a controller
//! capped at two workers and polls their status until all are done.
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► Controller::builder(cfg, task).with_subscribers([LogWriter]).build()
//!   ├─► submit 5 tickets (priorities 0, 0, 5, 1, 0)
//!   │     ├─► first two start at once (slots free)
//!   │     └─► rest queued: priority 5, then 1, then 0
//!   ├─► poll status() every 100ms, print state/progress
//!   └─► shutdown()
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=info cargo run --example basic_controller
//! ```

use std::sync::Arc;
use std::time::Duration;

use ticketvisor::{
    Controller, ControllerConfig, LogWriter, Params, Subscribe, TaskFn, TaskRef, TicketState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // 1. A task that counts to `steps`, 50ms per step
    let count: TaskRef = TaskFn::arc("count", |ctx, params| {
        let steps = params.get("steps").and_then(|v| v.as_i64()).unwrap_or(10);
        for step in 1..=steps {
            ctx.checkpoint()?;
            ctx.report_progress(step);
            std::thread::sleep(Duration::from_millis(50));
        }
        ctx.info(format!("counted to {steps}"));
        Ok(())
    });

    // 2. Controller with two slots and an event logger
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let ctrl = Controller::builder(ControllerConfig::new("basic", 2), count)
        .with_subscribers(subs)
        .build()?;

    // 3. Submit
    let mut tickets = Vec::new();
    for (i, priority) in [0, 0, 5, 1, 0].into_iter().enumerate() {
        let mut params = Params::new();
        params.insert("steps".into(), (8 + 2 * i as i64).into());
        let reply = ctrl.submit(params, priority).await?;
        println!("submitted #{i} priority={priority} ticket={}", reply.ticket_id);
        tickets.push(reply.ticket_id);
    }

    // 4. Poll until every ticket is gone
    loop {
        let mut line = Vec::new();
        let mut pending = 0;
        for t in &tickets {
            let st = ctrl.status(t.as_str()).await;
            if st.state != TicketState::Unknown {
                pending += 1;
            }
            line.push(format!("{:?}:{}", st.state, st.progress));
        }
        println!("{}", line.join("  "));
        if pending == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    ctrl.shutdown().await?;
    println!("done");
    Ok(())
}
