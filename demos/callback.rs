//! # Example: callback
//!
//! Wires start/end notifications. With `CALLBACK_URL` set, JSON bodies like
//! `{"event":"started","ticketId":"..."}` are POSTed there; otherwise a
//! printing target is injected.
//!
//! ## Run
//! ```bash
//! RUST_LOG=info cargo run --example callback
//! CALLBACK_URL=http://127.0.0.1:8050/hook RUST_LOG=info cargo run --example callback
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ticketvisor::{
    CallbackConfig, CallbackError, CallbackMessage, CallbackTarget, Controller, ControllerConfig,
    Logged, Params, TaskFn, TaskRef, TicketService, TicketState,
};

struct Printer;

#[async_trait]
impl CallbackTarget for Printer {
    async fn deliver(&self, msg: &CallbackMessage) -> Result<(), CallbackError> {
        println!("callback: {}", serde_json::to_string(msg).unwrap_or_default());
        Ok(())
    }

    fn endpoint(&self) -> &str {
        "stdout"
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let work: TaskRef = TaskFn::arc("work", |ctx, _params| {
        for i in 1..=5 {
            ctx.checkpoint()?;
            ctx.report_progress(i * 20);
            std::thread::sleep(Duration::from_millis(100));
        }
        Ok(())
    });

    let mut cfg = ControllerConfig::new("callback-demo", 2);
    cfg.callback.attempts = 3;
    cfg.callback.timeout = Duration::from_secs(5);

    let builder = match std::env::var("CALLBACK_URL") {
        Ok(url) => {
            cfg.callback = CallbackConfig {
                url: Some(url),
                ..cfg.callback
            };
            Controller::builder(cfg, work)
        }
        Err(_) => Controller::builder(cfg, work).with_callback_target(Arc::new(Printer)),
    };
    let ctrl = builder.build()?;

    // Request layers talk to the service trait; `Logged` records every call.
    let svc = Logged::new("callback-demo", Arc::clone(&ctrl));
    let a = svc.submit(Params::new(), 0).await?.ticket_id;
    let b = svc.submit(Params::new(), 3).await?.ticket_id;

    for t in [&a, &b] {
        while svc.status(t.as_str()).await.state != TicketState::Unknown {
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
    }

    // Give the "ended" deliveries a moment; they are fire-and-forget.
    tokio::time::sleep(Duration::from_millis(200)).await;
    ctrl.shutdown().await?;
    Ok(())
}
