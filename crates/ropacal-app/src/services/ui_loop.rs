// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// UI-thread event loop.
//
// The navigation host has no internal locking, so exactly one task owns it.
// The phone lifecycle stream, the car lifecycle stream and the bridge-call
// stream each run as their own task and talk to the owner through an mpsc
// queue, waiting for a oneshot reply before sending their next item. Each
// stream therefore stays ordered, while the streams interleave freely, the
// same guarantees the host runtime gives on device.

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use ropacal_bridge::surface::SurfaceTransition;
use ropacal_bridge::{BridgeResponse, MethodCall, NavigationHost};
use ropacal_core::error::Result;
use ropacal_core::types::{EngineState, LifecycleEvent, SurfaceKind};

use super::script::{Script, ScriptStep, Stream};

/// Queue depth between the stream tasks and the owner.
const COMMAND_QUEUE_DEPTH: usize = 32;

/// Work delivered to the UI thread.
pub enum HostCommand {
    Lifecycle {
        kind: SurfaceKind,
        event: LifecycleEvent,
        reply: oneshot::Sender<Result<SurfaceTransition>>,
    },
    Control {
        kind: SurfaceKind,
        control_id: String,
        reply: oneshot::Sender<Result<bool>>,
    },
    Call {
        channel: Option<String>,
        call: MethodCall,
        reply: oneshot::Sender<BridgeResponse>,
    },
}

/// What one script step produced.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Outcome {
    Transition {
        transition: SurfaceTransition,
    },
    Control {
        surface: SurfaceKind,
        control: String,
        applied: bool,
    },
    Response {
        method: String,
        response: BridgeResponse,
    },
    /// A lifecycle or control step the host refused (e.g. attachment conflict).
    Rejected {
        surface: SurfaceKind,
        step: String,
        code: String,
        message: String,
    },
}

/// An outcome tagged with the stream it came from.
#[derive(Debug, Clone, Serialize)]
pub struct OutcomeRecord {
    pub stream: String,
    pub outcome: Outcome,
}

/// End-of-session summary.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub outcomes: Vec<OutcomeRecord>,
    pub engine_state: EngineState,
    pub attached_surface: Option<SurfaceKind>,
    pub diagnostics: usize,
}

/// Own the host and serve commands until every sender is gone.
pub async fn run_ui_loop(
    mut host: NavigationHost,
    mut commands: mpsc::Receiver<HostCommand>,
) -> NavigationHost {
    info!(channel = host.channel_name(), "UI loop started");
    while let Some(command) = commands.recv().await {
        match command {
            HostCommand::Lifecycle { kind, event, reply } => {
                let result = host.on_lifecycle(kind, event);
                if reply.send(result).is_err() {
                    debug!(%kind, %event, "lifecycle caller went away");
                }
            }
            HostCommand::Control {
                kind,
                control_id,
                reply,
            } => {
                let result = host.activate_control(kind, &control_id);
                if reply.send(result).is_err() {
                    debug!(%kind, %control_id, "control caller went away");
                }
            }
            HostCommand::Call {
                channel,
                call,
                reply,
            } => {
                let response = match channel.as_deref() {
                    Some(name) => host.invoke_on(name, &call),
                    None => host.invoke(&call),
                };
                if reply.send(response).is_err() {
                    debug!(method = %call.method, "bridge caller went away");
                }
            }
        }
    }
    info!("UI loop stopped");
    host
}

/// Replay a session script against `host`, one task per inbound stream.
pub async fn replay(host: NavigationHost, script: Script) -> ReplayReport {
    let (tx, rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
    let owner = tokio::spawn(run_ui_loop(host, rx));

    let streams = SurfaceKind::ALL
        .into_iter()
        .map(Stream::Surface)
        .chain([Stream::Bridge]);
    let mut feeders = Vec::new();
    for stream in streams {
        let steps = script.stream(stream);
        if steps.is_empty() {
            continue;
        }
        feeders.push(tokio::spawn(feed_stream(stream, steps, tx.clone())));
    }
    drop(tx);

    let mut outcomes = Vec::new();
    for feeder in feeders {
        match feeder.await {
            Ok(records) => outcomes.extend(records),
            Err(e) => warn!(error = %e, "stream task failed"),
        }
    }

    let (engine_state, attached_surface, diagnostics) = match owner.await {
        Ok(host) => (
            host.engine()
                .map_or(EngineState::Uninitialized, |e| e.state()),
            host.engine()
                .and_then(|e| e.attached_surface())
                .map(|(_, kind)| kind),
            host.diagnostics().len(),
        ),
        Err(e) => {
            warn!(error = %e, "UI loop task failed");
            (EngineState::Uninitialized, None, 0)
        }
    };

    ReplayReport {
        outcomes,
        engine_state,
        attached_surface,
        diagnostics,
    }
}

/// Send one stream's steps in order, waiting for each reply.
async fn feed_stream(
    stream: Stream,
    steps: Vec<ScriptStep>,
    tx: mpsc::Sender<HostCommand>,
) -> Vec<OutcomeRecord> {
    let mut records = Vec::with_capacity(steps.len());
    for step in steps {
        let Some(outcome) = deliver(&tx, step).await else {
            warn!(%stream, "UI loop closed before the stream finished");
            break;
        };
        records.push(OutcomeRecord {
            stream: stream.to_string(),
            outcome,
        });
    }
    records
}

/// Deliver one step. `None` means the UI loop is gone.
async fn deliver(tx: &mpsc::Sender<HostCommand>, step: ScriptStep) -> Option<Outcome> {
    match step {
        ScriptStep::Lifecycle { surface, event } => {
            let (reply, rx) = oneshot::channel();
            tx.send(HostCommand::Lifecycle {
                kind: surface,
                event,
                reply,
            })
            .await
            .ok()?;
            Some(match rx.await.ok()? {
                Ok(transition) => Outcome::Transition { transition },
                Err(e) => Outcome::Rejected {
                    surface,
                    step: event.to_string(),
                    code: e.bridge_code().to_string(),
                    message: e.to_string(),
                },
            })
        }
        ScriptStep::Control { surface, control } => {
            let (reply, rx) = oneshot::channel();
            tx.send(HostCommand::Control {
                kind: surface,
                control_id: control.clone(),
                reply,
            })
            .await
            .ok()?;
            Some(match rx.await.ok()? {
                Ok(applied) => Outcome::Control {
                    surface,
                    control,
                    applied,
                },
                Err(e) => Outcome::Rejected {
                    surface,
                    step: control,
                    code: e.bridge_code().to_string(),
                    message: e.to_string(),
                },
            })
        }
        ScriptStep::Call { channel, call } => {
            let (reply, rx) = oneshot::channel();
            let method = call.method.clone();
            tx.send(HostCommand::Call {
                channel,
                call,
                reply,
            })
            .await
            .ok()?;
            Some(Outcome::Response {
                method,
                response: rx.await.ok()?,
            })
        }
    }
}
