use crate::{
    contract::ArenaGateway,
    errors::join_error_message,
    lookup::{
        GameLookup,
        LookupKey,
    },
    notifications::{
        DEFAULT_TOAST_DURATION,
        ToastId,
        ToastKind,
        Toasts,
    },
};
use ethers::types::{
    TxHash,
    U256,
};
use std::{
    sync::Arc,
    time::Instant,
};
use tokio::sync::mpsc;
use tracing::{
    error,
    info,
    warn,
};

pub const PREPARING_MESSAGE: &str = "Preparing to enter the battle arena...";
pub const SUMMONING_MESSAGE: &str = "Summoning your warrior to the battlefield...";
pub const CONFIRMED_MESSAGE: &str = "You have entered the battle arena! 🎮";

/// Arguments of a `joinGame` call: the game id and the value attached to it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct JoinRequest {
    pub game_id: U256,
    pub stake: U256,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum JoinPhase {
    Idle,
    Submitting {
        request: JoinRequest,
        toast: ToastId,
    },
    AwaitingConfirmation {
        request: JoinRequest,
        tx_hash: TxHash,
        toast: ToastId,
    },
    Confirmed {
        request: JoinRequest,
        tx_hash: TxHash,
    },
    Failed {
        request: JoinRequest,
        message: String,
    },
}

/// Progress reported by the task driving one join.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum JoinProgress {
    Accepted { tx_hash: TxHash },
    Confirmed { tx_hash: TxHash },
    Failed { error: String },
}

#[derive(Debug)]
pub struct JoinOrchestrator {
    phase: JoinPhase,
}

impl Default for JoinOrchestrator {
    fn default() -> Self {
        Self {
            phase: JoinPhase::Idle,
        }
    }
}

impl JoinOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &JoinPhase {
        &self.phase
    }

    pub fn in_flight(&self) -> bool {
        matches!(
            self.phase,
            JoinPhase::Submitting { .. } | JoinPhase::AwaitingConfirmation { .. }
        )
    }

    /// Moves to `Submitting` and shows the loading toast. Returns `false`
    /// without side effects while another join is in flight.
    pub fn begin(&mut self, request: JoinRequest, toasts: &mut Toasts) -> bool {
        if self.in_flight() {
            warn!(game_id = %request.game_id, "join refused, another join is in flight");
            return false;
        }
        let toast = toasts.loading(PREPARING_MESSAGE);
        info!(game_id = %request.game_id, stake = %request.stake, "submitting joinGame");
        self.phase = JoinPhase::Submitting { request, toast };
        true
    }

    /// Applies a progress event. Every settling event advances the lookup's
    /// refresh token; the returned key must be sent to the lookup worker.
    pub fn apply(
        &mut self,
        progress: JoinProgress,
        toasts: &mut Toasts,
        lookup: &mut GameLookup,
        now: Instant,
    ) -> Option<LookupKey> {
        let phase = std::mem::replace(&mut self.phase, JoinPhase::Idle);
        match (phase, progress) {
            (
                JoinPhase::Submitting { request, toast },
                JoinProgress::Accepted { tx_hash },
            ) => {
                info!(?tx_hash, "joinGame accepted, awaiting confirmation");
                toasts.update(
                    toast,
                    ToastKind::Loading,
                    SUMMONING_MESSAGE,
                    Some("⚔️"),
                    Some(DEFAULT_TOAST_DURATION),
                    now,
                );
                self.phase = JoinPhase::AwaitingConfirmation {
                    request,
                    tx_hash,
                    toast,
                };
                None
            }
            (
                JoinPhase::AwaitingConfirmation {
                    request,
                    tx_hash,
                    toast,
                },
                JoinProgress::Confirmed { tx_hash: confirmed },
            ) if confirmed == tx_hash => {
                info!(?tx_hash, game_id = %request.game_id, "joinGame confirmed");
                toasts.update(
                    toast,
                    ToastKind::Success,
                    CONFIRMED_MESSAGE,
                    Some("🔥"),
                    Some(DEFAULT_TOAST_DURATION),
                    now,
                );
                self.phase = JoinPhase::Confirmed { request, tx_hash };
                lookup.invalidate()
            }
            (
                JoinPhase::Submitting { request, toast }
                | JoinPhase::AwaitingConfirmation { request, toast, .. },
                JoinProgress::Failed { error: raw },
            ) => {
                error!(error = %raw, game_id = %request.game_id, "joining battle failed");
                let message = join_error_message(&raw);
                toasts.update(
                    toast,
                    ToastKind::Error,
                    message.clone(),
                    Some("❌"),
                    Some(DEFAULT_TOAST_DURATION),
                    now,
                );
                self.phase = JoinPhase::Failed { request, message };
                lookup.invalidate()
            }
            (phase, progress) => {
                warn!(?phase, ?progress, "ignoring join progress for a settled join");
                self.phase = phase;
                None
            }
        }
    }
}

/// Submits the join and watches it to settlement, reporting each step.
pub async fn drive_join<G: ArenaGateway>(
    gateway: Arc<G>,
    request: JoinRequest,
    progress_tx: mpsc::UnboundedSender<JoinProgress>,
) {
    let tx_hash = match gateway.submit_join(request).await {
        Ok(tx_hash) => tx_hash,
        Err(err) => {
            let _ = progress_tx.send(JoinProgress::Failed {
                error: format!("{err:#}"),
            });
            return;
        }
    };
    if progress_tx.send(JoinProgress::Accepted { tx_hash }).is_err() {
        return;
    }
    let outcome = match gateway.wait_for_confirmation(tx_hash).await {
        Ok(()) => JoinProgress::Confirmed { tx_hash },
        Err(err) => JoinProgress::Failed {
            error: format!("{err:#}"),
        },
    };
    let _ = progress_tx.send(outcome);
}
