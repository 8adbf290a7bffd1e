//! Processing-mode commands with a single in-flight slot.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use skywatch_core::{ModeAction, ModeState, ModeSwitchPolicy, ProcessingMode};

use crate::client::SkywatchClient;
use crate::error::ModeError;

/// Switches the drone's processing mode.
///
/// `switch_mode` and `turn_off_all_modes` share one in-flight slot: a call
/// made while another is outstanding fails with [`ModeError::Busy`] and sends
/// nothing. Local state only changes after the backend accepted every command
/// of the operation.
#[derive(Debug)]
pub struct ModeController {
    client: SkywatchClient,
    policy: ModeSwitchPolicy,
    in_flight: AtomicBool,
    state: Mutex<ModeState>,
}

impl ModeController {
    pub fn new(client: SkywatchClient, policy: ModeSwitchPolicy) -> Self {
        Self {
            client,
            policy,
            in_flight: AtomicBool::new(false),
            state: Mutex::new(ModeState::default()),
        }
    }

    pub fn policy(&self) -> ModeSwitchPolicy {
        self.policy
    }

    pub fn state(&self) -> ModeState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_switching(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub async fn switch_mode(&self, target: ProcessingMode) -> Result<ModeState, ModeError> {
        let _guard = InFlightGuard::acquire(&self.in_flight).ok_or(ModeError::Busy)?;

        let steps = self.policy.plan(&self.state(), target);
        for (mode, action) in steps {
            if let Err(source) = self.client.send_process_command(mode, action).await {
                tracing::warn!("Switching to {} failed: {}", target.label(), source);
                return Err(ModeError::Command {
                    mode,
                    action,
                    source,
                });
            }
        }

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.switched_to(target);
        tracing::info!("Processing mode is now {}", target.label());
        Ok(*state)
    }

    /// Send "off" for both modes at once; both must succeed.
    pub async fn turn_off_all_modes(&self) -> Result<ModeState, ModeError> {
        let _guard = InFlightGuard::acquire(&self.in_flight).ok_or(ModeError::Busy)?;

        let (detection, face) = tokio::join!(
            self.client
                .send_process_command(ProcessingMode::Detection, ModeAction::Off),
            self.client
                .send_process_command(ProcessingMode::FaceRecognition, ModeAction::Off),
        );

        let failed = match (detection, face) {
            (Ok(()), Ok(())) => None,
            (Err(source), _) => Some((ProcessingMode::Detection, source)),
            (_, Err(source)) => Some((ProcessingMode::FaceRecognition, source)),
        };
        if let Some((mode, source)) = failed {
            tracing::warn!("Turning off all modes failed on {}: {}", mode, source);
            return Err(ModeError::Command {
                mode,
                action: ModeAction::Off,
                source,
            });
        }

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.turned_off();
        tracing::info!("All processing modes off");
        Ok(*state)
    }
}

/// Holds the in-flight flag; dropping it releases the flag, including when the
/// owning future is cancelled.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_is_exclusive_and_released_on_drop() {
        let flag = AtomicBool::new(false);
        let first = InFlightGuard::acquire(&flag);
        assert!(first.is_some());
        assert!(InFlightGuard::acquire(&flag).is_none());
        drop(first);
        assert!(!flag.load(Ordering::Acquire));
        assert!(InFlightGuard::acquire(&flag).is_some());
    }

    #[tokio::test]
    async fn failed_switch_keeps_state_and_releases_guard() {
        // Nothing listens on port 9 locally.
        let client = SkywatchClient::new("http://127.0.0.1:9/api", "drone-1");
        let controller = ModeController::new(client, ModeSwitchPolicy::ActivateOnly);

        let err = controller
            .switch_mode(ProcessingMode::FaceRecognition)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ModeError::Command {
                mode: ProcessingMode::FaceRecognition,
                action: ModeAction::On,
                ..
            }
        ));
        assert_eq!(controller.state(), ModeState::default());
        assert!(!controller.is_switching());

        assert!(controller.turn_off_all_modes().await.is_err());
        assert!(!controller.state().all_off);
        assert!(!controller.is_switching());
    }
}
