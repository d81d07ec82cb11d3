use crate::core::detector::{detect, sanitize_digits};
use crate::core::normalizer::validate;
use crate::domain::model::{AvailabilityResult, ChannelStatus, FieldStatus};
use crate::domain::ports::{ChannelVerifier, CheckerSettings};
use crate::utils::error::PhoneIntelError;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::Instrument;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(800);
pub const DEFAULT_MIN_DIGITS: usize = 7;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilitySettings {
    pub debounce: Duration,
    pub min_digits: usize,
    pub timeout: Duration,
}

impl Default for AvailabilitySettings {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            min_digits: DEFAULT_MIN_DIGITS,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl AvailabilitySettings {
    pub fn from_provider<S: CheckerSettings + ?Sized>(settings: &S) -> Self {
        Self {
            debounce: settings.debounce(),
            min_digits: settings.min_digits(),
            timeout: settings.timeout(),
        }
    }
}

impl CheckerSettings for AvailabilitySettings {
    fn debounce(&self) -> Duration {
        self.debounce
    }

    fn min_digits(&self) -> usize {
        self.min_digits
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Maps a collaborator reply to the tri-state result. Only an unqualified
/// "yes" counts as reachable; "no" is not proof of absence.
pub fn map_channel_status(status: ChannelStatus) -> AvailabilityResult {
    match status {
        ChannelStatus {
            has_channel: true,
            error: None,
        } => AvailabilityResult::reachable(),
        ChannelStatus {
            error: Some(error), ..
        } => AvailabilityResult::unknown_with_error(error),
        ChannelStatus { .. } => AvailabilityResult::unknown(),
    }
}

/// One-shot channel lookup with a length gate and a bounded wait.
pub struct AvailabilityChecker<V: ChannelVerifier> {
    verifier: V,
    settings: AvailabilitySettings,
}

impl<V: ChannelVerifier> AvailabilityChecker<V> {
    pub fn new(verifier: V, settings: AvailabilitySettings) -> Self {
        Self { verifier, settings }
    }

    pub fn with_defaults(verifier: V) -> Self {
        Self::new(verifier, AvailabilitySettings::default())
    }

    pub fn settings(&self) -> &AvailabilitySettings {
        &self.settings
    }

    pub fn passes_length_gate(&self, candidate: &str) -> bool {
        sanitize_digits(candidate).len() >= self.settings.min_digits
    }

    /// Best-effort E.164 form: validated number, then the detector's guess
    /// for national input, then the bare digits behind `+`.
    pub fn e164_candidate(&self, candidate_number: &str) -> String {
        if let Some(formatted) = validate(candidate_number).formatted {
            return formatted;
        }
        let digits = sanitize_digits(candidate_number);
        match detect(&digits).formatted_number {
            Some(formatted) => formatted,
            None => format!("+{}", digits),
        }
    }

    /// Never fails: collaborator errors and timeouts come back as `Unknown`.
    pub async fn check_availability(&self, candidate_number: &str) -> AvailabilityResult {
        if !self.passes_length_gate(candidate_number) {
            tracing::debug!("Skipping availability check below {} digits", self.settings.min_digits);
            return AvailabilityResult::unknown();
        }

        let number = self.e164_candidate(candidate_number);

        tracing::debug!("Checking channel availability for {}", number);
        match tokio::time::timeout(self.settings.timeout, self.verifier.verify(&number)).await {
            Ok(Ok(status)) => map_channel_status(status),
            Ok(Err(e)) => {
                tracing::warn!("⚠️ Channel verification failed for {}: {}", number, e);
                AvailabilityResult::unknown_with_error(e.to_string())
            }
            Err(_) => {
                let e = PhoneIntelError::Timeout {
                    after_ms: self.settings.timeout.as_millis() as u64,
                };
                tracing::warn!("⚠️ {} ({})", e, number);
                AvailabilityResult::unknown_with_error(e.to_string())
            }
        }
    }
}

/// Stamp carried by a check: the field value it was issued for and the edit
/// generation at that time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckTicket {
    value: String,
    generation: u64,
}

impl CheckTicket {
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Default)]
struct FieldState {
    value: String,
    generation: u64,
    applied_generation: Option<u64>,
}

struct FieldShared {
    state: Mutex<FieldState>,
    status: watch::Sender<FieldStatus>,
}

impl FieldShared {
    fn lock(&self) -> MutexGuard<'_, FieldState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Debounced availability tracking for one phone input.
///
/// Every edit issues a [`CheckTicket`]. A result is applied only if the
/// field still holds the ticket's value when the result arrives, and at most
/// once per edit generation. Fields are independent of each other.
pub struct AvailabilityField<V: ChannelVerifier + 'static> {
    checker: Arc<AvailabilityChecker<V>>,
    shared: Arc<FieldShared>,
}

impl<V: ChannelVerifier + 'static> Clone for AvailabilityField<V> {
    fn clone(&self) -> Self {
        Self {
            checker: Arc::clone(&self.checker),
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<V: ChannelVerifier + 'static> AvailabilityField<V> {
    pub fn new(checker: Arc<AvailabilityChecker<V>>) -> Self {
        let (status, _) = watch::channel(FieldStatus::Idle);
        Self {
            checker,
            shared: Arc::new(FieldShared {
                state: Mutex::new(FieldState::default()),
                status,
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<FieldStatus> {
        self.shared.status.subscribe()
    }

    pub fn status(&self) -> FieldStatus {
        self.shared.status.borrow().clone()
    }

    pub fn current_value(&self) -> String {
        self.shared.lock().value.clone()
    }

    /// Records an edit and returns the ticket for a check of the new value.
    pub fn edit(&self, value: impl Into<String>) -> CheckTicket {
        let mut state = self.shared.lock();
        state.value = value.into();
        state.generation += 1;
        self.shared.status.send_replace(FieldStatus::Idle);

        CheckTicket {
            value: state.value.clone(),
            generation: state.generation,
        }
    }

    /// True while no later edit has happened.
    pub fn is_current(&self, ticket: &CheckTicket) -> bool {
        self.shared.lock().generation == ticket.generation
    }

    fn mark_checking(&self, ticket: &CheckTicket) -> bool {
        let state = self.shared.lock();
        if state.generation != ticket.generation {
            return false;
        }
        // 同值的舊回應已經套用過
        if state.applied_generation == Some(state.generation) {
            tracing::debug!("Availability for {} already settled, skipping check", ticket.value);
            return false;
        }
        self.shared.status.send_replace(FieldStatus::Checking {
            value: ticket.value.clone(),
        });
        true
    }

    /// Applies `result` if the ticket is still relevant. Returns whether it
    /// was applied.
    pub fn complete(&self, ticket: &CheckTicket, result: AvailabilityResult) -> bool {
        let mut state = self.shared.lock();

        if state.value != ticket.value {
            tracing::debug!(
                "Discarding stale availability result for {} (field now {})",
                ticket.value,
                state.value
            );
            return false;
        }
        if state.applied_generation == Some(state.generation) {
            tracing::debug!("Ignoring duplicate availability result for {}", ticket.value);
            return false;
        }

        state.applied_generation = Some(state.generation);
        tracing::info!("📶 Availability for {}: {:?}", ticket.value, result.state);
        self.shared.status.send_replace(FieldStatus::Settled {
            value: ticket.value.clone(),
            result,
            checked_at: chrono::Utc::now(),
        });
        true
    }

    /// Feeds a keystroke-level value. The check fires once the field has been
    /// quiet for the debounce window.
    pub fn on_input(&self, value: impl Into<String>) -> JoinHandle<()> {
        let ticket = self.edit(value);
        let field = self.clone();
        let span = tracing::info_span!(
            "availability_check",
            value = %ticket.value,
            generation = ticket.generation
        );

        tokio::spawn(async move {
            tokio::time::sleep(field.checker.settings().debounce).await;

            if !field.is_current(&ticket) {
                return;
            }

            if !field.checker.passes_length_gate(&ticket.value) {
                field.complete(&ticket, AvailabilityResult::unknown());
                return;
            }

            if !field.mark_checking(&ticket) {
                return;
            }
            let result = field.checker.check_availability(&ticket.value).await;
            field.complete(&ticket, result);
        }
        .instrument(span))
    }
}
