//! Activation lifecycle.
//!
//! An activation applies one [`Settings`] snapshot: it validates it, arms a
//! [`ScheduleTrigger`] on its own task and tears everything down on stop.
//! Reconfiguration replaces the activation wholesale.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::Settings;
use crate::notifier::{Dispatcher, Notifier};
use crate::schedule::{ScheduleTrigger, TriggerReport, TriggerState};
use crate::watcher::WatcherError;

/// A running schedule trigger bound to one configuration.
#[derive(Debug)]
pub struct Activation {
    id: Uuid,
    settings: Arc<Settings>,
    cancel: CancellationToken,
    state: watch::Receiver<TriggerState>,
    handle: JoinHandle<TriggerReport>,
}

impl Activation {
    /// Validate `settings` and start the schedule trigger.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`WatcherError::ConfigurationInvalid`] if the settings are
    /// invalid; nothing is started in that case.
    pub fn start(settings: Settings, notifier: Arc<dyn Notifier>) -> Result<Self, WatcherError> {
        Ok(Armed::new(settings, notifier)?.launch())
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Current state of the schedule trigger.
    #[must_use]
    pub fn state(&self) -> TriggerState {
        *self.state.borrow()
    }

    /// Stop the trigger and every watch loop it started.
    ///
    /// # Errors
    ///
    /// Returns an error if the trigger task panicked.
    pub async fn stop(self) -> Result<TriggerReport, JoinError> {
        self.cancel.cancel();
        let report = self.handle.await?;
        tracing::info!(activation = %self.id, ?report, "Activation stopped");
        Ok(report)
    }

    /// Stop this activation and start a new one with `settings`.
    ///
    /// The new settings are validated before anything is stopped; if they
    /// are invalid the current activation keeps running and is handed back
    /// with the error.
    ///
    /// # Errors
    ///
    /// Returns the untouched current activation and the validation error.
    pub async fn reconfigure(
        self,
        settings: Settings,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, (Self, WatcherError)> {
        let armed = match Armed::new(settings, notifier) {
            Ok(armed) => armed,
            Err(e) => return Err((self, e)),
        };

        let old_id = self.id;
        if let Err(e) = self.stop().await {
            tracing::error!(activation = %old_id, error = %e, "Previous activation ended abnormally");
        }
        Ok(armed.launch())
    }
}

/// A validated trigger that has not been spawned yet.
struct Armed {
    id: Uuid,
    settings: Arc<Settings>,
    cancel: CancellationToken,
    trigger: ScheduleTrigger,
}

impl Armed {
    fn new(settings: Settings, notifier: Arc<dyn Notifier>) -> Result<Self, WatcherError> {
        settings.validate()?;

        let dispatcher = Arc::new(Dispatcher::from_config(notifier, &settings.notifier));
        let cancel = CancellationToken::new();
        let trigger = ScheduleTrigger::new(
            Arc::new(settings.watch.clone()),
            dispatcher,
            settings.trigger,
        )?
        .with_cancellation(cancel.clone());

        Ok(Self {
            id: Uuid::new_v4(),
            settings: Arc::new(settings),
            cancel,
            trigger,
        })
    }

    fn launch(self) -> Activation {
        let watch = &self.settings.watch;
        tracing::info!(
            activation = %self.id,
            directory = %watch.directory.display(),
            target = %watch.target_file,
            schedule = %watch.schedule,
            "Activation started"
        );
        let state = self.trigger.subscribe();
        let handle = tokio::spawn(self.trigger.run());

        Activation {
            id: self.id,
            settings: self.settings,
            cancel: self.cancel,
            state,
            handle,
        }
    }
}
