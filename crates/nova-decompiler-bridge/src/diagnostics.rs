//! Engine diagnostics -> host logging and control flow.
//!
//! The engine has a single way of reporting failures: a log call with an attached cause. The host
//! needs three different reactions to those calls (abort, cancel, keep going), so every cause is
//! classified before anything is logged:
//!
//! 1. a failure this bridge already raised is passed through as-is;
//! 2. a cancellation signal (the bridge's [`Cancelled`] or whatever the host's predicate accepts)
//!    is passed through as-is;
//! 3. an interruption is turned into host cancellation via the cancellation hook;
//! 4. anything else is dispatched by severity, where `Error` aborts the run with
//!    [`InternalFailure`] and every other severity is only logged.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use nova_decompiler_ext::{Cause, DecompilerLogger, Interrupted, Severity};
use tokio_util::sync::CancellationToken;

use crate::error::{Cancelled, InternalFailure};

const LOG_TARGET: &str = "nova.decompiler";

pub type ErrorChannel = Arc<dyn Fn(&str) + Send + Sync>;
pub type LogChannel = Arc<dyn Fn(&str, Option<&Cause>) + Send + Sync>;
/// Converts an interruption into the host's cancellation signal, which is then raised.
///
/// The hook never resumes the run: whatever it returns aborts it.
pub type CancellationHook = Arc<dyn Fn(Cause) -> Cause + Send + Sync>;
pub type CancellationPredicate = Arc<dyn Fn(&(dyn Error + 'static)) -> bool + Send + Sync>;

/// Host-side logging and cancellation facilities the bridge reports into.
#[derive(Clone)]
pub struct HostChannels {
    pub error: ErrorChannel,
    pub warn: LogChannel,
    pub info: LogChannel,
    pub debug: LogChannel,
    pub cancel: CancellationHook,
    pub is_cancellation: CancellationPredicate,
}

impl HostChannels {
    /// Channels backed by `tracing`, recognising [`Cancelled`] as the host cancellation signal.
    pub fn tracing() -> Self {
        Self {
            error: Arc::new(|text: &str| tracing::error!(target: LOG_TARGET, "{text}")),
            warn: Arc::new(|text: &str, cause: Option<&Cause>| match cause {
                Some(cause) => tracing::warn!(target: LOG_TARGET, error = %cause, "{text}"),
                None => tracing::warn!(target: LOG_TARGET, "{text}"),
            }),
            info: Arc::new(|text: &str, cause: Option<&Cause>| match cause {
                Some(cause) => tracing::info!(target: LOG_TARGET, error = %cause, "{text}"),
                None => tracing::info!(target: LOG_TARGET, "{text}"),
            }),
            debug: Arc::new(|text: &str, cause: Option<&Cause>| match cause {
                Some(cause) => tracing::debug!(target: LOG_TARGET, error = %cause, "{text}"),
                None => tracing::debug!(target: LOG_TARGET, "{text}"),
            }),
            cancel: Arc::new(|cause: Cause| -> Cause { Box::new(Cancelled::caused_by(cause)) }),
            is_cancellation: Arc::new(|cause: &(dyn Error + 'static)| cause.is::<Cancelled>()),
        }
    }

    /// Also cancels `token` whenever an interruption is converted into cancellation, so sibling
    /// work sharing the token stops too.
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        let cancel = self.cancel.clone();
        self.cancel = Arc::new(move |cause: Cause| {
            token.cancel();
            cancel(cause)
        });
        self
    }

    /// Recognises the host's own cancellation signal in addition to [`Cancelled`], which the
    /// bridge always treats as cancellation.
    pub fn with_cancellation_predicate(
        mut self,
        is_cancellation: impl Fn(&(dyn Error + 'static)) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.is_cancellation = Arc::new(is_cancellation);
        self
    }
}

impl Default for HostChannels {
    fn default() -> Self {
        Self::tracing()
    }
}

impl fmt::Debug for HostChannels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostChannels").finish_non_exhaustive()
    }
}

/// Which class, if any, the engine is currently working on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ClassContext {
    #[default]
    Idle,
    Reading(String),
    Writing(String),
}

impl ClassContext {
    pub fn class_name(&self) -> Option<&str> {
        match self {
            ClassContext::Idle => None,
            ClassContext::Reading(name) | ClassContext::Writing(name) => Some(name),
        }
    }
}

/// How a reported cause is handled, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CauseClass {
    AlreadyFatal,
    Cancellation,
    Interruption,
    BySeverity,
}

fn is_interruption(cause: &(dyn Error + 'static)) -> bool {
    cause.is::<Interrupted>()
        || cause
            .downcast_ref::<std::io::Error>()
            .is_some_and(|err| err.kind() == std::io::ErrorKind::Interrupted)
}

/// [`DecompilerLogger`] that re-emits engine diagnostics on [`HostChannels`].
///
/// One instance serves exactly one run on one thread.
#[derive(Debug)]
pub struct DiagnosticsBridge {
    channels: HostChannels,
    context: ClassContext,
}

impl DiagnosticsBridge {
    pub fn new(channels: HostChannels) -> Self {
        Self {
            channels,
            context: ClassContext::Idle,
        }
    }

    pub fn context(&self) -> &ClassContext {
        &self.context
    }

    pub fn classify(&self, cause: &(dyn Error + 'static)) -> CauseClass {
        if cause.is::<InternalFailure>() {
            CauseClass::AlreadyFatal
        } else if cause.is::<Cancelled>() || (self.channels.is_cancellation)(cause) {
            CauseClass::Cancellation
        } else if is_interruption(cause) {
            CauseClass::Interruption
        } else {
            CauseClass::BySeverity
        }
    }

    fn decorate(&self, message: &str) -> String {
        match self.context.class_name() {
            Some(class_name) => format!("{message}[{class_name}]"),
            None => message.to_owned(),
        }
    }

    fn trace(&self, text: &str) {
        (self.channels.debug)(text, None);
    }

    fn leave(&mut self, expected: fn(&ClassContext) -> bool, phase: &str) {
        if !expected(&self.context) {
            tracing::trace!(
                target: LOG_TARGET,
                context = ?self.context,
                "unbalanced end of {phase}"
            );
        }
        self.context = ClassContext::Idle;
    }
}

impl DecompilerLogger for DiagnosticsBridge {
    fn write_message(&mut self, message: &str, severity: Severity) {
        let text = self.decorate(message);
        match severity {
            Severity::Error => (self.channels.error)(&text),
            Severity::Warn => (self.channels.warn)(&text, None),
            Severity::Info => (self.channels.info)(&text, None),
            Severity::Trace => (self.channels.debug)(&text, None),
        }
    }

    fn write_message_with_cause(
        &mut self,
        message: &str,
        severity: Severity,
        cause: Cause,
    ) -> Result<(), Cause> {
        match self.classify(&*cause) {
            CauseClass::AlreadyFatal | CauseClass::Cancellation => Err(cause),
            CauseClass::Interruption => Err((self.channels.cancel)(cause)),
            CauseClass::BySeverity => {
                let text = self.decorate(message);
                match severity {
                    Severity::Error => Err(Box::new(InternalFailure::new(text, cause))),
                    Severity::Warn => {
                        (self.channels.warn)(&text, Some(&cause));
                        Ok(())
                    }
                    Severity::Info => {
                        (self.channels.info)(&text, Some(&cause));
                        Ok(())
                    }
                    Severity::Trace => {
                        (self.channels.debug)(&text, Some(&cause));
                        Ok(())
                    }
                }
            }
        }
    }

    fn start_reading_class(&mut self, class_name: &str) {
        self.trace(&format!("decompiling class {class_name}"));
        self.context = ClassContext::Reading(class_name.to_owned());
    }

    fn end_reading_class(&mut self) {
        self.trace("... class decompiled");
        self.leave(|ctx| matches!(ctx, ClassContext::Reading(_)), "class read");
    }

    fn start_method(&mut self, method_name: &str) {
        self.trace(&format!("processing method {method_name}"));
    }

    fn end_method(&mut self) {
        self.trace("... method processed");
    }

    fn start_write_class(&mut self, class_name: &str) {
        self.trace(&format!("writing class {class_name}"));
        self.context = ClassContext::Writing(class_name.to_owned());
    }

    fn end_write_class(&mut self) {
        self.trace("... class written");
        self.leave(|ctx| matches!(ctx, ClassContext::Writing(_)), "class write");
    }
}
