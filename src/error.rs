use std::backtrace::Backtrace;

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// The single recoverable error of the propagation core.
///
/// Raised whenever a requested domain restriction (either direct, through
/// the store's mutation surface, or derived by an arc during propagation)
/// would leave some domain with no values. The graph is inconsistent from
/// that point on; the only valid next step is a choicepoint pop (or a full
/// state restore).
///
/// Retry is never attempted inside the core. Trying the next value or
/// branch is the search layer's job, implemented by catching this failure,
/// popping the choicepoint stack, and choosing an alternative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("propagation failure: a domain restriction would leave no values")]
pub struct PropagationFailure;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Inconsistent: {inner}\n{backtrace}")]
    Inconsistent {
        inner: PropagationFailure,
        backtrace: Box<Backtrace>,
    },
}

impl From<PropagationFailure> for Error {
    fn from(inner: PropagationFailure) -> Self {
        Error::Inconsistent {
            inner,
            backtrace: Box::new(std::backtrace::Backtrace::capture()),
        }
    }
}
