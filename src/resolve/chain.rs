use crate::error::ProviderError;
use crate::model::NormalizedResult;
use std::future::Future;
use std::pin::Pin;

type AttemptFuture<'a> =
    Pin<Box<dyn Future<Output = Result<NormalizedResult, ProviderError>> + Send + 'a>>;

/// One lookup attempt in a fallback chain. The future is lazy; it runs
/// only if every earlier attempt raised a provider failure.
pub struct Attempt<'a> {
    pub label: &'static str,
    future: AttemptFuture<'a>,
}

/// Record of one abandoned attempt: which attempt failed and why the
/// chain moved past it.
#[derive(Debug)]
pub struct FallbackTransition {
    pub from: &'static str,
    pub error: ProviderError,
}

/// An ordered fallback chain over provider lookups, expressed as data so
/// the order and abort policy are inspectable and testable.
///
/// Only a `ProviderError` arms the next attempt. A successful negative
/// answer (`NormalizedResult::NotFound`) is terminal: the provider looked
/// and found nothing, so later attempts are never consulted.
pub struct Chain<'a> {
    attempts: Vec<Attempt<'a>>,
}

impl<'a> Chain<'a> {
    pub fn new() -> Self {
        Self {
            attempts: Vec::new(),
        }
    }

    pub fn then(
        mut self,
        label: &'static str,
        future: impl Future<Output = Result<NormalizedResult, ProviderError>> + Send + 'a,
    ) -> Self {
        self.attempts.push(Attempt {
            label,
            future: Box::pin(future),
        });
        self
    }

    /// Labels of the attempts in execution order.
    pub fn plan(&self) -> Vec<&'static str> {
        self.attempts.iter().map(|a| a.label).collect()
    }

    /// Run attempts in order. Returns the first success (which may be
    /// `NotFound`) along with every fallback transition taken; exhausting
    /// the chain yields `NotFound`.
    pub async fn run(self) -> (NormalizedResult, Vec<FallbackTransition>) {
        let mut transitions = Vec::new();
        for attempt in self.attempts {
            match attempt.future.await {
                Ok(result) => return (result, transitions),
                Err(error) => {
                    tracing::warn!(
                        attempt = attempt.label,
                        error = %error,
                        "lookup attempt failed, falling back"
                    );
                    transitions.push(FallbackTransition {
                        from: attempt.label,
                        error,
                    });
                }
            }
        }
        (NormalizedResult::NotFound, transitions)
    }
}
