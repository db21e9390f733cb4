use crate::error::ProviderError;
use crate::model::{Series, Work};
use async_trait::async_trait;

/// Contract for an upstream story metadata service.
///
/// `Ok(None)` (or an empty search result) is the provider's legitimate
/// negative answer: it successfully looked and found nothing. `Err` is a
/// provider failure and is what arms the next attempt in a fallback chain.
/// Default bodies reject the operation; providers implement what their
/// service supports.
#[async_trait]
pub trait StoryProvider: Send + Sync {
    /// Short provider name used in logs and error values.
    fn name(&self) -> &'static str;

    async fn get_by_id(&self, _id: u64) -> Result<Option<Work>, ProviderError> {
        Err(ProviderError::Unsupported {
            provider: self.name(),
            operation: "get_by_id",
        })
    }

    async fn get_series(&self, _id: u64) -> Result<Option<Series>, ProviderError> {
        Err(ProviderError::Unsupported {
            provider: self.name(),
            operation: "get_series",
        })
    }

    /// Title search; ranking is entirely the provider's. Possibly empty.
    async fn search_by_title(
        &self,
        _text: &str,
        _limit: u32,
    ) -> Result<Vec<Work>, ProviderError> {
        Err(ProviderError::Unsupported {
            provider: self.name(),
            operation: "search_by_title",
        })
    }

    async fn get_by_url(&self, _url: &str) -> Result<Option<Work>, ProviderError> {
        Err(ProviderError::Unsupported {
            provider: self.name(),
            operation: "get_by_url",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Bare;

    #[async_trait]
    impl StoryProvider for Bare {
        fn name(&self) -> &'static str {
            "bare"
        }
    }

    #[tokio::test]
    async fn default_operations_are_unsupported() {
        let provider = Bare;
        let err = provider.get_by_id(1).await.unwrap_err();
        assert!(matches!(err, ProviderError::Unsupported { .. }));
        assert_eq!(err.provider(), "bare");

        let err = provider.get_by_url("https://example.com").await.unwrap_err();
        assert!(err.to_string().contains("get_by_url"));
    }
}
