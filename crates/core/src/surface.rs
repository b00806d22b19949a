use {async_trait::async_trait, thiserror::Error};

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("{message}")]
    Message { message: String },

    #[error("{context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl SurfaceError {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn external(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }
}

/// A rename-able chat surface (category or channel) whose display name
/// conveys the aggregate server status.
///
/// The platform rate-limits renames; the synchronizer is responsible for
/// staying under that ceiling, implementations just perform the write.
#[async_trait]
pub trait StatusSurface: Send + Sync {
    async fn rename(&self, label: &str) -> Result<(), SurfaceError>;
}
