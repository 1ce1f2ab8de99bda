//! Field permissions.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::context::Context;
use crate::resolver::ResolverInfo;

/// Message used when a permission does not provide its own.
pub const DEFAULT_PERMISSION_MESSAGE: &str = "User is not authorized";

/// A check run before a field resolves.
///
/// When any permission of a field denies access the resolver is skipped,
/// the field resolves to null and the permission's message is reported.
#[async_trait]
pub trait Permission: Send + Sync {
    /// Returns true if the field may resolve for `source`.
    async fn has_permission(&self, source: &Value, info: &ResolverInfo, ctx: &Context) -> bool;

    /// Error message reported on denial.
    fn message(&self) -> &str {
        DEFAULT_PERMISSION_MESSAGE
    }
}

/// A shared permission.
pub type BoxedPermission = Arc<dyn Permission>;

/// Adapts a synchronous closure into a [`Permission`].
pub struct FnPermission<F> {
    check: F,
    message: Option<String>,
}

impl<F> FnPermission<F>
where
    F: Fn(&Value, &ResolverInfo, &Context) -> bool + Send + Sync,
{
    /// Creates a new permission from `check`.
    pub fn new(check: F) -> Self {
        Self {
            check,
            message: None,
        }
    }

    /// Sets the denial message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

#[async_trait]
impl<F> Permission for FnPermission<F>
where
    F: Fn(&Value, &ResolverInfo, &Context) -> bool + Send + Sync,
{
    async fn has_permission(&self, source: &Value, info: &ResolverInfo, ctx: &Context) -> bool {
        (self.check)(source, info, ctx)
    }

    fn message(&self) -> &str {
        self.message.as_deref().unwrap_or(DEFAULT_PERMISSION_MESSAGE)
    }
}
