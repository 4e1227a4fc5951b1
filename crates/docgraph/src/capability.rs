//! Optional capabilities a compiled type may provide.
//!
//! `expand_out` checks for these instead of probing for named methods.
//! Both are implemented for plain closures taking `&Instance`.

use async_trait::async_trait;
use docgraph_core::Document;

use crate::model::Instance;

/// Produces a reduced projection used when the type is expanded as a
/// reference of another type.
#[async_trait]
pub trait Lightweight: Send + Sync {
    /// Build the lightweight projection of `instance`.
    async fn lightweight(&self, instance: &Instance) -> Document;
}

/// Produces the base projection of `expand_out`, before references are
/// expanded.
#[async_trait]
pub trait Sanitize: Send + Sync {
    /// Build the sanitized projection of `instance`.
    async fn sanitize(&self, instance: &Instance) -> Document;
}

#[async_trait]
impl<F> Lightweight for F
where
    F: Fn(&Instance) -> Document + Send + Sync,
{
    async fn lightweight(&self, instance: &Instance) -> Document {
        self(instance)
    }
}

#[async_trait]
impl<F> Sanitize for F
where
    F: Fn(&Instance) -> Document + Send + Sync,
{
    async fn sanitize(&self, instance: &Instance) -> Document {
        self(instance)
    }
}
