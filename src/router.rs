//! Script routing: pick the handler for a call, run it in its own task,
//! isolate its failures, and report completion exactly once.

use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::connection::AgiStream;
use crate::constants::DEFAULT_SCRIPT;
use crate::error::{AgiError, AgiResult};
use crate::session::{AgiSession, SessionOptions};

/// Future returned by a script handler.
pub type HandlerFuture = BoxFuture<'static, AgiResult<()>>;

/// A script handler: receives the session (and, through it, the call
/// context) and drives the call to completion.
pub type ScriptHandler = Arc<dyn Fn(AgiSession) -> HandlerFuture + Send + Sync>;

/// Wrap an async function or closure as a [`ScriptHandler`].
pub fn handler<F, Fut>(f: F) -> ScriptHandler
where
    F: Fn(AgiSession) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = AgiResult<()>> + Send + 'static,
{
    Arc::new(move |session| f(session).boxed())
}

/// Handler configuration: one catch-all script, or a name-keyed set with a
/// reserved `default` entry.
#[derive(Clone)]
pub enum HandlerSet {
    /// Every call goes to this handler.
    Single(ScriptHandler),
    /// Calls are routed by requested script name; `default` catches the rest.
    Named(HashMap<String, ScriptHandler>),
}

/// Terminal and progress lifecycle signals for one call.
///
/// Exactly one of `Completed`/`Failed` fires per call.
#[derive(Debug)]
#[non_exhaustive]
pub enum CallLifecycle {
    /// Handshake parsed; the call exists.
    Started {
        channel: Option<String>,
        script: Option<String>,
    },
    /// The handler returned normally.
    Completed { channel: Option<String> },
    /// The handler failed or a session/router-level fatal condition occurred.
    Failed {
        channel: Option<String>,
        error: AgiError,
    },
}

/// Routes accepted calls to script handlers.
///
/// The handler mapping is resolved once at construction and read-only
/// afterwards; concurrent calls share nothing else. Each call runs in its own
/// spawned task, so dispatching the next call never waits on a handler.
pub struct Router {
    handlers: HashMap<String, ScriptHandler>,
    options: SessionOptions,
    lifecycle: Option<mpsc::Sender<CallLifecycle>>,
}

impl Router {
    /// Build a router, resolving the handler set into a uniform lookup.
    pub fn new(set: HandlerSet) -> Self {
        let handlers = match set {
            HandlerSet::Single(h) => {
                let mut map = HashMap::new();
                map.insert(DEFAULT_SCRIPT.to_string(), h);
                map
            }
            HandlerSet::Named(map) => map,
        };

        Self {
            handlers,
            options: SessionOptions::default(),
            lifecycle: None,
        }
    }

    /// Shorthand for a single catch-all handler.
    pub fn single(h: ScriptHandler) -> Self {
        Self::new(HandlerSet::Single(h))
    }

    /// Shorthand for a name-keyed handler map.
    pub fn named(map: HashMap<String, ScriptHandler>) -> Self {
        Self::new(HandlerSet::Named(map))
    }

    /// Session options applied to every dispatched call.
    pub fn with_options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    /// Receive [`CallLifecycle`] signals on `tx`. Without this, lifecycle is
    /// only visible through tracing.
    pub fn with_lifecycle(mut self, tx: mpsc::Sender<CallLifecycle>) -> Self {
        self.lifecycle = Some(tx);
        self
    }

    /// Select the handler for a requested script name.
    ///
    /// The requested name wins if present in the map; otherwise the `default`
    /// entry; otherwise the call is rejected with [`AgiError::NoScript`]
    /// before any command is ever sent.
    pub fn resolve(&self, script: Option<&str>) -> AgiResult<&ScriptHandler> {
        if let Some(name) = script {
            if let Some(h) = self.handlers.get(name) {
                return Ok(h);
            }
        }
        self.handlers
            .get(DEFAULT_SCRIPT)
            .ok_or_else(|| AgiError::NoScript {
                script: script.map(|s| s.to_string()),
            })
    }

    /// Serve one accepted call on its own task and return immediately.
    ///
    /// The task reads the handshake, selects the handler, and runs it to
    /// completion. Handler errors and panics are contained to the call.
    pub fn dispatch(self: &Arc<Self>, stream: impl AgiStream + 'static) -> JoinHandle<()> {
        let router = Arc::clone(self);
        tokio::spawn(async move { router.run_call(stream).await })
    }

    async fn run_call(&self, stream: impl AgiStream + 'static) {
        let session =
            match AgiSession::negotiate_with_options(stream, self.options.clone()).await {
                Ok(session) => session,
                Err(error) => {
                    warn!(error = %error, "call setup failed before handshake completed");
                    self.signal(CallLifecycle::Failed {
                        channel: None,
                        error,
                    })
                    .await;
                    return;
                }
            };

        let channel = session.request().channel().map(|s| s.to_string());
        let script = session.request().network_script().map(|s| s.to_string());

        self.signal(CallLifecycle::Started {
            channel: channel.clone(),
            script: script.clone(),
        })
        .await;

        let handler = match self.resolve(script.as_deref()) {
            Ok(h) => Arc::clone(h),
            Err(error) => {
                warn!(
                    script = script.as_deref().unwrap_or(""),
                    "no handler for call, rejecting"
                );
                self.signal(CallLifecycle::Failed { channel, error }).await;
                return;
            }
        };

        debug!(
            channel = channel.as_deref().unwrap_or("?"),
            script = script.as_deref().unwrap_or(DEFAULT_SCRIPT),
            "invoking script handler"
        );

        match AssertUnwindSafe(handler(session)).catch_unwind().await {
            Ok(Ok(())) => {
                info!(channel = channel.as_deref().unwrap_or("?"), "call completed");
                self.signal(CallLifecycle::Completed { channel }).await;
            }
            Ok(Err(error)) => {
                warn!(
                    channel = channel.as_deref().unwrap_or("?"),
                    error = %error,
                    "call failed"
                );
                self.signal(CallLifecycle::Failed { channel, error }).await;
            }
            Err(_) => {
                error!(
                    channel = channel.as_deref().unwrap_or("?"),
                    "script handler panicked"
                );
                self.signal(CallLifecycle::Failed {
                    channel,
                    error: AgiError::script("handler panicked"),
                })
                .await;
            }
        }
    }

    async fn signal(&self, event: CallLifecycle) {
        if let Some(tx) = &self.lifecycle {
            // A closed or full receiver must not take the call down with it.
            let _ = tx.send(event).await;
        }
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("scripts", &self.handlers.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop_handler() -> ScriptHandler {
        handler(|_session| async { Ok(()) })
    }

    #[test]
    fn single_resolves_everything_to_default() {
        let router = Router::single(noop_handler());
        assert!(router.resolve(Some("sales")).is_ok());
        assert!(router.resolve(None).is_ok());
    }

    #[test]
    fn named_prefers_exact_match_then_default() {
        let mut map = HashMap::new();
        map.insert("sales".to_string(), noop_handler());
        map.insert(DEFAULT_SCRIPT.to_string(), noop_handler());
        let router = Router::named(map);

        assert!(router.resolve(Some("sales")).is_ok());
        assert!(router.resolve(Some("support")).is_ok());
        assert!(router.resolve(None).is_ok());
    }

    #[test]
    fn named_without_default_rejects_unknown_scripts() {
        let mut map = HashMap::new();
        map.insert("sales".to_string(), noop_handler());
        let router = Router::named(map);

        assert!(router.resolve(Some("sales")).is_ok());

        let err = router.resolve(Some("support")).err().unwrap();
        assert!(
            matches!(err, AgiError::NoScript { script: Some(ref s) } if s == "support")
        );

        let err = router.resolve(None).err().unwrap();
        assert!(matches!(err, AgiError::NoScript { script: None }));
    }
}
