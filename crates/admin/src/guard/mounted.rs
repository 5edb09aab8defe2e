//! A guard kept alive for the lifetime of one guarded request.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::info;

use super::{AuthGuard, Evidence, GuardDecision, GuardState, GuardSubscription};
use crate::identity::{Principal, PrincipalWatch};
use crate::session::{SessionContext, SessionReader};

struct Held {
    guard: AuthGuard,
    context: SessionContext,
    profile_complete: Option<bool>,
    redirect: Option<String>,
}

impl Held {
    fn reevaluate(&mut self, principal: Option<&Principal>) {
        let before = self.guard.state();
        let snapshot = self.context.reader().snapshot();
        let evidence = Evidence {
            session: snapshot.as_ref(),
            principal,
            profile_complete: self.profile_complete,
        };
        let decision = self.guard.on_principal_change(&evidence);

        if before == GuardState::Authenticated && self.guard.state() == GuardState::Unauthenticated
        {
            self.context.clear();
            info!("Signed out while mounted; held credentials cleared");
        }
        if let GuardDecision::Redirect(target) = decision {
            self.redirect.get_or_insert(target);
        }
    }
}

/// Guard, credentials and provider subscription of a rendered subtree.
///
/// Every principal the provider publishes re-runs the guard. Leaving
/// `Authenticated` clears the held [`SessionContext`], so readers handed
/// out by [`MountedGuard::reader`] see the sign-out at once.
pub struct MountedGuard {
    held: Arc<Mutex<Held>>,
    watch: PrincipalWatch,
    subscription: GuardSubscription,
}

impl MountedGuard {
    /// Take over `guard` and `context` after the guard decided to render.
    #[must_use]
    pub fn mount(
        guard: AuthGuard,
        context: SessionContext,
        profile_complete: Option<bool>,
        watch: &PrincipalWatch,
    ) -> Self {
        let held = Arc::new(Mutex::new(Held {
            guard,
            context,
            profile_complete,
            redirect: None,
        }));
        let subscription = {
            let held = Arc::clone(&held);
            GuardSubscription::spawn(watch.subscribe(), move |principal| {
                held.lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .reevaluate(principal.as_ref());
            })
        };
        Self {
            held,
            watch: watch.clone(),
            subscription,
        }
    }

    #[must_use]
    pub fn reader(&self) -> SessionReader {
        self.held
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .context
            .reader()
    }

    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_active()
    }

    /// Stop watching and return the redirect issued while mounted, if any.
    ///
    /// The latest published principal is evaluated once more, so a
    /// sign-out the watcher task has not picked up yet still counts.
    #[must_use]
    pub fn unmount(self) -> Option<String> {
        let Self {
            held,
            watch,
            subscription,
        } = self;
        drop(subscription);

        let mut held = held.lock().unwrap_or_else(PoisonError::into_inner);
        let principal = watch.current();
        held.reevaluate(principal.as_ref());
        held.redirect.take()
    }
}
