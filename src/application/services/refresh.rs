//! Periodic token and subscription refresh

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::application::errors::BotError;
use crate::domain::traits::{Controller, NotificationSource};
use super::SubscriptionTable;

/// Keeps the controller session and its subscriptions alive.
///
/// Both actions are best effort: a failed tick is logged and retried at the
/// next one.
pub struct RefreshLoop {
    controller: Arc<dyn Controller>,
    transport: Arc<dyn NotificationSource>,
    subscriptions: Arc<SubscriptionTable>,
    token_period: Duration,
    subscription_period: Duration,
}

impl RefreshLoop {
    pub fn new(
        controller: Arc<dyn Controller>,
        transport: Arc<dyn NotificationSource>,
        subscriptions: Arc<SubscriptionTable>,
        token_period: Duration,
        subscription_period: Duration,
    ) -> Self {
        Self {
            controller,
            transport,
            subscriptions,
            token_period,
            subscription_period,
        }
    }

    /// Log in again and redial the notification transport with the new token
    pub async fn refresh_token(&self) -> Result<(), BotError> {
        self.controller.login().await?;
        self.transport.connect(&self.controller.token()).await?;
        tracing::info!("Controller token refreshed");
        Ok(())
    }

    /// Refresh every active subscription, returning how many succeeded
    pub async fn refresh_subscriptions(&self) -> usize {
        let active = self.subscriptions.active_subscriptions();
        let mut refreshed = 0;
        for (class, id) in &active {
            match self.controller.refresh_subscription(id).await {
                Ok(()) => refreshed += 1,
                Err(e) => tracing::warn!("Could not refresh subscription {} ({}): {}", id, class, e),
            }
        }
        tracing::debug!("Refreshed {}/{} subscriptions", refreshed, active.len());
        refreshed
    }

    /// Run both timers until `cancel` fires
    pub async fn run(self, cancel: CancellationToken) {
        let mut token_tick = interval_at(Instant::now() + self.token_period, self.token_period);
        token_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut subscription_tick = interval_at(
            Instant::now() + self.subscription_period,
            self.subscription_period,
        );
        subscription_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            "Refresh loop started (token every {:?}, subscriptions every {:?})",
            self.token_period,
            self.subscription_period
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = token_tick.tick() => {
                    if let Err(e) = self.refresh_token().await {
                        tracing::warn!("Token refresh failed: {}", e);
                    }
                }
                _ = subscription_tick.tick() => {
                    self.refresh_subscriptions().await;
                }
            }
        }

        tracing::info!("Refresh loop stopped");
    }
}
