//! Shared application state injected into every handler.

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::application::services::{
    AccountService, AnalyticsTracker, LinkService, ResolutionService,
};
use crate::config::Config;
use crate::domain::identity::IdentityProvider;
use crate::domain::store::KeyValueStore;
use crate::domain::visit_event::VisitEvent;
use crate::infrastructure::identity::JwtIdentityProvider;
use crate::infrastructure::persistence::{
    KvAccountRepository, KvRecordRepository, KvStatsRepository,
};
use crate::utils::client_ip::VisitorFingerprinter;
use crate::utils::key_codec::KeyCodec;

/// Services and settings shared by all request handlers.
///
/// Cloning is cheap: every service sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub link_service: Arc<LinkService<KvRecordRepository>>,
    pub resolution_service: Arc<ResolutionService<KvRecordRepository>>,
    pub analytics: Arc<AnalyticsTracker<KvStatsRepository>>,
    pub account_service: Arc<AccountService<KvAccountRepository>>,
    pub identity: Arc<dyn IdentityProvider>,
    pub store: Arc<dyn KeyValueStore>,
    pub visit_sender: mpsc::Sender<VisitEvent>,
    pub fingerprinter: VisitorFingerprinter,
    pub base_url: String,
    pub require_auth: bool,
    pub behind_proxy: bool,
}

impl AppState {
    /// Wires repositories and services over `store`.
    ///
    /// Returns the receiving end of the visit queue, which the caller hands to
    /// [`crate::application::visit_worker::run_visit_worker`].
    pub fn build(
        store: Arc<dyn KeyValueStore>,
        config: &Config,
    ) -> (Self, mpsc::Receiver<VisitEvent>) {
        let (visit_sender, visit_rx) = mpsc::channel(config.visit_queue_capacity);

        let records = Arc::new(KvRecordRepository::new(store.clone()));
        let stats = Arc::new(KvStatsRepository::new(store.clone()));
        let accounts = Arc::new(KvAccountRepository::new(store.clone()));

        let identity: Arc<dyn IdentityProvider> = Arc::new(JwtIdentityProvider::new(
            &config.jwt_secret,
            config.token_ttl_hours,
        ));

        let state = Self {
            link_service: Arc::new(LinkService::new(
                records.clone(),
                KeyCodec::new(config.short_key_length),
                config.key_allocation_attempts,
            )),
            resolution_service: Arc::new(ResolutionService::new(records, visit_sender.clone())),
            analytics: Arc::new(AnalyticsTracker::new(stats)),
            account_service: Arc::new(AccountService::new(accounts, identity.clone())),
            identity,
            store,
            visit_sender,
            fingerprinter: VisitorFingerprinter::new(config.visitor_hash_secret.as_deref()),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            require_auth: config.require_auth,
            behind_proxy: config.behind_proxy,
        };

        (state, visit_rx)
    }
}
