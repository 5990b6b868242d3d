//! Test doubles and common utilities for engine contract tests
//!
//! Every double appends to one shared call log so tests can assert both
//! which collaborators were called and in what order.

#![allow(dead_code)]

use ddsync_core::error::{Error, Result};
use ddsync_core::traits::{
    DnsProvider, DnsResolver, IpDetector, NotificationManager, Notifier, ResolveError,
    WebhookExecutor,
};
use ddsync_core::{Collaborators, Domain, EngineEvent, IpType, Settings, SyncEngine};
use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Shared, ordered record of collaborator calls
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn ip(s: &str) -> IpAddr {
    s.parse().expect("valid IP literal")
}

/// An IpDetector whose answer the test can change between passes
#[derive(Clone)]
pub struct MockDetector {
    answer: Arc<Mutex<Option<IpAddr>>>,
    calls: Arc<AtomicUsize>,
}

impl MockDetector {
    pub fn new(initial: IpAddr) -> Self {
        Self {
            answer: Arc::new(Mutex::new(Some(initial))),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Answer with `ip` from now on
    pub fn set_ip(&self, ip: IpAddr) {
        *self.answer.lock().unwrap() = Some(ip);
    }

    /// Fail every detection from now on
    pub fn fail(&self) {
        *self.answer.lock().unwrap() = None;
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpDetector for MockDetector {
    async fn detect(&self) -> Result<IpAddr> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let answer = *self.answer.lock().unwrap();
        answer.ok_or_else(|| Error::ip_detector("lookup service unreachable"))
    }

    fn detector_name(&self) -> &'static str {
        "mock"
    }
}

/// A DnsResolver backed by a hostname table
///
/// Hostnames absent from the table resolve to `NxDomain`.
#[derive(Clone)]
pub struct MockResolver {
    records: Arc<Mutex<HashMap<String, std::result::Result<IpAddr, ResolveError>>>>,
    log: CallLog,
}

impl MockResolver {
    pub fn new(log: CallLog) -> Self {
        Self {
            records: Arc::new(Mutex::new(HashMap::new())),
            log,
        }
    }

    pub fn publish(&self, hostname: &str, ip: IpAddr) {
        self.records
            .lock()
            .unwrap()
            .insert(hostname.to_string(), Ok(ip));
    }

    pub fn fail_with(&self, hostname: &str, error: ResolveError) {
        self.records
            .lock()
            .unwrap()
            .insert(hostname.to_string(), Err(error));
    }
}

#[async_trait::async_trait]
impl DnsResolver for MockResolver {
    async fn resolve(
        &self,
        hostname: &str,
        _ip_type: IpType,
    ) -> std::result::Result<IpAddr, ResolveError> {
        self.log.lock().unwrap().push(format!("resolve {}", hostname));
        self.records
            .lock()
            .unwrap()
            .get(hostname)
            .cloned()
            .unwrap_or(Err(ResolveError::NxDomain))
    }
}

/// A DnsProvider that records writes and can be told to fail per record
#[derive(Clone)]
pub struct MockProvider {
    failing: Arc<Mutex<HashSet<String>>>,
    log: CallLog,
}

impl MockProvider {
    pub fn new(log: CallLog) -> Self {
        Self {
            failing: Arc::new(Mutex::new(HashSet::new())),
            log,
        }
    }

    /// Fail writes for `sub_domain` under `domain_name`
    pub fn fail_on(&self, domain_name: &str, sub_domain: &str) {
        self.failing
            .lock()
            .unwrap()
            .insert(format!("{}/{}", domain_name, sub_domain));
    }

    pub fn heal(&self) {
        self.failing.lock().unwrap().clear();
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockProvider {
    async fn update_record(&self, domain_name: &str, sub_domain: &str, new_ip: IpAddr) -> Result<()> {
        let key = format!("{}/{}", domain_name, sub_domain);
        self.log
            .lock()
            .unwrap()
            .push(format!("update {} {}", key, new_ip));

        if self.failing.lock().unwrap().contains(&key) {
            return Err(Error::provider("mock", format!("write rejected for {}", key)));
        }
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// A WebhookExecutor that records calls
#[derive(Clone)]
pub struct MockWebhook {
    fail: Arc<Mutex<bool>>,
    log: CallLog,
}

impl MockWebhook {
    pub fn new(log: CallLog) -> Self {
        Self {
            fail: Arc::new(Mutex::new(false)),
            log,
        }
    }

    pub fn fail(&self) {
        *self.fail.lock().unwrap() = true;
    }
}

#[async_trait::async_trait]
impl WebhookExecutor for MockWebhook {
    async fn execute(&self, hostname: &str, new_ip: IpAddr, previous_ip: Option<IpAddr>) -> Result<()> {
        let previous = previous_ip.map(|ip| ip.to_string()).unwrap_or_else(|| "-".to_string());
        self.log
            .lock()
            .unwrap()
            .push(format!("webhook {} {} {}", hostname, new_ip, previous));

        if *self.fail.lock().unwrap() {
            return Err(Error::webhook("hook endpoint returned 500"));
        }
        Ok(())
    }
}

/// A Notifier that records messages
#[derive(Clone)]
pub struct RecordingNotifier {
    log: CallLog,
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, message: &str, ip: IpAddr) -> Result<()> {
        self.log
            .lock()
            .unwrap()
            .push(format!("notify {} {}", message, ip));
        Ok(())
    }

    fn channel_name(&self) -> &'static str {
        "recording"
    }
}

/// All doubles wired to one call log
pub struct Harness {
    pub detector: MockDetector,
    pub resolver: MockResolver,
    pub provider: MockProvider,
    pub webhook: MockWebhook,
    pub notifier: RecordingNotifier,
    pub log: CallLog,
}

impl Harness {
    pub fn new(initial_ip: IpAddr) -> Self {
        let log: CallLog = Arc::new(Mutex::new(Vec::new()));
        Self {
            detector: MockDetector::new(initial_ip),
            resolver: MockResolver::new(Arc::clone(&log)),
            provider: MockProvider::new(Arc::clone(&log)),
            webhook: MockWebhook::new(Arc::clone(&log)),
            notifier: RecordingNotifier {
                log: Arc::clone(&log),
            },
            log,
        }
    }

    /// Build an engine sharing this harness's doubles
    pub fn engine(&self, settings: Settings) -> (SyncEngine, mpsc::Receiver<EngineEvent>) {
        let collaborators = Collaborators {
            ip_detector: Box::new(self.detector.clone()),
            resolver: Box::new(self.resolver.clone()),
            provider: Box::new(self.provider.clone()),
            webhook: settings
                .webhook
                .enabled
                .then(|| Box::new(self.webhook.clone()) as Box<dyn WebhookExecutor>),
            notifications: NotificationManager::new()
                .with_notifier(Box::new(self.notifier.clone())),
        };

        SyncEngine::new(collaborators, settings).expect("engine construction succeeds")
    }

    /// Every call so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    /// Calls whose description starts with `prefix`
    pub fn calls_starting_with(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with(prefix))
            .collect()
    }

    pub fn clear_calls(&self) {
        self.log.lock().unwrap().clear();
    }
}

/// Daemon-mode settings for the given domains
pub fn daemon_settings(domains: Vec<Domain>) -> Settings {
    let mut settings = Settings::new(domains);
    settings.interval_secs = 60;
    settings
}

/// Run-once settings for the given domains
pub fn run_once_settings(domains: Vec<Domain>) -> Settings {
    let mut settings = daemon_settings(domains);
    settings.run_once = true;
    settings
}

/// Enable the webhook on `settings`
pub fn with_webhook(mut settings: Settings) -> Settings {
    settings.webhook.enabled = true;
    settings.webhook.url = "https://hooks.example.net/ddns".to_string();
    settings
}

/// Drain every event currently buffered on the channel
pub fn drain_events(rx: &mut mpsc::Receiver<EngineEvent>) -> Vec<EngineEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
