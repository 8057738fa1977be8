//! Scripted departures provider for testing without API access.
//!
//! Each selector gets a queue of canned responses; the last entry repeats
//! once the queue drains, so a 30-second poll loop keeps getting answers.
//! Responses may carry a delay to simulate a slow network under
//! `tokio::time::pause`.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::board::Selector;

use super::error::UpstreamError;
use super::types::{DepartureTime, NetworkGroup, RouteGroup};
use super::DeparturesProvider;

/// One scripted response.
#[derive(Debug, Clone)]
struct MockResponse {
    delay: Duration,
    result: Result<Vec<NetworkGroup>, MockFailure>,
}

/// Cloneable stand-in for an upstream failure.
#[derive(Debug, Clone)]
struct MockFailure {
    status: u16,
    message: String,
}

#[derive(Default)]
struct MockInner {
    scripts: HashMap<Selector, VecDeque<MockResponse>>,
    calls: Vec<Selector>,
}

/// Scripted in-memory [`DeparturesProvider`].
#[derive(Clone, Default)]
pub struct MockUpstream {
    inner: Arc<Mutex<MockInner>>,
}

impl MockUpstream {
    /// Create an empty mock. Unscripted selectors answer with a 404 error.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful snapshot for a selector.
    pub fn enqueue_ok(&self, selector: &Selector, snapshot: Vec<NetworkGroup>) {
        self.enqueue(selector, Duration::ZERO, Ok(snapshot));
    }

    /// Queue a successful snapshot that takes `delay` to arrive.
    pub fn enqueue_ok_after(&self, selector: &Selector, delay: Duration, snapshot: Vec<NetworkGroup>) {
        self.enqueue(selector, delay, Ok(snapshot));
    }

    /// Queue a failure for a selector.
    pub fn enqueue_err(&self, selector: &Selector, status: u16, message: &str) {
        self.enqueue(
            selector,
            Duration::ZERO,
            Err(MockFailure {
                status,
                message: message.to_string(),
            }),
        );
    }

    fn enqueue(
        &self,
        selector: &Selector,
        delay: Duration,
        result: Result<Vec<NetworkGroup>, MockFailure>,
    ) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .scripts
            .entry(selector.clone())
            .or_default()
            .push_back(MockResponse { delay, result });
    }

    /// Number of fetches issued so far, across all selectors.
    pub fn call_count(&self) -> usize {
        self.inner.lock().unwrap().calls.len()
    }

    /// Selectors fetched so far, in call order.
    pub fn calls(&self) -> Vec<Selector> {
        self.inner.lock().unwrap().calls.clone()
    }
}

impl DeparturesProvider for MockUpstream {
    async fn departures(&self, selector: &Selector) -> Result<Vec<NetworkGroup>, UpstreamError> {
        let response = {
            let mut inner = self.inner.lock().unwrap();
            inner.calls.push(selector.clone());

            let queue = inner.scripts.get_mut(selector);
            match queue {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                // Keep the last scripted response around for repeat polls.
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        let Some(response) = response else {
            return Err(UpstreamError::Api {
                status: 404,
                message: format!("no script for selector {selector}"),
            });
        };

        if !response.delay.is_zero() {
            tokio::time::sleep(response.delay).await;
        }

        response.result.map_err(|f| UpstreamError::Api {
            status: f.status,
            message: f.message,
        })
    }
}

/// Build a single-departure route group for tests.
pub fn route_group(route: &str, headsign: &str, countdowns: &[f64]) -> RouteGroup {
    RouteGroup {
        route_number: route.to_string(),
        branch_code: String::new(),
        headsign: headsign.to_string(),
        platform: "A".to_string(),
        route_color: "0074c8".to_string(),
        route_text_color: "ffffff".to_string(),
        route_network: "GRT".to_string(),
        stop_code: "02799".to_string(),
        departures: countdowns
            .iter()
            .map(|&countdown| DepartureTime {
                time: "14:32".to_string(),
                countdown,
            })
            .collect(),
    }
}

/// Build a one-route network group for tests.
pub fn network_group(network: &str, routes: Vec<RouteGroup>) -> NetworkGroup {
    NetworkGroup {
        network: network.to_string(),
        route_groups: routes,
    }
}
