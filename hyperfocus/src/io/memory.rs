//! In-process conversation memory keyed by user id.

use std::collections::{HashMap, VecDeque};

use tokio::sync::RwLock;
use tracing::debug;

/// One prompt/reply pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub prompt: String,
    pub reply: String,
}

/// Bounded per-user history.
///
/// Only the most recent `turns` exchanges are kept per user, and at most
/// `max_users` users are tracked. Recording for a new user beyond that evicts
/// the user whose last exchange is oldest.
#[derive(Debug)]
pub struct ConversationMemory {
    turns: usize,
    max_users: usize,
    inner: RwLock<Histories>,
}

#[derive(Debug, Default)]
struct Histories {
    users: HashMap<String, UserHistory>,
    /// Monotonic counter stamped on each recorded exchange.
    clock: u64,
}

#[derive(Debug, Default)]
struct UserHistory {
    exchanges: VecDeque<Exchange>,
    last_active: u64,
}

impl ConversationMemory {
    pub fn new(turns: usize, max_users: usize) -> Self {
        Self {
            turns,
            max_users,
            inner: RwLock::new(Histories::default()),
        }
    }

    /// Past exchanges for a user, oldest first.
    pub async fn history(&self, user_id: &str) -> Vec<Exchange> {
        self.inner
            .read()
            .await
            .users
            .get(user_id)
            .map(|history| history.exchanges.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn record(&self, user_id: &str, exchange: Exchange) {
        if self.turns == 0 || self.max_users == 0 {
            return;
        }
        let mut inner = self.inner.write().await;
        if !inner.users.contains_key(user_id) {
            while inner.users.len() >= self.max_users {
                let Some(oldest) = inner
                    .users
                    .iter()
                    .min_by_key(|(_, history)| history.last_active)
                    .map(|(id, _)| id.clone())
                else {
                    break;
                };
                debug!(user_id = %oldest, "evicting idle conversation history");
                inner.users.remove(&oldest);
            }
        }

        inner.clock += 1;
        let stamp = inner.clock;
        let history = inner.users.entry(user_id.to_string()).or_default();
        history.last_active = stamp;
        history.exchanges.push_back(exchange);
        while history.exchanges.len() > self.turns {
            history.exchanges.pop_front();
        }
    }

    pub async fn forget(&self, user_id: &str) {
        self.inner.write().await.users.remove(user_id);
    }
}
