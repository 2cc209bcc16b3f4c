//! Lookup table of AS chains by resumption token
//!
//! When a request is dispatched to an external application server, the
//! route path it travels carries an opaque token; when the server sends
//! the request back, the token identifies which chain to resume and where.
//! This table maps each token to the position after the step that issued
//! it: the 0th token indicates the 1st step, the 1st token the 2nd step,
//! and so on.
//!
//! One lock serializes registration, unregistration and lookup.  The table
//! holds a single owning handle per chain - the collective reference for
//! that chain's whole token set - while the token entries themselves are
//! weak positional views.  A lookup upgrades its view inside the critical
//! section, so a hit always yields a live chain and a chain being torn
//! down is either still fully visible or already gone.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::debug;
use uuid::Uuid;

use crate::aschain::{AsChain, AsChainLink, TrailId};
use crate::error::{ChainError, Result};
use crate::ifc::Ifcs;
use crate::session_case::SessionCase;

/// Length of generated resumption tokens
const TOKEN_LENGTH: usize = 10;

/// Candidates drawn per token before declaring the entropy source broken
const TOKEN_ATTEMPTS: u32 = 8;

struct TokenEntry {
    chain: Weak<AsChain>,
    index: usize,
}

#[derive(Default)]
struct TableInner {
    /// Map from token to the position it resumes at
    tokens: HashMap<String, TokenEntry>,
    /// The collective owning reference for each registered chain
    chains: HashMap<Uuid, Arc<AsChain>>,
}

impl TableInner {
    /// Draw `count` fresh tokens, distinct from each other and from every
    /// registered token.
    fn allocate_tokens(&self, count: usize) -> Result<Vec<String>> {
        let mut tokens: Vec<String> = Vec::with_capacity(count);
        for _ in 0..count {
            let mut attempts = 0;
            let token = loop {
                if attempts == TOKEN_ATTEMPTS {
                    return Err(ChainError::TokenSpaceExhausted {
                        attempts: TOKEN_ATTEMPTS,
                    });
                }
                attempts += 1;
                let candidate: String = rand::thread_rng()
                    .sample_iter(&Alphanumeric)
                    .take(TOKEN_LENGTH)
                    .map(char::from)
                    .collect();
                if !self.tokens.contains_key(&candidate) && !tokens.contains(&candidate) {
                    break candidate;
                }
            };
            tokens.push(token);
        }
        Ok(tokens)
    }
}

/// Process-wide table of live AS chains, indexed by resumption token
pub struct AsChainTable {
    inner: Mutex<TableInner>,
}

impl AsChainTable {
    /// Create an empty table
    pub fn new() -> Self {
        AsChainTable {
            inner: Mutex::new(TableInner::default()),
        }
    }

    /// Create a chain, generate its tokens, and register them to point at
    /// the next step in each case.  The whole operation is one critical
    /// section.
    pub(crate) fn register(
        table: &Arc<Self>,
        session_case: SessionCase,
        served_user: String,
        is_registered: bool,
        trail: TrailId,
        ifcs: Ifcs,
    ) -> Result<Arc<AsChain>> {
        let mut inner = table.inner.lock();
        let tokens = inner.allocate_tokens(ifcs.len())?;
        let chain = Arc::new(AsChain::new(
            Arc::downgrade(table),
            session_case,
            served_user,
            is_registered,
            trail,
            ifcs,
            tokens,
        ));
        debug!(
            "Creating AsChain {} and adding {} tokens to table",
            chain.id().simple(),
            chain.odi_tokens().len()
        );
        for (index, token) in chain.odi_tokens().iter().enumerate() {
            inner.tokens.insert(
                token.clone(),
                TokenEntry {
                    chain: Arc::downgrade(&chain),
                    index: index + 1,
                },
            );
        }
        inner.chains.insert(chain.id(), chain.clone());
        Ok(chain)
    }

    /// Remove a chain's tokens and drop the collective reference.
    /// Tolerates tokens that are already absent.
    pub(crate) fn unregister(&self, id: Uuid, tokens: &[String]) {
        let mut inner = self.inner.lock();
        for token in tokens {
            inner.tokens.remove(token);
        }
        inner.chains.remove(&id);
    }

    /// Retrieve a link for the given resumption token.
    ///
    /// Returns an unbound link when the token is unknown (replayed,
    /// expired, or tampered with).  On a hit the returned link holds its
    /// own reference to the chain; the caller must release it when done.
    pub fn lookup(&self, token: &str) -> AsChainLink {
        let inner = self.inner.lock();
        let hit = inner
            .tokens
            .get(token)
            .and_then(|entry| entry.chain.upgrade().map(|chain| (chain, entry.index)));
        match hit {
            Some((chain, index)) => AsChainLink::bound(chain, index),
            None => {
                debug!("No chain found for token {}", token);
                AsChainLink::default()
            }
        }
    }
}
