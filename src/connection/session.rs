//! Transaction session for the stateless transactional endpoint.
//!
//! The server keeps no connection state between requests: a transaction is a
//! resource addressed by URL. `TransactionSession` tracks that URL across
//! round trips and decides which endpoint variant each operation needs:
//!
//! | Mode / state          | execute                  | commit                     | rollback        |
//! |-----------------------|--------------------------|----------------------------|-----------------|
//! | autocommit            | `POST {base}/commit`     | final statements only      | no-op           |
//! | explicit, no tx       | `POST {base}` (opens)    | no-op / `POST {base}/commit` | no-op         |
//! | explicit, tx open     | `POST {tx}`              | `POST {tx}/commit`         | `DELETE {tx}`   |

use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use tracing::{debug, warn};

use crate::error::{SessionError, StatementFailure};
use crate::query::results::ResultEnvelope;
use crate::query::statement::StatementDescriptor;
use crate::transport::codec::{self, DecodedResponse};
use crate::transport::messages::TxRequest;
use crate::transport::protocol::{RawResponse, TransactionEndpoint};

/// Session configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Initial autocommit mode
    pub auto_commit: bool,

    /// Maximum rows kept per statement result (0 = unlimited)
    pub max_rows: usize,

    /// Log request and response bodies
    pub debug: bool,

    /// Upper bound for one round trip
    pub round_trip_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            auto_commit: true,
            max_rows: 0,
            debug: false,
            round_trip_timeout: Duration::from_secs(30),
        }
    }
}

/// Transaction state.
///
/// `Committed` and `RolledBack` are transient: the session passes through
/// them and settles in `None`. They are reported by
/// [`TransactionSession::last_outcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    /// No server-side transaction is held
    None,

    /// The server holds an open transaction for this session
    Open,

    /// The last transaction committed
    Committed,

    /// The last transaction rolled back (explicitly, on error, or by expiry)
    RolledBack,

    /// The session is closed
    Closed,
}

impl TxState {
    /// Check if a transaction is open.
    pub fn is_open(&self) -> bool {
        matches!(self, TxState::Open)
    }

    /// Check if the session can still issue round trips.
    pub fn is_usable(&self) -> bool {
        !matches!(self, TxState::Closed)
    }
}

/// Server-assigned transaction identity.
#[derive(Debug, Clone)]
struct TxIdentity {
    id: u64,
    url: String,
    expires: Option<DateTime<FixedOffset>>,
}

/// State machine mapping caller operations onto round trips.
///
/// Every operation that issues a round trip takes `&mut self`, so a session
/// never has two round trips in flight.
pub struct TransactionSession {
    endpoint: Box<dyn TransactionEndpoint>,
    config: SessionConfig,
    auto_commit: bool,
    state: TxState,
    identity: Option<TxIdentity>,
    last_outcome: Option<TxState>,
    // Set while a round trip is awaited; still set on entry if that future
    // was dropped before completing.
    round_trip_pending: bool,
}

impl TransactionSession {
    /// Create a session over `endpoint`.
    pub fn new(endpoint: Box<dyn TransactionEndpoint>, config: SessionConfig) -> Self {
        Self {
            endpoint,
            auto_commit: config.auto_commit,
            config,
            state: TxState::None,
            identity: None,
            last_outcome: None,
            round_trip_pending: false,
        }
    }

    /// Session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Current state. Never `Committed` or `RolledBack`.
    pub fn state(&self) -> TxState {
        self.state
    }

    /// How the most recent transaction ended, if one has ended.
    pub fn last_outcome(&self) -> Option<TxState> {
        self.last_outcome
    }

    /// Whether the session is in autocommit mode.
    pub fn auto_commit(&self) -> bool {
        self.auto_commit
    }

    /// Id of the open transaction, if any.
    pub fn open_transaction_id(&self) -> Option<u64> {
        self.identity.as_ref().map(|tx| tx.id)
    }

    /// Expiry reported by the server for the open transaction.
    pub fn transaction_expires(&self) -> Option<DateTime<FixedOffset>> {
        self.identity.as_ref().and_then(|tx| tx.expires)
    }

    /// Check if the session is closed.
    pub fn is_closed(&self) -> bool {
        self.state == TxState::Closed
    }

    /// Switch between autocommit and explicit transactions.
    ///
    /// # Errors
    ///
    /// - `SessionError::Closed` after close
    /// - `SessionError::InvalidState` when flipping the mode while a
    ///   transaction is open
    pub fn set_auto_commit(&mut self, enabled: bool) -> Result<(), SessionError> {
        if self.is_closed() {
            return Err(SessionError::Closed);
        }
        if enabled == self.auto_commit {
            return Ok(());
        }
        if self.state.is_open() {
            return Err(SessionError::InvalidState(
                "cannot change autocommit mode while a transaction is open".to_string(),
            ));
        }
        debug!(auto_commit = enabled, "autocommit mode changed");
        self.auto_commit = enabled;
        Ok(())
    }

    /// Open a transaction unless autocommit is on or one is already open.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Protocol` if the server does not return a
    /// usable transaction identity.
    pub async fn begin_if_needed(&mut self) -> Result<(), SessionError> {
        self.ensure_usable()?;
        if self.auto_commit || self.state.is_open() {
            return Ok(());
        }

        let url = self.endpoint.params().transaction_url();
        let raw = self
            .round_trip("begin", &url, Some(&TxRequest::empty()))
            .await?;
        let decoded = codec::decode(raw, &TxRequest::empty(), self.config.max_rows)?;
        if decoded.first_error().is_some() {
            return Err(statement_failure(decoded));
        }
        self.open(&decoded)
    }

    /// Execute statements.
    ///
    /// In autocommit mode the statements run and commit in one round trip.
    /// Otherwise they run inside the open transaction, opening one in the
    /// same round trip if needed, and are not committed.
    ///
    /// # Errors
    ///
    /// - `SessionError::Statement` if a statement fails; it carries the
    ///   results of the statements before it
    /// - `SessionError::TransactionExpired` if the server no longer knows
    ///   the transaction
    /// - `SessionError::AmbiguousOutcome` if the round trip failed after the
    ///   request may have reached the server
    pub async fn execute(
        &mut self,
        statements: &[StatementDescriptor],
    ) -> Result<Vec<ResultEnvelope>, SessionError> {
        self.ensure_usable()?;
        let request = codec::encode(statements)?;

        if self.auto_commit {
            if request.is_empty() {
                return Ok(Vec::new());
            }
            return self.autocommit("execute", &request).await;
        }

        if request.is_empty() {
            self.begin_if_needed().await?;
            return Ok(Vec::new());
        }
        self.execute_in_transaction("execute", &request).await
    }

    /// Reset the server-side expiry of the open transaction.
    ///
    /// No-op without an open transaction.
    pub async fn keep_alive(&mut self) -> Result<(), SessionError> {
        self.ensure_usable()?;
        if self.identity.is_none() {
            return Ok(());
        }
        self.execute_in_transaction("keep_alive", &TxRequest::empty())
            .await
            .map(|_| ())
    }

    /// Commit the open transaction, sending `final_statements` with the
    /// commit directive in the same round trip.
    ///
    /// Without an open transaction this is a no-op when `final_statements`
    /// is empty; otherwise they run through the autocommit endpoint.
    ///
    /// # Errors
    ///
    /// A failing statement rolls the whole transaction back on the server:
    /// the session ends in `None` and the error is returned.
    pub async fn commit(
        &mut self,
        final_statements: &[StatementDescriptor],
    ) -> Result<Vec<ResultEnvelope>, SessionError> {
        self.ensure_usable()?;
        let request = codec::encode(final_statements)?;

        let Some(tx) = self.identity.clone() else {
            if request.is_empty() {
                debug!("commit without open transaction ignored");
                return Ok(Vec::new());
            }
            return self.autocommit("commit", &request).await;
        };

        let url = format!("{}/commit", tx.url);
        let raw = match self.round_trip("commit", &url, Some(&request)).await {
            Ok(raw) => raw,
            Err(e @ SessionError::AmbiguousOutcome { .. }) => {
                self.discard_identity();
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        let decoded = match codec::decode(raw, &request, self.config.max_rows) {
            Ok(decoded) => decoded,
            Err(e) => {
                self.discard_identity();
                return Err(e);
            }
        };

        if let Some(error) = decoded.first_error().cloned() {
            self.finish(TxState::RolledBack);
            if error.is_transaction_not_found() {
                return Err(SessionError::TransactionExpired { tx_id: tx.id });
            }
            return Err(statement_failure(decoded));
        }

        self.finish(TxState::Committed);
        Ok(decoded.results)
    }

    /// Roll back the open transaction. No-op without one.
    ///
    /// # Errors
    ///
    /// - `SessionError::Closed` after close
    /// - `SessionError::AmbiguousOutcome` if the server may not have seen
    ///   the rollback; the identity is discarded either way
    pub async fn rollback(&mut self) -> Result<(), SessionError> {
        self.ensure_usable()?;
        if self.identity.is_none() {
            return Ok(());
        }
        self.rollback_open().await
    }

    /// Close the session, rolling back an open transaction first.
    ///
    /// Rollback failures are logged and swallowed. Idempotent.
    pub async fn close(&mut self) -> Result<(), SessionError> {
        if self.is_closed() {
            return Ok(());
        }

        if let Some(tx_id) = self.open_transaction_id() {
            if let Err(e) = self.rollback_open().await {
                warn!(tx_id, error = %e, "rollback on close failed");
            }
        }
        self.identity = None;
        self.round_trip_pending = false;

        if let Err(e) = self.endpoint.close().await {
            warn!(error = %e, "failed to release transport");
        }

        self.state = TxState::Closed;
        debug!("session closed");
        Ok(())
    }

    async fn rollback_open(&mut self) -> Result<(), SessionError> {
        let Some(tx) = self.identity.clone() else {
            return Ok(());
        };

        let raw = match self.round_trip("rollback", &tx.url, None).await {
            Ok(raw) => raw,
            Err(e @ SessionError::AmbiguousOutcome { .. }) => {
                self.discard_identity();
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        let decoded = codec::decode(raw, &TxRequest::empty(), 0);
        self.finish(TxState::RolledBack);
        let decoded = decoded?;

        match decoded.first_error().cloned() {
            None => Ok(()),
            Some(error) if error.is_transaction_not_found() => {
                debug!(tx_id = tx.id, "transaction already gone on rollback");
                Ok(())
            }
            Some(_) => Err(statement_failure(decoded)),
        }
    }

    /// One self-contained open/execute/commit round trip.
    async fn autocommit(
        &mut self,
        operation: &str,
        request: &TxRequest,
    ) -> Result<Vec<ResultEnvelope>, SessionError> {
        let url = self.endpoint.params().autocommit_url();
        let raw = self.round_trip(operation, &url, Some(request)).await?;
        let decoded = codec::decode(raw, request, self.config.max_rows)?;

        if decoded.first_error().is_some() {
            return Err(statement_failure(decoded));
        }
        Ok(decoded.results)
    }

    /// Execute within the open transaction, or open one with the request.
    async fn execute_in_transaction(
        &mut self,
        operation: &str,
        request: &TxRequest,
    ) -> Result<Vec<ResultEnvelope>, SessionError> {
        let current = self.identity.clone();
        let url = match &current {
            Some(tx) => tx.url.clone(),
            None => self.endpoint.params().transaction_url(),
        };

        // An ambiguous failure keeps an open transaction open; the server
        // either applied the statements or will expire the transaction.
        let raw = self.round_trip(operation, &url, Some(request)).await?;

        let decoded = match codec::decode(raw, request, self.config.max_rows) {
            Ok(decoded) => decoded,
            Err(e) => {
                self.discard_identity();
                return Err(e);
            }
        };

        if let Some(error) = decoded.first_error().cloned() {
            if let (Some(tx), true) = (&current, error.is_transaction_not_found()) {
                let tx_id = tx.id;
                self.finish(TxState::RolledBack);
                return Err(SessionError::TransactionExpired { tx_id });
            }
            // The server rolls the transaction back on any statement error.
            if current.is_some() || decoded.tx_id.is_some() {
                self.finish(TxState::RolledBack);
            }
            return Err(statement_failure(decoded));
        }

        match current {
            None => self.open(&decoded)?,
            Some(tx) => {
                if let Some(id) = decoded.tx_id {
                    if id != tx.id {
                        self.discard_identity();
                        return Err(SessionError::Protocol(format!(
                            "server switched transaction from {} to {}",
                            tx.id, id
                        )));
                    }
                }
                if let (Some(identity), Some(expires)) = (self.identity.as_mut(), decoded.expires)
                {
                    identity.expires = Some(expires);
                }
            }
        }

        Ok(decoded.results)
    }

    /// Store the identity from a response that opened a transaction.
    fn open(&mut self, decoded: &DecodedResponse) -> Result<(), SessionError> {
        let (Some(id), Some(url)) = (decoded.tx_id, decoded.tx_location.clone()) else {
            return Err(SessionError::Protocol(
                "server did not return a transaction identity".to_string(),
            ));
        };
        debug!(tx_id = id, endpoint = %url, "transaction opened");
        self.identity = Some(TxIdentity {
            id,
            url,
            expires: decoded.expires,
        });
        self.state = TxState::Open;
        Ok(())
    }

    /// Leave OPEN through `outcome` and settle in NONE.
    fn finish(&mut self, outcome: TxState) {
        let tx_id = self.open_transaction_id();
        debug!(?tx_id, ?outcome, "transaction finished");
        self.identity = None;
        self.last_outcome = Some(outcome);
        self.state = TxState::None;
    }

    /// Forget the identity after an ambiguous or malformed exchange.
    fn discard_identity(&mut self) {
        if let Some(tx) = self.identity.take() {
            warn!(tx_id = tx.id, "transaction outcome unknown, identity discarded");
            self.last_outcome = Some(TxState::RolledBack);
        }
        self.state = TxState::None;
    }

    /// Fail on a closed session, or once after an abandoned round trip.
    fn ensure_usable(&mut self) -> Result<(), SessionError> {
        if !self.state.is_usable() {
            return Err(SessionError::Closed);
        }
        if self.round_trip_pending {
            self.round_trip_pending = false;
            self.discard_identity();
            return Err(SessionError::AmbiguousOutcome {
                operation: "previous round trip".to_string(),
                message: "cancelled before its response was observed".to_string(),
            });
        }
        Ok(())
    }

    /// Perform one exchange: POST `request` or, without one, DELETE.
    async fn round_trip(
        &mut self,
        operation: &str,
        url: &str,
        request: Option<&TxRequest>,
    ) -> Result<RawResponse, SessionError> {
        let statements = request.map(TxRequest::len).unwrap_or(0);
        debug!(operation, endpoint = url, statements, "round trip");
        if self.config.debug {
            if let Some(Ok(body)) = request.map(serde_json::to_string) {
                debug!(%body, "request");
            }
        }

        let timeout = self.config.round_trip_timeout;
        self.round_trip_pending = true;
        let call = match request {
            Some(request) => self.endpoint.post(url, request),
            None => self.endpoint.delete(url),
        };
        let result = tokio::time::timeout(timeout, call).await;
        self.round_trip_pending = false;

        let raw = match result {
            Err(_) => {
                return Err(SessionError::AmbiguousOutcome {
                    operation: operation.to_string(),
                    message: format!("no response within {:?}", timeout),
                })
            }
            Ok(Err(e)) if e.is_ambiguous() => {
                return Err(SessionError::AmbiguousOutcome {
                    operation: operation.to_string(),
                    message: e.to_string(),
                })
            }
            Ok(Err(e)) => return Err(SessionError::Transport(e)),
            Ok(Ok(raw)) => raw,
        };

        if self.config.debug {
            debug!(status = raw.status, body = %raw.body, "response");
        }
        Ok(raw)
    }
}

/// Build the statement error for a response that reports one.
fn statement_failure(decoded: DecodedResponse) -> SessionError {
    let index = decoded.failed_index();
    let completed = decoded.completed();
    let (code, message) = decoded
        .first_error()
        .map(|e| (e.code.clone(), e.message.clone()))
        .unwrap_or_default();
    SessionError::Statement(StatementFailure {
        index,
        code,
        message,
        completed,
    })
}

impl std::fmt::Debug for TransactionSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionSession")
            .field("config", &self.config)
            .field("auto_commit", &self.auto_commit)
            .field("state", &self.state)
            .field("tx_id", &self.open_transaction_id())
            .finish()
    }
}
