//! Protocol codec for the transactional endpoint.
//!
//! Pure translation between statement descriptors and request bodies, and
//! between raw responses and result envelopes plus transaction identity.
//! The codec performs no I/O and keeps no state.

use chrono::{DateTime, FixedOffset};

use crate::error::SessionError;
use crate::query::results::{ResultEnvelope, ServerError};
use crate::query::statement::StatementDescriptor;

use super::messages::{TxRequest, TxResponse};
use super::protocol::RawResponse;

const TRANSACTION_NOT_FOUND: &str = "Neo.ClientError.Transaction.TransactionNotFound";

/// Decoded outcome of one round trip.
#[derive(Debug, Clone, Default)]
pub struct DecodedResponse {
    /// One envelope per executed statement, followed by an error-carrying
    /// envelope for the statement that failed (if any)
    pub results: Vec<ResultEnvelope>,
    /// Errors reported by the server
    pub errors: Vec<ServerError>,
    /// URL of the open transaction, if the server reported one
    pub tx_location: Option<String>,
    /// Numeric transaction id taken from `tx_location`
    pub tx_id: Option<u64>,
    /// Transaction expiry, if reported
    pub expires: Option<DateTime<FixedOffset>>,
}

impl DecodedResponse {
    /// First server error, if any.
    pub fn first_error(&self) -> Option<&ServerError> {
        self.errors.first()
    }

    /// Index of the failed statement: the number of statements that executed
    /// before the error.
    pub fn failed_index(&self) -> usize {
        self.results.iter().take_while(|r| r.error.is_none()).count()
    }

    /// Envelopes of the statements that completed successfully.
    pub fn completed(&self) -> Vec<ResultEnvelope> {
        self.results
            .iter()
            .take_while(|r| r.error.is_none())
            .cloned()
            .collect()
    }
}

/// Encode statement descriptors into a request body.
///
/// # Errors
///
/// Returns `SessionError::InvalidState` if a parameter cannot be represented
/// on the wire.
pub fn encode(descriptors: &[StatementDescriptor]) -> Result<TxRequest, SessionError> {
    let statements = descriptors
        .iter()
        .map(StatementDescriptor::to_wire)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(TxRequest::new(statements))
}

/// Decode a raw response to `request`.
///
/// Rows beyond `max_rows` are dropped from every envelope (`0` keeps all).
///
/// Results are streamed, so a statement that fails while producing rows
/// still leaves an entry in `results`. When an error is reported, the last
/// returned result belongs to the failing statement if it is the result of
/// the last submitted statement, or if it lacks the stats its statement
/// asked for. Errors raised at commit time after every statement ran are
/// attributed to the last statement.
///
/// # Errors
///
/// Returns `SessionError::Protocol` if the body is malformed, the result
/// count does not match the submission, or the transaction URL carries no
/// numeric id.
pub fn decode(
    response: RawResponse,
    request: &TxRequest,
    max_rows: usize,
) -> Result<DecodedResponse, SessionError> {
    let parsed = parse_body(&response)?;
    let submitted = request.len();

    if parsed.results.len() > submitted {
        return Err(SessionError::Protocol(format!(
            "server returned {} results for {} statements",
            parsed.results.len(),
            submitted
        )));
    }
    if parsed.errors.is_empty() && parsed.results.len() < submitted {
        return Err(SessionError::Protocol(format!(
            "server returned {} results for {} statements without reporting an error",
            parsed.results.len(),
            submitted
        )));
    }

    let errors: Vec<ServerError> = parsed
        .errors
        .into_iter()
        .map(|e| ServerError {
            code: e.code,
            message: e.message,
        })
        .collect();

    let executed = parsed.results.len();
    let last_cut_short = executed
        .checked_sub(1)
        .and_then(|i| request.statements.get(i))
        .is_some_and(|s| s.include_stats)
        && parsed.results.last().is_some_and(|r| r.stats.is_none());

    let mut results: Vec<ResultEnvelope> = parsed
        .results
        .into_iter()
        .map(|r| ResultEnvelope::from_wire(r, max_rows))
        .collect();
    if let Some(first) = errors.first() {
        let failed = ResultEnvelope::failed(first.clone());
        match results.last_mut() {
            Some(last) if executed == submitted || last_cut_short => *last = failed,
            _ => results.push(failed),
        }
    }

    let tx_location = response
        .location
        .or_else(|| parsed.commit.as_deref().map(strip_commit_suffix));
    let tx_id = tx_location.as_deref().map(parse_transaction_id).transpose()?;
    let expires = parsed
        .transaction
        .and_then(|t| t.expires)
        .and_then(|s| parse_expiry(&s));

    Ok(DecodedResponse {
        results,
        errors,
        tx_location,
        tx_id,
        expires,
    })
}

/// Parse the body according to the HTTP status.
///
/// A 404 without an error body is reported as an unknown transaction.
fn parse_body(response: &RawResponse) -> Result<TxResponse, SessionError> {
    let body = response.body.trim();
    let success = (200..300).contains(&response.status);

    if body.is_empty() {
        if success {
            return Ok(TxResponse::default());
        }
        return status_fallback(response.status, body);
    }

    match serde_json::from_str::<TxResponse>(body) {
        Ok(parsed) if success || !parsed.errors.is_empty() => Ok(parsed),
        Ok(_) => status_fallback(response.status, body),
        Err(e) if success => Err(SessionError::Protocol(format!(
            "malformed response body: {}",
            e
        ))),
        Err(_) => status_fallback(response.status, body),
    }
}

fn status_fallback(status: u16, body: &str) -> Result<TxResponse, SessionError> {
    if status == 404 {
        return Ok(TxResponse {
            errors: vec![super::messages::WireError {
                code: TRANSACTION_NOT_FOUND.to_string(),
                message: "transaction not found".to_string(),
            }],
            ..Default::default()
        });
    }
    Err(SessionError::Protocol(format!(
        "unexpected HTTP status {}: {}",
        status, body
    )))
}

/// Transaction URL for a commit URL.
pub fn strip_commit_suffix(commit_url: &str) -> String {
    commit_url
        .strip_suffix("/commit")
        .unwrap_or(commit_url)
        .to_string()
}

/// Extract the numeric transaction id from a transaction URL.
///
/// # Errors
///
/// Returns `SessionError::Protocol` if the last path segment is not a
/// positive integer.
pub fn parse_transaction_id(url: &str) -> Result<u64, SessionError> {
    let segment = url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();
    match segment.parse::<u64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(SessionError::Protocol(format!(
            "no transaction id in location '{}'",
            url
        ))),
    }
}

/// Parse an RFC 1123 expiry timestamp. Unparseable values are ignored.
pub fn parse_expiry(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc2822(value).ok()
}
