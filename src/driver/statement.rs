//! Statement with bindable parameters.
//!
//! A `Statement` is a mutable builder: it holds query text, the currently
//! bound parameters and a pending batch. Execution goes through
//! [`Connection`](crate::driver::Connection), which takes immutable
//! [`StatementDescriptor`] snapshots of it.

use crate::error::SessionError;
use crate::query::batch::Batch;
use crate::query::statement::{rewrite_placeholders, Parameter, ParameterMap, StatementDescriptor};

/// Statement with positional (`?`) or named (`$name`) parameters.
///
/// # Example
///
/// ```
/// use neo4j_http_tx::driver::Statement;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut stmt = Statement::new("CREATE (:User {name: ?, age: ?})");
/// assert_eq!(stmt.text(), "CREATE (:User {name: $1, age: $2})");
///
/// stmt.bind(0, "Ada")?;
/// stmt.bind(1, 36)?;
/// stmt.add_batch();
///
/// stmt.bind(0, "Alan")?;
/// stmt.bind(1, 41)?;
/// stmt.add_batch();
///
/// assert_eq!(stmt.batch_len(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Statement {
    /// Query text with `?` rewritten to `$1..$n`
    text: String,
    /// Number of positional placeholders
    placeholder_count: usize,
    /// Bound parameters
    parameters: ParameterMap,
    /// Ask the server for mutation counters
    include_stats: bool,
    /// Pending batch
    batch: Batch,
}

impl Statement {
    /// Create a statement. Positional `?` placeholders are rewritten.
    pub fn new(text: impl AsRef<str>) -> Self {
        let (text, placeholder_count) = rewrite_placeholders(text.as_ref());
        Self {
            text,
            placeholder_count,
            parameters: ParameterMap::new(),
            include_stats: true,
            batch: Batch::new(),
        }
    }

    /// Query text as sent to the server.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of positional placeholders.
    pub fn placeholder_count(&self) -> usize {
        self.placeholder_count
    }

    /// Bind a positional parameter (0-based).
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` if `index` has no placeholder.
    pub fn bind<T: Into<Parameter>>(&mut self, index: usize, value: T) -> Result<(), SessionError> {
        if index >= self.placeholder_count {
            return Err(SessionError::InvalidState(format!(
                "parameter index {} out of range: statement has {} placeholders",
                index, self.placeholder_count
            )));
        }
        self.parameters.insert((index + 1).to_string(), value.into());
        Ok(())
    }

    /// Bind a named parameter (`$name` in the query text).
    pub fn bind_named<T: Into<Parameter>>(&mut self, name: &str, value: T) {
        let name = name.strip_prefix('$').unwrap_or(name);
        self.parameters.insert(name.to_string(), value.into());
    }

    /// Bind all positional parameters at once.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` if there are more values than
    /// placeholders.
    pub fn bind_all(&mut self, values: Vec<Parameter>) -> Result<(), SessionError> {
        for (index, value) in values.into_iter().enumerate() {
            self.bind(index, value)?;
        }
        Ok(())
    }

    /// Remove all bound parameters.
    pub fn clear_parameters(&mut self) {
        self.parameters.clear();
    }

    /// Bound parameters.
    pub fn parameters(&self) -> &ParameterMap {
        &self.parameters
    }

    /// Request or suppress mutation counters (default: requested).
    pub fn set_include_stats(&mut self, include_stats: bool) {
        self.include_stats = include_stats;
    }

    /// Whether mutation counters are requested.
    pub fn include_stats(&self) -> bool {
        self.include_stats
    }

    /// Snapshot of the text and currently bound parameters.
    pub fn descriptor(&self) -> StatementDescriptor {
        StatementDescriptor::with_parameters(
            self.text.clone(),
            self.parameters.clone(),
            self.include_stats,
        )
    }

    /// Append a snapshot of the current bindings to the batch.
    pub fn add_batch(&mut self) {
        let descriptor = self.descriptor();
        self.batch.push(descriptor);
    }

    /// Append an arbitrary statement to the batch.
    pub fn add_batch_statement(&mut self, descriptor: StatementDescriptor) {
        self.batch.push(descriptor);
    }

    /// Drop the pending batch.
    pub fn clear_batch(&mut self) {
        self.batch.clear();
    }

    /// Number of pending batch entries.
    pub fn batch_len(&self) -> usize {
        self.batch.len()
    }

    /// Pending batch.
    pub fn batch(&self) -> &Batch {
        &self.batch
    }

    pub(crate) fn batch_mut(&mut self) -> &mut Batch {
        &mut self.batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_binding() {
        let mut stmt = Statement::new("MATCH (n) WHERE n.a = ? AND n.b = ? RETURN n");
        assert_eq!(stmt.placeholder_count(), 2);

        stmt.bind(0, 1).unwrap();
        stmt.bind(1, "x").unwrap();

        let d = stmt.descriptor();
        assert_eq!(d.text(), "MATCH (n) WHERE n.a = $1 AND n.b = $2 RETURN n");
        assert_eq!(d.parameters().get("1"), Some(&Parameter::Integer(1)));
        assert_eq!(d.parameters().get("2"), Some(&Parameter::String("x".to_string())));
    }

    #[test]
    fn test_bind_out_of_range() {
        let mut stmt = Statement::new("RETURN ?");
        let result = stmt.bind(1, 5);
        assert!(matches!(result, Err(SessionError::InvalidState(_))));
    }

    #[test]
    fn test_bind_all() {
        let mut stmt = Statement::new("RETURN ?, ?");
        stmt.bind_all(vec![Parameter::Integer(1), Parameter::Null]).unwrap();
        assert_eq!(stmt.parameters().len(), 2);

        assert!(stmt.bind_all(vec![1.into(), 2.into(), 3.into()]).is_err());
    }

    #[test]
    fn test_named_binding() {
        let mut stmt = Statement::new("MATCH (n {name: $name}) RETURN n");
        stmt.bind_named("name", "Ada");
        stmt.bind_named("$limit", 10);

        let d = stmt.descriptor();
        assert_eq!(d.parameters().get("name"), Some(&Parameter::String("Ada".to_string())));
        assert_eq!(d.parameters().get("limit"), Some(&Parameter::Integer(10)));
        assert_eq!(stmt.placeholder_count(), 0);
    }

    #[test]
    fn test_add_batch_snapshots_bindings() {
        let mut stmt = Statement::new("CREATE (:N {v: ?})");
        stmt.bind(0, 1).unwrap();
        stmt.add_batch();
        stmt.bind(0, 2).unwrap();
        stmt.add_batch();

        let pending = stmt.batch().descriptors();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].parameters().get("1"), Some(&Parameter::Integer(1)));
        assert_eq!(pending[1].parameters().get("1"), Some(&Parameter::Integer(2)));

        stmt.clear_batch();
        assert_eq!(stmt.batch_len(), 0);
    }

    #[test]
    fn test_clear_parameters() {
        let mut stmt = Statement::new("RETURN ?");
        stmt.bind(0, true).unwrap();
        stmt.clear_parameters();
        assert!(stmt.parameters().is_empty());
    }

    #[test]
    fn test_include_stats_default() {
        let mut stmt = Statement::new("RETURN 1");
        assert!(stmt.include_stats());
        stmt.set_include_stats(false);
        assert!(!stmt.descriptor().want_stats());
    }
}
