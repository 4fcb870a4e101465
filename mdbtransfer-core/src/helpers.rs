//! SQL text helpers shared by the source readers and the destination.

/// Quotes an identifier, doubling embedded quotes.
///
/// SQLite and PostgreSQL share the standard double-quote form, so one
/// spelling serves both sides.
///
/// # Example
/// ```rust
/// use mdbtransfer_core::helpers::quote_identifier;
///
/// assert_eq!(quote_identifier("UnmovableCins"), "\"UnmovableCins\"");
/// ```
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
