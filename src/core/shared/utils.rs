use diesel::r2d2::{ConnectionManager, Pool};
use diesel::PgConnection;

use super::error::StorageError;

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

pub fn create_conn(database_url: &str) -> Result<DbPool, diesel::r2d2::PoolError> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Pool::builder().max_size(10).build(manager)
}

/// Run database migrations
pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

    const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

    let mut conn = pool.get()?;
    let applied = conn.run_pending_migrations(MIGRATIONS).map_err(
        |e| -> Box<dyn std::error::Error + Send + Sync> {
            Box::new(std::io::Error::other(format!("Migration error: {e}")))
        },
    )?;
    if !applied.is_empty() {
        log::info!("Applied {} pending migrations", applied.len());
    }
    Ok(())
}

/// Runs a diesel closure on the blocking pool with a pooled connection.
pub async fn run_blocking<T, F>(pool: &DbPool, op: F) -> Result<T, StorageError>
where
    T: Send + 'static,
    F: FnOnce(&mut PgConnection) -> Result<T, diesel::result::Error> + Send + 'static,
{
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || {
        let mut conn = pool
            .get()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        op(&mut conn).map_err(StorageError::from)
    })
    .await
    .map_err(|e: tokio::task::JoinError| StorageError::Task(e.to_string()))?
}

pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .trim_matches('_')
        .to_string()
}

/// Escapes markup and drops characters XML 1.0 does not allow.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' | '\n' | '\r' => out.push(c),
            '\u{0}'..='\u{1f}' | '\u{fffe}' | '\u{ffff}' => {}
            c => out.push(c),
        }
    }
    out
}

/// Formats a dollar amount with thousands separators, e.g. `-$1,234,567`.
pub fn format_currency(value: f64) -> String {
    let rounded = value.abs().round() as u64;
    let digits = rounded.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 2);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if value < 0.0 && rounded > 0 {
        format!("-${out}")
    } else {
        format!("${out}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("Acme Corp: Audit"), "Acme_Corp__Audit");
        assert_eq!(sanitize_filename("  deck.pdf"), "deck.pdf");
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(0.0), "$0");
        assert_eq!(format_currency(999.4), "$999");
        assert_eq!(format_currency(1_234_567.0), "$1,234,567");
        assert_eq!(format_currency(-48_200.0), "-$48,200");
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("P&L <Q1>"), "P&amp;L &lt;Q1&gt;");
        assert_eq!(escape_xml("it's \"fine\""), "it&apos;s &quot;fine&quot;");
    }

    #[test]
    fn test_escape_xml_drops_illegal_control_chars() {
        assert_eq!(
            escape_xml("Cash\u{0}flow\u{8} \u{b}up\u{c}\u{1f}\u{ffff}"),
            "Cashflow up"
        );
        assert_eq!(escape_xml("line one\n\tline two\r\n"), "line one\n\tline two\r\n");
    }
}
