use async_trait::async_trait;
use blogport_core::{
    expand_permalink, from_local_and_utc, parse_db_datetime, ConnectionParams, PostId, PostRecord,
};
use blogport_logging::{export_debug, export_info, export_warn};
use chrono::{DateTime, FixedOffset};
use futures_util::TryStreamExt;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::{Connection, FromRow};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::{PostSource, PostStream, SourceError};

/// `db_version` values whose schema the post query is known to work with.
pub const SUPPORTED_DB_VERSIONS: [i64; 2] = [38590, 49752];

const CONVERT_ZERO_DATETIME: &str = "ConvertZeroDateTime";
const TABLE_PREFIX: &str = "TablePrefix";
const DEFAULT_TABLE_PREFIX: &str = "wp_";
const DEFAULT_HOST: &str = "localhost";
const CHANNEL_CAPACITY: usize = 32;

/// Reads published and unpublished posts straight from a blog database.
#[derive(Debug, Clone)]
pub struct MysqlPostSource {
    params: ConnectionParams,
    ignore_unsupported_db_version: bool,
}

impl MysqlPostSource {
    /// Zero dates are always read as absent; `ConvertZeroDateTime=true` is
    /// appended to the given parameters.
    pub fn new(params: ConnectionParams, ignore_unsupported_db_version: bool) -> Self {
        let params = params.with(CONVERT_ZERO_DATETIME, "true");
        Self {
            params,
            ignore_unsupported_db_version,
        }
    }

    pub fn params(&self) -> &ConnectionParams {
        &self.params
    }

    fn table_prefix(&self) -> Result<String, SourceError> {
        let prefix = self.params.get(TABLE_PREFIX).unwrap_or(DEFAULT_TABLE_PREFIX);
        if prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            Ok(prefix.to_string())
        } else {
            Err(SourceError::InvalidTablePrefix(prefix.to_string()))
        }
    }

    fn converts_zero_dates(&self) -> bool {
        self.params
            .get(CONVERT_ZERO_DATETIME)
            .is_some_and(|value| value.trim().eq_ignore_ascii_case("true"))
    }

    fn connect_options(&self) -> MySqlConnectOptions {
        let mut options =
            MySqlConnectOptions::new().host(self.params.host().unwrap_or(DEFAULT_HOST));
        if let Some(port) = self.params.port() {
            options = options.port(port);
        }
        if let Some(username) = self.params.username() {
            options = options.username(username);
        }
        if let Some(password) = self.params.password() {
            options = options.password(password);
        }
        if let Some(database) = self.params.database() {
            options = options.database(database);
        }
        options
    }

    async fn check_db_version(
        &self,
        conn: &mut MySqlConnection,
        prefix: &str,
    ) -> Result<(), SourceError> {
        let encountered = read_option(conn, prefix, "db_version")
            .await
            .and_then(|value| value.trim().parse::<i64>().ok());
        evaluate_db_version(encountered, self.ignore_unsupported_db_version)
    }
}

/// Accepts supported schema versions. Anything else, including an unreadable
/// version, fails unless `ignore_unsupported` is set, in which case it is
/// only logged.
fn evaluate_db_version(
    encountered: Option<i64>,
    ignore_unsupported: bool,
) -> Result<(), SourceError> {
    if encountered.is_some_and(|version| SUPPORTED_DB_VERSIONS.contains(&version)) {
        export_debug!("Database version {encountered:?} is supported");
        return Ok(());
    }

    let mut supported = SUPPORTED_DB_VERSIONS.to_vec();
    supported.sort_unstable_by(|a, b| b.cmp(a));
    if ignore_unsupported {
        export_warn!(
            "Unsupported database version {encountered:?}; supported versions: {supported:?}"
        );
        Ok(())
    } else {
        Err(SourceError::SchemaVersion {
            encountered,
            supported,
        })
    }
}

/// Reads one value from the options table. Probe failures count as absent.
async fn read_option(conn: &mut MySqlConnection, prefix: &str, name: &str) -> Option<String> {
    let sql = format!("SELECT option_value FROM {prefix}options WHERE option_name = ?");
    match sqlx::query_scalar::<_, String>(&sql)
        .bind(name)
        .fetch_optional(conn)
        .await
    {
        Ok(value) => value,
        Err(err) => {
            export_debug!("Option {name} could not be read: {err}");
            None
        }
    }
}

fn posts_query(prefix: &str) -> String {
    format!(
        r#"
        SELECT
            p.ID AS id,
            p.post_status AS status,
            CAST(p.post_date AS CHAR) AS published_local,
            CAST(p.post_date_gmt AS CHAR) AS published_utc,
            CAST(p.post_modified AS CHAR) AS updated_local,
            CAST(p.post_modified_gmt AS CHAR) AS updated_utc,
            p.post_name AS slug,
            p.post_title AS title,
            CAST(COALESCE(GROUP_CONCAT(DISTINCT c.name SEPARATOR ';'), '') AS CHAR) AS categories,
            CAST(COALESCE(GROUP_CONCAT(DISTINCT t.name SEPARATOR ';'), '') AS CHAR) AS tags,
            p.post_content AS content
        FROM {prefix}posts p
        LEFT JOIN {prefix}term_relationships cr
            ON (p.ID = cr.object_id)
        LEFT JOIN {prefix}term_taxonomy ct
            ON (ct.term_taxonomy_id = cr.term_taxonomy_id AND ct.taxonomy = 'category')
        LEFT JOIN {prefix}terms c
            ON (ct.term_id = c.term_id)
        LEFT JOIN {prefix}term_relationships tr
            ON (p.ID = tr.object_id)
        LEFT JOIN {prefix}term_taxonomy tt
            ON (tt.term_taxonomy_id = tr.term_taxonomy_id AND tt.taxonomy = 'post_tag')
        LEFT JOIN {prefix}terms t
            ON (tt.term_id = t.term_id)
        WHERE p.post_type = 'post'
        GROUP BY p.ID
        ORDER BY p.ID
        "#
    )
}

#[derive(Debug, FromRow)]
struct PostRow {
    id: u64,
    status: String,
    published_local: Option<String>,
    published_utc: Option<String>,
    updated_local: Option<String>,
    updated_utc: Option<String>,
    slug: String,
    title: String,
    categories: String,
    tags: String,
    content: String,
}

/// Maps a query row to a record. `Ok(None)` means the post has no usable
/// publish date and is skipped.
fn build_record(
    row: PostRow,
    permalink: Option<&str>,
    convert_zero_dates: bool,
) -> Result<Option<PostRecord>, SourceError> {
    let published = row_date(
        row.id,
        row.published_local.as_deref(),
        row.published_utc.as_deref(),
        convert_zero_dates,
    )?;
    let Some(published) = published else {
        return Ok(None);
    };
    let updated = row_date(
        row.id,
        row.updated_local.as_deref(),
        row.updated_utc.as_deref(),
        convert_zero_dates,
    )?;

    let category = row
        .categories
        .split(';')
        .map(str::trim)
        .find(|name| !name.is_empty() && !name.eq_ignore_ascii_case("uncategorized"))
        .map(str::to_string);
    let redirect_from: Vec<String> = permalink
        .and_then(|template| expand_permalink(template, &published, row.id, &row.slug))
        .into_iter()
        .collect();

    Ok(Some(
        PostRecord::new(row.id, row.slug, row.title)
            .with_status(row.status)
            .with_published(Some(published))
            .with_updated(updated)
            .with_category(category)
            .with_tags(row.tags.split(';'))
            .with_content(row.content)
            .with_redirect_from(redirect_from),
    ))
}

fn row_date(
    post_id: PostId,
    local: Option<&str>,
    utc: Option<&str>,
    convert_zero_dates: bool,
) -> Result<Option<DateTime<FixedOffset>>, SourceError> {
    let (Some(local), Some(utc)) = (local, utc) else {
        return Ok(None);
    };
    let parse = |value: &str| match parse_db_datetime(value) {
        Some(parsed) => Ok(Some(parsed)),
        None if convert_zero_dates => Ok(None),
        None => Err(SourceError::InvalidDate {
            post_id,
            value: value.to_string(),
        }),
    };
    match (parse(local)?, parse(utc)?) {
        (Some(local), Some(utc)) => Ok(from_local_and_utc(local, utc)),
        _ => Ok(None),
    }
}

#[async_trait]
impl PostSource for MysqlPostSource {
    async fn open(&self, cancel: CancellationToken) -> Result<PostStream, SourceError> {
        let prefix = self.table_prefix()?;
        export_info!("Connecting to {}", self.params.to_connection_string(true));
        let mut conn = MySqlConnection::connect_with(&self.connect_options())
            .await
            .map_err(SourceError::Connection)?;

        self.check_db_version(&mut conn, &prefix).await?;
        let permalink = read_option(&mut conn, &prefix, "permalink_structure")
            .await
            .filter(|template| !template.is_empty());
        let convert_zero_dates = self.converts_zero_dates();

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let reader_cancel = cancel.clone();
        tokio::spawn(async move {
            let sql = posts_query(&prefix);
            let mut rows = sqlx::query_as::<_, PostRow>(&sql).fetch(&mut conn);
            loop {
                if reader_cancel.is_cancelled() {
                    break;
                }
                let item = match rows.try_next().await {
                    Ok(Some(row)) => {
                        let post_id = row.id;
                        match build_record(row, permalink.as_deref(), convert_zero_dates) {
                            Ok(Some(record)) => Ok(record),
                            Ok(None) => {
                                export_debug!("Skipping post {post_id} without a published date");
                                continue;
                            }
                            Err(err) => Err(err),
                        }
                    }
                    Ok(None) => break,
                    Err(err) => Err(SourceError::Query(err)),
                };
                let failed = item.is_err();
                if tx.send(item).await.is_err() || failed {
                    break;
                }
            }
        });

        Ok(PostStream::from_channel(rx, cancel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row() -> PostRow {
        PostRow {
            id: 7,
            status: "publish".to_string(),
            published_local: Some("2020-03-05 12:30:00".to_string()),
            published_utc: Some("2020-03-05 10:00:00".to_string()),
            updated_local: Some("2020-03-06 08:00:00".to_string()),
            updated_utc: Some("2020-03-06 05:30:00".to_string()),
            slug: "hello".to_string(),
            title: "Hello".to_string(),
            categories: "Uncategorized;Rust".to_string(),
            tags: "Foo;foo; BAR;".to_string(),
            content: "Hi".to_string(),
        }
    }

    #[test]
    fn row_maps_to_record() {
        let record = build_record(row(), Some("/%year%/%monthnum%/%postname%/"), true)
            .unwrap()
            .unwrap();
        assert_eq!(record.id(), 7);
        assert_eq!(record.category(), Some("Rust"));
        assert_eq!(record.tags(), ["foo", "bar"]);
        assert_eq!(record.redirect_from(), ["/2020/03/hello/"]);
        assert_eq!(
            record.published().unwrap().to_rfc3339(),
            "2020-03-05T12:30:00+02:30"
        );
        assert_eq!(
            record.updated().unwrap().to_rfc3339(),
            "2020-03-06T08:00:00+02:30"
        );
    }

    #[test]
    fn only_uncategorized_leaves_no_category() {
        let mut row = row();
        row.categories = "uncategorized".to_string();
        let record = build_record(row, None, true).unwrap().unwrap();
        assert_eq!(record.category(), None);
        assert!(record.redirect_from().is_empty());
    }

    #[test]
    fn zero_publish_date_skips_post() {
        let mut row = row();
        row.published_utc = Some("0000-00-00 00:00:00".to_string());
        assert_eq!(build_record(row, None, true).unwrap(), None);
    }

    #[test]
    fn zero_date_is_an_error_without_conversion() {
        let mut row = row();
        row.published_local = Some("0000-00-00 00:00:00".to_string());
        let err = build_record(row, None, false).unwrap_err();
        assert!(matches!(err, SourceError::InvalidDate { post_id: 7, .. }));
    }

    #[test]
    fn missing_updated_date_keeps_post() {
        let mut row = row();
        row.updated_local = None;
        let record = build_record(row, None, true).unwrap().unwrap();
        assert_eq!(record.updated(), None);
    }

    #[test]
    fn source_always_converts_zero_dates() {
        let source = MysqlPostSource::new(ConnectionParams::parse("Host=db;Database=blog"), false);
        assert!(source.converts_zero_dates());
        assert_eq!(source.table_prefix().unwrap(), "wp_");
    }

    #[test]
    fn table_prefix_must_be_an_identifier() {
        let params = ConnectionParams::parse("Host=db;Database=blog;TablePrefix=wp-x");
        let source = MysqlPostSource::new(params, false);
        assert!(matches!(
            source.table_prefix(),
            Err(SourceError::InvalidTablePrefix(_))
        ));
    }

    #[test]
    fn supported_db_versions_pass() {
        assert!(evaluate_db_version(Some(38590), false).is_ok());
        assert!(evaluate_db_version(Some(49752), false).is_ok());
    }

    #[test]
    fn unsupported_db_version_is_fatal_by_default() {
        let err = evaluate_db_version(Some(12345), false).unwrap_err();
        let SourceError::SchemaVersion {
            encountered,
            supported,
        } = err
        else {
            panic!("expected a schema version error, got {err:?}");
        };
        assert_eq!(encountered, Some(12345));
        assert_eq!(supported, [49752, 38590]);
    }

    #[test]
    fn unreadable_db_version_is_unsupported() {
        assert!(matches!(
            evaluate_db_version(None, false),
            Err(SourceError::SchemaVersion {
                encountered: None,
                ..
            })
        ));
    }

    #[test]
    fn ignored_db_version_only_warns() {
        blogport_logging::initialize_for_tests();
        assert!(evaluate_db_version(Some(12345), true).is_ok());
        assert!(evaluate_db_version(None, true).is_ok());
    }
}
