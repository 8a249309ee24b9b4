//! View writability.

use crate::{Connection, Error, Result};
use boilroach_db_schema::{ViewCapabilities, ViewFlags};

const VIEW_FLAGS: &str = "SELECT is_insertable_into = 'YES', \
     is_updatable = 'YES', \
     is_trigger_insertable_into = 'YES', \
     is_trigger_updatable = 'YES', \
     is_trigger_deletable = 'YES' \
     FROM information_schema.views \
     WHERE table_schema = $1 AND table_name = $2";

/// The raw insert/update facts the catalog reports for `view`.
pub async fn view_flags<C: Connection + ?Sized>(
    conn: &C,
    schema: &str,
    view: &str,
) -> Result<ViewFlags> {
    let rows = conn.query(VIEW_FLAGS, &[schema, view]).await?;
    let row = rows.first().ok_or_else(|| Error::ViewNotFound {
        schema: schema.to_string(),
        view: view.to_string(),
    })?;

    Ok(ViewFlags {
        insertable: row.bool(0)?,
        updatable: row.bool(1)?,
        trigger_insertable: row.bool(2)?,
        trigger_updatable: row.bool(3)?,
        trigger_deletable: row.bool(4)?,
    })
}

/// Whether `view` accepts inserts and upserts.
pub async fn view_capabilities<C: Connection + ?Sized>(
    conn: &C,
    schema: &str,
    view: &str,
) -> Result<ViewCapabilities> {
    let capabilities = view_flags(conn, schema, view).await?.capabilities();
    tracing::trace!(view, ?capabilities, "view capabilities");
    Ok(capabilities)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{ScriptedConn, row};

    fn flags_row(values: [bool; 5]) -> crate::query::CatalogRow {
        let [a, b, c, d, e] = values;
        row([
            ("insertable", a.into()),
            ("updatable", b.into()),
            ("trigger_insertable", c.into()),
            ("trigger_updatable", d.into()),
            ("trigger_deletable", e.into()),
        ])
    }

    #[tokio::test]
    async fn test_read_only_view() {
        let conn = ScriptedConn::new().respond(
            "information_schema.views",
            vec![flags_row([false, false, false, false, false])],
        );
        let caps = view_capabilities(&conn, "public", "user_videos").await.unwrap();
        assert_eq!(caps, ViewCapabilities::default());

        let executed = conn.executed();
        assert_eq!(executed[0].1, vec!["public".to_string(), "user_videos".to_string()]);
    }

    #[tokio::test]
    async fn test_updatable_view() {
        let conn = ScriptedConn::new().respond(
            "information_schema.views",
            vec![flags_row([true, true, false, false, false])],
        );
        let caps = view_capabilities(&conn, "public", "active_users").await.unwrap();
        assert!(caps.can_insert);
        assert!(caps.can_upsert);
    }

    #[tokio::test]
    async fn test_trigger_flags() {
        let conn = ScriptedConn::new().respond(
            "information_schema.views",
            vec![flags_row([false, false, true, false, true])],
        );
        let flags = view_flags(&conn, "public", "audited").await.unwrap();
        assert!(flags.trigger_insertable);
        assert!(flags.trigger_deletable);

        let caps = flags.capabilities();
        assert!(caps.can_insert);
        assert!(!caps.can_upsert);
    }

    #[tokio::test]
    async fn test_missing_view() {
        let conn = ScriptedConn::new().respond("information_schema.views", Vec::new());
        let err = view_capabilities(&conn, "public", "gone").await.unwrap_err();
        assert!(matches!(err, Error::ViewNotFound { ref view, .. } if view == "gone"));
    }
}
