use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::models::{
    CheckinRow, ContactFields, ContactRow, NewCheckin, NewNotification, NewUser, NotificationRow,
    UserRow,
};
use crate::store::RecordStore;
use crate::{Database, DbResult};

const USER_COLUMNS: &str =
    "id, email, phone, password, username, created_at, last_checkin, inactive_notified_at";
const CHECKIN_COLUMNS: &str = "id, user_id, checkin_date, status, message, created_at";
const CONTACT_COLUMNS: &str =
    "id, user_id, contact_email, contact_phone, contact_name, created_at";

impl RecordStore for Database {
    // -- Users --

    fn create_user(&self, user: &NewUser) -> DbResult<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, email, phone, password, username, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    user.id,
                    user.email,
                    user.phone,
                    user.password_hash,
                    user.username,
                    user.created_at
                ],
            )?;
            Ok(())
        })
    }

    fn get_user_by_email(&self, email: &str) -> DbResult<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    fn get_user_by_id(&self, id: &str) -> DbResult<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    fn find_inactive_users(
        &self,
        stale_before: &str,
        notified_before: Option<&str>,
    ) -> DbResult<Vec<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {USER_COLUMNS} FROM users
                 WHERE (last_checkin IS NULL OR last_checkin < ?1)
                   AND (?2 IS NULL OR inactive_notified_at IS NULL OR inactive_notified_at < ?2)
                 ORDER BY created_at"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![stale_before, notified_before], user_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    fn mark_inactive_notified(&self, user_id: &str, at: &str) -> DbResult<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET inactive_notified_at = ?1 WHERE id = ?2",
                params![at, user_id],
            )?;
            Ok(())
        })
    }

    // -- Check-ins --

    fn record_checkin(&self, checkin: &NewCheckin) -> DbResult<()> {
        self.with_tx(|conn| {
            conn.execute(
                "INSERT INTO checkins (id, user_id, checkin_date, status, message, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    checkin.id,
                    checkin.user_id,
                    checkin.checkin_date,
                    checkin.status,
                    checkin.message,
                    checkin.created_at
                ],
            )?;
            // A fresh check-in also resets the inactivity watermark
            conn.execute(
                "UPDATE users SET last_checkin = ?1, inactive_notified_at = NULL WHERE id = ?2",
                params![checkin.created_at, checkin.user_id],
            )?;
            Ok(())
        })
    }

    fn get_checkin_on(&self, user_id: &str, date: &str) -> DbResult<Option<CheckinRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {CHECKIN_COLUMNS} FROM checkins WHERE user_id = ?1 AND checkin_date = ?2"
            );
            let row = conn
                .query_row(&sql, params![user_id, date], checkin_from_row)
                .optional()?;
            Ok(row)
        })
    }

    fn recent_checkins(&self, user_id: &str, limit: u32) -> DbResult<Vec<CheckinRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {CHECKIN_COLUMNS} FROM checkins
                 WHERE user_id = ?1
                 ORDER BY checkin_date DESC
                 LIMIT ?2"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![user_id, limit], checkin_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    fn checkin_dates(&self, user_id: &str) -> DbResult<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT checkin_date FROM checkins WHERE user_id = ?1 ORDER BY checkin_date DESC",
            )?;
            let dates = stmt
                .query_map([user_id], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(dates)
        })
    }

    fn count_checkins(&self, user_id: &str) -> DbResult<u64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM checkins WHERE user_id = ?1",
                [user_id],
                |row| row.get(0),
            )?;
            Ok(count.max(0) as u64)
        })
    }

    // -- Contacts --

    fn insert_contact(
        &self,
        id: &str,
        user_id: &str,
        fields: &ContactFields,
        created_at: &str,
    ) -> DbResult<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO contacts (id, user_id, contact_email, contact_phone, contact_name, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    id,
                    user_id,
                    fields.contact_email,
                    fields.contact_phone,
                    fields.contact_name,
                    created_at
                ],
            )?;
            Ok(())
        })
    }

    fn find_duplicate_contact(
        &self,
        user_id: &str,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> DbResult<Option<String>> {
        self.with_conn(|conn| {
            let id = conn
                .query_row(
                    "SELECT id FROM contacts
                     WHERE user_id = ?1
                       AND ((?2 IS NOT NULL AND contact_email = ?2)
                         OR (?3 IS NOT NULL AND contact_phone = ?3))
                     LIMIT 1",
                    params![user_id, email, phone],
                    |row| row.get::<_, String>(0),
                )
                .optional()?;
            Ok(id)
        })
    }

    fn get_contact(&self, user_id: &str, contact_id: &str) -> DbResult<Option<ContactRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE id = ?1 AND user_id = ?2");
            let row = conn
                .query_row(&sql, params![contact_id, user_id], contact_from_row)
                .optional()?;
            Ok(row)
        })
    }

    fn list_contacts(&self, user_id: &str) -> DbResult<Vec<ContactRow>> {
        self.with_conn(|conn| {
            // rowid breaks ties between contacts created in the same microsecond
            let sql = format!(
                "SELECT {CONTACT_COLUMNS} FROM contacts
                 WHERE user_id = ?1
                 ORDER BY created_at DESC, rowid DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([user_id], contact_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    fn update_contact(
        &self,
        user_id: &str,
        contact_id: &str,
        fields: &ContactFields,
    ) -> DbResult<usize> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE contacts SET contact_email = ?1, contact_phone = ?2, contact_name = ?3
                 WHERE id = ?4 AND user_id = ?5",
                params![
                    fields.contact_email,
                    fields.contact_phone,
                    fields.contact_name,
                    contact_id,
                    user_id
                ],
            )?;
            Ok(changed)
        })
    }

    fn delete_contact(&self, user_id: &str, contact_id: &str) -> DbResult<usize> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM contacts WHERE id = ?1 AND user_id = ?2",
                params![contact_id, user_id],
            )?;
            Ok(removed)
        })
    }

    // -- Notifications --

    fn insert_notification(&self, n: &NewNotification) -> DbResult<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO notifications (id, user_id, contact_id, type, content, sent_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![n.id, n.user_id, n.contact_id, n.kind, n.content, n.sent_at],
            )?;
            Ok(())
        })
    }

    fn notification_history(&self, user_id: &str, limit: u32) -> DbResult<Vec<NotificationRow>> {
        self.with_conn(|conn| {
            // LEFT JOIN: history survives contact deletion
            let mut stmt = conn.prepare(
                "SELECT n.id, n.user_id, n.contact_id, n.type, n.content, n.sent_at,
                        c.contact_name, c.contact_email
                 FROM notifications n
                 LEFT JOIN contacts c ON n.contact_id = c.id
                 WHERE n.user_id = ?1
                 ORDER BY n.sent_at DESC, n.rowid DESC
                 LIMIT ?2",
            )?;
            let rows = stmt
                .query_map(params![user_id, limit], |row| {
                    Ok(NotificationRow {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        contact_id: row.get(2)?,
                        kind: row.get(3)?,
                        content: row.get(4)?,
                        sent_at: row.get(5)?,
                        contact_name: row.get(6)?,
                        contact_email: row.get(7)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> DbResult<Option<UserRow>> {
    // `column` is always one of our literals, never caller input
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1");
    let row = conn.query_row(&sql, [value], user_from_row).optional()?;
    Ok(row)
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        email: row.get(1)?,
        phone: row.get(2)?,
        password: row.get(3)?,
        username: row.get(4)?,
        created_at: row.get(5)?,
        last_checkin: row.get(6)?,
        inactive_notified_at: row.get(7)?,
    })
}

fn checkin_from_row(row: &Row<'_>) -> rusqlite::Result<CheckinRow> {
    Ok(CheckinRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        checkin_date: row.get(2)?,
        status: row.get(3)?,
        message: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn contact_from_row(row: &Row<'_>) -> rusqlite::Result<ContactRow> {
    Ok(ContactRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        contact_email: row.get(2)?,
        contact_phone: row.get(3)?,
        contact_name: row.get(4)?,
        created_at: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DbError;
    use crate::{format_timestamp, format_date};
    use chrono::{Duration, NaiveDate, Utc};
    use std::sync::Arc;
    use uuid::Uuid;

    fn new_id() -> String {
        Uuid::new_v4().to_string()
    }

    fn add_user(db: &Database, email: &str) -> String {
        let id = new_id();
        db.create_user(&NewUser {
            id: id.clone(),
            email: email.into(),
            phone: None,
            password_hash: "hash".into(),
            username: email.split('@').next().unwrap_or(email).into(),
            created_at: format_timestamp(Utc::now()),
        })
        .unwrap();
        id
    }

    fn checkin(user_id: &str, date: NaiveDate) -> NewCheckin {
        NewCheckin {
            id: new_id(),
            user_id: user_id.into(),
            checkin_date: format_date(date),
            status: "Good".into(),
            message: None,
            created_at: format_timestamp(Utc::now()),
        }
    }

    fn fields(email: Option<&str>, phone: Option<&str>) -> ContactFields {
        ContactFields {
            contact_email: email.map(Into::into),
            contact_phone: phone.map(Into::into),
            contact_name: "Mum".into(),
        }
    }

    #[test]
    fn duplicate_email_is_unique_violation() {
        let db = Database::open_in_memory().unwrap();
        add_user(&db, "a@example.com");
        let err = db
            .create_user(&NewUser {
                id: new_id(),
                email: "a@example.com".into(),
                phone: None,
                password_hash: "hash".into(),
                username: "other".into(),
                created_at: format_timestamp(Utc::now()),
            })
            .unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[test]
    fn checkin_refreshes_last_checkin() {
        let db = Database::open_in_memory().unwrap();
        let uid = add_user(&db, "a@example.com");
        let today = Utc::now().date_naive();
        let row = checkin(&uid, today);
        db.record_checkin(&row).unwrap();

        let user = db.get_user_by_id(&uid).unwrap().unwrap();
        assert_eq!(user.last_checkin.as_deref(), Some(row.created_at.as_str()));
        assert!(db.get_checkin_on(&uid, &format_date(today)).unwrap().is_some());
    }

    #[test]
    fn concurrent_same_day_checkins_yield_one_success() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let uid = add_user(&db, "a@example.com");
        let today = Utc::now().date_naive();

        let results: Vec<DbResult<()>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..2)
                .map(|_| {
                    let db = Arc::clone(&db);
                    let row = checkin(&uid, today);
                    s.spawn(move || db.record_checkin(&row))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let ok = results.iter().filter(|r| r.is_ok()).count();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(DbError::UniqueViolation { .. })))
            .count();
        assert_eq!((ok, conflicts), (1, 1));
        assert_eq!(db.count_checkins(&uid).unwrap(), 1);
    }

    #[test]
    fn failed_checkin_leaves_last_checkin_untouched() {
        let db = Database::open_in_memory().unwrap();
        let uid = add_user(&db, "a@example.com");
        let today = Utc::now().date_naive();
        let first = checkin(&uid, today);
        db.record_checkin(&first).unwrap();

        let mut second = checkin(&uid, today);
        second.created_at = format_timestamp(Utc::now() + Duration::hours(1));
        assert!(db.record_checkin(&second).is_err());

        let user = db.get_user_by_id(&uid).unwrap().unwrap();
        assert_eq!(user.last_checkin, Some(first.created_at));
    }

    #[test]
    fn checkin_dates_are_newest_first() {
        let db = Database::open_in_memory().unwrap();
        let uid = add_user(&db, "a@example.com");
        let d = NaiveDate::from_ymd_opt(2026, 5, 10).unwrap();
        for offset in [2, 0, 1] {
            db.record_checkin(&checkin(&uid, d - Duration::days(offset))).unwrap();
        }
        assert_eq!(
            db.checkin_dates(&uid).unwrap(),
            vec!["2026-05-10", "2026-05-09", "2026-05-08"]
        );
        assert_eq!(db.recent_checkins(&uid, 2).unwrap().len(), 2);
    }

    #[test]
    fn inactive_scan_honours_watermark() {
        let db = Database::open_in_memory().unwrap();
        let now = Utc::now();
        let never = add_user(&db, "never@example.com");
        let fresh = add_user(&db, "fresh@example.com");

        let mut row = checkin(&fresh, now.date_naive());
        row.created_at = format_timestamp(now - Duration::hours(1));
        db.record_checkin(&row).unwrap();

        let cutoff = format_timestamp(now - Duration::hours(24));
        let ids: Vec<String> = db
            .find_inactive_users(&cutoff, None)
            .unwrap()
            .into_iter()
            .map(|u| u.id)
            .collect();
        assert_eq!(ids, vec![never.clone()]);

        db.mark_inactive_notified(&never, &format_timestamp(now)).unwrap();
        let window = format_timestamp(now - Duration::hours(6));
        assert!(db.find_inactive_users(&cutoff, Some(&window)).unwrap().is_empty());
        // Without a window the watermark is ignored
        assert_eq!(db.find_inactive_users(&cutoff, None).unwrap().len(), 1);
    }

    #[test]
    fn contact_mutations_require_owner() {
        let db = Database::open_in_memory().unwrap();
        let owner = add_user(&db, "owner@example.com");
        let intruder = add_user(&db, "intruder@example.com");
        let cid = new_id();
        db.insert_contact(&cid, &owner, &fields(Some("mum@example.com"), None), &format_timestamp(Utc::now()))
            .unwrap();

        assert_eq!(db.delete_contact(&intruder, &cid).unwrap(), 0);
        assert_eq!(
            db.update_contact(&intruder, &cid, &fields(None, Some("555"))).unwrap(),
            0
        );
        let row = db.get_contact(&owner, &cid).unwrap().unwrap();
        assert_eq!(row.contact_email.as_deref(), Some("mum@example.com"));
        assert_eq!(db.delete_contact(&owner, &cid).unwrap(), 1);
    }

    #[test]
    fn duplicate_contact_matches_email_or_phone() {
        let db = Database::open_in_memory().unwrap();
        let owner = add_user(&db, "owner@example.com");
        db.insert_contact(&new_id(), &owner, &fields(Some("mum@example.com"), Some("555")), &format_timestamp(Utc::now()))
            .unwrap();

        assert!(db.find_duplicate_contact(&owner, None, Some("555")).unwrap().is_some());
        assert!(db.find_duplicate_contact(&owner, Some("mum@example.com"), None).unwrap().is_some());
        assert!(db.find_duplicate_contact(&owner, Some("dad@example.com"), None).unwrap().is_none());
    }

    #[test]
    fn contact_without_channel_is_rejected_by_schema() {
        let db = Database::open_in_memory().unwrap();
        let owner = add_user(&db, "owner@example.com");
        let res = db.insert_contact(&new_id(), &owner, &fields(None, None), &format_timestamp(Utc::now()));
        assert!(res.is_err());
    }

    #[test]
    fn history_survives_contact_deletion() {
        let db = Database::open_in_memory().unwrap();
        let owner = add_user(&db, "owner@example.com");
        let cid = new_id();
        db.insert_contact(&cid, &owner, &fields(Some("mum@example.com"), None), &format_timestamp(Utc::now()))
            .unwrap();
        db.insert_notification(&NewNotification {
            id: new_id(),
            user_id: owner.clone(),
            contact_id: cid.clone(),
            kind: "checkin".into(),
            content: "owner checked in".into(),
            sent_at: format_timestamp(Utc::now()),
        })
        .unwrap();

        let before = db.notification_history(&owner, 20).unwrap();
        assert_eq!(before[0].contact_name.as_deref(), Some("Mum"));

        db.delete_contact(&owner, &cid).unwrap();
        let after = db.notification_history(&owner, 20).unwrap();
        assert_eq!(after.len(), 1);
        assert!(after[0].contact_name.is_none());
    }
}
