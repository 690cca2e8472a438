use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use alive_db::models::ContactFields;
use alive_db::{SharedStore, blocking, format_timestamp};
use alive_types::api::ContactRequest;
use alive_types::models::Contact;

use crate::convert;
use crate::error::{CoreError, CoreResult};

const NOT_OWNED: &str = "contact does not exist or is not yours";

pub async fn add_contact(
    store: &SharedStore,
    user_id: Uuid,
    req: ContactRequest,
    now: DateTime<Utc>,
) -> CoreResult<Contact> {
    let fields = contact_fields(req)?;
    let uid = user_id.to_string();

    let (u, email, phone) = (
        uid.clone(),
        fields.contact_email.clone(),
        fields.contact_phone.clone(),
    );
    let duplicate = blocking(store, move |s| {
        s.find_duplicate_contact(&u, email.as_deref(), phone.as_deref())
    })
    .await?;
    if duplicate.is_some() {
        return Err(CoreError::conflict("this contact already exists"));
    }

    let contact_id = Uuid::new_v4();
    let cid = contact_id.to_string();
    let created_at = format_timestamp(now);
    let row = blocking(store, move |s| {
        s.insert_contact(&cid, &uid, &fields, &created_at)?;
        s.get_contact(&uid, &cid)
    })
    .await?
    .ok_or_else(|| anyhow::anyhow!("contact {} vanished after insert", contact_id))?;

    info!(%user_id, %contact_id, "Added contact");
    Ok(convert::contact(row))
}

/// Newest first.
pub async fn list_contacts(store: &SharedStore, user_id: Uuid) -> CoreResult<Vec<Contact>> {
    let uid = user_id.to_string();
    let rows = blocking(store, move |s| s.list_contacts(&uid)).await?;
    Ok(rows.into_iter().map(convert::contact).collect())
}

pub async fn update_contact(
    store: &SharedStore,
    user_id: Uuid,
    contact_id: Uuid,
    req: ContactRequest,
) -> CoreResult<Contact> {
    let fields = contact_fields(req)?;
    let (uid, cid) = (user_id.to_string(), contact_id.to_string());

    let row = blocking(store, move |s| {
        if s.update_contact(&uid, &cid, &fields)? == 0 {
            return Ok(None);
        }
        s.get_contact(&uid, &cid)
    })
    .await?
    .ok_or_else(|| CoreError::NotFoundOrForbidden(NOT_OWNED.into()))?;

    info!(%user_id, %contact_id, "Updated contact");
    Ok(convert::contact(row))
}

pub async fn delete_contact(store: &SharedStore, user_id: Uuid, contact_id: Uuid) -> CoreResult<()> {
    let (uid, cid) = (user_id.to_string(), contact_id.to_string());
    let removed = blocking(store, move |s| s.delete_contact(&uid, &cid)).await?;
    if removed == 0 {
        return Err(CoreError::NotFoundOrForbidden(NOT_OWNED.into()));
    }

    info!(%user_id, %contact_id, "Deleted contact");
    Ok(())
}

/// Blank strings count as absent. The name falls back to the email, then
/// the phone, so every contact has something to display.
fn contact_fields(req: ContactRequest) -> CoreResult<ContactFields> {
    let email = non_blank(req.contact_email);
    let phone = non_blank(req.contact_phone);
    if email.is_none() && phone.is_none() {
        return Err(CoreError::validation("an email or a phone number is required"));
    }

    let name = non_blank(req.contact_name)
        .or_else(|| email.clone())
        .or_else(|| phone.clone())
        .unwrap_or_default();

    Ok(ContactFields {
        contact_email: email,
        contact_phone: phone,
        contact_name: name,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
