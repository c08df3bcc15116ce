//! Lookups shared by the blog, news and event handlers.

use std::collections::{HashMap, HashSet};

use sea_orm::*;

use crate::entity::{comment, stored_file, tag};
use crate::error::AppError;
use crate::models::comment::{CommentOwner, CommentResponse};
use crate::models::policy::{ReferencePolicy, SlugPolicy, WritePolicy};
use crate::models::storage::StoredFileResponse;
use crate::models::taxonomy::TagResponse;
use crate::utils::slug::{next_available_slug, slugify, taken_slugs, unique_slug};

/// Check an optional foreign key against `E`, applying the policy for `field`.
pub async fn resolve_reference<E, C>(
    db: &C,
    policy: &WritePolicy,
    field: &str,
    id: Option<i32>,
) -> Result<Option<i32>, AppError>
where
    E: EntityTrait,
    C: ConnectionTrait,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<i32>,
{
    let Some(id) = id else {
        return Ok(None);
    };
    if E::find_by_id(id).one(db).await?.is_some() {
        return Ok(Some(id));
    }
    match policy.reference(field) {
        ReferencePolicy::DowngradeToNull => {
            tracing::debug!(entity = policy.entity, field, id, "Unresolved reference stored as null");
            Ok(None)
        }
        ReferencePolicy::Reject => Err(AppError::Validation(format!(
            "{field} {id} does not exist"
        ))),
    }
}

/// Slug for a create or update.
///
/// Without an explicit slug one is generated from `title`. An explicit slug is
/// normalized and then checked against the policy when it is already taken.
#[allow(clippy::too_many_arguments)]
pub async fn resolve_slug<E, C>(
    db: &C,
    policy: &WritePolicy,
    slug_col: E::Column,
    id_col: E::Column,
    explicit: Option<&str>,
    title: &str,
    exclude: Option<i32>,
) -> Result<String, AppError>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let Some(requested) = explicit.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(unique_slug::<E, C>(db, slug_col, id_col, title, exclude).await?);
    };

    let slug = slugify(requested);
    let taken = taken_slugs::<E, C>(db, slug_col, id_col, &slug, exclude).await?;
    if !taken.contains(&slug) {
        return Ok(slug);
    }
    match policy.explicit_slug {
        SlugPolicy::Reject => Err(AppError::Conflict(format!(
            "A {} with slug '{slug}' already exists",
            policy.entity
        ))),
        SlugPolicy::Disambiguate => Ok(next_available_slug(&slug, &taken)),
    }
}

/// The subset of `ids` that exist in `E`, deduplicated, in request order.
///
/// `exclude` drops one id (a record cannot be related to itself).
pub async fn existing_ids<E, C>(
    db: &C,
    id_col: E::Column,
    ids: &[i32],
    exclude: Option<i32>,
) -> Result<Vec<i32>, DbErr>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let mut seen = HashSet::new();
    let wanted: Vec<i32> = ids
        .iter()
        .copied()
        .filter(|id| Some(*id) != exclude && seen.insert(*id))
        .collect();
    if wanted.is_empty() {
        return Ok(Vec::new());
    }

    let found: HashSet<i32> = E::find()
        .select_only()
        .column(id_col)
        .filter(id_col.is_in(wanted.clone()))
        .into_tuple::<i32>()
        .all(db)
        .await?
        .into_iter()
        .collect();

    Ok(wanted.into_iter().filter(|id| found.contains(id)).collect())
}

/// Rows of `E` whose id is in `ids`, keyed by id.
pub async fn load_by_ids<E, C>(
    db: &C,
    id_col: E::Column,
    ids: impl IntoIterator<Item = i32>,
    key: impl Fn(&E::Model) -> i32,
) -> Result<HashMap<i32, E::Model>, DbErr>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let ids: HashSet<i32> = ids.into_iter().collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = E::find().filter(id_col.is_in(ids)).all(db).await?;
    Ok(rows.into_iter().map(|m| (key(&m), m)).collect())
}

pub async fn load_files<C: ConnectionTrait>(
    db: &C,
    ids: impl IntoIterator<Item = i32>,
) -> Result<HashMap<i32, StoredFileResponse>, DbErr> {
    let rows = load_by_ids::<stored_file::Entity, C>(db, stored_file::Column::Id, ids, |m| m.id)
        .await?;
    Ok(rows.into_iter().map(|(id, m)| (id, m.into())).collect())
}

/// Pairs `(owner, other)` from a junction table for the given owners.
pub async fn junction_pairs<J, C>(
    db: &C,
    owner_col: J::Column,
    other_col: J::Column,
    owner_ids: &[i32],
) -> Result<Vec<(i32, i32)>, DbErr>
where
    J: EntityTrait,
    C: ConnectionTrait,
{
    if owner_ids.is_empty() {
        return Ok(Vec::new());
    }
    J::find()
        .select_only()
        .column(owner_col)
        .column(other_col)
        .filter(owner_col.is_in(owner_ids.to_vec()))
        .into_tuple::<(i32, i32)>()
        .all(db)
        .await
}

/// Tags of every owner in `owner_ids`, sorted by name.
pub async fn load_tags<J, C>(
    db: &C,
    owner_col: J::Column,
    tag_col: J::Column,
    owner_ids: &[i32],
) -> Result<HashMap<i32, Vec<TagResponse>>, DbErr>
where
    J: EntityTrait,
    C: ConnectionTrait,
{
    let pairs = junction_pairs::<J, C>(db, owner_col, tag_col, owner_ids).await?;
    let tags = load_by_ids::<tag::Entity, C>(
        db,
        tag::Column::Id,
        pairs.iter().map(|(_, tag_id)| *tag_id),
        |m| m.id,
    )
    .await?;

    let mut by_owner: HashMap<i32, Vec<TagResponse>> = HashMap::new();
    for (owner, tag_id) in pairs {
        if let Some(t) = tags.get(&tag_id) {
            by_owner
                .entry(owner)
                .or_default()
                .push(TagResponse::from(t.clone()));
        }
    }
    for list in by_owner.values_mut() {
        list.sort_by(|a, b| a.name.cmp(&b.name));
    }
    Ok(by_owner)
}

/// Ids linked from `owner` through a junction table.
pub async fn linked_ids<J, C>(
    db: &C,
    owner_col: J::Column,
    other_col: J::Column,
    owner: i32,
) -> Result<Vec<i32>, DbErr>
where
    J: EntityTrait,
    C: ConnectionTrait,
{
    let pairs = junction_pairs::<J, C>(db, owner_col, other_col, &[owner]).await?;
    Ok(pairs.into_iter().map(|(_, other)| other).collect())
}

/// Approved comments on `owner`, newest first.
pub async fn approved_comments<C: ConnectionTrait>(
    db: &C,
    owner: CommentOwner,
) -> Result<Vec<CommentResponse>, DbErr> {
    let rows = comment::Entity::find()
        .filter(comment::Column::ContentType.eq(owner.kind()))
        .filter(comment::Column::ContentId.eq(owner.id()))
        .filter(comment::Column::IsApproved.eq(true))
        .order_by_desc(comment::Column::CreatedAt)
        .order_by_desc(comment::Column::Id)
        .all(db)
        .await?;
    Ok(rows.into_iter().map(CommentResponse::from).collect())
}

/// Remove every comment attached to `owner`.
pub async fn delete_comments<C: ConnectionTrait>(db: &C, owner: CommentOwner) -> Result<(), DbErr> {
    comment::Entity::delete_many()
        .filter(comment::Column::ContentType.eq(owner.kind()))
        .filter(comment::Column::ContentId.eq(owner.id()))
        .exec(db)
        .await?;
    Ok(())
}

/// Apply a PATCH value to a nullable text column, trimming and mapping blank to null.
pub fn patch_text(value: Option<Option<String>>) -> Option<Option<String>> {
    value.map(|v| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()))
}
