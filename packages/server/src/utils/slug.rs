use std::collections::HashSet;

use sea_orm::sea_query::LikeExpr;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QuerySelect,
};

use crate::models::shared::escape_like;

const MAX_SLUG_CHARS: usize = 200;

/// Derive a URL slug from a title.
///
/// Transliterates to ASCII, lowercases, and collapses every run of other
/// characters into a single hyphen: `"Café, Über!"` becomes `"cafe-uber"`.
pub fn slugify(text: &str) -> String {
    let ascii = deunicode::deunicode(text);
    let mut slug = String::with_capacity(ascii.len());
    let mut pending_hyphen = false;

    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    slug.truncate(MAX_SLUG_CHARS);
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "untitled".to_string()
    } else {
        slug.to_string()
    }
}

/// First of `base`, `base-2`, `base-3`, ... that is not in `taken`.
pub fn next_available_slug(base: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}

/// Load the slugs of `E` that could collide with `base`.
///
/// `exclude` skips one row so a record can keep its own slug on update.
pub async fn taken_slugs<E, C>(
    db: &C,
    slug_col: E::Column,
    id_col: E::Column,
    base: &str,
    exclude: Option<i32>,
) -> Result<HashSet<String>, DbErr>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let mut select = E::find()
        .select_only()
        .column(slug_col)
        .filter(
            Condition::any().add(slug_col.eq(base)).add(
                slug_col.like(LikeExpr::new(format!("{}-%", escape_like(base))).escape('\\')),
            ),
        );
    if let Some(id) = exclude {
        select = select.filter(id_col.ne(id));
    }

    let slugs: Vec<String> = select.into_tuple().all(db).await?;
    Ok(slugs.into_iter().collect())
}

/// Generate a slug for `title` that no other row of `E` uses.
pub async fn unique_slug<E, C>(
    db: &C,
    slug_col: E::Column,
    id_col: E::Column,
    title: &str,
    exclude: Option<i32>,
) -> Result<String, DbErr>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let base = slugify(title);
    let taken = taken_slugs::<E, C>(db, slug_col, id_col, &base, exclude).await?;
    Ok(next_available_slug(&base, &taken))
}
