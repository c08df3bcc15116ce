//! Per-entity rules for references and slugs on create/update.

/// What to do with a foreign-key field whose id does not resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferencePolicy {
    /// Fail the request with a validation error.
    Reject,
    /// Store `NULL` instead and carry on.
    DowngradeToNull,
}

/// What to do with an explicitly requested slug that is already taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlugPolicy {
    /// Fail the request with a conflict.
    Reject,
    /// Append `-2`, `-3`, ... like a generated slug.
    Disambiguate,
}

#[derive(Debug)]
pub struct WritePolicy {
    pub entity: &'static str,
    pub explicit_slug: SlugPolicy,
    pub references: &'static [(&'static str, ReferencePolicy)],
}

impl WritePolicy {
    /// Policy for `field`. Fields missing from the table are rejected.
    pub fn reference(&self, field: &str) -> ReferencePolicy {
        self.references
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, policy)| *policy)
            .unwrap_or(ReferencePolicy::Reject)
    }
}

use ReferencePolicy::DowngradeToNull;

pub const BLOG: WritePolicy = WritePolicy {
    entity: "blog",
    explicit_slug: SlugPolicy::Reject,
    references: &[
        ("author_id", DowngradeToNull),
        ("category_id", DowngradeToNull),
        ("featured_image_id", DowngradeToNull),
        ("og_image_id", DowngradeToNull),
    ],
};

pub const NEWS: WritePolicy = WritePolicy {
    entity: "news",
    explicit_slug: SlugPolicy::Reject,
    references: &[
        ("category_id", DowngradeToNull),
        ("featured_image_id", DowngradeToNull),
    ],
};

pub const EVENT: WritePolicy = WritePolicy {
    entity: "event",
    explicit_slug: SlugPolicy::Reject,
    references: &[
        ("category_id", DowngradeToNull),
        ("featured_image_id", DowngradeToNull),
    ],
};

pub const BLOG_CATEGORY: WritePolicy = WritePolicy {
    entity: "blog category",
    explicit_slug: SlugPolicy::Disambiguate,
    references: &[],
};

pub const COMMENT: WritePolicy = WritePolicy {
    entity: "comment",
    explicit_slug: SlugPolicy::Reject,
    references: &[("user_id", DowngradeToNull), ("parent_id", DowngradeToNull)],
};
