//! Demo content for fresh installations.

use crate::application::auth_service::hash_password;
use crate::application::{ListPostsQuery, PostService};
use crate::data::UserRepository;
use crate::domain::pagination::MAX_LIMIT;
use crate::domain::post::CreatePostRequest;
use crate::domain::user::{normalize_email, NewUser};
use crate::domain::{DomainError, User};
use crate::infrastructure::config::SeedConfig;

const DEMO_POSTS: [(&str, &str, bool); 3] = [
    (
        "First test post from Admin",
        "This is a demo post to get you started.",
        true,
    ),
    (
        "Second test post from Admin",
        "This is a second demo post to get you started.",
        true,
    ),
    (
        "Third test post from Admin",
        "This is a third demo post to get you started.",
        false,
    ),
];

/// Creates the admin user and the demo posts that are still missing.
/// Returns the number of posts inserted; running it twice inserts nothing.
pub async fn seed_demo_data(
    config: &SeedConfig,
    users: &dyn UserRepository,
    posts: &PostService,
) -> Result<usize, DomainError> {
    let admin = ensure_admin(config, users).await?;

    let existing = posts
        .list_posts(ListPostsQuery {
            author_id: Some(admin.id.to_string()),
            limit: Some(f64::from(MAX_LIMIT)),
            ..Default::default()
        })
        .await?;

    let mut inserted = 0;
    for (title, content, published) in DEMO_POSTS {
        if existing.items.iter().any(|p| p.title == title) {
            continue;
        }
        posts
            .create_post(
                admin.id,
                CreatePostRequest {
                    title: title.to_string(),
                    content: content.to_string(),
                    published: Some(published),
                },
            )
            .await?;
        inserted += 1;
    }

    tracing::info!("Seed complete: {} demo posts inserted", inserted);
    Ok(inserted)
}

async fn ensure_admin(config: &SeedConfig, users: &dyn UserRepository) -> Result<User, DomainError> {
    let email = normalize_email(&config.admin_email)?;
    if let Some(user) = users.find_by_email(&email).await? {
        return Ok(user);
    }

    let created = users
        .create(NewUser {
            email,
            name: Some("Admin".to_string()),
            password_hash: hash_password(&config.admin_password)?,
        })
        .await?;
    tracing::info!("Seeded admin user id={}", created.id);
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MemoryStore;
    use std::sync::Arc;

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let posts = PostService::new(
            store.clone(),
            store.clone(),
            Arc::new(mockable::DefaultClock),
        );
        let config = SeedConfig {
            admin_email: "admin@example.com".into(),
            admin_password: "change-me".into(),
        };

        assert_eq!(seed_demo_data(&config, store.as_ref(), &posts).await.unwrap(), 3);
        assert_eq!(seed_demo_data(&config, store.as_ref(), &posts).await.unwrap(), 0);

        let feed = posts
            .list_posts(ListPostsQuery {
                published_only: Some(true),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(feed.total, 2);
    }
}
