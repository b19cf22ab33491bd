#![allow(dead_code)]

use query_modifier::{Configuration, Modifier, Relation, SeaQueryBuilder, StaticSchema};
use sea_orm::{ActiveValue::Set, Database, DatabaseConnection, DbErr, EntityTrait, Schema};
use sea_orm_migration::prelude::*;

pub mod comment_entity;
pub mod post_entity;

/// Route `tracing` output through the test harness; set `RUST_LOG` to see it
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    init_tracing();
    let db = Database::connect("sqlite::memory:").await?;

    // Run migrations
    Migrator::up(&db, None).await?;

    Ok(db)
}

/// Database with three posts and their comments:
///
/// | id | title            | status    | views | comments (status, score)             |
/// |----|------------------|-----------|-------|--------------------------------------|
/// | 1  | Learning Rust    | published | 150   | approved 5, approved 3, pending 1    |
/// | 2  | Async in depth   | published | 40    | approved 4                           |
/// | 3  | 100% coverage    | draft     | 0     |                                      |
pub async fn setup_seeded_db() -> Result<DatabaseConnection, DbErr> {
    let db = setup_test_db().await?;

    let posts = [
        (1, "Learning Rust", "Ownership and borrowing", "published", 150),
        (2, "Async in depth", "Futures, tasks and executors", "published", 40),
        (3, "100% coverage", "Testing every_branch", "draft", 0),
    ];
    post_entity::Entity::insert_many(posts.into_iter().map(
        |(id, title, body, status, views)| post_entity::ActiveModel {
            id: Set(id),
            title: Set(title.to_string()),
            body: Set(body.to_string()),
            status: Set(status.to_string()),
            views: Set(views),
        },
    ))
    .exec(&db)
    .await?;

    let comments = [
        (1, 1, "approved", 5),
        (2, 1, "approved", 3),
        (3, 1, "pending", 1),
        (4, 2, "approved", 4),
    ];
    comment_entity::Entity::insert_many(comments.into_iter().map(
        |(id, post_id, status, score)| comment_entity::ActiveModel {
            id: Set(id),
            post_id: Set(post_id),
            status: Set(status.to_string()),
            score: Set(score),
        },
    ))
    .exec(&db)
    .await?;

    Ok(db)
}

pub fn schema() -> StaticSchema {
    StaticSchema::new()
        .with_entity::<post_entity::Entity>()
        .with_entity::<comment_entity::Entity>()
}

/// Configuration for the posts collection with every modifier enabled
pub fn posts_config() -> Configuration {
    let schema = schema();
    let mut config = Configuration::default();
    config.populate_filterable_fields(&schema, "posts");
    config.populate_relation_fields(&schema, "comments", "comments");
    config.add_modifier(Modifier::Has);
    config
}

pub fn posts_builder() -> SeaQueryBuilder {
    SeaQueryBuilder::for_entity::<post_entity::Entity>()
        .with_model_name("Post")
        .with_relation(Relation::has_many("comments", "comments", "post_id"))
        .with_searchable(["title", "body"])
}

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(CreateBlogTables)]
    }
}

pub struct CreateBlogTables;

#[async_trait::async_trait]
impl MigrationName for CreateBlogTables {
    fn name(&self) -> &'static str {
        "m20240101_000001_create_blog_tables"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for CreateBlogTables {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let schema = Schema::new(manager.get_database_backend());
        manager
            .create_table(schema.create_table_from_entity(post_entity::Entity))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(comment_entity::Entity))
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(comment_entity::Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(post_entity::Entity).to_owned())
            .await?;
        Ok(())
    }
}
