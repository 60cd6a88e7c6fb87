use crate::api::post::{GetPostRequest, PatchPostRequest, PutPostRequest};
use crate::api::QueryRequest;
use crate::db::types::{CreateCommentParams, CreatePostParams};
use crate::db::Database;

pub fn run_post_tests(db: &Database) {
    test_create(db);
    test_get(db);
    test_update(db);
    test_delete(db);
}

fn test_create(db: &Database) {
    let posts = [
        CreatePostParams {
            post: PutPostRequest {
                title: String::from("Rust on the server"),
                content: String::from("A long look at services"),
                category_id: 1,
                image: None,
            },
            author_id: 1,
            create_time: 50,
        },
        CreatePostParams {
            post: PutPostRequest {
                title: String::from("Morning routines"),
                content: String::from("How to start a day"),
                category_id: 2,
                image: Some(String::from("/uploads/morning.png")),
            },
            author_id: 2,
            create_time: 100,
        },
    ];

    db.with_transaction(|tx| {
        let mut expect_id = 1;
        for post in posts {
            let id = tx.create_post(post)?;
            assert_eq!(id, expect_id);
            expect_id += 1;
        }
        Ok(())
    })
    .unwrap();
}

fn test_get(db: &Database) {
    db.with_transaction(|tx| {
        let posts = tx.get_posts(GetPostRequest::default())?;
        assert_eq!(posts.len(), 2);
        // Ordered by update time, newest first.
        assert_eq!(posts[0].title, "Morning routines");
        assert_eq!(posts[1].title, "Rust on the server");

        let post = tx.get_post(2)?;
        assert_eq!(post.author_id, 2);
        assert_eq!(post.image, Some(String::from("/uploads/morning.png")));
        assert_eq!(post.create_time, 100);

        assert!(tx.has_post(1)?);
        assert!(!tx.has_post(99)?);

        let posts = tx.get_posts(GetPostRequest {
            author_id: Some(1),
            ..Default::default()
        })?;
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, 1);

        let posts = tx.get_posts(GetPostRequest {
            category_id: Some(2),
            ..Default::default()
        })?;
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, 2);

        let count = tx.count_posts(GetPostRequest {
            query: QueryRequest {
                search: Some(String::from("Rust")),
                ..Default::default()
            },
            ..Default::default()
        })?;
        assert_eq!(count, 1);

        Ok(())
    })
    .unwrap();
}

fn test_update(db: &Database) {
    db.with_transaction(|tx| {
        tx.update_post(
            PatchPostRequest {
                id: 1,
                title: Some(String::from("Rust on the server, revisited")),
                category_id: Some(2),
                ..Default::default()
            },
            4000,
        )?;

        let post = tx.get_post(1)?;
        assert_eq!(post.title, "Rust on the server, revisited");
        assert_eq!(post.category_id, 2);
        assert_eq!(post.content, "A long look at services");
        assert_eq!(post.update_time, 4000);
        // Creation time never moves.
        assert_eq!(post.create_time, 50);

        Ok(())
    })
    .unwrap();
}

fn test_delete(db: &Database) {
    // Deleting a post removes its comments in the same transaction.
    db.with_transaction(|tx| {
        tx.create_comment(CreateCommentParams {
            post_id: 1,
            author_id: 2,
            content: String::from("This is a comment that is long enough to keep"),
            is_active: true,
            create_time: 200,
        })?;
        Ok(())
    })
    .unwrap();

    db.with_transaction(|tx| {
        tx.delete_post(1)?;
        let removed = tx.delete_post_comments(1)?;
        assert_eq!(removed, 1);
        Ok(())
    })
    .unwrap();

    db.with_transaction(|tx| {
        assert!(!tx.has_post(1)?);
        let count = tx.count_posts(GetPostRequest::default())?;
        assert_eq!(count, 1);
        Ok(())
    })
    .unwrap();
}
