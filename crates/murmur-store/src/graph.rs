//! Follow and like edges

use crate::{
    bytes_to_id, id_to_bytes, read_id, sql_window, user_from_row, SqliteStore, StoreError,
    USER_COLUMNS,
};
use murmur_domain::traits::{InteractionLedger, RelationStore};
use murmur_domain::{
    now_millis, FollowCounts, FollowEdge, Insertion, LikeEdge, LikeInsertion, Notification, Page,
    PageRequest, PostId, Removal, User, UserId,
};
use rusqlite::{params, OptionalExtension, TransactionBehavior};

impl SqliteStore {
    /// Users on one end of `user`'s follow edges
    ///
    /// `join_on` is the column naming the other end, `match_on` the column
    /// holding `user`.
    fn follow_neighbours(
        &self,
        user: UserId,
        join_on: &str,
        match_on: &str,
        page: PageRequest,
    ) -> Result<Page<User>, StoreError> {
        let id = id_to_bytes(user.value());

        let total: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM follows WHERE {} = ?1", match_on),
            params![&id],
            |row| row.get(0),
        )?;
        let Some((limit, offset)) = sql_window(page) else {
            return Ok(Page::new(Vec::new(), total as u64, page));
        };

        let sql = format!(
            "SELECT {} FROM follows f JOIN users u ON u.id = f.{}
             WHERE f.{} = ?1
             ORDER BY u.username
             LIMIT ?2 OFFSET ?3",
            USER_COLUMNS, join_on, match_on
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let users = stmt
            .query_map(
                params![&id, limit, offset],
                user_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(users, total as u64, page))
    }
}

impl RelationStore for SqliteStore {
    fn follow(&mut self, follower: UserId, followee: UserId) -> Result<Insertion, Self::Error> {
        let inserted = self.conn.execute(
            "INSERT INTO follows (follower_id, followee_id, created_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(follower_id, followee_id) DO NOTHING",
            params![
                id_to_bytes(follower.value()),
                id_to_bytes(followee.value()),
                now_millis() as i64,
            ],
        )?;

        Ok(if inserted == 0 {
            Insertion::AlreadyPresent
        } else {
            Insertion::Created
        })
    }

    fn unfollow(&mut self, follower: UserId, followee: UserId) -> Result<Removal, Self::Error> {
        let deleted = self.conn.execute(
            "DELETE FROM follows WHERE follower_id = ?1 AND followee_id = ?2",
            params![id_to_bytes(follower.value()), id_to_bytes(followee.value())],
        )?;

        Ok(if deleted == 0 {
            Removal::Absent
        } else {
            Removal::Removed
        })
    }

    fn follow_edge(&self, a: UserId, b: UserId) -> Result<Option<FollowEdge>, Self::Error> {
        let edge = self
            .conn
            .query_row(
                "SELECT follower_id, followee_id, created_at FROM follows
                 WHERE follower_id = ?1 AND followee_id = ?2",
                params![id_to_bytes(a.value()), id_to_bytes(b.value())],
                |row| {
                    Ok(FollowEdge {
                        follower: UserId::from_value(read_id(row, 0)?),
                        followee: UserId::from_value(read_id(row, 1)?),
                        created_at: row.get::<_, i64>(2)? as u64,
                    })
                },
            )
            .optional()?;

        Ok(edge)
    }

    fn followers(&self, user: UserId, page: PageRequest) -> Result<Page<User>, Self::Error> {
        self.follow_neighbours(user, "follower_id", "followee_id", page)
    }

    fn following(&self, user: UserId, page: PageRequest) -> Result<Page<User>, Self::Error> {
        self.follow_neighbours(user, "followee_id", "follower_id", page)
    }

    fn follow_counts(&self, user: UserId) -> Result<FollowCounts, Self::Error> {
        let (followers, following): (i64, i64) = self.conn.query_row(
            "SELECT
                (SELECT COUNT(*) FROM follows WHERE followee_id = ?1),
                (SELECT COUNT(*) FROM follows WHERE follower_id = ?1)",
            params![id_to_bytes(user.value())],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(FollowCounts {
            followers: followers as u64,
            following: following as u64,
        })
    }
}

impl InteractionLedger for SqliteStore {
    fn like(&mut self, user: UserId, post: PostId) -> Result<LikeInsertion, Self::Error> {
        let user_bytes = id_to_bytes(user.value());
        let post_bytes = id_to_bytes(post.value());

        // IMMEDIATE takes the write lock up front, so the existence check,
        // edge insert and notification insert see one consistent state.
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let author_bytes: Option<Vec<u8>> = tx
            .query_row(
                "SELECT author_id FROM posts WHERE id = ?1",
                params![&post_bytes],
                |row| row.get(0),
            )
            .optional()?;
        let author = match author_bytes {
            Some(bytes) => UserId::from_value(bytes_to_id(&bytes)?),
            None => return Err(StoreError::NotFound(format!("post {}", post))),
        };

        let now = now_millis();
        let inserted = tx.execute(
            "INSERT INTO likes (user_id, post_id, created_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id, post_id) DO NOTHING",
            params![&user_bytes, &post_bytes, now as i64],
        )?;

        if inserted == 0 {
            return Ok(LikeInsertion::AlreadyPresent);
        }

        let notification = if author != user {
            let notification = Notification::liked_post(author, user, post, now);
            tx.execute(
                "INSERT INTO notifications (id, recipient_id, actor_id, verb, target_post_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    id_to_bytes(notification.id.value()),
                    id_to_bytes(author.value()),
                    &user_bytes,
                    &notification.verb,
                    &post_bytes,
                    now as i64,
                ],
            )?;
            Some(notification)
        } else {
            None
        };

        tx.commit()?;
        Ok(LikeInsertion::Created { notification })
    }

    fn unlike(&mut self, user: UserId, post: PostId) -> Result<Removal, Self::Error> {
        let deleted = self.conn.execute(
            "DELETE FROM likes WHERE user_id = ?1 AND post_id = ?2",
            params![id_to_bytes(user.value()), id_to_bytes(post.value())],
        )?;

        Ok(if deleted == 0 {
            Removal::Absent
        } else {
            Removal::Removed
        })
    }

    fn like_edge(&self, user: UserId, post: PostId) -> Result<Option<LikeEdge>, Self::Error> {
        let edge = self
            .conn
            .query_row(
                "SELECT user_id, post_id, created_at FROM likes
                 WHERE user_id = ?1 AND post_id = ?2",
                params![id_to_bytes(user.value()), id_to_bytes(post.value())],
                |row| {
                    Ok(LikeEdge {
                        user: UserId::from_value(read_id(row, 0)?),
                        post: PostId::from_value(read_id(row, 1)?),
                        created_at: row.get::<_, i64>(2)? as u64,
                    })
                },
            )
            .optional()?;

        Ok(edge)
    }

    fn like_count(&self, post: PostId) -> Result<u64, Self::Error> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM likes WHERE post_id = ?1",
            params![id_to_bytes(post.value())],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
