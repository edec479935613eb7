//! Users, posts, comments and notifications

use crate::{
    comment_from_row, id_to_bytes, notification_from_row, post_from_row, sql_window,
    user_from_row, SqliteStore, POST_COLUMNS, USER_COLUMNS,
};
use murmur_domain::traits::{CommentStore, NotificationStore, PostStore, UserStore};
use murmur_domain::{
    Comment, CommentId, CommentUpdate, Insertion, Notification, Page, PageRequest, Post, PostId,
    PostQuery, PostUpdate, ProfileUpdate, User, UserId,
};
use rusqlite::{params, OptionalExtension};

/// Escape `%`, `_` and `\` so a search term matches literally under `ESCAPE '\'`
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

impl SqliteStore {
    /// Run a paged post query; `filter` is appended after `WHERE 1=1`
    fn page_posts(
        &self,
        filter: &str,
        filter_params: Vec<Box<dyn rusqlite::ToSql>>,
        page: PageRequest,
    ) -> Result<Page<Post>, crate::StoreError> {
        let count_sql = format!("SELECT COUNT(*) FROM posts p WHERE 1=1{}", filter);
        let param_refs: Vec<&dyn rusqlite::ToSql> =
            filter_params.iter().map(|p| p.as_ref()).collect();
        let total: i64 = self
            .conn
            .query_row(&count_sql, &param_refs[..], |row| row.get(0))?;

        let Some((limit, offset)) = sql_window(page) else {
            return Ok(Page::new(Vec::new(), total as u64, page));
        };

        let sql = format!(
            "SELECT {} FROM posts p WHERE 1=1{}
             ORDER BY p.created_at DESC, p.id DESC
             LIMIT ? OFFSET ?",
            POST_COLUMNS, filter
        );
        let mut query_params = param_refs;
        query_params.push(&limit);
        query_params.push(&offset);

        let mut stmt = self.conn.prepare(&sql)?;
        let posts = stmt
            .query_map(&query_params[..], post_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(posts, total as u64, page))
    }
}

impl UserStore for SqliteStore {
    fn create_user(&mut self, user: &User, password_hash: &str) -> Result<Insertion, Self::Error> {
        let inserted = self.conn.execute(
            "INSERT INTO users (id, username, email, password_hash, bio, is_staff, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(username) DO NOTHING",
            params![
                id_to_bytes(user.id.value()),
                &user.username,
                &user.email,
                password_hash,
                &user.bio,
                user.is_staff,
                user.created_at as i64,
            ],
        )?;

        Ok(if inserted == 0 {
            Insertion::AlreadyPresent
        } else {
            Insertion::Created
        })
    }

    fn get_user(&self, id: UserId) -> Result<Option<User>, Self::Error> {
        let user = self
            .conn
            .query_row(
                &format!("SELECT {} FROM users u WHERE u.id = ?1", USER_COLUMNS),
                params![id_to_bytes(id.value())],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    fn find_by_username(&self, username: &str) -> Result<Option<User>, Self::Error> {
        let user = self
            .conn
            .query_row(
                &format!("SELECT {} FROM users u WHERE u.username = ?1", USER_COLUMNS),
                params![username],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    fn credentials(&self, username: &str) -> Result<Option<(User, String)>, Self::Error> {
        let found = self
            .conn
            .query_row(
                &format!(
                    "SELECT {}, u.password_hash FROM users u WHERE u.username = ?1",
                    USER_COLUMNS
                ),
                params![username],
                |row| Ok((user_from_row(row)?, row.get::<_, String>(6)?)),
            )
            .optional()?;
        Ok(found)
    }

    fn list_users(&self, page: PageRequest) -> Result<Page<User>, Self::Error> {
        let total: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        let Some((limit, offset)) = sql_window(page) else {
            return Ok(Page::new(Vec::new(), total as u64, page));
        };

        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM users u ORDER BY u.username LIMIT ?1 OFFSET ?2",
            USER_COLUMNS
        ))?;
        let users = stmt
            .query_map(
                params![limit, offset],
                user_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(users, total as u64, page))
    }

    fn update_profile(
        &mut self,
        id: UserId,
        update: &ProfileUpdate,
    ) -> Result<Option<User>, Self::Error> {
        self.conn.execute(
            "UPDATE users SET email = COALESCE(?2, email), bio = COALESCE(?3, bio) WHERE id = ?1",
            params![id_to_bytes(id.value()), &update.email, &update.bio],
        )?;
        self.get_user(id)
    }
}

impl PostStore for SqliteStore {
    fn create_post(&mut self, post: &Post) -> Result<(), Self::Error> {
        self.conn.execute(
            "INSERT INTO posts (id, author_id, title, content, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id_to_bytes(post.id.value()),
                id_to_bytes(post.author.value()),
                &post.title,
                &post.content,
                post.created_at as i64,
                post.updated_at as i64,
            ],
        )?;
        Ok(())
    }

    fn get_post(&self, id: PostId) -> Result<Option<Post>, Self::Error> {
        let post = self
            .conn
            .query_row(
                &format!("SELECT {} FROM posts p WHERE p.id = ?1", POST_COLUMNS),
                params![id_to_bytes(id.value())],
                post_from_row,
            )
            .optional()?;
        Ok(post)
    }

    fn list_posts(&self, query: &PostQuery, page: PageRequest) -> Result<Page<Post>, Self::Error> {
        let mut filter = String::new();
        let mut filter_params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            filter.push_str(" AND (p.title LIKE ? ESCAPE '\\' OR p.content LIKE ? ESCAPE '\\')");
            let pattern = like_pattern(search);
            filter_params.push(Box::new(pattern.clone()));
            filter_params.push(Box::new(pattern));
        }

        if let Some(author) = query.author {
            filter.push_str(" AND p.author_id = ?");
            filter_params.push(Box::new(id_to_bytes(author.value())));
        }

        self.page_posts(&filter, filter_params, page)
    }

    fn update_post(
        &mut self,
        id: PostId,
        update: &PostUpdate,
        updated_at: u64,
    ) -> Result<Option<Post>, Self::Error> {
        self.conn.execute(
            "UPDATE posts SET title = COALESCE(?2, title), content = COALESCE(?3, content),
             updated_at = ?4 WHERE id = ?1",
            params![
                id_to_bytes(id.value()),
                &update.title,
                &update.content,
                updated_at as i64,
            ],
        )?;
        self.get_post(id)
    }

    fn delete_post(&mut self, id: PostId) -> Result<bool, Self::Error> {
        let deleted = self.conn.execute(
            "DELETE FROM posts WHERE id = ?1",
            params![id_to_bytes(id.value())],
        )?;
        Ok(deleted > 0)
    }

    fn feed(&self, user: UserId, page: PageRequest) -> Result<Page<Post>, Self::Error> {
        let filter =
            " AND p.author_id IN (SELECT followee_id FROM follows WHERE follower_id = ?)";
        let filter_params: Vec<Box<dyn rusqlite::ToSql>> =
            vec![Box::new(id_to_bytes(user.value()))];
        self.page_posts(filter, filter_params, page)
    }
}

impl CommentStore for SqliteStore {
    fn create_comment(&mut self, comment: &Comment) -> Result<(), Self::Error> {
        self.conn.execute(
            "INSERT INTO comments (id, post_id, author_id, content, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id_to_bytes(comment.id.value()),
                id_to_bytes(comment.post.value()),
                id_to_bytes(comment.author.value()),
                &comment.content,
                comment.created_at as i64,
                comment.updated_at as i64,
            ],
        )?;
        Ok(())
    }

    fn get_comment(&self, id: CommentId) -> Result<Option<Comment>, Self::Error> {
        let comment = self
            .conn
            .query_row(
                "SELECT id, post_id, author_id, content, created_at, updated_at
                 FROM comments WHERE id = ?1",
                params![id_to_bytes(id.value())],
                comment_from_row,
            )
            .optional()?;
        Ok(comment)
    }

    fn list_comments(
        &self,
        post: PostId,
        page: PageRequest,
    ) -> Result<Page<Comment>, Self::Error> {
        let post_bytes = id_to_bytes(post.value());
        let total: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM comments WHERE post_id = ?1",
            params![&post_bytes],
            |row| row.get(0),
        )?;
        let Some((limit, offset)) = sql_window(page) else {
            return Ok(Page::new(Vec::new(), total as u64, page));
        };

        let mut stmt = self.conn.prepare(
            "SELECT id, post_id, author_id, content, created_at, updated_at
             FROM comments WHERE post_id = ?1
             ORDER BY created_at, id
             LIMIT ?2 OFFSET ?3",
        )?;
        let comments = stmt
            .query_map(
                params![&post_bytes, limit, offset],
                comment_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(comments, total as u64, page))
    }

    fn update_comment(
        &mut self,
        id: CommentId,
        update: &CommentUpdate,
        updated_at: u64,
    ) -> Result<Option<Comment>, Self::Error> {
        self.conn.execute(
            "UPDATE comments SET content = COALESCE(?2, content), updated_at = ?3 WHERE id = ?1",
            params![id_to_bytes(id.value()), &update.content, updated_at as i64],
        )?;
        self.get_comment(id)
    }

    fn delete_comment(&mut self, id: CommentId) -> Result<bool, Self::Error> {
        let deleted = self.conn.execute(
            "DELETE FROM comments WHERE id = ?1",
            params![id_to_bytes(id.value())],
        )?;
        Ok(deleted > 0)
    }
}

impl NotificationStore for SqliteStore {
    fn notifications_for(
        &self,
        recipient: UserId,
        page: PageRequest,
    ) -> Result<Page<Notification>, Self::Error> {
        let recipient_bytes = id_to_bytes(recipient.value());
        let total: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = ?1",
            params![&recipient_bytes],
            |row| row.get(0),
        )?;
        let Some((limit, offset)) = sql_window(page) else {
            return Ok(Page::new(Vec::new(), total as u64, page));
        };

        let mut stmt = self.conn.prepare(
            "SELECT id, recipient_id, actor_id, verb, target_post_id, created_at
             FROM notifications WHERE recipient_id = ?1
             ORDER BY created_at DESC, id DESC
             LIMIT ?2 OFFSET ?3",
        )?;
        let notifications = stmt
            .query_map(
                params![&recipient_bytes, limit, offset],
                notification_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(notifications, total as u64, page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("rust"), "%rust%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
    }
}
