use serde::{Deserialize, Serialize};

use crate::db::{Database, Row, Value, WriteResult};
use crate::error::DbError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wishlist {
    pub wishlist_id: i64,
    pub wishlist_name: String,
    pub wishlist_date: String,
    pub wishlist_last_updated: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wish {
    pub wish_id: i64,
    pub wishlist_id: i64,
    pub wish_name: String,
    pub wish_price: f64,
    pub wish_link: String,
    pub wish_last_updated: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WishlistInput {
    pub name: String,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WishInput {
    pub name: String,
    pub price: f64,
    pub link: String,
}

fn row_to_wishlist(row: &Row) -> Result<Wishlist, DbError> {
    Ok(Wishlist {
        wishlist_id: row.get_i64(0)?,
        wishlist_name: row.get_text(1)?,
        wishlist_date: row.get_text(2)?,
        wishlist_last_updated: row.get_text(3)?,
    })
}

fn row_to_wish(row: &Row) -> Result<Wish, DbError> {
    Ok(Wish {
        wish_id: row.get_i64(0)?,
        wishlist_id: row.get_i64(1)?,
        wish_name: row.get_text(2)?,
        wish_price: row.get_f64(3)?,
        wish_link: row.get_text(4)?,
        wish_last_updated: row.get_text(5)?,
    })
}

/// SQL for the `wishlists` table. Inputs are trusted to be validated.
pub struct Wishlists<'a> {
    db: &'a Database,
}

impl<'a> Wishlists<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub async fn get_all(&self) -> Result<Vec<Wishlist>, DbError> {
        let query = r#"
            SELECT wishlist_id, wishlist_name, wishlist_date, wishlist_last_updated
            FROM wishlists ORDER BY wishlist_id
        "#;

        let result = self.db.query(query).await.ok_or(DbError::NoResult)?;
        result.rows.iter().map(row_to_wishlist).collect()
    }

    pub async fn get(&self, wishlist_id: i64) -> Result<Option<Wishlist>, DbError> {
        let query = r#"
            SELECT wishlist_id, wishlist_name, wishlist_date, wishlist_last_updated
            FROM wishlists WHERE wishlist_id = ?
        "#;

        let result = self
            .db
            .prepared_query(query, vec![Value::Integer(wishlist_id)])
            .await
            .ok_or(DbError::NoResult)?;

        result.rows.first().map(row_to_wishlist).transpose()
    }

    pub async fn create(&self, input: &WishlistInput) -> Result<WriteResult, DbError> {
        let query = r#"
            INSERT INTO wishlists (wishlist_name, wishlist_date, wishlist_last_updated)
            VALUES (?, ?, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        "#;

        self.write(
            query,
            vec![Value::Text(input.name.clone()), Value::Text(input.date.clone())],
        )
        .await
    }

    pub async fn update(&self, wishlist_id: i64, input: &WishlistInput) -> Result<WriteResult, DbError> {
        let query = r#"
            UPDATE wishlists
            SET wishlist_name = ?, wishlist_date = ?,
                wishlist_last_updated = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
            WHERE wishlist_id = ?
        "#;

        self.write(
            query,
            vec![
                Value::Text(input.name.clone()),
                Value::Text(input.date.clone()),
                Value::Integer(wishlist_id),
            ],
        )
        .await
    }

    pub async fn delete(&self, wishlist_id: i64) -> Result<WriteResult, DbError> {
        self.write(
            "DELETE FROM wishlists WHERE wishlist_id = ?",
            vec![Value::Integer(wishlist_id)],
        )
        .await
    }

    pub async fn exists(&self, wishlist_id: i64) -> Result<bool, DbError> {
        let result = self
            .db
            .prepared_query(
                "SELECT wishlist_id FROM wishlists WHERE wishlist_id = ?",
                vec![Value::Integer(wishlist_id)],
            )
            .await
            .ok_or(DbError::NoResult)?;
        Ok(!result.rows.is_empty())
    }

    /// Bumps `wishlist_last_updated`, called after any change to its wishes.
    pub async fn touch(&self, wishlist_id: i64) -> Result<WriteResult, DbError> {
        let query = r#"
            UPDATE wishlists
            SET wishlist_last_updated = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
            WHERE wishlist_id = ?
        "#;

        self.write(query, vec![Value::Integer(wishlist_id)]).await
    }

    async fn write(&self, query: &str, params: Vec<Value>) -> Result<WriteResult, DbError> {
        self.db
            .prepared_query(query, params)
            .await
            .map(|r| r.write_result())
            .ok_or(DbError::NoResult)
    }
}

/// SQL for the `wishes` table, always scoped by the owning wishlist.
pub struct Wishes<'a> {
    db: &'a Database,
}

impl<'a> Wishes<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub async fn get_all(&self, wishlist_id: i64) -> Result<Vec<Wish>, DbError> {
        let query = r#"
            SELECT wish_id, wishlist_id, wish_name, wish_price, wish_link, wish_last_updated
            FROM wishes WHERE wishlist_id = ? ORDER BY wish_id
        "#;

        let result = self
            .db
            .prepared_query(query, vec![Value::Integer(wishlist_id)])
            .await
            .ok_or(DbError::NoResult)?;

        result.rows.iter().map(row_to_wish).collect()
    }

    pub async fn get(&self, wishlist_id: i64, wish_id: i64) -> Result<Option<Wish>, DbError> {
        let query = r#"
            SELECT wish_id, wishlist_id, wish_name, wish_price, wish_link, wish_last_updated
            FROM wishes WHERE wishlist_id = ? AND wish_id = ?
        "#;

        let result = self
            .db
            .prepared_query(query, vec![Value::Integer(wishlist_id), Value::Integer(wish_id)])
            .await
            .ok_or(DbError::NoResult)?;

        result.rows.first().map(row_to_wish).transpose()
    }

    pub async fn create(&self, wishlist_id: i64, input: &WishInput) -> Result<WriteResult, DbError> {
        let query = r#"
            INSERT INTO wishes (wishlist_id, wish_name, wish_price, wish_link, wish_last_updated)
            VALUES (?, ?, ?, ?, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        "#;

        self.write(
            query,
            vec![
                Value::Integer(wishlist_id),
                Value::Text(input.name.clone()),
                Value::Real(input.price),
                Value::Text(input.link.clone()),
            ],
        )
        .await
    }

    pub async fn update(
        &self,
        wishlist_id: i64,
        wish_id: i64,
        input: &WishInput,
    ) -> Result<WriteResult, DbError> {
        let query = r#"
            UPDATE wishes
            SET wish_name = ?, wish_price = ?, wish_link = ?,
                wish_last_updated = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
            WHERE wishlist_id = ? AND wish_id = ?
        "#;

        self.write(
            query,
            vec![
                Value::Text(input.name.clone()),
                Value::Real(input.price),
                Value::Text(input.link.clone()),
                Value::Integer(wishlist_id),
                Value::Integer(wish_id),
            ],
        )
        .await
    }

    pub async fn delete(&self, wishlist_id: i64, wish_id: i64) -> Result<WriteResult, DbError> {
        self.write(
            "DELETE FROM wishes WHERE wishlist_id = ? AND wish_id = ?",
            vec![Value::Integer(wishlist_id), Value::Integer(wish_id)],
        )
        .await
    }

    pub async fn exists(&self, wishlist_id: i64, wish_id: i64) -> Result<bool, DbError> {
        let result = self
            .db
            .prepared_query(
                "SELECT wish_id FROM wishes WHERE wishlist_id = ? AND wish_id = ?",
                vec![Value::Integer(wishlist_id), Value::Integer(wish_id)],
            )
            .await
            .ok_or(DbError::NoResult)?;
        Ok(!result.rows.is_empty())
    }

    async fn write(&self, query: &str, params: Vec<Value>) -> Result<WriteResult, DbError> {
        self.db
            .prepared_query(query, params)
            .await
            .map(|r| r.write_result())
            .ok_or(DbError::NoResult)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::open_temp;
    use std::time::Duration;

    fn list(name: &str, date: &str) -> WishlistInput {
        WishlistInput {
            name: name.to_string(),
            date: date.to_string(),
        }
    }

    fn wish(name: &str, price: f64) -> WishInput {
        WishInput {
            name: name.to_string(),
            price,
            link: "https://example.com/item".to_string(),
        }
    }

    #[tokio::test]
    async fn wishlist_crud() {
        let (_dir, db) = open_temp().await;
        let lists = Wishlists::new(&db);

        let created = lists.create(&list("Jul", "2024-12-24")).await.unwrap();
        assert_eq!(created.affected_rows, 1);
        let id = created.insert_id;

        assert!(lists.exists(id).await.unwrap());
        let fetched = lists.get(id).await.unwrap().unwrap();
        assert_eq!(fetched.wishlist_name, "Jul");
        assert_eq!(fetched.wishlist_date, "2024-12-24");

        lists.update(id, &list("Jul 2024", "2024-12-24")).await.unwrap();
        assert_eq!(lists.get(id).await.unwrap().unwrap().wishlist_name, "Jul 2024");

        assert_eq!(lists.get_all().await.unwrap().len(), 1);

        assert_eq!(lists.delete(id).await.unwrap().affected_rows, 1);
        assert!(!lists.exists(id).await.unwrap());
        assert!(lists.get(id).await.unwrap().is_none());
        assert_eq!(lists.delete(id).await.unwrap().affected_rows, 0);
    }

    #[tokio::test]
    async fn wishes_are_scoped_by_wishlist() {
        let (_dir, db) = open_temp().await;
        let lists = Wishlists::new(&db);
        let wishes = Wishes::new(&db);

        let a = lists.create(&list("A", "2024-01-01")).await.unwrap().insert_id;
        let b = lists.create(&list("B", "2024-01-02")).await.unwrap().insert_id;

        let w = wishes.create(a, &wish("Bog", 149.95)).await.unwrap().insert_id;

        assert!(wishes.exists(a, w).await.unwrap());
        assert!(!wishes.exists(b, w).await.unwrap());
        assert!(wishes.get(b, w).await.unwrap().is_none());
        assert_eq!(wishes.get(a, w).await.unwrap().unwrap().wish_price, 149.95);

        wishes.update(a, w, &wish("Ny bog", 99.0)).await.unwrap();
        let updated = wishes.get(a, w).await.unwrap().unwrap();
        assert_eq!(updated.wish_name, "Ny bog");
        assert_eq!(updated.wish_price, 99.0);

        assert_eq!(wishes.get_all(a).await.unwrap().len(), 1);
        assert!(wishes.get_all(b).await.unwrap().is_empty());

        wishes.delete(a, w).await.unwrap();
        assert!(!wishes.exists(a, w).await.unwrap());
    }

    #[tokio::test]
    async fn deleting_a_wishlist_cascades_to_its_wishes() {
        let (_dir, db) = open_temp().await;
        let lists = Wishlists::new(&db);
        let wishes = Wishes::new(&db);

        let id = lists.create(&list("Jul", "2024-12-24")).await.unwrap().insert_id;
        wishes.create(id, &wish("Sokker", 50.0)).await.unwrap();
        wishes.create(id, &wish("Hue", 120.0)).await.unwrap();

        lists.delete(id).await.unwrap();

        let orphans = db.query("SELECT wish_id FROM wishes").await.unwrap();
        assert!(orphans.rows.is_empty());
    }

    #[tokio::test]
    async fn wish_for_missing_wishlist_is_rejected_by_the_schema() {
        let (_dir, db) = open_temp().await;
        let result = Wishes::new(&db).create(404, &wish("Ingenting", 1.0)).await;
        assert!(matches!(result, Err(DbError::NoResult)));
    }

    #[tokio::test]
    async fn touch_advances_last_updated() {
        let (_dir, db) = open_temp().await;
        let lists = Wishlists::new(&db);

        let id = lists.create(&list("Jul", "2024-12-24")).await.unwrap().insert_id;
        let before = lists.get(id).await.unwrap().unwrap().wishlist_last_updated;

        tokio::time::sleep(Duration::from_millis(10)).await;
        lists.touch(id).await.unwrap();

        let after = lists.get(id).await.unwrap().unwrap().wishlist_last_updated;
        assert!(after > before, "{after} should be later than {before}");
    }
}
