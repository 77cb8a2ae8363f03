use std::sync::Arc;

use sqlx::{Postgres, Transaction};
use tokio::sync::Mutex;

/// Handle on one open transaction, shared by every repository of a unit of work.
///
/// The transaction is taken out of the slot when committed or rolled back;
/// repositories using a consumed executor fail with "Transaction has been consumed".
/// Dropping the last handle without committing rolls the transaction back.
#[derive(Clone)]
pub struct Executor {
    pub tx: Arc<Mutex<Option<Transaction<'static, Postgres>>>>,
}

impl Executor {
    pub fn new(tx: Transaction<'static, Postgres>) -> Self {
        Self {
            tx: Arc::new(Mutex::new(Some(tx))),
        }
    }

    pub async fn commit(&self) -> Result<(), sqlx::Error> {
        match self.tx.lock().await.take() {
            Some(tx) => tx.commit().await,
            None => Err(consumed()),
        }
    }

    pub async fn rollback(&self) -> Result<(), sqlx::Error> {
        match self.tx.lock().await.take() {
            Some(tx) => tx.rollback().await,
            None => Err(consumed()),
        }
    }

    pub async fn is_active(&self) -> bool {
        self.tx.lock().await.is_some()
    }
}

fn consumed() -> sqlx::Error {
    sqlx::Error::Protocol("Transaction has been consumed".to_string())
}
