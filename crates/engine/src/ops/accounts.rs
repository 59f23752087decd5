use sea_orm::{
    ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    Account, EngineError, ResultEngine, accounts,
    util::normalize_required_name,
};

use super::{Engine, with_tx};

/// `true` if an account with `account_id` exists on `db`.
pub(super) async fn account_exists_on<C: ConnectionTrait>(
    db: &C,
    account_id: Uuid,
) -> ResultEngine<bool> {
    accounts::Entity::find_by_id(account_id.to_string())
        .one(db)
        .await
        .map(|model| model.is_some())
        .map_err(Into::into)
}

/// Fail with `KeyNotFound` unless `account_id` exists.
pub(super) async fn require_account<C: ConnectionTrait>(
    db: &C,
    account_id: Uuid,
) -> ResultEngine<()> {
    if !account_exists_on(db, account_id).await? {
        return Err(EngineError::KeyNotFound(format!(
            "account {account_id} not exists"
        )));
    }
    Ok(())
}

impl Engine {
    /// Create an account. Names are unique, ignoring case.
    pub async fn new_account(&self, name: &str) -> ResultEngine<Uuid> {
        let name = normalize_required_name(name, "account")?;
        with_tx!(self, |db_tx| {
            let exists = accounts::Entity::find()
                .filter(Expr::cust("LOWER(name)").eq(name.to_lowercase()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(name));
            }

            let account = Account::new(name);
            accounts::ActiveModel::from(&account).insert(&db_tx).await?;
            Ok(account.id)
        })
    }

    pub async fn account(&self, account_id: Uuid) -> ResultEngine<Account> {
        let model = accounts::Entity::find_by_id(account_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("account {account_id} not exists")))?;
        Account::try_from(model)
    }

    pub async fn list_accounts(&self) -> ResultEngine<Vec<Account>> {
        accounts::Entity::find()
            .order_by_asc(accounts::Column::Name)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Account::try_from)
            .collect()
    }

    /// Archive or restore an account. Rules and entries keep referencing it.
    pub async fn set_account_archived(&self, account_id: Uuid, archived: bool) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            require_account(&db_tx, account_id).await?;

            let active = accounts::ActiveModel {
                id: ActiveValue::Unchanged(account_id.to_string()),
                archived: ActiveValue::Set(archived),
                ..Default::default()
            };
            active.update(&db_tx).await?;
            Ok(())
        })
    }

    pub async fn account_exists(&self, account_id: Uuid) -> ResultEngine<bool> {
        account_exists_on(&self.database, account_id).await
    }
}
